//! Invalidator Module
//!
//! Explicit cache-busting for a single (content, category) pair.

use std::sync::Arc;

use tracing::info;

use crate::cache::{CacheKey, CacheStore, InflightMap, KeyEpochs};
use crate::error::Result;

// == Invalidator ==
/// Deletes the record derived from the same key a fetch would use.
///
/// Obtained from `CacheCoordinator::invalidator` so it shares the
/// coordinator's in-flight map and key epochs. Advancing the key's epoch
/// discards every write-back whose computation started before the
/// invalidation.
#[derive(Debug, Clone)]
pub struct Invalidator {
    store: Arc<CacheStore>,
    inflight: Arc<InflightMap>,
    epochs: Arc<KeyEpochs>,
}

impl Invalidator {
    pub fn new(store: Arc<CacheStore>, inflight: Arc<InflightMap>, epochs: Arc<KeyEpochs>) -> Self {
        Self {
            store,
            inflight,
            epochs,
        }
    }

    // == Invalidate ==
    /// Removes the cached answer for (`content`, `category`).
    ///
    /// Idempotent. The next fetch for the pair always calls its provider,
    /// even if a provider call for it was running. Only waits for a
    /// write-back of this key that is already touching the store.
    ///
    /// # Errors
    /// `InvalidRequest` for an empty category, `StoreUnavailable` when
    /// the delete cannot reach the store.
    pub async fn invalidate(&self, content: impl AsRef<[u8]>, category: &str) -> Result<CacheKey> {
        let key = CacheKey::for_content(content, category)?;

        self.inflight.forget(&key);
        let ticket = self.epochs.ticket(&key);
        let _lock = ticket.advance().await;
        self.store.delete(&key).await?;

        self.store.stats().record_invalidation();
        info!(%key, "cache entry invalidated");
        Ok(key)
    }
}
