//! Cache Coordinator Module
//!
//! Single entry point: hash the content, look it up, and only on a miss
//! call the provider and store its answer in the background.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{
    expiry_for, CacheKey, CacheStats, CacheStore, EpochTicket, InflightGuard, InflightMap,
    Invalidator, KeyEpochs, Slot,
};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::tasks::{spawn_write, WriteTracker};

// == Coordinator Config ==
/// Behaviour switches for `CacheCoordinator`.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Share one provider call between concurrent misses on a key
    pub coalesce: bool,
    /// Upper bound on a provider call, None = unbounded
    pub compute_timeout: Option<Duration>,
    /// TTL used by `fetch_default_ttl`
    pub default_ttl: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for CoordinatorConfig {
    fn from(config: &Config) -> Self {
        Self {
            coalesce: config.coalesce,
            compute_timeout: config.compute_timeout(),
            default_ttl: config.default_ttl(),
        }
    }
}

// == Fetched ==
/// A payload together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    /// True when served from the store without calling the provider
    pub was_cached: bool,
}

// == Cache Coordinator ==
#[derive(Debug)]
pub struct CacheCoordinator {
    store: Arc<CacheStore>,
    config: CoordinatorConfig,
    inflight: Arc<InflightMap>,
    epochs: Arc<KeyEpochs>,
    writes: Arc<WriteTracker>,
}

impl CacheCoordinator {
    // == Constructor ==
    pub fn new(store: Arc<CacheStore>, config: CoordinatorConfig) -> Self {
        Self {
            store,
            config,
            inflight: Arc::new(InflightMap::new()),
            epochs: Arc::new(KeyEpochs::new()),
            writes: Arc::new(WriteTracker::new()),
        }
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn stats(&self) -> &Arc<CacheStats> {
        self.store.stats()
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Invalidator sharing this coordinator's in-flight and epoch state.
    pub fn invalidator(&self) -> Invalidator {
        Invalidator::new(
            Arc::clone(&self.store),
            Arc::clone(&self.inflight),
            Arc::clone(&self.epochs),
        )
    }

    // == Fetch ==
    /// Returns the cached answer for (`content`, `category`), or calls
    /// `compute` and caches its answer for `ttl`.
    ///
    /// On a miss the store write runs detached; this returns as soon as
    /// `compute` does. A failing, timed-out or cancelled `compute` leaves
    /// the store untouched and its error reaches the caller as
    /// `CacheError::ComputeFailed` with the original error inside.
    ///
    /// A stored payload that no longer decodes into `T` is treated as a
    /// miss and overwritten. An answer computed while the key was being
    /// invalidated is returned but not stored.
    ///
    /// # Errors
    /// `InvalidTtl` when `ttl` is zero or too large to timestamp; the
    /// provider is not called.
    pub async fn fetch<T, E, F, Fut>(
        &self,
        content: impl AsRef<[u8]>,
        category: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<Fetched<T>>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        E: Into<anyhow::Error> + Send + 'static,
    {
        expiry_for(self.store.now(), ttl)?;
        let key = CacheKey::for_content(content, category)?;

        if let Some(payload) = self.store.get(&key).await {
            match serde_json::from_value::<T>(payload) {
                Ok(value) => {
                    return Ok(Fetched {
                        value,
                        was_cached: true,
                    })
                }
                Err(err) => warn!(%key, error = %err, "cached payload does not decode, recomputing"),
            }
        }

        let ticket = self.epochs.ticket(&key);
        let computation = self.computation(&key, compute);
        let payload = if self.config.coalesce {
            self.run_coalesced(ticket, ttl, computation).await?
        } else {
            let payload = computation.await?;
            self.write_back(ticket, payload.clone(), ttl, None);
            payload
        };

        let value = serde_json::from_value(payload)
            .map_err(|err| CacheError::Codec(err.to_string()))?;
        Ok(Fetched {
            value,
            was_cached: false,
        })
    }

    /// `fetch` with the configured default TTL.
    pub async fn fetch_default_ttl<T, E, F, Fut>(
        &self,
        content: impl AsRef<[u8]>,
        category: &str,
        compute: F,
    ) -> Result<Fetched<T>>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        E: Into<anyhow::Error> + Send + 'static,
    {
        self.fetch(content, category, self.config.default_ttl, compute)
            .await
    }

    /// Drops the cached answer for (`content`, `category`).
    pub async fn invalidate(&self, content: impl AsRef<[u8]>, category: &str) -> Result<CacheKey> {
        self.invalidator().invalidate(content, category).await
    }

    /// Waits for every outstanding background write to finish.
    pub async fn flush(&self) {
        self.writes.wait_idle().await;
    }

    async fn run_coalesced(
        &self,
        ticket: EpochTicket,
        ttl: Duration,
        computation: BoxFuture<'static, Result<Value>>,
    ) -> Result<Value> {
        match self.inflight.join_or_register(ticket.key(), computation) {
            Slot::Leader { computation, guard } => {
                // On failure the guard drops here, freeing the key for a retry.
                let payload = computation.await?;
                self.write_back(ticket, payload.clone(), ttl, Some(guard));
                Ok(payload)
            }
            Slot::Follower(computation) => {
                self.stats().record_coalesced();
                computation.await
            }
        }
    }

    fn write_back(
        &self,
        ticket: EpochTicket,
        payload: Value,
        ttl: Duration,
        slot: Option<InflightGuard>,
    ) {
        spawn_write(Arc::clone(&self.store), &self.writes, ticket, payload, ttl, slot);
    }

    /// Wraps `compute` with the deadline, error mapping and serialization.
    fn computation<T, E, F, Fut>(&self, key: &CacheKey, compute: F) -> BoxFuture<'static, Result<Value>>
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        E: Into<anyhow::Error> + Send + 'static,
    {
        let stats = Arc::clone(self.stats());
        let timeout = self.config.compute_timeout;
        let key = key.clone();

        async move {
            stats.record_compute();
            debug!(%key, "invoking provider");

            let outcome = match timeout {
                Some(limit) => match tokio::time::timeout(limit, compute()).await {
                    Ok(outcome) => outcome.map_err(CacheError::compute_failed),
                    Err(_) => Err(CacheError::ComputeTimedOut(limit)),
                },
                None => compute().await.map_err(CacheError::compute_failed),
            };

            let payload = outcome.and_then(|value| {
                serde_json::to_value(value).map_err(|err| CacheError::Codec(err.to_string()))
            });

            if let Err(err) = &payload {
                stats.record_compute_failure();
                warn!(%key, error = %err, "provider call failed, nothing cached");
            }
            payload
        }
        .boxed()
    }
}
