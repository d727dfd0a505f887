//! Cache Store Module
//!
//! TTL and failure policy on top of a persistent backend.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{CacheBackend, CacheEntry, CacheKey, CacheStats, Clock, SystemClock};
use crate::error::Result;

// == Cache Store ==
/// Durable key -> (payload, expiry) mapping.
///
/// Reads never fail: store I/O errors and stale records both read as a
/// miss. Stale records are deleted when encountered.
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    clock: Arc<dyn Clock>,
    stats: Arc<CacheStats>,
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("clock", &self.clock)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store over `backend` using the wall clock.
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock))
    }

    /// Creates a store with an explicit time source.
    pub fn with_clock(backend: Arc<dyn CacheBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Shared statistics handle.
    pub fn stats(&self) -> &Arc<CacheStats> {
        &self.stats
    }

    // == Get ==
    /// Returns the live payload for `key`, or None.
    ///
    /// Counts a hit or a miss.
    pub async fn get(&self, key: &CacheKey) -> Option<Value> {
        let found = self.read(key).await;
        match &found {
            Some(_) => {
                debug!(%key, "cache hit");
                self.stats.record_hit();
            }
            None => {
                debug!(%key, "cache miss");
                self.stats.record_miss();
            }
        }
        found
    }

    // == Peek ==
    /// Same as `get` without touching hit/miss counters.
    pub async fn peek(&self, key: &CacheKey) -> Option<Value> {
        self.read(key).await
    }

    async fn read(&self, key: &CacheKey) -> Option<Value> {
        let entry = match self.backend.load(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(err) => {
                warn!(%key, error = %err, "cache read failed, treating as miss");
                self.stats.record_store_error();
                return None;
            }
        };

        let now = self.clock.now();
        if entry.is_expired_at(now) {
            self.stats.record_expired();
            match self.backend.remove_expired(key, now).await {
                Ok(true) => debug!(%key, expired_at = %entry.expires_at, "evicted expired cache entry"),
                Ok(false) => debug!(%key, "expired cache entry already replaced"),
                Err(err) => {
                    warn!(%key, error = %err, "failed to evict expired cache entry");
                    self.stats.record_store_error();
                }
            }
            return None;
        }

        Some(entry.payload)
    }

    // == Put ==
    /// Stores `payload` under `key` for `ttl`, replacing any prior record.
    ///
    /// # Errors
    /// `InvalidTtl` for a zero TTL; `StoreUnavailable` when the backend fails.
    pub async fn put(&self, key: &CacheKey, payload: Value, ttl: Duration) -> Result<()> {
        let entry = CacheEntry::new(payload, self.clock.now(), ttl)?;
        self.backend.upsert(key, entry).await?;
        Ok(())
    }

    // == Delete ==
    /// Removes the record for `key`. Deleting an absent key succeeds.
    pub async fn delete(&self, key: &CacheKey) -> Result<()> {
        match self.backend.remove(key).await {
            Ok(existed) => {
                debug!(%key, existed, "cache entry deleted");
                Ok(())
            }
            Err(err) => {
                self.stats.record_store_error();
                Err(err.into())
            }
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, MemoryBackend};
    use crate::error::{BackendError, CacheError};
    use async_trait::async_trait;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(60);

    fn key(content: &str) -> CacheKey {
        CacheKey::for_content(content, "ocr").unwrap()
    }

    fn store_with_clock() -> (CacheStore, Arc<MemoryBackend>, Arc<ManualClock>) {
        let backend = Arc::new(MemoryBackend::new());
        let clock = Arc::new(ManualClock::default());
        let store = CacheStore::with_clock(backend.clone(), clock.clone());
        (store, backend, clock)
    }

    /// Backend whose every call fails.
    struct DownBackend;

    #[async_trait]
    impl CacheBackend for DownBackend {
        async fn load(&self, _: &CacheKey) -> std::result::Result<Option<CacheEntry>, BackendError> {
            Err(BackendError::Unavailable("connection refused".into()))
        }
        async fn upsert(&self, _: &CacheKey, _: CacheEntry) -> std::result::Result<(), BackendError> {
            Err(BackendError::Unavailable("connection refused".into()))
        }
        async fn remove(&self, _: &CacheKey) -> std::result::Result<bool, BackendError> {
            Err(BackendError::Unavailable("connection refused".into()))
        }
        async fn remove_expired(
            &self,
            _: &CacheKey,
            _: DateTime<Utc>,
        ) -> std::result::Result<bool, BackendError> {
            Err(BackendError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_store_put_and_get() {
        let (store, _, _) = store_with_clock();

        store.put(&key("a"), json!({"text": "hello"}), TTL).await.unwrap();

        assert_eq!(store.get(&key("a")).await, Some(json!({"text": "hello"})));
        assert_eq!(store.stats().snapshot().hits, 1);
    }

    #[tokio::test]
    async fn test_store_get_nonexistent() {
        let (store, _, _) = store_with_clock();

        assert!(store.get(&key("missing")).await.is_none());
        assert_eq!(store.stats().snapshot().misses, 1);
    }

    #[tokio::test]
    async fn test_store_overwrite_refreshes_expiry() {
        let (store, _, clock) = store_with_clock();

        store.put(&key("a"), json!("v1"), TTL).await.unwrap();
        clock.advance(Duration::from_secs(50));
        store.put(&key("a"), json!("v2"), TTL).await.unwrap();
        clock.advance(Duration::from_secs(50));

        assert_eq!(store.get(&key("a")).await, Some(json!("v2")));
    }

    #[tokio::test]
    async fn test_store_ttl_expiration_evicts() {
        let (store, backend, clock) = store_with_clock();

        store.put(&key("a"), json!("v"), TTL).await.unwrap();
        clock.advance(TTL);

        assert!(store.get(&key("a")).await.is_none());
        assert!(backend.is_empty().await, "stale record should be removed on read");
        assert_eq!(store.stats().snapshot().expired, 1);
    }

    #[tokio::test]
    async fn test_store_zero_ttl_rejected() {
        let (store, backend, _) = store_with_clock();

        let result = store.put(&key("a"), json!("v"), Duration::ZERO).await;

        assert!(matches!(result, Err(CacheError::InvalidTtl(_))));
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_delete_is_idempotent() {
        let (store, _, _) = store_with_clock();

        store.put(&key("a"), json!("v"), TTL).await.unwrap();
        store.delete(&key("a")).await.unwrap();
        store.delete(&key("a")).await.unwrap();

        assert!(store.get(&key("a")).await.is_none());
    }

    #[tokio::test]
    async fn test_store_peek_does_not_count() {
        let (store, _, _) = store_with_clock();

        store.put(&key("a"), json!("v"), TTL).await.unwrap();
        assert!(store.peek(&key("a")).await.is_some());
        assert!(store.peek(&key("b")).await.is_none());

        let snap = store.stats().snapshot();
        assert_eq!(snap.hits + snap.misses, 0);
    }

    #[tokio::test]
    async fn test_store_unavailable_reads_as_miss() {
        let store = CacheStore::new(Arc::new(DownBackend));

        assert!(store.get(&key("a")).await.is_none());

        let snap = store.stats().snapshot();
        assert_eq!(snap.misses, 1);
        assert_eq!(snap.store_errors, 1);
    }

    #[tokio::test]
    async fn test_store_unavailable_write_and_delete_report_error() {
        let store = CacheStore::new(Arc::new(DownBackend));

        let put = store.put(&key("a"), json!("v"), TTL).await;
        let del = store.delete(&key("a")).await;

        assert!(matches!(put, Err(CacheError::StoreUnavailable(_))));
        assert!(matches!(del, Err(CacheError::StoreUnavailable(_))));
    }
}
