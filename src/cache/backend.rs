//! Backend Module
//!
//! Port to the persistent key-value store that holds cache records, plus
//! an in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::cache::{CacheEntry, CacheKey};
use crate::error::BackendError;

// == Backend Trait ==
/// Persistent store keyed by (digest, category).
///
/// Every method is expected to be a single atomic operation at the
/// storage layer; callers add no locking of their own.
#[async_trait]
pub trait CacheBackend: Send + Sync + 'static {
    /// Point lookup. Returns the record regardless of expiry.
    async fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, BackendError>;

    /// Inserts or replaces the record for `key`.
    async fn upsert(&self, key: &CacheKey, entry: CacheEntry) -> Result<(), BackendError>;

    /// Deletes the record for `key`, returning whether one existed.
    async fn remove(&self, key: &CacheKey) -> Result<bool, BackendError>;

    /// Deletes the record for `key` only if it is stale at `now`.
    ///
    /// The expiry check and the delete must be one step, so a record
    /// upserted after the caller's load survives
    /// (`DELETE ... WHERE expires_at <= now` in SQL terms).
    async fn remove_expired(&self, key: &CacheKey, now: DateTime<Utc>) -> Result<bool, BackendError>;
}

// == Memory Backend ==
/// HashMap-backed store for single-process deployments and tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    // == Purge Expired ==
    /// Removes every record stale at `now`.
    ///
    /// Returns the number of records removed.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, BackendError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn upsert(&self, key: &CacheKey, entry: CacheEntry) -> Result<(), BackendError> {
        self.entries.write().await.insert(key.clone(), entry);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool, BackendError> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn remove_expired(&self, key: &CacheKey, now: DateTime<Utc>) -> Result<bool, BackendError> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired_at(now) => {
                entries.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn entry(payload: serde_json::Value, now: DateTime<Utc>, ttl_secs: u64) -> CacheEntry {
        CacheEntry::new(payload, now, Duration::from_secs(ttl_secs)).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_and_load() {
        let backend = MemoryBackend::new();
        let key = CacheKey::for_content("page 1", "ocr").unwrap();
        let now = Utc::now();

        backend.upsert(&key, entry(json!("text"), now, 60)).await.unwrap();

        let loaded = backend.load(&key).await.unwrap().unwrap();
        assert_eq!(loaded.payload, json!("text"));
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let backend = MemoryBackend::new();
        let key = CacheKey::for_content("page 1", "ocr").unwrap();
        let now = Utc::now();

        backend.upsert(&key, entry(json!("v1"), now, 60)).await.unwrap();
        backend.upsert(&key, entry(json!("v2"), now, 120)).await.unwrap();

        let loaded = backend.load(&key).await.unwrap().unwrap();
        assert_eq!(loaded.payload, json!("v2"));
        assert_eq!(loaded.expires_at - now, chrono::Duration::seconds(120));
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_reports_presence() {
        let backend = MemoryBackend::new();
        let key = CacheKey::for_content("page 1", "ocr").unwrap();

        assert!(!backend.remove(&key).await.unwrap());
        backend.upsert(&key, entry(json!(1), Utc::now(), 60)).await.unwrap();
        assert!(backend.remove(&key).await.unwrap());
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_expired_keeps_fresh_record() {
        let backend = MemoryBackend::new();
        let key = CacheKey::for_content("page 1", "ocr").unwrap();
        let now = Utc::now();

        backend.upsert(&key, entry(json!("v1"), now, 60)).await.unwrap();
        let later = now + chrono::Duration::seconds(90);
        backend.upsert(&key, entry(json!("v2"), later, 60)).await.unwrap();

        assert!(!backend.remove_expired(&key, later).await.unwrap());
        assert_eq!(backend.load(&key).await.unwrap().unwrap().payload, json!("v2"));

        let stale_at = later + chrono::Duration::seconds(60);
        assert!(backend.remove_expired(&key, stale_at).await.unwrap());
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        let short = CacheKey::for_content("short", "ocr").unwrap();
        let long = CacheKey::for_content("long", "ocr").unwrap();

        backend.upsert(&short, entry(json!(1), now, 1)).await.unwrap();
        backend.upsert(&long, entry(json!(2), now, 3600)).await.unwrap();

        let removed = backend.purge_expired(now + chrono::Duration::seconds(5)).await;
        assert_eq!(removed, 1);
        assert!(backend.load(&short).await.unwrap().is_none());
        assert!(backend.load(&long).await.unwrap().is_some());
    }
}
