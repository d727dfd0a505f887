//! Expiry Sweep Task
//!
//! Optional background task that purges expired records from an
//! in-memory backend. Reads evict stale records lazily; the sweep
//! catches keys that are never read again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{Clock, MemoryBackend};

/// Spawns a task that purges expired records every `interval_secs`.
///
/// # Arguments
/// * `backend` - The in-memory backend to sweep
/// * `clock` - Time source used for expiry decisions
/// * `interval_secs` - Seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let backend = Arc::new(MemoryBackend::new());
/// let handle = spawn_cleanup_task(backend.clone(), Arc::new(SystemClock), 60);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task(
    backend: Arc<MemoryBackend>,
    clock: Arc<dyn Clock>,
    interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = backend.purge_expired(clock.now()).await;

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheBackend, CacheEntry, CacheKey, ManualClock};
    use serde_json::json;

    async fn seed(backend: &MemoryBackend, clock: &ManualClock, content: &str, ttl_secs: u64) -> CacheKey {
        let key = CacheKey::for_content(content, "university_match").unwrap();
        let entry = CacheEntry::new(json!(content), clock.now(), Duration::from_secs(ttl_secs)).unwrap();
        backend.upsert(&key, entry).await.unwrap();
        key
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_entries() {
        let backend = Arc::new(MemoryBackend::new());
        let clock = Arc::new(ManualClock::default());
        let stale = seed(&backend, &clock, "stale", 10).await;
        let fresh = seed(&backend, &clock, "fresh", 3600).await;

        let handle = spawn_cleanup_task(backend.clone(), clock.clone(), 1);
        clock.advance(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(backend.load(&stale).await.unwrap().is_none());
        assert!(backend.load(&fresh).await.unwrap().is_some());

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_can_be_aborted() {
        let backend = Arc::new(MemoryBackend::new());
        let handle = spawn_cleanup_task(backend, Arc::new(ManualClock::default()), 1);

        handle.abort();

        let result = handle.await;
        assert!(result.unwrap_err().is_cancelled());
    }
}
