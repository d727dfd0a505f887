//! Write-back Task
//!
//! Detached store writes issued after a cache miss. The caller never
//! waits on them; their outcome only reaches the log and the stats.
//! A write whose key was invalidated after its computation started is
//! dropped.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::{CacheStore, EpochTicket, InflightGuard};

// == Write Tracker ==
/// Counts outstanding write-backs so shutdown can wait for them to land.
#[derive(Debug, Default)]
pub struct WriteTracker {
    pending: AtomicUsize,
    idle: Notify,
}

impl WriteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes spawned but not finished.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Resolves once no writes are outstanding.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn begin(self: &Arc<Self>) -> PendingWrite {
        self.pending.fetch_add(1, Ordering::SeqCst);
        PendingWrite(Arc::clone(self))
    }
}

/// Decrements the tracker when the write task ends, even on panic or abort.
struct PendingWrite(Arc<WriteTracker>);

impl Drop for PendingWrite {
    fn drop(&mut self) {
        if self.0.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Spawns a detached task that stores `payload` under the ticket's key.
///
/// The store write and an invalidation of the same key never overlap.
/// If the key moved past the ticket's generation, nothing is written.
///
/// `slot` keeps the key's in-flight registration alive until the write
/// lands, so callers arriving in between reuse the finished result
/// instead of recomputing it.
///
/// # Returns
/// The task's JoinHandle. Dropping it leaves the task running.
pub fn spawn_write(
    store: Arc<CacheStore>,
    tracker: &Arc<WriteTracker>,
    ticket: EpochTicket,
    payload: Value,
    ttl: Duration,
    slot: Option<InflightGuard>,
) -> JoinHandle<()> {
    let pending = tracker.begin();

    tokio::spawn(async move {
        let _pending = pending;
        let _slot = slot;
        let key = ticket.key();

        let Some(_lock) = ticket.lock_if_current().await else {
            debug!(%key, "key invalidated during computation, discarding response");
            return;
        };

        match store.put(key, payload, ttl).await {
            Ok(()) => {
                store.stats().record_write();
                debug!(%key, ttl_secs = ttl.as_secs(), "cached provider response");
            }
            Err(err) => {
                store.stats().record_write_failure();
                warn!(%key, error = %err, "failed to cache provider response");
            }
        }
    })
}
