//! Key Epoch Module
//!
//! Per-key generation counters that order background writes against
//! invalidation. A write carries the generation its computation started
//! under and is dropped if the key was invalidated since.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Mutex as AsyncMutex;

use crate::cache::CacheKey;

#[derive(Debug, Default)]
struct Epoch {
    generation: AtomicU64,
    /// Held across a write or an invalidating delete for this key
    write_lock: AsyncMutex<()>,
}

// == Key Epochs ==
/// Generation registry for keys with outstanding computations.
///
/// A key only has an entry while some `EpochTicket` for it is alive.
#[derive(Default)]
pub struct KeyEpochs {
    epochs: Mutex<HashMap<CacheKey, Arc<Epoch>>>,
}

impl fmt::Debug for KeyEpochs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyEpochs")
            .field("tracked", &self.len())
            .finish()
    }
}

impl KeyEpochs {
    pub fn new() -> Self {
        Self::default()
    }

    fn epochs(&self) -> MutexGuard<'_, HashMap<CacheKey, Arc<Epoch>>> {
        self.epochs.lock().unwrap_or_else(|e| e.into_inner())
    }

    // == Ticket ==
    /// Captures the current generation of `key`.
    ///
    /// Take the ticket before the provider call starts.
    pub fn ticket(self: &Arc<Self>, key: &CacheKey) -> EpochTicket {
        let epoch = Arc::clone(self.epochs().entry(key.clone()).or_default());
        EpochTicket {
            generation: epoch.generation.load(Ordering::SeqCst),
            epochs: Arc::clone(self),
            key: key.clone(),
            epoch,
        }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.epochs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs().is_empty()
    }
}

// == Epoch Ticket ==
/// A key's generation as seen at the time the ticket was taken.
pub struct EpochTicket {
    epochs: Arc<KeyEpochs>,
    key: CacheKey,
    epoch: Arc<Epoch>,
    generation: u64,
}

impl fmt::Debug for EpochTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EpochTicket")
            .field("key", &self.key)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Exclusive access to a key's store record, held by a write or an
/// invalidation while it touches the store.
pub type EpochLock<'a> = tokio::sync::MutexGuard<'a, ()>;

impl EpochTicket {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// True while the key has not been invalidated since the ticket was taken.
    pub fn is_current(&self) -> bool {
        self.epoch.generation.load(Ordering::SeqCst) == self.generation
    }

    /// Locks the key for a write, or returns None if the ticket is stale.
    pub async fn lock_if_current(&self) -> Option<EpochLock<'_>> {
        let lock = self.epoch.write_lock.lock().await;
        self.is_current().then_some(lock)
    }

    /// Locks the key and moves it to a new generation, making every
    /// earlier ticket stale.
    ///
    /// Waits for a write already holding the key to finish first.
    pub async fn advance(&self) -> EpochLock<'_> {
        let lock = self.epoch.write_lock.lock().await;
        self.epoch.generation.fetch_add(1, Ordering::SeqCst);
        lock
    }
}

impl Drop for EpochTicket {
    fn drop(&mut self) {
        let mut epochs = self.epochs.epochs();
        // Map entry plus this ticket: nobody else can observe the generation.
        let last = epochs
            .get(&self.key)
            .is_some_and(|epoch| Arc::ptr_eq(epoch, &self.epoch) && Arc::strong_count(epoch) <= 2);
        if last {
            epochs.remove(&self.key);
        }
    }
}
