//! In-flight Computation Module
//!
//! Process-wide map from cache key to the provider call currently
//! running for it, so concurrent misses share one call.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tracing::debug;

use crate::cache::CacheKey;
use crate::error::Result;

/// A provider call that any number of callers can await.
pub type SharedComputation = Shared<BoxFuture<'static, Result<Value>>>;

// == Inflight Map ==
#[derive(Default)]
pub struct InflightMap {
    slots: Mutex<HashMap<CacheKey, SharedComputation>>,
}

impl fmt::Debug for InflightMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InflightMap")
            .field("in_flight", &self.len())
            .finish()
    }
}

/// Outcome of registering interest in a key.
pub enum Slot {
    /// No computation was running; the caller's one is now registered.
    Leader {
        computation: SharedComputation,
        guard: InflightGuard,
    },
    /// Another caller's computation is already running for this key.
    Follower(SharedComputation),
}

impl InflightMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<CacheKey, SharedComputation>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    // == Join Or Register ==
    /// Attaches to the running computation for `key`, or registers
    /// `computation` as the running one.
    ///
    /// `computation` is only polled if it wins; a follower's is dropped
    /// without running.
    pub fn join_or_register(
        self: &Arc<Self>,
        key: &CacheKey,
        computation: BoxFuture<'static, Result<Value>>,
    ) -> Slot {
        let mut slots = self.slots();
        if let Some(running) = slots.get(key) {
            debug!(%key, "joining in-flight computation");
            return Slot::Follower(running.clone());
        }

        let shared = computation.shared();
        slots.insert(key.clone(), shared.clone());
        Slot::Leader {
            computation: shared.clone(),
            guard: InflightGuard {
                map: Arc::clone(self),
                key: key.clone(),
                computation: shared,
            },
        }
    }

    // == Forget ==
    /// Detaches `key` so later callers start a fresh computation.
    ///
    /// Callers already waiting keep their shared result.
    pub fn forget(&self, key: &CacheKey) -> bool {
        self.slots().remove(key).is_some()
    }

    /// Number of keys with a registered computation.
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.slots().contains_key(key)
    }
}

// == Inflight Guard ==
/// Unregisters the leader's computation when dropped.
///
/// Only removes the slot if it still holds this guard's computation, so
/// a stale guard never evicts a newer registration.
pub struct InflightGuard {
    map: Arc<InflightMap>,
    key: CacheKey,
    computation: SharedComputation,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        let mut slots = self.map.slots();
        let ours = slots
            .get(&self.key)
            .is_some_and(|running| running.ptr_eq(&self.computation));
        if ours {
            slots.remove(&self.key);
        }
    }
}
