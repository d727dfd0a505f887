//! Cache Statistics Module
//!
//! Tracks cache effectiveness: hits, misses, provider calls and store health.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Lock-free counters shared by the store, coordinator and invalidator.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    store_errors: AtomicU64,
    computes: AtomicU64,
    compute_failures: AtomicU64,
    coalesced: AtomicU64,
    writes: AtomicU64,
    write_failures: AtomicU64,
    invalidations: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Lookups answered from the store
    pub hits: u64,
    /// Lookups that found nothing usable (absent, expired or store down)
    pub misses: u64,
    /// Stale records evicted on read
    pub expired: u64,
    /// Store reads or deletes that failed
    pub store_errors: u64,
    /// Provider invocations
    pub computes: u64,
    /// Provider invocations that failed or timed out
    pub compute_failures: u64,
    /// Callers that joined another caller's in-flight computation
    pub coalesced: u64,
    /// Background writes that landed
    pub writes: u64,
    /// Background writes that were dropped
    pub write_failures: u64,
    /// Explicit invalidations
    pub invalidations: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

macro_rules! counter {
    ($record:ident, $field:ident) => {
        pub fn $record(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
        }
    };
}

impl CacheStats {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    counter!(record_hit, hits);
    counter!(record_miss, misses);
    counter!(record_expired, expired);
    counter!(record_store_error, store_errors);
    counter!(record_compute, computes);
    counter!(record_compute_failure, compute_failures);
    counter!(record_coalesced, coalesced);
    counter!(record_write, writes);
    counter!(record_write_failure, write_failures);
    counter!(record_invalidation, invalidations);

    // == Snapshot ==
    pub fn snapshot(&self) -> StatsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        StatsSnapshot {
            hits,
            misses,
            expired: self.expired.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            computes: self.computes.load(Ordering::Relaxed),
            compute_failures: self.compute_failures.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            hit_rate: hit_rate(hits, misses),
        }
    }
}

// == Hit Rate ==
/// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new().snapshot();
        assert_eq!(stats, StatsSnapshot::default());
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::new().snapshot().hit_rate, 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.snapshot().hit_rate, 0.75);
    }

    #[test]
    fn test_counters_are_independent() {
        let stats = CacheStats::new();
        stats.record_compute();
        stats.record_compute();
        stats.record_compute_failure();
        stats.record_coalesced();
        stats.record_write_failure();

        let snap = stats.snapshot();
        assert_eq!(snap.computes, 2);
        assert_eq!(snap.compute_failures, 1);
        assert_eq!(snap.coalesced, 1);
        assert_eq!(snap.write_failures, 1);
        assert_eq!(snap.writes, 0);
        assert_eq!(snap.hits, 0);
    }
}
