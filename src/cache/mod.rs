//! Cache Module
//!
//! Content-addressed, TTL-based memoization of AI provider responses.

mod backend;
mod clock;
mod coordinator;
mod entry;
mod epoch;
mod hasher;
mod inflight;
mod invalidator;
mod key;
mod stats;
mod store;


// Re-export public types
pub use backend::{CacheBackend, MemoryBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::{CacheCoordinator, CoordinatorConfig, Fetched};
pub use entry::{expiry_for, validate_ttl, CacheEntry};
pub use epoch::{EpochLock, EpochTicket, KeyEpochs};
pub use hasher::{ContentHasher, DIGEST_HEX_LEN};
pub use inflight::{InflightGuard, InflightMap, SharedComputation, Slot};
pub use invalidator::Invalidator;
pub use key::{
    CacheKey, CATEGORY_ESSAY_REVIEW, CATEGORY_OCR, CATEGORY_UNIVERSITY_MATCH, MAX_CATEGORY_LENGTH,
};
pub use stats::{CacheStats, StatsSnapshot};
pub use store::CacheStore;
