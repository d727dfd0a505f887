//! Cache Entry Module
//!
//! Defines the stored record for one cached provider response.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CacheError, Result};

// == Cache Entry ==
/// A cached provider response with its expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Serialized provider response, opaque to the cache
    pub payload: Value,
    /// When the entry was written
    pub created_at: DateTime<Utc>,
    /// After this instant the entry is stale
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl` after `now`.
    ///
    /// # Errors
    /// `InvalidTtl` when `ttl` is zero or pushes `expires_at` out of range.
    pub fn new(payload: Value, now: DateTime<Utc>, ttl: Duration) -> Result<Self> {
        Ok(Self {
            payload,
            created_at: now,
            expires_at: expiry_for(now, ttl)?,
        })
    }

    // == Is Expired ==
    /// Checks if the entry is stale at `now`.
    ///
    /// Boundary condition: an entry is expired once `now >= expires_at`,
    /// so an entry is never served at its exact expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Remaining lifetime at `now`, zero once expired.
    pub fn ttl_remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}

// == Utility Functions ==
/// Computes `now + ttl`, rejecting zero and out-of-range TTLs.
pub fn expiry_for(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>> {
    validate_ttl(ttl)?;
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| CacheError::InvalidTtl(format!("TTL {:?} is out of range", ttl)))
}

/// Rejects a zero TTL.
pub fn validate_ttl(ttl: Duration) -> Result<()> {
    if ttl.is_zero() {
        return Err(CacheError::InvalidTtl(
            "TTL must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
