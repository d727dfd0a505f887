//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheKey;

/// Response body for `POST /lookup`
#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    /// Hex digest of the content
    pub digest: String,
    /// Category the record lives under
    pub category: String,
    /// The cached provider response
    pub payload: Value,
}

impl LookupResponse {
    pub fn new(key: CacheKey, payload: Value) -> Self {
        Self {
            digest: key.digest,
            category: key.category,
            payload,
        }
    }
}

/// Response body for `POST /invalidate`
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Success message
    pub message: String,
    /// Hex digest of the content
    pub digest: String,
    /// Category the record lived under
    pub category: String,
}

impl InvalidateResponse {
    pub fn new(key: CacheKey) -> Self {
        Self {
            message: format!("Entry '{}' invalidated", key),
            digest: key.digest,
            category: key.category,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
