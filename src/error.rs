//! Error types for the AI response cache
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Backend Error Enum ==
/// Failures reported by a persistent store backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The store could not be reached or refused the operation
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The store returned a record that could not be read back
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Cloneable so that a single coalesced computation can hand the same
/// failure to every waiting caller.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Caller supplied a zero or out-of-range TTL
    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),

    /// Malformed request data (empty category and the like)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Nothing cached under the requested key
    #[error("Not cached: {0}")]
    NotCached(String),

    /// Persistent store I/O failed
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] BackendError),

    /// The provider call failed; the original error is kept intact
    #[error("Compute failed: {0}")]
    ComputeFailed(Arc<anyhow::Error>),

    /// The provider call exceeded the configured deadline
    #[error("Compute timed out after {0:?}")]
    ComputeTimedOut(Duration),

    /// The payload could not be converted to or from its stored form
    #[error("Payload codec error: {0}")]
    Codec(String),
}

impl CacheError {
    /// Wraps a provider failure without altering it.
    pub fn compute_failed(err: impl Into<anyhow::Error>) -> Self {
        CacheError::ComputeFailed(Arc::new(err.into()))
    }

    /// Returns the provider's original error, if this is a compute failure.
    pub fn compute_error(&self) -> Option<&anyhow::Error> {
        match self {
            CacheError::ComputeFailed(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidTtl(_) | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::NotCached(_) => StatusCode::NOT_FOUND,
            CacheError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::ComputeFailed(_) => StatusCode::BAD_GATEWAY,
            CacheError::ComputeTimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
            CacheError::Codec(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("provider quota exceeded")]
    struct QuotaExceeded;

    #[test]
    fn test_compute_error_is_downcastable() {
        let err = CacheError::compute_failed(QuotaExceeded);
        let inner = err.compute_error().unwrap();
        assert!(inner.downcast_ref::<QuotaExceeded>().is_some());
        assert_eq!(err.to_string(), "Compute failed: provider quota exceeded");
    }

    #[test]
    fn test_backend_error_converts_to_store_unavailable() {
        let err: CacheError = BackendError::Unavailable("connection refused".into()).into();
        assert!(matches!(err, CacheError::StoreUnavailable(_)));
        assert!(err.compute_error().is_none());
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (CacheError::InvalidTtl("0s".into()), StatusCode::BAD_REQUEST),
            (CacheError::NotCached("ocr:ab".into()), StatusCode::NOT_FOUND),
            (
                CacheError::StoreUnavailable(BackendError::Unavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (CacheError::compute_failed(QuotaExceeded), StatusCode::BAD_GATEWAY),
            (
                CacheError::ComputeTimedOut(Duration::from_secs(1)),
                StatusCode::GATEWAY_TIMEOUT,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
