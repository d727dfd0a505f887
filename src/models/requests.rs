//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::cache::CacheKey;
use crate::error::Result;

/// Request body naming one cache record by its source content.
///
/// Used by `POST /lookup` and `POST /invalidate`.
///
/// # Fields
/// - `content`: The exact content the provider was called with
/// - `category`: The query category it was cached under
#[derive(Debug, Clone, Deserialize)]
pub struct ContentRequest {
    /// Raw request content (hashed, never stored)
    pub content: String,
    /// Cache namespace, e.g. `ocr`
    pub category: String,
}

impl ContentRequest {
    /// The cache key a fetch for this content would use.
    ///
    /// Fails with `InvalidRequest` for an empty or oversized category.
    pub fn key(&self) -> Result<CacheKey> {
        CacheKey::for_content(&self.content, self.category.as_str())
    }
}
