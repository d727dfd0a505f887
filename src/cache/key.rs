//! Cache Key Module
//!
//! Composite key made of a content digest and a query category.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cache::ContentHasher;
use crate::error::{CacheError, Result};

/// Category used for document OCR results.
pub const CATEGORY_OCR: &str = "ocr";
/// Category used for essay review results.
pub const CATEGORY_ESSAY_REVIEW: &str = "essay_review";
/// Category used for university matching results.
pub const CATEGORY_UNIVERSITY_MATCH: &str = "university_match";

/// Maximum allowed category length in bytes
pub const MAX_CATEGORY_LENGTH: usize = 64;

// == Cache Key ==
/// Identifies one cache record: (content digest, category).
///
/// Both parts take part in equality, so the same content under two
/// categories maps to two independent records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Hex SHA-256 of the request content
    pub digest: String,
    /// Caller-defined namespace
    pub category: String,
}

impl CacheKey {
    /// Builds a key from an already computed digest.
    pub fn new(digest: impl Into<String>, category: impl Into<String>) -> Result<Self> {
        let digest = digest.into();
        let category = category.into();

        if digest.is_empty() {
            return Err(CacheError::InvalidRequest("Digest cannot be empty".to_string()));
        }
        validate_category(&category)?;

        Ok(Self { digest, category })
    }

    /// Hashes `content` and pairs the digest with `category`.
    pub fn for_content(content: impl AsRef<[u8]>, category: impl Into<String>) -> Result<Self> {
        Self::new(ContentHasher::digest(content), category)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.digest)
    }
}

fn validate_category(category: &str) -> Result<()> {
    if category.is_empty() {
        return Err(CacheError::InvalidRequest(
            "Category cannot be empty".to_string(),
        ));
    }
    if category.len() > MAX_CATEGORY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Category exceeds maximum length of {} bytes",
            MAX_CATEGORY_LENGTH
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_content_different_category() {
        let ocr = CacheKey::for_content("scan.png bytes", CATEGORY_OCR).unwrap();
        let review = CacheKey::for_content("scan.png bytes", CATEGORY_ESSAY_REVIEW).unwrap();

        assert_eq!(ocr.digest, review.digest);
        assert_ne!(ocr, review);
    }

    #[test]
    fn test_display() {
        let key = CacheKey::new("abc123", CATEGORY_UNIVERSITY_MATCH).unwrap();
        assert_eq!(key.to_string(), "university_match:abc123");
    }

    #[test]
    fn test_empty_category_rejected() {
        let result = CacheKey::for_content("anything", "");
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[test]
    fn test_long_category_rejected() {
        let result = CacheKey::for_content("anything", "c".repeat(MAX_CATEGORY_LENGTH + 1));
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[test]
    fn test_empty_digest_rejected() {
        assert!(CacheKey::new("", CATEGORY_OCR).is_err());
    }
}
