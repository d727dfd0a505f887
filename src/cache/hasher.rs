//! Content Hasher Module
//!
//! Derives cache digests from raw request content.

use sha2::{Digest, Sha256};

/// Length of a rendered digest: 256 bits as lowercase hex.
pub const DIGEST_HEX_LEN: usize = 64;

// == Content Hasher ==
/// SHA-256 digest of arbitrary content, rendered as lowercase hex.
///
/// This is the only way cache keys are derived. Accidental collisions
/// are not checked for.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher;

impl ContentHasher {
    /// Digests `content`. Pure and infallible.
    pub fn digest(content: impl AsRef<[u8]>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_ref());
        hex::encode(hasher.finalize())
    }
}
