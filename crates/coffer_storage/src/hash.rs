//! Content hashing.

use coffer_error::{StorageError, StorageErrorKind};
use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of `data` as lowercase hex.
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Verify content hash matches expected hash.
pub(crate) fn verify_hash(data: &[u8], expected_hash: &str) -> Result<(), StorageError> {
    let actual_hash = content_hash(data);
    if actual_hash != expected_hash {
        return Err(StorageError::new(StorageErrorKind::HashMismatch {
            expected: expected_hash.to_string(),
            actual: actual_hash,
        }));
    }
    Ok(())
}
