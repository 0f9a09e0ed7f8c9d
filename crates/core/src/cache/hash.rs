//! Request descriptor keys.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request descriptor.
///
/// Two descriptors with the same method and URL map to the same entry, so a
/// second write for them overwrites the first.
pub fn compute_entry_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
