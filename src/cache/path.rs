//! Key to Path Mapping
//!
//! Derives a deterministic, sharded relative file path from a cache key.

use std::path::PathBuf;

use sha2::{Digest, Sha256};

/// Returns the lowercase hex SHA-256 digest of `key`.
pub fn key_digest(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

// == Relative Path ==
/// Maps a cache key to its path relative to the cache root.
///
/// Each of the first `depth` hex characters of the digest becomes one
/// directory level, and the file itself is named after the full digest with
/// `ext` appended verbatim. With `depth = 2` the key `"test"` maps to
/// `9/f/9f86d081884c7d65...`.
///
/// `depth` is clamped to the digest length; [`CacheConfig::validate`] rejects
/// larger values up front.
///
/// [`CacheConfig::validate`]: crate::config::CacheConfig::validate
pub fn relative_path(key: &str, depth: usize, ext: &str) -> PathBuf {
    let digest = key_digest(key);
    let mut path: PathBuf = digest
        .chars()
        .take(depth)
        .map(String::from)
        .collect();
    path.push(format!("{digest}{ext}"));
    path
}
