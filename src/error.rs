//! Error types for the file cache
//!
//! Provides unified error handling using thiserror. Only `InvalidConfig` ever
//! reaches callers of the public cache API; the other variants are reported to
//! the [`CacheObserver`](crate::cache::CacheObserver) and then swallowed.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the file cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Configuration rejected at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Value could not be serialized into an envelope
    #[error("Failed to encode cache entry: {0}")]
    Encode(#[source] serde_json::Error),

    /// Stored bytes are not a valid envelope
    #[error("Failed to decode cache entry: {0}")]
    Decode(#[source] serde_json::Error),

    /// Underlying store operation failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CacheError {
    /// Wraps an I/O error together with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the file cache.
pub type Result<T> = std::result::Result<T, CacheError>;
