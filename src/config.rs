//! Configuration Module
//!
//! Immutable cache configuration with documented defaults, validated once when
//! the cache is constructed.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Default entry lifetime: 24 hours
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Default sharding depth
pub const DEFAULT_PATH_DEPTH: usize = 1;

/// Default garbage collection interval: 1 hour
pub const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Upper bound for `path_depth`, one directory per hex digit of a SHA-256 digest
pub const MAX_PATH_DEPTH: usize = 64;

/// File cache configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Root directory for all stored entries
    pub cache_path: PathBuf,
    /// Lifetime applied by `set` when no explicit timeout is given
    pub timeout: Duration,
    /// Number of single-hex-digit directory levels above each entry
    pub path_depth: usize,
    /// Suffix appended verbatim to every entry filename, e.g. `.json`
    pub file_ext: String,
    /// Time between background garbage collection sweeps
    pub gc_interval: Duration,
}

impl CacheConfig {
    /// Creates a configuration rooted at `cache_path` with default settings.
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            timeout: DEFAULT_TIMEOUT,
            path_depth: DEFAULT_PATH_DEPTH,
            file_ext: String::new(),
            gc_interval: DEFAULT_GC_INTERVAL,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_path_depth(mut self, path_depth: usize) -> Self {
        self.path_depth = path_depth;
        self
    }

    pub fn with_file_ext(mut self, file_ext: impl Into<String>) -> Self {
        self.file_ext = file_ext.into();
        self
    }

    pub fn with_gc_interval(mut self, gc_interval: Duration) -> Self {
        self.gc_interval = gc_interval;
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_PATH` - Root directory (required)
    /// - `CACHE_TIMEOUT_MS` - Default entry lifetime in milliseconds (default: 86400000)
    /// - `CACHE_PATH_DEPTH` - Sharding depth (default: 1)
    /// - `CACHE_FILE_EXT` - Filename suffix (default: none)
    /// - `CACHE_GC_INTERVAL_SECS` - Sweep frequency in seconds (default: 3600)
    ///
    /// Unparsable optional values fall back to their defaults.
    pub fn from_env() -> Result<Self> {
        let cache_path = env::var("CACHE_PATH")
            .map_err(|_| CacheError::InvalidConfig("CACHE_PATH must be set".to_string()))?;

        let config = Self {
            cache_path: PathBuf::from(cache_path),
            timeout: env::var("CACHE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_TIMEOUT),
            path_depth: env::var("CACHE_PATH_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PATH_DEPTH),
            file_ext: env::var("CACHE_FILE_EXT").unwrap_or_default(),
            gc_interval: env::var("CACHE_GC_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_GC_INTERVAL),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration, failing fast on programmer error.
    pub fn validate(&self) -> Result<()> {
        if self.cache_path.as_os_str().is_empty() {
            return Err(CacheError::InvalidConfig(
                "cache_path must be set".to_string(),
            ));
        }
        if self.path_depth == 0 || self.path_depth > MAX_PATH_DEPTH {
            return Err(CacheError::InvalidConfig(format!(
                "path_depth must be between 1 and {}, got {}",
                MAX_PATH_DEPTH, self.path_depth
            )));
        }
        if self.file_ext.contains(['/', '\\']) {
            return Err(CacheError::InvalidConfig(format!(
                "file_ext must not contain path separators: {:?}",
                self.file_ext
            )));
        }
        if self.gc_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "gc_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
