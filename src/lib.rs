//! File Cache - A filesystem-backed cache with TTL expiry
//!
//! Values are serialized into JSON envelopes carrying their expiry time and
//! stored one file per key, under directories sharded by the key's SHA-256
//! digest. Expired entries are purged when read and by a background sweep.
//!
//! ```no_run
//! use std::time::Duration;
//! use file_cache::{CacheConfig, FileCache};
//!
//! # async fn demo() -> file_cache::Result<()> {
//! let cache = FileCache::new(CacheConfig::new("/var/cache/app").with_path_depth(2))?;
//! cache.set_with_timeout("user:42", "Ann", Duration::from_secs(60)).await;
//! let name: Option<String> = cache.get("user:42").await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheObserver, CacheStats, FileCache, FileStore, Store};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::{sweep, SweepReport, ABANDONED_WRITE_AGE};
