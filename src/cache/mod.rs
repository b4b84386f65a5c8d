//! Cache Module
//!
//! Provides a filesystem-backed cache with TTL expiration and sharded
//! on-disk layout.

pub mod envelope;
mod file_cache;
mod observer;
pub mod path;
pub(crate) mod stats;
pub(crate) mod store;


// Re-export public types
pub use envelope::Envelope;
pub use file_cache::FileCache;
pub use observer::{CacheObserver, DiscardReason, NoopObserver, Operation, TracingObserver};
pub use path::relative_path;
pub use stats::CacheStats;
pub use store::{FileStore, Store};
