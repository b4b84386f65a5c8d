//! File Cache Module
//!
//! Public cache API composing path mapping, the envelope codec and a byte
//! [`Store`]. Reads and writes never surface I/O failures: a failed read is a
//! miss and a failed write is silently dropped, with the underlying error
//! handed to the configured [`CacheObserver`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::envelope;
use crate::cache::observer::{CacheObserver, DiscardReason, Operation, TracingObserver};
use crate::cache::path::relative_path;
use crate::cache::stats::{CacheStats, StatsRecorder};
use crate::cache::store::{FileStore, Store};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::{self, SweepReport};

// == File Cache ==
/// Filesystem-backed cache with per-entry expiry.
///
/// There is no key-level locking. Concurrent writers to the same key race
/// and the last one wins; a reader that loses a race with a delete simply
/// sees a miss.
///
/// # Known limitation
/// `set` and `delete` report nothing back. A write that fails (disk full,
/// permission denied) is indistinguishable from one that succeeded, except
/// through the observer hook, [`FileCache::stats`], or a later miss.
pub struct FileCache<S: Store = FileStore> {
    config: CacheConfig,
    store: S,
    observer: Arc<dyn CacheObserver>,
    stats: Arc<StatsRecorder>,
    gc_handle: Option<JoinHandle<()>>,
}

impl FileCache<FileStore> {
    // == Constructor ==
    /// Creates a cache stored under `config.cache_path`, logging swallowed
    /// errors through [`TracingObserver`].
    ///
    /// Starts the background GC task on the current Tokio runtime. Outside a
    /// runtime the cache still works but runs no background sweeps; use
    /// [`FileCache::sweep_now`] instead. Fails only when the configuration is
    /// invalid.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    /// Like [`FileCache::new`] but reporting to a custom observer.
    pub fn with_observer(config: CacheConfig, observer: Arc<dyn CacheObserver>) -> Result<Self> {
        config.validate()?;
        let stats = Arc::new(StatsRecorder::default());
        let gc_handle = match Handle::try_current() {
            Ok(runtime) => Some(tasks::spawn_gc_task(
                &runtime,
                config.cache_path.clone(),
                config.gc_interval,
                observer.clone(),
                stats.clone(),
            )),
            Err(e) => {
                warn!(
                    cache_path = %config.cache_path.display(),
                    error = %e,
                    "No Tokio runtime, background cache GC disabled"
                );
                None
            }
        };

        Ok(Self {
            store: FileStore::new(&config.cache_path),
            config,
            observer,
            stats,
            gc_handle,
        })
    }

    /// Absolute on-disk location of the entry for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.store.full_path(&self.relative_path(key))
    }
}

impl<S: Store> FileCache<S> {
    /// Creates a cache over an arbitrary store.
    ///
    /// No GC task is started; call [`FileCache::sweep_now`] to collect
    /// expired files under `config.cache_path` when the store lives there.
    pub fn with_store(
        config: CacheConfig,
        store: S,
        observer: Arc<dyn CacheObserver>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            observer,
            stats: Arc::new(StatsRecorder::default()),
            gc_handle: None,
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Path of the entry for `key`, relative to the cache root.
    pub fn relative_path(&self, key: &str) -> PathBuf {
        relative_path(key, self.config.path_depth, &self.config.file_ext)
    }

    // == Get ==
    /// Retrieves the value stored under `key`.
    ///
    /// Returns `None` when the entry is missing, expired, undecodable as `T`,
    /// or unreadable. Expired and undecodable entries are deleted on the way
    /// out.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.relative_path(key);

        let bytes = match self.store.get(&path).await {
            Ok(Some(bytes)) if !bytes.is_empty() => bytes,
            Ok(_) => {
                self.stats.record_miss();
                return None;
            }
            Err(e) => {
                self.report_io_error(Operation::Get, &path, e);
                self.stats.record_miss();
                return None;
            }
        };

        let reason = match envelope::decode::<T>(&bytes) {
            Ok(envelope) if !envelope.is_expired() => {
                self.stats.record_hit();
                return Some(envelope.content);
            }
            Ok(_) => {
                self.stats.record_expired();
                DiscardReason::Expired
            }
            Err(e) => {
                debug!(key, error = %e, "Undecodable cache entry");
                self.stats.record_corrupt();
                DiscardReason::Corrupt
            }
        };

        self.stats.record_miss();
        self.observer.on_discard(&path, reason);
        self.remove(Operation::Get, &path).await;
        None
    }

    // == Set ==
    /// Stores `value` under `key` for the configured default timeout.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        self.set_with_timeout(key, value, self.config.timeout).await;
    }

    /// Stores `value` under `key`, expiring `timeout` from now. Any existing
    /// entry is overwritten. Failures are swallowed.
    pub async fn set_with_timeout<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        timeout: Duration,
    ) {
        let path = self.relative_path(key);

        let bytes = match envelope::encode(value, timeout) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.stats.record_encode_error();
                self.observer.on_error(Operation::Set, &path, &e);
                return;
            }
        };

        if let Err(e) = self.store.set(&path, &bytes).await {
            self.report_io_error(Operation::Set, &path, e);
        }
    }

    // == Delete ==
    /// Removes the entry for `key`. Deleting a missing key is not an error.
    pub async fn delete(&self, key: &str) {
        let path = self.relative_path(key);
        self.remove(Operation::Delete, &path).await;
    }

    // == Maintenance ==
    /// Runs one garbage collection sweep over the cache root right away.
    pub async fn sweep_now(&self) -> SweepReport {
        let report = tasks::sweep(&self.config.cache_path, self.observer.as_ref()).await;
        self.stats.record_swept(report.removed());
        self.observer.on_sweep(&report);
        report
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Stops the background GC task. Dropping the cache has the same effect.
    pub fn shutdown(mut self) {
        self.stop_gc();
    }

    fn stop_gc(&mut self) {
        if let Some(handle) = self.gc_handle.take() {
            handle.abort();
            debug!(cache_path = %self.config.cache_path.display(), "Cache GC task stopped");
        }
    }

    async fn remove(&self, op: Operation, path: &Path) {
        if let Err(e) = self.store.delete(path).await {
            self.report_io_error(op, path, e);
        }
    }

    fn report_io_error(&self, op: Operation, path: &Path, source: std::io::Error) {
        self.stats.record_io_error();
        self.observer.on_error(op, path, &CacheError::io(path, source));
    }
}

impl<S: Store> Drop for FileCache<S> {
    fn drop(&mut self) {
        self.stop_gc();
    }
}
