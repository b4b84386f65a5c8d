//! Garbage Collection Task
//!
//! Walks the cache directory and removes entries that have expired or can no
//! longer be decoded. Runs beside client traffic without taking any locks.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::de::IgnoredAny;
use serde::Serialize;
use tokio::fs;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::cache::envelope::{self, current_timestamp_ms};
use crate::cache::stats::StatsRecorder;
use crate::cache::store::is_temp_file;
use crate::cache::{CacheObserver, Operation};
use crate::error::CacheError;

/// Temp files older than this are leftovers from interrupted writes
pub const ABANDONED_WRITE_AGE: Duration = Duration::from_secs(60 * 60);

// == Sweep Report ==
/// Outcome of a single sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Entry files visited
    pub scanned: u64,
    /// Files removed because their envelope had expired
    pub expired: u64,
    /// Files removed because they could not be decoded
    pub corrupt: u64,
    /// Stale temp files from interrupted writes removed
    pub abandoned: u64,
    /// Files that could not be read or removed
    pub failed: u64,
}

impl SweepReport {
    /// Total number of files removed.
    pub fn removed(&self) -> u64 {
        self.expired + self.corrupt + self.abandoned
    }
}

// == Sweep ==
/// Removes every expired or undecodable entry under `cache_path`.
///
/// Best effort: files that vanish mid-sweep are skipped, and read or delete
/// failures are counted and handed to `observer`. Empty files and temp files
/// of writes still in flight are left alone. A missing cache root yields an
/// empty report.
pub async fn sweep(cache_path: &Path, observer: &dyn CacheObserver) -> SweepReport {
    let now = current_timestamp_ms();
    let mut report = SweepReport::default();

    let root = cache_path.to_path_buf();
    let files = match tokio::task::spawn_blocking(move || list_files(&root)).await {
        Ok(files) => files,
        Err(e) => {
            debug!(cache_path = %cache_path.display(), error = %e, "Cache GC: listing task failed");
            return report;
        }
    };

    for path in files {
        if is_temp_file(&path) {
            sweep_temp_file(cache_path, &path, &mut report, observer).await;
        } else {
            sweep_file(cache_path, &path, now, &mut report, observer).await;
        }
    }

    report
}

/// Lists every regular file below `root`, skipping unreadable directories.
fn list_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                if e.io_error().map(|io| io.kind()) != Some(ErrorKind::NotFound) {
                    debug!(error = %e, "Cache GC: cannot list entry");
                }
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

async fn sweep_file(
    root: &Path,
    path: &Path,
    now: u64,
    report: &mut SweepReport,
    observer: &dyn CacheObserver,
) {
    report.scanned += 1;

    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return,
        Err(e) => {
            report_failure(root, path, e, report, observer);
            return;
        }
    };
    if bytes.is_empty() {
        return;
    }

    let expired = match envelope::decode::<IgnoredAny>(&bytes) {
        Ok(envelope) if envelope.is_expired_at(now) => true,
        Ok(_) => return,
        Err(_) => false,
    };

    match fs::remove_file(path).await {
        Ok(()) if expired => report.expired += 1,
        Ok(()) => report.corrupt += 1,
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => report_failure(root, path, e, report, observer),
    }
}

async fn sweep_temp_file(
    root: &Path,
    path: &Path,
    report: &mut SweepReport,
    observer: &dyn CacheObserver,
) {
    let Ok(modified) = fs::metadata(path).await.and_then(|meta| meta.modified()) else {
        return;
    };
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO);
    if age < ABANDONED_WRITE_AGE {
        return;
    }

    match fs::remove_file(path).await {
        Ok(()) => report.abandoned += 1,
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => report_failure(root, path, e, report, observer),
    }
}

fn report_failure(
    root: &Path,
    path: &Path,
    error: std::io::Error,
    report: &mut SweepReport,
    observer: &dyn CacheObserver,
) {
    report.failed += 1;
    let relative = path.strip_prefix(root).unwrap_or(path);
    observer.on_error(Operation::Sweep, relative, &CacheError::io(relative, error));
}

// == Scheduled Task ==
/// Spawns a background task on `runtime` that sweeps `cache_path`
/// immediately and then once per `interval`.
///
/// The returned handle is owned by the cache and aborted on shutdown.
pub(crate) fn spawn_gc_task(
    runtime: &Handle,
    cache_path: PathBuf,
    interval: Duration,
    observer: Arc<dyn CacheObserver>,
    stats: Arc<StatsRecorder>,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        info!(
            cache_path = %cache_path.display(),
            ?interval,
            "Starting cache GC task"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // First tick completes immediately
            ticker.tick().await;

            let report = sweep(&cache_path, observer.as_ref()).await;
            stats.record_swept(report.removed());
            observer.on_sweep(&report);
        }
    })
}
