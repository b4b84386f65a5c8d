//! Observer Hook
//!
//! The public cache API never surfaces I/O failures. Everything it swallows is
//! routed through a [`CacheObserver`] instead, so hosts can attach logging or
//! metrics without changing the get/set/delete contract.

use std::fmt;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::CacheError;
use crate::tasks::SweepReport;

/// Cache operation an event was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Set,
    Delete,
    Sweep,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Get => "get",
            Operation::Set => "set",
            Operation::Delete => "delete",
            Operation::Sweep => "sweep",
        };
        f.write_str(name)
    }
}

/// Why a stored entry was removed on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    Expired,
    Corrupt,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscardReason::Expired => f.write_str("expired"),
            DiscardReason::Corrupt => f.write_str("corrupt"),
        }
    }
}

// == Observer Trait ==
/// Receives events the cache would otherwise drop silently.
///
/// All methods default to no-ops. Paths are relative to the cache root.
pub trait CacheObserver: Send + Sync + 'static {
    /// A store operation failed and the error was swallowed.
    fn on_error(&self, _op: Operation, _path: &Path, _error: &CacheError) {}

    /// An entry was found unusable on read and scheduled for removal.
    fn on_discard(&self, _path: &Path, _reason: DiscardReason) {}

    /// A garbage collection sweep finished.
    fn on_sweep(&self, _report: &SweepReport) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CacheObserver for NoopObserver {}

// == Tracing Observer ==
/// Default observer, reporting events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CacheObserver for TracingObserver {
    fn on_error(&self, op: Operation, path: &Path, error: &CacheError) {
        warn!(%op, path = %path.display(), error = %error, "Cache operation failed");
    }

    fn on_discard(&self, path: &Path, reason: DiscardReason) {
        debug!(path = %path.display(), %reason, "Discarding cache entry");
    }

    fn on_sweep(&self, report: &SweepReport) {
        if report.removed() > 0 {
            info!(
                scanned = report.scanned,
                expired = report.expired,
                corrupt = report.corrupt,
                "Cache GC: removed {} entries",
                report.removed()
            );
        } else {
            debug!(scanned = report.scanned, "Cache GC: no expired entries found");
        }
    }
}
