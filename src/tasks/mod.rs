//! Background Tasks Module
//!
//! Contains background tasks that run alongside cache traffic.
//!
//! # Tasks
//! - Garbage collection: removes expired and corrupt entries from disk at the
//!   configured interval

mod gc;

pub(crate) use gc::spawn_gc_task;
pub use gc::{sweep, SweepReport, ABANDONED_WRITE_AGE};
