//! Cooperative cancellation for a grab run.
//!
//! The consumer keeps one clone of the [`CancelToken`] and hands another to
//! the run. Page fetches, HEAD probes, download workers and the final write
//! all check it.
//! In-flight network reads are not interrupted, only bounded by their timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Error returned when a run is stopped by the consumer.
#[derive(Debug)]
pub struct RunCancelled;

impl std::fmt::Display for RunCancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run cancelled by user")
    }
}

impl std::error::Error for RunCancelled {}

/// Shared stop signal. Cloning shares the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal; every clone observes it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// `Err(RunCancelled)` once cancelled, for use with `?` at yield points.
    pub fn check(&self) -> Result<(), RunCancelled> {
        if self.is_cancelled() {
            Err(RunCancelled)
        } else {
            Ok(())
        }
    }
}
