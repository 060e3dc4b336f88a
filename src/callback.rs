//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::BatchConfigBuilder::progress_callback`] to receive
//! real-time events as the driver works through the candidate list.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a terminal progress bar, a log sink, or a web socket
//! without the library knowing how the host application communicates. Callers
//! that prefer pull-style consumption can use [`crate::stream::run_stream`]
//! instead.

use crate::report::{BatchSummary, FileReport};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Called by the batch driver as files are processed.
///
/// Implementations must be `Send + Sync`: in the pooled variant
/// `on_file_start` and `on_file_done` fire from concurrently completing
/// workers. All methods default to no-ops so callers only override what they
/// care about.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any file is processed.
    ///
    /// # Arguments
    /// * `total`     — candidates discovered for this run
    /// * `remaining` — candidates left after resume filtering
    fn on_batch_start(&self, total: usize, remaining: usize) {
        let _ = (total, remaining);
    }

    /// Called just before a file's conversion is attempted.
    fn on_file_start(&self, path: &Path) {
        let _ = path;
    }

    /// Called when a file finishes, whatever the outcome.
    fn on_file_done(&self, report: &FileReport) {
        let _ = report;
    }

    /// Called right after each periodic checkpoint save.
    ///
    /// # Arguments
    /// * `done`      — files finished so far in this run
    /// * `remaining` — files still queued
    /// * `eta`       — extrapolation from the running average per-file time;
    ///   `None` until at least one file has finished
    fn on_checkpoint(&self, done: usize, remaining: usize, eta: Option<Duration>) {
        let _ = (done, remaining, eta);
    }

    /// Called once after the final checkpoint save, normal or interrupted.
    fn on_batch_complete(&self, summary: &BatchSummary) {
        let _ = summary;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{FileOutcome, SkipReason};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        dones: AtomicUsize,
        checkpoints: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_file_start(&self, _path: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_done(&self, _report: &FileReport) {
            self.dones.fetch_add(1, Ordering::SeqCst);
        }

        fn on_checkpoint(&self, _done: usize, _remaining: usize, _eta: Option<Duration>) {
            self.checkpoints.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn skip_report() -> FileReport {
        FileReport {
            path: PathBuf::from("/docs/a.pdf"),
            extension: ".pdf".into(),
            outcome: FileOutcome::Skipped(SkipReason::AlreadyCompleted),
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(5, 3);
        cb.on_file_start(Path::new("/docs/a.pdf"));
        cb.on_file_done(&skip_report());
        cb.on_checkpoint(10, 20, Some(Duration::from_secs(60)));
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: AtomicUsize::new(0),
            dones: AtomicUsize::new(0),
            checkpoints: AtomicUsize::new(0),
        };

        tracker.on_file_start(Path::new("/docs/a.pdf"));
        tracker.on_file_done(&skip_report());
        tracker.on_file_start(Path::new("/docs/b.pdf"));
        tracker.on_file_done(&skip_report());
        tracker.on_checkpoint(2, 0, None);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.dones.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.checkpoints.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn BatchProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10, 10);
        cb.on_file_start(Path::new("/docs/a.pdf"));
    }
}
