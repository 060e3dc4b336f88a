//! Batch driver: orchestrate discovery, workers, checkpoints, and summary.
//!
//! ## Control flow
//!
//! ```text
//! load record ─▶ discover ─▶ filter done ─▶ worker loop ─▶ final save ─▶ summary
//!                                              │
//!                                              └─ checkpoint save every N files
//! ```
//!
//! The worker loop runs either strictly sequentially (`workers = 1`) or as a
//! bounded pool via `buffer_unordered`. In both variants the per-file
//! contract is identical ([`crate::pipeline::worker::process_file`]); the
//! pool only changes how many conversions are in flight at once.
//!
//! ## Interruption
//!
//! A shutdown signal (Ctrl-C by default) is raced against the worker loop at
//! this level, not inside individual workers. Whichever way the race ends,
//! the progress record gets one final unconditional save, so a rerun resumes
//! from the last finished file. This is a hard requirement of the design,
//! not best-effort.

use crate::callback::{BatchProgressCallback, NoopProgressCallback};
use crate::config::BatchConfig;
use crate::converter::DocumentConverter;
use crate::errlog::ErrorLog;
use crate::error::BatchError;
use crate::pipeline::discover::{self, Candidate};
use crate::pipeline::worker;
use crate::progress::{ProgressRecord, ProgressStore};
use crate::report::{BatchSummary, FileOutcome, FileReport};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{info, warn};

static NOOP_CALLBACK: NoopProgressCallback = NoopProgressCallback;

/// How many failure messages the summary keeps for the exit banner.
const SUMMARY_FAILURES: usize = 5;

/// A shutdown future wired to Ctrl-C.
///
/// If signal registration fails the future never resolves; a batch that
/// cannot listen for interrupts should keep running rather than stop
/// spuriously.
pub async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Owns one batch run: configuration, the shared converter, and the durable
/// progress/error sinks.
///
/// The converter is constructed once and shared read-only by every worker;
/// the progress record is the only mutable shared state and all mutations to
/// it are serialized behind a mutex.
pub struct BatchRunner {
    config: BatchConfig,
    converter: Arc<dyn DocumentConverter>,
    store: ProgressStore,
    errlog: ErrorLog,
}

impl BatchRunner {
    pub fn new(config: BatchConfig, converter: Arc<dyn DocumentConverter>) -> Self {
        let store = ProgressStore::new(&config.progress_path);
        let errlog = ErrorLog::new(&config.error_log_path);
        Self {
            config,
            converter,
            store,
            errlog,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Discover and convert everything under `root`, saving a final
    /// checkpoint on Ctrl-C.
    pub async fn run(&self, root: impl AsRef<Path>) -> Result<BatchSummary, BatchError> {
        self.run_with_shutdown(root, ctrl_c()).await
    }

    /// Like [`BatchRunner::run`], with an explicit shutdown future.
    ///
    /// The future resolving interrupts the loop: in-flight conversions are
    /// dropped, the record is saved, and the summary comes back with
    /// `interrupted = true`.
    pub async fn run_with_shutdown(
        &self,
        root: impl AsRef<Path>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<BatchSummary, BatchError> {
        // Discovery walks the tree synchronously; keep it off the async
        // executor's hot path.
        let root = root.as_ref().to_path_buf();
        let config = self.config.clone();
        let candidates = tokio::task::spawn_blocking(move || discover::discover(&root, &config))
            .await
            .map_err(|e| BatchError::Internal(format!("discovery task panicked: {e}")))??;

        self.run_candidates(candidates, shutdown).await
    }

    /// Convert an explicit candidate list (interactive entry, tests).
    pub async fn run_candidates(
        &self,
        candidates: Vec<Candidate>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<BatchSummary, BatchError> {
        let started = Instant::now();
        let record = Mutex::new(self.store.load());

        // Resume filter: paths the record already settles never reach the
        // worker. Failed paths are retried unless the policy says otherwise.
        let remaining: Vec<Candidate> = {
            let record = record.lock().unwrap();
            candidates
                .iter()
                .filter(|c| {
                    let key = c.path_key();
                    if record.completed.contains(&key) {
                        return false;
                    }
                    if !self.config.retry_failed && record.failed.contains(&key) {
                        return false;
                    }
                    true
                })
                .cloned()
                .collect()
        };

        let total = candidates.len();
        let already_done = total - remaining.len();
        info!(
            "{total} candidates, {already_done} already done, {} remaining",
            remaining.len()
        );
        self.callback().on_batch_start(total, remaining.len());

        let tally = Mutex::new(RunTally::default());

        let shutdown = std::pin::pin!(shutdown);
        let interrupted = tokio::select! {
            _ = self.process_remaining(&remaining, &record, &tally, started) => false,
            _ = shutdown => {
                warn!("Interrupted; saving progress before exit");
                true
            }
        };

        // Final unconditional save, normal or interrupted.
        self.store.save(&mut record.lock().unwrap());

        let tally = tally.into_inner().unwrap();
        let record = record.into_inner().unwrap();
        let summary = BatchSummary {
            total_candidates: total,
            already_done,
            converted: tally.converted,
            skipped: tally.skipped,
            failed: tally.failed,
            interrupted,
            elapsed_ms: started.elapsed().as_millis() as u64,
            failure_messages: tally.failure_messages,
            by_format: record.by_format,
        };

        info!(
            "Batch done: {}/{} converted, {} skipped, {} failed, {}ms",
            summary.converted,
            summary.total_candidates,
            summary.skipped,
            summary.failed,
            summary.elapsed_ms
        );
        self.callback().on_batch_complete(&summary);
        Ok(summary)
    }

    async fn process_remaining(
        &self,
        remaining: &[Candidate],
        record: &Mutex<ProgressRecord>,
        tally: &Mutex<RunTally>,
        started: Instant,
    ) {
        if remaining.is_empty() {
            info!("All files already processed");
            return;
        }
        let total = remaining.len();

        if self.config.workers <= 1 {
            // Sequential variant: in discovery order, one at a time.
            for candidate in remaining {
                self.callback().on_file_start(&candidate.path);
                let report = worker::process_file(
                    candidate,
                    self.converter.as_ref(),
                    record,
                    &self.config,
                    &self.errlog,
                )
                .await;
                self.finish_one(report, record, tally, started, total);
            }
        } else {
            // Pooled variant: up to `workers` conversions in flight, reports
            // handled on this task as they complete.
            let mut reports = stream::iter(remaining.iter().map(|candidate| {
                let converter = Arc::clone(&self.converter);
                async move {
                    self.callback().on_file_start(&candidate.path);
                    worker::process_file(
                        candidate,
                        converter.as_ref(),
                        record,
                        &self.config,
                        &self.errlog,
                    )
                    .await
                }
            }))
            .buffer_unordered(self.config.workers);

            while let Some(report) = reports.next().await {
                self.finish_one(report, record, tally, started, total);
            }
        }
    }

    /// Account for one finished file and checkpoint on the configured
    /// cadence. Runs on the driver task, so the tally sees reports one at a
    /// time even in the pooled variant.
    fn finish_one(
        &self,
        report: FileReport,
        record: &Mutex<ProgressRecord>,
        tally: &Mutex<RunTally>,
        started: Instant,
        total: usize,
    ) {
        self.callback().on_file_done(&report);

        let mut tally = tally.lock().unwrap();
        tally.absorb(&report);
        let done = tally.done();
        if done % self.config.checkpoint_every == 0 {
            self.store.save(&mut record.lock().unwrap());
            let eta = tally.eta(started.elapsed(), total);
            self.callback().on_checkpoint(done, total - done, eta);
        }
    }

    fn callback(&self) -> &dyn BatchProgressCallback {
        match &self.config.progress_callback {
            Some(cb) => cb.as_ref(),
            None => &NOOP_CALLBACK,
        }
    }
}

/// Per-run counters, separate from the durable record: the record
/// accumulates across runs, these describe only the current one.
#[derive(Debug, Default)]
struct RunTally {
    converted: usize,
    skipped: usize,
    failed: usize,
    failure_messages: Vec<String>,
}

impl RunTally {
    fn absorb(&mut self, report: &FileReport) {
        match &report.outcome {
            FileOutcome::Converted { .. } => self.converted += 1,
            FileOutcome::Skipped(_) => self.skipped += 1,
            FileOutcome::Failed { error, .. } => {
                self.failed += 1;
                if self.failure_messages.len() < SUMMARY_FAILURES {
                    self.failure_messages
                        .push(format!("{}: {error}", report.path.display()));
                }
            }
        }
    }

    fn done(&self) -> usize {
        self.converted + self.skipped + self.failed
    }

    /// Remaining time extrapolated from the running average per-file time.
    fn eta(&self, elapsed: Duration, total: usize) -> Option<Duration> {
        let done = self.done();
        if done == 0 {
            return None;
        }
        let avg = elapsed / done as u32;
        Some(avg * total.saturating_sub(done) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eta_extrapolates_from_average() {
        let tally = RunTally {
            converted: 5,
            skipped: 0,
            failed: 0,
            failure_messages: vec![],
        };
        let eta = tally.eta(Duration::from_secs(50), 20).unwrap();
        // 10s per file, 15 files left.
        assert_eq!(eta, Duration::from_secs(150));
    }

    #[test]
    fn eta_is_none_before_any_file_finishes() {
        let tally = RunTally::default();
        assert!(tally.eta(Duration::from_secs(5), 20).is_none());
    }

    #[test]
    fn failure_messages_are_bounded() {
        let mut tally = RunTally::default();
        for i in 0..20 {
            tally.absorb(&FileReport {
                path: std::path::PathBuf::from(format!("/docs/{i}.pdf")),
                extension: ".pdf".into(),
                outcome: FileOutcome::Failed {
                    error: "boom".into(),
                    elapsed: Duration::ZERO,
                },
            });
        }
        assert_eq!(tally.failed, 20);
        assert_eq!(tally.failure_messages.len(), SUMMARY_FAILURES);
    }
}
