//! Streaming batch API: emit per-file reports as they complete.
//!
//! ## Why stream?
//!
//! Large batches take hours. A stream lets callers render progress, persist
//! partial results, or abort early without wiring up a callback. Unlike the
//! eager [`crate::batch::BatchRunner`], which returns only after the whole
//! candidate list is settled, [`run_stream`] yields each [`FileReport`] the
//! moment its file finishes.
//!
//! Reports arrive in completion order, not discovery order, when more than
//! one worker is configured. Checkpointing and the final save behave exactly
//! as in the eager driver; dropping the stream early still leaves a valid
//! checkpoint behind.

use crate::config::BatchConfig;
use crate::converter::DocumentConverter;
use crate::errlog::ErrorLog;
use crate::error::BatchError;
use crate::pipeline::discover::{self, Candidate};
use crate::pipeline::worker;
use crate::progress::ProgressStore;
use crate::report::FileReport;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-file reports.
pub type FileReportStream = Pin<Box<dyn Stream<Item = FileReport> + Send>>;

/// Discover everything under `root` and convert it, streaming reports.
///
/// # Returns
/// - `Ok(FileReportStream)` — one item per file that this run touches
///   (already-completed paths are filtered out up front and never appear)
/// - `Err(BatchError)` — fatal error (root missing, discovery failure)
pub async fn run_stream(
    root: impl AsRef<Path>,
    config: &BatchConfig,
    converter: Arc<dyn DocumentConverter>,
) -> Result<FileReportStream, BatchError> {
    let root = root.as_ref().to_path_buf();
    info!("Starting streaming batch over {}", root.display());

    let cfg = config.clone();
    let candidates = tokio::task::spawn_blocking(move || discover::discover(&root, &cfg))
        .await
        .map_err(|e| BatchError::Internal(format!("discovery task panicked: {e}")))??;

    let store = ProgressStore::new(&config.progress_path);
    let errlog = ErrorLog::new(&config.error_log_path);
    let record = store.load();

    let remaining: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| {
            let key = c.path_key();
            if record.completed.contains(&key) {
                return false;
            }
            if !config.retry_failed && record.failed.contains(&key) {
                return false;
            }
            true
        })
        .collect();

    let (tx, rx) = tokio::sync::mpsc::channel(16);
    let config = config.clone();
    tokio::spawn(async move {
        let record = Mutex::new(record);
        let mut done = 0usize;

        let mut reports = stream::iter(remaining.into_iter().map(|candidate| {
            let converter = Arc::clone(&converter);
            let record = &record;
            let config = &config;
            let errlog = &errlog;
            async move {
                worker::process_file(&candidate, converter.as_ref(), record, config, errlog).await
            }
        }))
        .buffer_unordered(config.workers.max(1));

        while let Some(report) = reports.next().await {
            done += 1;
            if done % config.checkpoint_every == 0 {
                store.save(&mut record.lock().unwrap());
            }
            if tx.send(report).await.is_err() {
                // Receiver dropped: stop converting, keep the checkpoint.
                break;
            }
        }
        drop(reports);
        store.save(&mut record.lock().unwrap());
    });

    Ok(Box::pin(ReceiverStream::new(rx)))
}
