//! The per-file conversion contract.
//!
//! ## Ordering invariant
//!
//! The sibling artifact is written before the path is marked completed, so a
//! resumed run never observes a completed path without its artifact on disk.
//! The reverse window (artifact written, record lost before a checkpoint) is
//! closed by the skip-existing policy, which retroactively marks such paths
//! completed on the next run.
//!
//! The progress record is the only shared mutable state; every mutation takes
//! the record mutex briefly, and the lock is never held across an `.await`.

use crate::config::BatchConfig;
use crate::converter::DocumentConverter;
use crate::errlog::ErrorLog;
use crate::error::ConvertError;
use crate::pipeline::discover::Candidate;
use crate::progress::ProgressRecord;
use crate::report::{FileOutcome, FileReport, SkipReason};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Process one candidate end to end. Never panics or propagates a per-file
/// failure: every outcome comes back as a [`FileReport`].
pub async fn process_file(
    candidate: &Candidate,
    converter: &dyn DocumentConverter,
    record: &Mutex<ProgressRecord>,
    config: &BatchConfig,
    errlog: &ErrorLog,
) -> FileReport {
    let key = candidate.path_key();

    // 1. Already recorded as done: nothing to do, zero elapsed.
    {
        let record = record.lock().unwrap();
        if record.is_completed(&key) {
            return report(candidate, FileOutcome::Skipped(SkipReason::AlreadyCompleted));
        }
    }

    // 2. A previous unrecorded run may have produced the artifact already;
    //    trust it and settle the record retroactively.
    let output = candidate.output_path(&config.output_extension);
    if config.skip_existing && output.exists() {
        record.lock().unwrap().mark_completed(&key);
        debug!(
            "Output exists, marked completed: {}",
            candidate.path.display()
        );
        return report(candidate, FileOutcome::Skipped(SkipReason::OutputExists));
    }

    // 3. Convert, timing wall clock.
    let start = Instant::now();
    match converter.convert(&candidate.path).await {
        Ok(converted) => {
            let bytes = converted.markdown.len();
            if let Err(e) = write_output(&output, &converted.markdown).await {
                return fail(candidate, record, errlog, e.to_string(), start.elapsed());
            }
            {
                let mut record = record.lock().unwrap();
                record.mark_completed(&key);
                record.tally(&candidate.extension, true);
            }
            debug!(
                "Converted {} ({bytes} bytes, {:.1}s)",
                candidate.path.display(),
                start.elapsed().as_secs_f64()
            );
            report(
                candidate,
                FileOutcome::Converted {
                    bytes,
                    elapsed: start.elapsed(),
                },
            )
        }
        Err(e) => fail(candidate, record, errlog, e.to_string(), start.elapsed()),
    }
}

/// Write the Markdown artifact atomically (temp + rename), overwriting any
/// existing file.
async fn write_output(path: &Path, markdown: &str) -> Result<(), ConvertError> {
    let tmp = tmp_sibling(path);
    let io_err = |e: std::io::Error| ConvertError::Io {
        path: path.to_path_buf(),
        detail: e.to_string(),
    };
    tokio::fs::write(&tmp, markdown).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

fn fail(
    candidate: &Candidate,
    record: &Mutex<ProgressRecord>,
    errlog: &ErrorLog,
    message: String,
    elapsed: Duration,
) -> FileReport {
    {
        let mut record = record.lock().unwrap();
        record.mark_failed(&candidate.path_key());
        record.tally(&candidate.extension, false);
    }
    errlog.append(&candidate.path, &message);
    warn!("Failed {}: {message}", candidate.path.display());
    report(
        candidate,
        FileOutcome::Failed {
            error: message,
            elapsed,
        },
    )
}

fn report(candidate: &Candidate, outcome: FileOutcome) -> FileReport {
    FileReport {
        path: candidate.path.clone(),
        extension: candidate.extension.clone(),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConversionOutput;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingConverter {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DocumentConverter for CountingConverter {
        async fn convert(&self, _path: &Path) -> Result<ConversionOutput, ConvertError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ConversionOutput::from_markdown("# converted\n"))
        }
    }

    fn setup(dir: &Path) -> (BatchConfig, Mutex<ProgressRecord>, ErrorLog) {
        let config = BatchConfig::builder()
            .progress_path(dir.join("progress.json"))
            .error_log_path(dir.join("errors.log"))
            .build()
            .unwrap();
        let errlog = ErrorLog::new(&config.error_log_path);
        (config, Mutex::new(ProgressRecord::default()), errlog)
    }

    #[tokio::test]
    async fn completed_paths_skip_without_converting() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"raw").unwrap();
        let candidate = Candidate::from_path(dir.path().join("a.pdf"));

        let (config, record, errlog) = setup(dir.path());
        record.lock().unwrap().mark_completed(&candidate.path_key());

        let converter = CountingConverter {
            calls: AtomicUsize::new(0),
        };
        let report = process_file(&candidate, &converter, &record, &config, &errlog).await;

        assert!(matches!(
            report.outcome,
            FileOutcome::Skipped(SkipReason::AlreadyCompleted)
        ));
        assert_eq!(converter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn existing_output_is_retroactively_completed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"raw").unwrap();
        std::fs::write(dir.path().join("a.md"), b"old output").unwrap();
        let candidate = Candidate::from_path(dir.path().join("a.pdf"));

        let (config, record, errlog) = setup(dir.path());
        let converter = CountingConverter {
            calls: AtomicUsize::new(0),
        };
        let report = process_file(&candidate, &converter, &record, &config, &errlog).await;

        assert!(matches!(
            report.outcome,
            FileOutcome::Skipped(SkipReason::OutputExists)
        ));
        assert_eq!(converter.calls.load(Ordering::SeqCst), 0);
        assert!(record.lock().unwrap().is_completed(&candidate.path_key()));
    }

    #[tokio::test]
    async fn conversion_writes_sibling_output_and_records_success() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"raw").unwrap();
        let candidate = Candidate::from_path(dir.path().join("a.pdf"));

        let (config, record, errlog) = setup(dir.path());
        let converter = CountingConverter {
            calls: AtomicUsize::new(0),
        };
        let report = process_file(&candidate, &converter, &record, &config, &errlog).await;

        assert!(report.is_converted());
        let output = candidate.output_path("md");
        assert_eq!(std::fs::read_to_string(output).unwrap(), "# converted\n");

        let record = record.lock().unwrap();
        assert!(record.is_completed(&candidate.path_key()));
        assert_eq!(record.by_format[".pdf"].success, 1);
    }
}
