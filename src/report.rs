//! Per-file outcomes and whole-batch summaries.
//!
//! Outcomes are tagged variants, matched exhaustively wherever they are
//! consumed, so the driver can tally skip-vs-fail-vs-success without
//! string-typed result maps or exception-shaped control flow.

use crate::progress::FormatTally;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Why a file was skipped without invoking the conversion capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The progress record already lists the path as completed.
    AlreadyCompleted,
    /// The sibling output artifact exists and the skip-existing policy is on.
    OutputExists,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::AlreadyCompleted => write!(f, "already processed"),
            SkipReason::OutputExists => write!(f, "output exists"),
        }
    }
}

/// What happened to one file.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    /// No conversion call was made. Zero elapsed time.
    Skipped(SkipReason),
    /// Converted and the sibling artifact written.
    Converted {
        /// Size of the written Markdown, in bytes.
        bytes: usize,
        /// Wall-clock time of the conversion call.
        elapsed: Duration,
    },
    /// The conversion capability (or the output write) failed.
    Failed { error: String, elapsed: Duration },
}

/// One file's report, as emitted by the worker and the streaming API.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    /// Lowercased dotted extension, e.g. `".pdf"`.
    pub extension: String,
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn is_converted(&self) -> bool {
        matches!(self.outcome, FileOutcome::Converted { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, FileOutcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, FileOutcome::Failed { .. })
    }

    /// The failure message, when the outcome is a failure.
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            FileOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Statistics for a finished (or interrupted) batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    /// Candidates discovered (or supplied) for this run.
    pub total_candidates: usize,

    /// Candidates filtered out before the loop because the progress record
    /// already settled them.
    pub already_done: usize,

    /// Files converted in this run.
    pub converted: usize,

    /// Files skipped inside the loop (existing output, late duplicate).
    pub skipped: usize,

    /// Files that failed in this run.
    pub failed: usize,

    /// True when the run was cut short by a shutdown signal. The progress
    /// record was still saved; rerunning resumes from it.
    pub interrupted: bool,

    /// Wall-clock duration of the run.
    pub elapsed_ms: u64,

    /// The first few failure messages, for the exit banner. The error log
    /// holds the full list.
    pub failure_messages: Vec<String>,

    /// Per-extension success/failure tallies, accumulated across runs.
    pub by_format: BTreeMap<String, FormatTally>,
}

impl BatchSummary {
    /// Files this run actually touched (everything except pre-filtered ones).
    pub fn processed(&self) -> usize {
        self.converted + self.skipped + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_reason_display() {
        assert_eq!(SkipReason::OutputExists.to_string(), "output exists");
        assert_eq!(
            SkipReason::AlreadyCompleted.to_string(),
            "already processed"
        );
    }

    #[test]
    fn report_predicates() {
        let report = FileReport {
            path: PathBuf::from("/docs/a.pdf"),
            extension: ".pdf".into(),
            outcome: FileOutcome::Failed {
                error: "engine refused".into(),
                elapsed: Duration::from_millis(12),
            },
        };
        assert!(report.is_failed());
        assert!(!report.is_converted());
        assert_eq!(report.error_message(), Some("engine refused"));
    }

    #[test]
    fn summary_processed_excludes_prefiltered() {
        let summary = BatchSummary {
            total_candidates: 10,
            already_done: 4,
            converted: 3,
            skipped: 2,
            failed: 1,
            interrupted: false,
            elapsed_ms: 1000,
            failure_messages: vec![],
            by_format: BTreeMap::new(),
        };
        assert_eq!(summary.processed(), 6);
    }
}
