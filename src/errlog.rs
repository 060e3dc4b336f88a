//! Append-only error log.
//!
//! One entry per failed file:
//!
//! ```text
//! [2025-11-02 14:31:07] /docs/scans/invoice_033.pdf
//!   Error: conversion engine error: unreadable page 3
//!
//! ```
//!
//! The log is the durable complement to the progress record's `failed` set:
//! the set says *which* paths failed, the log says *why*. Entries are only
//! ever appended; rotation and cleanup are manual, like the progress file.

use chrono::Local;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Appends failure entries to a fixed log path.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped entry for `file`.
    ///
    /// Write failures are logged to the console and swallowed; a full disk
    /// must not take the batch down with it.
    pub fn append(&self, file: &Path, message: &str) {
        if let Err(e) = self.try_append(file, message) {
            warn!(
                "Could not write to error log {}: {e}",
                self.path.display()
            );
        }
    }

    fn try_append(&self, file: &Path, message: &str) -> std::io::Result<()> {
        let mut log = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(log, "[{stamp}] {}", file.display())?;
        writeln!(log, "  Error: {message}")?;
        writeln!(log)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_appended_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = ErrorLog::new(dir.path().join("errors.log"));

        log.append(Path::new("/docs/a.pdf"), "first failure");
        log.append(Path::new("/docs/b.pdf"), "second failure");

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let a = contents.find("/docs/a.pdf").unwrap();
        let b = contents.find("/docs/b.pdf").unwrap();
        assert!(a < b);
        assert!(contents.contains("  Error: first failure"));
        assert_eq!(contents.matches("] /docs/").count(), 2);
    }

    #[test]
    fn entry_format_matches_contract() {
        let dir = tempfile::tempdir().unwrap();
        let log = ErrorLog::new(dir.path().join("errors.log"));
        log.append(Path::new("/docs/x.pdf"), "boom");

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let re = regex::Regex::new(
            r"(?m)^\[\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\] /docs/x\.pdf\n  Error: boom\n$",
        )
        .unwrap();
        assert!(re.is_match(&contents), "got: {contents:?}");
    }
}
