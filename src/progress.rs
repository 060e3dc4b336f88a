//! Durable progress record: the sole source of truth for resumability.
//!
//! ## Why a flat JSON file?
//!
//! The record is small (two path sets and a tally map), rewritten whole at
//! every checkpoint, and read by humans mid-run to see how far a batch got.
//! A database would add a dependency for no gain; a JSON file can be
//! inspected with `cat`, trimmed by hand to force a retry, or deleted to
//! start over. Cleanup is deliberately manual — the file never expires.
//!
//! Writes go to a `.tmp` sibling first and are renamed into place, so a
//! crash mid-write leaves the previous checkpoint intact rather than a
//! truncated file. A checkpoint that fails to write is logged and swallowed:
//! losing one save degrades resumability, it must never abort the batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Success/failure counts for one input extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatTally {
    pub success: u64,
    pub failed: u64,
}

/// The in-memory progress record.
///
/// Invariant: a path is in at most one of `completed` / `failed` at any
/// durable checkpoint. `completed` is monotonically non-shrinking within a
/// run. Paths are stored as their display strings; ordered sets keep the
/// serialized file diffable between checkpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default)]
    pub completed: BTreeSet<String>,

    #[serde(default)]
    pub failed: BTreeSet<String>,

    #[serde(default)]
    pub by_format: BTreeMap<String, FormatTally>,

    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    pub fn is_completed(&self, path: &str) -> bool {
        self.completed.contains(path)
    }

    /// Record a successful conversion. A path that previously failed and now
    /// succeeded moves over; it must not stay in both sets.
    pub fn mark_completed(&mut self, path: &str) {
        self.failed.remove(path);
        self.completed.insert(path.to_string());
    }

    /// Record a failure. A no-op for paths already completed, preserving the
    /// one-set invariant.
    pub fn mark_failed(&mut self, path: &str) {
        if !self.completed.contains(path) {
            self.failed.insert(path.to_string());
        }
    }

    /// Bump the per-extension tally for one conversion attempt.
    pub fn tally(&mut self, extension: &str, success: bool) {
        let entry = self.by_format.entry(extension.to_string()).or_default();
        if success {
            entry.success += 1;
        } else {
            entry.failed += 1;
        }
    }
}

/// Loads and saves the progress record at a fixed path.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record from disk.
    ///
    /// An absent or unparseable file yields an empty record: a corrupt
    /// checkpoint means "start fresh", never a dead batch.
    pub fn load(&self) -> ProgressRecord {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No progress file at {}; starting fresh", self.path.display());
                return ProgressRecord::default();
            }
            Err(e) => {
                warn!(
                    "Could not read progress file {} ({e}); starting fresh",
                    self.path.display()
                );
                return ProgressRecord::default();
            }
        };

        match serde_json::from_str::<ProgressRecord>(&raw) {
            Ok(record) => {
                debug!(
                    "Loaded progress: {} completed, {} failed",
                    record.completed.len(),
                    record.failed.len()
                );
                record
            }
            Err(e) => {
                warn!(
                    "Progress file {} is unparseable ({e}); starting fresh",
                    self.path.display()
                );
                ProgressRecord::default()
            }
        }
    }

    /// Stamp `last_updated` and persist the record.
    ///
    /// Failures are logged and swallowed (see module docs).
    pub fn save(&self, record: &mut ProgressRecord) {
        record.last_updated = Some(Utc::now());
        if let Err(e) = self.try_save(record) {
            warn!(
                "Could not save progress to {}: {e}",
                self.path.display()
            );
        }
    }

    fn try_save(&self, record: &ProgressRecord) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        // Temp + rename: a crash between the two calls leaves the previous
        // checkpoint file untouched.
        let tmp = tmp_path(&self.path);
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_completed_moves_path_out_of_failed() {
        let mut record = ProgressRecord::default();
        record.mark_failed("/docs/a.pdf");
        assert!(record.failed.contains("/docs/a.pdf"));

        record.mark_completed("/docs/a.pdf");
        assert!(record.completed.contains("/docs/a.pdf"));
        assert!(!record.failed.contains("/docs/a.pdf"));
    }

    #[test]
    fn mark_failed_is_noop_for_completed_paths() {
        let mut record = ProgressRecord::default();
        record.mark_completed("/docs/a.pdf");
        record.mark_failed("/docs/a.pdf");
        assert!(record.completed.contains("/docs/a.pdf"));
        assert!(record.failed.is_empty());
    }

    #[test]
    fn tally_accumulates_per_extension() {
        let mut record = ProgressRecord::default();
        record.tally(".pdf", true);
        record.tally(".pdf", true);
        record.tally(".pdf", false);
        record.tally(".docx", true);

        assert_eq!(record.by_format[".pdf"], FormatTally { success: 2, failed: 1 });
        assert_eq!(record.by_format[".docx"], FormatTally { success: 1, failed: 0 });
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("progress.json"));

        let mut record = ProgressRecord::default();
        record.mark_completed("/docs/a.pdf");
        record.mark_failed("/docs/b.pdf");
        record.tally(".pdf", true);
        store.save(&mut record);

        let loaded = store.load();
        assert!(loaded.completed.contains("/docs/a.pdf"));
        assert!(loaded.failed.contains("/docs/b.pdf"));
        assert!(loaded.last_updated.is_some());
        assert_eq!(loaded.by_format[".pdf"].success, 1);
    }

    #[test]
    fn missing_file_loads_empty_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("absent.json"));
        let record = store.load();
        assert!(record.completed.is_empty());
        assert!(record.failed.is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, "{ not json at all").unwrap();

        let record = ProgressStore::new(&path).load();
        assert!(record.completed.is_empty());
    }

    #[test]
    fn serialized_shape_uses_spec_field_names() {
        let mut record = ProgressRecord::default();
        record.mark_completed("/docs/a.pdf");
        record.tally(".pdf", true);
        record.last_updated = Some(Utc::now());

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"completed\""));
        assert!(json.contains("\"failed\""));
        assert!(json.contains("\"by_format\""));
        assert!(json.contains("\"last_updated\""));
    }
}
