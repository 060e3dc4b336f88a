//! Path-entry resolution: turn a line of user input into candidates.
//!
//! Interactive mode accepts drag-and-drop strings the way file managers and
//! shells actually produce them: several double-quoted paths on one line
//! (Windows Explorer), single-quoted paths with a leading `& ` (PowerShell's
//! call operator), or a bare unquoted path. A directory entry expands to its
//! directly-contained supported files — one level only; deep trees go
//! through a root scan instead.

use crate::config::BatchConfig;
use crate::pipeline::discover::{dotted_extension, Candidate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Words that end the interactive entry loop.
pub const DONE_WORDS: &[&str] = &["done", "q", "exit"];

/// What one entered path resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathEntry {
    /// A supported file, ready for the worker.
    Accepted(Candidate),
    /// A real file with an extension outside the accepted set.
    UnsupportedFormat { path: PathBuf, extension: String },
    /// Nothing at this path.
    NotFound { path: PathBuf },
}

static DOUBLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)""#).expect("valid regex"));
static SINGLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"'([^']+)'").expect("valid regex"));

/// Whether this line terminates the entry loop.
pub fn is_done(line: &str) -> bool {
    DONE_WORDS.contains(&line.trim().to_ascii_lowercase().as_str())
}

/// Split one input line into raw path strings.
///
/// Double quotes win over single quotes; an unquoted line is one path with
/// any stray surrounding quotes stripped.
pub fn split_paths(line: &str) -> Vec<String> {
    let line = line.trim();
    // PowerShell prepends its call operator when a path is drag-dropped.
    let line = line.strip_prefix("& ").unwrap_or(line).trim();
    if line.is_empty() {
        return Vec::new();
    }

    let double: Vec<String> = DOUBLE_QUOTED
        .captures_iter(line)
        .map(|c| c[1].to_string())
        .collect();
    if !double.is_empty() {
        return double;
    }

    let single: Vec<String> = SINGLE_QUOTED
        .captures_iter(line)
        .map(|c| c[1].to_string())
        .collect();
    if !single.is_empty() {
        return single;
    }

    vec![line.trim_matches(|c| c == '"' || c == '\'').to_string()]
}

/// Resolve one line of input into entries, expanding directories one level.
pub fn resolve_line(line: &str, config: &BatchConfig) -> Vec<PathEntry> {
    let mut entries = Vec::new();
    for raw in split_paths(line) {
        let path = PathBuf::from(raw.trim());
        if path.is_dir() {
            entries.extend(expand_dir(&path, config));
        } else if path.is_file() {
            let extension = dotted_extension(&path);
            if config.accepts(&extension) {
                entries.push(PathEntry::Accepted(Candidate::from_path(path)));
            } else {
                entries.push(PathEntry::UnsupportedFormat { path, extension });
            }
        } else {
            entries.push(PathEntry::NotFound { path });
        }
    }
    entries
}

/// Accepted files directly inside `dir`, in name order. Unsupported files in
/// the directory are silently ignored; only explicitly named files earn an
/// `UnsupportedFormat` entry.
fn expand_dir(dir: &Path, config: &BatchConfig) -> Vec<PathEntry> {
    let read = match std::fs::read_dir(dir) {
        Ok(read) => read,
        Err(_) => {
            return vec![PathEntry::NotFound {
                path: dir.to_path_buf(),
            }]
        }
    };

    let mut files: Vec<PathBuf> = read
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    files
        .into_iter()
        .filter(|p| config.accepts(&dotted_extension(p)))
        .map(|p| PathEntry::Accepted(Candidate::from_path(p)))
        .collect()
}
