//! File discovery: recursive, extension-filtered, deterministic.
//!
//! The walk is read-only and sorted by file name at every level, so the same
//! tree always yields the same candidate order. Determinism matters for
//! resumability debugging: two runs over an unchanged tree disagree only in
//! what the progress record filtered out, never in traversal order.

use crate::config::BatchConfig;
use crate::error::BatchError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// One candidate document. Identity is the absolute path; candidates are
/// never mutated after discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    /// Lowercased dotted extension, e.g. `".pdf"`.
    pub extension: String,
    /// Size in bytes at discovery time (0 if unreadable).
    pub size: u64,
}

impl Candidate {
    /// Build a candidate from an explicit path (interactive entry).
    /// Canonicalises when possible so identities match discovered ones.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let path = std::fs::canonicalize(&path).unwrap_or(path);
        let extension = dotted_extension(&path);
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        Self {
            path,
            extension,
            size,
        }
    }

    /// The sibling output path: same stem, same directory, new extension.
    pub fn output_path(&self, output_extension: &str) -> PathBuf {
        self.path.with_extension(output_extension)
    }

    /// The string under which this file is tracked in the progress record.
    pub fn path_key(&self) -> String {
        self.path.display().to_string()
    }
}

/// Recursively enumerate candidate documents under `root`.
///
/// Fails fast with [`BatchError::RootNotFound`] / [`BatchError::NotADirectory`]
/// before any work begins; these are the only fatal discovery conditions.
pub fn discover(root: &Path, config: &BatchConfig) -> Result<Vec<Candidate>, BatchError> {
    if !root.exists() {
        return Err(BatchError::RootNotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(BatchError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    let root = std::fs::canonicalize(root)
        .map_err(|e| BatchError::Internal(format!("cannot canonicalize {}: {e}", root.display())))?;

    info!("Scanning for documents under {}", root.display());

    let mut candidates = Vec::new();
    for entry in WalkDir::new(&root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let extension = dotted_extension(entry.path());
        if !config.accepts(&extension) {
            continue;
        }
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        candidates.push(Candidate {
            path: entry.path().to_path_buf(),
            extension,
            size,
        });
    }

    debug!("Found {} candidate documents", candidates.len());
    Ok(candidates)
}

/// Lowercased extension with a leading dot, or `""` when the path has none.
pub(crate) fn dotted_extension(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!(".{}", ext.to_ascii_lowercase()),
        None => String::new(),
    }
}

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

/// First integer run in the file stem, or 0.
///
/// Scanned pages usually arrive as `scan_001.jpg`, `page-12.png`,
/// `IMG_0042.jpg`; the first number is the page number often enough that
/// merged output reads in order.
pub fn page_number(path: &Path) -> u64 {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    FIRST_NUMBER
        .find(stem)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Order paths by extracted page number, tie-broken by file name.
pub fn sort_by_page(paths: &mut [PathBuf]) {
    paths.sort_by_key(|p| (page_number(p), p.file_name().map(|n| n.to_os_string())));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BatchConfig;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn discover_filters_by_extension_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.pdf"));
        touch(&dir.path().join("b.PDF"));
        touch(&dir.path().join("notes.md"));
        touch(&dir.path().join("nested/deep/c.docx"));

        let config = BatchConfig::default();
        let found = discover(dir.path(), &config).unwrap();

        let names: Vec<String> = found
            .iter()
            .map(|c| c.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert!(names.contains(&"a.pdf".to_string()));
        assert!(names.contains(&"b.PDF".to_string()));
        assert!(names.contains(&"c.docx".to_string()));
        assert!(!names.iter().any(|n| n == "notes.md"));
        assert!(found.iter().all(|c| c.extension.starts_with('.')));
    }

    #[test]
    fn discover_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["z.pdf", "a.pdf", "m.pdf"] {
            touch(&dir.path().join(name));
        }

        let config = BatchConfig::default();
        let first = discover(dir.path(), &config).unwrap();
        let second = discover(dir.path(), &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn discover_missing_root_is_fatal() {
        let config = BatchConfig::default();
        let err = discover(Path::new("/definitely/not/here"), &config).unwrap_err();
        assert!(matches!(err, BatchError::RootNotFound { .. }));
    }

    #[test]
    fn discover_rejects_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.pdf");
        touch(&file);

        let config = BatchConfig::default();
        let err = discover(&file, &config).unwrap_err();
        assert!(matches!(err, BatchError::NotADirectory { .. }));
    }

    #[test]
    fn page_number_extraction() {
        assert_eq!(page_number(Path::new("scan_001.jpg")), 1);
        assert_eq!(page_number(Path::new("page-12.png")), 12);
        assert_eq!(page_number(Path::new("IMG_0042.jpg")), 42);
        assert_eq!(page_number(Path::new("cover.jpg")), 0);
    }

    #[test]
    fn sort_by_page_orders_numerically() {
        let mut paths = vec![
            PathBuf::from("scan_10.jpg"),
            PathBuf::from("scan_2.jpg"),
            PathBuf::from("cover.jpg"),
        ];
        sort_by_page(&mut paths);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("cover.jpg"),
                PathBuf::from("scan_2.jpg"),
                PathBuf::from("scan_10.jpg"),
            ]
        );
    }

    #[test]
    fn output_path_is_a_sibling() {
        let candidate = Candidate {
            path: PathBuf::from("/docs/scans/invoice.pdf"),
            extension: ".pdf".into(),
            size: 0,
        };
        assert_eq!(
            candidate.output_path("md"),
            PathBuf::from("/docs/scans/invoice.md")
        );
    }
}
