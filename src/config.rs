//! Configuration types for batch conversion runs.
//!
//! All batch behaviour is controlled through [`BatchConfig`], built via its
//! [`BatchConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share configs across workers, serialise them for logging, and diff two
//! runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field. The
//! builder lets callers set only what they care about and rely on documented
//! defaults for the rest.

use crate::callback::ProgressCallback;
use crate::error::BatchError;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Input extensions accepted by default: scanned-image formats plus the
/// document formats the usual extraction engines handle.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".pdf", ".docx", ".doc", ".xlsx", ".xls", ".pptx", ".ppt", ".jpg", ".jpeg", ".png", ".bmp",
    ".tiff",
];

/// Configuration for a batch conversion run.
///
/// Built via [`BatchConfig::builder()`] or [`BatchConfig::default()`].
///
/// # Example
/// ```rust
/// use docbatch::BatchConfig;
///
/// let config = BatchConfig::builder()
///     .workers(4)
///     .checkpoint_every(10)
///     .extensions([".pdf", ".png"])
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Accepted input extensions, lowercased with a leading dot. Matching is
    /// case-insensitive. Default: [`DEFAULT_EXTENSIONS`].
    pub extensions: BTreeSet<String>,

    /// Extension of the sibling output artifact (no dot). Default: `md`.
    pub output_extension: String,

    /// Number of concurrent conversion calls. Default: 4.
    ///
    /// Conversion dominates wall-clock time (seconds to tens of seconds per
    /// file), so a small pool already buys most of the speed-up. `1` selects
    /// the strictly sequential loop, which also keeps per-file console output
    /// in discovery order when debugging.
    pub workers: usize,

    /// Save the progress record every N finished files. Default: 10.
    ///
    /// A lower cadence bounds how much work a crash can lose; a higher one
    /// reduces checkpoint I/O on very large batches. The record is always
    /// saved once more, unconditionally, when the run ends or is interrupted.
    pub checkpoint_every: usize,

    /// Skip a file whose sibling output already exists, marking it completed
    /// retroactively. Default: true.
    ///
    /// Covers the crash window where an earlier run wrote the artifact but
    /// never checkpointed: the artifact on disk is trusted as evidence of a
    /// finished conversion.
    pub skip_existing: bool,

    /// Re-attempt files recorded as `failed` by an earlier run. Default: true.
    ///
    /// Most conversion failures in practice are environmental (engine OOM,
    /// interrupted model download) and succeed on a later run. Disable to
    /// quarantine known-bad files until someone looks at the error log.
    pub retry_failed: bool,

    /// Path of the JSON progress checkpoint. Default: `docbatch_progress.json`.
    pub progress_path: PathBuf,

    /// Path of the append-only error log. Default: `docbatch_errors.log`.
    pub error_log_path: PathBuf,

    /// Optional per-file progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            output_extension: "md".to_string(),
            workers: 4,
            checkpoint_every: 10,
            skip_existing: true,
            retry_failed: true,
            progress_path: PathBuf::from("docbatch_progress.json"),
            error_log_path: PathBuf::from("docbatch_errors.log"),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("extensions", &self.extensions)
            .field("output_extension", &self.output_extension)
            .field("workers", &self.workers)
            .field("checkpoint_every", &self.checkpoint_every)
            .field("skip_existing", &self.skip_existing)
            .field("retry_failed", &self.retry_failed)
            .field("progress_path", &self.progress_path)
            .field("error_log_path", &self.error_log_path)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder for `BatchConfig`.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether `extension` (dotted or not, any case) is accepted as input.
    pub fn accepts(&self, extension: &str) -> bool {
        self.extensions.contains(&normalize_extension(extension))
    }
}

/// Lowercase and ensure a leading dot, so `"PDF"`, `"pdf"`, and `".pdf"`
/// all name the same format.
pub(crate) fn normalize_extension(extension: &str) -> String {
    let ext = extension.trim().to_ascii_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Builder for [`BatchConfig`].
#[derive(Debug)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.extensions = extensions
            .into_iter()
            .map(|e| normalize_extension(e.as_ref()))
            .collect();
        self
    }

    pub fn output_extension(mut self, ext: impl AsRef<str>) -> Self {
        self.config.output_extension = ext.as_ref().trim_start_matches('.').to_ascii_lowercase();
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.config.workers = n.max(1);
        self
    }

    pub fn checkpoint_every(mut self, n: usize) -> Self {
        self.config.checkpoint_every = n.max(1);
        self
    }

    pub fn skip_existing(mut self, v: bool) -> Self {
        self.config.skip_existing = v;
        self
    }

    pub fn retry_failed(mut self, v: bool) -> Self {
        self.config.retry_failed = v;
        self
    }

    pub fn progress_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.progress_path = path.into();
        self
    }

    pub fn error_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.error_log_path = path.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, BatchError> {
        let c = &self.config;
        if c.extensions.is_empty() {
            return Err(BatchError::InvalidConfig(
                "At least one input extension is required".into(),
            ));
        }
        if c.output_extension.is_empty() {
            return Err(BatchError::InvalidConfig(
                "Output extension must not be empty".into(),
            ));
        }
        // Output colliding with an input format would make every artifact a
        // candidate on the next scan.
        if c.accepts(&c.output_extension) {
            return Err(BatchError::InvalidConfig(format!(
                "Output extension '.{}' is also an accepted input extension",
                c.output_extension
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = BatchConfig::builder().build().unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.checkpoint_every, 10);
        assert!(config.skip_existing);
        assert!(config.retry_failed);
    }

    #[test]
    fn accepts_is_case_insensitive_and_dot_insensitive() {
        let config = BatchConfig::default();
        assert!(config.accepts(".pdf"));
        assert!(config.accepts("PDF"));
        assert!(config.accepts(".TIFF"));
        assert!(!config.accepts(".exe"));
    }

    #[test]
    fn extensions_are_normalized() {
        let config = BatchConfig::builder()
            .extensions(["PDF", ".PNG", "jpg"])
            .build()
            .unwrap();
        assert!(config.extensions.contains(".pdf"));
        assert!(config.extensions.contains(".png"));
        assert!(config.extensions.contains(".jpg"));
    }

    #[test]
    fn workers_clamped_to_one() {
        let config = BatchConfig::builder().workers(0).build().unwrap();
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn output_extension_must_not_collide_with_inputs() {
        let err = BatchConfig::builder()
            .extensions([".md", ".pdf"])
            .output_extension("md")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains(".md"), "got: {err}");
    }

    #[test]
    fn empty_extension_set_is_rejected() {
        let err = BatchConfig::builder()
            .extensions(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, BatchError::InvalidConfig(_)));
    }
}
