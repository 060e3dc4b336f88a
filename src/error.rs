//! Error types for the docbatch library.
//!
//! Three distinct error types reflect three distinct failure scopes:
//!
//! * [`BatchError`] — **Fatal**: the batch cannot start at all (root
//!   directory missing, invalid configuration). Returned as
//!   `Err(BatchError)` from the driver entry points before any file is
//!   touched.
//!
//! * [`ConvertError`] — **Per-file**: one document failed to convert.
//!   Recorded in the progress record's `failed` set and the error log while
//!   the rest of the batch continues. Never propagates past the worker.
//!
//! * [`RenderError`] — **Cosmetic**: one output artifact (a merged document,
//!   a spreadsheet) could not be produced. The caller logs it and the batch
//!   outcome stands.
//!
//! The separation lets callers decide their own tolerance: abort on startup
//! problems, tally per-file failures for a post-run report, and shrug off a
//! missing convenience artifact.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docbatch library.
///
/// Per-file failures use [`ConvertError`] and are stored in the progress
/// record rather than propagated here.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The scan root does not exist. Not retried; fix the path and rerun.
    #[error("Root directory not found: '{path}'\nCheck the path exists and is readable.")]
    RootNotFound { path: PathBuf },

    /// The scan root exists but is a file, not a directory.
    #[error("Not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A recoverable error for a single document.
///
/// The worker maps every variant to a `failed` entry plus an error-log line;
/// one bad file must never abort the batch.
#[derive(Debug, Clone, Error)]
pub enum ConvertError {
    /// The conversion engine rejected or choked on the document.
    #[error("conversion engine error: {detail}")]
    Engine { detail: String },

    /// The engine returned, but with no usable text.
    #[error("conversion produced no text")]
    EmptyOutput,

    /// The engine did not answer within the configured window.
    #[error("conversion timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Reading the source or writing the sibling output failed.
    #[error("I/O error on '{path}': {detail}")]
    Io { path: PathBuf, detail: String },
}

/// A non-fatal error from an output renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer was handed an empty document list.
    #[error("nothing to render into a {format} artifact")]
    NothingToRender { format: &'static str },

    /// The artifact could not be written.
    #[error("failed to write {format} artifact '{path}': {detail}")]
    WriteFailed {
        format: &'static str,
        path: PathBuf,
        detail: String,
    },
}
