//! # docbatch
//!
//! Batch-convert scanned documents to Markdown with resumable progress.
//!
//! ## Why this crate?
//!
//! Converting a folder of scanned documents is slow work measured in hours:
//! each file takes seconds to tens of seconds inside an OCR/layout engine,
//! and anything can kill the run halfway through. This crate wraps any such
//! engine in a pipeline that remembers what it already did. Rerunning after
//! a crash, a Ctrl-C, or a reboot resumes from the last finished file
//! instead of starting over, and one bad scan never takes the batch down.
//!
//! ## Pipeline Overview
//!
//! ```text
//! root dir
//!  │
//!  ├─ 1. Discover  recursive walk, extension filter, deterministic order
//!  ├─ 2. Resume    drop paths the progress record already settles
//!  ├─ 3. Convert   sequential loop or bounded pool over the engine seam
//!  ├─ 4. Record    sibling .md artifact + progress record, per file
//!  ├─ 5. Checkpoint JSON save every N files and unconditionally at exit
//!  └─ 6. Summary   counts, per-format tallies, first failures
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docbatch::{BatchConfig, BatchRunner, PlainTextConverter};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BatchConfig::builder().workers(4).build()?;
//!     let runner = BatchRunner::new(config, Arc::new(PlainTextConverter));
//!     let summary = runner.run("./Documents").await?;
//!     println!(
//!         "{} converted, {} skipped, {} failed",
//!         summary.converted, summary.skipped, summary.failed
//!     );
//!     Ok(())
//! }
//! ```
//!
//! The conversion capability is a seam, not a bundled engine: implement
//! [`DocumentConverter`] for whatever OCR stack you run, or enable the
//! `engine-kreuzberg` feature for a ready-made one.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docbatch` binary (clap + anyhow + indicatif + tracing-subscriber) |
//! | `engine-kreuzberg` | off | [`KreuzbergConverter`] backed by the kreuzberg extraction engine |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docbatch = { version = "0.4", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod callback;
pub mod config;
pub mod converter;
pub mod errlog;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod report;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{ctrl_c, BatchRunner};
pub use callback::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use config::{BatchConfig, BatchConfigBuilder, DEFAULT_EXTENSIONS};
#[cfg(feature = "engine-kreuzberg")]
pub use converter::KreuzbergConverter;
pub use converter::{ConversionOutput, DocumentConverter, DocumentTable, PlainTextConverter};
pub use errlog::ErrorLog;
pub use error::{BatchError, ConvertError, RenderError};
pub use pipeline::classify::{classify, Classification, DocumentType};
pub use pipeline::discover::{discover, page_number, sort_by_page, Candidate};
pub use pipeline::input::{is_done, resolve_line, split_paths, PathEntry};
pub use pipeline::tables::extract_tables;
pub use pipeline::worker::process_file;
pub use progress::{FormatTally, ProgressRecord, ProgressStore};
pub use render::{MarkdownRenderer, Renderer, SourceDocument};
pub use report::{BatchSummary, FileOutcome, FileReport, SkipReason};
pub use stream::{run_stream, FileReportStream};
