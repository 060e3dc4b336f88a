//! Pipeline stages for batch document conversion.
//!
//! Each submodule implements exactly one step. Keeping stages separate makes
//! each independently testable and lets us swap implementations (e.g. a
//! different discovery strategy) without touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ────▶ discover ────▶ worker ────▶ classify / tables
//! (typed      (recursive     (convert +   (text analysis on
//!  paths)      walk+filter)   write+record) extracted Markdown)
//! ```
//!
//! 1. [`input`]    — turn interactively entered path strings into candidates
//! 2. [`discover`] — enumerate candidates under a root; read-only,
//!    deterministic for a static tree
//! 3. [`worker`]   — the per-file contract: skip, convert, write the sibling
//!    artifact, update the progress record
//! 4. [`classify`] — keyword-weight document-type heuristics
//! 5. [`tables`]   — recover structured tables from the extracted Markdown

pub mod classify;
pub mod discover;
pub mod input;
pub mod tables;
pub mod worker;
