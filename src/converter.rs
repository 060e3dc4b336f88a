//! The document-conversion capability seam.
//!
//! OCR, layout analysis, and table-structure recognition live in an external
//! engine. The pipeline needs exactly one operation from it: path in,
//! Markdown out. Everything behind [`DocumentConverter::convert`] is a black
//! box to the batch driver.
//!
//! ## Why a shared trait object?
//!
//! An extraction engine holds loaded model state and is expensive to
//! construct, so the driver constructs it once per run and shares it across
//! all workers as an `Arc<dyn DocumentConverter>`. Implementations must
//! therefore tolerate concurrent `convert` calls (`Send + Sync`).

use crate::error::ConvertError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single table recognised in a document, as structured cell text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTable {
    /// Rows of trimmed cell text. The first row is the header when present.
    pub rows: Vec<Vec<String>>,
}

impl DocumentTable {
    /// Widest row in the table.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }
}

/// What the conversion capability returns for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Extracted text, Markdown-formatted.
    pub markdown: String,

    /// Page count, when the engine reports one.
    pub page_count: Option<usize>,

    /// Tables recognised in the document.
    pub tables: Vec<DocumentTable>,

    /// Engine confidence in `[0, 1]`, when reported.
    pub confidence: Option<f32>,
}

impl ConversionOutput {
    /// An output carrying only Markdown text.
    pub fn from_markdown(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
            page_count: None,
            tables: Vec::new(),
            confidence: None,
        }
    }
}

/// The external conversion capability consumed by the batch pipeline.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use docbatch::{ConversionOutput, ConvertError, DocumentConverter};
/// use std::path::Path;
///
/// struct UppercaseConverter;
///
/// #[async_trait]
/// impl DocumentConverter for UppercaseConverter {
///     async fn convert(&self, path: &Path) -> Result<ConversionOutput, ConvertError> {
///         let text = tokio::fs::read_to_string(path).await.map_err(|e| ConvertError::Io {
///             path: path.to_path_buf(),
///             detail: e.to_string(),
///         })?;
///         Ok(ConversionOutput::from_markdown(text.to_uppercase()))
///     }
/// }
/// ```
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Convert one document to Markdown, or fail with a per-file error.
    ///
    /// Long-running and blocking in nature (seconds to tens of seconds per
    /// file); CPU-bound implementations should offload to `spawn_blocking`.
    async fn convert(&self, path: &Path) -> Result<ConversionOutput, ConvertError>;
}

// ── Built-in converters ──────────────────────────────────────────────────

/// Pass-through converter for text-like files.
///
/// Reads `.md` / `.txt` / `.markdown` / `.csv` sources verbatim and refuses
/// everything else. This is the placeholder the CLI wires up when no
/// extraction engine is compiled in; it keeps the whole pipeline drivable
/// (discovery, progress, resume, merge) without any model downloads.
pub struct PlainTextConverter;

#[async_trait]
impl DocumentConverter for PlainTextConverter {
    async fn convert(&self, path: &Path) -> Result<ConversionOutput, ConvertError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "md" | "markdown" | "txt" | "csv" => {}
            other => {
                return Err(ConvertError::Engine {
                    detail: format!(
                        "no extraction engine for '.{other}' files — \
                         inject a DocumentConverter, or build with --features engine-kreuzberg"
                    ),
                });
            }
        }

        let markdown =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ConvertError::Io {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                })?;
        if markdown.trim().is_empty() {
            return Err(ConvertError::EmptyOutput);
        }

        let tables = crate::pipeline::tables::extract_tables(&markdown);
        Ok(ConversionOutput {
            markdown,
            page_count: None,
            tables,
            confidence: None,
        })
    }
}

/// Converter backed by the kreuzberg extraction engine.
///
/// Handles PDF, Office formats, e-books, and images (with OCR configured in
/// the engine). One instance is cheap to clone a reference to and safe to
/// share across workers.
#[cfg(feature = "engine-kreuzberg")]
pub struct KreuzbergConverter {
    config: kreuzberg::ExtractionConfig,
}

#[cfg(feature = "engine-kreuzberg")]
impl KreuzbergConverter {
    /// Engine with default extraction settings.
    pub fn new() -> Self {
        Self {
            config: kreuzberg::ExtractionConfig::default(),
        }
    }

    /// Engine with a caller-supplied extraction configuration.
    pub fn with_config(config: kreuzberg::ExtractionConfig) -> Self {
        Self { config }
    }
}

#[cfg(feature = "engine-kreuzberg")]
impl Default for KreuzbergConverter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "engine-kreuzberg")]
#[async_trait]
impl DocumentConverter for KreuzbergConverter {
    async fn convert(&self, path: &Path) -> Result<ConversionOutput, ConvertError> {
        let result = kreuzberg::extract_file(path, None, &self.config)
            .await
            .map_err(|e| ConvertError::Engine {
                detail: e.to_string(),
            })?;

        if result.content.trim().is_empty() {
            return Err(ConvertError::EmptyOutput);
        }

        let page_count = result.pages.as_ref().map(|p| p.len());
        let tables = crate::pipeline::tables::extract_tables(&result.content);
        Ok(ConversionOutput {
            markdown: result.content,
            page_count,
            tables,
            confidence: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_markdown_carries_no_metadata() {
        let out = ConversionOutput::from_markdown("# Title");
        assert_eq!(out.markdown, "# Title");
        assert!(out.page_count.is_none());
        assert!(out.tables.is_empty());
    }

    #[test]
    fn table_column_count() {
        let t = DocumentTable {
            rows: vec![
                vec!["a".into(), "b".into()],
                vec!["1".into(), "2".into(), "3".into()],
            ],
        };
        assert_eq!(t.column_count(), 3);
    }

    #[tokio::test]
    async fn plain_text_converter_refuses_binary_formats() {
        let err = PlainTextConverter
            .convert(Path::new("scan.pdf"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains(".pdf"), "got: {err}");
    }

    #[tokio::test]
    async fn plain_text_converter_reads_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("note.md");
        std::fs::write(&p, "# hello\n\nworld\n").unwrap();

        let out = PlainTextConverter.convert(&p).await.unwrap();
        assert!(out.markdown.starts_with("# hello"));
    }

    #[tokio::test]
    async fn plain_text_converter_rejects_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("blank.txt");
        std::fs::write(&p, "   \n").unwrap();

        let err = PlainTextConverter.convert(&p).await.unwrap_err();
        assert!(matches!(err, ConvertError::EmptyOutput));
    }
}
