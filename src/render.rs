//! Output renderers: turn a batch of per-file results into one artifact.
//!
//! Only the Markdown merge ships in this crate. Word, PDF, spreadsheet, and
//! EPUB emitters are external collaborators implementing the same
//! [`Renderer`] trait; their binary formats are out of scope here. A
//! renderer failure is cosmetic by contract: the caller logs it, skips that
//! artifact, and the batch outcome stands.

use crate::error::RenderError;
use chrono::Local;
use std::path::{Path, PathBuf};

/// One source document's contribution to a merged artifact.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// The original input file (used for section labels).
    pub path: PathBuf,
    /// Its extracted Markdown.
    pub markdown: String,
}

/// Renders a list of per-file results into one output artifact.
pub trait Renderer {
    /// Short format label, e.g. `"markdown"`.
    fn format(&self) -> &'static str;

    /// Produce a readable artifact at `output`, or fail with a
    /// renderer-specific error that the caller treats as non-fatal.
    fn render(&self, documents: &[SourceDocument], output: &Path) -> Result<(), RenderError>;
}

/// Merged Markdown document: a generated header, then one `## Page N`
/// section per source in the order given (callers sort by page number
/// first), separated by horizontal rules.
pub struct MarkdownRenderer {
    title: String,
}

impl MarkdownRenderer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl Renderer for MarkdownRenderer {
    fn format(&self) -> &'static str {
        "markdown"
    }

    fn render(&self, documents: &[SourceDocument], output: &Path) -> Result<(), RenderError> {
        if documents.is_empty() {
            return Err(RenderError::NothingToRender { format: "markdown" });
        }

        let mut md = String::new();
        md.push_str(&format!("# {}\n\n", self.title));
        md.push_str(&format!(
            "*Generated: {}*\n\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        md.push_str(&format!("*Total pages: {}*\n\n---\n\n", documents.len()));

        for (idx, doc) in documents.iter().enumerate() {
            let name = doc
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| doc.path.display().to_string());
            md.push_str(&format!("## Page {} - {}\n\n", idx + 1, name));
            md.push_str(doc.markdown.trim_end());
            md.push_str("\n\n---\n\n");
        }

        write_atomic(output, &md).map_err(|e| RenderError::WriteFailed {
            format: "markdown",
            path: output.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str, markdown: &str) -> SourceDocument {
        SourceDocument {
            path: PathBuf::from(format!("/scans/{name}")),
            markdown: markdown.to_string(),
        }
    }

    #[test]
    fn merged_markdown_has_header_and_sections() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("merged.md");

        let renderer = MarkdownRenderer::new("Scanned Contract");
        renderer
            .render(
                &[doc("page_1.jpg", "First page."), doc("page_2.jpg", "Second page.")],
                &out,
            )
            .unwrap();

        let merged = std::fs::read_to_string(&out).unwrap();
        assert!(merged.starts_with("# Scanned Contract\n"));
        assert!(merged.contains("*Total pages: 2*"));
        assert!(merged.contains("## Page 1 - page_1.jpg"));
        assert!(merged.contains("## Page 2 - page_2.jpg"));
        assert!(merged.contains("First page."));
        assert!(merged.contains("Second page."));
    }

    #[test]
    fn empty_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("merged.md");
        let err = MarkdownRenderer::new("Empty")
            .render(&[], &out)
            .unwrap_err();
        assert!(matches!(err, RenderError::NothingToRender { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn renderer_reports_its_format() {
        assert_eq!(MarkdownRenderer::new("x").format(), "markdown");
    }
}
