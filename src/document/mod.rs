//! Text extraction from planning documents.
//!
//! Converts a PDF, DOCX, or plain-text document into an ordered sequence of
//! [`TextUnit`]s ready for per-unit LLM queries. PDF access goes through the
//! poppler CLI tools (`pdftotext`, `pdfinfo`), so those must be on PATH.

mod cleaner;
mod docx;
mod pdf;
mod plain;

use std::path::Path;
use std::process::Command;

use serde::Serialize;
use thiserror::Error;

pub use cleaner::PageCleaner;

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Invalid DOCX package: {0}")]
    InvalidDocx(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Document format, resolved once from the file extension at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentFormat {
    /// Resolve the format from a file path. Unrecognized extensions are a
    /// hard error; the pipeline must not start on a format it cannot read.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "txt" => Ok(DocumentFormat::PlainText),
            _ => Err(DocumentError::UnsupportedFileType(
                path.display().to_string(),
            )),
        }
    }
}

/// How a document is segmented into units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkMode {
    /// One unit per reconstructed paragraph (layout blocks for PDFs).
    #[default]
    Paragraph,
    /// One unit per page (PDF only; other formats fall back to paragraphs).
    Page,
}

/// One paragraph or page of the source document.
///
/// `position` is the 1-based page number in page mode, otherwise a 1-based
/// sequential index. Units are immutable once produced and ordered by the
/// document's natural reading order.
#[derive(Debug, Clone, Serialize)]
pub struct TextUnit {
    pub position: usize,
    pub raw_text: String,
    pub cleaned_text: String,
}

impl TextUnit {
    /// A unit with no cleaning stage applied (cleaned == raw).
    pub fn new(position: usize, text: String) -> Self {
        Self {
            position,
            cleaned_text: text.clone(),
            raw_text: text,
        }
    }

    pub fn with_cleaned(position: usize, raw_text: String, cleaned_text: String) -> Self {
        Self {
            position,
            raw_text,
            cleaned_text,
        }
    }

    /// The text submitted downstream.
    pub fn text(&self) -> &str {
        &self.cleaned_text
    }
}

/// Extract ordered text units from a document on disk.
pub fn extract_units(
    path: &Path,
    mode: ChunkMode,
    gap_threshold: f32,
) -> Result<Vec<TextUnit>, DocumentError> {
    let format = DocumentFormat::from_path(path)?;
    tracing::debug!("Extracting {:?} units from {}", format, path.display());

    match format {
        DocumentFormat::Pdf => match mode {
            ChunkMode::Paragraph => pdf::extract_paragraphs(path, gap_threshold),
            ChunkMode::Page => pdf::extract_pages(path),
        },
        DocumentFormat::Docx => docx::extract_paragraphs(path),
        DocumentFormat::PlainText => {
            let content = std::fs::read_to_string(path)?;
            Ok(plain::split_paragraphs(&content))
        }
    }
}

/// Check if a binary is available in PATH.
pub(crate) fn check_binary(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Report availability of the external tools the PDF path relies on.
pub fn check_tools() -> Vec<(String, bool)> {
    ["pdftotext", "pdfinfo"]
        .iter()
        .map(|tool| (tool.to_string(), check_binary(tool)))
        .collect()
}

/// Handle command output, extracting stdout on success or returning an
/// appropriate error.
pub(crate) fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, DocumentError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(DocumentError::ExtractionFailed(format!(
                    "{}: {}",
                    error_prefix, stderr
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DocumentError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(DocumentError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("plan.pdf")).unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("plan.DOCX")).unwrap(),
            DocumentFormat::Docx
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("notes.txt")).unwrap(),
            DocumentFormat::PlainText
        );
    }

    #[test]
    fn test_unrecognized_extension_is_fatal() {
        assert!(matches!(
            DocumentFormat::from_path(Path::new("plan.xlsx")),
            Err(DocumentError::UnsupportedFileType(_))
        ));
        assert!(matches!(
            DocumentFormat::from_path(Path::new("no_extension")),
            Err(DocumentError::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn test_unit_positions_strictly_increase() {
        let units = plain::split_paragraphs("one\n\ntwo\n\n\n\nthree");
        let positions: Vec<_> = units.iter().map(|u| u.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn test_check_tools_lists_poppler() {
        let tools = check_tools();
        assert_eq!(tools.len(), 2);
        assert!(tools.iter().any(|(name, _)| name == "pdftotext"));
    }
}
