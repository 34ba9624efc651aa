//! Serialisation of recognised text into downloadable documents.
//!
//! The set of formats is closed: every [`ExportFormat`] variant has exactly
//! one renderer, and parsing an unknown tag is an error rather than a silent
//! no-op.

mod docx;
mod text;
mod xlsx;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::storage::{Storage, StoredFile, StoredUpload};

/// Column header of the spreadsheet export.
pub const SPREADSHEET_HEADER: &str = "Extracted Text";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to build {format} document: {message}")]
    Build {
        format: ExportFormat,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExportFormat {
    #[serde(rename = "txt")]
    Text,
    #[serde(rename = "docx")]
    WordDocument,
    #[serde(rename = "xlsx")]
    Spreadsheet,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [
        ExportFormat::Text,
        ExportFormat::WordDocument,
        ExportFormat::Spreadsheet,
    ];

    /// Tag used in forms and as the file extension.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::WordDocument => "docx",
            ExportFormat::Spreadsheet => "xlsx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Text => "text/plain; charset=utf-8",
            ExportFormat::WordDocument => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Text => "Plain text (.txt)",
            ExportFormat::WordDocument => "Word document (.docx)",
            ExportFormat::Spreadsheet => "Excel spreadsheet (.xlsx)",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        ExportFormat::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(tag))
            .ok_or_else(|| ExportError::UnsupportedFormat(tag.to_string()))
    }
}

/// Serialise `fragments` in `format`.
pub fn render(format: ExportFormat, fragments: &[String]) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Text => Ok(text::render(fragments)),
        ExportFormat::WordDocument => docx::render(fragments),
        ExportFormat::Spreadsheet => xlsx::render(fragments),
    }
}

/// Render and store the artifact derived from `upload`.
pub async fn write_artifact(
    storage: &Storage,
    upload: &StoredUpload,
    format: ExportFormat,
    fragments: &[String],
) -> Result<StoredFile, ExportError> {
    let artifact = storage.artifact_for(upload, format.extension());
    let bytes = render(format, fragments)?;
    tokio::fs::write(&artifact.path, &bytes).await?;

    tracing::debug!(
        key = %artifact.key,
        format = %format,
        size = bytes.len(),
        "Wrote export artifact"
    );
    Ok(artifact)
}
