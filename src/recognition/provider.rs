//! Core trait and types for text recognition providers.

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

use super::language::Language;

/// Ordered paragraphs recognised in one image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecognizedText {
    pub fragments: Vec<String>,
}

impl RecognizedText {
    pub fn new(fragments: Vec<String>) -> Self {
        Self { fragments }
    }

    /// All fragments joined by newlines, the form every export starts from.
    pub fn joined(&self) -> String {
        self.fragments.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Errors that can occur during text recognition.
#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    /// The file type is not supported by this provider.
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// The requested language is unknown or the engine was not loaded with it.
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The provider is not properly configured.
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// An error occurred in the provider's API or processing.
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// The engine did not answer within the configured timeout.
    #[error("Recognition timed out after {0}s")]
    Timeout(u64),

    /// An I/O error occurred while reading the file.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    HttpError(String),
}

/// Trait for text recognition providers.
///
/// Implementors turn an image on disk into an ordered sequence of text
/// fragments. A single instance is built at start-up and shared by every
/// request, so implementations must be safe to call concurrently.
#[async_trait]
pub trait TextRecognizer: Send + Sync + std::fmt::Debug {
    /// Recognise the text in the image at `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the stored image
    /// * `mime_type` - Validated image type; the stored name may not carry it
    /// * `languages` - Languages to recognise, never empty
    async fn recognize(
        &self,
        path: &Path,
        mime_type: &str,
        languages: &[Language],
    ) -> Result<RecognizedText, RecognitionError>;

    /// Check if this provider supports the given MIME type.
    fn supports_mime_type(&self, mime_type: &str) -> bool;

    /// Get the provider name for logging and debugging.
    fn provider_name(&self) -> &'static str;
}
