//! Kreuzberg recognition provider.
//!
//! Uses the Kreuzberg Rust core with its Tesseract OCR backend. Everything
//! runs locally on the CPU; the blocking extraction is moved onto tokio's
//! blocking pool.

use async_trait::async_trait;
use std::path::Path;

use crate::config::RecognitionConfig;

use super::language::Language;
use super::provider::{RecognitionError, RecognizedText, TextRecognizer};
use super::segment_paragraphs;

/// Kreuzberg-based recognizer using the native Rust core.
#[derive(Debug)]
pub struct KreuzbergProvider {
    ocr_backend: String,
    force_ocr: bool,
}

impl KreuzbergProvider {
    /// Create a new Kreuzberg provider from the recognition settings.
    pub fn new(config: &RecognitionConfig) -> Self {
        Self {
            ocr_backend: config.ocr_backend.clone(),
            force_ocr: config.force_ocr,
        }
    }

    /// Build the Kreuzberg ExtractionConfig for one request.
    fn build_extraction_config(&self, languages: &[Language]) -> kreuzberg::ExtractionConfig {
        let mut config = kreuzberg::ExtractionConfig::default();

        config.ocr = Some(kreuzberg::OcrConfig {
            backend: self.ocr_backend.clone(),
            language: Language::tesseract_spec(languages),
            tesseract_config: None,
        });
        config.force_ocr = self.force_ocr;

        config
    }
}

#[async_trait]
impl TextRecognizer for KreuzbergProvider {
    async fn recognize(
        &self,
        path: &Path,
        mime_type: &str,
        languages: &[Language],
    ) -> Result<RecognizedText, RecognitionError> {
        if !self.supports_mime_type(mime_type) {
            return Err(RecognitionError::UnsupportedType(mime_type.to_string()));
        }

        let extraction_config = self.build_extraction_config(languages);
        let path_buf = path.to_path_buf();
        let mime_type = mime_type.to_string();
        let result = tokio::task::spawn_blocking(move || {
            kreuzberg::extract_file_sync(path_buf, Some(mime_type.as_str()), &extraction_config)
        })
        .await
        .map_err(|e| RecognitionError::ProviderError(format!("Task join error: {e}")))?
        .map_err(|e| RecognitionError::ProviderError(format!("Kreuzberg error: {e}")))?;

        let fragments = segment_paragraphs(&result.content);
        tracing::debug!(
            provider = self.provider_name(),
            fragments = fragments.len(),
            languages = %Language::tesseract_spec(languages),
            "Recognition finished"
        );

        Ok(RecognizedText::new(fragments))
    }

    fn supports_mime_type(&self, mime_type: &str) -> bool {
        matches!(
            mime_type,
            "image/png"
                | "image/jpeg"
                | "image/jpg"
                | "image/gif"
                | "image/webp"
                | "image/bmp"
                | "image/tiff"
        )
    }

    fn provider_name(&self) -> &'static str {
        "Kreuzberg"
    }
}
