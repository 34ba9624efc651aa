//! Factory for creating recognizers based on configuration.

use std::sync::Arc;

use super::kreuzberg::KreuzbergProvider;
use super::mistral::MistralProvider;
use super::provider::{RecognitionError, TextRecognizer};
use crate::config::RecognitionConfig;

/// Factory for creating recognizers based on configuration.
#[derive(Debug)]
pub struct RecognizerFactory;

impl RecognizerFactory {
    /// Create the recognizer named by `config.provider`.
    ///
    /// # Provider Selection
    ///
    /// - `kreuzberg`: local Tesseract through Kreuzberg
    /// - `mistral`: hosted Mistral OCR, requires an API key
    /// - `auto`: Mistral when a key is configured, Kreuzberg otherwise
    pub fn create(config: &RecognitionConfig) -> Result<Arc<dyn TextRecognizer>, RecognitionError> {
        match config.provider.trim().to_ascii_lowercase().as_str() {
            "kreuzberg" => {
                tracing::info!(
                    "Using Kreuzberg for recognition (OCR backend: {})",
                    config.ocr_backend
                );
                Ok(Arc::new(KreuzbergProvider::new(config)))
            }
            "mistral" => {
                let provider = MistralProvider::new(config.mistral.clone());
                if !provider.is_configured() {
                    return Err(RecognitionError::ProviderNotConfigured(
                        "Mistral API key required".to_string(),
                    ));
                }
                tracing::info!(model = %config.mistral.model, "Using Mistral OCR for recognition");
                Ok(Arc::new(provider))
            }
            "auto" => {
                let provider = MistralProvider::new(config.mistral.clone());
                if provider.is_configured() {
                    tracing::info!("Using Mistral OCR for recognition");
                    return Ok(Arc::new(provider));
                }
                tracing::info!(
                    "Using Kreuzberg for recognition (OCR backend: {})",
                    config.ocr_backend
                );
                Ok(Arc::new(KreuzbergProvider::new(config)))
            }
            other => Err(RecognitionError::ProviderNotConfigured(format!(
                "Unknown recognition provider: {other}"
            ))),
        }
    }
}
