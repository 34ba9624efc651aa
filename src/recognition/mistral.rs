//! Mistral OCR recognition provider.
//!
//! Sends the image to Mistral's document AI API and segments the returned
//! page markdown into paragraphs. The API detects languages on its own, so
//! the requested set is only logged.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use std::path::Path;

use crate::config::MistralConfig;

use super::language::Language;
use super::provider::{RecognitionError, RecognizedText, TextRecognizer};
use super::segment_paragraphs;

/// Recognizer using the Mistral OCR API.
#[derive(Debug)]
pub struct MistralProvider {
    client: reqwest::Client,
    config: MistralConfig,
}

impl MistralProvider {
    /// Create a new Mistral OCR provider with the given configuration.
    pub fn new(config: MistralConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Check if the provider is properly configured for use.
    pub fn is_configured(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    /// Pull paragraphs out of an OCR response, page by page.
    fn fragments_from_response(body: &serde_json::Value) -> Vec<String> {
        body.get("pages")
            .and_then(|p| p.as_array())
            .map(|pages| {
                pages
                    .iter()
                    .filter_map(|page| page.get("markdown").and_then(|m| m.as_str()))
                    .flat_map(segment_paragraphs)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextRecognizer for MistralProvider {
    async fn recognize(
        &self,
        path: &Path,
        mime_type: &str,
        languages: &[Language],
    ) -> Result<RecognizedText, RecognitionError> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                RecognitionError::ProviderNotConfigured(
                    "Mistral API key not configured".to_string(),
                )
            })?;

        if !self.supports_mime_type(mime_type) {
            return Err(RecognitionError::UnsupportedType(mime_type.to_string()));
        }

        let file_bytes = tokio::fs::read(path).await?;
        let data_url = format!("data:{};base64,{}", mime_type, STANDARD.encode(&file_bytes));

        let body = serde_json::json!({
            "model": self.config.model,
            "document": {
                "type": "image_url",
                "image_url": data_url
            }
        });

        tracing::debug!(
            provider = self.provider_name(),
            requested_languages = %Language::tesseract_spec(languages),
            bytes = file_bytes.len(),
            "Sending image to Mistral OCR"
        );

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RecognitionError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RecognitionError::ProviderError(format!(
                "Mistral OCR error ({status}): {error_text}"
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RecognitionError::ProviderError(e.to_string()))?;

        Ok(RecognizedText::new(Self::fragments_from_response(&result)))
    }

    fn supports_mime_type(&self, mime_type: &str) -> bool {
        matches!(
            mime_type,
            "image/png" | "image/jpeg" | "image/gif" | "image/webp" | "image/tiff"
        )
    }

    fn provider_name(&self) -> &'static str {
        "Mistral OCR"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_images() {
        let provider = MistralProvider::new(MistralConfig::default());
        assert!(provider.supports_mime_type("image/png"));
        assert!(provider.supports_mime_type("image/jpeg"));
        assert!(!provider.supports_mime_type("application/zip"));
    }

    #[test]
    fn test_not_configured_without_key() {
        let provider = MistralProvider::new(MistralConfig::default());
        assert!(!provider.is_configured());

        let blank = MistralProvider::new(MistralConfig {
            api_key: Some("  ".to_string()),
            ..MistralConfig::default()
        });
        assert!(!blank.is_configured());
    }

    #[test]
    fn test_configured_with_key() {
        let provider = MistralProvider::new(MistralConfig {
            api_key: Some("test-key".to_string()),
            ..MistralConfig::default()
        });
        assert!(provider.is_configured());
    }

    #[test]
    fn test_fragments_keep_page_order() {
        let body = serde_json::json!({
            "pages": [
                { "index": 0, "markdown": "Invoice 17\n\nTotal: $42.00" },
                { "index": 1, "markdown": "Thank you" },
                { "index": 2 }
            ]
        });
        assert_eq!(
            MistralProvider::fragments_from_response(&body),
            vec!["Invoice 17", "Total: $42.00", "Thank you"]
        );
    }

    #[test]
    fn test_fragments_missing_pages() {
        let body = serde_json::json!({ "error": "nope" });
        assert!(MistralProvider::fragments_from_response(&body).is_empty());
    }

    #[tokio::test]
    async fn test_recognize_without_key_fails_fast() {
        let provider = MistralProvider::new(MistralConfig::default());
        let err = provider
            .recognize(Path::new("scan.png"), "image/png", &[Language::English])
            .await
            .unwrap_err();
        assert!(matches!(err, RecognitionError::ProviderNotConfigured(_)));
    }
}
