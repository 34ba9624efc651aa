use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use super::language::Language;
use super::provider::{RecognitionError, RecognizedText, TextRecognizer};
use crate::config::RecognitionConfig;

/// Selector value meaning "every configured language".
pub const AUTO_LANGUAGE: &str = "auto";

/// The process-wide recognition capability.
///
/// Built once at start-up and shared by every request. Bounds the number of
/// recognitions in flight and the time each one may take.
#[derive(Debug)]
pub struct RecognitionService {
    recognizer: Arc<dyn TextRecognizer>,
    languages: Vec<Language>,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl RecognitionService {
    pub fn new(
        recognizer: Arc<dyn TextRecognizer>,
        config: &RecognitionConfig,
    ) -> Result<Self, RecognitionError> {
        let languages = config
            .parsed_languages()
            .map_err(RecognitionError::ProviderNotConfigured)?;
        let concurrency = config.effective_concurrency();

        tracing::info!(
            provider = recognizer.provider_name(),
            languages = %Language::tesseract_spec(&languages),
            concurrency,
            timeout_secs = config.timeout_secs,
            "Recognition service ready"
        );

        Ok(Self {
            recognizer,
            languages,
            permits: Arc::new(Semaphore::new(concurrency)),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    #[cfg(test)]
    fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.recognizer.provider_name()
    }

    /// Languages the engine was loaded with, in configuration order.
    pub fn supported_languages(&self) -> &[Language] {
        &self.languages
    }

    /// Turn a client selector into the languages to recognise.
    ///
    /// Empty or `auto` selects every configured language. Anything else must
    /// name one language the engine was loaded with.
    pub fn resolve_languages(&self, selector: &str) -> Result<Vec<Language>, RecognitionError> {
        let selector = selector.trim();
        if selector.is_empty() || selector.eq_ignore_ascii_case(AUTO_LANGUAGE) {
            return Ok(self.languages.clone());
        }

        let language: Language = selector.parse()?;
        if self.languages.contains(&language) {
            Ok(vec![language])
        } else {
            Err(RecognitionError::UnsupportedLanguage(selector.to_string()))
        }
    }

    pub fn supports_mime_type(&self, mime_type: &str) -> bool {
        self.recognizer.supports_mime_type(mime_type)
    }

    /// Run the shared recognizer, waiting for a free slot first.
    ///
    /// The recognition runs on its own task that owns the permit. When the
    /// caller gives up after the timeout, the slot stays taken until the
    /// engine has really finished, so blocking OCR work never exceeds the
    /// configured concurrency.
    pub async fn recognize(
        &self,
        path: &Path,
        mime_type: &str,
        languages: &[Language],
    ) -> Result<RecognizedText, RecognitionError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| RecognitionError::ProviderError(format!("Semaphore closed: {e}")))?;

        let recognizer = Arc::clone(&self.recognizer);
        let path = path.to_path_buf();
        let mime_type = mime_type.to_string();
        let languages = languages.to_vec();
        let task = tokio::spawn(async move {
            let result = recognizer.recognize(&path, &mime_type, &languages).await;
            drop(permit);
            result
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(RecognitionError::ProviderError(format!(
                "Recognition task failed: {e}"
            ))),
            Err(_) => {
                tracing::warn!(
                    provider = self.recognizer.provider_name(),
                    timeout_secs = self.timeout.as_secs(),
                    "Recognition timed out; slot held until the engine finishes"
                );
                Err(RecognitionError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}
