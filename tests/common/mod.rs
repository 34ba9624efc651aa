#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use ocr_dashboard::config::{
    AppConfig, LoggingConfig, MistralConfig, RecognitionConfig, ResilienceConfig, ServerConfig,
    StorageConfig,
};
use ocr_dashboard::recognition::{
    Language, RecognitionError, RecognitionService, RecognizedText, TextRecognizer,
};
use ocr_dashboard::server::{build_router, build_state};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Minimal PNG signature plus padding; the fake engines never decode it.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR fake image payload";

/// Returns the same fragments for every image and records the requested
/// languages and image types.
#[derive(Debug, Default)]
pub struct FixedRecognizer {
    fragments: Vec<String>,
    calls: Mutex<Vec<Vec<Language>>>,
    mime_types: Mutex<Vec<String>>,
}

impl FixedRecognizer {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(ToString::to_string).collect(),
            calls: Mutex::new(Vec::new()),
            mime_types: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<Language>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mime_types(&self) -> Vec<String> {
        self.mime_types.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextRecognizer for FixedRecognizer {
    async fn recognize(
        &self,
        path: &Path,
        mime_type: &str,
        languages: &[Language],
    ) -> Result<RecognizedText, RecognitionError> {
        assert!(path.exists(), "recognizer must see the stored upload");
        self.calls.lock().unwrap().push(languages.to_vec());
        self.mime_types.lock().unwrap().push(mime_type.to_string());
        Ok(RecognizedText::new(self.fragments.clone()))
    }

    fn supports_mime_type(&self, mime_type: &str) -> bool {
        mime_type.starts_with("image/")
    }

    fn provider_name(&self) -> &'static str {
        "Fixed"
    }
}

/// Fails every recognition with an engine error.
#[derive(Debug)]
pub struct FailingRecognizer;

#[async_trait]
impl TextRecognizer for FailingRecognizer {
    async fn recognize(
        &self,
        _path: &Path,
        _mime_type: &str,
        _languages: &[Language],
    ) -> Result<RecognizedText, RecognitionError> {
        Err(RecognitionError::ProviderError(
            "engine crashed while reading /var/secret/model.bin".to_string(),
        ))
    }

    fn supports_mime_type(&self, mime_type: &str) -> bool {
        mime_type.starts_with("image/")
    }

    fn provider_name(&self) -> &'static str {
        "Failing"
    }
}

/// Takes longer than any request should be allowed to.
#[derive(Debug)]
pub struct StalledRecognizer(pub Duration);

#[async_trait]
impl TextRecognizer for StalledRecognizer {
    async fn recognize(
        &self,
        _path: &Path,
        _mime_type: &str,
        _languages: &[Language],
    ) -> Result<RecognizedText, RecognitionError> {
        tokio::time::sleep(self.0).await;
        Ok(RecognizedText::new(vec!["late".to_string()]))
    }

    fn supports_mime_type(&self, mime_type: &str) -> bool {
        mime_type.starts_with("image/")
    }

    fn provider_name(&self) -> &'static str {
        "Stalled"
    }
}

pub fn test_config(storage_dir: PathBuf, isolate_uploads: bool) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_upload_bytes: 1024 * 1024,
            request_timeout_secs: 30,
        },
        storage: StorageConfig {
            dir: storage_dir,
            isolate_uploads,
            retention_secs: 0,
            sweep_interval_secs: 60,
        },
        recognition: RecognitionConfig {
            provider: "test".to_string(),
            languages: ["en", "es", "fr", "de", "it"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            ocr_backend: "tesseract".to_string(),
            force_ocr: true,
            max_concurrent: 2,
            timeout_secs: 5,
            mistral: MistralConfig::default(),
        },
        resilience: ResilienceConfig {
            rate_limit_enabled: false,
            requests_per_second: 5.0,
            burst_size: 10.0,
        },
        logging: LoggingConfig {
            format: "compact".to_string(),
        },
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub storage_root: PathBuf,
    // Keeps the storage area alive for the duration of the test.
    _dir: TempDir,
}

impl TestApp {
    pub async fn new(recognizer: Arc<dyn TextRecognizer>, isolate_uploads: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path().join("uploads"), isolate_uploads);
        Self::with_config(recognizer, config, dir).await
    }

    pub async fn with_config(
        recognizer: Arc<dyn TextRecognizer>,
        config: AppConfig,
        dir: TempDir,
    ) -> Self {
        let storage_root = config.storage.dir.clone();
        let service = RecognitionService::new(recognizer, &config.recognition).unwrap();
        let state = build_state(Arc::new(config), Arc::new(service))
            .await
            .unwrap();
        let server = TestServer::new(build_router(state)).unwrap();

        Self {
            server,
            storage_root,
            _dir: dir,
        }
    }

    /// Path of the stored file behind a `/uploads/...` or `/download/...` URL.
    pub fn stored_path(&self, url: &str) -> PathBuf {
        let key = url
            .strip_prefix("/uploads/")
            .or_else(|| url.strip_prefix("/download/"))
            .expect("storage URL");
        self.storage_root.join(key)
    }

    /// Every file below the storage root, relative to it.
    pub fn stored_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        collect_files(&self.storage_root, &self.storage_root, &mut files);
        files.sort();
        files
    }
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out);
        } else {
            out.push(
                path.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/"),
            );
        }
    }
}
