use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::recognition::Language;

/// Environment variable prefix, e.g. `OCR_SERVER__PORT=9000`.
const ENV_PREFIX: &str = "OCR";

/// Config file picked up from the working directory when none is given.
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Directory holding uploads and exports
    #[arg(long, env = "STORAGE_DIR")]
    pub storage_dir: Option<String>,

    /// Recognition provider (kreuzberg, mistral, auto)
    #[arg(long, env = "RECOGNITION_PROVIDER")]
    pub provider: Option<String>,

    /// Enable rate limiting
    #[arg(long, env = "RATE_LIMIT_ENABLED")]
    pub rate_limit_enabled: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub recognition: RecognitionConfig,
    pub resilience: ResilienceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub dir: PathBuf,
    /// Give every upload its own directory so equal filenames never collide.
    pub isolate_uploads: bool,
    /// Maximum age of stored files; 0 keeps them forever.
    pub retention_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecognitionConfig {
    pub provider: String,
    /// Short language codes the engine is loaded with (`en`, `es`, ...).
    pub languages: Vec<String>,
    pub ocr_backend: String,
    pub force_ocr: bool,
    /// Concurrent recognitions allowed; 0 uses the CPU count.
    pub max_concurrent: usize,
    pub timeout_secs: u64,
    #[serde(default)]
    pub mistral: MistralConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MistralConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
}

impl Default for MistralConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "mistral-ocr-latest".to_string(),
            api_url: "https://api.mistral.ai/v1/ocr".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    pub rate_limit_enabled: bool,
    pub requests_per_second: f32,
    pub burst_size: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `compact` or `json`.
    pub format: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.max_upload_bytes", 20 * 1024 * 1024)?
            .set_default("server.request_timeout_secs", 120)?
            .set_default("storage.dir", "uploads")?
            .set_default("storage.isolate_uploads", true)?
            .set_default("storage.retention_secs", 24 * 60 * 60)?
            .set_default("storage.sweep_interval_secs", 60 * 60)?
            .set_default("recognition.provider", "kreuzberg")?
            .set_default("recognition.languages", vec!["en", "es", "fr", "de", "it"])?
            .set_default("recognition.ocr_backend", "tesseract")?
            .set_default("recognition.force_ocr", true)?
            .set_default("recognition.max_concurrent", 0)?
            .set_default("recognition.timeout_secs", 120)?
            .set_default("resilience.rate_limit_enabled", false)?
            .set_default("resilience.requests_per_second", 5.0)?
            .set_default("resilience.burst_size", 10.0)?
            .set_default("logging.format", "compact")?;

        // An explicit file must exist; the working-directory fallback is optional.
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path).required(true));
        } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
            builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("recognition.languages")
                .try_parsing(true),
        );

        // CLI flags (and their plain env aliases) win over everything else.
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(dir) = cli.storage_dir {
            builder = builder.set_override("storage.dir", dir)?;
        }
        if let Some(provider) = cli.provider {
            builder = builder.set_override("recognition.provider", provider)?;
        }
        if let Some(rl) = cli.rate_limit_enabled {
            builder = builder.set_override("resilience.rate_limit_enabled", rl)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check settings that deserialize fine but cannot run.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        self.recognition
            .parsed_languages()
            .map_err(config::ConfigError::Message)?;
        if self.server.max_upload_bytes == 0 {
            return Err(config::ConfigError::Message(
                "server.max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl RecognitionConfig {
    /// Parse the configured language codes, rejecting unknown and empty lists.
    pub fn parsed_languages(&self) -> Result<Vec<Language>, String> {
        if self.languages.is_empty() {
            return Err("recognition.languages must not be empty".to_string());
        }
        let mut parsed = Vec::with_capacity(self.languages.len());
        for code in &self.languages {
            let language: Language = code.parse().map_err(|e| format!("{e}"))?;
            if !parsed.contains(&language) {
                parsed.push(language);
            }
        }
        Ok(parsed)
    }

    pub fn effective_concurrency(&self) -> usize {
        if self.max_concurrent == 0 {
            num_cpus::get()
        } else {
            self.max_concurrent
        }
    }
}
