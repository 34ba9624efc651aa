//! OCR Dashboard server
//!
//! Entry point for the image-to-text web application.

use mimalloc::MiMalloc;

/// Global allocator for improved performance.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use dotenvy::dotenv;
use tracing::info;

use ocr_dashboard::config::AppConfig;
use ocr_dashboard::{server, telemetry};

#[tokio::main]
async fn main() {
    // Load .env (if present)
    let _ = dotenv();

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("Configuration error: {msg}");
            std::process::exit(1);
        }
    };

    telemetry::init(&config.logging);

    info!(
        name: "ocr.config.loaded",
        provider = %config.recognition.provider,
        languages = ?config.recognition.languages,
        storage = %config.storage.dir.display(),
        "Configuration loaded"
    );

    if let Err(e) = server::start_server(Arc::new(config)).await {
        tracing::error!(error = %e, "Server terminated");
        std::process::exit(1);
    }
}
