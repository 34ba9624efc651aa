//! OCR Dashboard
//!
//! A small web front-end around an OCR engine: upload an image, get the
//! recognised text back as a web page and as a downloadable `.txt`, `.docx`
//! or `.xlsx` file.
//!
//! # Architecture
//!
//! - **Server**: Axum router with upload, download and static routes
//! - **Recognition**: provider-agnostic OCR behind [`recognition::TextRecognizer`]
//! - **Export**: one renderer per [`export::ExportFormat`]
//! - **UI**: Askama templates rendered server-side
//!
//! # Modules
//!
//! - [`api`]: HTTP handlers
//! - [`config`]: layered configuration (defaults, file, env, CLI)
//! - [`export`]: plain text, Word and Excel writers
//! - [`recognition`]: OCR providers and the shared recognition service
//! - [`storage`]: the upload directory and download path resolution

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod rate_limit;
pub mod recognition;
pub mod retention;
pub mod server;
pub mod storage;
pub mod telemetry;
pub mod ui;

use crate::config::AppConfig;
use crate::rate_limit::SimpleRateLimiter;
use crate::recognition::RecognitionService;
use crate::storage::Storage;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Global Configuration
    pub config: Arc<AppConfig>,
    /// Upload and export storage area.
    pub storage: Arc<Storage>,
    /// The one recognition engine, built at start-up.
    pub recognizer: Arc<RecognitionService>,
    /// Global Rate Limiter
    pub rate_limiter: Arc<SimpleRateLimiter>,
}
