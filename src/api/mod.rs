//! HTTP handlers.
//!
//! - [`pages`]: home page and health check
//! - [`upload`]: form and JSON upload endpoints
//! - [`download`]: attachment downloads from the storage area

pub mod download;
pub mod pages;
pub mod upload;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::index_handler))
        .route("/health", get(pages::health_handler))
        .route("/upload", post(upload::upload_page_handler))
        .route("/api/upload", post(upload::upload_api_handler))
        .route("/download/{*path}", get(download::download_handler))
}
