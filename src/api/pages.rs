use askama::Template;
use axum::{extract::State, response::Html};

use crate::AppState;
use crate::error::AppError;
use crate::ui::IndexTemplate;

/// GET /
pub async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let page = IndexTemplate::new(&state.recognizer, state.config.server.max_upload_bytes).render()?;
    Ok(Html(page))
}

/// GET /health
pub async fn health_handler() -> &'static str {
    "ok"
}
