use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use std::time::Duration;

use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use tracing::info;

use crate::AppState;
use crate::api;
use crate::config::AppConfig;
use crate::rate_limit::{SimpleRateLimiter, rate_limit_middleware};
use crate::recognition::{RecognitionService, RecognizerFactory};
use crate::retention::RetentionSweeper;
use crate::storage::{PUBLIC_PREFIX, Storage};

/// Directory holding stylesheets and other static assets.
pub const STATIC_DIR: &str = "static";

/// Assemble the shared state from configuration and an already-built
/// recognition service.
pub async fn build_state(
    config: Arc<AppConfig>,
    recognizer: Arc<RecognitionService>,
) -> anyhow::Result<AppState> {
    let storage = Arc::new(
        Storage::open(&config.storage.dir, config.storage.isolate_uploads).await?,
    );
    let rate_limiter = Arc::new(SimpleRateLimiter::new(
        config.resilience.requests_per_second,
        config.resilience.burst_size,
    ));

    Ok(AppState {
        config,
        storage,
        recognizer,
        rate_limiter,
    })
}

/// Build the router with every route and middleware layer.
pub fn build_router(state: AppState) -> Router {
    let timeout_duration = Duration::from_secs(state.config.server.request_timeout_secs);
    let max_upload_bytes = state.config.server.max_upload_bytes;

    api::router()
        .nest_service(
            PUBLIC_PREFIX,
            ServeDir::new(state.storage.root().to_path_buf()),
        )
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout_duration, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
                }
            },
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let recognizer = RecognizerFactory::create(&config.recognition)?;
    let recognizer = Arc::new(RecognitionService::new(recognizer, &config.recognition)?);

    let state = build_state(Arc::clone(&config), recognizer).await?;

    if let Some(sweeper) = RetentionSweeper::from_config(Arc::clone(&state.storage), &config.storage) {
        sweeper.spawn();
    }

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
