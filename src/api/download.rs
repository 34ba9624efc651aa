use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use crate::AppState;
use crate::error::AppError;
use crate::storage::StorageError;

/// GET /download/{*path}
///
/// Stream a stored file as an attachment. The key is resolved inside the
/// storage root; anything escaping it is rejected.
pub async fn download_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let stored = match state.storage.resolve(&key).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Rejected download");
            return Err(e.into());
        }
    };

    let file = tokio::fs::File::open(&stored.path)
        .await
        .map_err(StorageError::from)?;
    let length = file
        .metadata()
        .await
        .map_err(StorageError::from)?
        .len();

    tracing::debug!(key = %stored.key, size = length, "Serving download");

    let headers = [
        (
            header::CONTENT_TYPE,
            "application/octet-stream".to_string(),
        ),
        (header::CONTENT_DISPOSITION, attachment(&stored.filename)),
        (header::CONTENT_LENGTH, length.to_string()),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

fn attachment(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| if c == '"' || c.is_control() { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}
