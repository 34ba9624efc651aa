use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::export::ExportError;
use crate::recognition::RecognitionError;
use crate::storage::StorageError;

/// Message sent for every server-side failure; details stay in the logs.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Invalid request data
    #[error("{0}")]
    BadRequest(String),

    /// Payload is not something the engine can read
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Recognition(#[from] RecognitionError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            // 413 when the body limit cut the stream short
            AppError::Multipart(e) => e.status(),
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Recognition(RecognitionError::UnsupportedLanguage(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Recognition(RecognitionError::UnsupportedType(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            AppError::Export(ExportError::UnsupportedFormat(_)) => StatusCode::BAD_REQUEST,
            AppError::Storage(StorageError::OutsideRoot(_)) => StatusCode::BAD_REQUEST,
            AppError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Recognition(_)
            | AppError::Export(_)
            | AppError::Storage(StorageError::Io(_))
            | AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self.status_code() {
            StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
            StatusCode::NOT_FOUND => "NOT_FOUND",
            StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
            StatusCode::BAD_REQUEST if matches!(self, AppError::Storage(_)) => "INVALID_PATH",
            status if status.is_client_error() => "BAD_REQUEST",
            _ => "INTERNAL_ERROR",
        }
    }

    /// Returns a user-safe error message, without leaking internal details.
    pub fn user_message(&self) -> String {
        if self.status_code().is_server_error() {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Client error");
        }

        let body = ErrorBody {
            error: self.user_message(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognition_failure_is_opaque() {
        let err = AppError::from(RecognitionError::ProviderError(
            "tesseract exploded at /srv/secret".to_string(),
        ));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert_eq!(err.user_message(), "Internal Server Error");
    }

    #[test]
    fn test_unsupported_format_is_bad_request() {
        let err = AppError::from(ExportError::UnsupportedFormat("pdf".to_string()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "BAD_REQUEST");
        assert!(err.user_message().contains("pdf"));
    }

    #[test]
    fn test_storage_mapping() {
        let outside = AppError::from(StorageError::OutsideRoot("../x".to_string()));
        assert_eq!(outside.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(outside.code(), "INVALID_PATH");

        let missing = AppError::from(StorageError::NotFound("a.txt".to_string()));
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_language_errors_are_client_errors() {
        let err = AppError::from(RecognitionError::UnsupportedLanguage("xx".to_string()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
