use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use palette_remap::{BufferError, PaletteError};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid palette: {0}")]
    Palette(#[from] PaletteError),

    #[error("Unknown palette: {0}")]
    UnknownPalette(String),

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("Upload exceeds {max} bytes")]
    PayloadTooLarge { max: usize },

    #[error("Job not found or still processing")]
    JobNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}

/// Failure while converting one job's image
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Image decode error: {0}")]
    Decode(String),

    #[error("PNG encode error: {0}")]
    Encode(String),

    #[error("Pixel buffer error: {0}")]
    Buffer(#[from] BufferError),

    #[error("Conversion exceeded {limit:?} time limit")]
    Timeout { limit: Duration },

    #[error("Conversion cancelled")]
    Cancelled,

    #[error("Conversion task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(_)
            | ApiError::Palette(_)
            | ApiError::UnknownPalette(_)
            | ApiError::InvalidFileType(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::PayloadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            ApiError::JobNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "status": status.as_u16(),
            "error": message,
        }));

        (status, body).into_response()
    }
}
