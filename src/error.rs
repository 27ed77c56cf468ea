use axum::{
    extract::multipart::MultipartError,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("File size exceeds maximum of {max_mb}MB")]
    PayloadTooLarge { max_mb: f64 },

    #[error("Invalid file type. Allowed types: {}", .allowed.join(", "))]
    InvalidFileType { allowed: Vec<String> },

    #[error("Invalid or corrupted image file")]
    InvalidImage,

    #[error("Image with ID '{image_id}' not found")]
    NotFound { image_id: String },

    #[error("API key required")]
    Unauthorized,

    #[error("Invalid API key")]
    Forbidden,

    #[error("{0}")]
    BadRequest(&'static str),

    /// Rejections raised while reading the multipart body.
    #[error(transparent)]
    Multipart(#[from] MultipartError),

    /// Details are logged where the failure happens, never returned.
    #[error("Failed to {operation}")]
    Internal { operation: &'static str },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InvalidFileType { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidImage => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(rejection) => rejection.status(),
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Multipart(rejection) => rejection.into_response(),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(json!({ "detail": self.to_string() })),
            )
                .into_response(),
            other => (
                other.status_code(),
                Json(json!({ "detail": other.to_string() })),
            )
                .into_response(),
        }
    }
}
