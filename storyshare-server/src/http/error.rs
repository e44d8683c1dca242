//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.
//! Every body carries an `error` key with a short human-readable message;
//! store and upstream details are logged, not returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::repos::DbError;
use crate::db::Unavailable;
use crate::media::UploadError;
use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Bad or missing input (400)
    Validation(ValidationError),

    /// Missing or invalid admin credentials (401)
    Unauthorized { message: &'static str },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Request body over the size cap (413)
    PayloadTooLarge,

    /// Image host failure (500, logged)
    Upstream(UploadError),

    /// Database error (500, logged)
    Database(DbError),

    /// No connection could be obtained (500, with diagnosis)
    Unavailable(Unavailable),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upstream(_) | Self::Database(_) | Self::Unavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Validation(e) => e.to_string(),
            Self::Unauthorized { message } => (*message).to_string(),
            Self::NotFound { resource, id } => {
                tracing::debug!(resource, id = %id, "Not found");
                format!("{} not found", resource)
            }
            Self::PayloadTooLarge => "Request body too large".to_string(),
            Self::Upstream(e) => {
                tracing::error!("Image upload failed: {}", e);
                "Image upload failed".to_string()
            }
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            Self::Unavailable(e) => {
                tracing::error!("Database unavailable: {}", e.message);
                e.to_string()
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        Self::Database(e)
    }
}

impl From<Unavailable> for ApiError {
    fn from(e: Unavailable) -> Self {
        Self::Unavailable(e)
    }
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        Self::Upstream(e)
    }
}
