//! Upload request errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Request-path errors surfaced by the upload endpoint. Each variant maps
/// to exactly one HTTP status; nothing is retried.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The request carries no usable identity claim.
    #[error("User ID not found in token claims.")]
    MissingIdentity,

    /// The file payload is empty or malformed.
    #[error("{0}")]
    InvalidPayload(String),

    /// The blob-store write failed.
    #[error("Failed to upload file to S3: {0}")]
    StorageWrite(anyhow::Error),

    /// The metadata-store write failed after the blob write succeeded.
    #[error("Failed to register metadata in DynamoDB: {0}")]
    MetadataWrite(anyhow::Error),
}

/// Standard error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Machine-readable error code
    pub code: String,
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::MissingIdentity => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::InvalidPayload(_) => (StatusCode::BAD_REQUEST, "INVALID_PAYLOAD"),
            Self::StorageWrite(e) => {
                tracing::error!(error = %e, "Blob store write failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_WRITE_FAILED")
            }
            Self::MetadataWrite(e) => {
                tracing::error!(error = %e, "Metadata store write failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "METADATA_WRITE_FAILED")
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
