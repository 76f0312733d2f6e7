use crate::auth::Subject;
use crate::blob_store::BlobStore;
use crate::config::ServerConfig;
use crate::error::UploadError;
use crate::metadata::{MetadataStore, UploadRecord};
use crate::request_log;
use anyhow::{Context, Result};
use axum::body::to_bytes;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub blob_store: Arc<BlobStore>,
    pub metadata_store: Arc<MetadataStore>,
    pub destination_system_id: String,
    pub max_upload_bytes: usize,
}

/// JSON upload request body
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    /// Original file name
    pub file_name: String,
    /// Optional comment about the file
    #[serde(default)]
    pub comment: Option<String>,
    /// Base64-encoded file content
    pub file_data: String,
}

/// Upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    /// Storage key the file was written under
    pub s3_path: String,
}

/// File payload extracted from either body encoding
#[derive(Debug)]
pub struct FilePayload {
    pub file_name: String,
    pub comment: Option<String>,
    pub content: Vec<u8>,
    pub content_type: String,
}

/// Create the API router
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = if config.cors_enabled {
        if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/upload", post(upload_file))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            request_log::log_requests,
        ))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Upload endpoint: write the file to blob storage, then register the
/// metadata record. The two writes are not transactional; a metadata
/// failure leaves the blob in place.
#[instrument(skip(state, request))]
async fn upload_file(
    State(state): State<AppState>,
    subject: Subject,
    request: Request,
) -> Result<Json<UploadResponse>, UploadError> {
    let Subject(user_id) = subject;
    let payload = parse_upload(request, state.max_upload_bytes).await?;

    let key = BlobStore::storage_key(
        &state.destination_system_id,
        &user_id,
        Utc::now(),
        &payload.file_name,
    );

    let size_bytes = payload.content.len();
    state
        .blob_store
        .put(&key, payload.content, &payload.content_type)
        .await
        .map_err(UploadError::StorageWrite)?;

    let record = UploadRecord::new(
        key.clone(),
        user_id,
        payload.comment,
        state.destination_system_id.clone(),
        Utc::now(),
    );
    state
        .metadata_store
        .register(&record)
        .await
        .map_err(UploadError::MetadataWrite)?;

    metrics::counter!("upload.files.stored").increment(1);
    metrics::counter!("upload.bytes.stored").increment(size_bytes as u64);

    info!(s3_path = %key, size_bytes, "File uploaded");

    Ok(Json(UploadResponse {
        message: "File uploaded successfully.".to_string(),
        s3_path: key,
    }))
}

/// Extract the file payload from either a JSON body (`file_data` base64)
/// or a multipart form (`file` part, optional `comment` field)
async fn parse_upload(request: Request, max_bytes: usize) -> Result<FilePayload, UploadError> {
    let content_type = request
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let payload = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| UploadError::InvalidPayload(format!("Malformed multipart body: {e}")))?;
        parse_multipart(multipart).await?
    } else {
        let bytes = to_bytes(request.into_body(), max_bytes)
            .await
            .map_err(|e| UploadError::InvalidPayload(format!("Unreadable request body: {e}")))?;
        parse_json(&bytes)?
    };

    if payload.content.is_empty() {
        return Err(UploadError::InvalidPayload(
            "File content is empty.".to_string(),
        ));
    }

    Ok(payload)
}

fn parse_json(bytes: &[u8]) -> Result<FilePayload, UploadError> {
    let body: UploadRequest = serde_json::from_slice(bytes)
        .map_err(|e| UploadError::InvalidPayload(format!("Invalid request body: {e}")))?;

    let content = STANDARD
        .decode(body.file_data.trim())
        .map_err(|e| UploadError::InvalidPayload(format!("Invalid Base64 data: {e}")))?;

    Ok(FilePayload {
        file_name: body.file_name,
        comment: body.comment,
        content,
        content_type: "application/octet-stream".to_string(),
    })
}

async fn parse_multipart(mut multipart: Multipart) -> Result<FilePayload, UploadError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut comment: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::InvalidPayload(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().map(ToString::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload.bin").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    UploadError::InvalidPayload(format!("Unreadable file part: {e}"))
                })?;
                file = Some((file_name, content_type, data.to_vec()));
            }
            Some("comment") => {
                let text = field.text().await.map_err(|e| {
                    UploadError::InvalidPayload(format!("Unreadable comment field: {e}"))
                })?;
                comment = Some(text);
            }
            // Unknown parts are ignored
            _ => {}
        }
    }

    let (file_name, content_type, content) =
        file.ok_or_else(|| UploadError::InvalidPayload("Missing file part.".to_string()))?;

    Ok(FilePayload {
        file_name,
        comment,
        content,
        content_type,
    })
}

/// Start the upload API server
pub async fn start_api_server(state: AppState, config: &ServerConfig) -> Result<()> {
    let router = create_router(state, config);
    let addr = format!("{}:{}", config.host, config.port);

    info!(address = %addr, "Starting upload API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, router)
        .await
        .context("API server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    const MAX_BYTES: usize = 1024 * 1024;

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(boundary: &str, body: String) -> Request {
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_parse_json_upload() {
        // "aGVsbG8=" is base64 for "hello"
        let request = json_request(
            r#"{"file_name":"f.txt","comment":"hi","file_data":"aGVsbG8="}"#,
        );
        let payload = parse_upload(request, MAX_BYTES).await.unwrap();

        assert_eq!(payload.file_name, "f.txt");
        assert_eq!(payload.comment.as_deref(), Some("hi"));
        assert_eq!(payload.content, b"hello");
    }

    #[tokio::test]
    async fn test_parse_json_without_comment() {
        let request = json_request(r#"{"file_name":"f.txt","file_data":"aGVsbG8="}"#);
        let payload = parse_upload(request, MAX_BYTES).await.unwrap();
        assert_eq!(payload.comment, None);
    }

    #[tokio::test]
    async fn test_invalid_base64_is_rejected() {
        let request = json_request(r#"{"file_name":"f.txt","file_data":"!!!not-base64!!!"}"#);
        let err = parse_upload(request, MAX_BYTES).await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn test_empty_file_is_rejected() {
        let request = json_request(r#"{"file_name":"f.txt","file_data":""}"#);
        let err = parse_upload(request, MAX_BYTES).await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let request = json_request("not json at all");
        let err = parse_upload(request, MAX_BYTES).await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn test_parse_multipart_upload() {
        let body = concat!(
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"file\"; filename=\"f.txt\"\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "hello\r\n",
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"comment\"\r\n",
            "\r\n",
            "a comment\r\n",
            "--XBOUNDARY--\r\n",
        );
        let request = multipart_request("XBOUNDARY", body.to_string());
        let payload = parse_upload(request, MAX_BYTES).await.unwrap();

        assert_eq!(payload.file_name, "f.txt");
        assert_eq!(payload.comment.as_deref(), Some("a comment"));
        assert_eq!(payload.content, b"hello");
        assert_eq!(payload.content_type, "text/plain");
    }

    #[tokio::test]
    async fn test_multipart_without_file_part_is_rejected() {
        let body = concat!(
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"comment\"\r\n",
            "\r\n",
            "only a comment\r\n",
            "--XBOUNDARY--\r\n",
        );
        let request = multipart_request("XBOUNDARY", body.to_string());
        let err = parse_upload(request, MAX_BYTES).await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidPayload(_)));
    }

    #[test]
    fn test_upload_response_shape() {
        let response = UploadResponse {
            message: "File uploaded successfully.".to_string(),
            s3_path: "A01/u1/20240101000000000/f.txt".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["message"], "File uploaded successfully.");
        assert_eq!(json["s3_path"], "A01/u1/20240101000000000/f.txt");
    }
}
