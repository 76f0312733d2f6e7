//! Structured inbound-request logging.
//!
//! Every call is logged with method, URI, and headers. Bodies are parsed
//! according to their declared content type and logged in structured form;
//! file content is summarized as name/content-type/size so binary payloads
//! never land in the logs. A body that fails to parse is recorded under an
//! `error` field and the request proceeds untouched.

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::AppState;

/// Log the inbound request, then pass it along with its body restored
pub async fn log_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match to_bytes(body, state.max_upload_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(
                method = %parts.method,
                uri = %parts.uri,
                error = %e,
                "Failed to buffer request body"
            );
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({ "error": "Request body too large.", "code": "PAYLOAD_TOO_LARGE" })),
            )
                .into_response();
        }
    };

    let headers = headers_to_json(&parts.headers);
    if bytes.is_empty() {
        info!(
            method = %parts.method,
            uri = %parts.uri,
            headers = %headers,
            "Inbound request"
        );
    } else {
        let body_summary = summarize_body(&parts.headers, &bytes).await;
        info!(
            method = %parts.method,
            uri = %parts.uri,
            headers = %headers,
            body = %body_summary,
            "Inbound request"
        );
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    next.run(request).await
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let map: serde_json::Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            )
        })
        .collect();
    Value::Object(map)
}

/// Structured summary of the request body, per declared content type
async fn summarize_body(headers: &HeaderMap, bytes: &Bytes) -> Value {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("multipart/form-data") {
        match summarize_multipart(content_type, bytes.clone()).await {
            Ok(parts) => json!({ "multipart": parts }),
            Err(e) => json!({ "error": format!("Unparseable multipart body: {e}") }),
        }
    } else if content_type.starts_with("application/json") || content_type.is_empty() {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => summarize_json(value),
            Err(e) => json!({ "error": format!("Unparseable JSON body: {e}") }),
        }
    } else {
        json!({ "content_type": content_type, "size_bytes": bytes.len() })
    }
}

/// Replace the encoded file content with its size so logs stay readable
fn summarize_json(mut value: Value) -> Value {
    if let Some(object) = value.as_object_mut() {
        let encoded_len = match object.get("file_data") {
            Some(Value::String(data)) => Some(data.len()),
            _ => None,
        };
        if let Some(encoded_len) = encoded_len {
            object.insert(
                "file_data".to_string(),
                json!({ "encoded_bytes": encoded_len }),
            );
        }
    }
    value
}

/// Re-parse the buffered multipart body and describe each part as
/// name/content-type/size
async fn summarize_multipart(content_type: &str, bytes: Bytes) -> anyhow::Result<Vec<Value>> {
    let request = Request::builder()
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(bytes))?;

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let mut parts = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?
    {
        let name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().map(ToString::to_string);
        let part_content_type = field.content_type().map(ToString::to_string);
        let data = field.bytes().await.map_err(|e| anyhow::anyhow!("{e}"))?;

        parts.push(json!({
            "name": name,
            "file_name": file_name,
            "content_type": part_content_type,
            "size_bytes": data.len(),
        }));
    }

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_file_data_is_summarized() {
        let body = json!({
            "file_name": "f.txt",
            "comment": "hi",
            "file_data": "aGVsbG8="
        });
        let summary = summarize_json(body);

        assert_eq!(summary["file_name"], "f.txt");
        assert_eq!(summary["comment"], "hi");
        assert_eq!(summary["file_data"]["encoded_bytes"], 8);
    }

    #[test]
    fn test_json_without_file_data_is_untouched() {
        let body = json!({ "status": "ok" });
        assert_eq!(summarize_json(body.clone()), body);
    }

    #[tokio::test]
    async fn test_multipart_parts_are_summarized() {
        let body = concat!(
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"file\"; filename=\"f.bin\"\r\n",
            "Content-Type: application/octet-stream\r\n",
            "\r\n",
            "binarybytes\r\n",
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"comment\"\r\n",
            "\r\n",
            "hello\r\n",
            "--XBOUNDARY--\r\n",
        );
        let parts = summarize_multipart(
            "multipart/form-data; boundary=XBOUNDARY",
            Bytes::from_static(body.as_bytes()),
        )
        .await
        .unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["name"], "file");
        assert_eq!(parts[0]["file_name"], "f.bin");
        assert_eq!(parts[0]["content_type"], "application/octet-stream");
        assert_eq!(parts[0]["size_bytes"], 11);
        assert_eq!(parts[1]["name"], "comment");
        assert_eq!(parts[1]["size_bytes"], 5);
    }

    #[tokio::test]
    async fn test_unparseable_body_is_captured_as_error() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());

        let summary = summarize_body(&headers, &Bytes::from_static(b"{broken")).await;
        assert!(summary["error"]
            .as_str()
            .unwrap()
            .starts_with("Unparseable JSON body"));
    }
}
