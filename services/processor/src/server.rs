//! HTTP surface for batch invocation.

use crate::config::ServerConfig;
use crate::processor::{BatchProcessor, BatchResponse};
use anyhow::{Context, Result};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<BatchProcessor>,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/process", post(process_batch))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Batch-invocation endpoint: accepts the change records delivered by the
/// event-routing intermediary and returns the processing summary
async fn process_batch(
    State(state): State<AppState>,
    Json(records): Json<Vec<Value>>,
) -> Json<BatchResponse> {
    Json(state.processor.process_batch(&records).await)
}

/// Start the batch-invocation API server
pub async fn start_api_server(state: AppState, config: &ServerConfig) -> Result<()> {
    let router = create_router(state);
    let addr = format!("{}:{}", config.host, config.port);

    info!(address = %addr, "Starting batch-invocation API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, router)
        .await
        .context("API server error")?;

    Ok(())
}
