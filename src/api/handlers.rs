//! HTTP handlers for the fact-check API

use crate::checker::FactCheckOrchestrator;
use crate::metrics::METRICS;
use crate::verdict::CheckOutcome;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Shared state for all routes
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<FactCheckOrchestrator>,
}

/// Body of `POST /api/v1/check`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRequest {
    pub query: String,
}

/// Error body returned for rejected requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub knowledge_base_available: bool,
    pub indexed_chunks: usize,
}

/// Fact-check a statement
///
/// POST /api/v1/check
pub async fn check_handler(
    State(state): State<AppState>,
    Json(request): Json<CheckRequest>,
) -> Result<Json<CheckOutcome>, (StatusCode, Json<ApiError>)> {
    if request.query.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("VALIDATION_ERROR", "Query cannot be empty")),
        ));
    }

    info!("Check request: {} chars", request.query.len());
    Ok(Json(state.orchestrator.check(&request.query).await))
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let index = state.orchestrator.lexical_index().snapshot();
    let available = !index.is_empty();

    Json(HealthResponse {
        status: if available { "healthy" } else { "degraded" }.to_string(),
        knowledge_base_available: available,
        indexed_chunks: index.len(),
    })
}

/// GET /metrics
pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        METRICS.export_prometheus(),
    )
}
