//! Request handlers

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use qec_core::{AnalysisRequest, AnalysisResponse, RequestError};
use qec_runtime::ServiceStatus;

use crate::error::ApiResult;
use crate::state::AppState;

/// POST /api/v1/qec/analyze
///
/// The body is read raw so parse and schema failures share one error shape.
pub async fn analyze(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<AnalysisResponse>> {
    let value: Value = serde_json::from_slice(&body).map_err(RequestError::from)?;
    let request = AnalysisRequest::from_value(value)?;

    let response = state.engine.analyze(&request).await?;
    Ok(Json(response))
}

/// GET /api/v1/qec/status
pub async fn status(State(state): State<AppState>) -> Json<ServiceStatus> {
    Json(state.engine.status())
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
    }))
}

/// GET /ready
pub async fn ready(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ready",
        "timestamp": chrono::Utc::now(),
        "uptime_seconds": (chrono::Utc::now() - state.started_at).num_seconds(),
    }))
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> ApiResult<Response> {
    let body = state.engine.metrics().export()?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
