//! Error types for the analysis server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use qec_core::RequestError;
use qec_runtime::RuntimeError;

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body failed JSON parsing or schema validation
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    /// Pipeline or metrics failure
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Runtime(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorResponse {
            detail: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
