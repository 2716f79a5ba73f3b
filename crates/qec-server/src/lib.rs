//! HTTP transport for the QEC-SFT analysis pipeline.
//!
//! Routes:
//! - `POST /api/v1/qec/analyze`
//! - `GET  /api/v1/qec/status`
//! - `GET  /health`, `GET /ready`
//! - `GET  /metrics` (Prometheus text format)

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use router::create_router;
pub use state::AppState;
