//! Application state for API handlers

use std::sync::Arc;

use qec_runtime::AnalysisEngine;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The analysis pipeline; also owns the process-wide metrics
    pub engine: Arc<AnalysisEngine>,

    /// Server start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(engine: Arc<AnalysisEngine>) -> Self {
        Self {
            engine,
            started_at: chrono::Utc::now(),
        }
    }
}
