//! # qec-runtime
//!
//! Async runtime for QEC-SFT governance analysis.
//!
//! `qec-core` holds the deterministic pipeline pieces. This crate wires
//! them to the outside world:
//! - AI providers for representation generation, with template fallback
//! - Prometheus metrics shared across concurrent analyses
//! - Audit forwarding
//! - Environment configuration
//!
//! Provider credentials are optional. Without any, every representation
//! comes from the template library and `ai_provider_used` is `simulation`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use qec_runtime::{AnalysisEngine, QecMetrics, RuntimeConfig};
//!
//! let metrics = Arc::new(QecMetrics::new()?);
//! let engine = AnalysisEngine::from_config(RuntimeConfig::from_env()?, metrics)?;
//!
//! let request = AnalysisRequest::new("All deployments must pass security review.");
//! let response = engine.analyze(&request).await?;
//! ```

pub mod audit;
pub mod config;
pub mod engine;
pub mod generator;
pub mod metrics;
pub mod providers;

pub use audit::{AuditError, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use config::{ProviderSettings, RuntimeConfig};
pub use engine::{AiProviderStatus, AnalysisEngine, ServiceStatus, SERVICE_VERSION};
pub use generator::{Representation, RepresentationGenerator};
pub use metrics::QecMetrics;
pub use providers::{LlmProvider, ProviderError, ProviderRegistry};

use thiserror::Error;

/// Errors from the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Analysis failed: {message}")]
    AnalysisFailed { analysis_id: String, message: String },

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RuntimeError {
    /// Analysis id when the failure belongs to one run.
    pub fn analysis_id(&self) -> Option<&str> {
        match self {
            RuntimeError::AnalysisFailed { analysis_id, .. } => Some(analysis_id),
            _ => None,
        }
    }
}
