//! Audit sinks and forwarding.
//!
//! The pipeline forwards one [`AuditEntry`] per completed analysis. Sink
//! failures are logged and dropped: the response has already been computed.

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use qec_core::{AnalysisResponse, AuditEntry};

/// Errors from audit sinks
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),

    #[error("Audit serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Destination for audit entries
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> Result<(), AuditError>;
}

/// Emits each entry as a structured `tracing` event on the `qec::audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let body = serde_json::to_string(entry)?;
        tracing::info!(
            target: "qec::audit",
            decision_id = %entry.decision_id,
            decision = ?entry.decision,
            compliance_status = %entry.compliance_status,
            entry = %body,
            "Audit entry recorded"
        );
        Ok(())
    }
}

/// In-memory audit sink for testing
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        self.entries.write().push(entry.clone());
        Ok(())
    }
}

/// Build the entry for `response` and forward it, swallowing sink errors.
///
/// Returns the entry that was attempted.
pub async fn record_audit(sink: &dyn AuditSink, response: &AnalysisResponse) -> AuditEntry {
    let entry = AuditEntry::from_response(response);

    if let Err(e) = sink.record(&entry).await {
        tracing::warn!(
            analysis_id = %response.analysis_id,
            error = %e,
            "Audit forwarding failed; continuing"
        );
    }

    entry
}
