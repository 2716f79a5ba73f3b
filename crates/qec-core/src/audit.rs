//! Audit entry construction.
//!
//! Forwarding lives in the runtime; this module only shapes the record.

use std::collections::BTreeMap;

use crate::templates::{truncate_chars, LSU_PREVIEW_CHARS};
use crate::types::{AnalysisResponse, AuditDecision, AuditEntry, ComplianceStatus};

/// Policy path recorded on every audit entry.
pub const AUDIT_POLICY_PATH: &str = "acgs.qec.analysis";

/// Model name recorded on every audit entry.
pub const AUDIT_MODEL_NAME: &str = "qec-sft-enhanced";

impl AuditEntry {
    /// ALLOW only for COMPLIANT; every other status is a DENY with one violation.
    pub fn from_response(response: &AnalysisResponse) -> Self {
        let (decision, violations) = match response.compliance_status {
            ComplianceStatus::Compliant => (AuditDecision::Allow, Vec::new()),
            status => (AuditDecision::Deny, vec![format!("QEC: {}", status)]),
        };

        let mut metadata = BTreeMap::new();
        metadata.insert(
            "lsu_preview".to_string(),
            serde_json::Value::String(format!(
                "{}...",
                truncate_chars(&response.lsu_input, LSU_PREVIEW_CHARS)
            )),
        );
        metadata.insert(
            "ai_provider".to_string(),
            serde_json::Value::String(response.ai_provider_used.clone()),
        );
        metadata.insert(
            "coherence_score".to_string(),
            serde_json::json!(response.confidence_score),
        );

        Self {
            decision_id: response.analysis_id.clone(),
            timestamp: response.timestamp,
            policy_path: AUDIT_POLICY_PATH.to_string(),
            model_name: AUDIT_MODEL_NAME.to_string(),
            decision,
            violations,
            enhanced: true,
            ai_confidence: response.confidence_score,
            processing_time_ms: response.processing_time_ms,
            compliance_status: response.compliance_status,
            metadata,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self.decision, AuditDecision::Allow)
    }
}
