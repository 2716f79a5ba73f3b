//! # qec-core
//!
//! Deterministic pieces of the QEC-SFT governance analysis pipeline.
//!
//! Given a natural-language governance requirement (an LSU), this crate:
//! - scores a configured set of stabilizer checks
//! - aggregates them into a certificate of semantic integrity
//! - renders an authorization policy for the policy-decision engine
//! - classifies compliance and derives recommendations
//! - shapes the audit record for the final response
//!
//! ## Key Guarantees
//!
//! 1. **No I/O**: provider calls, metrics and audit forwarding live in `qec-runtime`
//! 2. **Config-driven**: the stabilizer list is data, never hard-coded into aggregation
//! 3. **Explicit failure**: an empty stabilizer set is `InvalidConfiguration`, never NaN
//!
//! ## Example
//!
//! ```rust,ignore
//! use qec_core::{analyze_with_templates, AnalysisRequest, FixedScoring, Outcome, StabilizerSet};
//!
//! let request = AnalysisRequest::new("All deployments must pass security review.")
//!     .with_analysis_type("security");
//! let scoring = FixedScoring::uniform(Outcome::Pass, 0.9);
//! let response = analyze_with_templates(&request, &StabilizerSet::reference(), &scoring)?;
//!
//! println!("{}: {}", response.analysis_id, response.compliance_status);
//! ```

pub mod audit;
pub mod certificate;
pub mod compliance;
pub mod ids;
pub mod policy;
pub mod schema;
pub mod stabilizer;
pub mod templates;
pub mod types;

// Re-export main types at crate root
pub use certificate::{coherence_score, coherence_status, risk_severity, CertificateSynthesizer};
pub use compliance::{assess_compliance, generate_recommendations};
pub use policy::{generate_opa_policy, sanitize_identifier};
pub use schema::{validate_request_schema, RequestError};
pub use stabilizer::{
    run_stabilizer_checks, FixedScoring, ScoringStrategy, SimulatedScoring, StabilizerScore,
    StabilizerSet,
};
pub use templates::{template_representations, ArtifactKind};
pub use types::{
    AnalysisPayload, AnalysisRequest, AnalysisResponse, AnalysisResult, AnalysisType,
    ArtifactType, AuditDecision, AuditEntry, Certificate, CoherenceStatus, ComplianceStatus,
    IntegrationMode, Outcome, PayloadMetadata, RepresentationSet, RiskAssessment, Severity,
    Signature, StabilizerResult, StabilizerSpec,
};

use chrono::Utc;
use thiserror::Error;

/// Provider label when no AI provider is configured.
pub const SIMULATION_PROVIDER: &str = "simulation";

/// Errors that fail a single analysis
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Shape the externally visible response from a synthesized result.
///
/// Renders the policy only for OPA integration, classifies compliance,
/// derives recommendations and stamps the measured duration into both the
/// response and the payload metadata.
pub fn finalize_response(
    request: &AnalysisRequest,
    analysis_id: &str,
    mut result: AnalysisResult,
    processing_time_ms: u64,
) -> Result<AnalysisResponse, AnalysisError> {
    let opa_policy = if request.integration_mode.is_opa() {
        Some(generate_opa_policy(&result.certificate, &request.analysis_type)?)
    } else {
        None
    };

    let compliance_status = assess_compliance(&result.certificate);
    let recommendations = generate_recommendations(&result.certificate, &request.analysis_type);

    result.payload.metadata.processing_duration_ms = processing_time_ms;
    let confidence_score = result.certificate.coherence_score;
    let ai_provider_used = result.ai_provider_used.clone();

    Ok(AnalysisResponse {
        analysis_id: analysis_id.to_string(),
        timestamp: Utc::now(),
        lsu_input: request.lsu.clone(),
        qec_result: result,
        opa_policy,
        compliance_status,
        audit_trail_id: ids::audit_trail_id(analysis_id),
        recommendations,
        processing_time_ms,
        ai_provider_used,
        confidence_score,
    })
}

/// Run the whole pipeline synchronously with template representations.
///
/// Useful offline and in tests; the async engine in `qec-runtime` adds
/// provider calls, metrics and audit forwarding around the same steps.
pub fn analyze_with_templates(
    request: &AnalysisRequest,
    stabilizers: &StabilizerSet,
    scoring: &dyn ScoringStrategy,
) -> Result<AnalysisResponse, AnalysisError> {
    request.validate()?;

    let started = std::time::Instant::now();
    let analysis_id = ids::analysis_id(&request.lsu, Utc::now());

    let representations = template_representations(&request.lsu);
    let results = run_stabilizer_checks(stabilizers, scoring);
    let result = CertificateSynthesizer::new().synthesize(
        &request.lsu,
        &analysis_id,
        representations,
        results,
        SIMULATION_PROVIDER,
    )?;

    finalize_response(
        request,
        &analysis_id,
        result,
        started.elapsed().as_millis() as u64,
    )
}
