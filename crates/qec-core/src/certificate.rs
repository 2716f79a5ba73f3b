//! Certificate synthesis: aggregates stabilizer results into a certificate
//! of semantic integrity and assembles the full analysis result.
//!
//! Aggregation is the unweighted mean of `outcome * confidence`. The
//! per-stabilizer weight travels with each result but is not applied here;
//! downstream consumers depend on the current numeric output.

use chrono::Utc;

use crate::templates::artifact_body;
use crate::types::{
    AnalysisPayload, AnalysisResult, ArtifactType, Certificate, CoherenceStatus, PayloadMetadata,
    RepresentationSet, RiskAssessment, Severity, Signature, StabilizerResult,
};
use crate::AnalysisError;

/// Semantic diagnosis engine version stamped on certificates.
pub const SDE_VERSION: &str = "v8.2.0-production";

/// Key identifier on the placeholder signature.
pub const SIGNING_KEY_ID: &str = "acgs-pgp-enhanced-key";

/// Algorithm label on the placeholder signature.
pub const SIGNATURE_ALGORITHM: &str = "ECDSA-SHA256";

/// Scores above this are LOW risk.
pub const LOW_RISK_THRESHOLD: f64 = 0.7;

/// Scores below this are HIGH risk.
pub const HIGH_RISK_THRESHOLD: f64 = 0.3;

/// Unweighted mean of `outcome * confidence`.
///
/// Fails on an empty result list instead of producing NaN.
pub fn coherence_score(results: &[StabilizerResult]) -> Result<f64, AnalysisError> {
    if results.is_empty() {
        return Err(AnalysisError::InvalidConfiguration(
            "no stabilizers configured: coherence score is undefined".to_string(),
        ));
    }

    let total: f64 = results
        .iter()
        .map(|r| f64::from(r.outcome.value()) * r.confidence)
        .sum();

    Ok(total / results.len() as f64)
}

/// COHERENT strictly above zero.
pub fn coherence_status(score: f64) -> CoherenceStatus {
    if score > 0.0 {
        CoherenceStatus::Coherent
    } else {
        CoherenceStatus::Incoherent
    }
}

pub fn risk_severity(score: f64) -> Severity {
    if score > LOW_RISK_THRESHOLD {
        Severity::Low
    } else if score < HIGH_RISK_THRESHOLD {
        Severity::High
    } else {
        Severity::Medium
    }
}

fn risk_assessment(score: f64) -> RiskAssessment {
    RiskAssessment {
        severity: risk_severity(score),
        impact_analysis: format!("Coherence score: {:.2}", score),
        mitigation_strategy: if score > LOW_RISK_THRESHOLD {
            "Standard monitoring procedures".to_string()
        } else {
            "Manual review required".to_string()
        },
    }
}

/// Builds certificates and analysis results.
#[derive(Debug, Clone)]
pub struct CertificateSynthesizer {
    sde_version: String,
}

impl CertificateSynthesizer {
    pub fn new() -> Self {
        Self {
            sde_version: SDE_VERSION.to_string(),
        }
    }

    /// Derive a certificate from stabilizer results.
    pub fn certify(
        &self,
        analysis_id: &str,
        results: &[StabilizerResult],
    ) -> Result<Certificate, AnalysisError> {
        let score = coherence_score(results)?;

        Ok(Certificate {
            diagnosis_id: format!("diag-{}", analysis_id),
            lsu_id: analysis_id.to_string(),
            status: coherence_status(score),
            certified_at: Utc::now(),
            syndrome_vector: results.iter().map(|r| r.outcome).collect(),
            sde_version: self.sde_version.clone(),
            coherence_score: score,
            risk_assessment: risk_assessment(score),
        })
    }

    /// Certify and bundle artifact, representations and placeholder signature.
    ///
    /// `processing_duration_ms` in the payload metadata starts at zero; the
    /// orchestrator fills it once the whole pipeline has been timed.
    pub fn synthesize(
        &self,
        lsu: &str,
        analysis_id: &str,
        representations: RepresentationSet,
        results: Vec<StabilizerResult>,
        ai_provider_used: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let certificate = self.certify(analysis_id, &results)?;
        let now = Utc::now();
        tracing::debug!(
            analysis_id,
            status = %certificate.status,
            coherence_score = certificate.coherence_score,
            "Certificate synthesized"
        );

        let artifact_type = match certificate.status {
            CoherenceStatus::Coherent => ArtifactType::RegoPolicy,
            CoherenceStatus::Incoherent => ArtifactType::SafetyProtocol,
        };

        let payload = AnalysisPayload {
            artifact_id: format!("artifact-{}", analysis_id),
            artifact_type,
            artifact_body: artifact_body(lsu, certificate.status),
            lsu_id: analysis_id.to_string(),
            representations,
            metadata: PayloadMetadata {
                creation_timestamp: now,
                processing_duration_ms: 0,
                version: self.sde_version.clone(),
                ai_mode: "enhanced-analysis".to_string(),
            },
        };

        let signature = Signature {
            key_id: SIGNING_KEY_ID.to_string(),
            algorithm: SIGNATURE_ALGORITHM.to_string(),
            value: format!("sig-{}", analysis_id),
            timestamp: now,
        };

        Ok(AnalysisResult {
            payload,
            certificate,
            signature,
            ai_provider_used: ai_provider_used.to_string(),
            stabilizer_results: results,
        })
    }
}

impl Default for CertificateSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}
