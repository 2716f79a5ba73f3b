//! Compliance classification and recommendations.
//!
//! Classification precedence is fixed:
//! 1. COHERENT and score >= 0.8 → COMPLIANT
//! 2. INCOHERENT or score < 0.5 → NON_COMPLIANT
//! 3. Otherwise → REVIEW_REQUIRED

use crate::types::{AnalysisType, Certificate, CoherenceStatus, ComplianceStatus};

pub const COMPLIANT_THRESHOLD: f64 = 0.8;
pub const NON_COMPLIANT_THRESHOLD: f64 = 0.5;

pub fn assess_compliance(certificate: &Certificate) -> ComplianceStatus {
    classify(certificate.status, certificate.coherence_score)
}

/// Classification on raw status and score.
pub fn classify(status: CoherenceStatus, coherence_score: f64) -> ComplianceStatus {
    if status.is_coherent() && coherence_score >= COMPLIANT_THRESHOLD {
        ComplianceStatus::Compliant
    } else if !status.is_coherent() || coherence_score < NON_COMPLIANT_THRESHOLD {
        ComplianceStatus::NonCompliant
    } else {
        ComplianceStatus::ReviewRequired
    }
}

/// Ordered next steps for a certificate. Never empty.
pub fn generate_recommendations(
    certificate: &Certificate,
    analysis_type: &AnalysisType,
) -> Vec<String> {
    let mut recommendations: Vec<String> = match certificate.status {
        CoherenceStatus::Coherent => vec![
            "Policy validation successful - ready for deployment".to_string(),
            "Monitor performance in production environment".to_string(),
            "Schedule regular compliance reviews".to_string(),
        ],
        CoherenceStatus::Incoherent => vec![
            "Address semantic coherence issues before deployment".to_string(),
            "Review failed stabilizer checks".to_string(),
            "Consider manual expert review".to_string(),
        ],
    };

    match analysis_type {
        AnalysisType::Security => {
            recommendations.push("Conduct additional security penetration testing".to_string())
        }
        AnalysisType::Compliance => {
            recommendations.push("Update compliance documentation".to_string())
        }
        AnalysisType::Full | AnalysisType::Other(_) => {}
    }

    recommendations
}
