//! Authorization policy rendering.
//!
//! Produces Rego source for the policy-decision engine from a certificate.
//! The analysis type becomes part of the package path and a rule name, so it
//! is reduced to a safe identifier before it is embedded.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{AnalysisType, Certificate};
use crate::AnalysisError;

/// Minimum coherence score the generated policy requires.
pub const POLICY_COHERENCE_THRESHOLD: f64 = 0.7;

/// Rego keywords and root documents; never valid as a bare identifier.
const REGO_RESERVED: &[&str] = &[
    "as", "contains", "data", "default", "else", "every", "false", "if", "import", "in",
    "input", "not", "null", "package", "some", "true", "with",
];

lazy_static! {
    /// Runs of characters that may not appear in a Rego identifier.
    static ref NON_IDENTIFIER: Regex = Regex::new(r"[^a-z0-9_]+").unwrap();
}

/// Reduce an analysis-type tag to `[a-z][a-z0-9_]*`.
///
/// Digit-leading results and reserved words get a `t_` prefix. Fails when
/// nothing identifier-like survives.
pub fn sanitize_identifier(raw: &str) -> Result<String, AnalysisError> {
    let lowered = raw.trim().to_lowercase();
    let replaced = NON_IDENTIFIER.replace_all(&lowered, "_");
    let trimmed = replaced.trim_matches('_');

    if trimmed.is_empty() {
        return Err(AnalysisError::InvalidConfiguration(format!(
            "analysis type '{}' has no identifier characters",
            raw
        )));
    }

    if trimmed.starts_with(|c: char| c.is_ascii_digit()) || REGO_RESERVED.contains(&trimmed) {
        Ok(format!("t_{}", trimmed))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Render the authorization policy for a certificate.
pub fn generate_opa_policy(
    certificate: &Certificate,
    analysis_type: &AnalysisType,
) -> Result<String, AnalysisError> {
    let kind = sanitize_identifier(analysis_type.as_str())?;

    Ok(format!(
        r#"# Generated OPA Policy from QEC-SFT Analysis
# Analysis ID: {diagnosis_id}
# Coherence Score: {score:.2}
# Status: {status}

package acgs.qec.{kind}

import future.keywords.if
import future.keywords.in

default allow = false

# Main authorization rule based on QEC analysis
allow if {{
    qec_coherence_validated
    security_requirements_met
    {kind}_specific_checks
}}

# QEC coherence validation
qec_coherence_validated if {{
    input.qec_analysis.status == "COHERENT"
    input.qec_analysis.coherence_score >= {threshold}
}}

# Security requirements
security_requirements_met if {{
    count(input.security_violations) == 0
    input.user.authenticated == true
    input.user.role in ["authorized_user", "admin"]
}}

# Analysis-specific checks
{kind}_specific_checks if {{
    input.validation_passed == true
    input.compliance_verified == true
}}

# Violation tracking
violations[msg] {{
    input.qec_analysis.status == "INCOHERENT"
    msg := "QEC analysis failed coherence validation"
}}

violations[msg] {{
    input.qec_analysis.coherence_score < {threshold}
    msg := sprintf("Coherence score %.2f below threshold", [input.qec_analysis.coherence_score])
}}
"#,
        diagnosis_id = certificate.diagnosis_id,
        score = certificate.coherence_score,
        status = certificate.status,
        kind = kind,
        threshold = POLICY_COHERENCE_THRESHOLD,
    ))
}
