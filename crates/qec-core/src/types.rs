//! Core types for QEC-SFT analysis.
//!
//! Wire names follow the snake_case shape the analysis service has always
//! emitted. Request fields also accept their camelCase spelling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::AnalysisError;

/// Generated artifacts keyed by filename (`policy.rego`, `specification.tla`, ...).
///
/// BTreeMap keeps serialization order stable across runs.
pub type RepresentationSet = BTreeMap<String, String>;

/// What the caller wants analyzed.
///
/// Known kinds get their own variant; anything else is carried verbatim and
/// sanitized before it is embedded in generated policy source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnalysisType {
    Full,
    Security,
    Compliance,
    Other(String),
}

impl AnalysisType {
    pub fn as_str(&self) -> &str {
        match self {
            AnalysisType::Full => "full",
            AnalysisType::Security => "security",
            AnalysisType::Compliance => "compliance",
            AnalysisType::Other(raw) => raw,
        }
    }

    /// Bounded label value for metrics; unknown kinds collapse to `other`.
    pub fn metric_label(&self) -> &'static str {
        match self {
            AnalysisType::Full => "full",
            AnalysisType::Security => "security",
            AnalysisType::Compliance => "compliance",
            AnalysisType::Other(_) => "other",
        }
    }
}

impl Default for AnalysisType {
    fn default() -> Self {
        AnalysisType::Full
    }
}

impl From<String> for AnalysisType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "full" => AnalysisType::Full,
            "security" => AnalysisType::Security,
            "compliance" => AnalysisType::Compliance,
            _ => AnalysisType::Other(value),
        }
    }
}

impl From<&str> for AnalysisType {
    fn from(value: &str) -> Self {
        AnalysisType::from(value.to_string())
    }
}

impl From<AnalysisType> for String {
    fn from(value: AnalysisType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Downstream integration target for the analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IntegrationMode {
    /// Render an authorization policy for the policy-decision engine.
    Opa,
    Other(String),
}

impl IntegrationMode {
    pub fn as_str(&self) -> &str {
        match self {
            IntegrationMode::Opa => "opa",
            IntegrationMode::Other(raw) => raw,
        }
    }

    pub fn is_opa(&self) -> bool {
        matches!(self, IntegrationMode::Opa)
    }
}

impl Default for IntegrationMode {
    fn default() -> Self {
        IntegrationMode::Opa
    }
}

impl From<String> for IntegrationMode {
    fn from(value: String) -> Self {
        if value == "opa" {
            IntegrationMode::Opa
        } else {
            IntegrationMode::Other(value)
        }
    }
}

impl From<IntegrationMode> for String {
    fn from(value: IntegrationMode) -> Self {
        value.as_str().to_string()
    }
}

/// An inbound analysis request. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// The logical semantic unit: a natural-language governance requirement
    pub lsu: String,

    #[serde(default, alias = "analysisType")]
    pub analysis_type: AnalysisType,

    #[serde(
        default,
        alias = "aiProviderPreference",
        skip_serializing_if = "Option::is_none"
    )]
    pub ai_provider_preference: Option<String>,

    #[serde(default, alias = "integrationMode")]
    pub integration_mode: IntegrationMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

impl AnalysisRequest {
    /// Create a full analysis request with OPA integration.
    pub fn new(lsu: impl Into<String>) -> Self {
        Self {
            lsu: lsu.into(),
            analysis_type: AnalysisType::default(),
            ai_provider_preference: None,
            integration_mode: IntegrationMode::default(),
            metadata: None,
        }
    }

    pub fn with_analysis_type(mut self, analysis_type: impl Into<AnalysisType>) -> Self {
        self.analysis_type = analysis_type.into();
        self
    }

    pub fn with_provider_preference(mut self, provider: impl Into<String>) -> Self {
        self.ai_provider_preference = Some(provider.into());
        self
    }

    pub fn with_integration_mode(mut self, mode: IntegrationMode) -> Self {
        self.integration_mode = mode;
        self
    }

    /// Check the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.lsu.trim().is_empty() {
            return Err(AnalysisError::InvalidRequest(
                "lsu must be a non-empty governance requirement".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configured validation check: a name and a weight in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilizerSpec {
    pub name: String,
    pub weight: f64,
}

impl StabilizerSpec {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

/// Outcome of one stabilizer check. Serialized as `1` / `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Outcome {
    Pass,
    Fail,
}

impl Outcome {
    pub fn value(self) -> i8 {
        match self {
            Outcome::Pass => 1,
            Outcome::Fail => -1,
        }
    }
}

impl From<Outcome> for i8 {
    fn from(value: Outcome) -> Self {
        value.value()
    }
}

impl TryFrom<i8> for Outcome {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Outcome::Pass),
            -1 => Ok(Outcome::Fail),
            other => Err(format!("stabilizer outcome must be 1 or -1, got {}", other)),
        }
    }
}

/// Scored result of one stabilizer check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilizerResult {
    pub name: String,
    pub outcome: Outcome,

    /// Confidence in the outcome (0.0 - 1.0)
    pub confidence: f64,

    /// Carried for consumers; not applied when aggregating coherence
    pub weight: f64,

    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoherenceStatus {
    Coherent,
    Incoherent,
}

impl CoherenceStatus {
    pub fn is_coherent(self) -> bool {
        matches!(self, CoherenceStatus::Coherent)
    }
}

impl fmt::Display for CoherenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoherenceStatus::Coherent => write!(f, "COHERENT"),
            CoherenceStatus::Incoherent => write!(f, "INCOHERENT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub severity: Severity,
    pub impact_analysis: String,
    pub mitigation_strategy: String,
}

/// Certificate of semantic integrity derived from stabilizer results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub diagnosis_id: String,
    pub lsu_id: String,
    pub status: CoherenceStatus,
    pub certified_at: DateTime<Utc>,

    /// Outcomes in stabilizer evaluation order
    pub syndrome_vector: Vec<Outcome>,

    pub sde_version: String,
    pub coherence_score: f64,
    pub risk_assessment: RiskAssessment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    RegoPolicy,
    SafetyProtocol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadMetadata {
    pub creation_timestamp: DateTime<Utc>,
    pub processing_duration_ms: u64,
    pub version: String,
    pub ai_mode: String,
}

/// Artifact plus provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub artifact_id: String,
    pub artifact_type: ArtifactType,
    pub artifact_body: String,
    pub lsu_id: String,
    pub representations: RepresentationSet,
    pub metadata: PayloadMetadata,
}

/// Placeholder signature. No cryptographic scheme stands behind `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub key_id: String,
    pub algorithm: String,
    pub value: String,
    pub timestamp: DateTime<Utc>,
}

/// Full pipeline output before response shaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub payload: AnalysisPayload,

    #[serde(rename = "certificate_of_semantic_integrity", alias = "certificate")]
    pub certificate: Certificate,

    pub signature: Signature,
    pub ai_provider_used: String,

    /// Per-stabilizer detail behind the syndrome vector
    #[serde(default)]
    pub stabilizer_results: Vec<StabilizerResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    ReviewRequired,
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplianceStatus::Compliant => write!(f, "COMPLIANT"),
            ComplianceStatus::NonCompliant => write!(f, "NON_COMPLIANT"),
            ComplianceStatus::ReviewRequired => write!(f, "REVIEW_REQUIRED"),
        }
    }
}

/// Externally visible analysis response. Never mutated after return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub analysis_id: String,
    pub timestamp: DateTime<Utc>,
    pub lsu_input: String,
    pub qec_result: AnalysisResult,

    #[serde(default)]
    pub opa_policy: Option<String>,

    pub compliance_status: ComplianceStatus,
    pub audit_trail_id: String,
    pub recommendations: Vec<String>,
    pub processing_time_ms: u64,
    pub ai_provider_used: String,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditDecision {
    Allow,
    Deny,
}

/// Write-once audit record forwarded to an external sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub decision_id: String,
    pub timestamp: DateTime<Utc>,
    pub policy_path: String,
    pub model_name: String,
    pub decision: AuditDecision,
    pub violations: Vec<String>,
    pub enhanced: bool,
    pub ai_confidence: f64,
    pub processing_time_ms: u64,
    pub compliance_status: ComplianceStatus,
    pub metadata: BTreeMap<String, serde_json::Value>,
}
