//! Illustrative governance evidence packet.
//!
//! The packet is a valid analysis request (`lsu`, `analysis_type`, ...) with
//! extra sections a CI pipeline would attach. Unknown sections are ignored by
//! the analyzer, so the output can be fed straight back into `qec analyze --file`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

pub const EVIDENCE_LSU: &str = "All AI model deployments must undergo comprehensive security \
validation and maintain audit trails for regulatory compliance.";

/// Random 12-hex-digit identifier.
fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

/// Build a packet with fresh pipeline and commit ids.
pub fn generate_evidence_packet() -> Value {
    evidence_packet(&short_id(), &short_id(), Utc::now())
}

/// Build a packet with the given identifiers.
pub fn evidence_packet(pipeline_id: &str, commit: &str, at: DateTime<Utc>) -> Value {
    json!({
        "lsu": EVIDENCE_LSU,
        "analysis_type": "full",
        "ai_provider_preference": "hybrid",
        "integration_mode": "opa",
        "metadata": {
            "pipeline_id": pipeline_id,
            "git_commit_hash": commit,
            "timestamp": at.to_rfc3339_opts(SecondsFormat::Micros, true),
            "project_name": "acgs-pgp-enhanced",
            "environment": "production",
            "submitter": "ci-cd-pipeline",
            "use_case": "ai_governance",
            "compliance_frameworks": ["SOC2", "GDPR", "ISO27001"],
            "security_classification": "confidential"
        },
        "requirements": {
            "security": {
                "vulnerability_scanning": true,
                "penetration_testing": true,
                "access_control_validation": true,
                "encryption_compliance": true,
                "audit_logging": true
            },
            "compliance": {
                "gdpr_compliance": true,
                "data_minimization": true,
                "consent_management": true,
                "retention_policies": true,
                "breach_notification": true
            },
            "performance": {
                "response_time_sla": "< 100ms",
                "availability_target": "99.9%",
                "scalability_requirement": "1000 TPS",
                "resource_optimization": true
            },
            "governance": {
                "model_versioning": true,
                "change_management": true,
                "approval_workflow": true,
                "risk_assessment": true,
                "documentation_complete": true
            }
        },
        "dependencies": [
            {
                "name": "tensorflow",
                "version": "2.13.0",
                "vulnerability_score": 0.1,
                "license": "Apache-2.0",
                "security_scan_date": "2024-01-15T10:00:00Z"
            },
            {
                "name": "scikit-learn",
                "version": "1.3.2",
                "vulnerability_score": 0.0,
                "license": "BSD-3-Clause",
                "security_scan_date": "2024-01-15T10:00:00Z"
            },
            {
                "name": "numpy",
                "version": "1.24.3",
                "vulnerability_score": 0.05,
                "license": "BSD-3-Clause",
                "security_scan_date": "2024-01-15T10:00:00Z"
            }
        ],
        "data_schema": {
            "fields": [
                {"name": "user_id", "type": "string", "pii": false},
                {"name": "transaction_amount", "type": "decimal", "pii": false},
                {"name": "timestamp", "type": "datetime", "pii": false},
                {"name": "risk_score", "type": "float", "pii": false}
            ],
            "data_sources": ["internal_db", "external_api"],
            "retention_period": "7_years",
            "encryption_at_rest": true,
            "encryption_in_transit": true
        },
        "model_metadata": {
            "model_type": "classification",
            "training_data_size": 1_000_000,
            "model_accuracy": 0.94,
            "model_fairness": {
                "demographic_parity": 0.91,
                "equalized_odds": 0.89,
                "calibration": 0.92
            },
            "explainability": {
                "method": "SHAP",
                "feature_importance_available": true,
                "decision_boundaries_documented": true
            },
            "drift_monitoring": {
                "data_drift_threshold": 0.1,
                "concept_drift_threshold": 0.05,
                "monitoring_frequency": "daily"
            }
        },
        "security_analysis": {
            "threat_model_completed": true,
            "attack_surface_analyzed": true,
            "adversarial_testing": {
                "completed": true,
                "attack_success_rate": 0.03,
                "robustness_score": 0.97
            },
            "privacy_analysis": {
                "differential_privacy": true,
                "k_anonymity": 5,
                "l_diversity": true
            }
        },
        "deployment_configuration": {
            "environment": "kubernetes",
            "resource_limits": {"cpu": "2000m", "memory": "4Gi", "gpu": "1"},
            "auto_scaling": {
                "enabled": true,
                "min_replicas": 2,
                "max_replicas": 10,
                "target_cpu_utilization": 70
            },
            "monitoring": {
                "metrics_enabled": true,
                "logging_level": "INFO",
                "tracing_enabled": true,
                "alerting_configured": true
            }
        },
        "qec_specific": {
            "semantic_consistency_required": true,
            "cross_validation_enabled": true,
            "fault_tolerance_level": "high",
            "stabilizer_checks": [
                "syntax_validation",
                "semantic_consistency",
                "security_analysis",
                "performance_check",
                "compliance_audit"
            ],
            "coherence_threshold": 0.8,
            "ai_reasoning_enabled": true,
            "multi_provider_validation": true
        }
    })
}
