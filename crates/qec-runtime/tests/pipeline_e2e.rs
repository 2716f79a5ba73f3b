//! End-to-end pipeline tests against the public runtime API.

use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde_json::{json, Value};

use qec_core::compliance::classify;
use qec_core::templates::ArtifactKind;
use qec_core::{AnalysisRequest, AuditDecision, ComplianceStatus, StabilizerSet};
use qec_runtime::providers::ChatCompletionsProvider;
use qec_runtime::{
    AnalysisEngine, MemoryAuditSink, ProviderRegistry, QecMetrics, RuntimeConfig, RuntimeError,
};

fn template_only_config(seed: u64) -> RuntimeConfig {
    let seed = seed.to_string();
    RuntimeConfig::from_lookup(move |key| match key {
        "QEC_STABILIZER_SEED" => Some(seed.clone()),
        _ => None,
    })
    .unwrap()
}

/// Chat-completions stub answering 500 for TLA+ prompts.
async fn spawn_stub() -> String {
    async fn chat(Json(body): Json<Value>) -> axum::response::Response {
        let prompt = body["messages"][1]["content"].as_str().unwrap_or_default();
        if prompt.contains("TLA+") {
            return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
        }
        Json(json!({
            "model": body["model"],
            "choices": [{"message": {"role": "assistant", "content": format!("AI <{}>", prompt)}}]
        }))
        .into_response()
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = Router::new().route("/chat/completions", post(chat));
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn security_requirement_without_credentials() {
    let metrics = Arc::new(QecMetrics::new().unwrap());
    let sink = Arc::new(MemoryAuditSink::new());
    let engine = AnalysisEngine::from_config(template_only_config(7), metrics.clone())
        .unwrap()
        .with_audit_sink(sink.clone());

    let lsu = "All deployments must pass security review.";
    let request = AnalysisRequest::new(lsu).with_analysis_type("security");
    let response = engine.analyze(&request).await.unwrap();

    let representations = &response.qec_result.payload.representations;
    assert_eq!(representations.len(), 4);
    for kind in ArtifactKind::ALL {
        assert_eq!(representations[kind.filename()], kind.template(lsu));
    }

    let certificate = &response.qec_result.certificate;
    assert_eq!(certificate.syndrome_vector.len(), 5);
    assert_eq!(
        response.compliance_status,
        classify(certificate.status, certificate.coherence_score)
    );
    assert!(matches!(
        response.compliance_status,
        ComplianceStatus::Compliant
            | ComplianceStatus::NonCompliant
            | ComplianceStatus::ReviewRequired
    ));
    assert!(response
        .recommendations
        .iter()
        .any(|r| r == "Conduct additional security penetration testing"));

    assert_eq!(response.ai_provider_used, "simulation");
    assert_eq!(response.lsu_input, lsu);
    assert_eq!(response.audit_trail_id, format!("audit-{}", response.analysis_id));
    assert!(response.opa_policy.as_deref().unwrap().contains("package acgs.qec.security"));

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    let expected = if response.compliance_status == ComplianceStatus::Compliant {
        AuditDecision::Allow
    } else {
        AuditDecision::Deny
    };
    assert_eq!(entries[0].decision, expected);
}

#[tokio::test]
async fn same_seed_same_certificate() {
    let request = AnalysisRequest::new("Encrypt all data at rest.");

    let mut scores = Vec::new();
    for _ in 0..2 {
        let metrics = Arc::new(QecMetrics::new().unwrap());
        let engine = AnalysisEngine::from_config(template_only_config(42), metrics).unwrap();
        let response = engine.analyze(&request).await.unwrap();
        scores.push((
            response.qec_result.certificate.syndrome_vector.clone(),
            response.confidence_score,
        ));
    }

    assert_eq!(scores[0], scores[1]);
}

#[tokio::test]
async fn http_500_for_one_kind_keeps_other_kinds_ai_sourced() {
    let base_url = spawn_stub().await;
    let metrics = Arc::new(QecMetrics::new().unwrap());

    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(ChatCompletionsProvider::with_key(
        "groq", "test-key", base_url, "stub-model",
    )));

    let engine = AnalysisEngine::from_config(template_only_config(1), metrics.clone())
        .unwrap()
        .with_registry(registry);

    let lsu = "Encrypt backups nightly.";
    let response = engine.analyze(&AnalysisRequest::new(lsu)).await.unwrap();
    let representations = &response.qec_result.payload.representations;

    for kind in ArtifactKind::ALL {
        let content = &representations[kind.filename()];
        if kind == ArtifactKind::TlaSpecification {
            assert_eq!(content, &kind.template(lsu));
        } else {
            assert_eq!(content, &format!("AI <{}>", kind.prompt(lsu)));
        }
    }

    assert_eq!(response.ai_provider_used, "groq-enhanced");

    let count = |status: &str| {
        metrics
            .ai_provider_requests_total
            .with_label_values(&["groq", status])
            .get()
    };
    assert_eq!(count("attempt"), 4);
    assert_eq!(count("success"), 3);
    assert_eq!(count("error"), 1);
}

#[tokio::test]
async fn in_flight_gauge_restored_after_success_and_failure() {
    let metrics = Arc::new(QecMetrics::new().unwrap());
    metrics.active_analyses.set(3);

    let engine = AnalysisEngine::from_config(template_only_config(3), metrics.clone()).unwrap();
    engine
        .analyze(&AnalysisRequest::new("Keep audit trails."))
        .await
        .unwrap();
    assert_eq!(metrics.active_analyses.get(), 3);

    // Empty stabilizer set makes the certificate synthesizer fail
    let failing = AnalysisEngine::from_config(template_only_config(3), metrics.clone())
        .unwrap()
        .with_stabilizers(StabilizerSet::new(vec![]).unwrap());
    let err = failing
        .analyze(&AnalysisRequest::new("Keep audit trails."))
        .await
        .unwrap_err();

    assert!(matches!(err, RuntimeError::AnalysisFailed { .. }));
    assert!(err.to_string().starts_with("Analysis failed: "));
    assert_eq!(metrics.active_analyses.get(), 3);
    assert_eq!(
        metrics
            .analysis_requests_total
            .with_label_values(&["full", "error"])
            .get(),
        1
    );
}

#[tokio::test]
async fn concurrent_analyses_share_metrics() {
    let metrics = Arc::new(QecMetrics::new().unwrap());
    let engine = Arc::new(
        AnalysisEngine::from_config(template_only_config(11), metrics.clone()).unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .analyze(&AnalysisRequest::new(format!("Requirement number {}", i)))
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    assert_eq!(metrics.active_analyses.get(), 0);
    assert_eq!(
        metrics
            .analysis_requests_total
            .with_label_values(&["full", "success"])
            .get(),
        8
    );
}
