//! Router configuration

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers;
use crate::state::AppState;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/qec/analyze", post(handlers::analyze))
        .route("/qec/status", get(handlers::status));

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use qec_core::StabilizerSet;
    use qec_runtime::{AnalysisEngine, QecMetrics, RuntimeConfig};

    fn engine() -> AnalysisEngine {
        let config = RuntimeConfig::from_lookup(|key: &str| match key {
            "QEC_STABILIZER_SEED" => Some("5".to_string()),
            _ => None,
        })
        .unwrap();
        AnalysisEngine::from_config(config, Arc::new(QecMetrics::new().unwrap())).unwrap()
    }

    fn app_with(engine: AnalysisEngine) -> Router {
        create_router(AppState::new(Arc::new(engine)))
    }

    fn app() -> Router {
        app_with(engine())
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_analyze(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/qec/analyze")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_analyze_returns_full_response() {
        let body = json!({
            "lsu": "All deployments must pass security review.",
            "analysisType": "security"
        });

        let resp = app().oneshot(post_analyze(body.to_string())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["lsu_input"], "All deployments must pass security review.");
        assert_eq!(json["ai_provider_used"], "simulation");
        assert_eq!(
            json["qec_result"]["payload"]["representations"]
                .as_object()
                .unwrap()
                .len(),
            4
        );
        let id = json["analysis_id"].as_str().unwrap();
        assert_eq!(json["audit_trail_id"], format!("audit-{}", id));
        assert!(json["opa_policy"]
            .as_str()
            .unwrap()
            .contains("package acgs.qec.security"));
    }

    #[tokio::test]
    async fn test_analyze_rejects_missing_lsu_with_422() {
        let resp = app()
            .oneshot(post_analyze(json!({"analysis_type": "full"}).to_string()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_json(resp).await["detail"].is_string());
    }

    #[tokio::test]
    async fn test_analyze_rejects_malformed_json_with_422() {
        let resp = app().oneshot(post_analyze("{not json")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_pipeline_failure_is_500_with_detail() {
        let failing = engine().with_stabilizers(StabilizerSet::new(vec![]).unwrap());
        let resp = app_with(failing)
            .oneshot(post_analyze(json!({"lsu": "Keep audit trails."}).to_string()))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body_json(resp).await["detail"].as_str().unwrap().to_string();
        assert!(detail.starts_with("Analysis failed: "));
    }

    #[tokio::test]
    async fn test_status_reports_providers() {
        let resp = app().oneshot(get("/api/v1/qec/status")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["version"], qec_runtime::SERVICE_VERSION);
        assert_eq!(json["ai_providers"]["nvidia"], false);
        assert_eq!(json["ai_providers"]["groq"], false);
        assert_eq!(json["opa_endpoint"], "http://opa-service:8181");
    }

    #[tokio::test]
    async fn test_health_and_ready() {
        let app = app();

        let resp = app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "healthy");

        let resp = app.oneshot(get("/ready")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "ready");
    }

    #[tokio::test]
    async fn test_metrics_exposes_counters_after_analysis() {
        let app = app();
        let resp = app
            .clone()
            .oneshot(post_analyze(json!({"lsu": "Rotate keys."}).to_string()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app.oneshot(get("/metrics")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("qec_analysis_requests_total"));
        assert!(text.contains("qec_active_analyses 0"));
    }
}
