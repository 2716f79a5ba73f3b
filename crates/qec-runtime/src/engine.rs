//! Analysis engine: the pipeline orchestrator.
//!
//! One call to [`AnalysisEngine::analyze`] runs, in order:
//! 1. Representation generation (provider calls with template fallback)
//! 2. Stabilizer checks
//! 3. Certificate synthesis
//! 4. Policy rendering (OPA integration only)
//! 5. Compliance and recommendations
//! 6. Audit forwarding
//!
//! Failures from steps 1-5 are caught once here, logged with the analysis
//! id, counted, and returned as `AnalysisFailed`. The in-flight gauge is
//! held by a guard, so it is restored on success, on error and when the
//! future is dropped mid-flight.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, Instrument};

use qec_core::{
    finalize_response, ids, run_stabilizer_checks, AnalysisError, AnalysisRequest,
    AnalysisResponse, CertificateSynthesizer, ScoringStrategy, SimulatedScoring, StabilizerSet,
    SIMULATION_PROVIDER,
};

use crate::audit::{record_audit, AuditSink, TracingAuditSink};
use crate::config::RuntimeConfig;
use crate::generator::RepresentationGenerator;
use crate::metrics::QecMetrics;
use crate::providers::{LlmProvider, ProviderRegistry};
use crate::RuntimeError;

/// Version reported by the status endpoint.
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Which provider credentials are configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiProviderStatus {
    pub nvidia: bool,
    pub groq: bool,
}

/// Service status snapshot. No side effects to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    pub version: String,
    pub ai_providers: AiProviderStatus,
    pub opa_endpoint: String,
    pub timestamp: DateTime<Utc>,
}

/// The analysis pipeline with its injected collaborators.
pub struct AnalysisEngine {
    registry: ProviderRegistry,
    generator: RepresentationGenerator,
    stabilizers: StabilizerSet,
    scoring: Arc<dyn ScoringStrategy>,
    synthesizer: CertificateSynthesizer,
    audit_sink: Arc<dyn AuditSink>,
    metrics: Arc<QecMetrics>,
    opa_endpoint: String,
}

impl AnalysisEngine {
    /// Build the engine from runtime configuration.
    ///
    /// Providers without credentials are left out; with none configured the
    /// engine runs template-only.
    pub fn from_config(
        config: RuntimeConfig,
        metrics: Arc<QecMetrics>,
    ) -> Result<Self, RuntimeError> {
        let registry = ProviderRegistry::from_config(&config)
            .map_err(|e| RuntimeError::Configuration(e.to_string()))?;

        let scoring = SimulatedScoring::new(config.stabilizer_seed)
            .with_success_probability(config.success_probability);

        let generator = RepresentationGenerator::new(metrics.clone(), config.completion)
            .with_max_retries(config.max_retries)
            .with_concurrency(config.concurrent_generation);

        Ok(Self {
            registry,
            generator,
            stabilizers: config.stabilizers,
            scoring: Arc::new(scoring),
            synthesizer: CertificateSynthesizer::new(),
            audit_sink: Arc::new(TracingAuditSink),
            metrics,
            opa_endpoint: config.opa_endpoint,
        })
    }

    pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_generator(mut self, generator: RepresentationGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_stabilizers(mut self, stabilizers: StabilizerSet) -> Self {
        self.stabilizers = stabilizers;
        self
    }

    pub fn with_scoring(mut self, scoring: Arc<dyn ScoringStrategy>) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: CertificateSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_audit_sink(mut self, audit_sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = audit_sink;
        self
    }

    pub fn metrics(&self) -> &Arc<QecMetrics> {
        &self.metrics
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Analyze one governance requirement.
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResponse, RuntimeError> {
        let _active = self.metrics.track_active();
        let started = Instant::now();
        let analysis_id = ids::analysis_id(&request.lsu, Utc::now());
        let analysis_type = request.analysis_type.as_str().to_string();
        let type_label = request.analysis_type.metric_label();

        let span = tracing::info_span!(
            "analysis",
            analysis_id = %analysis_id,
            analysis_type = %analysis_type
        );

        let outcome = self
            .run(request, &analysis_id, started)
            .instrument(span)
            .await;

        self.metrics
            .analysis_duration_seconds
            .observe(started.elapsed().as_secs_f64());

        match outcome {
            Ok(response) => {
                self.metrics.record_analysis(type_label, true);
                self.metrics.coherence_score.set(response.confidence_score);

                record_audit(self.audit_sink.as_ref(), &response).await;

                info!(
                    analysis_id = %analysis_id,
                    compliance_status = %response.compliance_status,
                    coherence_score = response.confidence_score,
                    processing_time_ms = response.processing_time_ms,
                    "Analysis completed"
                );
                Ok(response)
            }
            Err(e) => {
                self.metrics.record_analysis(type_label, false);
                error!(analysis_id = %analysis_id, error = %e, "Analysis failed");
                Err(RuntimeError::AnalysisFailed {
                    analysis_id,
                    message: e.to_string(),
                })
            }
        }
    }

    async fn run(
        &self,
        request: &AnalysisRequest,
        analysis_id: &str,
        started: Instant,
    ) -> Result<AnalysisResponse, AnalysisError> {
        request.validate()?;

        let provider = self
            .registry
            .select(request.ai_provider_preference.as_deref());
        let ai_provider_used = provider_label(provider.as_ref());

        let representations = self
            .generator
            .generate(&request.lsu, provider.as_ref())
            .await;

        let results = run_stabilizer_checks(&self.stabilizers, self.scoring.as_ref());

        let result = self.synthesizer.synthesize(
            &request.lsu,
            analysis_id,
            representations,
            results,
            &ai_provider_used,
        )?;

        finalize_response(
            request,
            analysis_id,
            result,
            started.elapsed().as_millis() as u64,
        )
    }

    /// Status snapshot for the status endpoint.
    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            status: "healthy".to_string(),
            version: SERVICE_VERSION.to_string(),
            ai_providers: AiProviderStatus {
                nvidia: self.registry.is_configured("nvidia"),
                groq: self.registry.is_configured("groq"),
            },
            opa_endpoint: self.opa_endpoint.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// `<name>-enhanced` for an available provider, `simulation` otherwise.
fn provider_label(provider: &dyn LlmProvider) -> String {
    if provider.is_available() {
        format!("{}-enhanced", provider.name())
    } else {
        SIMULATION_PROVIDER.to_string()
    }
}

impl std::fmt::Debug for AnalysisEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisEngine")
            .field("registry", &self.registry)
            .field("stabilizers", &self.stabilizers.len())
            .field("scoring", &self.scoring.name())
            .field("opa_endpoint", &self.opa_endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::providers::{
        ChatMessage, CompletionConfig, CompletionResponse, ProviderError, TokenUsage,
    };
    use async_trait::async_trait;
    use qec_core::{ComplianceStatus, FixedScoring, Outcome, StabilizerSpec};

    struct NamedProvider(&'static str);

    #[async_trait]
    impl LlmProvider for NamedProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            Ok(CompletionResponse {
                content: format!("generated by {}", self.0),
                usage: TokenUsage::default(),
                model: "named".to_string(),
            })
        }

        fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    fn engine() -> (AnalysisEngine, Arc<MemoryAuditSink>) {
        let metrics = Arc::new(QecMetrics::new().unwrap());
        let sink = Arc::new(MemoryAuditSink::new());
        let engine = AnalysisEngine::from_config(RuntimeConfig::default(), metrics)
            .unwrap()
            .with_scoring(Arc::new(FixedScoring::uniform(Outcome::Pass, 0.9)))
            .with_audit_sink(sink.clone());
        (engine, sink)
    }

    fn requests_total(metrics: &QecMetrics, analysis_type: &str, status: &str) -> u64 {
        metrics
            .analysis_requests_total
            .with_label_values(&[analysis_type, status])
            .get()
    }

    #[tokio::test]
    async fn test_template_only_run_records_everything() {
        let (engine, sink) = engine();
        let request = AnalysisRequest::new("Encrypt all data at rest.");

        let response = engine.analyze(&request).await.unwrap();

        assert_eq!(response.ai_provider_used, "simulation");
        assert_eq!(response.compliance_status, ComplianceStatus::Compliant);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.entries()[0].decision_id, response.analysis_id);

        let metrics = engine.metrics();
        assert_eq!(requests_total(metrics, "full", "success"), 1);
        assert_eq!(metrics.active_analyses.get(), 0);
        assert!((metrics.coherence_score.get() - 0.9).abs() < 1e-12);
        assert_eq!(metrics.analysis_duration_seconds.get_sample_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_analysis_failed_with_id() {
        let (engine, sink) = engine();
        let engine = engine.with_stabilizers(StabilizerSet::new(vec![]).unwrap());
        let request = AnalysisRequest::new("Log every access.").with_analysis_type("compliance");

        let err = engine.analyze(&request).await.unwrap_err();

        match err {
            RuntimeError::AnalysisFailed {
                analysis_id,
                message,
            } => {
                assert!(analysis_id.starts_with("qec-"));
                assert!(message.contains("no stabilizers configured"));
            }
            other => panic!("Expected AnalysisFailed, got {:?}", other),
        }
        assert!(sink.is_empty());
        assert_eq!(requests_total(engine.metrics(), "compliance", "error"), 1);
        assert_eq!(engine.metrics().active_analyses.get(), 0);
    }

    #[tokio::test]
    async fn test_unknown_analysis_types_share_one_series() {
        let (engine, _sink) = engine();

        for i in 0..50 {
            let request =
                AnalysisRequest::new("Keep audit trails.").with_analysis_type(format!("t{}", i));
            engine.analyze(&request).await.unwrap();
        }
        engine
            .analyze(&AnalysisRequest::new("Keep audit trails.").with_analysis_type("security"))
            .await
            .unwrap();

        let metrics = engine.metrics();
        assert_eq!(requests_total(metrics, "other", "success"), 50);
        assert_eq!(requests_total(metrics, "security", "success"), 1);

        let exported = metrics.export().unwrap();
        let series = exported
            .lines()
            .filter(|line| line.starts_with("qec_analysis_requests_total{"))
            .count();
        assert_eq!(series, 2);
    }

    #[tokio::test]
    async fn test_blank_lsu_fails_without_touching_providers() {
        let (engine, _sink) = engine();
        let err = engine.analyze(&AnalysisRequest::new("  ")).await.unwrap_err();
        assert!(matches!(err, RuntimeError::AnalysisFailed { .. }));
    }

    #[tokio::test]
    async fn test_provider_preference_selects_label_and_content() {
        let (engine, _sink) = engine();
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(NamedProvider("nvidia")));
        registry.register(Arc::new(NamedProvider("groq")));
        let engine = engine.with_registry(registry);

        let default = engine
            .analyze(&AnalysisRequest::new("Keep audit trails."))
            .await
            .unwrap();
        assert_eq!(default.ai_provider_used, "nvidia-enhanced");
        assert_eq!(
            default.qec_result.payload.representations["policy.rego"],
            "generated by nvidia"
        );

        let preferred = engine
            .analyze(&AnalysisRequest::new("Keep audit trails.").with_provider_preference("groq"))
            .await
            .unwrap();
        assert_eq!(preferred.ai_provider_used, "groq-enhanced");
        assert_eq!(preferred.qec_result.ai_provider_used, "groq-enhanced");
    }

    #[tokio::test]
    async fn test_config_driven_stabilizer_count() {
        let (engine, _sink) = engine();
        let engine = engine.with_stabilizers(
            StabilizerSet::new(vec![
                StabilizerSpec::new("syntax_validation", 0.8),
                StabilizerSpec::new("security_analysis", 0.9),
            ])
            .unwrap(),
        );

        let response = engine
            .analyze(&AnalysisRequest::new("Rotate keys quarterly."))
            .await
            .unwrap();
        assert_eq!(response.qec_result.certificate.syndrome_vector.len(), 2);
        assert_eq!(response.qec_result.stabilizer_results.len(), 2);
    }

    #[tokio::test]
    async fn test_status_reflects_registry() {
        let (engine, _sink) = engine();
        let status = engine.status();
        assert_eq!(status.status, "healthy");
        assert_eq!(status.version, SERVICE_VERSION);
        assert_eq!(
            status.ai_providers,
            AiProviderStatus {
                nvidia: false,
                groq: false
            }
        );
        assert_eq!(status.opa_endpoint, crate::config::DEFAULT_OPA_ENDPOINT);

        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(NamedProvider("groq")));
        let status = engine.with_registry(registry).status();
        assert!(status.ai_providers.groq);
        assert!(!status.ai_providers.nvidia);
    }

    #[tokio::test]
    async fn test_dropped_analysis_restores_gauge() {
        struct Stalled;

        #[async_trait]
        impl LlmProvider for Stalled {
            async fn complete(
                &self,
                _messages: Vec<ChatMessage>,
                _config: &CompletionConfig,
            ) -> Result<CompletionResponse, ProviderError> {
                futures::future::pending().await
            }

            fn is_available(&self) -> bool {
                true
            }

            fn name(&self) -> &str {
                "stalled"
            }
        }

        let (engine, _sink) = engine();
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(Stalled));
        let engine = engine.with_registry(registry);
        let request = AnalysisRequest::new("Cancel me.");

        {
            let analysis = engine.analyze(&request);
            tokio::pin!(analysis);
            let polled =
                tokio::time::timeout(std::time::Duration::from_millis(20), &mut analysis).await;
            assert!(polled.is_err());
            assert_eq!(engine.metrics().active_analyses.get(), 1);
        }

        assert_eq!(engine.metrics().active_analyses.get(), 0);
    }
}
