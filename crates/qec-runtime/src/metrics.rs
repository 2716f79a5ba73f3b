//! Process-wide analysis metrics.
//!
//! One [`QecMetrics`] is created at startup and shared through an `Arc`.
//! Every metric is registered under the `qec` prefix on a private registry
//! so tests can build independent instances.

use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use crate::RuntimeError;

/// Outcome label values for provider calls.
pub const PROVIDER_ATTEMPT: &str = "attempt";
pub const PROVIDER_SUCCESS: &str = "success";
pub const PROVIDER_ERROR: &str = "error";

/// Metrics for the analysis pipeline
pub struct QecMetrics {
    registry: Registry,

    /// Completed analyses by type and outcome
    pub analysis_requests_total: IntCounterVec,

    /// Wall-clock duration of whole analyses
    pub analysis_duration_seconds: Histogram,

    /// Provider calls by provider and status (attempt, success, error)
    pub ai_provider_requests_total: IntCounterVec,

    /// Coherence score of the most recent analysis
    pub coherence_score: Gauge,

    /// Analyses currently in flight
    pub active_analyses: IntGauge,
}

impl QecMetrics {
    /// Create and register all metrics on a fresh `qec`-prefixed registry.
    pub fn new() -> Result<Self, RuntimeError> {
        let registry = Registry::new_custom(Some("qec".to_string()), None)?;

        let analysis_requests_total = IntCounterVec::new(
            Opts::new("analysis_requests_total", "Total QEC analysis requests"),
            &["analysis_type", "status"],
        )?;
        registry.register(Box::new(analysis_requests_total.clone()))?;

        let analysis_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("analysis_duration_seconds", "QEC analysis duration")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        )?;
        registry.register(Box::new(analysis_duration_seconds.clone()))?;

        let ai_provider_requests_total = IntCounterVec::new(
            Opts::new("ai_provider_requests_total", "AI provider requests"),
            &["provider", "status"],
        )?;
        registry.register(Box::new(ai_provider_requests_total.clone()))?;

        let coherence_score = Gauge::new("coherence_score", "Latest QEC coherence score")?;
        registry.register(Box::new(coherence_score.clone()))?;

        let active_analyses = IntGauge::new("active_analyses", "Active QEC analyses")?;
        registry.register(Box::new(active_analyses.clone()))?;

        Ok(Self {
            registry,
            analysis_requests_total,
            analysis_duration_seconds,
            ai_provider_requests_total,
            coherence_score,
            active_analyses,
        })
    }

    pub fn record_provider(&self, provider: &str, status: &str) {
        self.ai_provider_requests_total
            .with_label_values(&[provider, status])
            .inc();
    }

    pub fn record_analysis(&self, analysis_type: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        self.analysis_requests_total
            .with_label_values(&[analysis_type, status])
            .inc();
    }

    /// Mark one analysis in flight until the guard drops.
    pub fn track_active(&self) -> ActiveAnalysisGuard<'_> {
        self.active_analyses.inc();
        ActiveAnalysisGuard {
            gauge: &self.active_analyses,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in Prometheus text format.
    pub fn export(&self) -> Result<String, RuntimeError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| RuntimeError::Configuration(format!("metrics are not UTF-8: {}", e)))
    }
}

impl std::fmt::Debug for QecMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QecMetrics")
            .field("active_analyses", &self.active_analyses.get())
            .field("coherence_score", &self.coherence_score.get())
            .finish()
    }
}

/// Decrements the in-flight gauge exactly once, on whatever path drops it.
#[must_use = "the analysis is only tracked while the guard is alive"]
pub struct ActiveAnalysisGuard<'a> {
    gauge: &'a IntGauge,
}

impl Drop for ActiveAnalysisGuard<'_> {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}
