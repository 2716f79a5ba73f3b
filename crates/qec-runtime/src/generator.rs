//! Representation generation with per-kind template fallback.
//!
//! Every artifact kind gets its own provider call. A failed call (transport,
//! non-success status, missing content, timeout) is replaced by that kind's
//! template and never affects the other kinds. An unavailable provider (the
//! template-only one included) is never called.

use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use futures::future::join_all;
use tracing::{debug, warn};

use qec_core::templates::ArtifactKind;
use qec_core::RepresentationSet;

use crate::metrics::{QecMetrics, PROVIDER_ATTEMPT, PROVIDER_ERROR, PROVIDER_SUCCESS};
use crate::providers::{CompletionConfig, LlmProvider, ProviderError};

/// Where one representation came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Representation {
    Generated(String),
    Template { content: String, reason: String },
}

impl Representation {
    pub fn content(&self) -> &str {
        match self {
            Representation::Generated(content) => content,
            Representation::Template { content, .. } => content,
        }
    }

    pub fn into_content(self) -> String {
        match self {
            Representation::Generated(content) => content,
            Representation::Template { content, .. } => content,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, Representation::Generated(_))
    }
}

/// Produces the fixed artifact set for an LSU. Never fails.
pub struct RepresentationGenerator {
    metrics: Arc<QecMetrics>,
    completion: CompletionConfig,
    kinds: Vec<ArtifactKind>,
    max_retries: usize,
    concurrent: bool,
}

impl RepresentationGenerator {
    pub fn new(metrics: Arc<QecMetrics>, completion: CompletionConfig) -> Self {
        Self {
            metrics,
            completion,
            kinds: ArtifactKind::ALL.to_vec(),
            max_retries: 0,
            concurrent: true,
        }
    }

    /// Bounded retries for transient provider failures.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Issue the per-kind calls one after another.
    pub fn with_concurrency(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Generate every kind, falling back to templates per kind.
    pub async fn generate(&self, lsu: &str, provider: &dyn LlmProvider) -> RepresentationSet {
        self.generate_detailed(lsu, provider)
            .await
            .into_iter()
            .map(|(kind, representation)| {
                (kind.filename().to_string(), representation.into_content())
            })
            .collect()
    }

    /// Like [`generate`](Self::generate), keeping provenance per kind.
    pub async fn generate_detailed(
        &self,
        lsu: &str,
        provider: &dyn LlmProvider,
    ) -> Vec<(ArtifactKind, Representation)> {
        if !provider.is_available() {
            debug!(
                provider = provider.name(),
                "No AI provider available; using templates for every artifact"
            );
            return self
                .kinds
                .iter()
                .map(|kind| {
                    (
                        *kind,
                        Representation::Template {
                            content: kind.template(lsu),
                            reason: "provider unavailable".to_string(),
                        },
                    )
                })
                .collect();
        }

        if self.concurrent {
            join_all(self.kinds.iter().map(|kind| self.generate_kind(*kind, lsu, provider)))
                .await
        } else {
            let mut out = Vec::with_capacity(self.kinds.len());
            for kind in &self.kinds {
                out.push(self.generate_kind(*kind, lsu, provider).await);
            }
            out
        }
    }

    async fn generate_kind(
        &self,
        kind: ArtifactKind,
        lsu: &str,
        provider: &dyn LlmProvider,
    ) -> (ArtifactKind, Representation) {
        let prompt = kind.prompt(lsu);

        let call = || self.call_once(provider, &prompt);
        let result = call
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(200))
                    .with_max_times(self.max_retries),
            )
            .when(ProviderError::is_transient)
            .notify(|e: &ProviderError, delay: Duration| {
                debug!(
                    provider = provider.name(),
                    artifact = kind.filename(),
                    error = %e,
                    ?delay,
                    "Retrying provider call"
                );
            })
            .await;

        let representation = match result {
            Ok(content) => Representation::Generated(content),
            Err(e) => {
                warn!(
                    provider = provider.name(),
                    artifact = kind.filename(),
                    error = %e,
                    "Provider call failed; using template"
                );
                Representation::Template {
                    content: kind.template(lsu),
                    reason: e.to_string(),
                }
            }
        };

        (kind, representation)
    }

    /// One bounded provider call, counted as attempt plus outcome.
    async fn call_once(
        &self,
        provider: &dyn LlmProvider,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let name = provider.name();
        self.metrics.record_provider(name, PROVIDER_ATTEMPT);

        let timeout = self.completion.timeout;
        let result = match tokio::time::timeout(timeout, provider.generate(prompt, &self.completion))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(timeout)),
        };

        match &result {
            Ok(_) => self.metrics.record_provider(name, PROVIDER_SUCCESS),
            Err(_) => self.metrics.record_provider(name, PROVIDER_ERROR),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{
        ChatMessage, CompletionResponse, TemplateOnlyProvider, TokenUsage,
    };
    use async_trait::async_trait;
    use qec_core::template_representations;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails for prompts containing `fail_marker`, echoes a tag otherwise.
    struct ScriptedProvider {
        fail_marker: Option<&'static str>,
        failure: fn() -> ProviderError,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn ok() -> Self {
            Self {
                fail_marker: None,
                failure: || ProviderError::MissingContent,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing_on(marker: &'static str, failure: fn() -> ProviderError) -> Self {
            Self {
                fail_marker: Some(marker),
                failure,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let prompt = &messages[1].content;
            if let Some(marker) = self.fail_marker {
                if prompt.contains(marker) {
                    return Err((self.failure)());
                }
            }
            Ok(CompletionResponse {
                content: format!("AI: {}", &prompt[..prompt.find(' ').unwrap_or(0)]),
                usage: TokenUsage::default(),
                model: "scripted".to_string(),
            })
        }

        fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl LlmProvider for SlowProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(ProviderError::MissingContent)
        }

        fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn generator(metrics: &Arc<QecMetrics>) -> RepresentationGenerator {
        RepresentationGenerator::new(metrics.clone(), CompletionConfig::default())
    }

    fn provider_count(metrics: &QecMetrics, provider: &str, status: &str) -> u64 {
        metrics
            .ai_provider_requests_total
            .with_label_values(&[provider, status])
            .get()
    }

    #[tokio::test]
    async fn test_no_provider_equals_templates_exactly() {
        let metrics = Arc::new(QecMetrics::new().unwrap());
        let lsu = "All deployments must pass security review.";

        let set = generator(&metrics)
            .generate(lsu, &TemplateOnlyProvider)
            .await;
        assert_eq!(set, template_representations(lsu));
        assert_eq!(set.len(), 4);
    }

    #[tokio::test]
    async fn test_unavailable_provider_makes_no_calls() {
        let metrics = Arc::new(QecMetrics::new().unwrap());
        generator(&metrics)
            .generate("lsu", &TemplateOnlyProvider)
            .await;
        assert_eq!(
            provider_count(&metrics, "template-only", PROVIDER_ATTEMPT),
            0
        );
    }

    #[tokio::test]
    async fn test_one_kind_failing_does_not_affect_others() {
        let metrics = Arc::new(QecMetrics::new().unwrap());
        let lsu = "Encrypt backups.";
        // The TLA+ prompt is the only one mentioning TLA+
        let provider = ScriptedProvider::failing_on("TLA+", || ProviderError::ApiError {
            status: 500,
            message: "boom".to_string(),
        });

        let detailed = generator(&metrics)
            .generate_detailed(lsu, &provider)
            .await;

        for (kind, representation) in &detailed {
            if *kind == ArtifactKind::TlaSpecification {
                assert!(!representation.is_generated());
                assert_eq!(representation.content(), kind.template(lsu));
            } else {
                assert!(representation.is_generated(), "{:?} fell back", kind);
                assert!(representation.content().starts_with("AI: "));
            }
        }

        assert_eq!(provider_count(&metrics, "scripted", PROVIDER_ATTEMPT), 4);
        assert_eq!(provider_count(&metrics, "scripted", PROVIDER_SUCCESS), 3);
        assert_eq!(provider_count(&metrics, "scripted", PROVIDER_ERROR), 1);
    }

    #[tokio::test]
    async fn test_sequential_mode_keeps_kind_order() {
        let metrics = Arc::new(QecMetrics::new().unwrap());
        let detailed = generator(&metrics)
            .with_concurrency(false)
            .generate_detailed("x", &ScriptedProvider::ok())
            .await;

        let kinds: Vec<ArtifactKind> = detailed.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, ArtifactKind::ALL.to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back_to_template() {
        let metrics = Arc::new(QecMetrics::new().unwrap());
        let lsu = "Rotate credentials.";

        let set = generator(&metrics).generate(lsu, &SlowProvider).await;

        assert_eq!(set, template_representations(lsu));
        assert_eq!(provider_count(&metrics, "slow", PROVIDER_ERROR), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried_within_bound() {
        let metrics = Arc::new(QecMetrics::new().unwrap());
        let provider = ScriptedProvider::failing_on("Rego", || {
            ProviderError::HttpError("connection reset".to_string())
        });

        generator(&metrics)
            .with_max_retries(2)
            .generate("x", &provider)
            .await;

        // 3 kinds succeed once, the Rego kind is tried 1 + 2 times
        assert_eq!(provider.calls.load(Ordering::SeqCst), 6);
        assert_eq!(provider_count(&metrics, "scripted", PROVIDER_ERROR), 3);
    }

    #[tokio::test]
    async fn test_permanent_failures_are_not_retried() {
        let metrics = Arc::new(QecMetrics::new().unwrap());
        let provider = ScriptedProvider::failing_on("Rego", || ProviderError::MissingContent);

        generator(&metrics)
            .with_max_retries(3)
            .generate("x", &provider)
            .await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
    }
}
