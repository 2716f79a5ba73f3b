//! Provider used when no credential is configured.

use async_trait::async_trait;

use super::{ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError};

/// Never calls out; every completion is `NotConfigured`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateOnlyProvider;

#[async_trait]
impl LlmProvider for TemplateOnlyProvider {
    async fn complete(
        &self,
        _messages: Vec<ChatMessage>,
        _config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        Err(ProviderError::NotConfigured(
            "no AI provider credential configured".to_string(),
        ))
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "template-only"
    }
}
