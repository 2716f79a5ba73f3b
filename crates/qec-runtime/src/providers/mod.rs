//! AI provider abstractions for qec-runtime.
//!
//! Representation generation goes through the [`LlmProvider`] capability.
//! Two variants exist: an OpenAI-compatible chat-completions client (NVIDIA
//! and Groq endpoints) and a template-only provider that never calls out.
//!
//! ## Security
//!
//! All providers use the [`secrets`] module for credential handling.
//! See [`ApiCredential`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

mod registry;
pub mod secrets;
mod template_only;

#[cfg(feature = "http")]
mod chat_completions;

pub use registry::ProviderRegistry;
pub use secrets::{ApiCredential, CredentialSource};
pub use template_only::TemplateOnlyProvider;

#[cfg(feature = "http")]
pub use chat_completions::ChatCompletionsProvider;

/// System prompt sent ahead of every artifact prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert policy generator.";

/// Errors from AI providers.
///
/// `NotConfigured` is a mode switch (no credential); every other variant is
/// a failed call that the generator recovers from with template content.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Response has no message content")]
    MissingContent,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Worth another attempt under the retry policy.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::HttpError(_)
            | ProviderError::RateLimited { .. }
            | ProviderError::Timeout(_) => true,
            ProviderError::ApiError { status, .. } => *status >= 500,
            ProviderError::ParseError(_)
            | ProviderError::MissingContent
            | ProviderError::NotConfigured(_) => false,
        }
    }
}

/// Configuration for a completion request.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Maximum tokens to generate
    pub max_tokens: u32,

    pub temperature: f32,

    /// Per-call timeout
    pub timeout: Duration,

    pub system_prompt: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            max_tokens: 2000,
            temperature: 0.3,
            timeout: Duration::from_secs(10),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// A chat message for completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant"
    pub role: String,

    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Response from a completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content
    pub content: String,

    pub usage: TokenUsage,

    /// Model that answered
    pub model: String,
}

/// Token usage from a completion.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,

    #[serde(default)]
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Provider abstraction allows swapping AI backends.
///
/// This is the only place outbound AI calls are made. Stabilizer scoring
/// and certificate synthesis never call it.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a chat completion.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Whether a credential is configured for outbound calls.
    fn is_available(&self) -> bool;

    /// Provider name for metrics and logs.
    fn name(&self) -> &str;

    /// System prompt plus one user prompt.
    async fn generate(
        &self,
        prompt: &str,
        config: &CompletionConfig,
    ) -> Result<String, ProviderError> {
        let messages = vec![
            ChatMessage::system(config.system_prompt.clone()),
            ChatMessage::user(prompt),
        ];
        let response = self.complete(messages, config).await?;
        if response.content.is_empty() {
            return Err(ProviderError::MissingContent);
        }
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoProvider;

    #[async_trait]
    impl LlmProvider for EchoProvider {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            Ok(CompletionResponse {
                content: messages
                    .iter()
                    .map(|m| format!("{}:{}", m.role, m.content))
                    .collect::<Vec<_>>()
                    .join("|"),
                usage: TokenUsage::default(),
                model: "echo".to_string(),
            })
        }

        fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn test_chat_message_creation() {
        assert_eq!(ChatMessage::system("x").role, "system");
        assert_eq!(ChatMessage::user("y").role, "user");
    }

    #[test]
    fn test_completion_defaults() {
        let config = CompletionConfig::default();
        assert_eq!(config.max_tokens, 2000);
        assert!((config.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(ProviderError::ApiError {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(!ProviderError::ApiError {
            status: 401,
            message: String::new()
        }
        .is_transient());
        assert!(!ProviderError::MissingContent.is_transient());
    }

    #[tokio::test]
    async fn test_generate_sends_system_then_user() {
        let text = EchoProvider
            .generate("write rego", &CompletionConfig::default())
            .await
            .unwrap();
        assert_eq!(
            text,
            format!("system:{}|user:write rego", DEFAULT_SYSTEM_PROMPT)
        );
    }
}
