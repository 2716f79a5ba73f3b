//! Runtime configuration, resolved from the environment.
//!
//! Every provider value is optional. Missing credentials degrade to
//! template-only generation; only malformed values are errors.

use std::time::Duration;

use qec_core::stabilizer::DEFAULT_SUCCESS_PROBABILITY;
use qec_core::StabilizerSet;

use crate::providers::{ApiCredential, CompletionConfig, CredentialSource};
use crate::RuntimeError;

pub const NVIDIA_API_KEY_ENV: &str = "NVIDIA_API_KEY";
pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";

pub const DEFAULT_NVIDIA_BASE_URL: &str = "https://integrate.api.nvidia.com/v1";
pub const DEFAULT_NVIDIA_MODEL: &str = "nvidia/llama-3.1-nemotron-ultra-253b-v1";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_OPA_ENDPOINT: &str = "http://opa-service:8181";
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// One chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Provider name used for selection, metrics and `ai_provider_used`
    pub name: String,

    /// `None` means the provider is not configured
    pub credential: Option<ApiCredential>,

    pub base_url: String,
    pub model: String,
}

impl ProviderSettings {
    pub fn nvidia(credential: Option<ApiCredential>) -> Self {
        Self {
            name: "nvidia".to_string(),
            credential,
            base_url: DEFAULT_NVIDIA_BASE_URL.to_string(),
            model: DEFAULT_NVIDIA_MODEL.to_string(),
        }
    }

    pub fn groq(credential: Option<ApiCredential>) -> Self {
        Self {
            name: "groq".to_string(),
            credential,
            base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            model: DEFAULT_GROQ_MODEL.to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credential.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// Main runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Providers in default preference order
    pub providers: Vec<ProviderSettings>,

    /// Downstream policy-decision engine, reported by status
    pub opa_endpoint: String,

    /// Completion settings; `timeout` bounds each provider call
    pub completion: CompletionConfig,

    /// Bounded retries per provider call (0 = single attempt)
    pub max_retries: usize,

    /// Dispatch the per-kind provider calls concurrently
    pub concurrent_generation: bool,

    pub stabilizers: StabilizerSet,

    /// Seed for simulated scoring; `None` draws from entropy
    pub stabilizer_seed: Option<u64>,

    pub success_probability: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            providers: vec![ProviderSettings::nvidia(None), ProviderSettings::groq(None)],
            opa_endpoint: DEFAULT_OPA_ENDPOINT.to_string(),
            completion: CompletionConfig {
                timeout: DEFAULT_PROVIDER_TIMEOUT,
                ..CompletionConfig::default()
            },
            max_retries: 0,
            concurrent_generation: true,
            stabilizers: StabilizerSet::reference(),
            stabilizer_seed: None,
            success_probability: DEFAULT_SUCCESS_PROBABILITY,
        }
    }
}

impl RuntimeConfig {
    /// Resolve from process environment variables.
    pub fn from_env() -> Result<Self, RuntimeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RuntimeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let credential = |key: &str, name: &'static str| {
            get(key).map(|v| ApiCredential::new(v, CredentialSource::Environment, name))
        };

        let mut config = Self::default();

        let mut nvidia = ProviderSettings::nvidia(credential(NVIDIA_API_KEY_ENV, "NVIDIA API key"));
        if let Some(url) = get("NVIDIA_BASE_URL") {
            nvidia.base_url = url;
        }
        if let Some(model) = get("NVIDIA_MODEL") {
            nvidia.model = model;
        }

        let mut groq = ProviderSettings::groq(credential(GROQ_API_KEY_ENV, "Groq API key"));
        if let Some(url) = get("GROQ_BASE_URL") {
            groq.base_url = url;
        }
        if let Some(model) = get("GROQ_MODEL") {
            groq.model = model;
        }

        config.providers = vec![nvidia, groq];

        if let Some(endpoint) = get("OPA_ENDPOINT") {
            config.opa_endpoint = endpoint;
        }

        if let Some(raw) = get("QEC_PROVIDER_TIMEOUT") {
            config.completion.timeout = humantime::parse_duration(raw.trim()).map_err(|e| {
                RuntimeError::Configuration(format!("QEC_PROVIDER_TIMEOUT '{}': {}", raw, e))
            })?;
        }

        if let Some(raw) = get("QEC_PROVIDER_MAX_RETRIES") {
            config.max_retries = parse_env("QEC_PROVIDER_MAX_RETRIES", &raw)?;
        }

        if let Some(path) = get("QEC_STABILIZERS_FILE") {
            let yaml = std::fs::read_to_string(&path).map_err(|e| {
                RuntimeError::Configuration(format!("QEC_STABILIZERS_FILE '{}': {}", path, e))
            })?;
            config.stabilizers = StabilizerSet::from_yaml(&yaml)
                .map_err(|e| RuntimeError::Configuration(format!("QEC_STABILIZERS_FILE '{}': {}", path, e)))?;
        }

        if let Some(raw) = get("QEC_STABILIZER_SEED") {
            config.stabilizer_seed = Some(parse_env("QEC_STABILIZER_SEED", &raw)?);
        }

        if let Some(raw) = get("QEC_SUCCESS_PROBABILITY") {
            let probability: f64 = parse_env("QEC_SUCCESS_PROBABILITY", &raw)?;
            if !(0.0..=1.0).contains(&probability) {
                return Err(RuntimeError::Configuration(format!(
                    "QEC_SUCCESS_PROBABILITY {} outside [0, 1]",
                    probability
                )));
            }
            config.success_probability = probability;
        }

        Ok(config)
    }

    /// Settings for a provider by name.
    pub fn provider(&self, name: &str) -> Option<&ProviderSettings> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Whether the named provider has a credential.
    pub fn provider_configured(&self, name: &str) -> bool {
        self.provider(name).is_some_and(ProviderSettings::is_configured)
    }
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T, RuntimeError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| RuntimeError::Configuration(format!("{} '{}': {}", key, raw, e)))
}
