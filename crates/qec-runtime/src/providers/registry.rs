//! Registry of configured AI providers in preference order.
//!
//! ## Usage
//!
//! ```ignore
//! let registry = ProviderRegistry::from_config(&config)?;
//! let provider = registry.select(request.ai_provider_preference.as_deref());
//! ```

use std::sync::Arc;

use super::{LlmProvider, TemplateOnlyProvider};

/// Providers whose credentials are configured, first entry preferred.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every configured provider from runtime settings.
    ///
    /// Settings without a credential are skipped; that is template-only mode,
    /// not an error.
    #[cfg(feature = "http")]
    pub fn from_config(
        config: &crate::config::RuntimeConfig,
    ) -> Result<Self, super::ProviderError> {
        let mut registry = Self::new();
        for settings in config.providers.iter().filter(|s| s.is_configured()) {
            let provider = super::ChatCompletionsProvider::from_settings(settings)?;
            tracing::info!(provider = %settings.name, model = %settings.model, "AI provider configured");
            registry.register(Arc::new(provider));
        }
        Ok(registry)
    }

    /// Without HTTP support nothing can be called; always template-only.
    #[cfg(not(feature = "http"))]
    pub fn from_config(
        _config: &crate::config::RuntimeConfig,
    ) -> Result<Self, super::ProviderError> {
        Ok(Self::new())
    }

    /// Append a provider at the lowest preference.
    ///
    /// A provider with the same name is replaced in place.
    pub fn register(&mut self, provider: Arc<dyn LlmProvider>) {
        if let Some(slot) = self
            .providers
            .iter_mut()
            .find(|p| p.name() == provider.name())
        {
            *slot = provider;
        } else {
            self.providers.push(provider);
        }
    }

    /// Pick the provider for one request.
    ///
    /// A preference naming an available provider wins; otherwise the first
    /// available provider in registration order. With none available the
    /// template-only provider is returned.
    pub fn select(&self, preference: Option<&str>) -> Arc<dyn LlmProvider> {
        let available = || self.providers.iter().filter(|p| p.is_available());

        preference
            .and_then(|wanted| available().find(|p| p.name().eq_ignore_ascii_case(wanted)))
            .or_else(|| available().next())
            .cloned()
            .unwrap_or_else(|| Arc::new(TemplateOnlyProvider))
    }

    /// Whether a provider with this name is registered and available.
    pub fn is_configured(&self, name: &str) -> bool {
        self.providers
            .iter()
            .any(|p| p.name() == name && p.is_available())
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
