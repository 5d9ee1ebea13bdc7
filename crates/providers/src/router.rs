//! Provider router: builds and looks up completion providers from config.

use std::collections::HashMap;
use std::sync::Arc;
use askpaper_config::AppConfig;
use askpaper_core::provider::Provider;
use crate::fallback::FallbackProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }
}

/// Build an OpenAI-compatible provider for `name`, taking the key and URL
/// from its `[providers.<name>]` table when present.
fn build_provider(config: &AppConfig, name: &str) -> Arc<dyn Provider> {
    let provider_config = config.providers.get(name);

    let api_key = provider_config
        .and_then(|p| p.api_key.clone())
        .or_else(|| config.api_key.clone())
        .unwrap_or_default();

    let base_url = provider_config
        .and_then(|p| p.api_url.clone())
        .unwrap_or_else(|| default_base_url(name));

    Arc::new(OpenAiCompatProvider::new(name, base_url, api_key))
}

/// Build providers from configuration.
///
/// When `fallback_providers` is set, the default entry becomes a
/// [`FallbackProvider`] trying the default provider first, then each
/// fallback in order.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for name in config.providers.keys() {
        router.register(name.clone(), build_provider(config, name));
    }

    let primary = router
        .get(&config.default_provider)
        .unwrap_or_else(|| build_provider(config, &config.default_provider));

    if config.fallback_providers.is_empty() {
        router.register(config.default_provider.clone(), primary);
    } else {
        let chain = config.fallback_providers.iter().fold(
            FallbackProvider::new(format!("{}+fallback", config.default_provider))
                .add_default(primary, None),
            |chain, name| {
                let provider = router
                    .get(name)
                    .unwrap_or_else(|| build_provider(config, name));
                let model = config.providers.get(name).and_then(|p| p.default_model.clone());
                chain.add_default(provider, model)
            },
        );
        router.register(config.default_provider.clone(), Arc::new(chain));
    }

    router
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
