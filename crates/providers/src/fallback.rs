//! Provider fallback: ordered chain with a per-provider deadline.
//!
//! Transient LLM failures (timeouts, rate limits, 5xx) are handled here,
//! outside the question-answering pipeline: a failing backend hands the
//! same request to the next one in the chain. A backend from another
//! vendor can carry its own model name, which replaces the request's.

use async_trait::async_trait;
use askpaper_core::error::ProviderError;
use askpaper_core::provider::{Provider, ProviderRequest, ProviderResponse};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Deadline used by [`FallbackProvider::add_default`].
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// One backend of a [`FallbackProvider`].
struct Link {
    provider: Arc<dyn Provider>,
    timeout: Duration,
    /// Model to request instead of the caller's, if any.
    model: Option<String>,
}

/// A provider that wraps an ordered list of providers and falls back on failure.
pub struct FallbackProvider {
    name: String,
    chain: Vec<Link>,
}

impl FallbackProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chain: Vec::new(),
        }
    }

    /// Append a provider with its own deadline. With `model`, requests
    /// sent to this provider ask for that model.
    pub fn add(mut self, provider: Arc<dyn Provider>, timeout: Duration, model: Option<String>) -> Self {
        self.chain.push(Link {
            provider,
            timeout,
            model,
        });
        self
    }

    /// Append a provider with the default deadline.
    pub fn add_default(self, provider: Arc<dyn Provider>, model: Option<String>) -> Self {
        self.add(provider, DEFAULT_TIMEOUT, model)
    }
}

/// Run one attempt, turning an elapsed deadline into a provider error.
async fn attempt(
    provider: &dyn Provider,
    timeout: Duration,
    request: ProviderRequest,
) -> Result<ProviderResponse, ProviderError> {
    match tokio::time::timeout(timeout, provider.complete(request)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(format!(
            "Provider '{}' timed out after {}s",
            provider.name(),
            timeout.as_secs()
        ))),
    }
}

#[async_trait]
impl Provider for FallbackProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let mut last_error = ProviderError::NotConfigured("No providers in fallback chain".into());

        for (i, link) in self.chain.iter().enumerate() {
            let mut request = request.clone();
            if let Some(model) = &link.model {
                request.model = model.clone();
            }
            if i > 0 {
                info!(
                    provider = link.provider.name(),
                    model = %request.model,
                    attempt = i + 1,
                    total = self.chain.len(),
                    "Fallback: trying next provider"
                );
            }

            match attempt(link.provider.as_ref(), link.timeout, request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!(provider = link.provider.name(), error = %e, "Fallback: provider failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        let mut all_models = Vec::new();
        for link in &self.chain {
            if let Ok(models) = link.provider.list_models().await {
                all_models.extend(models);
            }
        }
        Ok(all_models)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        for link in &self.chain {
            if let Ok(true) = link.provider.health_check().await {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
