//! The completion capability as the pipeline sees it: prompt in, text out.

use std::sync::Arc;

use askpaper_core::{PipelineError, Provider, ProviderError, ProviderRequest, Result};
use tracing::debug;

use crate::tokenizer::Tokenizer;

/// A provider bound to one model. Clones share the provider.
#[derive(Clone)]
pub struct Llm {
    provider: Arc<dyn Provider>,
    model: String,
}

impl std::fmt::Debug for Llm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Llm")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .finish()
    }
}

impl Llm {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Complete `prompt` deterministically with at most `max_tokens` tokens.
    pub async fn complete(&self, prompt: String, max_tokens: usize) -> std::result::Result<String, ProviderError> {
        debug!(provider = self.provider.name(), model = %self.model, max_tokens, "Calling model");
        let response = self
            .provider
            .complete(ProviderRequest::prompt(&self.model, prompt, max_tokens))
            .await?;
        Ok(response.text().to_string())
    }

    /// Complete a free-standing prompt, giving the completion whatever
    /// room the prompt leaves under `limit`.
    pub async fn ask(&self, tokenizer: &Tokenizer, prompt: String, limit: usize) -> Result<String> {
        let tokens = tokenizer.count(&prompt);
        if tokens > limit {
            return Err(PipelineError::ContextOverflow { tokens, limit }.into());
        }
        Ok(self.complete(prompt, limit - tokens).await?)
    }
}
