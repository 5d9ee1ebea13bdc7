//! Provider trait: the abstraction over LLM text-completion backends.
//!
//! A Provider takes a prompt and returns generated text, subject to a
//! maximum completion length. Everything else about the model is opaque
//! to the pipeline.
//!
//! Implementations: OpenAI-compatible endpoints, fallback chains, test mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::Message;

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-3.5-turbo")
    pub model: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic)
    #[serde(default)]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Stop sequences
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl ProviderRequest {
    /// A deterministic single-prompt request: one user message, temperature 0.
    pub fn prompt(model: impl Into<String>, prompt: impl Into<String>, max_tokens: usize) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message::user(prompt)],
            temperature: 0.0,
            max_tokens: Some(u32::try_from(max_tokens).unwrap_or(u32::MAX)),
            stop: Vec::new(),
        }
    }

    /// The concatenated text of all messages in the request.
    pub fn prompt_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

impl ProviderResponse {
    /// The generated text.
    pub fn text(&self) -> &str {
        &self.message.content
    }
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// Every completion backend implements this trait. The pipeline calls
/// `complete()` without knowing which provider is being used.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "openrouter").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;

    /// List available models for this provider.
    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        Ok(Vec::new())
    }

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}
