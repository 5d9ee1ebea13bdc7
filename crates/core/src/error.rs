//! Error types for the AskPaper domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all AskPaper operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Pipeline errors ---
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- I/O ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the LLM text-completion capability.
///
/// The pipeline never retries these; they abort the current question.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures raised by the question-answering pipeline itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The caller asked for a trade-off level outside the lookup table.
    #[error("Invalid trade-off level {level}, must be between 0 and {max}")]
    InvalidTradeOff { level: usize, max: usize },

    /// The text cannot be sent to the model with room left for a completion.
    #[error("Text is too long: {tokens} tokens, must be less than {limit} tokens")]
    ContextOverflow { tokens: usize, limit: usize },

    /// The tokenizer vocabulary could not be loaded or used.
    #[error("Tokenizer unavailable: {0}")]
    Tokenizer(String),

    /// A chunk worker panicked or was aborted before returning.
    #[error("Chunk task failed: {0}")]
    TaskFailed(String),
}
