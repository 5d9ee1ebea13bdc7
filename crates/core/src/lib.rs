//! # AskPaper Core
//!
//! Error definitions and the LLM provider abstraction shared by every
//! AskPaper crate. This crate has **no framework dependencies**: it only
//! describes the seams the other crates implement against.
//!
//! - [`Provider`] is the text-completion capability (prompt in, text out).
//! - [`Error`] is the top-level error, with one variant per bounded context.

pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{Error, PipelineError, ProviderError, Result};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
