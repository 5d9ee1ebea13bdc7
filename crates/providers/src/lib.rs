//! LLM provider implementations for AskPaper.
//!
//! All providers implement the `askpaper_core::Provider` trait.
//! The router builds the configured provider, wrapped in a fallback
//! chain when more than one backend is configured.

pub mod fallback;
pub mod openai_compat;
pub mod router;

pub use fallback::FallbackProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::ProviderRouter;
