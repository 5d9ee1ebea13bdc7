//! # AskPaper Pipeline
//!
//! Answers a question about a paper under a hard token ceiling:
//!
//! ```text
//! question ─▶ selector ─▶ filter ─▶ render ─▶ split ─▶ answer × N ─▶ fuse
//!                ▲                                                   │
//!                └──────────── relax trade-off on sentinel ◀─────────┘
//! ```
//!
//! [`PaperQa`] owns the policy. Everything else is a building block that
//! can be used on its own.

pub mod answerer;
pub mod controller;
pub mod diagnostics;
pub mod fusion;
pub mod llm;
pub mod prompts;
pub mod selector;
pub mod splitter;
pub mod tokenizer;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use answerer::{ChunkAnswer, ChunkAnswerer};
pub use controller::{AskOptions, BudgetPlan, PaperQa};
pub use diagnostics::Diagnostics;
pub use fusion::AnswerFusion;
pub use llm::Llm;
pub use selector::SectionSelector;
pub use splitter::{Chunk, ContextSplitter};
pub use tokenizer::Tokenizer;
