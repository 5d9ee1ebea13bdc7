//! Shortlisting the sections most relevant to a question.

use std::time::Instant;

use askpaper_core::Result;
use tracing::{debug, info, warn};

use crate::llm::Llm;
use crate::prompts;
use crate::tokenizer::Tokenizer;

/// Asks the model for the `k` most relevant section labels.
#[derive(Debug, Clone)]
pub struct SectionSelector {
    llm: Llm,
    tokenizer: Tokenizer,
    llm_max_tokens: usize,
}

impl SectionSelector {
    pub fn new(llm: Llm, tokenizer: Tokenizer, llm_max_tokens: usize) -> Self {
        Self {
            llm,
            tokenizer,
            llm_max_tokens,
        }
    }

    /// Pick up to `k` labels relevant to `text`.
    ///
    /// With `k` or fewer labels there is nothing to choose and the model is
    /// not called. Output that is not a JSON array of strings degrades to
    /// all labels. Only a failing model call or an oversized prompt is an
    /// error.
    pub async fn select(&self, k: usize, text: &str, labels: &[String]) -> Result<Vec<String>> {
        if labels.len() <= k {
            debug!(k, available = labels.len(), "Few enough sections, skipping selection");
            return Ok(labels.to_vec());
        }

        let started = Instant::now();
        let reply = self
            .llm
            .ask(&self.tokenizer, prompts::selector_prompt(k, text, labels), self.llm_max_tokens)
            .await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match parse_labels(&reply) {
            Some(selected) => {
                info!(k, selected = ?selected, elapsed_ms, "Selected relevant sections");
                Ok(selected)
            }
            None => {
                warn!(reply = %reply, elapsed_ms, "Section selection was not a JSON array, using all sections");
                Ok(labels.to_vec())
            }
        }
    }
}

/// Parse a JSON array of strings, tolerating a surrounding code fence.
fn parse_labels(reply: &str) -> Option<Vec<String>> {
    let trimmed = reply.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(unfenced.trim()).ok()
}
