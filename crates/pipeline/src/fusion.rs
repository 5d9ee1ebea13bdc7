//! Combining chunk answers into one answer.

use std::time::Instant;

use askpaper_core::Result;
use tracing::info;

use crate::llm::Llm;
use crate::prompts;
use crate::tokenizer::Tokenizer;

#[derive(Debug, Clone)]
pub struct AnswerFusion {
    llm: Llm,
    tokenizer: Tokenizer,
    llm_max_tokens: usize,
    min_completion: usize,
}

impl AnswerFusion {
    pub fn new(llm: Llm, tokenizer: Tokenizer, llm_max_tokens: usize, min_completion: usize) -> Self {
        Self {
            llm,
            tokenizer,
            llm_max_tokens,
            min_completion,
        }
    }

    /// Merge `responses` (in chunk order) into one answer with a model call.
    ///
    /// The completion budget is what the template, the responses and the
    /// question leave under the ceiling, but never less than the
    /// configured floor.
    pub async fn merge(&self, question: &str, responses: &[String]) -> Result<String> {
        let prompt_tokens = self.tokenizer.count(&prompts::merge_prompt("", ""))
            + responses.iter().map(|r| self.tokenizer.count(r)).sum::<usize>()
            + self.tokenizer.count(question);
        let max_tokens = self
            .llm_max_tokens
            .saturating_sub(prompt_tokens)
            .max(self.min_completion);
        info!(prompt_tokens, max_tokens, responses = responses.len(), "Merging responses");

        let prompt = prompts::merge_prompt(&prompts::numbered_responses(responses), question);
        let started = Instant::now();
        let merged = self.llm.complete(prompt, max_tokens).await?;
        info!(elapsed_ms = started.elapsed().as_millis() as u64, "Merged responses");
        Ok(merged)
    }

    /// Join `responses` with newlines, no model call.
    pub fn concatenate(responses: &[String]) -> String {
        responses.join("\n")
    }
}
