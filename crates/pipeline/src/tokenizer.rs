//! Token counting for budget decisions.
//!
//! Uses the `cl100k_base` vocabulary shipped with `tiktoken-rs`, the one
//! the gpt-3.5/gpt-4 family is billed and limited in. The vocabulary is
//! embedded in the binary, so counts are stable for the whole process.

use std::sync::{Arc, OnceLock};

use askpaper_core::PipelineError;
use tiktoken_rs::CoreBPE;

static CL100K: OnceLock<Arc<CoreBPE>> = OnceLock::new();

/// Cheaply cloneable handle to a loaded BPE vocabulary.
#[derive(Clone)]
pub struct Tokenizer {
    bpe: Arc<CoreBPE>,
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Tokenizer(cl100k_base)")
    }
}

impl Tokenizer {
    /// Load `cl100k_base`, once per process. Failing here is fatal for
    /// the pipeline, since no chunk can be sized without it.
    pub fn cl100k() -> Result<Self, PipelineError> {
        if let Some(bpe) = CL100K.get() {
            return Ok(Self { bpe: bpe.clone() });
        }
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| PipelineError::Tokenizer(e.to_string()))?;
        let bpe = CL100K.get_or_init(|| Arc::new(bpe)).clone();
        Ok(Self { bpe })
    }

    /// Number of tokens in `text`. Special-token markers are counted as
    /// plain text.
    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_ordinary(text).len()
    }

    pub fn encode(&self, text: &str) -> Vec<usize> {
        self.bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|rank| rank as usize)
            .collect()
    }

    pub fn decode(&self, tokens: &[usize]) -> Result<String, PipelineError> {
        self.bpe
            .decode(tokens.iter().map(|&t| t as _).collect())
            .map_err(|e| PipelineError::Tokenizer(e.to_string()))
    }
}
