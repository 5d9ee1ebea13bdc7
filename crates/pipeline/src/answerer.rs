//! One model call per chunk, run concurrently.

use std::time::{Duration, Instant};

use askpaper_core::{Error, PipelineError, Result};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::llm::Llm;
use crate::prompts;
use crate::splitter::Chunk;

/// The answer obtained from a single chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkAnswer {
    pub index: usize,
    pub text: String,
    pub elapsed: Duration,
}

/// Fans a question out over chunks and collects the answers in chunk order.
#[derive(Debug, Clone)]
pub struct ChunkAnswerer {
    llm: Llm,
    completion_tokens: usize,
    not_enough_info: String,
}

impl ChunkAnswerer {
    pub fn new(llm: Llm, completion_tokens: usize, not_enough_info: impl Into<String>) -> Self {
        Self {
            llm,
            completion_tokens,
            not_enough_info: not_enough_info.into(),
        }
    }

    /// Answer `question` from every chunk, one task per chunk.
    ///
    /// Returns once every task has finished, sorted by chunk index. A
    /// failed model call fails the whole fan-out, but only after the calls
    /// already in flight have run to completion; the first error is kept.
    pub async fn answer_all(&self, question: &str, chunks: &[Chunk]) -> Result<Vec<ChunkAnswer>> {
        let started = Instant::now();
        let mut tasks = JoinSet::new();

        for chunk in chunks {
            let llm = self.llm.clone();
            let index = chunk.index;
            let prompt = prompts::chunk_prompt(&self.not_enough_info, &chunk.text, question);
            let max_tokens = self.completion_tokens;
            tasks.spawn(async move {
                debug!(chunk = index, "Running chunk");
                let started = Instant::now();
                let result = llm.complete(prompt, max_tokens).await;
                (index, started.elapsed(), result)
            });
        }

        let mut answers = Vec::with_capacity(chunks.len());
        let mut failure: Option<Error> = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|e| Error::from(PipelineError::TaskFailed(e.to_string())))
                .and_then(|(index, elapsed, result)| Ok((index, elapsed, result?)));
            match outcome {
                Ok((index, elapsed, text)) => {
                    info!(chunk = index, elapsed_ms = elapsed.as_millis() as u64, "Chunk answered");
                    answers.push(ChunkAnswer { index, text, elapsed });
                }
                Err(e) => {
                    warn!(error = %e, "Chunk call failed");
                    failure.get_or_insert(e);
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }
        answers.sort_by_key(|a| a.index);

        debug!(
            chunks = answers.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "All chunks answered"
        );
        Ok(answers)
    }
}
