//! The question-answering loop.
//!
//! One attempt at a trade-off level runs:
//!
//! 1. relevance selection + include filter, when the level asks for it
//! 2. the boilerplate exclude filter, always
//! 3. rendering and the budget search
//! 4. fan-out over at most `max_contexts` chunks, then fusion
//!
//! If the answer carries the "not enough information" sentinel, the
//! attempt is repeated one level more permissive, down to level 0, each
//! time starting from the unfiltered paper.

use std::sync::Arc;

use askpaper_config::PipelineConfig;
use askpaper_core::{PipelineError, Provider, Result};
use askpaper_document::{Document, FilterMode};
use tracing::{debug, info, warn};

use crate::answerer::ChunkAnswerer;
use crate::diagnostics::Diagnostics;
use crate::fusion::AnswerFusion;
use crate::llm::Llm;
use crate::prompts;
use crate::selector::SectionSelector;
use crate::splitter::{Chunk, ContextSplitter};
use crate::tokenizer::Tokenizer;

/// Caller knobs for [`PaperQa::answer_question`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AskOptions {
    /// Merge multiple chunk answers with a model call; otherwise join them.
    pub fuse: bool,
    /// 0 reads the whole paper. Higher levels keep fewer, more relevant sections.
    pub trade_off: usize,
}

impl Default for AskOptions {
    fn default() -> Self {
        Self {
            fuse: true,
            trade_off: 0,
        }
    }
}

/// Outcome of the budget search for one rendered paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetPlan {
    pub chunks: Vec<Chunk>,
    /// Token budget the chunks were split with.
    pub context_budget: usize,
    /// Completion tokens granted to each chunk call.
    pub completion_tokens: usize,
    /// Splits tried, including the accepted one.
    pub rounds: usize,
}

/// Answers questions about papers with one provider and model.
#[derive(Clone)]
pub struct PaperQa {
    llm: Llm,
    tokenizer: Tokenizer,
    config: PipelineConfig,
    diagnostics: Option<Diagnostics>,
}

impl PaperQa {
    /// Build a pipeline, loading the tokenizer vocabulary.
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, config: PipelineConfig) -> Result<Self> {
        Ok(Self::with_tokenizer(
            Llm::new(provider, model),
            Tokenizer::cl100k()?,
            config,
        ))
    }

    pub fn with_tokenizer(llm: Llm, tokenizer: Tokenizer, config: PipelineConfig) -> Self {
        Self {
            llm,
            tokenizer,
            config,
            diagnostics: None,
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Option<Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Answer `question` from `document`.
    ///
    /// Returns the answer, the "not enough information" sentinel when even
    /// the whole paper did not help, or the canned load-test answer. Fails
    /// on an unknown trade-off level, a paper that cannot fit the model at
    /// all, or a failed model call.
    pub async fn answer_question(&self, question: &str, document: Document, options: AskOptions) -> Result<String> {
        if prompts::is_load_test(question) {
            info!("Load test question, skipping the model");
            return Ok(prompts::LOAD_TEST_RESPONSE.to_string());
        }

        if self.config.top_k_sections(options.trade_off).is_none() {
            return Err(PipelineError::InvalidTradeOff {
                level: options.trade_off,
                max: self.config.max_trade_off(),
            }
            .into());
        }

        info!(title = %document.title, trade_off = options.trade_off, fuse = options.fuse, "Asking paper");

        let sentinel = &self.config.not_enough_info_answer;
        let mut level = options.trade_off;
        loop {
            let answer = self.answer_at_level(question, &document, level, options.fuse).await?;
            if level > 0 && answer.contains(sentinel.as_str()) {
                info!(from = level, to = level - 1, "Not enough information, relaxing trade-off");
                level -= 1;
                continue;
            }
            info!(trade_off = level, "Answered question");
            return Ok(answer);
        }
    }

    async fn answer_at_level(&self, question: &str, document: &Document, level: usize, fuse: bool) -> Result<String> {
        let top_k = self
            .config
            .top_k_sections(level)
            .ok_or(PipelineError::InvalidTradeOff {
                level,
                max: self.config.max_trade_off(),
            })?;

        let paper = self.prepare_document(question, document, top_k).await?;
        let (text, mut plan) = self.plan_off_runtime(paper.to_text(), question).await?;
        if plan.chunks.len() > self.config.max_contexts {
            warn!(
                chunks = plan.chunks.len(),
                kept = self.config.max_contexts,
                "Paper too long, dropping trailing chunks"
            );
            plan.chunks.truncate(self.config.max_contexts);
        }

        if let Some(diagnostics) = &self.diagnostics {
            diagnostics.dump_paper(&text).await;
            diagnostics.dump_contexts(&plan.chunks).await;
        }

        let answerer = ChunkAnswerer::new(
            self.llm.clone(),
            plan.completion_tokens,
            self.config.not_enough_info_answer.as_str(),
        );
        let mut responses: Vec<String> = answerer
            .answer_all(question, &plan.chunks)
            .await?
            .into_iter()
            .map(|a| a.text)
            .collect();

        let answer = match responses.as_slice() {
            [] => {
                warn!("Nothing left to read after filtering");
                self.config.not_enough_info_answer.clone()
            }
            [single] => single.clone(),
            many if fuse => self.fusion().merge(question, many).await?,
            many => AnswerFusion::concatenate(many),
        };

        if let Some(diagnostics) = &self.diagnostics {
            if responses.len() > 1 {
                responses.push(answer.clone());
            }
            diagnostics.dump_responses(&responses).await;
        }

        Ok(answer)
    }

    /// The paper as it will be rendered for `question`.
    ///
    /// With `top_k`, keeps the sections the model finds most relevant.
    /// Boilerplate sections are always dropped. A filter that would leave
    /// nothing is skipped.
    pub async fn prepare_document(&self, question: &str, document: &Document, top_k: Option<usize>) -> Result<Document> {
        let selected = match top_k {
            Some(k) => {
                let labels = document.sections();
                let chosen = SectionSelector::new(self.llm.clone(), self.tokenizer.clone(), self.config.llm_max_tokens)
                    .select(k, &prompts::selector_question(&document.title, question), &labels)
                    .await?;
                document.filter(FilterMode::Include, &chosen[..])
            }
            None => None,
        };

        let base = selected.as_ref().unwrap_or(document);
        Ok(base.filter_or_keep(FilterMode::Exclude, &self.config.excluded_sections[..]))
    }

    /// Find a split of `text` where every chunk call fits the model.
    ///
    /// Starts from the configured completion reserve and shrinks both the
    /// reserve and the chunk budget by fixed steps until the largest chunk,
    /// wrapped in the prompt with `question`, plus the reserve fits under
    /// `llm_max_tokens`.
    pub fn plan_chunks(&self, text: &str, question: &str) -> Result<BudgetPlan> {
        let limit = self.config.llm_max_tokens;
        let sentinel = self.config.not_enough_info_answer.as_str();
        let template_tokens = self.tokenizer.count(&prompts::chunk_prompt(sentinel, "", ""));
        let prompt_tokens = self.tokenizer.count(&prompts::chunk_prompt(sentinel, "", question));
        let overflow = |tokens: usize| PipelineError::ContextOverflow { tokens, limit };

        let mut completion_tokens = self.config.completion_reserve;
        let mut context_budget = limit
            .checked_sub(completion_tokens + template_tokens)
            .filter(|budget| *budget > 0)
            .ok_or_else(|| overflow(completion_tokens + template_tokens))?;
        debug!(context_budget, template_tokens, "Initial context budget");

        let splitter = ContextSplitter::new(self.tokenizer.clone(), self.config.chunk_overlap);
        let mut rounds = 0;
        loop {
            rounds += 1;
            let chunks = splitter.split(text, context_budget);
            let largest = chunks
                .iter()
                .map(|c| self.tokenizer.count(&c.text))
                .max()
                .unwrap_or(0);
            let sequence = largest + prompt_tokens + completion_tokens;
            debug!(
                round = rounds,
                context_budget,
                completion_tokens,
                chunks = chunks.len(),
                largest_chunk = largest,
                sequence,
                "Budget search"
            );

            if sequence <= limit {
                info!(chunks = chunks.len(), context_budget, completion_tokens, "Context split");
                return Ok(BudgetPlan {
                    chunks,
                    context_budget,
                    completion_tokens,
                    rounds,
                });
            }

            debug!(sequence, limit, "Sequences too big, shrinking");
            completion_tokens = completion_tokens
                .checked_sub(self.config.completion_reserve_step)
                .filter(|c| *c > 0)
                .ok_or_else(|| overflow(sequence))?;
            context_budget = context_budget
                .checked_sub(self.config.context_budget_step)
                .filter(|b| *b > 0)
                .ok_or_else(|| overflow(sequence))?;
        }
    }

    /// [`PaperQa::plan_chunks`] on the blocking pool, handing `text` back.
    async fn plan_off_runtime(&self, text: String, question: &str) -> Result<(String, BudgetPlan)> {
        let qa = self.clone();
        let question = question.to_string();
        let (text, plan) = tokio::task::spawn_blocking(move || {
            let plan = qa.plan_chunks(&text, &question);
            (text, plan)
        })
        .await
        .map_err(|e| PipelineError::TaskFailed(e.to_string()))?;
        Ok((text, plan?))
    }

    fn fusion(&self) -> AnswerFusion {
        AnswerFusion::new(
            self.llm.clone(),
            self.tokenizer.clone(),
            self.config.llm_max_tokens,
            self.config.fusion_min_completion,
        )
    }
}
