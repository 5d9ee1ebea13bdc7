//! End-to-end integration tests for the AskPaper pipeline.
//!
//! These tests exercise the full path from a doc2json paper and a question
//! to the final answer: section selection, filtering, rendering, budget
//! search, chunk fan-out and fusion, against a scripted provider.

use std::sync::{Arc, Mutex};

use askpaper_config::{AppConfig, PipelineConfig};
use askpaper_core::error::{Error, PipelineError, ProviderError};
use askpaper_core::message::Message;
use askpaper_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use askpaper_document::Document;
use askpaper_pipeline::{AskOptions, Diagnostics, PaperQa};

const SENTINEL: &str = "Not enough information to answer this request.";

// ── Mock Provider ────────────────────────────────────────────────────────

type Reply = Box<dyn Fn(&str) -> Result<String, ProviderError> + Send + Sync>;

/// A mock provider that answers each prompt through a closure and keeps
/// every prompt it saw.
struct ScriptedProvider {
    reply: Reply,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(reply: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(move |p| Ok(reply(p))),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing(error: ProviderError) -> Self {
        Self {
            reply: Box::new(move |_| Err(error.clone())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn count(&self, kind: fn(&str) -> bool) -> usize {
        self.prompts().iter().filter(|p| kind(p)).count()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let prompt = request.prompt_text();
        self.prompts.lock().unwrap().push(prompt.clone());
        let text = (self.reply)(&prompt)?;
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock".into(),
        })
    }
}

fn is_selector(prompt: &str) -> bool {
    prompt.contains("Most relevant")
}

fn is_chunk(prompt: &str) -> bool {
    prompt.contains("Start paper context:")
}

fn is_merge(prompt: &str) -> bool {
    prompt.starts_with("Please merge")
}

fn pipeline(provider: Arc<ScriptedProvider>, config: PipelineConfig) -> PaperQa {
    PaperQa::new(provider, "gpt-3.5-turbo", config).unwrap()
}

// ── Fixtures ─────────────────────────────────────────────────────────────

const PAPER_JSON: &str = r#"{
    "paper_id": "e2e",
    "title": "Sparse Mixtures for Retrieval",
    "abstract": "We propose sparse mixtures.",
    "authors": [
        {"first": "Ada", "middle": [], "last": "Lovelace", "suffix": "",
         "affiliation": {"laboratory": "", "institution": "Analytical Engines Ltd",
                         "location": {"settlement": "London", "country": "UK"}},
         "email": null}
    ],
    "pdf_parse": {
        "body_text": [
            {"text": "Retrieval is hard.", "section": "Introduction", "sec_num": "1",
             "cite_spans": [{"start": 0, "end": 3, "text": "[1]", "ref_id": "BIBREF0"}], "ref_spans": []},
            {"text": "We use 8 experts, see Figure 1.", "section": "Method", "sec_num": "2.1",
             "cite_spans": [], "ref_spans": [{"start": 22, "end": 30, "text": "Figure 1", "ref_id": "FIGREF0"}]},
            {"text": "Routing is top-2.", "section": "Method", "sec_num": "2.1", "cite_spans": [], "ref_spans": []},
            {"text": "Table 1 lists the scores.", "section": "Results", "sec_num": 3,
             "cite_spans": [], "ref_spans": [{"start": 0, "end": 7, "text": "Table 1", "ref_id": "TABREF0"}]}
        ],
        "back_matter": [
            {"text": "We thank the SECRET reviewers.", "section": "Acknowledgments", "cite_spans": [], "ref_spans": [{"start": 0, "end": 1, "text": "x", "ref_id": "FIGREF9"}]},
            {"text": "SECRET bibliography.", "section": "References", "cite_spans": [], "ref_spans": []}
        ],
        "ref_entries": {
            "FIGREF0": {"fig_num": "1", "text": "Architecture overview.", "type_str": "figure", "uris": null},
            "FIGREF9": {"fig_num": "9", "text": "SECRET orphan figure.", "type_str": "figure", "uris": null},
            "TABREF0": {"text": "Scores.", "type_str": "table", "num": 1,
                        "content": "<table><tr><th>Model</th><th>MRR</th></tr><tr><td>Ours</td><td>0.41</td></tr></table>"}
        }
    }
}"#;

/// A paper with `n` numbered sections of `lines` lines each. The fact
/// "the secret value is 42" lives in the last section.
fn generated_paper(n: usize, lines: usize) -> Document {
    let blocks: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            let mut text: Vec<String> = (0..lines)
                .map(|l| format!("Observation {l} in part {i}: accuracy reached {}.", 50 + (i + l) % 50))
                .collect();
            if i == n - 1 {
                text.push("Finally, the secret value is 42.".into());
            }
            serde_json::json!({
                "text": text.join("\n"),
                "section": format!("Part {i}"),
                "sec_num": (i + 1).to_string(),
                "cite_spans": [],
                "ref_spans": []
            })
        })
        .collect();

    let json = serde_json::json!({
        "title": "Generated",
        "abstract": "",
        "pdf_parse": {"body_text": blocks, "back_matter": [], "ref_entries": {}}
    });
    serde_json::from_value(json).unwrap()
}

// ── E2E: Rendering and filtering reach the model ─────────────────────────

#[tokio::test]
async fn e2e_small_paper_single_call() {
    let provider = Arc::new(ScriptedProvider::new(|_| "The model uses 8 experts.".into()));
    let document = Document::from_json(PAPER_JSON).unwrap();

    let answer = pipeline(provider.clone(), PipelineConfig::default())
        .answer_question("How many experts?", document, AskOptions::default())
        .await
        .unwrap();

    assert_eq!(answer, "The model uses 8 experts.");
    assert_eq!(provider.calls(), 1);

    let prompt = &provider.prompts()[0];
    assert!(prompt.contains("# Sparse Mixtures for Retrieval"));
    assert!(prompt.contains("Authors: Ada Lovelace, Analytical Engines Ltd, UK"));
    assert!(prompt.contains("## 2.1 Method\nWe use 8 experts, see Figure 1.\nRouting is top-2."));
    assert!(prompt.contains("# 3 Results"));
    assert!(prompt.contains("Figure 1 caption: \"Architecture overview.\""));
    assert!(prompt.contains("Table 1: Scores.\n| Model | MRR |\n| --- | --- |\n| Ours | 0.41 |"));
    assert!(prompt.contains("Request: 'How many experts?'"));
    assert!(!prompt.contains("SECRET"));
}

#[tokio::test]
async fn e2e_load_test_skips_everything() {
    let provider = Arc::new(ScriptedProvider::new(|_| "model".into()));
    let answer = pipeline(provider.clone(), PipelineConfig::default())
        .answer_question(
            "This Is A Load Test",
            Document::from_json(PAPER_JSON).unwrap(),
            AskOptions { fuse: true, trade_off: 4 },
        )
        .await
        .unwrap();

    assert_eq!(answer, "This is a load test response");
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn e2e_invalid_trade_off() {
    let provider = Arc::new(ScriptedProvider::new(|_| "model".into()));
    let err = pipeline(provider.clone(), PipelineConfig::default())
        .answer_question(
            "q",
            Document::from_json(PAPER_JSON).unwrap(),
            AskOptions { fuse: true, trade_off: 7 },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Pipeline(PipelineError::InvalidTradeOff { level: 7, max: 4 })
    ));
    assert_eq!(provider.calls(), 0);
}

// ── E2E: Trade-off relaxation ────────────────────────────────────────────

#[tokio::test]
async fn e2e_relaxes_until_the_fact_is_visible() {
    let provider = Arc::new(ScriptedProvider::new(|prompt| {
        if is_selector(prompt) {
            r#"["Part 2"]"#.into()
        } else if prompt.contains("the secret value is 42") {
            "The secret value is 42.".into()
        } else {
            SENTINEL.into()
        }
    }));

    let answer = pipeline(provider.clone(), PipelineConfig::default())
        .answer_question(
            "What is the secret value?",
            generated_paper(16, 1),
            AskOptions { fuse: true, trade_off: 4 },
        )
        .await
        .unwrap();

    assert_eq!(answer, "The secret value is 42.");

    // Levels 4, 3 and 2 select sections (3, 8, 14 < 16). Level 1 keeps all
    // 16 sections without asking and finds the fact.
    let selector_prompts: Vec<String> = provider.prompts().into_iter().filter(|p| is_selector(p)).collect();
    assert_eq!(selector_prompts.len(), 3);
    assert!(selector_prompts[0].contains("Most relevant 3 sections"));
    assert!(selector_prompts[1].contains("Most relevant 8 sections"));
    assert!(selector_prompts[2].contains("Most relevant 14 sections"));
    assert!(selector_prompts[0].contains("Question on paper article Generated: What is the secret value?"));
    assert_eq!(provider.count(is_chunk), 4);
}

#[tokio::test]
async fn e2e_malformed_selection_reads_whole_paper() {
    let provider = Arc::new(ScriptedProvider::new(|prompt| {
        if is_selector(prompt) {
            "I think Part 3 is the most relevant.".into()
        } else if prompt.contains("the secret value is 42") {
            "42".into()
        } else {
            SENTINEL.into()
        }
    }));

    let answer = pipeline(provider.clone(), PipelineConfig::default())
        .answer_question("q", generated_paper(16, 1), AskOptions { fuse: true, trade_off: 4 })
        .await
        .unwrap();

    assert_eq!(answer, "42");
    assert_eq!(provider.count(is_selector), 1);
}

// ── E2E: Long papers ─────────────────────────────────────────────────────

fn small_window() -> PipelineConfig {
    PipelineConfig {
        llm_max_tokens: 1500,
        completion_reserve: 400,
        ..PipelineConfig::default()
    }
}

#[tokio::test]
async fn e2e_long_paper_is_chunked_and_merged() {
    let provider = Arc::new(ScriptedProvider::new(|prompt| {
        if is_merge(prompt) {
            "Merged: 42.".into()
        } else if prompt.contains("the secret value is 42") {
            "42".into()
        } else {
            SENTINEL.into()
        }
    }));

    let answer = pipeline(provider.clone(), small_window())
        .answer_question("What is the secret value?", generated_paper(4, 25), AskOptions::default())
        .await
        .unwrap();

    assert_eq!(answer, "Merged: 42.");

    let chunks = provider.count(is_chunk);
    assert!(chunks > 1 && chunks <= 7);
    let merge = provider.prompts().into_iter().find(|p| is_merge(p)).unwrap();
    let last = format!("Response {}: \n42", chunks - 1);
    assert!(merge.contains(&last), "last chunk answer should come last: {merge}");
    assert!(merge.contains("Initial Question:\nWhat is the secret value?"));
}

#[tokio::test]
async fn e2e_long_paper_without_fusion() {
    let provider = Arc::new(ScriptedProvider::new(|_| "part".into()));
    let answer = pipeline(provider.clone(), small_window())
        .answer_question("q", generated_paper(4, 25), AskOptions { fuse: false, trade_off: 0 })
        .await
        .unwrap();

    let chunks = provider.calls();
    assert!(chunks > 1);
    assert_eq!(answer, vec!["part"; chunks].join("\n"));
}

#[tokio::test]
async fn e2e_very_long_paper_keeps_first_chunks_only() {
    let provider = Arc::new(ScriptedProvider::new(|prompt| {
        if prompt.contains("the secret value is 42") {
            "42".into()
        } else {
            "part".into()
        }
    }));
    let answer = pipeline(provider.clone(), small_window())
        .answer_question("q", generated_paper(30, 25), AskOptions { fuse: false, trade_off: 0 })
        .await
        .unwrap();

    assert_eq!(provider.calls(), 7);
    assert!(!answer.contains("42"));
}

// ── E2E: Failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_provider_failure_aborts_the_question() {
    let provider = Arc::new(ScriptedProvider::failing(ProviderError::RateLimited {
        retry_after_secs: 30,
    }));
    let err = pipeline(provider, PipelineConfig::default())
        .answer_question("q", Document::from_json(PAPER_JSON).unwrap(), AskOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Provider(ProviderError::RateLimited { .. })));
}

// ── E2E: Configuration and diagnostics ───────────────────────────────────

#[tokio::test]
async fn e2e_config_file_drives_pipeline_and_dumps() {
    let dir = tempfile::tempdir().unwrap();
    let dumps = dir.path().join("dumps");
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            "default_model = \"gpt-4o-mini\"\n\
             [pipeline]\n\
             not_enough_info_answer = \"NO-INFO\"\n\
             excluded_sections = [\"method\"]\n\
             [diagnostics]\n\
             enabled = true\n\
             dir = {:?}\n",
            dumps.display().to_string()
        ),
    )
    .unwrap();

    let config = AppConfig::load_from(&config_path).unwrap();
    let provider = Arc::new(ScriptedProvider::new(|_| "NO-INFO".into()));
    let qa = pipeline(provider.clone(), config.pipeline.clone())
        .with_diagnostics(Diagnostics::from_config(&config.diagnostics));

    let answer = qa
        .answer_question("q", Document::from_json(PAPER_JSON).unwrap(), AskOptions::default())
        .await
        .unwrap();
    assert_eq!(answer, "NO-INFO");

    let prompt = &provider.prompts()[0];
    assert!(prompt.contains("\"NO-INFO\""));
    assert!(!prompt.contains("8 experts"));
    // Only "method" is excluded now, so back matter is rendered.
    assert!(prompt.contains("SECRET bibliography."));

    let paper = std::fs::read_to_string(dumps.join("paper.txt")).unwrap();
    assert!(paper.starts_with("# Sparse Mixtures for Retrieval"));
    let contexts = std::fs::read_to_string(dumps.join("contexts.txt")).unwrap();
    assert!(contexts.starts_with("\nContext nr 0: # Sparse Mixtures"));
    let responses = std::fs::read_to_string(dumps.join("responses.txt")).unwrap();
    assert_eq!(responses, "\nResponse nr 0: NO-INFO\n");
}
