//! Shared test helpers for pipeline tests.

use std::sync::Mutex;
use std::time::Duration;

use askpaper_core::{Message, Provider, ProviderError, ProviderRequest, ProviderResponse, Usage};

type Script = dyn Fn(&str) -> Result<String, ProviderError> + Send + Sync;
type Delay = dyn Fn(&str) -> Duration + Send + Sync;

/// One request seen by [`ScriptedProvider`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub max_tokens: Option<u32>,
}

/// A mock provider answering every prompt through a closure.
///
/// Calls are recorded in arrival order, before the optional delay, so
/// tests can assert both what was sent and in which order it was sent.
pub struct ScriptedProvider {
    script: Box<Script>,
    delay: Option<Box<Delay>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new(script: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self::fallible(move |prompt| Ok(script(prompt)))
    }

    pub fn fallible(script: impl Fn(&str) -> Result<String, ProviderError> + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Same text for every prompt.
    pub fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| text.clone())
    }

    /// Sleep before answering, per prompt.
    pub fn with_delay(mut self, delay: impl Fn(&str) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.prompt).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let prompt = request.prompt_text();
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: prompt.clone(),
            max_tokens: request.max_tokens,
        });

        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(&prompt)).await;
        }

        let text = (self.script)(&prompt)?;
        Ok(make_text_response(&text))
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}
