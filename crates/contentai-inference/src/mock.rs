//! Mock inference backend for deterministic testing.
//!
//! Embeddings are derived from the input text, completions come from a
//! default reply or from rules keyed on a substring of the last message.
//! Failures are scripted the same way, so tests can make exactly one record
//! of a batch fail.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let backend = MockInferenceBackend::new()
//!     .with_dimension(8)
//!     .with_fixed_response("Technology")
//!     .with_failure_when("poison", "model overloaded");
//!
//! assert_eq!(backend.embed("some text").await?.as_slice().len(), 8);
//!
//! let messages = [ChatMessage::user("poison pill")];
//! assert!(backend.complete(&messages, CompletionOptions::default()).await.is_err());
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use contentai_core::{
    defaults, ChatMessage, ChatRole, CompletionBackend, CompletionOptions, EmbeddingBackend,
    Error, Result, Vector,
};

/// One recorded backend call.
#[derive(Debug, Clone)]
pub struct MockCall {
    /// `"embed"` or `"complete"`.
    pub operation: String,
    /// Embedding input or the last user message.
    pub input: String,
    /// System message of a completion, if any.
    pub system: Option<String>,
    /// Sampling options of a completion.
    pub options: Option<CompletionOptions>,
}

#[derive(Debug, Clone)]
enum MockReply {
    Respond(String),
    Fail(String),
}

#[derive(Debug, Clone)]
struct MockConfig {
    dimension: usize,
    default_response: String,
    rules: Vec<(String, MockReply)>,
    embed_failures: Vec<(String, String)>,
    embed_budget: Option<usize>,
    latency_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimension: defaults::EMBED_DIMENSION,
            default_response: "Mock response".to_string(),
            rules: Vec::new(),
            embed_failures: Vec::new(),
            embed_budget: None,
            latency_ms: 0,
        }
    }
}

/// Mock embedding and completion backend.
#[derive(Clone, Default)]
pub struct MockInferenceBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockInferenceBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Reply used when no rule matches.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Reply with `response` when the last message contains `pattern`.
    pub fn with_response_when(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .rules
            .push((pattern.into(), MockReply::Respond(response.into())));
        self
    }

    /// Fail with an inference error when the last message contains `pattern`.
    pub fn with_failure_when(
        mut self,
        pattern: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .rules
            .push((pattern.into(), MockReply::Fail(message.into())));
        self
    }

    /// Fail with an embedding error when the input contains `pattern`.
    pub fn with_embed_failure_when(
        mut self,
        pattern: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .embed_failures
            .push((pattern.into(), message.into()));
        self
    }

    /// Let only the first `n` embed calls succeed.
    pub fn fail_embeddings_after(mut self, n: usize) -> Self {
        Arc::make_mut(&mut self.config).embed_budget = Some(n);
        self
    }

    /// Set simulated latency for all operations.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.log().clone()
    }

    /// Get number of embed calls.
    pub fn embed_call_count(&self) -> usize {
        self.count("embed")
    }

    /// Get number of completion calls.
    pub fn complete_call_count(&self) -> usize {
        self.count("complete")
    }

    fn log(&self) -> MutexGuard<'_, Vec<MockCall>> {
        self.call_log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn count(&self, operation: &str) -> usize {
        self.log()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }
    }
}

/// Deterministic unit vector derived from the characters of `text`.
pub fn mock_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let mut vec = vec![0.0; dimension.max(1)];
    for (i, c) in text.chars().enumerate() {
        let idx = (c as usize + i) % vec.len();
        vec[idx] += 0.1;
    }

    let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        vec.iter_mut().for_each(|x| *x /= magnitude);
    }
    vec.truncate(dimension);
    vec
}

#[async_trait]
impl EmbeddingBackend for MockInferenceBackend {
    async fn embed(&self, input: &str) -> Result<Vector> {
        let prior = self.embed_call_count();
        self.log().push(MockCall {
            operation: "embed".to_string(),
            input: input.to_string(),
            system: None,
            options: None,
        });
        self.simulate_latency().await;

        if let Some((_, message)) = self
            .config
            .embed_failures
            .iter()
            .find(|(pattern, _)| input.contains(pattern.as_str()))
        {
            return Err(Error::Embedding(message.clone()));
        }
        if self.config.embed_budget.is_some_and(|budget| prior >= budget) {
            return Err(Error::Embedding(
                "OpenAI returned 500: simulated outage".to_string(),
            ));
        }

        Ok(Vector::from(mock_embedding(input, self.config.dimension)))
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

#[async_trait]
impl CompletionBackend for MockInferenceBackend {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<String> {
        let input = messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let system = messages
            .iter()
            .find(|m| m.role == ChatRole::System)
            .map(|m| m.content.clone());

        self.log().push(MockCall {
            operation: "complete".to_string(),
            input: input.clone(),
            system,
            options: Some(options),
        });
        self.simulate_latency().await;

        let rule = self
            .config
            .rules
            .iter()
            .find(|(pattern, _)| input.contains(pattern.as_str()));
        match rule {
            Some((_, MockReply::Respond(response))) => Ok(response.clone()),
            Some((_, MockReply::Fail(message))) => Err(Error::Inference(message.clone())),
            None => Ok(self.config.default_response.clone()),
        }
    }

    fn model_name(&self) -> &str {
        "mock-gen"
    }
}
