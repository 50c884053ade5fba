//! OpenAI-compatible inference backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use contentai_core::{
    defaults, ChatMessage, CompletionBackend, CompletionOptions, EmbeddingBackend, Error, Result,
    Vector,
};

use super::error::{to_contentai_error, Endpoint, OpenAIErrorCode};
use super::types::*;

/// Default OpenAI API endpoint.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration for OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Model to use for embeddings.
    pub embed_model: String,
    /// Model to use for chat completions.
    pub gen_model: String,
    /// Expected embedding dimension.
    pub embed_dimension: usize,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Skip TLS verification (for self-signed certs in local environments).
    pub skip_tls_verify: bool,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_URL.to_string(),
            api_key: None,
            embed_model: defaults::EMBED_MODEL.to_string(),
            gen_model: defaults::GEN_MODEL.to_string(),
            embed_dimension: defaults::EMBED_DIMENSION,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            skip_tls_verify: false,
        }
    }
}

impl OpenAIConfig {
    /// Read configuration from `OPENAI_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(base.base_url),
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            embed_model: std::env::var("OPENAI_EMBED_MODEL").unwrap_or(base.embed_model),
            gen_model: std::env::var("OPENAI_GEN_MODEL").unwrap_or(base.gen_model),
            embed_dimension: std::env::var("OPENAI_EMBED_DIM")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(base.embed_dimension),
            timeout_seconds: std::env::var("OPENAI_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(base.timeout_seconds),
            skip_tls_verify: std::env::var("OPENAI_SKIP_TLS_VERIFY")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

/// OpenAI-compatible inference backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let mut client_builder =
            Client::builder().timeout(Duration::from_secs(config.timeout_seconds));

        if config.skip_tls_verify {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "openai",
            base_url = %config.base_url,
            embed_model = %config.embed_model,
            gen_model = %config.gen_model,
            authenticated = config.api_key.is_some(),
            "Initializing OpenAI backend"
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Build a POST request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        req.header("Content-Type", "application/json")
    }

    /// Send `body` to `path` and decode a successful JSON response.
    async fn post_json<B, T>(&self, path: &str, endpoint: Endpoint, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let request_error = |e: reqwest::Error| match endpoint {
            Endpoint::Embeddings => Error::Embedding(format!("Request failed: {}", e)),
            Endpoint::ChatCompletions => Error::Inference(format!("Request failed: {}", e)),
        };

        let response = self
            .build_request(path)
            .json(body)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let (kind, message) = match serde_json::from_str::<OpenAIErrorResponse>(&text) {
                Ok(body) => (
                    body.error
                        .code
                        .or(body.error.error_type)
                        .unwrap_or_default(),
                    body.error.message,
                ),
                Err(_) if text.trim().is_empty() => (String::new(), status.to_string()),
                Err(_) => (String::new(), text.trim().to_string()),
            };
            let code = OpenAIErrorCode::from_response(status.as_u16(), &kind);
            return Err(to_contentai_error(
                code,
                endpoint,
                &format!("OpenAI returned {}: {}", status.as_u16(), message),
            ));
        }

        response.json().await.map_err(|e| match endpoint {
            Endpoint::Embeddings => Error::Embedding(format!("Failed to parse response: {}", e)),
            Endpoint::ChatCompletions => {
                Error::Inference(format!("Failed to parse response: {}", e))
            }
        })
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAIBackend {
    async fn embed(&self, input: &str) -> Result<Vector> {
        let start = Instant::now();
        let request = EmbeddingRequest {
            model: &self.config.embed_model,
            input,
        };

        let result: EmbeddingResponse = self
            .post_json("/embeddings", Endpoint::Embeddings, &request)
            .await?;

        let embedding = result
            .data
            .into_iter()
            .min_by_key(|d| d.index)
            .map(|d| d.embedding)
            .ok_or_else(|| Error::Embedding("OpenAI returned no embedding data".to_string()))?;

        if embedding.len() != self.config.embed_dimension {
            return Err(Error::Embedding(format!(
                "Expected {} dimensions from {}, got {}",
                self.config.embed_dimension,
                self.config.embed_model,
                embedding.len()
            )));
        }

        debug!(
            subsystem = "inference",
            component = "openai",
            op = "embed",
            model = %self.config.embed_model,
            prompt_len = input.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Embedding generated"
        );
        Ok(Vector::from(embedding))
    }

    fn dimension(&self) -> usize {
        self.config.embed_dimension
    }

    fn model_name(&self) -> &str {
        &self.config.embed_model
    }
}

#[async_trait]
impl CompletionBackend for OpenAIBackend {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<String> {
        let start = Instant::now();
        let request = ChatCompletionRequest {
            model: &self.config.gen_model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let result: ChatCompletionResponse = self
            .post_json("/chat/completions", Endpoint::ChatCompletions, &request)
            .await?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Inference("OpenAI returned no completion content".to_string()))?;

        debug!(
            subsystem = "inference",
            component = "openai",
            op = "complete",
            model = %self.config.gen_model,
            prompt_len = messages.iter().map(|m| m.content.len()).sum::<usize>(),
            response_len = content.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Completion generated"
        );
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.gen_model
    }
}
