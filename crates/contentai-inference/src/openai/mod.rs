//! OpenAI-compatible inference backend.
//!
//! Works with any endpoint that speaks the OpenAI `/embeddings` and
//! `/chat/completions` protocol (OpenAI, Azure OpenAI, vLLM, LocalAI,
//! Ollama in compatibility mode).
//!
//! # Example
//!
//! ```rust,no_run
//! use contentai_core::{ChatMessage, CompletionBackend, CompletionOptions, EmbeddingBackend};
//! use contentai_inference::openai::{OpenAIBackend, OpenAIConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAIBackend::new(OpenAIConfig {
//!         api_key: Some("sk-...".to_string()),
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//!     let vector = backend.embed("Hello, world!").await.unwrap();
//!     assert_eq!(vector.as_slice().len(), 1536);
//!
//!     let reply = backend
//!         .complete(&[ChatMessage::user("Say hi")], CompletionOptions::default())
//!         .await
//!         .unwrap();
//!     println!("{}", reply);
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig, DEFAULT_OPENAI_URL, DEFAULT_TIMEOUT_SECS};
pub use error::{to_contentai_error, Endpoint, OpenAIErrorCode};
pub use types::*;
