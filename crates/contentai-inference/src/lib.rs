//! # contentai-inference
//!
//! Embedding and chat-completion backends for contentai.
//!
//! This crate provides:
//! - An OpenAI-compatible HTTP backend (feature `openai`, default)
//!   implementing [`EmbeddingBackend`] and [`CompletionBackend`]
//! - Classification of OpenAI HTTP failures into contentai errors
//! - A deterministic mock backend (feature `mock`) for tests in dependent crates
//!
//! # Example
//!
//! ```rust,no_run
//! use contentai_inference::{EmbeddingBackend, OpenAIBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAIBackend::from_env().unwrap();
//!     let vector = backend.embed("Hello").await.unwrap();
//!     println!("{} dimensions", vector.as_slice().len());
//! }
//! ```

#[cfg(feature = "openai")]
pub mod openai;

// Mock inference backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use contentai_core::*;

#[cfg(feature = "openai")]
pub use openai::{OpenAIBackend, OpenAIConfig};
