//! # contentai-tasks
//!
//! Request-driven orchestration for contentai.
//!
//! This crate provides:
//! - The embedding generator: chunk a record body, embed each window and
//!   replace the record's stored chunks
//! - The task dispatcher: validate a request, record the task and walk it
//!   through `pending → processing → completed | failed`
//! - The five content-analysis operations, built on one
//!   fetch → template → call → parse pipeline
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use contentai_db::{Database, PgContentRepository, PgTaskRepository};
//! use contentai_inference::OpenAIBackend;
//! use contentai_tasks::{TaskDispatcher, TaskRequest};
//!
//! let db = Database::connect("postgres://...").await?;
//! let openai = Arc::new(OpenAIBackend::from_env()?);
//! let dispatcher = TaskDispatcher::new(
//!     Arc::new(PgTaskRepository::new(db.pool.clone())),
//!     Arc::new(PgContentRepository::new(db.pool.clone())),
//!     openai,
//! );
//!
//! let request = TaskRequest::from_json(&serde_json::json!({
//!     "task_type": "categorize_content",
//!     "parameters": {"table_name": "projects", "record_ids": ["7", "9"]}
//! }))?;
//! let outcome = dispatcher.submit(request).await?;
//! println!("{} {}", outcome.task_id, outcome.status);
//! ```

pub mod dispatcher;
pub mod embedding;
pub mod operations;
pub mod parse;
pub mod pipeline;
pub mod prompts;

// Re-export core types
pub use contentai_core::*;

pub use dispatcher::{TaskDispatcher, TaskOutcome, TaskRequest};
pub use embedding::EmbeddingGenerator;
pub use pipeline::{AnalysisPipeline, OperationContext};
