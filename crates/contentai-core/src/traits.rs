//! Core traits for contentai abstractions.
//!
//! Every I/O seam (task storage, embedding storage, content reads, the
//! embedding and completion APIs) is a trait so the orchestrators can run
//! against Postgres and OpenAI in production and against in-memory fakes in
//! tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// TASK REPOSITORY TRAITS
// =============================================================================

/// Repository for the durable task lifecycle.
///
/// Implementations must only accept the transitions allowed by
/// [`TaskStatus::can_transition_to`]; a terminal write against a task that is
/// not `processing` fails with [`crate::Error::Task`].
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a new task in `pending` state.
    async fn create(&self, task: NewTask) -> Result<Task>;

    /// Move a `pending` task to `processing`.
    async fn mark_processing(&self, task_id: Uuid) -> Result<()>;

    /// Mark a `processing` task completed with its results.
    async fn complete(&self, task_id: Uuid, results: JsonValue) -> Result<()>;

    /// Mark a `processing` task failed with an error message.
    async fn fail(&self, task_id: Uuid, error: &str) -> Result<()>;

    /// Get task by ID.
    async fn get(&self, task_id: Uuid) -> Result<Option<Task>>;

    /// List the most recently created tasks.
    async fn list_recent(&self, limit: i64) -> Result<Vec<Task>>;
}

// =============================================================================
// EMBEDDING REPOSITORY TRAITS
// =============================================================================

/// Repository for per-chunk embedding rows.
#[async_trait]
pub trait EmbeddingChunkRepository: Send + Sync {
    /// Delete every chunk of a source record. Returns the number removed.
    async fn delete_for_record(&self, source_record_id: &str) -> Result<u64>;

    /// Insert one chunk row.
    async fn insert(&self, chunk: NewEmbeddingChunk) -> Result<Uuid>;

    /// All chunks of a source record ordered by chunk index.
    async fn get_for_record(&self, source_record_id: &str) -> Result<Vec<EmbeddingChunk>>;
}

// =============================================================================
// CONTENT REPOSITORY TRAITS
// =============================================================================

/// Read-only access to caller-named platform content tables.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Rows of `table` whose id is in `ids`, in the order of `ids`.
    ///
    /// Ids that match no row are skipped.
    async fn fetch_by_ids(&self, table: &str, ids: &[String]) -> Result<Vec<ContentRecord>>;

    /// Rows of `table` matching every filter that is set.
    ///
    /// `date_from` and `date_to` bound `published_at` inclusively.
    async fn fetch_filtered(&self, table: &str, filters: &TaskFilters)
        -> Result<Vec<ContentRecord>>;
}

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate the embedding of a single input.
    async fn embed(&self, input: &str) -> Result<Vector>;

    /// Get the expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message of a chat-completion conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Sampling settings for one completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: crate::defaults::GEN_TEMPERATURE,
            max_tokens: crate::defaults::GEN_MAX_TOKENS,
        }
    }
}

/// Backend for chat completions.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run a chat completion and return the first choice's message text.
    async fn complete(&self, messages: &[ChatMessage], options: CompletionOptions)
        -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
