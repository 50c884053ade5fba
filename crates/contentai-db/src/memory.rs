//! In-memory implementations of the repository traits.
//!
//! Always compiled so the task and API crates can exercise their full flows
//! in tests without a database. Semantics mirror the Postgres repositories:
//! lifecycle transitions are checked, chunk indices are unique per record,
//! table names are validated and filters treat missing columns like SQL NULL.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;
use uuid::Uuid;

use contentai_core::{
    ContentRecord, ContentRepository, EmbeddingChunk, EmbeddingChunkRepository, Error,
    NewEmbeddingChunk, NewTask, Result, Task, TaskFilters, TaskRepository, TaskStatus,
};

use crate::table_name::quote_table_name;

/// Shared in-memory store for tasks, embedding chunks and content tables.
#[derive(Default)]
pub struct MemoryStore {
    tasks: RwLock<Vec<Task>>,
    chunks: RwLock<Vec<EmbeddingChunk>>,
    tables: RwLock<HashMap<String, Vec<ContentRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `table` (if needed) and append `records` to it.
    pub async fn seed(&self, table: &str, records: impl IntoIterator<Item = ContentRecord>) {
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .extend(records);
    }

    /// Every stored task, oldest first.
    pub async fn tasks(&self) -> Vec<Task> {
        self.tasks.read().await.clone()
    }

    /// Total number of stored embedding chunks.
    pub async fn chunk_count(&self) -> usize {
        self.chunks.read().await.len()
    }

    async fn transition(
        &self,
        task_id: Uuid,
        next: TaskStatus,
        results: Option<JsonValue>,
        error: Option<&str>,
    ) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or(Error::TaskNotFound(task_id))?;

        if !task.status.can_transition_to(next) {
            return Err(Error::Task(format!(
                "Task {} cannot move from {} to {}",
                task_id, task.status, next
            )));
        }

        task.status = next;
        if results.is_some() {
            task.results = results;
        }
        if let Some(error) = error {
            task.error_message = Some(error.to_string());
        }
        task.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn table(&self, table: &str) -> Result<Vec<ContentRecord>> {
        quote_table_name(table)?;
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("relation \"{}\" does not exist", table)))
    }
}

fn matches_filters(record: &ContentRecord, filters: &TaskFilters) -> bool {
    if let Some(status) = &filters.status {
        if record.status.as_ref() != Some(status) {
            return false;
        }
    }
    if let Some(from) = filters.date_from {
        if !record.published_at.is_some_and(|p| p >= from) {
            return false;
        }
    }
    if let Some(to) = filters.date_to {
        if !record.published_at.is_some_and(|p| p <= to) {
            return false;
        }
    }
    if let Some(category) = &filters.category {
        if record.category.as_ref() != Some(category) {
            return false;
        }
    }
    if let Some(featured) = filters.featured {
        if record.featured != Some(featured) {
            return false;
        }
    }
    true
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn create(&self, task: NewTask) -> Result<Task> {
        let task = Task {
            id: Uuid::now_v7(),
            task_type: task.task_type,
            parameters: task.parameters,
            priority: task.priority,
            status: TaskStatus::Pending,
            results: None,
            error_message: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.tasks.write().await.push(task.clone());
        Ok(task)
    }

    async fn mark_processing(&self, task_id: Uuid) -> Result<()> {
        self.transition(task_id, TaskStatus::Processing, None, None)
            .await
    }

    async fn complete(&self, task_id: Uuid, results: JsonValue) -> Result<()> {
        self.transition(task_id, TaskStatus::Completed, Some(results), None)
            .await
    }

    async fn fail(&self, task_id: Uuid, error: &str) -> Result<()> {
        self.transition(task_id, TaskStatus::Failed, None, Some(error))
            .await
    }

    async fn get(&self, task_id: Uuid) -> Result<Option<Task>> {
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .find(|t| t.id == task_id)
            .cloned())
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EmbeddingChunkRepository for MemoryStore {
    async fn delete_for_record(&self, source_record_id: &str) -> Result<u64> {
        let mut chunks = self.chunks.write().await;
        let before = chunks.len();
        chunks.retain(|c| c.source_record_id != source_record_id);
        Ok((before - chunks.len()) as u64)
    }

    async fn insert(&self, chunk: NewEmbeddingChunk) -> Result<Uuid> {
        let mut chunks = self.chunks.write().await;
        if chunks
            .iter()
            .any(|c| c.source_record_id == chunk.source_record_id && c.chunk_ix == chunk.chunk_ix)
        {
            return Err(Error::Internal(format!(
                "duplicate chunk {} for record {}",
                chunk.chunk_ix, chunk.source_record_id
            )));
        }

        let id = Uuid::now_v7();
        chunks.push(EmbeddingChunk {
            id,
            org_id: chunk.org_id,
            content: chunk.content,
            embedding: chunk.embedding,
            source_table: chunk.source_table,
            source_field: chunk.source_field,
            source_record_id: chunk.source_record_id,
            chunk_ix: chunk.chunk_ix,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn get_for_record(&self, source_record_id: &str) -> Result<Vec<EmbeddingChunk>> {
        let mut found: Vec<EmbeddingChunk> = self
            .chunks
            .read()
            .await
            .iter()
            .filter(|c| c.source_record_id == source_record_id)
            .cloned()
            .collect();
        found.sort_by_key(|c| c.chunk_ix);
        Ok(found)
    }
}

#[async_trait]
impl ContentRepository for MemoryStore {
    async fn fetch_by_ids(&self, table: &str, ids: &[String]) -> Result<Vec<ContentRecord>> {
        let rows = self.table(table).await?;
        let mut out = Vec::new();
        for id in ids {
            if out.iter().any(|r: &ContentRecord| &r.id == id) {
                continue;
            }
            if let Some(record) = rows.iter().find(|r| &r.id == id) {
                out.push(record.clone());
            }
        }
        Ok(out)
    }

    async fn fetch_filtered(
        &self,
        table: &str,
        filters: &TaskFilters,
    ) -> Result<Vec<ContentRecord>> {
        let rows = self.table(table).await?;
        let limit = filters
            .limit
            .map(|l| l.max(0) as usize)
            .unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .filter(|r| matches_filters(r, filters))
            .take(limit)
            .collect())
    }
}
