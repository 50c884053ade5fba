//! Embedding chunk repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use contentai_core::{EmbeddingChunk, EmbeddingChunkRepository, Error, NewEmbeddingChunk, Result};

/// PostgreSQL implementation of EmbeddingChunkRepository over `ai_embeddings`.
pub struct PgEmbeddingChunkRepository {
    pool: Pool<Postgres>,
}

impl PgEmbeddingChunkRepository {
    /// Create a new PgEmbeddingChunkRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmbeddingChunkRepository for PgEmbeddingChunkRepository {
    async fn delete_for_record(&self, source_record_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM ai_embeddings WHERE source_record_id = $1")
            .bind(source_record_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }

    async fn insert(&self, chunk: NewEmbeddingChunk) -> Result<Uuid> {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO ai_embeddings
                 (id, org_id, content, embedding, source_table, source_field,
                  source_record_id, chunk_ix, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(id)
        .bind(chunk.org_id)
        .bind(&chunk.content)
        .bind(&chunk.embedding)
        .bind(&chunk.source_table)
        .bind(&chunk.source_field)
        .bind(&chunk.source_record_id)
        .bind(chunk.chunk_ix)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(id)
    }

    async fn get_for_record(&self, source_record_id: &str) -> Result<Vec<EmbeddingChunk>> {
        let rows = sqlx::query(
            "SELECT id, org_id, content, embedding, source_table, source_field,
                    source_record_id, chunk_ix, created_at
             FROM ai_embeddings
             WHERE source_record_id = $1
             ORDER BY chunk_ix",
        )
        .bind(source_record_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| EmbeddingChunk {
                id: row.get("id"),
                org_id: row.get("org_id"),
                content: row.get("content"),
                embedding: row.get("embedding"),
                source_table: row.get("source_table"),
                source_field: row.get("source_field"),
                source_record_id: row.get("source_record_id"),
                chunk_ix: row.get("chunk_ix"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}
