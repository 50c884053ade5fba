//! Chunk-and-embed generation for a single content record.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, trace};

use contentai_core::{
    defaults, ChunkerConfig, EmbeddingBackend, EmbeddingChunkRepository, EmbeddingSource,
    NewEmbeddingChunk, Result, SlidingWindowChunker,
};

/// Replaces the stored embedding chunks of a record with a fresh generation.
///
/// Regeneration deletes every prior chunk first, then embeds and inserts the
/// new windows one at a time in index order. A failure stops the loop; chunks
/// inserted before it are kept.
pub struct EmbeddingGenerator {
    chunks: Arc<dyn EmbeddingChunkRepository>,
    backend: Arc<dyn EmbeddingBackend>,
    chunker: SlidingWindowChunker,
}

impl EmbeddingGenerator {
    /// Create a generator with the default chunk size and overlap.
    pub fn new(
        chunks: Arc<dyn EmbeddingChunkRepository>,
        backend: Arc<dyn EmbeddingBackend>,
    ) -> Self {
        Self {
            chunks,
            backend,
            chunker: SlidingWindowChunker::default(),
        }
    }

    /// Override the chunk size and overlap.
    pub fn with_chunker_config(mut self, config: ChunkerConfig) -> Self {
        self.chunker = SlidingWindowChunker::new(config);
        self
    }

    pub fn chunker_config(&self) -> &ChunkerConfig {
        self.chunker.config()
    }

    /// Regenerate the chunks of `source` and return how many were stored.
    #[instrument(
        skip(self, source),
        fields(
            subsystem = "tasks",
            component = "embedding_generator",
            op = "generate",
            record_id = %source.id,
        )
    )]
    pub async fn generate(&self, source: &EmbeddingSource) -> Result<usize> {
        let start = Instant::now();
        let removed = self.chunks.delete_for_record(&source.id).await?;

        let body = source.body.as_deref().unwrap_or_default();
        let windows = self.chunker.chunk(body);

        for window in &windows {
            let embedding = self.backend.embed(&window.text).await?;
            self.chunks
                .insert(NewEmbeddingChunk {
                    org_id: source.org_id,
                    content: window.text.clone(),
                    embedding,
                    source_table: defaults::EMBED_SOURCE_TABLE.to_string(),
                    source_field: defaults::EMBED_SOURCE_FIELD.to_string(),
                    source_record_id: source.id.clone(),
                    chunk_ix: window.index as i32,
                })
                .await?;
            trace!(
                chunk_ix = window.index,
                start = window.start,
                end = window.end,
                "Chunk embedded"
            );
        }

        info!(
            chunk_count = windows.len(),
            removed,
            model = self.backend.model_name(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Embeddings generated"
        );
        Ok(windows.len())
    }
}
