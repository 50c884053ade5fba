//! # contentai-db
//!
//! PostgreSQL storage layer for contentai.
//!
//! This crate provides:
//! - Connection pool management
//! - The `ai_tasks` task repository with checked lifecycle transitions
//! - The `ai_embeddings` chunk repository (pgvector)
//! - Read access to caller-named content tables
//! - An in-memory store implementing the same traits for tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use contentai_db::{Database, TaskRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/contentai").await?;
//!     db.migrate().await?;
//!
//!     for task in db.tasks.list_recent(10).await? {
//!         println!("{} {}", task.id, task.status);
//!     }
//!     Ok(())
//! }
//! ```

pub mod content;
pub mod embeddings;
pub mod memory;
pub mod pool;
pub mod table_name;
pub mod tasks;

// Re-export core types
pub use contentai_core::*;

pub use content::PgContentRepository;
pub use embeddings::PgEmbeddingChunkRepository;
pub use memory::MemoryStore;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use table_name::quote_table_name;
pub use tasks::PgTaskRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Task repository for the analysis lifecycle.
    pub tasks: PgTaskRepository,
    /// Embedding chunk repository.
    pub embeddings: PgEmbeddingChunkRepository,
    /// Content table reader.
    pub content: PgContentRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            tasks: PgTaskRepository::new(pool.clone()),
            embeddings: PgEmbeddingChunkRepository::new(pool.clone()),
            content: PgContentRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
