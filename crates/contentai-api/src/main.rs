//! contentai-api - HTTP server for embedding generation and AI analysis tasks.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contentai_api::{router, AppState, ServerConfig};
use contentai_db::{
    create_pool_with_config, log_pool_metrics, Database, PgContentRepository,
    PgEmbeddingChunkRepository, PgTaskRepository, PoolConfig,
};
use contentai_inference::OpenAIBackend;
use contentai_tasks::{EmbeddingGenerator, TaskDispatcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors
    //   RUST_LOG    - standard env filter
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "contentai_api=debug,contentai_tasks=debug,contentai_db=info,tower_http=debug".into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("contentai-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = ServerConfig::from_env()?;

    let pool = create_pool_with_config(
        &config.database_url,
        PoolConfig::new().max_connections(config.db_max_connections),
    )
    .await?;
    let db = Database::new(pool.clone());

    if config.run_migrations {
        info!(subsystem = "db", "Running migrations");
        db.migrate().await?;
    }
    log_pool_metrics(&pool);

    let backend = Arc::new(OpenAIBackend::from_env()?);

    let generator = EmbeddingGenerator::new(
        Arc::new(PgEmbeddingChunkRepository::new(pool.clone())),
        backend.clone(),
    )
    .with_chunker_config(config.chunker.clone());

    let dispatcher = TaskDispatcher::new(
        Arc::new(PgTaskRepository::new(pool.clone())),
        Arc::new(PgContentRepository::new(pool.clone())),
        backend,
    );

    let app = router(AppState::new(generator, dispatcher));

    let addr = config.bind_address();
    info!(
        address = %addr,
        chunk_size = config.chunker.size(),
        chunk_overlap = config.chunker.overlap(),
        "contentai-api listening"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
