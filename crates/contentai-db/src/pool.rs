//! Postgres connection pool setup.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use contentai_core::{Error, Result};

/// Sizing of the shared pool. Only the connection ceiling is configurable
/// from the environment (`DB_MAX_CONNECTIONS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    /// How long a request waits for a free connection before failing.
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n.max(1);
        self
    }
}

/// Connect with [`PoolConfig::default`].
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    create_pool_with_config(database_url, PoolConfig::default()).await
}

pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let start = Instant::now();
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "pool",
        op = "connect",
        max_connections = config.max_connections,
        duration_ms = start.elapsed().as_millis() as u64,
        "Connected to Postgres"
    );
    Ok(pool)
}

/// Log pool occupancy; warns when every connection is checked out.
pub fn log_pool_metrics(pool: &PgPool) {
    let (size, idle) = (pool.size(), pool.num_idle());
    debug!(subsystem = "db", component = "pool", pool_size = size, pool_idle = idle, "Pool status");
    if size > 0 && idle == 0 {
        warn!(subsystem = "db", component = "pool", pool_size = size, "No idle connections");
    }
}
