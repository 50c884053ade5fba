//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | DATABASE_URL | postgres://localhost/contentai |
//! | HOST | 0.0.0.0 |
//! | PORT | 3000 |
//! | DB_MAX_CONNECTIONS | 10 |
//! | RUN_MIGRATIONS | true |
//! | CHUNK_SIZE | 500 |
//! | CHUNK_OVERLAP | 50 |
//!
//! OpenAI settings are read by `OpenAIConfig::from_env`.

use std::str::FromStr;

use contentai_core::{defaults, ChunkerConfig, Error, Result};

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/contentai";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    pub chunker: ChunkerConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset and empty values take
    /// the default; unparsable ones are configuration errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let chunk_size = parse_or(&get, "CHUNK_SIZE", defaults::CHUNK_SIZE)?;
        let chunk_overlap = parse_or(&get, "CHUNK_OVERLAP", defaults::CHUNK_OVERLAP)?;
        let chunker = ChunkerConfig::new(chunk_size, chunk_overlap)
            .map_err(|e| Error::Config(format!("Invalid chunking settings: {}", e)))?;

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&get, "PORT", DEFAULT_PORT)?,
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            run_migrations: get("RUN_MIGRATIONS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(true),
            chunker,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{}={:?} is invalid: {}", key, raw, e))),
    }
}
