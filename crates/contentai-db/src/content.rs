//! Read access to caller-named content tables.
//!
//! Rows are fetched as `to_jsonb(t)` so tables of any shape decode into
//! [`ContentRecord`]; missing columns simply stay `None`. Filters on columns a
//! table lacks surface as database errors.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};

use tracing::warn;

use contentai_core::{ContentRecord, ContentRepository, Error, Result, TaskFilters};

use crate::table_name::quote_table_name;

/// PostgreSQL implementation of ContentRepository.
pub struct PgContentRepository {
    pool: Pool<Postgres>,
}

impl PgContentRepository {
    /// Create a new PgContentRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn decode_rows(table: &str, rows: Vec<sqlx::postgres::PgRow>) -> Vec<ContentRecord> {
        decode_records(table, rows.into_iter().map(|row| row.get::<JsonValue, _>("row")))
    }
}

/// Decode each row on its own; a row without a usable `id` is skipped with a
/// warning rather than failing its neighbours.
fn decode_records(table: &str, rows: impl IntoIterator<Item = JsonValue>) -> Vec<ContentRecord> {
    rows.into_iter()
        .filter_map(|value| match serde_json::from_value::<ContentRecord>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(
                    subsystem = "db",
                    component = "content",
                    table = %table,
                    error = %e,
                    "Skipping unreadable content row"
                );
                None
            }
        })
        .collect()
}

/// WHERE clause and LIMIT for `filters`, numbering placeholders from `$1`.
///
/// Bind order: status, date_from, date_to, category, featured, limit.
fn filter_sql(filters: &TaskFilters) -> String {
    let mut clauses = Vec::new();
    let mut next = 1;
    let mut placeholder = || {
        let p = format!("${}", next);
        next += 1;
        p
    };

    if filters.status.is_some() {
        clauses.push(format!("t.status = {}", placeholder()));
    }
    if filters.date_from.is_some() {
        clauses.push(format!("t.published_at >= {}", placeholder()));
    }
    if filters.date_to.is_some() {
        clauses.push(format!("t.published_at <= {}", placeholder()));
    }
    if filters.category.is_some() {
        clauses.push(format!("t.category = {}", placeholder()));
    }
    if filters.featured.is_some() {
        clauses.push(format!("t.featured = {}", placeholder()));
    }

    let mut sql = String::new();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    if filters.limit.is_some() {
        sql.push_str(&format!(" LIMIT {}", placeholder()));
    }
    sql
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn fetch_by_ids(&self, table: &str, ids: &[String]) -> Result<Vec<ContentRecord>> {
        let quoted = quote_table_name(table)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&format!(
            "SELECT to_jsonb(t) AS row FROM {} t WHERE t.id::text = ANY($1)",
            quoted
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut by_id: HashMap<String, ContentRecord> = Self::decode_rows(table, rows)
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();

        // Caller order; duplicate ids yield the row once.
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn fetch_filtered(
        &self,
        table: &str,
        filters: &TaskFilters,
    ) -> Result<Vec<ContentRecord>> {
        let quoted = quote_table_name(table)?;
        let sql = format!(
            "SELECT to_jsonb(t) AS row FROM {} t{}",
            quoted,
            filter_sql(filters)
        );

        let mut query = sqlx::query(&sql);
        if let Some(status) = &filters.status {
            query = query.bind(status);
        }
        if let Some(from) = filters.date_from {
            query = query.bind(from);
        }
        if let Some(to) = filters.date_to {
            query = query.bind(to);
        }
        if let Some(category) = &filters.category {
            query = query.bind(category);
        }
        if let Some(featured) = filters.featured {
            query = query.bind(featured);
        }
        if let Some(limit) = filters.limit {
            query = query.bind(limit);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(Error::Database)?;
        tracing::debug!(
            subsystem = "db",
            component = "content",
            table = %table,
            record_count = rows.len(),
            "Fetched filtered records"
        );
        Ok(Self::decode_rows(table, rows))
    }
}
