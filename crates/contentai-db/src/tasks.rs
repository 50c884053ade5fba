//! Task repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use contentai_core::{Error, NewTask, Result, Task, TaskRepository, TaskStatus};

const TASK_COLUMNS: &str = "id, task_type, parameters, priority, status, results, error_message,
                            created_at, updated_at";

/// PostgreSQL implementation of TaskRepository over `ai_tasks`.
pub struct PgTaskRepository {
    pool: Pool<Postgres>,
}

impl PgTaskRepository {
    /// Create a new PgTaskRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Parse an `ai_tasks` row into a Task.
    fn parse_task_row(row: sqlx::postgres::PgRow) -> Result<Task> {
        let task_type: String = row.get("task_type");
        let priority: String = row.get("priority");
        let status: String = row.get("status");

        Ok(Task {
            id: row.get("id"),
            task_type: task_type
                .parse()
                .map_err(|_| Error::Serialization(format!("Unknown task type: {}", task_type)))?,
            parameters: row.get("parameters"),
            priority: priority
                .parse()
                .map_err(|_| Error::Serialization(format!("Unknown priority: {}", priority)))?,
            status: status.parse()?,
            results: row.get("results"),
            error_message: row.get("error_message"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    /// Apply one lifecycle transition under a row lock.
    ///
    /// Fails with `TaskNotFound` for unknown ids and with `Error::Task` when the
    /// current status does not allow moving to `next`.
    async fn transition(
        &self,
        task_id: Uuid,
        next: TaskStatus,
        results: Option<JsonValue>,
        error: Option<&str>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM ai_tasks WHERE id = $1 FOR UPDATE")
                .bind(task_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;

        let current: TaskStatus = current.ok_or(Error::TaskNotFound(task_id))?.parse()?;
        if !current.can_transition_to(next) {
            return Err(Error::Task(format!(
                "Task {} cannot move from {} to {}",
                task_id, current, next
            )));
        }

        sqlx::query(
            "UPDATE ai_tasks
             SET status = $1,
                 results = COALESCE($2, results),
                 error_message = COALESCE($3, error_message),
                 updated_at = $4
             WHERE id = $5",
        )
        .bind(next.as_str())
        .bind(&results)
        .bind(error)
        .bind(Utc::now())
        .bind(task_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        tracing::debug!(
            subsystem = "db",
            component = "tasks",
            task_id = %task_id,
            from = %current,
            status = %next,
            "Task transitioned"
        );
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn create(&self, task: NewTask) -> Result<Task> {
        let row = sqlx::query(&format!(
            "INSERT INTO ai_tasks (id, task_type, parameters, priority, status, created_at)
             VALUES ($1, $2, $3, $4, 'pending', $5)
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(Uuid::now_v7())
        .bind(task.task_type.as_str())
        .bind(&task.parameters)
        .bind(task.priority.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Self::parse_task_row(row)
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
        let row = sqlx::query(&format!("SELECT {} FROM ai_tasks WHERE id = $1", TASK_COLUMNS))
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.map(Self::parse_task_row).transpose()
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM ai_tasks ORDER BY created_at DESC LIMIT $1",
            TASK_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(Self::parse_task_row).collect()
    }
}
