//! Task request validation and lifecycle dispatch.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value as JsonValue;
use tracing::{error, info, instrument};
use uuid::Uuid;

use contentai_core::{
    CompletionBackend, CompletionOptions, ContentRepository, Error, NewTask, Result,
    TaskParameters, TaskPriority, TaskRepository, TaskStatus, TaskType,
};
use contentai_db::quote_table_name;

use crate::operations::{self, record_ids_purpose, source_table};
use crate::pipeline::OperationContext;

/// A validated request to run one analysis operation.
#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub task_type: TaskType,
    /// Parameters exactly as submitted; stored on the task.
    pub raw_parameters: JsonValue,
    pub parameters: TaskParameters,
    pub priority: TaskPriority,
}

impl TaskRequest {
    /// Validate a request body of the form `{task_type, parameters, priority?}`.
    ///
    /// Every check happens here, before anything is stored: required fields,
    /// the task type, the priority, the shape of `parameters`, the table name
    /// and, for per-record operations, a non-empty `record_ids`. This goes
    /// beyond a type-and-presence check so that a request which could only
    /// fail leaves no task row behind.
    pub fn from_json(body: &JsonValue) -> Result<Self> {
        let task_type = body.get("task_type").filter(|v| present(v));
        let parameters = body.get("parameters").filter(|v| present(v));
        let (Some(task_type), Some(parameters)) = (task_type, parameters) else {
            return Err(Error::InvalidInput(
                "Missing required fields: task_type, parameters".to_string(),
            ));
        };

        let task_type: TaskType = match task_type.as_str() {
            Some(s) => s.parse()?,
            None => return Err(Error::InvalidInput(
                format!("Invalid task_type. Must be one of: {}", valid_task_types()),
            )),
        };

        let priority = match body.get("priority") {
            None | Some(JsonValue::Null) => TaskPriority::default(),
            Some(JsonValue::String(s)) => s.parse()?,
            Some(other) => {
                return Err(Error::InvalidInput(format!(
                    "Invalid priority {}. Must be one of: low, normal, high",
                    other
                )))
            }
        };

        Self::new(task_type, parameters.clone()).map(|r| r.with_priority(priority))
    }

    /// Validate `parameters` for `task_type` with normal priority.
    pub fn new(task_type: TaskType, raw_parameters: JsonValue) -> Result<Self> {
        if !raw_parameters.is_object() {
            return Err(Error::InvalidInput(
                "parameters must be a JSON object".to_string(),
            ));
        }
        let parameters: TaskParameters = serde_json::from_value(raw_parameters.clone())
            .map_err(|e| Error::InvalidInput(format!("Invalid parameters: {}", e)))?;

        if task_type.requires_record_ids() {
            parameters.required_record_ids(record_ids_purpose(task_type))?;
        }
        quote_table_name(source_table(task_type, &parameters)?)?;

        Ok(Self {
            task_type,
            raw_parameters,
            parameters,
            priority: TaskPriority::default(),
        })
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }
}

// Missing, null and empty-string fields count as absent.
fn present(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn valid_task_types() -> String {
    TaskType::ALL
        .iter()
        .map(TaskType::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Final state of a dispatched task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub task_id: Uuid,
    pub status: TaskStatus,
    pub results: Option<JsonValue>,
    pub error: Option<String>,
}

impl TaskOutcome {
    fn completed(task_id: Uuid, results: JsonValue) -> Self {
        Self {
            task_id,
            status: TaskStatus::Completed,
            results: Some(results),
            error: None,
        }
    }

    fn failed(task_id: Uuid, error: String) -> Self {
        Self {
            task_id,
            status: TaskStatus::Failed,
            results: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Records analysis tasks and runs them to a terminal state.
pub struct TaskDispatcher {
    tasks: Arc<dyn TaskRepository>,
    content: Arc<dyn ContentRepository>,
    completion: Arc<dyn CompletionBackend>,
    options: CompletionOptions,
}

impl TaskDispatcher {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        content: Arc<dyn ContentRepository>,
        completion: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            tasks,
            content,
            completion,
            options: CompletionOptions::default(),
        }
    }

    /// Override the sampling settings sent with every completion.
    pub fn with_completion_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn tasks(&self) -> &Arc<dyn TaskRepository> {
        &self.tasks
    }

    /// Store the task, run its operation and record the outcome.
    ///
    /// An operation failure is not an `Err`: the task is marked `failed` and
    /// the outcome carries the message. `Err` means the task store itself
    /// failed.
    #[instrument(
        skip(self, request),
        fields(
            subsystem = "tasks",
            component = "dispatcher",
            op = "submit",
            task_type = %request.task_type,
            task_id = tracing::field::Empty,
        )
    )]
    pub async fn submit(&self, request: TaskRequest) -> Result<TaskOutcome> {
        let start = Instant::now();
        let task = self
            .tasks
            .create(NewTask {
                task_type: request.task_type,
                parameters: request.raw_parameters,
                priority: request.priority,
            })
            .await?;
        tracing::Span::current().record("task_id", tracing::field::display(task.id));
        info!(priority = request.priority.as_str(), "Task created");

        // A pending task cannot move straight to `failed`, so a task whose
        // processing transition is lost stays pending; name it in the error.
        if let Err(e) = self.tasks.mark_processing(task.id).await {
            error!(error = %e, "Task stranded in pending");
            return Err(Error::Task(format!(
                "Task {} left pending: {}",
                task.id, e
            )));
        }

        let outcome = match self.execute(request.task_type, &request.parameters).await {
            Ok(results) => match self.tasks.complete(task.id, results.clone()).await {
                Ok(()) => TaskOutcome::completed(task.id, results),
                Err(e) => self.record_failure(task.id, e.to_string()).await?,
            },
            Err(e) => self.record_failure(task.id, e.to_string()).await?,
        };

        info!(
            status = %outcome.status,
            duration_ms = start.elapsed().as_millis() as u64,
            "Task finished"
        );
        Ok(outcome)
    }

    async fn record_failure(&self, task_id: Uuid, message: String) -> Result<TaskOutcome> {
        error!(error = %message, "Task failed");
        self.tasks.fail(task_id, &message).await?;
        Ok(TaskOutcome::failed(task_id, message))
    }

    /// Run the operation for `task_type` without touching the task store.
    pub async fn execute(&self, task_type: TaskType, params: &TaskParameters) -> Result<JsonValue> {
        let ctx = OperationContext::new(self.content.as_ref(), self.completion.as_ref())
            .with_options(self.options);
        match task_type {
            TaskType::AnalyzeArticles => operations::analyze_articles(&ctx, params).await,
            TaskType::GenerateSummaries => operations::generate_summaries(&ctx, params).await,
            TaskType::ExtractInsights => operations::extract_insights(&ctx, params).await,
            TaskType::CategorizeContent => operations::categorize_content(&ctx, params).await,
            TaskType::SentimentAnalysis => operations::sentiment_analysis(&ctx, params).await,
        }
    }
}
