//! Task runner and task lookup endpoints.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{error, instrument};
use uuid::Uuid;

use contentai_core::{Task, TaskStatus};
use contentai_tasks::TaskRequest;

use crate::{ApiError, AppState};

const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
const ALLOW_METHODS: &str = "POST, OPTIONS";

/// Adds `Access-Control-Allow-Origin: *` to every task-runner response.
pub fn allow_any_origin() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    )
}

/// Body of every task-runner response.
#[derive(Debug, Serialize)]
struct TaskRunResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<TaskStatus>,
}

impl TaskRunResponse {
    fn rejected(status: StatusCode, error: impl Into<String>) -> Response {
        let body = Self {
            success: false,
            task_id: None,
            results: None,
            error: Some(error.into()),
            status: None,
        };
        (status, Json(body)).into_response()
    }
}

/// `ANY /functions/v1/process-task-run`
///
/// `OPTIONS` answers the CORS preflight, `POST` runs a task, anything else is
/// `405`. Validation failures are `400` with no task created; a task that ran
/// and failed is `500` with its id.
#[instrument(skip(state, body), fields(subsystem = "api", component = "tasks", op = "process_task_run"))]
pub async fn process_task_run(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    if method == Method::OPTIONS {
        return (
            StatusCode::OK,
            [
                (header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
                (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS),
            ],
        )
            .into_response();
    }
    if method != Method::POST {
        return TaskRunResponse::rejected(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }

    let request = match serde_json::from_slice::<JsonValue>(&body) {
        Ok(json) => TaskRequest::from_json(&json),
        Err(e) => {
            return TaskRunResponse::rejected(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", e),
            )
        }
    };
    let request = match request {
        Ok(request) => request,
        Err(e) if e.is_validation() => {
            let message = match e {
                contentai_core::Error::InvalidInput(msg) => msg,
                other => other.to_string(),
            };
            return TaskRunResponse::rejected(StatusCode::BAD_REQUEST, message);
        }
        Err(e) => return TaskRunResponse::rejected(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    match state.dispatcher.submit(request).await {
        Ok(outcome) => {
            let status = if outcome.is_success() {
                StatusCode::OK
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            let body = TaskRunResponse {
                success: outcome.is_success(),
                task_id: Some(outcome.task_id),
                results: outcome.results,
                error: outcome.error,
                status: Some(outcome.status),
            };
            (status, Json(body)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Task store failure");
            TaskRunResponse::rejected(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// `GET /functions/v1/tasks/:id`
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    state
        .dispatcher
        .tasks()
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::from(contentai_core::Error::TaskNotFound(id)))
}

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    limit: Option<i64>,
}

const DEFAULT_LIST_LIMIT: i64 = 20;
const MAX_LIST_LIMIT: i64 = 100;

/// `GET /functions/v1/tasks?limit=N`, newest first.
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    Ok(Json(state.dispatcher.tasks().list_recent(limit).await?))
}
