//! # contentai-api
//!
//! HTTP surface for contentai: the embedding trigger, the task runner, task
//! lookup and a health probe. The binary in `main.rs` wires these routes to
//! Postgres and OpenAI; tests wire them to in-memory fakes.

pub mod config;
pub mod error;
pub mod handlers;

use std::any::Any;
use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use contentai_tasks::{EmbeddingGenerator, TaskDispatcher};

pub use config::ServerConfig;
pub use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<EmbeddingGenerator>,
    pub dispatcher: Arc<TaskDispatcher>,
}

impl AppState {
    pub fn new(generator: EmbeddingGenerator, dispatcher: TaskDispatcher) -> Self {
        Self {
            generator: Arc::new(generator),
            dispatcher: Arc::new(dispatcher),
        }
    }
}

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// A panicking handler answers like any other unexpected failure: a JSON
/// `500` carrying the permissive CORS header.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(subsystem = "api", panic = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(serde_json::json!({
            "success": false,
            "error": "Internal server error",
        })),
    )
        .into_response()
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/functions/v1/generate-embeddings",
            post(handlers::embeddings::generate_embeddings),
        )
        .route(
            "/functions/v1/process-task-run",
            any(handlers::tasks::process_task_run).layer(handlers::tasks::allow_any_origin()),
        )
        .route("/functions/v1/tasks", get(handlers::tasks::list_tasks))
        .route("/functions/v1/tasks/:id", get(handlers::tasks::get_task))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .with_state(state)
}
