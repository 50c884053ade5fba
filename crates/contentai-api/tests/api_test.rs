//! Router tests against the in-memory store and mock backend.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

use contentai_api::{router, AppState};
use contentai_db::{
    ContentRecord, ContentRepository, EmbeddingChunkRepository, MemoryStore, Result, TaskFilters,
    TaskStatus,
};
use contentai_inference::mock::MockInferenceBackend;
use contentai_tasks::{ChunkerConfig, EmbeddingGenerator, TaskDispatcher};

const TASK_RUN: &str = "/functions/v1/process-task-run";
const EMBEDDINGS: &str = "/functions/v1/generate-embeddings";

fn app(store: &Arc<MemoryStore>, backend: &MockInferenceBackend) -> Router {
    let backend = Arc::new(backend.clone());
    let generator = EmbeddingGenerator::new(store.clone(), backend.clone())
        .with_chunker_config(ChunkerConfig::new(50, 10).unwrap());
    let dispatcher = TaskDispatcher::new(store.clone(), store.clone(), backend);
    router(AppState::new(generator, dispatcher))
}

fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, JsonValue) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

fn record(id: &str, title: &str, description: &str) -> ContentRecord {
    ContentRecord {
        id: id.to_string(),
        title: Some(title.to_string()),
        description: Some(description.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_health() {
    let app = app(&Arc::new(MemoryStore::new()), &MockInferenceBackend::new());
    let (status, headers, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_generate_embeddings_reports_count() {
    let store = Arc::new(MemoryStore::new());
    let backend = MockInferenceBackend::new().with_dimension(4);
    let app = app(&store, &backend);

    let text: String = "0123456789".repeat(12);
    let payload = json!({
        "record": {"id": "42", "org_id": "00000000-0000-0000-0000-0000000000aa", "body": text}
    });
    let (status, _, body) = send(&app, post(EMBEDDINGS, payload.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Generated 3 embeddings.");
    assert_eq!(store.get_for_record("42").await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_generate_embeddings_errors_are_bad_request() {
    let store = Arc::new(MemoryStore::new());
    let backend = MockInferenceBackend::new().with_embed_failure_when("boom", "quota exceeded");
    let app = app(&store, &backend);

    let (status, _, body) = send(&app, post(EMBEDDINGS, "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid trigger payload"));

    let payload = json!({
        "record": {"id": "7", "org_id": "00000000-0000-0000-0000-0000000000aa", "body": "boom"}
    });
    let (status, _, body) = send(&app, post(EMBEDDINGS, payload.to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("quota exceeded"));
    assert_eq!(store.chunk_count().await, 0);
}

#[tokio::test]
async fn test_task_run_preflight_and_method_guard() {
    let app = app(&Arc::new(MemoryStore::new()), &MockInferenceBackend::new());

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri(TASK_RUN)
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(&app, preflight).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "authorization, x-client-info, apikey, content-type"
    );

    let (status, headers, body) = send(&app, get(TASK_RUN)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(body, json!({"success": false, "error": "Method not allowed"}));
}

#[tokio::test]
async fn test_task_run_rejects_invalid_requests_without_creating_tasks() {
    let store = Arc::new(MemoryStore::new());
    let backend = MockInferenceBackend::new();
    let app = app(&store, &backend);

    let cases = [
        (json!({"parameters": {}}).to_string(), "Missing required fields"),
        (
            json!({"task_type": "translate", "parameters": {}}).to_string(),
            "Invalid task_type",
        ),
        (
            json!({"task_type": "categorize_content", "parameters": {"table_name": "posts", "record_ids": []}})
                .to_string(),
            "record_ids",
        ),
        ("[1, 2".to_string(), "Invalid JSON body"),
    ];

    for (payload, expected) in cases {
        let (status, _, body) = send(&app, post(TASK_RUN, payload.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", payload);
        assert_eq!(body["success"], false);
        assert!(
            body["error"].as_str().unwrap().contains(expected),
            "{} -> {}",
            payload,
            body
        );
    }

    assert!(store.tasks().await.is_empty());
    assert_eq!(backend.complete_call_count(), 0);
}

#[tokio::test]
async fn test_task_run_success_returns_results() {
    let store = Arc::new(MemoryStore::new());
    store
        .seed("posts", [record("1", "Launch", "We shipped the new app")])
        .await;
    let backend = MockInferenceBackend::new()
        .with_fixed_response(r#"{"sentiment": "positive", "confidence": 0.9}"#);
    let app = app(&store, &backend);

    let payload = json!({
        "task_type": "sentiment_analysis",
        "parameters": {"table_name": "posts", "record_ids": ["1"]},
        "priority": "high"
    });
    let (status, headers, body) = send(&app, post(TASK_RUN, payload.to_string())).await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["results"]["total_processed"], 1);
    assert_eq!(body["results"]["sentiments"][0]["sentiment"], "positive");

    let task_id = body["task_id"].as_str().unwrap();
    let (status, _, task) = send(&app, get(&format!("/functions/v1/tasks/{}", task_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["status"], "completed");
    assert_eq!(task["priority"], "high");
}

#[tokio::test]
async fn test_task_run_failure_is_server_error_with_task_id() {
    let store = Arc::new(MemoryStore::new());
    let backend = MockInferenceBackend::new();
    let app = app(&store, &backend);

    let payload = json!({
        "task_type": "generate_summaries",
        "parameters": {"table_name": "missing_table", "record_ids": ["1"]}
    });
    let (status, _, body) = send(&app, post(TASK_RUN, payload.to_string())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["status"], "failed");
    assert!(body["error"].as_str().unwrap().contains("missing_table"));

    let tasks = store.tasks().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, TaskStatus::Failed);
    assert_eq!(body["task_id"], tasks[0].id.to_string());
}

#[tokio::test]
async fn test_task_lookup_and_listing() {
    let store = Arc::new(MemoryStore::new());
    store.seed("articles", Vec::new()).await;
    let app = app(&store, &MockInferenceBackend::new());

    let (status, _, body) = send(
        &app,
        get("/functions/v1/tasks/0192a7e4-0000-7000-8000-000000000000"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().is_some());

    for _ in 0..3 {
        let payload = json!({"task_type": "analyze_articles", "parameters": {}});
        let (status, _, _) = send(&app, post(TASK_RUN, payload.to_string())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _, body) = send(&app, get("/functions/v1/tasks?limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, _, body) = send(&app, get("/functions/v1/tasks")).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

/// Content table reader that blows up mid-request.
struct ExplodingContent;

#[async_trait::async_trait]
impl ContentRepository for ExplodingContent {
    async fn fetch_by_ids(&self, _table: &str, _ids: &[String]) -> Result<Vec<ContentRecord>> {
        panic!("content reader exploded")
    }

    async fn fetch_filtered(&self, _table: &str, _filters: &TaskFilters) -> Result<Vec<ContentRecord>> {
        panic!("content reader exploded")
    }
}

#[tokio::test]
async fn test_handler_panic_is_json_server_error_with_cors() {
    let store = Arc::new(MemoryStore::new());
    let backend = Arc::new(MockInferenceBackend::new());
    let generator = EmbeddingGenerator::new(store.clone(), backend.clone());
    let dispatcher = TaskDispatcher::new(store.clone(), Arc::new(ExplodingContent), backend);
    let app = router(AppState::new(generator, dispatcher));

    let payload = json!({
        "task_type": "sentiment_analysis",
        "parameters": {"table_name": "posts", "record_ids": ["1"]}
    });
    let (status, headers, body) = send(&app, post(TASK_RUN, payload.to_string())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(
        body,
        json!({"success": false, "error": "Internal server error"})
    );
}
