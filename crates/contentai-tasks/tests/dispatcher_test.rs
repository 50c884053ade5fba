//! End-to-end dispatcher tests against the in-memory store and mock backend.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use contentai_db::MemoryStore;
use contentai_inference::mock::MockInferenceBackend;

use contentai_tasks::{
    CompletionOptions, ContentRecord, Error, NewTask, Task, TaskDispatcher, TaskRepository,
    TaskRequest, TaskStatus,
};

fn record(id: &str, title: &str, body: &str) -> ContentRecord {
    ContentRecord {
        id: id.to_string(),
        title: Some(title.to_string()),
        body: Some(body.to_string()),
        ..Default::default()
    }
}

fn dispatcher(store: &Arc<MemoryStore>, backend: &MockInferenceBackend) -> TaskDispatcher {
    TaskDispatcher::new(store.clone(), store.clone(), Arc::new(backend.clone()))
}

fn request(body: JsonValue) -> TaskRequest {
    TaskRequest::from_json(&body).expect("valid request")
}

const ANALYSIS: &str = r#"```json
{
  "themes": ["local politics"],
  "sentiment": {"positive": 0.5, "negative": 0.25, "neutral": 0.25},
  "insights": ["budget debates drive traffic"],
  "recommendations": ["cover committee meetings"],
  "top_topics": ["budget"]
}
```"#;

#[tokio::test]
async fn test_analyze_articles_completes_with_parsed_analysis() {
    let store = Arc::new(MemoryStore::new());
    let mut draft = record("3", "Draft", "Not yet");
    draft.status = Some("draft".to_string());
    let mut published = record("1", "Budget vote", "Council approved the budget.");
    published.status = Some("published".to_string());
    let mut lead_only = record("2", "Parks", "");
    lead_only.status = Some("published".to_string());
    lead_only.lead = Some("New park opens".to_string());
    store.seed("articles", [published, lead_only, draft]).await;

    let backend = MockInferenceBackend::new().with_fixed_response(ANALYSIS);
    let outcome = dispatcher(&store, &backend)
        .submit(request(json!({
            "task_type": "analyze_articles",
            "parameters": {"filters": {"status": "published"}}
        })))
        .await
        .unwrap();

    assert!(outcome.is_success(), "{:?}", outcome.error);
    let results = outcome.results.clone().unwrap();
    assert_eq!(results["articles_analyzed"], 2);
    assert_eq!(results["analysis"]["top_topics"][0], "budget");
    assert!(results["timestamp"].as_str().unwrap().ends_with('Z'));

    let calls = backend.get_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].system.as_deref(),
        Some("You are an expert content analyst. Provide detailed, actionable insights from article content.")
    );
    assert!(calls[0].input.contains(
        "Title: Budget vote\nContent: Council approved the budget.\n---\nTitle: Parks\nContent: New park opens\n---"
    ));
    assert!(!calls[0].input.contains("Draft"));

    let task = store.get(outcome.task_id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.results, Some(results));
    assert!(task.error_message.is_none());
    assert!(task.updated_at.is_some());
}

#[tokio::test]
async fn test_analyze_date_range_without_matches_is_not_a_failure() {
    let store = Arc::new(MemoryStore::new());
    let mut old = record("1", "Old", "Archive");
    old.published_at = Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    store.seed("articles", [old]).await;

    let backend = MockInferenceBackend::new();
    let outcome = dispatcher(&store, &backend)
        .submit(request(json!({
            "task_type": "analyze_articles",
            "parameters": {"filters": {"date_from": "2024-01-01T00:00:00Z"}}
        })))
        .await
        .unwrap();

    assert_eq!(outcome.status, TaskStatus::Completed);
    assert_eq!(
        outcome.results,
        Some(json!({"message": "No articles found for analysis"}))
    );
    assert_eq!(backend.complete_call_count(), 0);
}

#[tokio::test]
async fn test_analyze_accepts_bare_date_range() {
    let store = Arc::new(MemoryStore::new());
    let published = |id: &str, title: &str, day: u32| {
        let mut r = record(id, title, "Text");
        r.published_at = Some(Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap());
        r
    };
    store
        .seed(
            "articles",
            [
                published("1", "Early", 1),
                published("2", "Inside", 10),
                published("3", "Late", 25),
            ],
        )
        .await;

    let backend = MockInferenceBackend::new().with_fixed_response(ANALYSIS);
    let outcome = dispatcher(&store, &backend)
        .submit(request(json!({
            "task_type": "analyze_articles",
            "parameters": {"filters": {"date_from": "2024-03-05", "date_to": "2024-03-20"}}
        })))
        .await
        .unwrap();

    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert_eq!(outcome.results.unwrap()["articles_analyzed"], 1);
    let calls = backend.get_calls();
    assert!(calls[0].input.contains("Title: Inside"));
    assert!(!calls[0].input.contains("Early"));
    assert!(!calls[0].input.contains("Late"));
}

#[tokio::test]
async fn test_unparsable_batch_reply_fails_task() {
    let store = Arc::new(MemoryStore::new());
    store.seed("articles", [record("1", "T", "B")]).await;

    let backend = MockInferenceBackend::new().with_fixed_response("Here are some thoughts...");
    let outcome = dispatcher(&store, &backend)
        .submit(request(json!({"task_type": "analyze_articles", "parameters": {}})))
        .await
        .unwrap();

    assert_eq!(outcome.status, TaskStatus::Failed);
    let error = outcome.error.clone().unwrap();
    assert!(error.starts_with("Parse error"), "{}", error);

    let task = store.get(outcome.task_id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.error_message, Some(error));
    assert!(task.results.is_none());
}

#[tokio::test]
async fn test_missing_table_fails_task_with_store_message() {
    let store = Arc::new(MemoryStore::new());
    let backend = MockInferenceBackend::new();
    let outcome = dispatcher(&store, &backend)
        .submit(request(json!({"task_type": "analyze_articles", "parameters": {}})))
        .await
        .unwrap();

    assert_eq!(outcome.status, TaskStatus::Failed);
    assert!(outcome
        .error
        .unwrap()
        .contains("relation \"articles\" does not exist"));
}

#[tokio::test]
async fn test_extract_insights_applies_category_and_featured() {
    let store = Arc::new(MemoryStore::new());
    let mut featured = record("1", "Clinic", "Body text");
    featured.category = Some("Health".to_string());
    featured.featured = Some(true);
    featured.description = Some("Free clinic expands hours".to_string());
    let mut plain = featured.clone();
    plain.id = "2".to_string();
    plain.featured = Some(false);
    store.seed("projects", [featured, plain]).await;

    let backend = MockInferenceBackend::new().with_fixed_response(
        r#"{"trends": ["access"], "statistics": [], "quotes": [], "recommendations": [], "investigation_areas": []}"#,
    );
    let outcome = dispatcher(&store, &backend)
        .submit(request(json!({
            "task_type": "extract_insights",
            "parameters": {
                "table_name": "projects",
                "filters": {"category": "Health", "featured": true}
            }
        })))
        .await
        .unwrap();

    let results = outcome.results.unwrap();
    assert_eq!(results["records_analyzed"], 1);
    assert_eq!(results["insights"]["trends"][0], "access");
    assert!(backend.get_calls()[0]
        .input
        .contains("Title: Clinic\nContent: Free clinic expands hours\n---"));
}

#[tokio::test]
async fn test_summaries_isolate_failures_in_input_order() {
    let store = Arc::new(MemoryStore::new());
    let empty = ContentRecord {
        id: "4".to_string(),
        name: Some("Nameless".to_string()),
        ..Default::default()
    };
    store
        .seed(
            "projects",
            [
                record("1", "First", "alpha content"),
                record("2", "Second", "poison content"),
                record("3", "", "gamma content"),
                empty,
            ],
        )
        .await;

    let backend = MockInferenceBackend::new()
        .with_failure_when("poison", "model overloaded")
        .with_fixed_response("  A short summary.  ");
    let outcome = dispatcher(&store, &backend)
        .submit(request(json!({
            "task_type": "generate_summaries",
            "parameters": {"table_name": "projects", "record_ids": ["3", "2", "4", "1"]}
        })))
        .await
        .unwrap();

    assert_eq!(outcome.status, TaskStatus::Completed);
    let results = outcome.results.unwrap();
    assert_eq!(results["total_processed"], 4);
    assert_eq!(
        results["summaries"],
        json!([
            {"id": "3", "title": "Untitled", "summary": "A short summary.", "word_count": 13},
            {"id": "2", "summary": "Failed to generate summary", "error": "Inference error: model overloaded"},
            {"id": "4", "summary": "No content available for summarization", "error": "Empty content"},
            {"id": "1", "title": "First", "summary": "A short summary.", "word_count": 13}
        ])
    );
    // The empty record never reaches the API.
    assert_eq!(backend.complete_call_count(), 3);
}

#[tokio::test]
async fn test_categorize_normalizes_answers() {
    let store = Arc::new(MemoryStore::new());
    store
        .seed(
            "projects",
            [
                record("1", "Robotics club", "robots"),
                record("2", "Allotments", "gardening"),
                record("3", "Outage", "broken"),
            ],
        )
        .await;

    let backend = MockInferenceBackend::new()
        .with_response_when("Robotics", " technology\n")
        .with_response_when("Allotments", "Gardening")
        .with_failure_when("Outage", "timeout");
    let outcome = dispatcher(&store, &backend)
        .submit(request(json!({
            "task_type": "categorize_content",
            "parameters": {"table_name": "projects", "record_ids": [1, 2, 3]}
        })))
        .await
        .unwrap();

    let categories = outcome.results.unwrap()["categories"].clone();
    assert_eq!(
        categories,
        json!([
            {"id": "1", "title": "Robotics club", "suggested_category": "Technology", "confidence": "high"},
            {"id": "2", "title": "Allotments", "suggested_category": "Other", "confidence": "high"},
            {"id": "3", "title": "Outage", "suggested_category": "Other", "error": "Inference error: timeout"}
        ])
    );

    let calls = backend.get_calls();
    let prompt = &calls[0].input;
    assert!(prompt.contains("Content: Robotics club robots"));
    assert!(prompt.contains("    - Social Issues"));
}

#[tokio::test]
async fn test_sentiment_validates_replies() {
    let store = Arc::new(MemoryStore::new());
    store
        .seed(
            "projects",
            [record("a", "Good news", "x"), record("b", "Odd news", "y")],
        )
        .await;

    let backend = MockInferenceBackend::new()
        .with_response_when(
            "Good news",
            r#"{"sentiment": "positive", "confidence": 0.75, "reasoning": "celebratory"}"#,
        )
        .with_response_when("Odd news", r#"{"sentiment": "bemused", "confidence": 0.4}"#);
    let outcome = dispatcher(&store, &backend)
        .submit(request(json!({
            "task_type": "sentiment_analysis",
            "parameters": {"table_name": "projects", "record_ids": ["a", "b"]}
        })))
        .await
        .unwrap();

    let results = outcome.results.unwrap();
    let sentiments = results["sentiments"].as_array().unwrap();
    assert_eq!(sentiments[0]["sentiment"], "positive");
    assert_eq!(sentiments[0]["confidence"], 0.75);
    assert_eq!(sentiments[0]["reasoning"], "celebratory");
    assert_eq!(sentiments[1]["sentiment"], "neutral");
    assert_eq!(sentiments[1]["confidence"], 0.0);
    assert!(sentiments[1]["error"]
        .as_str()
        .unwrap()
        .starts_with("Parse error"));
    assert_eq!(results["total_processed"], 2);
}

#[tokio::test]
async fn test_unknown_and_duplicate_ids_are_skipped() {
    let store = Arc::new(MemoryStore::new());
    store
        .seed("projects", [record("1", "One", "x"), record("3", "Three", "y")])
        .await;

    let backend = MockInferenceBackend::new().with_fixed_response("Culture");
    let outcome = dispatcher(&store, &backend)
        .submit(request(json!({
            "task_type": "categorize_content",
            "parameters": {"table_name": "projects", "record_ids": ["3", "missing", "1", "3"]}
        })))
        .await
        .unwrap();

    let results = outcome.results.unwrap();
    let ids: Vec<&str> = results["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["3", "1"]);
    assert_eq!(results["total_processed"], 2);
}

#[tokio::test]
async fn test_rejected_request_creates_no_task() {
    let store = Arc::new(MemoryStore::new());
    let err = TaskRequest::from_json(&json!({
        "task_type": "categorize_content",
        "parameters": {"table_name": "projects", "record_ids": []}
    }))
    .unwrap_err();
    assert!(err.is_validation());
    assert!(store.tasks().await.is_empty());
}

#[tokio::test]
async fn test_completion_options_are_forwarded() {
    let store = Arc::new(MemoryStore::new());
    store.seed("projects", [record("1", "One", "x")]).await;

    let backend = MockInferenceBackend::new().with_fixed_response("Health");
    let options = CompletionOptions {
        temperature: 0.1,
        max_tokens: 16,
    };
    dispatcher(&store, &backend)
        .with_completion_options(options)
        .submit(request(json!({
            "task_type": "categorize_content",
            "parameters": {"table_name": "projects", "record_ids": ["1"]}
        })))
        .await
        .unwrap();

    assert_eq!(backend.get_calls()[0].options, Some(options));
}

#[tokio::test]
async fn test_every_task_reaches_a_terminal_state() {
    let store = Arc::new(MemoryStore::new());
    store.seed("articles", [record("1", "T", "B")]).await;
    let backend = MockInferenceBackend::new().with_fixed_response("{}");
    let dispatcher = dispatcher(&store, &backend);

    for params in [json!({}), json!({"table_name": "nowhere"})] {
        dispatcher
            .submit(request(json!({"task_type": "analyze_articles", "parameters": params})))
            .await
            .unwrap();
    }

    let tasks = store.tasks().await;
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].status, TaskStatus::Completed);
    assert_eq!(tasks[1].status, TaskStatus::Failed);
    assert_eq!(tasks[1].parameters, json!({"table_name": "nowhere"}));
}

/// Task store whose `pending → processing` transition always fails.
struct StuckTasks(Arc<MemoryStore>);

#[async_trait::async_trait]
impl TaskRepository for StuckTasks {
    async fn create(&self, task: NewTask) -> contentai_tasks::Result<Task> {
        self.0.create(task).await
    }

    async fn mark_processing(&self, _task_id: Uuid) -> contentai_tasks::Result<()> {
        Err(Error::Internal("connection reset".to_string()))
    }

    async fn complete(&self, task_id: Uuid, results: JsonValue) -> contentai_tasks::Result<()> {
        self.0.complete(task_id, results).await
    }

    async fn fail(&self, task_id: Uuid, error: &str) -> contentai_tasks::Result<()> {
        self.0.fail(task_id, error).await
    }

    async fn get(&self, task_id: Uuid) -> contentai_tasks::Result<Option<Task>> {
        self.0.get(task_id).await
    }

    async fn list_recent(&self, limit: i64) -> contentai_tasks::Result<Vec<Task>> {
        self.0.list_recent(limit).await
    }
}

#[tokio::test]
async fn test_lost_processing_transition_names_the_stranded_task() {
    let store = Arc::new(MemoryStore::new());
    store.seed("articles", [record("1", "T", "B")]).await;
    let backend = MockInferenceBackend::new().with_fixed_response(ANALYSIS);
    let dispatcher = TaskDispatcher::new(
        Arc::new(StuckTasks(store.clone())),
        store.clone(),
        Arc::new(backend.clone()),
    );

    let err = dispatcher
        .submit(request(json!({"task_type": "analyze_articles", "parameters": {}})))
        .await
        .unwrap_err();

    let tasks = store.tasks().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, TaskStatus::Pending);
    let msg = err.to_string();
    assert!(msg.contains(&tasks[0].id.to_string()), "{}", msg);
    assert!(msg.contains("connection reset"), "{}", msg);
    assert_eq!(backend.complete_call_count(), 0);
}
