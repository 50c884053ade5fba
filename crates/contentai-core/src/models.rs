//! Domain models for content records, embedding chunks and analysis tasks.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::{Error, Result};

pub use pgvector::Vector;

// =============================================================================
// CONTENT RECORDS
// =============================================================================

/// A row of a platform content table.
///
/// Content tables are owned by the platform and vary in shape, so every field
/// except `id` is optional and unknown columns are ignored. Identifiers of any
/// JSON scalar type are normalized to strings. Optional columns holding a value
/// of an unexpected shape (a JSON document where text was expected, an integer
/// flag, a `date`) are coerced where the meaning is clear and read as `None`
/// otherwise, so one odd row never fails a whole fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_uuid")]
    pub org_id: Option<Uuid>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub lead: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub featured: Option<bool>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub published_at: Option<DateTime<Utc>>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl ContentRecord {
    /// `title`, falling back to `name`.
    pub fn display_title(&self) -> Option<&str> {
        non_empty(&self.title).or_else(|| non_empty(&self.name))
    }

    /// First non-empty text among `fields`, in order.
    pub fn first_text(&self, fields: &[TextField]) -> Option<&str> {
        fields.iter().find_map(|field| match field {
            TextField::Body => non_empty(&self.body),
            TextField::Lead => non_empty(&self.lead),
            TextField::Description => non_empty(&self.description),
            TextField::Content => non_empty(&self.content),
        })
    }
}

/// Text-bearing columns a content record may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Body,
    Lead,
    Description,
    Content,
}

fn scalar_id<E: serde::de::Error>(value: JsonValue) -> std::result::Result<String, E> {
    match value {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(E::custom(format!(
            "record id must be a string or number, got {}",
            other
        ))),
    }
}

fn id_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_id(JsonValue::deserialize(deserializer)?)
}

fn ids_as_strings<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<JsonValue>>::deserialize(deserializer)?
        .map(|ids| {
            ids.into_iter()
                .map(scalar_id)
                .collect::<std::result::Result<Vec<String>, D::Error>>()
        })
        .transpose()
}

/// Parse the timestamp spellings Postgres accepts for `timestamptz` input:
/// RFC 3339, an offset-less date-time (read as UTC) or a bare date (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::String(raw) => parse_timestamp(&raw),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Some(s),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::Bool(b) => Some(b),
        JsonValue::Number(n) => n.as_f64().map(|v| v != 0.0),
        JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" => Some(true),
            "false" | "f" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

fn lenient_uuid<'de, D>(deserializer: D) -> std::result::Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Uuid::parse_str(&s).ok(),
        _ => None,
    })
}

/// Filter bounds must parse; an unreadable bound is the caller's mistake.
fn filter_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    parse_timestamp(&raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

/// Payload of the embedding trigger: the record whose body should be embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSource {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub org_id: Uuid,
    #[serde(default)]
    pub body: Option<String>,
}

// =============================================================================
// EMBEDDING CHUNKS
// =============================================================================

/// One embedded window of a content record's text, as stored.
#[derive(Debug, Clone)]
pub struct EmbeddingChunk {
    pub id: Uuid,
    pub org_id: Uuid,
    pub content: String,
    pub embedding: Vector,
    pub source_table: String,
    pub source_field: String,
    pub source_record_id: String,
    pub chunk_ix: i32,
    pub created_at: DateTime<Utc>,
}

/// An embedding chunk ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewEmbeddingChunk {
    pub org_id: Uuid,
    pub content: String,
    pub embedding: Vector,
    pub source_table: String,
    pub source_field: String,
    pub source_record_id: String,
    pub chunk_ix: i32,
}

// =============================================================================
// TASKS
// =============================================================================

/// The closed set of analysis operations a task can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Themes, sentiment mix and recommendations over a filtered batch of articles.
    AnalyzeArticles,
    /// A short summary per explicitly listed record.
    GenerateSummaries,
    /// Trends, statistics and quotes over a filtered batch of records.
    ExtractInsights,
    /// One category per explicitly listed record.
    CategorizeContent,
    /// Sentiment label and confidence per explicitly listed record.
    SentimentAnalysis,
}

impl TaskType {
    pub const ALL: [TaskType; 5] = [
        TaskType::AnalyzeArticles,
        TaskType::GenerateSummaries,
        TaskType::ExtractInsights,
        TaskType::CategorizeContent,
        TaskType::SentimentAnalysis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::AnalyzeArticles => "analyze_articles",
            TaskType::GenerateSummaries => "generate_summaries",
            TaskType::ExtractInsights => "extract_insights",
            TaskType::CategorizeContent => "categorize_content",
            TaskType::SentimentAnalysis => "sentiment_analysis",
        }
    }

    /// Whether the operation works on an explicit `record_ids` list.
    pub fn requires_record_ids(&self) -> bool {
        match self {
            TaskType::GenerateSummaries
            | TaskType::CategorizeContent
            | TaskType::SentimentAnalysis => true,
            TaskType::AnalyzeArticles | TaskType::ExtractInsights => false,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = TaskType::ALL.iter().map(TaskType::as_str).collect();
                Error::InvalidInput(format!(
                    "Invalid task_type. Must be one of: {}",
                    valid.join(", ")
                ))
            })
    }
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Processing)
                | (TaskStatus::Processing, TaskStatus::Completed)
                | (TaskStatus::Processing, TaskStatus::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "processing" => Ok(TaskStatus::Processing),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(Error::Serialization(format!("Unknown task status: {}", other))),
        }
    }
}

/// Caller-assigned urgency of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Normal,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Normal => "normal",
            TaskPriority::High => "high",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "normal" => Ok(TaskPriority::Normal),
            "high" => Ok(TaskPriority::High),
            other => Err(Error::InvalidInput(format!(
                "Invalid priority '{}'. Must be one of: low, normal, high",
                other
            ))),
        }
    }
}

/// Record filters understood by the batch operations.
///
/// `status`, `date_from`, `date_to` apply to `analyze_articles`;
/// `category` and `featured` to `extract_insights`; `limit` to both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(
        default,
        deserialize_with = "filter_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_from: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "filter_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_to: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

/// Structured view of a task's `parameters` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "ids_as_strings",
        skip_serializing_if = "Option::is_none"
    )]
    pub record_ids: Option<Vec<String>>,
    #[serde(default)]
    pub filters: TaskFilters,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub options: serde_json::Map<String, JsonValue>,
}

impl TaskParameters {
    /// The explicit record list, or an error naming the operation that needs it.
    pub fn required_record_ids(&self, purpose: &str) -> Result<&[String]> {
        match self.record_ids.as_deref() {
            Some(ids) if !ids.is_empty() => Ok(ids),
            _ => Err(Error::InvalidInput(format!(
                "record_ids is required for {}",
                purpose
            ))),
        }
    }

    /// The caller's table, or an error when the operation has no default.
    pub fn required_table(&self) -> Result<&str> {
        self.table_name
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::InvalidInput("table_name is required".to_string()))
    }
}

/// A durable record of one requested analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub task_type: TaskType,
    pub parameters: JsonValue,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub results: Option<JsonValue>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields needed to create a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub task_type: TaskType,
    pub parameters: JsonValue,
    pub priority: TaskPriority,
}
