//! The five content-analysis operations.
//!
//! Batch operations (`analyze_articles`, `extract_insights`) make one call
//! over every fetched record and fail as a whole. Per-record operations
//! (`generate_summaries`, `categorize_content`, `sentiment_analysis`) make one
//! call per record and report failures inline.

use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use contentai_core::{defaults, ContentRecord, Error, Result, TaskFilters, TaskParameters, TaskType};

use crate::parse::{self, Sentiment, SentimentReply};
use crate::pipeline::{fold_records, timestamp, AnalysisPipeline, OperationContext, RecordSource};
use crate::prompts;

const ANALYZE: AnalysisPipeline<[ContentRecord], JsonValue> = AnalysisPipeline {
    name: "analyze_articles",
    system_prompt: prompts::ANALYZE_SYSTEM,
    render: prompts::analyze_articles,
    parse: parse::parse_json_object,
};

const INSIGHTS: AnalysisPipeline<[ContentRecord], JsonValue> = AnalysisPipeline {
    name: "extract_insights",
    system_prompt: prompts::INSIGHTS_SYSTEM,
    render: prompts::extract_insights,
    parse: parse::parse_json_object,
};

const SUMMARIZE: AnalysisPipeline<str, String> = AnalysisPipeline {
    name: "generate_summaries",
    system_prompt: prompts::SUMMARIZE_SYSTEM,
    render: prompts::summarize,
    parse: trimmed,
};

const CATEGORIZE: AnalysisPipeline<str, &'static str> = AnalysisPipeline {
    name: "categorize_content",
    system_prompt: prompts::CATEGORIZE_SYSTEM,
    render: prompts::categorize,
    parse: category,
};

const SENTIMENT: AnalysisPipeline<str, SentimentReply> = AnalysisPipeline {
    name: "sentiment_analysis",
    system_prompt: prompts::SENTIMENT_SYSTEM,
    render: prompts::sentiment,
    parse: parse::parse_sentiment,
};

fn trimmed(reply: &str) -> Result<String> {
    Ok(reply.trim().to_string())
}

fn category(reply: &str) -> Result<&'static str> {
    Ok(parse::normalize_category(reply))
}

/// What `record_ids` is needed for, as worded in validation errors.
pub fn record_ids_purpose(task_type: TaskType) -> &'static str {
    match task_type {
        TaskType::GenerateSummaries => "summary generation",
        TaskType::CategorizeContent => "categorization",
        TaskType::SentimentAnalysis => "sentiment analysis",
        TaskType::AnalyzeArticles => "article analysis",
        TaskType::ExtractInsights => "insight extraction",
    }
}

/// The table an operation reads.
///
/// `analyze_articles` defaults to the articles table; every other operation
/// needs the caller to name one.
pub fn source_table(task_type: TaskType, params: &TaskParameters) -> Result<&str> {
    match task_type {
        TaskType::AnalyzeArticles => Ok(params
            .table_name
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(defaults::ARTICLES_TABLE)),
        _ => params.required_table(),
    }
}

// =============================================================================
// BATCH OPERATIONS
// =============================================================================

pub async fn analyze_articles(ctx: &OperationContext<'_>, params: &TaskParameters) -> Result<JsonValue> {
    let table = source_table(TaskType::AnalyzeArticles, params)?;
    let filters = batch_filters(params, true);

    Ok(
        match ANALYZE
            .run_batch(ctx, table, RecordSource::Filtered(&filters))
            .await?
        {
            None => json!({ "message": "No articles found for analysis" }),
            Some((count, analysis)) => json!({
                "articles_analyzed": count,
                "analysis": analysis,
                "timestamp": timestamp(),
            }),
        },
    )
}

pub async fn extract_insights(ctx: &OperationContext<'_>, params: &TaskParameters) -> Result<JsonValue> {
    let table = source_table(TaskType::ExtractInsights, params)?;
    let filters = batch_filters(params, false);

    Ok(
        match INSIGHTS
            .run_batch(ctx, table, RecordSource::Filtered(&filters))
            .await?
        {
            None => json!({ "message": "No records found for insight extraction" }),
            Some((count, insights)) => json!({
                "records_analyzed": count,
                "insights": insights,
                "timestamp": timestamp(),
            }),
        },
    )
}

// Each batch operation honours its own subset of the filters.
fn batch_filters(params: &TaskParameters, articles: bool) -> TaskFilters {
    let f = &params.filters;
    if articles {
        TaskFilters {
            status: f.status.clone(),
            date_from: f.date_from,
            date_to: f.date_to,
            limit: f.limit,
            ..Default::default()
        }
    } else {
        TaskFilters {
            category: f.category.clone(),
            featured: f.featured,
            limit: f.limit,
            ..Default::default()
        }
    }
}

// =============================================================================
// PER-RECORD OPERATIONS
// =============================================================================

#[derive(Debug, Serialize)]
struct SummaryEntry {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    word_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct CategoryEntry {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    suggested_category: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct SentimentEntry {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    sentiment: Sentiment,
    confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn title_of(record: &ContentRecord) -> Option<String> {
    record.display_title().map(str::to_string)
}

async fn fetch_listed(
    ctx: &OperationContext<'_>,
    task_type: TaskType,
    params: &TaskParameters,
) -> Result<Vec<ContentRecord>> {
    let ids = params.required_record_ids(record_ids_purpose(task_type))?;
    let table = source_table(task_type, params)?;
    RecordSource::Ids(ids).fetch(ctx, table).await
}

fn per_record_result<T: Serialize>(key: &str, entries: Vec<T>) -> Result<JsonValue> {
    let total = entries.len();
    Ok(json!({
        key: serde_json::to_value(entries)?,
        "total_processed": total,
        "timestamp": timestamp(),
    }))
}

pub async fn generate_summaries(ctx: &OperationContext<'_>, params: &TaskParameters) -> Result<JsonValue> {
    let records = fetch_listed(ctx, TaskType::GenerateSummaries, params).await?;

    let entries = fold_records(
        &records,
        |record| async move {
            let Some(content) = record.first_text(prompts::SUMMARY_TEXT) else {
                return Ok(SummaryEntry {
                    id: record.id.clone(),
                    title: None,
                    summary: "No content available for summarization".to_string(),
                    word_count: None,
                    error: Some("Empty content".to_string()),
                });
            };
            let summary = SUMMARIZE.call(ctx, content).await?;
            Ok::<_, Error>(SummaryEntry {
                id: record.id.clone(),
                title: Some(
                    record
                        .display_title()
                        .unwrap_or(defaults::UNTITLED)
                        .to_string(),
                ),
                summary,
                word_count: Some(content.chars().count()),
                error: None,
            })
        },
        |record, e| SummaryEntry {
            id: record.id.clone(),
            title: None,
            summary: "Failed to generate summary".to_string(),
            word_count: None,
            error: Some(e.to_string()),
        },
    )
    .await;

    per_record_result("summaries", entries)
}

pub async fn categorize_content(ctx: &OperationContext<'_>, params: &TaskParameters) -> Result<JsonValue> {
    let records = fetch_listed(ctx, TaskType::CategorizeContent, params).await?;

    let entries = fold_records(
        &records,
        |record| async move {
            let suggested = CATEGORIZE
                .call(ctx, &prompts::classification_text(record))
                .await?;
            Ok::<_, Error>(CategoryEntry {
                id: record.id.clone(),
                title: title_of(record),
                suggested_category: suggested,
                confidence: Some("high"),
                error: None,
            })
        },
        |record, e| CategoryEntry {
            id: record.id.clone(),
            title: title_of(record),
            suggested_category: defaults::FALLBACK_CATEGORY,
            confidence: None,
            error: Some(e.to_string()),
        },
    )
    .await;

    per_record_result("categories", entries)
}

pub async fn sentiment_analysis(ctx: &OperationContext<'_>, params: &TaskParameters) -> Result<JsonValue> {
    let records = fetch_listed(ctx, TaskType::SentimentAnalysis, params).await?;

    let entries = fold_records(
        &records,
        |record| async move {
            let reply = SENTIMENT
                .call(ctx, &prompts::classification_text(record))
                .await?;
            Ok::<_, Error>(SentimentEntry {
                id: record.id.clone(),
                title: title_of(record),
                sentiment: reply.sentiment,
                confidence: reply.confidence,
                reasoning: reply.reasoning,
                error: None,
            })
        },
        |record, e| SentimentEntry {
            id: record.id.clone(),
            title: title_of(record),
            sentiment: Sentiment::Neutral,
            confidence: 0.0,
            reasoning: None,
            error: Some(e.to_string()),
        },
    )
    .await;

    per_record_result("sentiments", entries)
}
