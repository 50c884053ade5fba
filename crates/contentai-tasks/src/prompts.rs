//! System messages and prompt templates for the analysis operations.

use contentai_core::{defaults, ContentRecord, TextField};

pub const ANALYZE_SYSTEM: &str =
    "You are an expert content analyst. Provide detailed, actionable insights from article content.";
pub const SUMMARIZE_SYSTEM: &str =
    "You are an expert summarizer. Create concise, informative summaries.";
pub const INSIGHTS_SYSTEM: &str =
    "You are an expert data analyst. Extract meaningful insights from content.";
pub const CATEGORIZE_SYSTEM: &str =
    "You are a content categorization expert. Choose the most appropriate category.";
pub const SENTIMENT_SYSTEM: &str =
    "You are a sentiment analysis expert. Analyze text sentiment accurately.";

/// Text columns read by `analyze_articles`, in preference order.
pub const ARTICLE_TEXT: &[TextField] = &[TextField::Body, TextField::Lead];
/// Text columns read by `extract_insights`.
pub const INSIGHT_TEXT: &[TextField] = &[TextField::Description, TextField::Body];
/// Text columns read by `generate_summaries`.
pub const SUMMARY_TEXT: &[TextField] = &[TextField::Body, TextField::Description, TextField::Content];
/// Text columns read by the per-record classifiers.
pub const CLASSIFY_TEXT: &[TextField] = &[TextField::Description, TextField::Body];

const ANALYZE_INSTRUCTIONS: &str = r#"Please provide:
1. Main themes and topics
2. Sentiment analysis (positive, negative, neutral)
3. Key insights and trends
4. Recommendations for content strategy
5. Most engaging topics

Format your response as JSON with the following structure:
{
  "themes": ["theme1", "theme2"],
  "sentiment": {"positive": 0.6, "negative": 0.2, "neutral": 0.2},
  "insights": ["insight1", "insight2"],
  "recommendations": ["rec1", "rec2"],
  "top_topics": ["topic1", "topic2"]
}"#;

const INSIGHT_INSTRUCTIONS: &str = r#"Please provide:
1. Key trends and patterns
2. Important statistics or metrics
3. Notable quotes or statements
4. Actionable recommendations
5. Areas for further investigation

Format as JSON with this structure:
{
  "trends": ["trend1", "trend2"],
  "statistics": ["stat1", "stat2"],
  "quotes": ["quote1", "quote2"],
  "recommendations": ["rec1", "rec2"],
  "investigation_areas": ["area1", "area2"]
}"#;

const SENTIMENT_INSTRUCTIONS: &str = r#"Analyze the sentiment of the following content and respond with a JSON object containing:
    - sentiment: "positive", "negative", or "neutral"
    - confidence: a number between 0 and 1
    - reasoning: brief explanation"#;

/// One `Title / Content / ---` block per record, newline separated.
pub fn record_digest(records: &[ContentRecord], fields: &[TextField]) -> String {
    records
        .iter()
        .map(|r| {
            format!(
                "Title: {}\nContent: {}\n---",
                r.display_title().unwrap_or_default(),
                r.first_text(fields).unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Title and classifier text joined for per-record prompts.
pub fn classification_text(record: &ContentRecord) -> String {
    format!(
        "{} {}",
        record.display_title().unwrap_or_default(),
        record.first_text(CLASSIFY_TEXT).unwrap_or_default()
    )
}

pub fn analyze_articles(records: &[ContentRecord]) -> String {
    format!(
        "Analyze the following articles and provide insights:\n\n{}\n\n{}",
        record_digest(records, ARTICLE_TEXT),
        ANALYZE_INSTRUCTIONS
    )
}

pub fn extract_insights(records: &[ContentRecord]) -> String {
    format!(
        "Extract key insights from the following content:\n\n{}\n\n{}",
        record_digest(records, INSIGHT_TEXT),
        INSIGHT_INSTRUCTIONS
    )
}

pub fn summarize(content: &str) -> String {
    format!(
        "Summarize the following content in 2-3 sentences, focusing on the key points:\n\n{}",
        content
    )
}

pub fn categorize(content: &str) -> String {
    let options: String = defaults::CATEGORIES
        .iter()
        .map(|c| format!("\n    - {}", c))
        .collect();
    format!(
        "Categorize the following content into one of these categories: {}\n\nContent: {}\n\nRespond with only the category name.",
        options, content
    )
}

pub fn sentiment(content: &str) -> String {
    format!(
        "{}\n\nContent: {}\n\nRespond with only the JSON object.",
        SENTIMENT_INSTRUCTIONS, content
    )
}
