//! Interpretation of chat-completion replies.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use contentai_core::{defaults, Error, Result};

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?```\s*$")
        .expect("code fence pattern is valid")
});

/// Strip a surrounding Markdown code fence, if any.
///
/// ```
/// use contentai_tasks::parse::strip_code_fence;
///
/// assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(strip_code_fence("  plain  "), "plain");
/// ```
pub fn strip_code_fence(reply: &str) -> &str {
    match CODE_FENCE.captures(reply).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => reply.trim(),
    }
}

/// Parse a reply that must be a JSON object.
pub fn parse_json_object(reply: &str) -> Result<JsonValue> {
    let value: JsonValue = serde_json::from_str(strip_code_fence(reply))
        .map_err(|e| Error::Parse(format!("Completion is not valid JSON: {}", e)))?;
    if !value.is_object() {
        return Err(Error::Parse(
            "Completion JSON is not an object".to_string(),
        ));
    }
    Ok(value)
}

/// Map a free-text answer onto the fixed category list.
///
/// Matching ignores case, surrounding whitespace, quotes and a trailing
/// period. Anything else becomes the fallback category.
pub fn normalize_category(answer: &str) -> &'static str {
    let cleaned = answer
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim_end_matches('.')
        .trim();
    defaults::CATEGORIES
        .iter()
        .find(|c| c.eq_ignore_ascii_case(cleaned))
        .copied()
        .unwrap_or(defaults::FALLBACK_CATEGORY)
}

/// Sentiment label of a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Validated sentiment reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SentimentReply {
    pub sentiment: Sentiment,
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Parse a sentiment reply, rejecting unknown labels and out-of-range confidence.
pub fn parse_sentiment(reply: &str) -> Result<SentimentReply> {
    let parsed: SentimentReply = serde_json::from_str(strip_code_fence(reply))
        .map_err(|e| Error::Parse(format!("Invalid sentiment reply: {}", e)))?;
    if !(0.0..=1.0).contains(&parsed.confidence) {
        return Err(Error::Parse(format!(
            "Sentiment confidence {} is outside [0, 1]",
            parsed.confidence
        )));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```json\r\n{}\r\n```\n"), "{}");
        assert_eq!(strip_code_fence("{\"k\": \"```\"}"), "{\"k\": \"```\"}");
    }

    #[test]
    fn test_parse_json_object() {
        let value = parse_json_object("```json\n{\"themes\": [\"a\"]}\n```").unwrap();
        assert_eq!(value["themes"][0], "a");

        assert!(matches!(parse_json_object("not json"), Err(Error::Parse(_))));
        assert!(matches!(parse_json_object("[1, 2]"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category("  technology\n"), "Technology");
        assert_eq!(normalize_category("\"Social Issues\"."), "Social Issues");
        assert_eq!(normalize_category("SPORTS"), "Sports");
        assert_eq!(normalize_category("Gardening"), "Other");
        assert_eq!(normalize_category(""), "Other");
    }

    #[test]
    fn test_parse_sentiment() {
        let reply = parse_sentiment(
            r#"{"sentiment": "positive", "confidence": 0.92, "reasoning": "upbeat"}"#,
        )
        .unwrap();
        assert_eq!(reply.sentiment, Sentiment::Positive);
        assert_eq!(reply.reasoning.as_deref(), Some("upbeat"));

        let no_reasoning = parse_sentiment(r#"{"sentiment": "neutral", "confidence": 0}"#).unwrap();
        assert!(no_reasoning.reasoning.is_none());
    }

    #[test]
    fn test_parse_sentiment_rejects_invalid() {
        for bad in [
            r#"{"sentiment": "ecstatic", "confidence": 0.5}"#,
            r#"{"sentiment": "negative", "confidence": 1.5}"#,
            r#"{"sentiment": "negative"}"#,
            "negative",
        ] {
            assert!(matches!(parse_sentiment(bad), Err(Error::Parse(_))), "{}", bad);
        }
    }
}
