//! Centralized default constants for contentai.
//!
//! Every crate reads shared defaults from here rather than repeating magic
//! numbers. Runtime overrides come from the environment (see `contentai-api`).

// =============================================================================
// CHUNKING
// =============================================================================

/// Characters per chunk for embedding input.
pub const CHUNK_SIZE: usize = 500;

/// Characters shared between adjacent chunks.
pub const CHUNK_OVERLAP: usize = 50;

// =============================================================================
// EMBEDDING
// =============================================================================

/// Embedding model requested for every chunk.
pub const EMBED_MODEL: &str = "text-embedding-3-small";

/// Vector dimension of [`EMBED_MODEL`].
pub const EMBED_DIMENSION: usize = 1536;

/// Source table recorded on every embedding chunk.
pub const EMBED_SOURCE_TABLE: &str = "content_items";

/// Source column recorded on every embedding chunk.
pub const EMBED_SOURCE_FIELD: &str = "body";

// =============================================================================
// COMPLETION
// =============================================================================

/// Chat-completion model used by all analysis operations.
pub const GEN_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature for analysis prompts.
pub const GEN_TEMPERATURE: f32 = 0.7;

/// Completion token ceiling.
pub const GEN_MAX_TOKENS: u32 = 4000;

// =============================================================================
// TASKS
// =============================================================================

/// Table read by `analyze_articles` when the caller names none.
pub const ARTICLES_TABLE: &str = "articles";

/// Categories offered to `categorize_content`, in prompt order.
///
/// `Other` is last and doubles as the fallback for failed or unrecognised answers.
pub const CATEGORIES: [&str; 10] = [
    "Education",
    "Health",
    "Environment",
    "Technology",
    "Social Issues",
    "Economy",
    "Culture",
    "Sports",
    "Politics",
    "Other",
];

/// Category assigned when nothing else applies.
pub const FALLBACK_CATEGORY: &str = "Other";

/// Title used for records without `title` or `name`.
pub const UNTITLED: &str = "Untitled";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_smaller_than_size() {
        assert!(CHUNK_OVERLAP < CHUNK_SIZE);
    }

    #[test]
    fn test_fallback_category_is_listed_last() {
        assert_eq!(CATEGORIES.last(), Some(&FALLBACK_CATEGORY));
    }
}
