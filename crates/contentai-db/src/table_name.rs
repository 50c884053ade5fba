//! Validation of caller-supplied table names before they reach SQL text.
//!
//! Content tables are named by API callers, so the name is interpolated into
//! queries rather than bound as a parameter. Only plain identifiers, with an
//! optional `schema.` prefix, are accepted.

use once_cell::sync::Lazy;
use regex::Regex;

use contentai_core::{Error, Result};

static TABLE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z_][A-Za-z0-9_]{0,62}\.)?[A-Za-z_][A-Za-z0-9_]{0,62}$")
        .expect("table name pattern is valid")
});

/// Validate `name` and return it quoted for interpolation (`"schema"."table"`).
///
/// # Examples
///
/// ```
/// use contentai_db::quote_table_name;
///
/// assert_eq!(quote_table_name("articles").unwrap(), "\"articles\"");
/// assert_eq!(quote_table_name("cms.posts").unwrap(), "\"cms\".\"posts\"");
/// assert!(quote_table_name("articles; DROP TABLE x").is_err());
/// ```
pub fn quote_table_name(name: &str) -> Result<String> {
    if !TABLE_NAME.is_match(name) {
        return Err(Error::InvalidInput(format!(
            "Invalid table name '{}': expected an identifier such as 'articles' or 'schema.articles'",
            name
        )));
    }
    Ok(name
        .split('.')
        .map(|part| format!("\"{}\"", part))
        .collect::<Vec<_>>()
        .join("."))
}
