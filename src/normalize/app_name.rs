use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Collapse every whitespace run into a single underscore.
///
/// Used for both directory names and index lookups, so `"My  App"` and
/// `"My App"` address the same spec.
pub fn to_safe_name(raw: &str) -> String {
    WHITESPACE_RUN.replace_all(raw, "_").into_owned()
}
