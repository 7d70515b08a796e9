//! Parser-Context Classifiers
//!
//! Pure predicates over the text preceding a match. Every classifier returns
//! `false` on ambiguity; the calling rule then leaves the match unchanged.

use crate::constants::classify::NEAR_START_THRESHOLD;
use crate::scan::{StringBoundaryChecker, find_unmatched_open};

/// Whether the match site follows a JSON delimiter (`}`, `]`, `,`) or sits
/// near the start of the input
pub fn is_after_json_delimiter(before_match: &str, offset: usize) -> bool {
    if offset <= NEAR_START_THRESHOLD {
        return true;
    }
    matches!(
        before_match.trim_end().chars().last(),
        Some('}') | Some(']') | Some(',')
    )
}

/// Whether a property name is expected at the match site: the preceding text
/// ends in `{`, `,`, or a newline-indent continuing such a line
pub fn is_in_property_context(before_match: &str) -> bool {
    let trimmed = before_match.trim_end();
    if trimmed.is_empty() {
        return false;
    }
    trimmed.ends_with('{') || trimmed.ends_with(',')
}

/// Shallow array-context heuristic over the lookback window: the preceding
/// text ends in `[`, or ends in `,` with an unclosed `[` still pending
pub fn is_in_array_context(before_match: &str) -> bool {
    let trimmed = before_match.trim_end();
    if trimmed.ends_with('[') {
        return true;
    }
    if !trimmed.ends_with(',') {
        return false;
    }

    // Unclosed '[' after the last structural close wins the tie
    let last_open = trimmed.rfind('[');
    let last_close = trimmed.rfind(']');
    let last_brace = trimmed.rfind('{');
    match (last_open, last_close) {
        (Some(open), close) if close.is_none_or(|c| c < open) => {
            // An intervening '{' means an object element is open instead
            last_brace.is_none_or(|b| b < open)
        }
        _ => false,
    }
}

/// Deep array-context check: balance delimiters backward from `offset` until
/// an unmatched opener appears. `[` confirms array context, `{` (or nothing)
/// rejects it.
pub fn is_in_array_context_deep(
    content: &str,
    offset: usize,
    checker: &StringBoundaryChecker,
) -> bool {
    find_unmatched_open(content, offset, checker) == Some('[')
}

/// Deep object-context check, the dual of [`is_in_array_context_deep`]
pub fn is_in_object_context_deep(
    content: &str,
    offset: usize,
    checker: &StringBoundaryChecker,
) -> bool {
    find_unmatched_open(content, offset, checker) == Some('{')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_after_delimiter() {
        assert!(is_after_json_delimiter("{\"a\": 1},\n", 100));
        assert!(is_after_json_delimiter("[1, 2]\n", 100));
        assert!(is_after_json_delimiter("\"a\": 1,\n  ", 100));
        assert!(!is_after_json_delimiter("\"a\": 1\n", 100));
    }

    #[test]
    fn test_near_start_counts_as_delimiter() {
        assert!(is_after_json_delimiter("", 0));
        assert!(is_after_json_delimiter("x", 5));
        assert!(!is_after_json_delimiter("some text", 50));
    }

    #[test]
    fn test_property_context() {
        assert!(is_in_property_context("{\n  "));
        assert!(is_in_property_context("\"a\": 1,\n  "));
        assert!(!is_in_property_context("[\n  "));
        assert!(!is_in_property_context(""));
    }

    #[test]
    fn test_shallow_array_context() {
        assert!(is_in_array_context("\"items\": [\n  "));
        assert!(is_in_array_context("\"items\": [\"a\", "));
        assert!(!is_in_array_context("{\"a\": 1, "));
        assert!(!is_in_array_context("\"a\": 1\n"));
    }

    #[test]
    fn test_deep_array_context() {
        let content = r#"{"items": ["a", "b", "#;
        let checker = StringBoundaryChecker::new(content);
        assert!(is_in_array_context_deep(content, content.len(), &checker));
        assert!(!is_in_object_context_deep(content, content.len(), &checker));
    }

    #[test]
    fn test_deep_object_in_array_is_not_array_context() {
        let content = r#"{"items": [{"name": "a", "#;
        let checker = StringBoundaryChecker::new(content);
        assert!(!is_in_array_context_deep(content, content.len(), &checker));
        assert!(is_in_object_context_deep(content, content.len(), &checker));
    }
}
