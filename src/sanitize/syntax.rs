//! Syntax Fixes
//!
//! Fourth pipeline phase: mechanical syntax repairs. Missing and trailing
//! commas, mismatched delimiters, truncated structures, and a missing `{`
//! in array-of-object shapes.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::SanitizerConfig;
use crate::sanitize::Sanitizer;
use crate::scan::StringBoundaryChecker;
use crate::types::SanitizeOutcome;

/// Whether a completed value ends at this line tail
fn line_ends_value(trimmed: &str) -> bool {
    if trimmed.ends_with(['"', '}', ']']) {
        return true;
    }
    if trimmed.ends_with(|c: char| c.is_ascii_digit()) {
        return true;
    }
    ["true", "false", "null"]
        .iter()
        .any(|kw| trimmed.ends_with(kw))
}

/// Insert commas between a line-final value and a line-initial `"` or `{`
pub struct AddMissingCommas;

impl Sanitizer for AddMissingCommas {
    fn name(&self) -> &'static str {
        "add_missing_commas"
    }

    fn sanitize(&self, content: &str, _config: &SanitizerConfig) -> SanitizeOutcome {
        if !content.contains('\n') {
            return SanitizeOutcome::unchanged(content);
        }

        let checker = StringBoundaryChecker::new(content);
        let lines: Vec<&str> = content.split('\n').collect();
        let mut out = Vec::with_capacity(lines.len());
        let mut offset = 0usize;
        let mut changed = false;

        for (i, line) in lines.iter().enumerate() {
            let mut fixed = (*line).to_string();

            if i + 1 < lines.len() {
                let trimmed = line.trim_end();
                let next_start = lines[i + 1].trim_start().chars().next();
                let value_end = offset + trimmed.len();
                let ends_value = line_ends_value(trimmed)
                    && value_end > 0
                    && !checker.is_in_string(value_end);
                if ends_value && matches!(next_start, Some('"') | Some('{')) {
                    fixed = format!("{},{}", trimmed, &line[trimmed.len()..]);
                    changed = true;
                }
            }

            out.push(fixed);
            offset += line.len() + 1;
        }

        if !changed {
            return SanitizeOutcome::unchanged(content);
        }

        SanitizeOutcome::rewritten(out.join("\n"), "Added missing commas")
    }
}

/// Remove commas directly preceding a closing delimiter
pub struct RemoveTrailingCommas;

impl Sanitizer for RemoveTrailingCommas {
    fn name(&self) -> &'static str {
        "remove_trailing_commas"
    }

    fn sanitize(&self, content: &str, _config: &SanitizerConfig) -> SanitizeOutcome {
        if !content.contains(',') {
            return SanitizeOutcome::unchanged(content);
        }

        let checker = StringBoundaryChecker::new(content);
        let bytes = content.as_bytes();
        let mut out = String::with_capacity(content.len());
        let mut changed = false;

        for (i, c) in content.char_indices() {
            if c != ',' || checker.is_in_string(i) {
                out.push(c);
                continue;
            }

            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < bytes.len() && matches!(bytes[j], b'}' | b']') && !checker.is_in_string(j) {
                changed = true;
            } else {
                out.push(c);
            }
        }

        if !changed {
            return SanitizeOutcome::unchanged(content);
        }

        SanitizeOutcome::rewritten(out, "Removed trailing commas")
    }
}

/// Rewrite closers that do not match the open delimiter stack
pub struct MatchMismatchedDelimiters;

impl Sanitizer for MatchMismatchedDelimiters {
    fn name(&self) -> &'static str {
        "match_mismatched_delimiters"
    }

    fn sanitize(&self, content: &str, _config: &SanitizerConfig) -> SanitizeOutcome {
        let checker = StringBoundaryChecker::new(content);
        let mut stack: Vec<char> = Vec::new();
        let mut out = String::with_capacity(content.len());
        let mut changed = false;

        for (i, c) in content.char_indices() {
            if checker.is_in_string(i) {
                out.push(c);
                continue;
            }

            match c {
                '{' | '[' => {
                    stack.push(c);
                    out.push(c);
                }
                '}' | ']' => {
                    let expected = match stack.pop() {
                        Some('{') => '}',
                        Some('[') => ']',
                        _ => c,
                    };
                    if expected != c {
                        changed = true;
                    }
                    out.push(expected);
                }
                _ => out.push(c),
            }
        }

        if !changed {
            return SanitizeOutcome::unchanged(content);
        }

        SanitizeOutcome::rewritten(out, "Matched mismatched delimiters")
    }
}

/// Close an unterminated final string and append the missing closers
pub struct CompleteTruncatedStructures;

impl Sanitizer for CompleteTruncatedStructures {
    fn name(&self) -> &'static str {
        "complete_truncated_structures"
    }

    fn sanitize(&self, content: &str, _config: &SanitizerConfig) -> SanitizeOutcome {
        let mut stack: Vec<char> = Vec::new();
        let mut in_string = false;
        let mut escape = false;

        for c in content.chars() {
            if in_string {
                if escape {
                    escape = false;
                } else if c == '\\' {
                    escape = true;
                } else if c == '"' {
                    in_string = false;
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '{' | '[' => stack.push(c),
                '}' => {
                    if stack.last() == Some(&'{') {
                        stack.pop();
                    }
                }
                ']' => {
                    if stack.last() == Some(&'[') {
                        stack.pop();
                    }
                }
                _ => {}
            }
        }

        if !in_string && stack.is_empty() {
            return SanitizeOutcome::unchanged(content);
        }

        // EOF inside a string while the text still ends with a closer means
        // mis-quoted content swallowed the closers, not truncation; that is
        // the rule engine's territory
        let tail = content.trim_end();
        if in_string && (tail.ends_with('}') || tail.ends_with(']')) {
            return SanitizeOutcome::unchanged(content);
        }

        let mut completed = content.trim_end().to_string();
        if in_string {
            completed.push('"');
        }
        while completed.ends_with(',') {
            completed.pop();
        }
        for opener in stack.iter().rev() {
            completed.push(match opener {
                '{' => '}',
                _ => ']',
            });
        }

        SanitizeOutcome::rewritten(completed, "Completed truncated structure")
    }
}

static PROPERTY_AFTER_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\[[ \t\r\n]*|\},[ \t\r\n]*)"([A-Za-z_]\w*)"[ \t]*:"#)
        .unwrap_or_else(|e| panic!("invalid property-after-element pattern: {e}"))
});

/// Insert the `{` an array-of-objects element lost. A bare `"name":`
/// directly inside an array (per the backward bracket scan) marks an object
/// element whose opener went missing.
pub struct FixMissingObjectOpen;

impl Sanitizer for FixMissingObjectOpen {
    fn name(&self) -> &'static str {
        "fix_missing_object_open"
    }

    fn sanitize(&self, content: &str, _config: &SanitizerConfig) -> SanitizeOutcome {
        let checker = StringBoundaryChecker::new(content);
        let mut changed = false;

        let rewritten = PROPERTY_AFTER_ELEMENT.replace_all(content, |caps: &regex::Captures| {
            let Some(prefix) = caps.get(1) else {
                return caps[0].to_string();
            };
            let in_array = crate::scan::find_unmatched_open(content, prefix.end(), &checker)
                == Some('[');
            if checker.is_in_string(prefix.start()) || !in_array {
                return caps[0].to_string();
            }
            changed = true;
            format!("{}{{\"{}\":", &caps[1], &caps[2])
        });

        if !changed {
            return SanitizeOutcome::unchanged(content);
        }

        SanitizeOutcome::rewritten(rewritten.into_owned(), "Added missing opening brace")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SanitizerConfig {
        SanitizerConfig::default()
    }

    #[test]
    fn test_missing_comma_between_properties() {
        let outcome = AddMissingCommas.sanitize("{\"a\": 1\n\"b\": 2}", &config());
        assert!(outcome.changed);
        assert_eq!(outcome.content, "{\"a\": 1,\n\"b\": 2}");
    }

    #[test]
    fn test_missing_comma_between_objects() {
        let outcome = AddMissingCommas.sanitize("[{\"a\": 1}\n{\"a\": 2}]", &config());
        assert_eq!(outcome.content, "[{\"a\": 1},\n{\"a\": 2}]");
    }

    #[test]
    fn test_open_brace_line_gets_no_comma() {
        let content = "{\n\"a\": 1}";
        let outcome = AddMissingCommas.sanitize(content, &config());
        assert!(!outcome.changed);
    }

    #[test]
    fn test_comma_not_added_inside_multiline_string() {
        let content = "{\"a\": \"broken\n\"b\": 2}";
        let outcome = AddMissingCommas.sanitize(content, &config());
        assert!(!outcome.changed);
    }

    #[test]
    fn test_trailing_commas_removed() {
        let outcome = RemoveTrailingCommas.sanitize("{\"a\": [1, 2,], }", &config());
        assert!(outcome.changed);
        assert_eq!(outcome.content, "{\"a\": [1, 2] }");
    }

    #[test]
    fn test_comma_inside_string_kept() {
        let content = "{\"a\": \"x,]\"}";
        let outcome = RemoveTrailingCommas.sanitize(content, &config());
        assert!(!outcome.changed);
    }

    #[test]
    fn test_mismatched_closer_rewritten() {
        let outcome = MatchMismatchedDelimiters.sanitize("{\"a\": [1, 2}}", &config());
        assert!(outcome.changed);
        assert_eq!(outcome.content, "{\"a\": [1, 2]}");
    }

    #[test]
    fn test_matched_delimiters_unchanged() {
        let content = "{\"a\": [1, {\"b\": 2}]}";
        let outcome = MatchMismatchedDelimiters.sanitize(content, &config());
        assert!(!outcome.changed);
    }

    #[test]
    fn test_truncated_object_completed() {
        let outcome = CompleteTruncatedStructures.sanitize("{\"a\": [1, 2", &config());
        assert!(outcome.changed);
        assert_eq!(outcome.content, "{\"a\": [1, 2]}");
    }

    #[test]
    fn test_truncated_string_closed() {
        let outcome = CompleteTruncatedStructures.sanitize("{\"a\": \"unfinished", &config());
        assert_eq!(outcome.content, "{\"a\": \"unfinished\"}");
    }

    #[test]
    fn test_trailing_comma_dropped_before_completion() {
        let outcome = CompleteTruncatedStructures.sanitize("{\"a\": 1,", &config());
        assert_eq!(outcome.content, "{\"a\": 1}");
    }

    #[test]
    fn test_complete_structures_balanced_unchanged() {
        let outcome = CompleteTruncatedStructures.sanitize("{\"a\": 1}", &config());
        assert!(!outcome.changed);
    }

    #[test]
    fn test_missing_object_open_inserted() {
        let content = "[{\"a\": 1}, \"b\": 2}]";
        let outcome = FixMissingObjectOpen.sanitize(content, &config());
        assert!(outcome.changed);
        assert_eq!(outcome.content, "[{\"a\": 1}, {\"b\": 2}]");
    }

    #[test]
    fn test_plain_array_of_objects_unchanged() {
        let content = "[{\"a\": 1}, {\"b\": 2}]";
        let outcome = FixMissingObjectOpen.sanitize(content, &config());
        assert!(!outcome.changed);
    }
}
