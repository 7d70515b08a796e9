//! Structural-and-Noise Removal
//!
//! First pipeline phase: coarse text operations that peel noise away from
//! the JSON body. Trimming, code fences, invalid prefixes, span extraction,
//! repeated objects, and truncation markers.

use crate::config::SanitizerConfig;
use crate::heuristics::looks_like_truncation_marker;
use crate::sanitize::Sanitizer;
use crate::scan::{StringBoundaryChecker, find_json_value_end};
use crate::types::SanitizeOutcome;

pub const TRIM_DESCRIPTION: &str = "Trimmed surrounding whitespace";
pub const CODE_FENCE_DESCRIPTION: &str = "Removed markdown code fences";

/// Trim surrounding whitespace and a byte-order mark
pub struct TrimWhitespace;

impl Sanitizer for TrimWhitespace {
    fn name(&self) -> &'static str {
        "trim_whitespace"
    }

    fn sanitize(&self, content: &str, _config: &SanitizerConfig) -> SanitizeOutcome {
        let trimmed = content.trim().trim_start_matches('\u{feff}').trim();
        if trimmed == content {
            SanitizeOutcome::unchanged(content)
        } else {
            SanitizeOutcome::rewritten(trimmed, TRIM_DESCRIPTION)
        }
    }
}

/// Strip markdown code fences wrapping or interleaved with the document
pub struct StripCodeFences;

impl Sanitizer for StripCodeFences {
    fn name(&self) -> &'static str {
        "strip_code_fences"
    }

    fn sanitize(&self, content: &str, _config: &SanitizerConfig) -> SanitizeOutcome {
        if !content.contains("```") {
            return SanitizeOutcome::unchanged(content);
        }

        // Leading fence with the payload on the same line
        let mut working = content.trim().to_string();
        if let Some(rest) = working.strip_prefix("```json") {
            working = rest.trim_start().to_string();
        } else if let Some(rest) = working.strip_prefix("```") {
            // Drop a language tag when present
            let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
            working = rest.trim_start().to_string();
        }
        if let Some(rest) = working.strip_suffix("```") {
            working = rest.trim_end().to_string();
        }

        // Pure fence lines anywhere in the body
        let cleaned: String = working
            .lines()
            .filter(|line| {
                let t = line.trim();
                !(t.starts_with("```")
                    && t[3..].chars().all(|c| c.is_ascii_alphanumeric()))
            })
            .collect::<Vec<_>>()
            .join("\n");

        if cleaned == content {
            SanitizeOutcome::unchanged(content)
        } else {
            SanitizeOutcome::rewritten(cleaned, CODE_FENCE_DESCRIPTION)
        }
    }
}

/// Whether a line reads as a YAML `key: value` head; such prefixes belong to
/// the embedded-content rules, which are schema-aware
fn is_yaml_key_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    let Some(colon) = trimmed.find(':') else {
        return false;
    };
    let key = &trimmed[..colon];
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Drop prose before the first `{` or `[`
pub struct DropInvalidPrefix;

impl Sanitizer for DropInvalidPrefix {
    fn name(&self) -> &'static str {
        "drop_invalid_prefix"
    }

    fn sanitize(&self, content: &str, _config: &SanitizerConfig) -> SanitizeOutcome {
        let Some(start) = content.find(['{', '[']) else {
            return SanitizeOutcome::unchanged(content);
        };
        let prefix = &content[..start];
        if prefix.trim().is_empty() {
            return SanitizeOutcome::unchanged(content);
        }

        // YAML-shaped prefixes are left for the schema-aware rules
        if prefix.lines().any(is_yaml_key_line) {
            return SanitizeOutcome::unchanged(content);
        }

        SanitizeOutcome::rewritten(
            &content[start..],
            "Removed invalid prefix before JSON content",
        )
    }
}

/// Extract the delimited span when JSON-bearing junk trails the document.
///
/// Brace-free prose tails are owned by the structural rule group; this
/// sanitizer claims only tails that themselves contain delimiters, which the
/// text rules cannot strip safely.
pub struct ExtractLargestSpan;

impl Sanitizer for ExtractLargestSpan {
    fn name(&self) -> &'static str {
        "extract_largest_span"
    }

    fn sanitize(&self, content: &str, _config: &SanitizerConfig) -> SanitizeOutcome {
        let Some(start) = content.find(['{', '[']) else {
            return SanitizeOutcome::unchanged(content);
        };
        let Some(end) = find_json_value_end(content, start) else {
            return SanitizeOutcome::unchanged(content);
        };

        let suffix = &content[end..];
        if suffix.trim().is_empty() || !suffix.contains(['{', '[']) {
            return SanitizeOutcome::unchanged(content);
        }

        // Identical repeated objects are collapsed by the next sanitizer
        let span = &content[start..end];
        if suffix.trim() == span {
            return SanitizeOutcome::unchanged(content);
        }

        SanitizeOutcome::rewritten(span, "Extracted JSON span from surrounding text")
    }
}

/// Collapse a document repeated back-to-back into a single copy
pub struct CollapseDuplicateObjects;

impl Sanitizer for CollapseDuplicateObjects {
    fn name(&self) -> &'static str {
        "collapse_duplicate_objects"
    }

    fn sanitize(&self, content: &str, _config: &SanitizerConfig) -> SanitizeOutcome {
        let Some(start) = content.find(['{', '[']) else {
            return SanitizeOutcome::unchanged(content);
        };
        let Some(end) = find_json_value_end(content, start) else {
            return SanitizeOutcome::unchanged(content);
        };

        let span = &content[start..end];
        let mut rest = content[end..].trim_start();
        let mut collapsed = false;
        while rest.starts_with(span) {
            rest = rest[span.len()..].trim_start();
            collapsed = true;
        }

        if !collapsed || !rest.is_empty() {
            return SanitizeOutcome::unchanged(content);
        }

        SanitizeOutcome::rewritten(
            &content[..end],
            "Collapsed repeated identical objects",
        )
    }
}

/// Remove whole lines that are truncation markers
pub struct DropTruncationMarkers;

impl Sanitizer for DropTruncationMarkers {
    fn name(&self) -> &'static str {
        "drop_truncation_markers"
    }

    fn sanitize(&self, content: &str, _config: &SanitizerConfig) -> SanitizeOutcome {
        if !content.contains("...") && !content.contains('\u{2026}') {
            return SanitizeOutcome::unchanged(content);
        }

        let checker = StringBoundaryChecker::new(content);
        let mut out = String::with_capacity(content.len());
        let mut offset = 0usize;
        let mut changed = false;

        for line in content.split_inclusive('\n') {
            let body = line.trim_end_matches('\n');
            let indent = body.len() - body.trim_start().len();
            let marker = looks_like_truncation_marker(body)
                && !checker.is_in_string(offset + indent);
            if marker {
                changed = true;
            } else {
                out.push_str(line);
            }
            offset += line.len();
        }

        if !changed {
            return SanitizeOutcome::unchanged(content);
        }

        SanitizeOutcome::rewritten(out, "Removed truncation markers")
    }
}
