//! LLM Token-Artifact Cleanup
//!
//! Sixth pipeline phase: removes provider token markers that leak into
//! completions, such as `<y_bin_042>` and `<|endoftext|>` style tokens.
//! Markers inside string literals are content and stay.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::SanitizerConfig;
use crate::sanitize::Sanitizer;
use crate::scan::StringBoundaryChecker;
use crate::types::SanitizeOutcome;

static TOKEN_MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"<[a-z]_bin_\d+>", r"<\|[A-Za-z0-9_]{1,30}\|>"]
        .iter()
        .map(|p| {
            Regex::new(p).unwrap_or_else(|e| panic!("invalid token-marker pattern: {e}"))
        })
        .collect()
});

pub struct RemoveTokenArtifacts;

impl Sanitizer for RemoveTokenArtifacts {
    fn name(&self) -> &'static str {
        "remove_token_artifacts"
    }

    fn sanitize(&self, content: &str, _config: &SanitizerConfig) -> SanitizeOutcome {
        if !content.contains('<') {
            return SanitizeOutcome::unchanged(content);
        }

        let mut current = content.to_string();
        let mut changed = false;

        for pattern in TOKEN_MARKERS.iter() {
            let checker = StringBoundaryChecker::new(&current);
            let mut out = String::with_capacity(current.len());
            let mut pos = 0usize;
            let mut local_change = false;

            for m in pattern.find_iter(&current) {
                out.push_str(&current[pos..m.start()]);
                if checker.is_in_string(m.start()) {
                    out.push_str(m.as_str());
                } else {
                    local_change = true;
                }
                pos = m.end();
            }
            out.push_str(&current[pos..]);

            if local_change {
                current = out;
                changed = true;
            }
        }

        if !changed {
            return SanitizeOutcome::unchanged(content);
        }

        SanitizeOutcome::rewritten(current, "Removed token artifacts")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(content: &str) -> SanitizeOutcome {
        RemoveTokenArtifacts.sanitize(content, &SanitizerConfig::default())
    }

    #[test]
    fn test_bin_marker_removed() {
        let outcome = run("{\"a\": <y_bin_042>1}");
        assert!(outcome.changed);
        assert_eq!(outcome.content, "{\"a\": 1}");
    }

    #[test]
    fn test_special_token_removed() {
        let outcome = run("{\"a\": 1}<|endoftext|>");
        assert_eq!(outcome.content, "{\"a\": 1}");
    }

    #[test]
    fn test_marker_inside_string_kept() {
        let content = "{\"a\": \"token <y_bin_042> here\"}";
        let outcome = run(content);
        assert!(!outcome.changed);
    }

    #[test]
    fn test_plain_angle_brackets_kept() {
        let content = "{\"a\": 1} < 2";
        let outcome = run(content);
        assert!(!outcome.changed);
    }
}
