//! Comment Removal
//!
//! Second pipeline phase: strips `//` line comments and `/* */` block
//! comments outside string literals.

use crate::config::SanitizerConfig;
use crate::sanitize::Sanitizer;
use crate::types::SanitizeOutcome;

pub struct RemoveComments;

impl Sanitizer for RemoveComments {
    fn name(&self) -> &'static str {
        "remove_comments"
    }

    fn sanitize(&self, content: &str, _config: &SanitizerConfig) -> SanitizeOutcome {
        if !content.contains("//") && !content.contains("/*") {
            return SanitizeOutcome::unchanged(content);
        }

        let mut out = String::with_capacity(content.len());
        let mut chars = content.char_indices().peekable();
        let mut in_string = false;
        let mut escape = false;
        let mut changed = false;

        while let Some((_, c)) = chars.next() {
            if in_string {
                out.push(c);
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
                '"' => {
                    in_string = true;
                    out.push(c);
                }
                '/' => match chars.peek() {
                    Some((_, '/')) => {
                        changed = true;
                        for (_, skipped) in chars.by_ref() {
                            if skipped == '\n' {
                                out.push('\n');
                                break;
                            }
                        }
                    }
                    Some((_, '*')) => {
                        changed = true;
                        chars.next();
                        let mut star = false;
                        for (_, skipped) in chars.by_ref() {
                            if star && skipped == '/' {
                                break;
                            }
                            star = skipped == '*';
                        }
                    }
                    _ => out.push(c),
                },
                _ => out.push(c),
            }
        }

        if !changed {
            return SanitizeOutcome::unchanged(content);
        }

        SanitizeOutcome::rewritten(out, "Removed comments")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(content: &str) -> SanitizeOutcome {
        RemoveComments.sanitize(content, &SanitizerConfig::default())
    }

    #[test]
    fn test_line_comment_removed() {
        let outcome = run("{\"a\": 1, // count\n\"b\": 2}");
        assert!(outcome.changed);
        assert_eq!(outcome.content, "{\"a\": 1, \n\"b\": 2}");
    }

    #[test]
    fn test_block_comment_removed() {
        let outcome = run("{\"a\": /* the value */ 1}");
        assert!(outcome.changed);
        assert_eq!(outcome.content, "{\"a\":  1}");
    }

    #[test]
    fn test_slashes_inside_strings_kept() {
        let content = "{\"url\": \"https://example.com/a\"}";
        let outcome = run(content);
        assert!(!outcome.changed);
        assert_eq!(outcome.content, content);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let outcome = run("{\"a\": 1} /* dangling");
        assert_eq!(outcome.content, "{\"a\": 1} ");
    }

    #[test]
    fn test_no_comments_unchanged() {
        let outcome = run("{\"a\": 1}");
        assert!(!outcome.changed);
    }
}
