//! Character Normalization
//!
//! Third pipeline phase: curly quotes to ASCII, line-ending normalization,
//! malformed escape repair, and stray control-character removal.

use crate::config::SanitizerConfig;
use crate::sanitize::Sanitizer;
use crate::scan::StringBoundaryChecker;
use crate::types::SanitizeOutcome;

pub const WHITESPACE_DESCRIPTION: &str = "Normalized whitespace";

const CURLY_DOUBLE: [char; 4] = ['\u{201C}', '\u{201D}', '\u{201E}', '\u{201F}'];
const CURLY_SINGLE: [char; 4] = ['\u{2018}', '\u{2019}', '\u{201A}', '\u{201B}'];

/// Replace curly quotes used as delimiters with their ASCII forms. Quotes
/// inside proper string literals are content and stay untouched.
pub struct NormalizeQuotes;

impl Sanitizer for NormalizeQuotes {
    fn name(&self) -> &'static str {
        "normalize_quotes"
    }

    fn sanitize(&self, content: &str, _config: &SanitizerConfig) -> SanitizeOutcome {
        if !content.chars().any(|c| CURLY_DOUBLE.contains(&c) || CURLY_SINGLE.contains(&c)) {
            return SanitizeOutcome::unchanged(content);
        }

        let checker = StringBoundaryChecker::new(content);
        let mut out = String::with_capacity(content.len());
        let mut changed = false;

        for (i, c) in content.char_indices() {
            if !checker.is_in_string(i) && CURLY_DOUBLE.contains(&c) {
                out.push('"');
                changed = true;
            } else if !checker.is_in_string(i) && CURLY_SINGLE.contains(&c) {
                out.push('\'');
                changed = true;
            } else {
                out.push(c);
            }
        }

        if !changed {
            return SanitizeOutcome::unchanged(content);
        }

        SanitizeOutcome::rewritten(out, "Normalized quote characters")
    }
}

/// Normalize CRLF line endings and trailing line whitespace
pub struct NormalizeWhitespace;

impl Sanitizer for NormalizeWhitespace {
    fn name(&self) -> &'static str {
        "normalize_whitespace"
    }

    fn sanitize(&self, content: &str, _config: &SanitizerConfig) -> SanitizeOutcome {
        if !content.contains('\r') {
            return SanitizeOutcome::unchanged(content);
        }

        let checker = StringBoundaryChecker::new(content);
        let mut out = String::with_capacity(content.len());
        let mut changed = false;

        for (i, c) in content.char_indices() {
            if c == '\r' && !checker.is_in_string(i) {
                changed = true;
            } else {
                out.push(c);
            }
        }

        if !changed {
            return SanitizeOutcome::unchanged(content);
        }

        SanitizeOutcome::rewritten(out, WHITESPACE_DESCRIPTION)
    }
}

/// Drop backslashes that start an escape JSON does not define, including
/// `\u` sequences with fewer than four hex digits
pub struct RepairEscapes;

impl Sanitizer for RepairEscapes {
    fn name(&self) -> &'static str {
        "repair_escapes"
    }

    fn sanitize(&self, content: &str, _config: &SanitizerConfig) -> SanitizeOutcome {
        if !content.contains('\\') {
            return SanitizeOutcome::unchanged(content);
        }

        let chars: Vec<char> = content.chars().collect();
        let mut out = String::with_capacity(content.len());
        let mut in_string = false;
        let mut changed = false;
        let mut i = 0usize;

        while i < chars.len() {
            let c = chars[i];

            if !in_string {
                if c == '"' {
                    in_string = true;
                }
                out.push(c);
                i += 1;
                continue;
            }

            if c == '"' {
                in_string = false;
                out.push(c);
                i += 1;
                continue;
            }

            if c != '\\' {
                out.push(c);
                i += 1;
                continue;
            }

            let next = chars.get(i + 1).copied();
            match next {
                Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => {
                    out.push('\\');
                    out.push(chars[i + 1]);
                    i += 2;
                }
                Some('u') => {
                    let hex_len = chars[i + 2..]
                        .iter()
                        .take(4)
                        .take_while(|c| c.is_ascii_hexdigit())
                        .count();
                    if hex_len == 4 {
                        out.push('\\');
                        out.push('u');
                    } else {
                        changed = true;
                        out.push('u');
                    }
                    i += 2;
                }
                Some(other) => {
                    changed = true;
                    out.push(other);
                    i += 2;
                }
                None => {
                    changed = true;
                    i += 1;
                }
            }
        }

        if !changed {
            return SanitizeOutcome::unchanged(content);
        }

        SanitizeOutcome::rewritten(out, "Repaired malformed escape sequences")
    }
}

/// Remove control characters other than the allowed whitespace
pub struct RemoveControlChars;

impl Sanitizer for RemoveControlChars {
    fn name(&self) -> &'static str {
        "remove_control_chars"
    }

    fn sanitize(&self, content: &str, _config: &SanitizerConfig) -> SanitizeOutcome {
        let has_control = content
            .chars()
            .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'));
        if !has_control {
            return SanitizeOutcome::unchanged(content);
        }

        let cleaned: String = content
            .chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
            .collect();

        SanitizeOutcome::rewritten(cleaned, "Removed control characters")
    }
}
