//! Matched-Delimiter Scanners
//!
//! Forward scan from an opening delimiter to just past its matching closer,
//! and a backward scan that identifies the nearest unmatched opener. Both
//! skip string literals with escape handling.

use crate::constants::classify::MAX_BACKWARD_SCAN;
use crate::scan::StringBoundaryChecker;

/// Scan forward from `open_pos` (a `{` or `[`) and return the index
/// immediately past the matching closer. `None` when the byte at `open_pos`
/// is not an opener or the structure is unbalanced.
pub fn find_json_value_end(content: &str, open_pos: usize) -> Option<usize> {
    let bytes = content.as_bytes();
    let (open, close) = match *bytes.get(open_pos)? {
        b'{' => (b'{', b'}'),
        b'[' => (b'[', b']'),
        _ => return None,
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (i, &b) in bytes.iter().enumerate().skip(open_pos) {
        if in_string {
            if escape {
                escape = false;
            } else if b == b'\\' {
                escape = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        if b == b'"' {
            in_string = true;
        } else if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(i + 1);
            }
        }
    }

    None
}

/// Scan forward from the start of any JSON value (object, array, string,
/// number, or keyword) and return the index just past it. `None` when no
/// value shape is recognized at `start`.
pub fn find_property_value_end(content: &str, start: usize) -> Option<usize> {
    let bytes = content.as_bytes();
    match *bytes.get(start)? {
        b'{' | b'[' => find_json_value_end(content, start),
        b'"' => {
            let mut escape = false;
            for (i, &b) in bytes.iter().enumerate().skip(start + 1) {
                if escape {
                    escape = false;
                } else if b == b'\\' {
                    escape = true;
                } else if b == b'"' {
                    return Some(i + 1);
                }
            }
            None
        }
        b => {
            if !(b.is_ascii_alphanumeric() || matches!(b, b'-' | b'+' | b'.')) {
                return None;
            }
            let end = bytes[start..]
                .iter()
                .position(|&b| matches!(b, b',' | b'}' | b']' | b'\n'))
                .map(|off| start + off)
                .unwrap_or(bytes.len());
            Some(end)
        }
    }
}

/// Scan backward from `from` and return the nearest unmatched opening
/// delimiter, skipping string literals via the boundary checker. Returns
/// `None` when no unmatched opener exists within the scan window.
pub fn find_unmatched_open(
    content: &str,
    from: usize,
    checker: &StringBoundaryChecker,
) -> Option<char> {
    let bytes = content.as_bytes();
    let from = from.min(bytes.len());
    let floor = from.saturating_sub(MAX_BACKWARD_SCAN);

    let mut bracket_depth = 0usize;
    let mut brace_depth = 0usize;

    for i in (floor..from).rev() {
        if checker.is_in_string(i) {
            continue;
        }
        match bytes[i] {
            b']' => bracket_depth += 1,
            b'}' => brace_depth += 1,
            b'[' => {
                if bracket_depth == 0 {
                    return Some('[');
                }
                bracket_depth -= 1;
            }
            b'{' => {
                if brace_depth == 0 {
                    return Some('{');
                }
                brace_depth -= 1;
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_matching_brace() {
        let content = r#"{"a": {"b": 1}}"#;
        assert_eq!(find_json_value_end(content, 0), Some(content.len()));

        let inner = content.find("{\"b").unwrap();
        let inner_end = content.find('}').unwrap() + 1;
        assert_eq!(find_json_value_end(content, inner), Some(inner_end));
    }

    #[test]
    fn test_braces_inside_strings_ignored() {
        let content = r#"{"a": "has } brace"}"#;
        assert_eq!(find_json_value_end(content, 0), Some(content.len()));
    }

    #[test]
    fn test_unbalanced_returns_none() {
        assert_eq!(find_json_value_end(r#"{"a": 1"#, 0), None);
        assert_eq!(find_json_value_end("no brace here", 0), None);
    }

    #[test]
    fn test_array_scan() {
        let content = r#"[1, [2, 3], 4] tail"#;
        assert_eq!(find_json_value_end(content, 0), Some(14));
    }

    #[test]
    fn test_property_value_end_scalar() {
        let content = r#"{"a": 42, "b": 1}"#;
        let start = content.find("42").unwrap();
        assert_eq!(find_property_value_end(content, start), Some(start + 2));
    }

    #[test]
    fn test_property_value_end_string() {
        let content = r#"{"a": "va\"l", "b": 1}"#;
        let start = content.find("\"va").unwrap();
        let end = find_property_value_end(content, start).unwrap();
        assert_eq!(&content[start..end], r#""va\"l""#);
    }

    #[test]
    fn test_unmatched_open_finds_array() {
        let content = r#"{"items": ["a", "#;
        let checker = StringBoundaryChecker::new(content);
        assert_eq!(
            find_unmatched_open(content, content.len(), &checker),
            Some('[')
        );
    }

    #[test]
    fn test_unmatched_open_finds_object_after_closed_array() {
        let content = r#"{"items": ["a"], "#;
        let checker = StringBoundaryChecker::new(content);
        assert_eq!(
            find_unmatched_open(content, content.len(), &checker),
            Some('{')
        );
    }

    #[test]
    fn test_unmatched_open_object_in_array() {
        let content = r#"[{"name": "#;
        let checker = StringBoundaryChecker::new(content);
        assert_eq!(
            find_unmatched_open(content, content.len(), &checker),
            Some('{')
        );
    }

    #[test]
    fn test_no_unmatched_open() {
        let content = r#"{"a": 1}"#;
        let checker = StringBoundaryChecker::new(content);
        assert_eq!(find_unmatched_open(content, content.len(), &checker), None);
    }
}
