//! Stray-Text Detectors
//!
//! Structural predicates that decide whether a fragment of text belongs in a
//! JSON document. No hardcoded word lists: every detector works off shape
//! (length, casing, punctuation, separators). Schema-declared property names
//! short-circuit the non-JSON-key heuristic.

use crate::constants::detector;

/// JSON keywords that must never be treated as stray text
pub fn is_json_keyword(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "true" | "false" | "null" | "undefined"
    )
}

/// Tuning for [`looks_like_stray_text`]
#[derive(Debug, Clone)]
pub struct StrayTextOptions {
    /// Maximum length for the short-lowercase-word category
    pub max_word_len: usize,
    /// Treat sentence-structured text as stray
    pub detect_sentences: bool,
    /// Treat `key: value` YAML fragments as stray
    pub detect_yaml_fragments: bool,
    /// Treat `ident = value` assignments as stray
    pub detect_assignments: bool,
}

impl Default for StrayTextOptions {
    fn default() -> Self {
        Self {
            max_word_len: detector::MAX_STRAY_WORD_LEN,
            detect_sentences: true,
            detect_yaml_fragments: true,
            detect_assignments: true,
        }
    }
}

/// Whether a fragment is JSON-keyword-negative stray text.
///
/// Short lowercase words always qualify; sentences, YAML fragments, and
/// assignments qualify when the corresponding option is enabled.
pub fn looks_like_stray_text(s: &str, opts: &StrayTextOptions) -> bool {
    let trimmed = s.trim();
    if trimmed.is_empty() || is_json_keyword(trimmed) {
        return false;
    }

    // Short lowercase word with no JSON structure around it
    if trimmed.len() <= opts.max_word_len
        && trimmed.chars().all(|c| c.is_ascii_lowercase())
    {
        return true;
    }

    if opts.detect_sentences && looks_like_sentence_structure(trimmed) {
        return true;
    }

    if opts.detect_yaml_fragments
        && let Some((key, value)) = trimmed.split_once(':')
        && is_identifier_like(key.trim())
        && !value.trim().is_empty()
        && !value.trim_start().starts_with(['"', '{', '['])
    {
        return true;
    }

    if opts.detect_assignments
        && let Some((lhs, rhs)) = trimmed.split_once('=')
        && is_identifier_like(lhs.trim())
        && !rhs.trim().is_empty()
    {
        return true;
    }

    false
}

/// Whether text reads as a prose sentence rather than a JSON fragment
pub fn looks_like_sentence_structure(s: &str) -> bool {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.contains(['{', '}', '[', ']']) {
        return false;
    }

    let words = trimmed.split_whitespace().count();

    if words >= detector::MIN_SENTENCE_WORDS {
        return true;
    }

    if words >= detector::MIN_TERMINATED_WORDS && trimmed.ends_with(['.', '!', '?']) {
        return true;
    }

    // Long lowercase-and-space prose
    trimmed.len() >= detector::MIN_PROSE_LEN
        && trimmed
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_whitespace() || c == ',')
}

/// Whether text is a truncation marker (`...`, `…and so on`, `(more items)`)
pub fn looks_like_truncation_marker(s: &str) -> bool {
    let trimmed = s.trim().trim_start_matches(',').trim();
    if trimmed.is_empty() {
        return false;
    }

    if trimmed.starts_with("...") || trimmed.starts_with('\u{2026}') {
        return true;
    }

    if trimmed.ends_with("...") || trimmed.ends_with('\u{2026}') {
        return true;
    }

    // Parenthesized continuation notes: "(more items)", "(truncated)"
    trimmed.starts_with('(')
        && trimmed.ends_with(')')
        && trimmed[1..trimmed.len() - 1]
            .split_whitespace()
            .all(|w| w.chars().all(|c| c.is_ascii_alphanumeric()))
        && !trimmed[1..trimmed.len() - 1].is_empty()
}

/// Whether text opens as a first-person statement ("I have...", "We found...")
pub fn looks_like_first_person_statement(s: &str) -> bool {
    let trimmed = s.trim_start();
    let mut words = trimmed.split_whitespace();
    let Some(first) = words.next() else {
        return false;
    };
    if words.next().is_none() {
        return false;
    }

    matches!(first, "I" | "I'm" | "I've" | "I'll" | "We" | "We're" | "We've" | "We'll")
}

/// Whether a key reads as a YAML/config key rather than a JSON property.
///
/// Short-circuits to `false` when the key matches any known schema property
/// (case-insensitive): schema-awareness beats the shape heuristic.
pub fn looks_like_non_json_key(key: &str, known_properties: &[String]) -> bool {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return false;
    }

    if known_properties
        .iter()
        .any(|p| p.eq_ignore_ascii_case(trimmed))
    {
        return false;
    }

    // Hyphenated YAML-style keys: "my-yaml-key"
    if trimmed.contains('-') && is_identifier_like(&trimmed.replace('-', "_")) {
        return true;
    }

    // Prefixed artifact keys: "extra_notes", "_llm_thoughts"
    trimmed.starts_with("extra_")
        || trimmed.starts_with("_llm_")
        || trimmed.starts_with("_ai_")
}

/// Identifier shape: letter or underscore head, word characters after
fn is_identifier_like(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
