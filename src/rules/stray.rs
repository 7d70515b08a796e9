//! Stray-Character Rules
//!
//! Third rule group: leftover characters the model scattered around
//! otherwise sound structure. Stray prefixes before names and elements,
//! list markers, placeholder tokens, and Python-style triple quotes.

use std::sync::{Arc, LazyLock};

use regex::Captures;

use crate::heuristics::{StrayTextOptions, looks_like_stray_text};
use crate::rules::{ContextInfo, ReplacementRule, RuleEdit};
use crate::scan::is_in_array_context_deep;

static RULES: LazyLock<Vec<Arc<ReplacementRule>>> = LazyLock::new(|| {
    vec![
        Arc::new(
            ReplacementRule::new(
                "stray_text_before_property",
                r#"([{,][ \t]*\n[ \t]*)([^\s"{}\[\],:][^"\n:]*?)[ \t]*(")"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("{}{}", &caps[1], &caps[3]))
                },
            )
            .check(|caps: &Captures, _ctx: &ContextInfo| {
                looks_like_stray_text(&caps[2], &StrayTextOptions::default())
            })
            .describe("Removed stray text before property name"),
        ),
        Arc::new(
            ReplacementRule::new(
                "stray_prefix_before_array_element",
                r#"([\[,][ \t\r\n]*)([^\s"{}\[\],:0-9][^\s"{}\[\],:]{0,7})[ \t]*(")"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("{}{}", &caps[1], &caps[3]))
                },
            )
            .check(|caps: &Captures, ctx: &ContextInfo| {
                // Probe past the introducing `[`/`,` so a match at the
                // array's own opener still resolves to that array
                looks_like_stray_text(&caps[2], &StrayTextOptions::default())
                    && is_in_array_context_deep(ctx.full_content, ctx.offset + 1, ctx.boundary())
            })
            .describe("Removed stray prefix before array element"),
        ),
        Arc::new(
            ReplacementRule::new(
                "list_marker_before_property",
                r#"(?m)^([ \t]*)[\x{2022}\x{25AA}\x{25E6}\x{2023}\x{2192}*-][ \t]+(")"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("{}{}", &caps[1], &caps[2]))
                },
            )
            .describe("Removed list marker before property"),
        ),
        Arc::new(
            ReplacementRule::new(
                "placeholder_token",
                r"(?m)^[ \t]*_[A-Z][A-Z0-9_]*_[ \t]*,?[ \t]*\n?",
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::remove(),
            )
            .describe("Removed placeholder token"),
        ),
        Arc::new(
            ReplacementRule::new(
                "python_triple_quote",
                r#"(?:"{3}|'{3})"#,
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::with("\""),
            )
            .describe("Normalized Python triple quote"),
        ),
        Arc::new(
            ReplacementRule::new(
                "stray_chars_before_object",
                r#"([\[,][ \t\r\n]*)([^\s"{}\[\],:0-9]{1,6})[ \t]*(\{)"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("{}{}", &caps[1], &caps[3]))
                },
            )
            .check(|caps: &Captures, _ctx: &ContextInfo| {
                looks_like_stray_text(&caps[2], &StrayTextOptions::default())
            })
            .describe("Removed stray characters before object"),
        ),
    ]
});

pub fn rules() -> &'static [Arc<ReplacementRule>] {
    &RULES
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SanitizerConfig;
    use crate::rules::executor::{ExecutorOptions, execute_rules};

    fn run(content: &str) -> String {
        let config = SanitizerConfig::default();
        execute_rules(content, rules(), &ExecutorOptions::single_pass(&config)).content
    }

    #[test]
    fn test_stray_text_before_property() {
        let content = "{\n  oops \"a\": 1}";
        assert_eq!(run(content), "{\n  \"a\": 1}");
    }

    #[test]
    fn test_stray_prefix_before_array_element() {
        let content = "[\"a\", xx \"b\"]";
        assert_eq!(run(content), "[\"a\", \"b\"]");
    }

    #[test]
    fn test_prefix_outside_array_is_kept() {
        // Object context: the property rules own this shape
        let content = "{, xx \"b\": 1}";
        assert_eq!(run(content), content);
    }

    #[test]
    fn test_list_markers_removed() {
        let content = "{\n\u{2022} \"a\": 1,\n* \"b\": 2}";
        assert_eq!(run(content), "{\n\"a\": 1,\n\"b\": 2}");
    }

    #[test]
    fn test_placeholder_token_line() {
        let content = "{\"a\": 1,\n_PLACEHOLDER_,\n\"b\": 2}";
        assert_eq!(run(content), "{\"a\": 1,\n\"b\": 2}");
    }

    #[test]
    fn test_python_triple_quotes() {
        let content = "{\"doc\": \"\"\"text\"\"\"}";
        assert_eq!(run(content), "{\"doc\": \"text\"}");
    }

    #[test]
    fn test_markers_inside_strings_kept() {
        let content = "{\"a\": \"bullet \u{2022} char\"}";
        assert_eq!(run(content), content);
    }
}
