//! Array-Element Rules
//!
//! Fifth rule group: repairs scoped to array elements. Missing quotes,
//! bullet markers, stray content around elements, unterminated strings at
//! line ends, and property-like values in direct-array contexts. The
//! backward bracket scan distinguishes object-in-array from direct-in-array
//! shapes before any rewrite.

use std::sync::{Arc, LazyLock};

use regex::Captures;

use crate::heuristics::{StrayTextOptions, looks_like_stray_text};
use crate::rules::{ContextInfo, ReplacementRule, RuleEdit};
use crate::scan::is_in_array_context_deep;

fn deep_array_check(_caps: &Captures, ctx: &ContextInfo) -> bool {
    // These patterns anchor on the `[` or `,` introducing the element, so
    // the probe sits just past it; a match at the array's own opener then
    // balances to that opener instead of scanning past it
    is_in_array_context_deep(ctx.full_content, ctx.offset + 1, ctx.boundary())
}

static RULES: LazyLock<Vec<Arc<ReplacementRule>>> = LazyLock::new(|| {
    vec![
        Arc::new(
            ReplacementRule::new(
                "missing_open_quote_element",
                r#"([\[,][ \t\r\n]*)([A-Za-z][\w ./-]*)"([ \t\r\n]*[,\]])"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("{}\"{}\"{}", &caps[1], &caps[2], &caps[3]))
                },
            )
            .check(deep_array_check)
            .describe("Added missing opening quote to array element"),
        ),
        Arc::new(
            ReplacementRule::new(
                "minus_bullet_element",
                r#"([\[,][ \t]*\n[ \t]*)-[ \t]+(")"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("{}{}", &caps[1], &caps[2]))
                },
            )
            .check(deep_array_check)
            .describe("Removed bullet before array element"),
        ),
        Arc::new(
            ReplacementRule::new(
                "asterisk_bullet_element",
                r#"([\[,][ \t]*\n[ \t]*)\*[ \t]+(")"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("{}{}", &caps[1], &caps[2]))
                },
            )
            .check(deep_array_check)
            .describe("Removed markdown list marker before array element"),
        ),
        Arc::new(
            ReplacementRule::new(
                "stray_after_string_element",
                r#"("[^"\n]*")[ \t]+([A-Za-z][^,\]\n"]*?)[ \t]*([,\]])"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("{}{}", &caps[1], &caps[3]))
                },
            )
            .check(|caps: &Captures, ctx: &ContextInfo| {
                looks_like_stray_text(&caps[2], &StrayTextOptions::default())
                    && is_in_array_context_deep(ctx.full_content, ctx.offset, ctx.boundary())
            })
            .describe("Removed stray content after array element"),
        ),
        Arc::new(
            ReplacementRule::new(
                "stray_library_name",
                r"(?m)^[ \t]*[\w.-]+\.(?:jar|so|dll)[ \t]*,?[ \t]*\n?",
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::remove(),
            )
            .check(deep_array_check)
            .describe("Removed stray library name"),
        ),
        Arc::new(
            ReplacementRule::new(
                "unterminated_string_at_line_end",
                r#""([^"\n]*)\n([ \t]*)""#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("\"{}\",\n{}\"", &caps[1], &caps[2]))
                },
            )
            .allow_in_string()
            .check(|caps: &Captures, ctx: &ContextInfo| {
                // Only a genuine opening quote qualifies: its interior and
                // the newline itself must sit inside the unterminated literal
                let Some(m) = caps.get(0) else {
                    return false;
                };
                let newline = m.start() + 1 + caps[1].len();
                ctx.is_in_string(m.start() + 1)
                    && ctx.is_in_string(newline)
                    && is_in_array_context_deep(ctx.full_content, m.start(), ctx.boundary())
            })
            .describe("Closed unterminated string at line end"),
        ),
        Arc::new(
            ReplacementRule::new(
                "text_after_closing_bracket",
                r#"\]([ \t]+)([A-Za-z][^\n,}\]"]*)"#,
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::with("]"),
            )
            .check(|caps: &Captures, _ctx: &ContextInfo| {
                looks_like_stray_text(&caps[2], &StrayTextOptions::default())
            })
            .describe("Removed stray text after closing bracket"),
        ),
        Arc::new(
            ReplacementRule::new(
                "non_ascii_before_element",
                r#"([\[,][ \t\r\n]*)[^\x00-\x7F]+[ \t]*(")"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("{}{}", &caps[1], &caps[2]))
                },
            )
            .check(deep_array_check)
            .describe("Removed non-ASCII characters before array element"),
        ),
        Arc::new(
            ReplacementRule::new(
                "stray_stop_token",
                r"([\[,])[ \t\r\n]*stop[ \t\r\n]*,?",
                |caps: &Captures, _ctx: &ContextInfo| RuleEdit::with(caps[1].to_string()),
            )
            .check(deep_array_check)
            .describe("Removed stray stop token"),
        ),
        Arc::new(
            ReplacementRule::new(
                "trailing_comma_in_array",
                r",([ \t\r\n]*\])",
                |caps: &Captures, _ctx: &ContextInfo| RuleEdit::with(caps[1].to_string()),
            )
            .describe("Removed trailing comma in array"),
        ),
        Arc::new(
            ReplacementRule::new(
                "property_like_value_in_direct_array",
                r#"([\[,][ \t\r\n]*)([A-Za-z_][\w-]*[ \t]*:[ \t]*[^,\]\n"]+)"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("{}\"{}\"", &caps[1], caps[2].trim_end()))
                },
            )
            .check(deep_array_check)
            .describe("Quoted property-like value in array"),
        ),
    ]
});

pub fn rules() -> &'static [Arc<ReplacementRule>] {
    &RULES
}
