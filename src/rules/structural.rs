//! Structural Rules
//!
//! Second rule group: repairs to the document skeleton. Duplicate or
//! mismatched closers, stray dashes and artifact characters around
//! delimiters, missing or trailing commas, unclosed arrays, and explanatory
//! text left after the final closing brace.

use std::sync::{Arc, LazyLock};

use regex::Captures;

use crate::heuristics::{
    StrayTextOptions, looks_like_first_person_statement, looks_like_sentence_structure,
    looks_like_stray_text, looks_like_truncation_marker,
};
use crate::rules::{ContextInfo, ReplacementRule, RuleEdit};
use crate::scan::{find_unmatched_open, is_after_json_delimiter, is_in_object_context_deep};

/// Count opening and closing delimiters outside string literals
fn delimiter_balance(ctx: &ContextInfo) -> (usize, usize) {
    let mut opens = 0usize;
    let mut closes = 0usize;
    for (i, b) in ctx.full_content.bytes().enumerate() {
        if ctx.is_in_string(i) {
            continue;
        }
        match b {
            b'{' | b'[' => opens += 1,
            b'}' | b']' => closes += 1,
            _ => {}
        }
    }
    (opens, closes)
}

static RULES: LazyLock<Vec<Arc<ReplacementRule>>> = LazyLock::new(|| {
    vec![
        Arc::new(
            ReplacementRule::new(
                "duplicate_trailing_closer",
                r"([}\]])[ \t\r\n]*([}\]])[ \t\r\n]*\z",
                |caps: &Captures, _ctx: &ContextInfo| RuleEdit::with(caps[1].to_string()),
            )
            .check(|caps: &Captures, ctx: &ContextInfo| {
                if caps[1] != caps[2] {
                    return false;
                }
                let (opens, closes) = delimiter_balance(ctx);
                closes > opens
            })
            .describe("Removed duplicate trailing closer"),
        ),
        Arc::new(
            ReplacementRule::new(
                "malformed_identifier_object",
                r"\{[ \t]*[A-Za-z_][A-Za-z0-9_ ]*[ \t]*\}",
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::with("{}"),
            )
            .describe("Replaced malformed identifier object with empty object"),
        ),
        Arc::new(
            ReplacementRule::new(
                "truncation_ellipsis_in_array",
                r",?[ \t\r\n]*\.\.\.[ \t\r\n]*\]",
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::with("]"),
            )
            .describe("Removed truncation ellipsis before array close"),
        ),
        Arc::new(
            ReplacementRule::new(
                "stray_dash_after_delimiter",
                r"([}\],])[ \t]*\n[ \t]*-[ \t]*\n",
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("{}\n", &caps[1]))
                },
            )
            .describe("Removed stray dash line"),
        ),
        Arc::new(
            ReplacementRule::new(
                "stray_single_char_line",
                r#"(?m)^[ \t]*[^\sA-Za-z0-9"{}\[\],:][ \t]*\n"#,
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::remove(),
            )
            .check(|_caps: &Captures, ctx: &ContextInfo| {
                is_after_json_delimiter(ctx.before_match(), ctx.offset)
            })
            .describe("Removed stray character line"),
        ),
        Arc::new(
            ReplacementRule::new(
                "dash_after_opening_brace",
                r#"\{[ \t]*-[ \t]*""#,
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::with("{ \""),
            )
            .describe("Removed dash after opening brace"),
        ),
        Arc::new(
            ReplacementRule::new(
                "string_array_literal",
                r#":([ \t]*)"\[\]""#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!(":{}[]", &caps[1]))
                },
            )
            .describe("Converted string array literal to array"),
        ),
        Arc::new(
            ReplacementRule::new(
                "text_after_final_close",
                r"([}\]])[ \t]*\n[ \t]*([A-Za-z][^{}\[\]]*)\z",
                |caps: &Captures, _ctx: &ContextInfo| RuleEdit::with(caps[1].to_string()),
            )
            .check(|caps: &Captures, ctx: &ContextInfo| {
                let (opens, closes) = delimiter_balance(ctx);
                if opens != closes {
                    return false;
                }
                let tail = &caps[2];
                looks_like_sentence_structure(tail)
                    || looks_like_first_person_statement(tail)
                    || looks_like_truncation_marker(tail)
                    || looks_like_stray_text(tail, &StrayTextOptions::default())
            })
            .describe("Removed truncated/explanatory text after final closing brace"),
        ),
        Arc::new(
            ReplacementRule::new(
                "missing_comma_after_array",
                r#"\]([ \t]*\n[ \t]*)""#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("],{}\"", &caps[1]))
                },
            )
            .check(|_caps: &Captures, ctx: &ContextInfo| {
                // Include the closing bracket in the scan so its own array
                // balances away and the enclosing delimiter surfaces
                is_in_object_context_deep(ctx.full_content, ctx.offset + 1, ctx.boundary())
            })
            .describe("Added missing comma after array"),
        ),
        Arc::new(
            ReplacementRule::new(
                "unclosed_array_before_property",
                r#"("[^"\n]*"|[0-9.]+|true|false|null)([ \t]*\n[ \t]*)"([A-Za-z_][\w-]*)"([ \t]*):"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!(
                        "{}],{}\"{}\"{}:",
                        &caps[1], &caps[2], &caps[3], &caps[4]
                    ))
                },
            )
            .check(|_caps: &Captures, ctx: &ContextInfo| {
                find_unmatched_open(ctx.full_content, ctx.offset, ctx.boundary()) == Some('[')
            })
            .describe("Closed unterminated array before property"),
        ),
        Arc::new(
            ReplacementRule::new(
                "trailing_comma",
                r",([ \t\r\n]*[}\]])",
                |caps: &Captures, _ctx: &ContextInfo| RuleEdit::with(caps[1].to_string()),
            )
            .describe("Removed trailing comma"),
        ),
        Arc::new(
            ReplacementRule::new(
                "unescaped_quotes_in_value",
                r#":[ \t]*"([^"\n]*)"([A-Za-z][^"\n]*)"([^"\n]*)"([ \t]*[,}\]\n])"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!(
                        ": \"{}\\\"{}\\\"{}\"{}",
                        &caps[1], &caps[2], &caps[3], &caps[4]
                    ))
                },
            )
            .describe("Escaped unescaped quotes inside string value"),
        ),
        Arc::new(
            ReplacementRule::new(
                "comma_dash_artifact",
                r#",[ \t]*-[ \t]*(\n|")"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!(",{}", &caps[1]))
                },
            )
            .describe("Removed stray comma-dash artifact"),
        ),
        Arc::new(
            ReplacementRule::new(
                "double_comma_artifact",
                r",[ \t\r\n]*,",
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::with(","),
            )
            .describe("Collapsed duplicate commas"),
        ),
    ]
});

pub fn rules() -> &'static [Arc<ReplacementRule>] {
    &RULES
}
