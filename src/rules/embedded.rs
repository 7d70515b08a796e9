//! Embedded-Content Rules
//!
//! First rule group: removes non-JSON content the model interleaved with the
//! document. YAML fragments, `extra_*` attributes, binary corruption markers,
//! prose commentary, and whole properties whose keys are LLM artifacts.
//! Schema-declared property names are never removed.

use std::sync::{Arc, LazyLock};

use regex::Captures;

use crate::heuristics::{
    StrayTextOptions, looks_like_first_person_statement, looks_like_non_json_key,
    looks_like_sentence_structure, looks_like_stray_text,
};
use crate::rules::{ContextInfo, ReplacementRule, RuleEdit};
use crate::scan::{find_property_value_end, find_unmatched_open, is_after_json_delimiter};

/// Tokens that mark a property as model working state rather than payload
const ARTIFACT_TOKENS: &[&str] = &[
    "thought",
    "reasoning",
    "scratchpad",
    "analysis",
    "trace",
    "chain",
    "intermediate",
    "working_memory",
    "step_by_step",
];

pub(crate) fn key_contains_artifact_token(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    ARTIFACT_TOKENS.iter().any(|token| lower.contains(token))
}

/// Remove a matched `"key":` prefix together with its whole value span and a
/// trailing comma when present
fn remove_property_span(caps: &Captures, ctx: &ContextInfo) -> Option<RuleEdit> {
    let m = caps.get(0)?;
    let value_end = find_property_value_end(ctx.full_content, m.end())?;
    let rest = &ctx.full_content[value_end..];
    let after_ws = rest.len() - rest.trim_start().len();
    let end = if rest.trim_start().starts_with(',') {
        value_end + after_ws + 1
    } else {
        value_end
    };
    RuleEdit::remove_through(end)
}

static RULES: LazyLock<Vec<Arc<ReplacementRule>>> = LazyLock::new(|| {
    vec![
        Arc::new(
            ReplacementRule::new(
                "yaml_list_block",
                r"(?m)^[ \t]*([A-Za-z_][\w-]*):[ \t]*\n((?:[ \t]*-[ \t][^\n]*\n?)+)",
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::remove(),
            )
            .check(|caps: &Captures, ctx: &ContextInfo| {
                let key = &caps[1];
                let outside_json =
                    find_unmatched_open(ctx.full_content, ctx.offset, ctx.boundary()).is_none();
                looks_like_non_json_key(key, &ctx.config.known_properties)
                    || (outside_json && !ctx.config.is_known_property(key))
            })
            .describe("Removed YAML-style list block"),
        ),
        Arc::new(
            ReplacementRule::new(
                "yaml_simple_value",
                r#"(?m)^[ \t]*([A-Za-z_][\w-]*):[ \t]+([^"{\[\n][^\n]*)\n?"#,
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::remove(),
            )
            .check(|caps: &Captures, ctx: &ContextInfo| {
                let key = &caps[1];
                if ctx.config.is_known_property(key) {
                    return false;
                }
                let outside_json =
                    find_unmatched_open(ctx.full_content, ctx.offset, ctx.boundary()).is_none();
                looks_like_non_json_key(key, &ctx.config.known_properties) || outside_json
            })
            .describe("Removed YAML-style key-value line"),
        ),
        Arc::new(
            ReplacementRule::new(
                "extra_attribute_assignment",
                r#"extra_\w+[ \t]*=[ \t]*"[^"\n]*"[ \t]*,?"#,
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::remove(),
            )
            .describe("Removed extra_* attribute assignment"),
        ),
        Arc::new(
            ReplacementRule::new(
                "extra_block_line",
                r"(?m)^[ \t]*extra_\w+[ \t]*:[ \t]*[^\n]*\n?",
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::remove(),
            )
            .describe("Removed extra_* block"),
        ),
        Arc::new(
            ReplacementRule::new(
                "binary_corruption_marker",
                r"<x_bin_\d+>",
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::remove(),
            )
            .describe("Removed binary corruption marker"),
        ),
        Arc::new(
            ReplacementRule::new(
                "ai_warning_sentence",
                r"(?mi)^[ \t]*[^\n{}\[\]]*\bai[- ]generated\b[^\n]*\n?",
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::remove(),
            )
            .describe("Removed AI-content warning"),
        ),
        Arc::new(
            ReplacementRule::new(
                "truncation_marker_line",
                r"(?m)^[ \t]*(\.\.\.|\x{2026})[^\n]*\n?",
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::remove(),
            )
            .describe("Removed truncation marker line"),
        ),
        Arc::new(
            ReplacementRule::new(
                "explanatory_line_in_array",
                r#"(?m)^[ \t]*([A-Za-z][^"\n{}\[\]]*)\n"#,
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::remove(),
            )
            .check(|caps: &Captures, ctx: &ContextInfo| {
                let line = &caps[1];
                let in_array = find_unmatched_open(ctx.full_content, ctx.offset, ctx.boundary())
                    == Some('[');
                in_array
                    && (looks_like_sentence_structure(line)
                        || looks_like_first_person_statement(line))
            })
            .describe("Removed explanatory line inside array"),
        ),
        Arc::new(
            ReplacementRule::new(
                "commentary_before_property",
                r#"(?m)^([A-Za-z][^\n:{}\[\]"]*)\n([ \t]*")"#,
                |caps: &Captures, _ctx: &ContextInfo| RuleEdit::with(caps[2].to_string()),
            )
            .check(|caps: &Captures, _ctx: &ContextInfo| {
                let line = &caps[1];
                looks_like_sentence_structure(line) || looks_like_first_person_statement(line)
            })
            .describe("Removed explanatory text before property"),
        ),
        Arc::new(
            ReplacementRule::new(
                "stray_single_word_line",
                r"(?m)^[ \t]*([a-z]{1,12})[ \t]*\n",
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::remove(),
            )
            .check(|caps: &Captures, ctx: &ContextInfo| {
                looks_like_stray_text(&caps[1], &StrayTextOptions::default())
                    && is_after_json_delimiter(ctx.before_match(), ctx.offset)
            })
            .describe("Removed stray line"),
        ),
        Arc::new(
            ReplacementRule::new(
                "config_assignment_before_property",
                r#"(?m)^[ \t]*[A-Za-z_][\w.]*[ \t]*=[ \t]*[^\n]*\n([ \t]*")"#,
                |caps: &Captures, _ctx: &ContextInfo| RuleEdit::with(caps[1].to_string()),
            )
            .describe("Removed configuration-style assignment"),
        ),
        Arc::new(
            ReplacementRule::new(
                "llm_prefixed_property",
                r#""((?:extra_|_llm_|_ai_)\w+)"\s*:\s*"#,
                remove_property_span,
            )
            .describe("Removed LLM-artifact property"),
        ),
        Arc::new(
            ReplacementRule::new(
                "llm_artifact_token_property",
                r#""([A-Za-z_]\w*)"\s*:\s*"#,
                |caps: &Captures, ctx: &ContextInfo| {
                    let key = &caps[1];
                    if ctx.config.is_known_property(key) || !key_contains_artifact_token(key) {
                        return None;
                    }
                    remove_property_span(caps, ctx)
                },
            )
            .describe("Removed LLM-artifact property"),
        ),
    ]
});

pub fn rules() -> &'static [Arc<ReplacementRule>] {
    &RULES
}
