//! Property-Name Rules
//!
//! Fourth rule group: repairs to damaged property names and the syntax
//! around them. Corrupted name/colon sequences, missing quotes, duplicated
//! names, and schema-aware inference of truncated names.

use std::sync::{Arc, LazyLock};

use regex::Captures;

use crate::constants::inference::{FALLBACK_NAME, MIN_FRAGMENT_LEN};
use crate::rules::{ContextInfo, ReplacementRule, RuleEdit};
use crate::scan::is_in_object_context_deep;

/// Infer the full property name a truncated fragment belongs to.
///
/// Longest suffix match over the known properties wins, then longest prefix
/// match; ties resolve to the lexicographically smaller name. Falls back to
/// a generic name when nothing matches.
pub(crate) fn infer_property_name(fragment: &str, known_properties: &[String]) -> String {
    let fragment = fragment.to_ascii_lowercase();
    if fragment.len() < MIN_FRAGMENT_LEN {
        return FALLBACK_NAME.to_string();
    }

    let pick = |matches: &mut dyn Iterator<Item = &String>| -> Option<String> {
        let mut best: Option<&String> = None;
        for prop in matches {
            best = Some(match best {
                None => prop,
                Some(current) => {
                    if prop.len() > current.len()
                        || (prop.len() == current.len() && prop < current)
                    {
                        prop
                    } else {
                        current
                    }
                }
            });
        }
        best.cloned()
    };

    let mut suffix_matches = known_properties
        .iter()
        .filter(|p| p.to_ascii_lowercase().ends_with(&fragment));
    if let Some(name) = pick(&mut suffix_matches) {
        return name;
    }

    let mut prefix_matches = known_properties
        .iter()
        .filter(|p| p.to_ascii_lowercase().starts_with(&fragment));
    if let Some(name) = pick(&mut prefix_matches) {
        return name;
    }

    FALLBACK_NAME.to_string()
}

static RULES: LazyLock<Vec<Arc<ReplacementRule>>> = LazyLock::new(|| {
    vec![
        Arc::new(
            ReplacementRule::new(
                "corrupted_name_after_colon",
                r#""([A-Za-z_]\w*)"[ \t]*:[ \t]*[A-Za-z_]\w*"[ \t]*:"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("\"{}\":", &caps[1]))
                },
            )
            .describe("Repaired corrupted property name after colon"),
        ),
        Arc::new(
            ReplacementRule::new(
                "corrupted_value_artifact",
                r#""([A-Za-z_]\w*)"[ \t]*:[ \t]*_[A-Z]+[`']?([0-9][\d.]*|"[^"\n]*")"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("\"{}\": {}", &caps[1], &caps[2]))
                },
            )
            .describe("Removed corrupted value artifact"),
        ),
        Arc::new(
            ReplacementRule::new(
                "missing_quotes_before_bracket",
                r"([{,][ \t\r\n]*)([A-Za-z_]\w*)([ \t]*:[ \t]*[\[{])",
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("{}\"{}\"{}", &caps[1], &caps[2], &caps[3]))
                },
            )
            .describe("Added missing quotes to property name"),
        ),
        Arc::new(
            ReplacementRule::new(
                "missing_open_quote_name",
                r#"([{,][ \t\r\n]*)([A-Za-z_]\w*)"([ \t]*:)"#,
                |caps: &Captures, ctx: &ContextInfo| {
                    let fragment = &caps[2];
                    let known = &ctx.config.known_properties;
                    // A fragment that is not itself a known property is left
                    // for the inference rule
                    if !known.is_empty() && !ctx.config.is_known_property(fragment) {
                        return None;
                    }
                    RuleEdit::with(format!("{}\"{}\"{}", &caps[1], fragment, &caps[3]))
                },
            )
            .describe("Added missing opening quote to property name"),
        ),
        Arc::new(
            ReplacementRule::new(
                "space_joined_name_value",
                r#""([A-Za-z_]\w*) ([A-Za-z0-9_.-]+)"([ \t]*[,}\n])"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!(
                        "\"{}\": \"{}\"{}",
                        &caps[1], &caps[2], &caps[3]
                    ))
                },
            )
            .check(|_caps: &Captures, ctx: &ContextInfo| {
                // A comma alone cannot distinguish object from array; only
                // the backward bracket scan may authorize this rewrite
                is_in_object_context_deep(ctx.full_content, ctx.offset, ctx.boundary())
            })
            .describe("Split space-joined name-value pair"),
        ),
        Arc::new(
            ReplacementRule::new(
                "misplaced_colon_value",
                r#""([A-Za-z_]\w*)":[A-Za-z_]\w*":([ \t]*"[^"\n]*")"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("\"{}\":{}", &caps[1], &caps[2]))
                },
            )
            .describe("Repaired property with misplaced colon"),
        ),
        Arc::new(
            ReplacementRule::new(
                "missing_colon",
                r#""([A-Za-z_]\w*)"([ \t]+)("[^"\n]*"|[0-9][\d.]*|true|false|null|\{|\[)"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("\"{}\":{}{}", &caps[1], &caps[2], &caps[3]))
                },
            )
            .check(|_caps: &Captures, ctx: &ContextInfo| {
                is_in_object_context_deep(ctx.full_content, ctx.offset, ctx.boundary())
            })
            .describe("Added missing colon after property name"),
        ),
        Arc::new(
            ReplacementRule::new(
                "truncated_name_inference",
                r#"([{,][ \t\r\n]*)([a-z]\w{0,10})"([ \t]*):"#,
                |caps: &Captures, ctx: &ContextInfo| {
                    let known = &ctx.config.known_properties;
                    if known.is_empty() || ctx.config.is_known_property(&caps[2]) {
                        return None;
                    }
                    let inferred = infer_property_name(&caps[2], known);
                    RuleEdit::with(format!("{}\"{}\"{}:", &caps[1], inferred, &caps[3]))
                },
            )
            .describe_with(|caps: &Captures| {
                format!("Inferred truncated property name from '{}'", &caps[2])
            }),
        ),
        Arc::new(
            ReplacementRule::new(
                "duplicated_property_name",
                r#""([A-Za-z_]\w*)"[ \t]*:[ \t]*"([A-Za-z_]\w*)"[ \t]*:"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    if caps[1] != caps[2] {
                        return None;
                    }
                    RuleEdit::with(format!("\"{}\":", &caps[1]))
                },
            )
            .describe("Collapsed duplicated property name"),
        ),
        Arc::new(
            ReplacementRule::new(
                "non_ascii_quote_before_key",
                r#"[\x{201C}\x{201D}\x{2018}\x{2019}\x{201E}]([A-Za-z_]\w*)["\x{201C}\x{201D}\x{2018}\x{2019}]?([ \t]*:)"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("\"{}\"{}", &caps[1], &caps[2]))
                },
            )
            .describe("Normalized non-ASCII quotes around property name"),
        ),
        Arc::new(
            ReplacementRule::new(
                "embedded_value_word",
                r#""([A-Za-z_]\w*) ([A-Za-z_]\w*)"([ \t]*:)"#,
                |caps: &Captures, ctx: &ContextInfo| {
                    if !ctx.config.is_known_property(&caps[1]) {
                        return None;
                    }
                    RuleEdit::with(format!("\"{}\"{}", &caps[1], &caps[3]))
                },
            )
            .describe("Removed embedded value word from property name"),
        ),
        Arc::new(
            ReplacementRule::new(
                "dash_before_property_name",
                r#"([{,][ \t]*\n?[ \t]*)-[ \t]*(")"#,
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("{}{}", &caps[1], &caps[2]))
                },
            )
            .describe("Removed dash before property name"),
        ),
        Arc::new(
            ReplacementRule::new(
                "unquoted_property_name",
                r"([{,][ \t\r\n]*)([A-Za-z_]\w*)([ \t]*:)",
                |caps: &Captures, _ctx: &ContextInfo| {
                    RuleEdit::with(format!("{}\"{}\"{}", &caps[1], &caps[2], &caps[3]))
                },
            )
            .describe("Quoted unquoted property name"),
        ),
    ]
});

pub fn rules() -> &'static [Arc<ReplacementRule>] {
    &RULES
}
