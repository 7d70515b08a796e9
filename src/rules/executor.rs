//! Replacement-Rule Executor
//!
//! Applies an ordered rule set over content. Per match: skip when inside a
//! string literal (unless the rule opts out), consult the context check,
//! then substitute only when the replacement differs from the original.
//! Optional multi-pass mode iterates to a fixed point bounded by
//! `max_passes`. The string-boundary checker is rebuilt only when a rule
//! mutates the content.

use std::sync::Arc;

use tracing::debug;

use crate::config::SanitizerConfig;
use crate::constants::executor::{MAX_DIAGNOSTICS, MAX_PASSES};
use crate::diagnostics::DiagnosticCollector;
use crate::rules::{ContextInfo, ReplacementRule, RuleEdit};
use crate::scan::StringBoundaryChecker;
use crate::types::SanitizeOutcome;

/// Umbrella pipeline-step label when any rule changed the content
pub const RULES_APPLIED_DESCRIPTION: &str = "Applied replacement rules";

/// Executor tuning for one invocation
pub struct ExecutorOptions<'a> {
    pub max_diagnostics: usize,
    pub multi_pass: bool,
    pub max_passes: usize,
    pub config: &'a SanitizerConfig,
}

impl<'a> ExecutorOptions<'a> {
    /// Single pass over the rule set
    pub fn single_pass(config: &'a SanitizerConfig) -> Self {
        Self {
            max_diagnostics: MAX_DIAGNOSTICS,
            multi_pass: false,
            max_passes: 1,
            config,
        }
    }

    /// Iterate to a fixed point, bounded by the generic pass cap
    pub fn multi_pass(config: &'a SanitizerConfig) -> Self {
        Self {
            max_diagnostics: MAX_DIAGNOSTICS,
            multi_pass: true,
            max_passes: MAX_PASSES,
            config,
        }
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }
}

/// Run the rule set over `content` and report the rewritten content with the
/// bounded repair trail
pub fn execute_rules(
    content: &str,
    rules: &[Arc<ReplacementRule>],
    options: &ExecutorOptions<'_>,
) -> SanitizeOutcome {
    if content.is_empty() || rules.is_empty() {
        return SanitizeOutcome::unchanged(content);
    }

    let mut current = content.to_string();
    let mut collector = DiagnosticCollector::with_capacity(options.max_diagnostics);
    let mut any_change = false;
    let pass_limit = if options.multi_pass {
        options.max_passes.max(1)
    } else {
        1
    };

    for pass in 0..pass_limit {
        let mut checker = StringBoundaryChecker::new(&current);
        let mut pass_changed = false;

        for rule in rules {
            if let Some(rewritten) =
                apply_rule(&current, rule, &checker, options.config, &mut collector)
            {
                debug!(rule = rule.name(), pass, "rule rewrote content");
                current = rewritten;
                checker = StringBoundaryChecker::new(&current);
                pass_changed = true;
                any_change = true;
            }
        }

        if !pass_changed {
            break;
        }
    }

    if !any_change {
        return SanitizeOutcome::unchanged(current);
    }

    SanitizeOutcome {
        content: current,
        changed: true,
        description: Some(RULES_APPLIED_DESCRIPTION.to_string()),
        repairs: collector.into_vec(),
    }
}

/// Apply one rule over the whole content, left to right, non-overlapping.
/// Returns the rewritten content only when at least one match was replaced.
fn apply_rule(
    content: &str,
    rule: &ReplacementRule,
    checker: &StringBoundaryChecker,
    config: &SanitizerConfig,
    collector: &mut DiagnosticCollector,
) -> Option<String> {
    let mut out = String::with_capacity(content.len());
    let mut pos = 0usize;
    let mut changed = false;

    while pos <= content.len() {
        let Some(caps) = rule.pattern().captures_at(content, pos) else {
            break;
        };
        let Some(m) = caps.get(0) else {
            break;
        };

        out.push_str(&content[pos..m.start()]);
        pos = m.end();

        let skipped = rule.skip_in_string() && checker.is_in_string(m.start());
        let mut replaced = false;

        if !skipped {
            let ctx = ContextInfo::new(
                m.start(),
                content,
                config,
                rule.context_lookback(),
                checker,
            );
            let check_ok = rule
                .context_check()
                .is_none_or(|check| check(&caps, &ctx));

            if check_ok && let Some(edit) = (rule.replacement())(&caps, &ctx) {
                match edit {
                    RuleEdit::Text(text) => {
                        if text != m.as_str() {
                            collector.add(rule.diagnostic().render(&caps));
                            out.push_str(&text);
                            replaced = true;
                        }
                    }
                    RuleEdit::Span { end, text } => {
                        let valid = end >= m.end()
                            && end <= content.len()
                            && content.is_char_boundary(end);
                        if valid && text != &content[m.start()..end] {
                            collector.add(rule.diagnostic().render(&caps));
                            out.push_str(&text);
                            pos = end;
                            replaced = true;
                        }
                    }
                }
            }
        }

        if !replaced {
            out.push_str(m.as_str());
        }
        changed |= replaced;

        // An empty match must still advance the scan position
        if pos == m.start() {
            match content[pos..].chars().next() {
                Some(c) => {
                    out.push(c);
                    pos += c.len_utf8();
                }
                None => break,
            }
        }
    }

    out.push_str(&content[pos.min(content.len())..]);
    changed.then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Captures;

    fn rule(name: &'static str, pattern: &str) -> Arc<ReplacementRule> {
        Arc::new(ReplacementRule::new(
            name,
            pattern,
            |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::remove(),
        ))
    }

    #[test]
    fn test_empty_input_is_noop() {
        let config = SanitizerConfig::default();
        let rules = vec![rule("drop_x", "x")];
        let outcome = execute_rules("", &rules, &ExecutorOptions::single_pass(&config));
        assert!(!outcome.changed);
    }

    #[test]
    fn test_empty_rule_list_is_noop() {
        let config = SanitizerConfig::default();
        let outcome = execute_rules("xxx", &[], &ExecutorOptions::single_pass(&config));
        assert!(!outcome.changed);
        assert_eq!(outcome.content, "xxx");
    }

    #[test]
    fn test_replaces_outside_strings_only() {
        let config = SanitizerConfig::default();
        let rules = vec![rule("drop_hash", "#")];
        let content = r##"{"a": "#keep"} #drop"##;
        let outcome = execute_rules(content, &rules, &ExecutorOptions::single_pass(&config));
        assert!(outcome.changed);
        assert_eq!(outcome.content, r##"{"a": "#keep"} drop"##);
        assert_eq!(outcome.repairs, vec!["drop_hash"]);
    }

    #[test]
    fn test_allow_in_string_overrides_skip() {
        let config = SanitizerConfig::default();
        let rules = vec![Arc::new(
            ReplacementRule::new("drop_hash", "#", |_caps: &Captures, _ctx: &ContextInfo| {
                RuleEdit::remove()
            })
            .allow_in_string(),
        )];
        let content = r##"{"a": "#gone"}"##;
        let outcome = execute_rules(content, &rules, &ExecutorOptions::single_pass(&config));
        assert_eq!(outcome.content, r#"{"a": "gone"}"#);
    }

    #[test]
    fn test_context_check_false_keeps_match() {
        let config = SanitizerConfig::default();
        let rules = vec![Arc::new(
            ReplacementRule::new("gated", "x", |_caps: &Captures, _ctx: &ContextInfo| {
                RuleEdit::remove()
            })
            .check(|_caps: &Captures, _ctx: &ContextInfo| false),
        )];
        let outcome = execute_rules("axa", &rules, &ExecutorOptions::single_pass(&config));
        assert!(!outcome.changed);
        assert_eq!(outcome.content, "axa");
    }

    #[test]
    fn test_null_replacement_keeps_match() {
        let config = SanitizerConfig::default();
        let rules = vec![Arc::new(ReplacementRule::new(
            "declined",
            "x",
            |_caps: &Captures, _ctx: &ContextInfo| None,
        ))];
        let outcome = execute_rules("axa", &rules, &ExecutorOptions::single_pass(&config));
        assert!(!outcome.changed);
    }

    #[test]
    fn test_identical_replacement_records_nothing() {
        let config = SanitizerConfig::default();
        let rules = vec![Arc::new(ReplacementRule::new(
            "identity",
            "x",
            |caps: &Captures, _ctx: &ContextInfo| RuleEdit::with(caps[0].to_string()),
        ))];
        let outcome = execute_rules("axa", &rules, &ExecutorOptions::single_pass(&config));
        assert!(!outcome.changed);
        assert!(outcome.repairs.is_empty());
    }

    #[test]
    fn test_span_edit_consumes_past_match() {
        let config = SanitizerConfig::default();
        let rules = vec![Arc::new(ReplacementRule::new(
            "drop_value",
            r#""extra_notes"\s*:\s*"#,
            |caps: &Captures, ctx: &ContextInfo| {
                let m = caps.get(0)?;
                crate::scan::find_json_value_end(ctx.full_content, m.end())
                    .and_then(RuleEdit::remove_through)
            },
        ))];
        let content = r#"{"extra_notes": {"a": 1}, "keep": 2}"#;
        let outcome = execute_rules(content, &rules, &ExecutorOptions::single_pass(&config));
        assert!(outcome.changed);
        assert_eq!(outcome.content, r#"{, "keep": 2}"#);
    }

    #[test]
    fn test_multi_pass_reaches_fixed_point() {
        let config = SanitizerConfig::default();
        // Each pass halves runs of "xx" into "x"
        let rules = vec![Arc::new(ReplacementRule::new(
            "halve",
            "xx",
            |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::with("x"),
        ))];
        let outcome = execute_rules(
            "xxxxxxxx",
            &rules,
            &ExecutorOptions::multi_pass(&config).with_max_passes(10),
        );
        assert_eq!(outcome.content, "x");
    }

    #[test]
    fn test_multi_pass_bounded_by_max_passes() {
        let config = SanitizerConfig::default();
        let rules = vec![Arc::new(ReplacementRule::new(
            "halve",
            "xx",
            |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::with("x"),
        ))];
        let outcome = execute_rules(
            "xxxxxxxxxxxxxxxx",
            &rules,
            &ExecutorOptions::multi_pass(&config).with_max_passes(2),
        );
        // 16 -> 8 -> 4, then the pass budget is spent
        assert_eq!(outcome.content, "xxxx");
    }

    #[test]
    fn test_diagnostics_bounded() {
        let config = SanitizerConfig::default();
        let rules = vec![rule("drop_x", "x")];
        let content = "x".repeat(100);
        let outcome = execute_rules(&content, &rules, &ExecutorOptions::single_pass(&config));
        assert!(outcome.repairs.len() <= MAX_DIAGNOSTICS);
    }

    #[test]
    fn test_rules_apply_in_declared_order() {
        let config = SanitizerConfig::default();
        let rules = vec![
            Arc::new(ReplacementRule::new(
                "a_to_b",
                "a",
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::with("b"),
            )),
            Arc::new(ReplacementRule::new(
                "b_to_c",
                "b",
                |_caps: &Captures, _ctx: &ContextInfo| RuleEdit::with("c"),
            )),
        ];
        let outcome = execute_rules("a", &rules, &ExecutorOptions::single_pass(&config));
        assert_eq!(outcome.content, "c");
        assert_eq!(outcome.repairs, vec!["a_to_b", "b_to_c"]);
    }
}
