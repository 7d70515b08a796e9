//! Sanitizer Pipeline
//!
//! Six phases wrapping rule groups and coarse text operations. The pipeline
//! attempts a strict parse on the raw content first (fast path), then after
//! every sanitizer that changes the content, returning on the first success.
//! A sanitizer that itself fails is absorbed: the content passes through
//! unchanged and the failure is recorded as a repair entry.

pub mod artifacts;
pub mod comments;
pub mod noise;
pub mod normalize;
pub mod syntax;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::LazyLock;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::SanitizerConfig;
use crate::constants::executor::{MAX_DIAGNOSTICS, PIPELINE_MAX_PASSES};
use crate::rules::{ExecutorOptions, all_rules, execute_rules};
use crate::types::{ParseOutcome, SanitizeOutcome};

pub use artifacts::RemoveTokenArtifacts;
pub use comments::RemoveComments;
pub use noise::{
    CODE_FENCE_DESCRIPTION, CollapseDuplicateObjects, DropInvalidPrefix, DropTruncationMarkers,
    ExtractLargestSpan, StripCodeFences, TRIM_DESCRIPTION, TrimWhitespace,
};
pub use normalize::{
    NormalizeQuotes, NormalizeWhitespace, RemoveControlChars, RepairEscapes,
    WHITESPACE_DESCRIPTION,
};
pub use syntax::{
    AddMissingCommas, CompleteTruncatedStructures, FixMissingObjectOpen,
    MatchMismatchedDelimiters, RemoveTrailingCommas,
};

/// One step of the sanitizer pipeline
pub trait Sanitizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rewrite `content`, reporting whether anything changed together with
    /// the repair trail. Must be a no-op on its own fixed point.
    fn sanitize(&self, content: &str, config: &SanitizerConfig) -> SanitizeOutcome;
}

/// Property-and-value fixes: the full rule library under the executor with
/// bounded multi-pass iteration
pub struct RuleEngine;

impl Sanitizer for RuleEngine {
    fn name(&self) -> &'static str {
        "rule_engine"
    }

    fn sanitize(&self, content: &str, config: &SanitizerConfig) -> SanitizeOutcome {
        let rules = all_rules(config);
        execute_rules(
            content,
            &rules,
            &ExecutorOptions::multi_pass(config).with_max_passes(PIPELINE_MAX_PASSES),
        )
    }
}

/// All sanitizers in declared phase order
static SANITIZERS: LazyLock<Vec<Box<dyn Sanitizer>>> = LazyLock::new(|| {
    vec![
        // Phase 1: structural and noise removal
        Box::new(TrimWhitespace),
        Box::new(StripCodeFences),
        Box::new(DropInvalidPrefix),
        Box::new(ExtractLargestSpan),
        Box::new(CollapseDuplicateObjects),
        Box::new(DropTruncationMarkers),
        // Phase 2: comments
        Box::new(RemoveComments),
        // Phase 3: character normalization
        Box::new(NormalizeQuotes),
        Box::new(NormalizeWhitespace),
        Box::new(RepairEscapes),
        Box::new(RemoveControlChars),
        // Phase 4: syntax fixes
        Box::new(AddMissingCommas),
        Box::new(RemoveTrailingCommas),
        Box::new(MatchMismatchedDelimiters),
        Box::new(CompleteTruncatedStructures),
        Box::new(FixMissingObjectOpen),
        // Phase 5: property and value fixes via the rule library
        Box::new(RuleEngine),
        // Phase 6: LLM token-artifact cleanup
        Box::new(RemoveTokenArtifacts),
    ]
});

pub fn sanitizers() -> &'static [Box<dyn Sanitizer>] {
    &SANITIZERS
}

/// Total number of pipeline sanitizers (step-count bound for callers)
pub fn sanitizer_count() -> usize {
    SANITIZERS.len()
}

fn push_bounded(list: &mut Vec<String>, entries: impl IntoIterator<Item = String>) {
    for entry in entries {
        if list.len() >= MAX_DIAGNOSTICS {
            return;
        }
        list.push(entry);
    }
}

/// Run one sanitizer, absorbing any internal panic into an unchanged
/// pass-through with a failure repair entry
fn run_guarded(
    sanitizer: &dyn Sanitizer,
    content: &str,
    config: &SanitizerConfig,
) -> SanitizeOutcome {
    let result = catch_unwind(AssertUnwindSafe(|| sanitizer.sanitize(content, config)));
    match result {
        Ok(outcome) => outcome,
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| sanitizer.name().to_string());
            warn!(sanitizer = sanitizer.name(), "sanitizer failed, content passed through");
            SanitizeOutcome::unchanged(content)
                .with_repairs(vec![format!("Sanitizer failed: {detail}")])
        }
    }
}

/// Parse content, escalating through the sanitizer phases until a strict
/// parse succeeds or every phase is exhausted
pub fn parse_json_with_sanitizers(content: &str, config: &SanitizerConfig) -> ParseOutcome {
    // Fast path: already valid JSON
    let first_error = match serde_json::from_str::<Value>(content) {
        Ok(value) => {
            return ParseOutcome {
                value: Ok(value),
                repairs: Vec::new(),
                pipeline_steps: Vec::new(),
            };
        }
        Err(e) => e,
    };

    debug!("strict parse failed, entering sanitizer pipeline");

    let mut current = content.to_string();
    let mut repairs: Vec<String> = Vec::new();
    let mut pipeline_steps: Vec<String> = Vec::new();
    let mut last_error = first_error;

    for sanitizer in sanitizers() {
        let outcome = run_guarded(sanitizer.as_ref(), &current, config);

        if !outcome.changed {
            // A failed sanitizer leaves its failure note even without change
            push_bounded(&mut repairs, outcome.repairs);
            continue;
        }

        debug!(sanitizer = sanitizer.name(), "sanitizer rewrote content");
        if let Some(description) = &outcome.description {
            pipeline_steps.push(description.clone());
        }
        push_bounded(&mut repairs, outcome.repairs);
        current = outcome.content;

        match serde_json::from_str::<Value>(&current) {
            Ok(value) => {
                return ParseOutcome {
                    value: Ok(value),
                    repairs,
                    pipeline_steps,
                };
            }
            Err(e) => last_error = e,
        }
    }

    ParseOutcome {
        value: Err(last_error),
        repairs,
        pipeline_steps,
    }
}


#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn json_value() -> impl Strategy<Value = serde_json::Value> {
        let leaf = prop_oneof![
            Just(serde_json::Value::Null),
            any::<bool>().prop_map(serde_json::Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 _.-]{0,20}".prop_map(serde_json::Value::String),
        ];
        leaf.prop_recursive(3, 32, 5, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..5).prop_map(serde_json::Value::Array),
                prop::collection::btree_map("[a-z][a-z0-9_]{0,8}", inner, 0..5)
                    .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        // Strictly parseable content takes the fast path untouched
        #[test]
        fn fast_path_returns_identical_value(value in json_value()) {
            let serialized = serde_json::to_string(&value).unwrap();
            let outcome =
                parse_json_with_sanitizers(&serialized, &SanitizerConfig::default());
            prop_assert_eq!(outcome.value.unwrap(), value);
            prop_assert!(outcome.repairs.is_empty());
            prop_assert!(outcome.pipeline_steps.is_empty());
        }

        // Applying any sanitizer to its own output is a no-op
        #[test]
        fn sanitizers_are_idempotent_on_fixed_points(value in json_value()) {
            let serialized = serde_json::to_string_pretty(&value).unwrap();
            let config = SanitizerConfig::default();
            for sanitizer in sanitizers() {
                let first = run_guarded(sanitizer.as_ref(), &serialized, &config);
                let second = run_guarded(sanitizer.as_ref(), &first.content, &config);
                prop_assert!(
                    !second.changed,
                    "sanitizer {} is not idempotent",
                    sanitizer.name()
                );
            }
        }

        // Pretty-printed valid JSON is a fixed point of the whole pipeline
        #[test]
        fn valid_json_passes_every_phase_unchanged(value in json_value()) {
            let serialized = serde_json::to_string_pretty(&value).unwrap();
            let outcome =
                parse_json_with_sanitizers(&serialized, &SanitizerConfig::default());
            prop_assert_eq!(outcome.value.unwrap(), value);
            prop_assert!(outcome.repairs.is_empty());
        }
    }
}
