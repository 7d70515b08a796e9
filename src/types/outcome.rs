//! Stage Outcome Types
//!
//! Result carriers for the three processing stages: per-sanitizer outcomes,
//! the parse pipeline outcome, and the validate-and-repair outcome. The
//! facade flattens these into [`Processed`] or a
//! [`JsonProcessError`](crate::types::error::JsonProcessError).

use serde_json::Value;

use crate::schema::ValidationIssue;

/// Outcome of one sanitizer step
#[derive(Debug)]
pub struct SanitizeOutcome {
    /// Content after the step (identical to input when `changed` is false)
    pub content: String,
    /// Whether the step altered the content
    pub changed: bool,
    /// Umbrella description contributed to the pipeline-step trail
    pub description: Option<String>,
    /// Individual repair descriptions performed by the step
    pub repairs: Vec<String>,
}

impl SanitizeOutcome {
    /// The step left the content untouched
    pub fn unchanged(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            changed: false,
            description: None,
            repairs: Vec::new(),
        }
    }

    /// The step rewrote the content
    pub fn rewritten(content: impl Into<String>, description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            content: content.into(),
            changed: true,
            repairs: vec![description.clone()],
            description: Some(description),
        }
    }

    /// Replace the per-repair trail (keeps the umbrella description)
    pub fn with_repairs(mut self, repairs: Vec<String>) -> Self {
        self.repairs = repairs;
        self
    }
}

/// Outcome of the full sanitizer pipeline
#[derive(Debug)]
pub struct ParseOutcome {
    /// Parsed value, or the last parser error seen before giving up
    pub value: std::result::Result<Value, serde_json::Error>,
    /// Accumulated per-rule repair descriptions
    pub repairs: Vec<String>,
    /// Accumulated sanitizer descriptions, in execution order
    pub pipeline_steps: Vec<String>,
}

impl ParseOutcome {
    pub fn is_success(&self) -> bool {
        self.value.is_ok()
    }
}

/// Successful validate-and-repair outcome
#[derive(Debug, Clone)]
pub struct Validated {
    pub data: Value,
    /// Names of transforms that changed the value
    pub transform_repairs: Vec<String>,
}

/// Failed validate-and-repair outcome
#[derive(Debug, Clone)]
pub struct ValidationFailure {
    pub issues: Vec<ValidationIssue>,
    /// Transforms applied before the final validation still failed
    pub transform_repairs: Vec<String>,
}

pub type ValidationOutcome = std::result::Result<Validated, ValidationFailure>;

/// Final successful result of the facade
#[derive(Debug, Clone)]
pub struct Processed {
    /// Parsed, schema-validated value
    pub data: Value,
    /// Pipeline repairs followed by transform repairs
    pub repairs: Vec<String>,
    /// Sanitizer descriptions in execution order
    pub pipeline_steps: Vec<String>,
}

impl Processed {
    /// Whether any repair at all was performed
    pub fn is_repaired(&self) -> bool {
        !self.repairs.is_empty()
    }

    /// Whether any repair is outside the trivial set
    pub fn has_significant_repairs(&self) -> bool {
        crate::processor::has_significant_repairs(&self.repairs)
    }
}
