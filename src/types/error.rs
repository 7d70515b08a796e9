//! Unified Error Type System
//!
//! Centralized error types for the processing core.
//! Callers receive a tagged error naming the stage that failed.
//!
//! ## Error Kinds
//!
//! - **Parse**: input was invalid before parsing, or every sanitizer phase
//!   was exhausted without a successful strict parse
//! - **Validation**: the parsed value was rejected by the caller-supplied
//!   schema even after the fixing transforms ran
//!
//! ## Design Principles
//!
//! - Single structured error type for the whole crate
//! - The last parser error is preserved as the cause of a Parse failure
//! - No panic/unwrap outside tests

use thiserror::Error;

use crate::schema::ValidationIssue;

/// Discriminant for processing failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input invalid, or parsing failed after all sanitizer phases
    Parse,
    /// Schema rejected the value even after transforms
    Validation,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse => write!(f, "PARSE"),
            Self::Validation => write!(f, "VALIDATION"),
        }
    }
}

/// Structured processing error with stage, attribution, and cause
#[derive(Debug, Error)]
#[error("{}", render_message(.resource, .message))]
pub struct JsonProcessError {
    /// Which stage failed
    pub kind: ErrorKind,
    /// Resource the content was generated for (attribution only)
    pub resource: Option<String>,
    /// Detailed error message
    pub message: String,
    /// Validation issues when `kind` is [`ErrorKind::Validation`]
    pub issues: Vec<ValidationIssue>,
    /// Underlying parser error, when one was preserved
    #[source]
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl JsonProcessError {
    /// Create a parse-stage error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Parse,
            resource: None,
            message: message.into(),
            issues: Vec::new(),
            cause: None,
        }
    }

    /// Create a validation-stage error
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            resource: None,
            message: message.into(),
            issues: Vec::new(),
            cause: None,
        }
    }

    /// Attach the resource name used for attribution in messages
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Attach the underlying cause
    pub fn caused_by(
        mut self,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Attach the validation issues that produced this error
    pub fn with_issues(mut self, issues: Vec<ValidationIssue>) -> Self {
        self.issues = issues;
        self
    }
}

fn render_message(resource: &Option<String>, message: &str) -> String {
    match resource {
        Some(resource) => format!("LLM response for resource '{resource}' {message}"),
        None => format!("LLM response {message}"),
    }
}

pub type Result<T> = std::result::Result<T, JsonProcessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::Parse.to_string(), "PARSE");
        assert_eq!(ErrorKind::Validation.to_string(), "VALIDATION");
    }

    #[test]
    fn test_resource_prefix() {
        let err = JsonProcessError::parse("is just an empty string").resource("app-summary");
        assert_eq!(
            err.to_string(),
            "LLM response for resource 'app-summary' is just an empty string"
        );
    }

    #[test]
    fn test_message_without_resource() {
        let err = JsonProcessError::parse("contains no JSON structure");
        assert_eq!(err.to_string(), "LLM response contains no JSON structure");
    }

    #[test]
    fn test_cause_preserved() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = JsonProcessError::parse("could not be parsed to JSON").caused_by(parse_err);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_validation_issues_attached() {
        let err = JsonProcessError::validation("failed schema validation").with_issues(vec![
            ValidationIssue::new("items", "expected array"),
        ]);
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.issues.len(), 1);
    }
}
