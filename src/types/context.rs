//! Call Context Types
//!
//! Caller-supplied context and per-call completion options. The context is
//! opaque to the core and used only for attribution in diagnostics and logs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::SanitizerConfig;
use crate::schema::SchemaValidator;

/// Expected shape of the completion output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "JSON"),
            Self::Text => write!(f, "TEXT"),
        }
    }
}

/// Attribution context for one LLM completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmContext {
    /// Resource the completion was requested for (file, prompt id, ...)
    pub resource: String,
    /// Purpose label for logs
    pub purpose: String,
    /// Model that produced the content, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_key: Option<String>,
    /// Output format the model was asked for, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
}

impl LlmContext {
    pub fn new(resource: impl Into<String>, purpose: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            purpose: purpose.into(),
            model_key: None,
            output_format: None,
        }
    }

    pub fn model_key(mut self, model_key: impl Into<String>) -> Self {
        self.model_key = Some(model_key.into());
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }
}

/// Per-call processing options
///
/// JSON mode must carry a schema; TEXT mode must not. [`Self::validate`]
/// enforces the discriminant before the pipeline runs.
#[derive(Clone, Default)]
pub struct CompletionOptions {
    pub output_format: OutputFormat,
    /// Caller-supplied schema validator, required in JSON mode
    pub schema: Option<Arc<dyn SchemaValidator>>,
    /// Hint that the schema is deeply nested (reserved for callers)
    pub has_complex_schema: bool,
    /// Caller overrides for the sanitizer configuration
    pub sanitizer_config: Option<SanitizerConfig>,
}

impl CompletionOptions {
    /// Options for schema-validated JSON output
    pub fn json(schema: Arc<dyn SchemaValidator>) -> Self {
        Self {
            output_format: OutputFormat::Json,
            schema: Some(schema),
            has_complex_schema: false,
            sanitizer_config: None,
        }
    }

    /// Options for plain text passthrough
    pub fn text() -> Self {
        Self {
            output_format: OutputFormat::Text,
            schema: None,
            has_complex_schema: false,
            sanitizer_config: None,
        }
    }

    pub fn with_sanitizer_config(mut self, config: SanitizerConfig) -> Self {
        self.sanitizer_config = Some(config);
        self
    }

    pub fn with_complex_schema(mut self) -> Self {
        self.has_complex_schema = true;
        self
    }

    /// Enforce the format/schema discriminant
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self.output_format {
            OutputFormat::Json if self.schema.is_none() => {
                Err("JSON output format requires a schema".to_string())
            }
            OutputFormat::Text if self.schema.is_some() => {
                Err("TEXT output format must not carry a schema".to_string())
            }
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for CompletionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionOptions")
            .field("output_format", &self.output_format)
            .field("schema", &self.schema.as_ref().map(|_| "<validator>"))
            .field("has_complex_schema", &self.has_complex_schema)
            .field("sanitizer_config", &self.sanitizer_config)
            .finish()
    }
}
