//! Schema Abstraction
//!
//! The core is agnostic to any particular schema validator. Callers supply a
//! [`SchemaValidator`]; the core only consumes its validation verdicts and the
//! [`SchemaMetadata`] it exposes. Metadata feeds back into the sanitizer
//! configuration so schema-declared property names suppress the generic
//! "looks like non-JSON" heuristics.
//!
//! [`SchemaMetadata::from_json_schema`] covers the common case of callers
//! holding a JSON-Schema-shaped document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single structured validation issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted path of the failing location, empty for the root
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Issue at the value root
    pub fn root(message: impl Into<String>) -> Self {
        Self::new("", message)
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Schema-derived metadata consumed by the sanitizer configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMetadata {
    /// Declared property names at any nesting level
    pub known_properties: Vec<String>,
    /// Properties declared as numbers or integers
    pub numeric_properties: Vec<String>,
    /// Properties declared as arrays
    pub array_properties: Vec<String>,
}

impl SchemaMetadata {
    pub fn is_empty(&self) -> bool {
        self.known_properties.is_empty()
            && self.numeric_properties.is_empty()
            && self.array_properties.is_empty()
    }

    /// Extract metadata from a JSON-Schema-shaped document.
    ///
    /// Walks `properties` maps recursively, descending through `items` for
    /// array schemas. Property names are collected at every level; numeric
    /// and array classifications come from the `type` keyword.
    pub fn from_json_schema(schema: &Value) -> Self {
        let mut metadata = Self::default();
        collect_schema_metadata(schema, &mut metadata, 0);
        metadata.known_properties.dedup();
        metadata
    }
}

fn collect_schema_metadata(schema: &Value, metadata: &mut SchemaMetadata, depth: usize) {
    if depth > crate::constants::transform::MAX_DEPTH {
        return;
    }

    let Some(obj) = schema.as_object() else {
        return;
    };

    if let Some(properties) = obj.get("properties").and_then(Value::as_object) {
        for (name, prop_schema) in properties {
            if !metadata.known_properties.contains(name) {
                metadata.known_properties.push(name.clone());
            }

            match schema_type(prop_schema) {
                Some("number") | Some("integer") => {
                    if !metadata.numeric_properties.contains(name) {
                        metadata.numeric_properties.push(name.clone());
                    }
                }
                Some("array") => {
                    if !metadata.array_properties.contains(name) {
                        metadata.array_properties.push(name.clone());
                    }
                }
                _ => {}
            }

            collect_schema_metadata(prop_schema, metadata, depth + 1);
        }
    }

    if let Some(items) = obj.get("items") {
        collect_schema_metadata(items, metadata, depth + 1);
    }
}

/// Read the `type` keyword, tolerating the array form (`["string","null"]`)
fn schema_type(schema: &Value) -> Option<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => Some(t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    }
}

/// Caller-supplied schema validation seam
pub trait SchemaValidator: Send + Sync {
    /// Validate a parsed value, returning all issues on rejection
    fn validate(&self, value: &Value) -> Result<(), Vec<ValidationIssue>>;

    /// Metadata the sanitizer configuration is derived from
    fn metadata(&self) -> SchemaMetadata {
        SchemaMetadata::default()
    }
}
