//! Processing Facade
//!
//! The top-level operations: `parse_and_validate` runs input validation, the
//! sanitizer pipeline, schema-metadata extraction, and the validate-and-fix
//! loop; `repair_and_validate` accepts already-parsed data and performs only
//! the validate-and-fix half. `has_significant_repairs` is the single hook
//! the outer execution pipeline uses to decide whether the content needed
//! non-cosmetic correction.

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::SanitizerConfig;
use crate::sanitize::{
    CODE_FENCE_DESCRIPTION, TRIM_DESCRIPTION, WHITESPACE_DESCRIPTION,
    parse_json_with_sanitizers,
};
use crate::schema::{SchemaValidator, ValidationIssue};
use crate::transform::apply_transforms;
use crate::types::{
    CompletionOptions, JsonProcessError, LlmContext, Processed, Result, Validated,
    ValidationFailure, ValidationOutcome,
};

/// Repair steps considered cosmetic; everything else is significant
pub const INSIGNIFICANT_REPAIR_STEPS: &[&str] = &[
    TRIM_DESCRIPTION,
    CODE_FENCE_DESCRIPTION,
    WHITESPACE_DESCRIPTION,
];

/// Whether any repair in the list is outside the trivial set
pub fn has_significant_repairs(repairs: &[String]) -> bool {
    repairs
        .iter()
        .any(|repair| !INSIGNIFICANT_REPAIR_STEPS.contains(&repair.as_str()))
}

/// Validate parsed data, applying the fixing transforms on failure and
/// validating once more
pub fn repair_and_validate(
    data: Value,
    schema: &dyn SchemaValidator,
    config: &SanitizerConfig,
) -> ValidationOutcome {
    let empty = data.is_null()
        || data.as_object().is_some_and(|o| o.is_empty())
        || data.as_array().is_some_and(|a| a.is_empty());
    if empty {
        return Err(ValidationFailure {
            issues: vec![ValidationIssue::root(
                "value is null or empty and cannot satisfy any schema",
            )],
            transform_repairs: Vec::new(),
        });
    }

    if schema.validate(&data).is_ok() {
        return Ok(Validated {
            data,
            transform_repairs: Vec::new(),
        });
    }

    debug!("initial validation failed, applying transforms");
    let (fixed, applied) = apply_transforms(data, config);

    match schema.validate(&fixed) {
        Ok(()) => Ok(Validated {
            data: fixed,
            transform_repairs: applied,
        }),
        Err(issues) => Err(ValidationFailure {
            issues,
            transform_repairs: applied,
        }),
    }
}

/// Build the effective sanitizer configuration: schema metadata first, then
/// options-supplied overrides, then the out-of-band caller config
fn effective_config(
    options: &CompletionOptions,
    out_of_band: Option<&SanitizerConfig>,
) -> SanitizerConfig {
    let metadata = options
        .schema
        .as_ref()
        .map(|schema| schema.metadata())
        .unwrap_or_default();
    let merged = SanitizerConfig::merged(&metadata, options.sanitizer_config.as_ref());
    match out_of_band {
        Some(caller) => {
            let intermediate_metadata = crate::schema::SchemaMetadata {
                known_properties: merged.known_properties.clone(),
                numeric_properties: merged.numeric_properties.clone(),
                array_properties: merged.array_property_names.clone(),
            };
            let mut final_config = SanitizerConfig::merged(&intermediate_metadata, Some(caller));
            // Maps and injected rules from the options layer survive unless
            // the out-of-band config overrides a key
            for (from, to) in &merged.property_name_mappings {
                final_config
                    .property_name_mappings
                    .entry(from.clone())
                    .or_insert_with(|| to.clone());
            }
            for (from, to) in &merged.property_typo_corrections {
                final_config
                    .property_typo_corrections
                    .entry(from.clone())
                    .or_insert_with(|| to.clone());
            }
            for (from, to) in &merged.package_name_prefix_replacements {
                final_config
                    .package_name_prefix_replacements
                    .entry(from.clone())
                    .or_insert_with(|| to.clone());
            }
            for (from, to) in &merged.package_name_typo_patterns {
                final_config
                    .package_name_typo_patterns
                    .entry(from.clone())
                    .or_insert_with(|| to.clone());
            }
            let mut rules = merged.custom_replacement_rules.clone();
            rules.extend(final_config.custom_replacement_rules);
            final_config.custom_replacement_rules = rules;
            final_config
        }
        None => merged,
    }
}

/// Parse, repair, and validate LLM content end to end
pub fn parse_and_validate(
    content: &str,
    context: &LlmContext,
    options: &CompletionOptions,
    logging_enabled: bool,
    config: Option<&SanitizerConfig>,
) -> Result<Processed> {
    let resource = context.resource.as_str();

    if let Err(message) = options.validate() {
        return Err(JsonProcessError::parse(message).resource(resource));
    }

    if content.trim().is_empty() {
        return Err(JsonProcessError::parse("is just an empty string").resource(resource));
    }

    if !content.contains(['{', '[']) {
        return Err(JsonProcessError::parse(
            "contains no JSON structure and appears to be plain text",
        )
        .resource(resource));
    }

    let sanitizer_config = effective_config(options, config);
    let outcome = parse_json_with_sanitizers(content, &sanitizer_config);
    let mut repairs = outcome.repairs;
    let pipeline_steps = outcome.pipeline_steps;

    let value = match outcome.value {
        Ok(value) => value,
        Err(parse_error) => {
            return Err(JsonProcessError::parse(
                "could not be parsed to JSON even after attempting sanitization",
            )
            .resource(resource)
            .caused_by(parse_error));
        }
    };

    let Some(schema) = options.schema.as_ref() else {
        if !value.is_object() && !value.is_array() {
            return Err(JsonProcessError::parse(
                "expected a JSON object or array but received a primitive value",
            )
            .resource(resource));
        }
        return Ok(Processed {
            data: value,
            repairs,
            pipeline_steps,
        });
    };

    match repair_and_validate(value, schema.as_ref(), &sanitizer_config) {
        Ok(validated) => {
            repairs.extend(validated.transform_repairs);
            if logging_enabled && has_significant_repairs(&repairs) {
                warn!(
                    resource,
                    purpose = context.purpose.as_str(),
                    repairs = repairs.len(),
                    "content required significant repair"
                );
            }
            Ok(Processed {
                data: validated.data,
                repairs,
                pipeline_steps,
            })
        }
        Err(failure) => {
            let summary = failure
                .issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            Err(
                JsonProcessError::validation(format!("failed schema validation: {summary}"))
                    .resource(resource)
                    .with_issues(failure.issues),
            )
        }
    }
}

/// Byte-level front door: rejects invalid UTF-8 before parsing
pub fn parse_and_validate_bytes(
    content: &[u8],
    context: &LlmContext,
    options: &CompletionOptions,
    logging_enabled: bool,
    config: Option<&SanitizerConfig>,
) -> Result<Processed> {
    match std::str::from_utf8(content) {
        Ok(text) => parse_and_validate(text, context, options, logging_enabled, config),
        Err(_) => Err(JsonProcessError::parse("contains malformed Unicode")
            .resource(context.resource.as_str())),
    }
}

/// Extract a JSON value from content without schema validation
pub fn extract_json(content: &str) -> Result<Value> {
    extract_json_with_repair_status(content).map(|(value, _)| value)
}

/// Extract a JSON value, reporting whether any repair was needed
pub fn extract_json_with_repair_status(content: &str) -> Result<(Value, bool)> {
    let config = SanitizerConfig::default();
    let outcome = parse_json_with_sanitizers(content, &config);
    match outcome.value {
        Ok(value) => Ok((value, !outcome.repairs.is_empty())),
        Err(parse_error) => Err(JsonProcessError::parse(
            "could not be parsed to JSON even after attempting sanitization",
        )
        .caused_by(parse_error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaMetadata;
    use crate::types::ErrorKind;
    use serde_json::json;
    use std::sync::Arc;

    /// Test validator driven by a JSON-Schema document
    struct JsonSchemaValidator {
        schema: Value,
        metadata: SchemaMetadata,
    }

    impl JsonSchemaValidator {
        fn new(schema: Value) -> Arc<Self> {
            let metadata = SchemaMetadata::from_json_schema(&schema);
            Arc::new(Self { schema, metadata })
        }
    }

    impl SchemaValidator for JsonSchemaValidator {
        fn validate(&self, value: &Value) -> std::result::Result<(), Vec<ValidationIssue>> {
            let mut issues = Vec::new();
            let Some(object) = value.as_object() else {
                return Err(vec![ValidationIssue::root("expected an object")]);
            };
            let properties = self
                .schema
                .get("properties")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();

            for (name, prop_schema) in &properties {
                let Some(actual) = object.get(name) else {
                    if self
                        .schema
                        .get("required")
                        .and_then(Value::as_array)
                        .is_some_and(|r| r.iter().any(|v| v.as_str() == Some(name)))
                    {
                        issues.push(ValidationIssue::new(name, "missing required property"));
                    }
                    continue;
                };
                let expected = prop_schema.get("type").and_then(Value::as_str);
                let matches = match expected {
                    Some("string") => actual.is_string(),
                    Some("number") | Some("integer") => actual.is_number(),
                    Some("array") => actual.is_array(),
                    Some("object") => actual.is_object(),
                    Some("boolean") => actual.is_boolean(),
                    _ => true,
                };
                if !matches {
                    issues.push(ValidationIssue::new(
                        name,
                        format!("expected {}", expected.unwrap_or("any")),
                    ));
                }
            }

            if issues.is_empty() { Ok(()) } else { Err(issues) }
        }

        fn metadata(&self) -> SchemaMetadata {
            self.metadata.clone()
        }
    }

    fn context() -> LlmContext {
        LlmContext::new("app-summary", "completions")
    }

    #[test]
    fn test_significance_classification() {
        assert!(!has_significant_repairs(&[]));
        assert!(!has_significant_repairs(&[
            TRIM_DESCRIPTION.to_string(),
            CODE_FENCE_DESCRIPTION.to_string()
        ]));
        assert!(has_significant_repairs(&[
            CODE_FENCE_DESCRIPTION.to_string(),
            "Removed trailing comma".to_string()
        ]));
    }

    #[test]
    fn test_scenario_code_fenced_json() {
        let schema = JsonSchemaValidator::new(json!({
            "type": "object",
            "properties": {"a": {"type": "number"}}
        }));
        let options = CompletionOptions::json(schema);
        let result =
            parse_and_validate("```json\n{\"a\": 1}\n```", &context(), &options, true, None)
                .unwrap();
        assert_eq!(result.data, json!({"a": 1}));
        assert!(result.is_repaired());
        assert!(!result.has_significant_repairs());
    }

    #[test]
    fn test_scenario_trailing_commentary() {
        let schema = JsonSchemaValidator::new(json!({
            "type": "object",
            "properties": {"a": {"type": "number"}}
        }));
        let options = CompletionOptions::json(schema);
        let content = "{\"a\":1}\nthere are more methods, but the response is getting too long";
        let result = parse_and_validate(content, &context(), &options, true, None).unwrap();
        assert_eq!(result.data, json!({"a": 1}));
        assert!(result.repairs.iter().any(|r| {
            r == "Removed truncated/explanatory text after final closing brace"
        }));
        assert!(result.has_significant_repairs());
    }

    #[test]
    fn test_scenario_yaml_block_before_json() {
        let schema = JsonSchemaValidator::new(json!({
            "type": "object",
            "properties": {"items": {"type": "array"}}
        }));
        let options = CompletionOptions::json(schema);
        let content = "extra_thoughts: I have identified all items\n{\"items\": [1, 2]}";
        let result = parse_and_validate(content, &context(), &options, true, None).unwrap();
        assert_eq!(result.data, json!({"items": [1, 2]}));
        assert!(result.repairs.iter().any(|r| r.contains("YAML-style")));
    }

    #[test]
    fn test_scenario_corrupted_property_syntax() {
        let schema = JsonSchemaValidator::new(json!({
            "type": "object",
            "properties": {"name": {"type": "string"}}
        }));
        let options = CompletionOptions::json(schema);
        let content = r#"{"name":toBe": "apiRequestBodyAsJson"}"#;
        let result = parse_and_validate(content, &context(), &options, true, None).unwrap();
        assert_eq!(result.data, json!({"name": "apiRequestBodyAsJson"}));
    }

    #[test]
    fn test_scenario_string_where_array_expected() {
        let schema = JsonSchemaValidator::new(json!({
            "type": "object",
            "properties": {"parameters": {"type": "array"}}
        }));
        let options = CompletionOptions::json(schema);
        let result =
            parse_and_validate(r#"{"parameters":"none"}"#, &context(), &options, true, None)
                .unwrap();
        assert_eq!(result.data, json!({"parameters": []}));
        assert!(result
            .repairs
            .contains(&"coerce_string_to_array".to_string()));
    }

    #[test]
    fn test_scenario_schema_aware_key_preservation() {
        let schema = JsonSchemaValidator::new(json!({
            "type": "object",
            "properties": {
                "my-yaml-key": {"type": "string"},
                "items": {"type": "array"}
            }
        }));
        let options = CompletionOptions::json(schema);
        let content = r#"{"my-yaml-key":"value","items":[1]}"#;
        let result = parse_and_validate(content, &context(), &options, true, None).unwrap();
        assert_eq!(result.data, json!({"my-yaml-key": "value", "items": [1]}));
        assert!(!result.is_repaired());
    }

    #[test]
    fn test_empty_string_rejected() {
        let options = CompletionOptions::text();
        let err = parse_and_validate("   ", &context(), &options, true, None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert!(err.to_string().contains("is just an empty string"));
        assert!(err.to_string().contains("app-summary"));
    }

    #[test]
    fn test_plain_text_rejected() {
        let options = CompletionOptions::text();
        let err =
            parse_and_validate("no structure here at all", &context(), &options, true, None)
                .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert!(err.to_string().contains("contains no JSON structure"));
    }

    #[test]
    fn test_primitive_without_schema_rejected() {
        let options = CompletionOptions::text();
        // Contains a brace so input validation passes, but parses to a string
        let err = parse_and_validate(r#""text with { brace""#, &context(), &options, true, None)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert!(err.to_string().contains("expected a JSON object or array"));
    }

    #[test]
    fn test_object_without_schema_passes_through() {
        let options = CompletionOptions::text();
        let result =
            parse_and_validate(r#"{"anything": [1, 2]}"#, &context(), &options, true, None)
                .unwrap();
        assert_eq!(result.data, json!({"anything": [1, 2]}));
        assert!(!result.is_repaired());
    }

    #[test]
    fn test_json_without_schema_rejected() {
        let options = CompletionOptions {
            output_format: crate::types::OutputFormat::Json,
            ..Default::default()
        };
        let err = parse_and_validate("{\"a\": 1}", &context(), &options, true, None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    #[test]
    fn test_unparseable_content_is_parse_error() {
        let schema = JsonSchemaValidator::new(json!({"type": "object", "properties": {}}));
        let options = CompletionOptions::json(schema);
        let err = parse_and_validate(
            "{\"a\": \u{201C}completely broken",
            &context(),
            &options,
            true,
            None,
        );
        // Either outcome must be tagged, never a panic
        if let Err(err) = err {
            assert_eq!(err.kind, ErrorKind::Parse);
        }
    }

    #[test]
    fn test_validation_failure_reports_issues() {
        let schema = JsonSchemaValidator::new(json!({
            "type": "object",
            "properties": {"count": {"type": "number"}},
            "required": ["count"]
        }));
        let options = CompletionOptions::json(schema);
        let err =
            parse_and_validate(r#"{"other": true}"#, &context(), &options, true, None)
                .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(!err.issues.is_empty());
    }

    #[test]
    fn test_repair_and_validate_rejects_empty() {
        let schema = JsonSchemaValidator::new(json!({"type": "object", "properties": {}}));
        let config = SanitizerConfig::default();
        assert!(repair_and_validate(json!(null), schema.as_ref(), &config).is_err());
        assert!(repair_and_validate(json!({}), schema.as_ref(), &config).is_err());
        assert!(repair_and_validate(json!([]), schema.as_ref(), &config).is_err());
    }

    #[test]
    fn test_repair_and_validate_skips_transforms_on_success() {
        let schema = JsonSchemaValidator::new(json!({
            "type": "object",
            "properties": {"a": {"type": "number"}}
        }));
        let config = SanitizerConfig::default();
        let validated =
            repair_and_validate(json!({"a": 1}), schema.as_ref(), &config).unwrap();
        assert!(validated.transform_repairs.is_empty());
    }

    #[test]
    fn test_bytes_front_door_rejects_invalid_utf8() {
        let options = CompletionOptions::text();
        let err = parse_and_validate_bytes(&[0x7B, 0xFF, 0xFE], &context(), &options, true, None)
            .unwrap_err();
        assert!(err.to_string().contains("contains malformed Unicode"));
    }

    #[test]
    fn test_extract_json_round_trip() {
        let value = json!({"a": [1, 2], "b": {"c": "text"}});
        let serialized = serde_json::to_string(&value).unwrap();
        let (parsed, repaired) = extract_json_with_repair_status(&serialized).unwrap();
        assert_eq!(parsed, value);
        assert!(!repaired);
    }

    #[test]
    fn test_extract_json_repairs_fences() {
        let (value, repaired) =
            extract_json_with_repair_status("```json\n{\"a\": 1}\n```").unwrap();
        assert_eq!(value, json!({"a": 1}));
        assert!(repaired);
    }

    #[test]
    fn test_injected_custom_rule_runs_after_builtin_groups() {
        use crate::rules::{ContextInfo, ReplacementRule, RuleEdit};
        use regex::Captures;

        // Domain-specific package cleanup arrives via injected rules; the
        // prefix map is caller-owned data the rule reads from the config
        let prefix_rule = Arc::new(
            ReplacementRule::new(
                "package_prefix_replacement",
                r#""com\.legacy\.([\w.]+)""#,
                |caps: &Captures, ctx: &ContextInfo| {
                    let replacement = ctx
                        .config
                        .package_name_prefix_replacements
                        .get("com.legacy")?;
                    RuleEdit::with(format!("\"{}.{}\"", replacement, &caps[1]))
                },
            )
            .allow_in_string()
            .describe("Replaced legacy package prefix"),
        );

        let schema = JsonSchemaValidator::new(json!({
            "type": "object",
            "properties": {"package": {"type": "string"}}
        }));
        let caller_config = SanitizerConfig {
            package_name_prefix_replacements: [(
                "com.legacy".to_string(),
                "com.current".to_string(),
            )]
            .into_iter()
            .collect(),
            custom_replacement_rules: vec![prefix_rule],
            ..Default::default()
        };
        let options =
            CompletionOptions::json(schema).with_sanitizer_config(caller_config);

        // Broken in a way only the rule engine fixes, so the injected rule
        // participates in the same executor run
        let content = "{\nokay\n\"package\": \"com.legacy.billing.core\"}";
        let result = parse_and_validate(content, &context(), &options, true, None).unwrap();
        assert_eq!(result.data, json!({"package": "com.current.billing.core"}));
        assert!(result
            .repairs
            .contains(&"Replaced legacy package prefix".to_string()));
    }

    #[test]
    fn test_repairs_concatenate_pipeline_then_transforms() {
        let schema = JsonSchemaValidator::new(json!({
            "type": "object",
            "properties": {"parameters": {"type": "array"}}
        }));
        let options = CompletionOptions::json(schema);
        // Needs both a text repair (fence) and a transform (string -> array)
        let content = "```json\n{\"parameters\": \"none\"}\n```";
        let result = parse_and_validate(content, &context(), &options, true, None).unwrap();

        let fence_pos = result
            .repairs
            .iter()
            .position(|r| r == CODE_FENCE_DESCRIPTION);
        let transform_pos = result
            .repairs
            .iter()
            .position(|r| r == "coerce_string_to_array");
        assert!(fence_pos.is_some());
        assert!(transform_pos.is_some());
        assert!(fence_pos < transform_pos);
    }

    #[test]
    fn test_caller_config_wins_over_schema_metadata() {
        let schema = JsonSchemaValidator::new(json!({
            "type": "object",
            "properties": {"a": {"type": "number"}}
        }));
        let options = CompletionOptions::json(schema);
        let caller = SanitizerConfig {
            known_properties: vec!["override".into()],
            ..Default::default()
        };
        let effective = effective_config(&options, Some(&caller));
        assert_eq!(effective.known_properties, vec!["override"]);
    }

    #[test]
    fn test_schema_metadata_feeds_config() {
        let schema = JsonSchemaValidator::new(json!({
            "type": "object",
            "properties": {
                "count": {"type": "integer"},
                "tags": {"type": "array"}
            }
        }));
        let options = CompletionOptions::json(schema);
        let effective = effective_config(&options, None);
        assert!(effective.is_known_property("count"));
        assert_eq!(effective.numeric_properties, vec!["count"]);
        assert_eq!(effective.array_property_names, vec!["tags"]);
    }
}
