//! Sanitizer Configuration
//!
//! The single configuration vocabulary consumed by rules and transforms.
//! Built per call from schema metadata merged with caller-supplied overrides:
//! caller values win, maps merge shallowly, injected rules concatenate.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::rules::ReplacementRule;
use crate::schema::SchemaMetadata;

/// Recognized sanitizer configuration fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SanitizerConfig {
    /// Schema-declared property names. Suppresses removal of keys that
    /// happen to match the schema: schema-awareness takes precedence over
    /// pattern-based removal.
    pub known_properties: Vec<String>,

    /// Properties whose string values should be coerced to numbers
    pub numeric_properties: Vec<String>,

    /// Properties whose string values should be coerced to arrays
    pub array_property_names: Vec<String>,

    /// Legacy explicit property-name rename map
    pub property_name_mappings: BTreeMap<String, String>,

    /// Legacy typo-corrections map, applied before closest-match fixing
    pub property_typo_corrections: BTreeMap<String, String>,

    /// Domain-legacy prefix replacements for package-like values; consumed
    /// only by caller-injected rules
    pub package_name_prefix_replacements: BTreeMap<String, String>,

    /// Domain-legacy typo patterns for package-like values; consumed only by
    /// caller-injected rules
    pub package_name_typo_patterns: BTreeMap<String, String>,

    /// Caller-injected rules, appended after the built-in rule groups
    #[serde(skip)]
    pub custom_replacement_rules: Vec<Arc<ReplacementRule>>,
}

impl SanitizerConfig {
    /// Case-insensitive membership test against the known property names
    pub fn is_known_property(&self, key: &str) -> bool {
        self.known_properties
            .iter()
            .any(|p| p.eq_ignore_ascii_case(key))
    }

    /// Build the effective per-call config: schema-derived metadata first,
    /// then caller overrides. Caller lists win when non-empty, map entries
    /// win per key, custom rules concatenate.
    pub fn merged(metadata: &SchemaMetadata, caller: Option<&SanitizerConfig>) -> Self {
        let mut effective = Self {
            known_properties: metadata.known_properties.clone(),
            numeric_properties: metadata.numeric_properties.clone(),
            array_property_names: metadata.array_properties.clone(),
            ..Self::default()
        };

        let Some(caller) = caller else {
            return effective;
        };

        if !caller.known_properties.is_empty() {
            effective.known_properties = caller.known_properties.clone();
        }
        if !caller.numeric_properties.is_empty() {
            effective.numeric_properties = caller.numeric_properties.clone();
        }
        if !caller.array_property_names.is_empty() {
            effective.array_property_names = caller.array_property_names.clone();
        }

        for (from, to) in &caller.property_name_mappings {
            effective
                .property_name_mappings
                .insert(from.clone(), to.clone());
        }
        for (from, to) in &caller.property_typo_corrections {
            effective
                .property_typo_corrections
                .insert(from.clone(), to.clone());
        }
        for (from, to) in &caller.package_name_prefix_replacements {
            effective
                .package_name_prefix_replacements
                .insert(from.clone(), to.clone());
        }
        for (from, to) in &caller.package_name_typo_patterns {
            effective
                .package_name_typo_patterns
                .insert(from.clone(), to.clone());
        }

        effective
            .custom_replacement_rules
            .extend(caller.custom_replacement_rules.iter().cloned());

        effective
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> SchemaMetadata {
        SchemaMetadata {
            known_properties: vec!["name".into(), "items".into()],
            numeric_properties: vec!["count".into()],
            array_properties: vec!["items".into()],
        }
    }

    #[test]
    fn test_merge_without_caller_uses_metadata() {
        let config = SanitizerConfig::merged(&metadata(), None);
        assert_eq!(config.known_properties, vec!["name", "items"]);
        assert_eq!(config.numeric_properties, vec!["count"]);
        assert_eq!(config.array_property_names, vec!["items"]);
    }

    #[test]
    fn test_caller_lists_override_derived() {
        let caller = SanitizerConfig {
            known_properties: vec!["custom".into()],
            ..Default::default()
        };
        let config = SanitizerConfig::merged(&metadata(), Some(&caller));
        assert_eq!(config.known_properties, vec!["custom"]);
        // Untouched lists keep the derived values
        assert_eq!(config.numeric_properties, vec!["count"]);
    }

    #[test]
    fn test_maps_merge_shallowly() {
        let caller = SanitizerConfig {
            property_typo_corrections: BTreeMap::from([(
                "naem".to_string(),
                "name".to_string(),
            )]),
            ..Default::default()
        };
        let config = SanitizerConfig::merged(&metadata(), Some(&caller));
        assert_eq!(
            config.property_typo_corrections.get("naem"),
            Some(&"name".to_string())
        );
    }

    #[test]
    fn test_known_property_is_case_insensitive() {
        let config = SanitizerConfig {
            known_properties: vec!["myKey".into()],
            ..Default::default()
        };
        assert!(config.is_known_property("mykey"));
        assert!(config.is_known_property("MYKEY"));
        assert!(!config.is_known_property("other"));
    }
}
