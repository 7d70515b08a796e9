//! Schema-Fixing Transforms
//!
//! Ordered, post-parse transformations on the parsed value tree. Applied
//! only after a successful parse and only when initial validation fails;
//! each transform runs on the output of the previous and counts as applied
//! iff the serialized form of the value changed. All walks carry a depth
//! cap and unknown shapes pass through unchanged.

use serde_json::{Map, Value};

use crate::config::SanitizerConfig;
use crate::constants::transform::{MAX_DEPTH, MAX_TYPO_DISTANCE, MIN_TYPO_KEY_LEN};
use crate::heuristics::looks_like_truncation_marker;

type TransformFn = fn(Value, &SanitizerConfig) -> Value;

/// The fixed transform order
pub const TRANSFORMS: &[(&str, TransformFn)] = &[
    ("remove_incomplete_array_items", remove_incomplete_array_items),
    ("coerce_string_to_array", coerce_string_to_array),
    ("convert_null_to_absent", convert_null_to_absent),
    ("fix_property_name_typos", fix_property_name_typos),
    ("coerce_numeric_properties", coerce_numeric_properties),
    ("unwrap_json_schema_structure", unwrap_json_schema_structure),
];

/// Run every transform in order, returning the final value and the names of
/// the transforms that changed it
pub fn apply_transforms(value: Value, config: &SanitizerConfig) -> (Value, Vec<String>) {
    let mut current = value;
    let mut applied = Vec::new();

    for (name, transform) in TRANSFORMS {
        let before = serde_json::to_string(&current).unwrap_or_default();
        let candidate = transform(current.clone(), config);
        let after = serde_json::to_string(&candidate).unwrap_or_default();
        if before != after {
            applied.push((*name).to_string());
            current = candidate;
        }
    }

    (current, applied)
}

/// Whether a trailing array element reads as an incomplete record
fn is_incomplete_item(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            map.is_empty()
                || map.values().all(|v| {
                    v.is_null() || v.as_str().is_some_and(|s| s.trim().is_empty())
                })
        }
        Value::String(s) => looks_like_truncation_marker(s),
        _ => false,
    }
}

/// Trim trailing array elements that are empty or placeholder records
fn remove_incomplete_array_items(value: Value, config: &SanitizerConfig) -> Value {
    fn walk(value: Value, config: &SanitizerConfig, depth: usize) -> Value {
        if depth > MAX_DEPTH {
            return value;
        }
        match value {
            Value::Array(items) => {
                let mut items: Vec<Value> = items
                    .into_iter()
                    .map(|v| walk(v, config, depth + 1))
                    .collect();
                while items.last().is_some_and(is_incomplete_item) {
                    items.pop();
                }
                Value::Array(items)
            }
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, walk(v, config, depth + 1)))
                    .collect(),
            ),
            other => other,
        }
    }
    walk(value, config, 0)
}

/// Replace string values of declared array properties with an empty array
fn coerce_string_to_array(value: Value, config: &SanitizerConfig) -> Value {
    fn walk(value: Value, config: &SanitizerConfig, depth: usize) -> Value {
        if depth > MAX_DEPTH {
            return value;
        }
        match value {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| {
                        let is_array_property = config
                            .array_property_names
                            .iter()
                            .any(|p| p.eq_ignore_ascii_case(&k));
                        let v = if is_array_property && v.is_string() {
                            Value::Array(Vec::new())
                        } else {
                            walk(v, config, depth + 1)
                        };
                        (k, v)
                    })
                    .collect(),
            ),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|v| walk(v, config, depth + 1))
                    .collect(),
            ),
            other => other,
        }
    }
    walk(value, config, 0)
}

/// Drop object entries whose value is null; array elements keep their
/// positions
fn convert_null_to_absent(value: Value, config: &SanitizerConfig) -> Value {
    fn walk(value: Value, config: &SanitizerConfig, depth: usize) -> Value {
        if depth > MAX_DEPTH {
            return value;
        }
        match value {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k, walk(v, config, depth + 1)))
                    .collect(),
            ),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|v| walk(v, config, depth + 1))
                    .collect(),
            ),
            other => other,
        }
    }
    walk(value, config, 0)
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut row = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            row[j + 1] = substitution.min(prev[j + 1] + 1).min(row[j] + 1);
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}

/// Closest known property within the typo distance, when unambiguous
fn closest_known_property(key: &str, config: &SanitizerConfig) -> Option<String> {
    if key.len() < MIN_TYPO_KEY_LEN || config.is_known_property(key) {
        return None;
    }
    let mut best: Option<(&String, usize)> = None;
    let mut tied = false;
    for prop in &config.known_properties {
        let distance = edit_distance(&key.to_ascii_lowercase(), &prop.to_ascii_lowercase());
        if distance == 0 || distance > MAX_TYPO_DISTANCE {
            continue;
        }
        match best {
            None => best = Some((prop, distance)),
            Some((_, current)) if distance < current => {
                best = Some((prop, distance));
                tied = false;
            }
            Some((_, current)) if distance == current => tied = true,
            _ => {}
        }
    }
    match best {
        Some((prop, _)) if !tied => Some(prop.clone()),
        _ => None,
    }
}

/// Repair property-name typos: trailing underscores, the explicit
/// correction maps, and closest-match against the known properties
fn fix_property_name_typos(value: Value, config: &SanitizerConfig) -> Value {
    fn fix_key(key: &str, config: &SanitizerConfig) -> String {
        let mut fixed = key.trim_end_matches('_').to_string();
        if fixed.is_empty() {
            fixed = key.to_string();
        }
        if let Some(corrected) = config.property_typo_corrections.get(&fixed) {
            fixed = corrected.clone();
        }
        if let Some(mapped) = config.property_name_mappings.get(&fixed) {
            fixed = mapped.clone();
        }
        if let Some(closest) = closest_known_property(&fixed, config) {
            fixed = closest;
        }
        fixed
    }

    fn walk(value: Value, config: &SanitizerConfig, depth: usize) -> Value {
        if depth > MAX_DEPTH {
            return value;
        }
        match value {
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, v) in map {
                    let fixed = fix_key(&key, config);
                    let v = walk(v, config, depth + 1);
                    // Last writer wins on a rename collision
                    out.insert(fixed, v);
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|v| walk(v, config, depth + 1))
                    .collect(),
            ),
            other => other,
        }
    }
    walk(value, config, 0)
}

/// Convert string values of declared numeric properties into numbers
fn coerce_numeric_properties(value: Value, config: &SanitizerConfig) -> Value {
    fn parse_number(s: &str) -> Option<Value> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return Some(Value::from(n));
        }
        trimmed
            .parse::<f64>()
            .ok()
            .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
    }

    fn walk(value: Value, config: &SanitizerConfig, depth: usize) -> Value {
        if depth > MAX_DEPTH {
            return value;
        }
        match value {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| {
                        let is_numeric = config
                            .numeric_properties
                            .iter()
                            .any(|p| p.eq_ignore_ascii_case(&k));
                        let v = match (&v, is_numeric) {
                            (Value::String(s), true) => {
                                parse_number(s).unwrap_or_else(|| walk(v, config, depth + 1))
                            }
                            _ => walk(v, config, depth + 1),
                        };
                        (k, v)
                    })
                    .collect(),
            ),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|v| walk(v, config, depth + 1))
                    .collect(),
            ),
            other => other,
        }
    }
    walk(value, config, 0)
}

/// Unwrap a payload the model nested under a JSON-schema envelope
/// (`{"type": "object", "properties": {...}}`)
fn unwrap_json_schema_structure(value: Value, config: &SanitizerConfig) -> Value {
    let Value::Object(map) = &value else {
        return value;
    };

    let Some(Value::Object(properties)) = map.get("properties") else {
        return value;
    };

    // Every sibling key must be schema vocabulary, otherwise this is payload
    let schema_keys = [
        "$schema",
        "additionalProperties",
        "description",
        "properties",
        "required",
        "title",
        "type",
    ];
    if !map.keys().all(|k| schema_keys.contains(&k.as_str())) {
        return value;
    }

    // With schema metadata available, the nested shape must actually match
    if !config.known_properties.is_empty() {
        let matches = properties
            .keys()
            .any(|k| config.is_known_property(k));
        if !matches {
            return value;
        }
    }

    Value::Object(properties.clone())
}
