//! jsonmend - Repair-and-Validate Pipeline for LLM JSON Output
//!
//! Turns noisy, damaged, or schema-drifting JSON-shaped text produced by
//! large language models into parsed, schema-validated values, or into
//! structured errors naming the stage that failed.
//!
//! ## Core Features
//!
//! - **Sanitizer Pipeline**: six phases from coarse noise removal to a
//!   declarative rule engine, parsing strictly after every step
//! - **Rule Library**: five ordered rule groups plus caller-injected rules,
//!   all string-literal-aware and schema-aware
//! - **Schema-Fixing Transforms**: post-parse value repairs driven by
//!   caller-supplied schema metadata
//! - **Repair Significance**: a stable vocabulary separating cosmetic from
//!   meaningful corrections
//!
//! ## Quick Start
//!
//! ```ignore
//! use jsonmend::{CompletionOptions, LlmContext, parse_and_validate};
//!
//! let context = LlmContext::new("app-summary", "completions");
//! let options = CompletionOptions::json(schema);
//! let processed = parse_and_validate(raw_output, &context, &options, true, None)?;
//! println!("repaired: {}", processed.is_repaired());
//! ```
//!
//! ## Modules
//!
//! - [`processor`]: the facade operations
//! - [`sanitize`]: the sanitizer pipeline
//! - [`rules`]: the replacement-rule model, executor, and library
//! - [`transform`]: post-parse schema-fixing transforms
//! - [`schema`]: the caller-supplied validator seam
//! - [`scan`]: parser-context utilities

pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod heuristics;
pub mod processor;
pub mod rules;
pub mod sanitize;
pub mod scan;
pub mod schema;
pub mod transform;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Facade
pub use processor::{
    INSIGNIFICANT_REPAIR_STEPS, extract_json, extract_json_with_repair_status,
    has_significant_repairs, parse_and_validate, parse_and_validate_bytes, repair_and_validate,
};

// Context and results
pub use types::{
    CompletionOptions, ErrorKind, JsonProcessError, LlmContext, OutputFormat, ParseOutcome,
    Processed, Result, SanitizeOutcome, Validated, ValidationFailure, ValidationOutcome,
};

// Configuration and schema seam
pub use config::SanitizerConfig;
pub use schema::{SchemaMetadata, SchemaValidator, ValidationIssue};

// =============================================================================
// Engine Re-exports
// =============================================================================

pub use rules::{ContextInfo, ExecutorOptions, ReplacementRule, RuleEdit, execute_rules};
pub use sanitize::{Sanitizer, parse_json_with_sanitizers};
pub use scan::{StringBoundaryChecker, find_json_value_end};
pub use transform::apply_transforms;
