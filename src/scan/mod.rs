//! Parser-Context Utilities
//!
//! Position-aware helpers shared by the rule engine: the string-boundary
//! checker, matched-delimiter scanners, and context classifiers.

pub mod boundary;
pub mod classify;
pub mod value_end;

pub use boundary::StringBoundaryChecker;
pub use classify::{
    is_after_json_delimiter, is_in_array_context, is_in_array_context_deep,
    is_in_object_context_deep, is_in_property_context,
};
pub use value_end::{find_json_value_end, find_property_value_end, find_unmatched_open};
