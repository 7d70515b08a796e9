//! Global Constants
//!
//! Centralized constants for tuning the sanitizer pipeline and rule engine.
//! All magic numbers should be defined here with documentation.

/// Rule executor constants
pub mod executor {
    /// Maximum repair diagnostics collected per execution
    pub const MAX_DIAGNOSTICS: usize = 20;

    /// Maximum fixed-point passes for generic executor use
    pub const MAX_PASSES: usize = 10;

    /// Maximum fixed-point passes when driven by the sanitizer pipeline
    pub const PIPELINE_MAX_PASSES: usize = 5;

    /// Default lookback window for per-match context (bytes)
    pub const CONTEXT_LOOKBACK: usize = 500;
}

/// Parser-context classifier constants
pub mod classify {
    /// Offsets at or below this are treated as "near start of input"
    pub const NEAR_START_THRESHOLD: usize = 10;

    /// Maximum bytes the deep array-context scan walks backward
    pub const MAX_BACKWARD_SCAN: usize = 4096;
}

/// Stray-text detector constants
pub mod detector {
    /// Maximum length of a short lowercase word considered stray
    pub const MAX_STRAY_WORD_LEN: usize = 12;

    /// Minimum words for sentence-structured text
    pub const MIN_SENTENCE_WORDS: usize = 3;

    /// Minimum words for punctuation-terminated sentences
    pub const MIN_TERMINATED_WORDS: usize = 2;

    /// Minimum length for long lowercase prose detection
    pub const MIN_PROSE_LEN: usize = 40;
}

/// Post-parse transform constants
pub mod transform {
    /// Recursion depth cap for value-tree walks
    pub const MAX_DEPTH: usize = 128;

    /// Maximum edit distance for known-property typo correction
    pub const MAX_TYPO_DISTANCE: usize = 2;

    /// Minimum key length before typo correction applies
    pub const MIN_TYPO_KEY_LEN: usize = 4;
}

/// Property-name inference constants
pub mod inference {
    /// Fallback property name when no known property matches a fragment
    pub const FALLBACK_NAME: &str = "name";

    /// Minimum fragment length for suffix/prefix inference
    pub const MIN_FRAGMENT_LEN: usize = 1;
}
