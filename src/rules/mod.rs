//! Replacement-Rule Model
//!
//! A rule is a declarative (pattern, context-check, replacement) triple. The
//! executor applies an ordered set of rules over content; rules themselves
//! are pure and never touch matches inside string literals unless opted in.
//!
//! Rule groups concatenate in a fixed canonical order: embedded-content,
//! structural, stray-character, property-name, array-element. Caller-injected
//! rules append after the built-in groups.

pub mod array;
pub mod embedded;
pub mod executor;
pub mod property;
pub mod stray;
pub mod structural;

use std::sync::Arc;

use regex::{Captures, Regex};

use crate::config::SanitizerConfig;
use crate::constants::executor::CONTEXT_LOOKBACK;
use crate::scan::StringBoundaryChecker;

pub use executor::{ExecutorOptions, execute_rules};

/// Per-match view handed to replacement closures and context checks
pub struct ContextInfo<'a> {
    /// Byte offset of the match start
    pub offset: usize,
    /// The full content being rewritten
    pub full_content: &'a str,
    /// Effective sanitizer configuration for this call
    pub config: &'a SanitizerConfig,
    lookback: usize,
    boundary: &'a StringBoundaryChecker,
}

impl<'a> ContextInfo<'a> {
    pub(crate) fn new(
        offset: usize,
        full_content: &'a str,
        config: &'a SanitizerConfig,
        lookback: usize,
        boundary: &'a StringBoundaryChecker,
    ) -> Self {
        Self {
            offset,
            full_content,
            config,
            lookback,
            boundary,
        }
    }

    /// Up to `lookback` bytes of content preceding the match
    pub fn before_match(&self) -> &'a str {
        let mut start = self.offset.saturating_sub(self.lookback);
        while start < self.offset && !self.full_content.is_char_boundary(start) {
            start += 1;
        }
        &self.full_content[start..self.offset]
    }

    /// Whether a byte position lies inside a string literal
    pub fn is_in_string(&self, pos: usize) -> bool {
        self.boundary.is_in_string(pos)
    }

    pub fn boundary(&self) -> &'a StringBoundaryChecker {
        self.boundary
    }
}

/// Outcome of a replacement closure for one match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleEdit {
    /// Replace only the matched span
    Text(String),
    /// Replace from the match start through `end` (a byte offset into the
    /// full content at or past the match end); used by rules that consume a
    /// whole property value located with the matched-brace scanner
    Span { end: usize, text: String },
}

impl RuleEdit {
    /// Substitute the match with `text`
    pub fn with(text: impl Into<String>) -> Option<Self> {
        Some(Self::Text(text.into()))
    }

    /// Delete the match
    pub fn remove() -> Option<Self> {
        Some(Self::Text(String::new()))
    }

    /// Replace everything from the match start through `end` with `text`
    pub fn span(end: usize, text: impl Into<String>) -> Option<Self> {
        Some(Self::Span {
            end,
            text: text.into(),
        })
    }

    /// Delete everything from the match start through `end`
    pub fn remove_through(end: usize) -> Option<Self> {
        Self::span(end, "")
    }
}

/// Static or per-match diagnostic message
pub enum Diagnostic {
    Static(&'static str),
    Dynamic(Box<dyn Fn(&Captures) -> String + Send + Sync>),
}

impl Diagnostic {
    pub fn render(&self, caps: &Captures) -> String {
        match self {
            Self::Static(msg) => (*msg).to_string(),
            Self::Dynamic(f) => f(caps),
        }
    }
}

type ReplacementFn = Box<dyn Fn(&Captures, &ContextInfo) -> Option<RuleEdit> + Send + Sync>;
type ContextCheckFn = Box<dyn Fn(&Captures, &ContextInfo) -> bool + Send + Sync>;

/// Declarative replacement rule executed by the rule engine
pub struct ReplacementRule {
    name: &'static str,
    pattern: Regex,
    replacement: ReplacementFn,
    diagnostic: Diagnostic,
    context_check: Option<ContextCheckFn>,
    skip_in_string: bool,
    context_lookback: usize,
}

impl ReplacementRule {
    /// Create a rule. An invalid pattern is a programmer error and panics at
    /// construction; all built-in rules construct inside static tables.
    pub fn new(
        name: &'static str,
        pattern: &str,
        replacement: impl Fn(&Captures, &ContextInfo) -> Option<RuleEdit> + Send + Sync + 'static,
    ) -> Self {
        let pattern = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("rule '{name}' has an invalid pattern: {e}"));
        Self {
            name,
            pattern,
            replacement: Box::new(replacement),
            diagnostic: Diagnostic::Static(name),
            context_check: None,
            skip_in_string: true,
            context_lookback: CONTEXT_LOOKBACK,
        }
    }

    /// Human-readable repair description recorded on substitution
    pub fn describe(mut self, message: &'static str) -> Self {
        self.diagnostic = Diagnostic::Static(message);
        self
    }

    /// Per-match repair description
    pub fn describe_with(
        mut self,
        f: impl Fn(&Captures) -> String + Send + Sync + 'static,
    ) -> Self {
        self.diagnostic = Diagnostic::Dynamic(Box::new(f));
        self
    }

    /// Gate the rule on a context predicate; a `false` verdict keeps the
    /// original match
    pub fn check(
        mut self,
        f: impl Fn(&Captures, &ContextInfo) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.context_check = Some(Box::new(f));
        self
    }

    /// Allow the rule to rewrite matches inside string literals
    pub fn allow_in_string(mut self) -> Self {
        self.skip_in_string = false;
        self
    }

    pub fn lookback(mut self, bytes: usize) -> Self {
        self.context_lookback = bytes;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub(crate) fn replacement(&self) -> &ReplacementFn {
        &self.replacement
    }

    pub(crate) fn diagnostic(&self) -> &Diagnostic {
        &self.diagnostic
    }

    pub(crate) fn context_check(&self) -> Option<&ContextCheckFn> {
        self.context_check.as_ref()
    }

    pub(crate) fn skip_in_string(&self) -> bool {
        self.skip_in_string
    }

    pub(crate) fn context_lookback(&self) -> usize {
        self.context_lookback
    }
}

impl std::fmt::Debug for ReplacementRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplacementRule")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .field("skip_in_string", &self.skip_in_string)
            .finish()
    }
}

/// All built-in rules in canonical group order, followed by caller-injected
/// custom rules
pub fn all_rules(config: &SanitizerConfig) -> Vec<Arc<ReplacementRule>> {
    let mut rules: Vec<Arc<ReplacementRule>> = Vec::new();
    rules.extend(embedded::rules().iter().cloned());
    rules.extend(structural::rules().iter().cloned());
    rules.extend(stray::rules().iter().cloned());
    rules.extend(property::rules().iter().cloned());
    rules.extend(array::rules().iter().cloned());
    rules.extend(config.custom_replacement_rules.iter().cloned());
    rules
}
