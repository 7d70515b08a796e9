//! Diagnostic Collector
//!
//! Bounded append-only buffer of repair descriptions. Overflow is silently
//! dropped: losing diagnostics past the cap affects completeness of the
//! trail, never correctness of the repaired content.

use crate::constants::executor::MAX_DIAGNOSTICS;

/// Bounded repair-description buffer
#[derive(Debug)]
pub struct DiagnosticCollector {
    entries: Vec<String>,
    capacity: usize,
}

impl Default for DiagnosticCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::with_capacity(MAX_DIAGNOSTICS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Append a description; drops silently once the cap is reached
    pub fn add(&mut self, message: impl Into<String>) {
        if self.entries.len() < self.capacity {
            self.entries.push(message.into());
        }
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<String> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_in_order() {
        let mut collector = DiagnosticCollector::new();
        collector.add("first");
        collector.add("second");
        assert_eq!(collector.entries(), ["first", "second"]);
    }

    #[test]
    fn test_overflow_is_dropped_silently() {
        let mut collector = DiagnosticCollector::with_capacity(2);
        collector.add("one");
        collector.add("two");
        collector.add("three");
        assert_eq!(collector.len(), 2);
        assert!(collector.is_full());
        assert_eq!(collector.into_vec(), vec!["one", "two"]);
    }

    #[test]
    fn test_default_capacity_matches_executor_bound() {
        let mut collector = DiagnosticCollector::new();
        for i in 0..100 {
            collector.add(format!("repair {i}"));
        }
        assert_eq!(collector.len(), MAX_DIAGNOSTICS);
    }
}
