//! Bounded list of recent calculations, newest first.
//!
//! The newest entry is at index 0.  Once the list holds `max_size` entries,
//! recording another drops the oldest.  Nothing is persisted.

use std::collections::VecDeque;
use std::fmt;

use crate::display::format_number;

// ── HistoryEntry ──────────────────────────────────────────────────────────────

/// One completed calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// The expression as the user wrote it, e.g. `2 ^ 10`.
    pub expression: String,
    /// The displayed (already rounded) result.
    pub result: f64,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.expression, format_number(self.result))
    }
}

// ── History ───────────────────────────────────────────────────────────────────

/// Most-recent-first list of calculations.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    max_size: usize,
}

impl History {
    /// Default capacity.
    pub const DEFAULT_SIZE: usize = 10;

    /// Create an empty history holding at most `max_size` entries (at least 1).
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Record a calculation as the newest entry, evicting the oldest if full.
    pub fn record(&mut self, expression: impl Into<String>, result: f64) {
        self.entries.push_front(HistoryEntry {
            expression: expression.into(),
            result,
        });
        self.entries.truncate(self.max_size);
    }

    /// The most recent entry.
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_adds_newest_first() {
        let mut h = History::default();
        h.record("1 + 1", 2.0);
        h.record("2 * 3", 6.0);
        let exprs: Vec<&str> = h.iter().map(|e| e.expression.as_str()).collect();
        assert_eq!(exprs, ["2 * 3", "1 + 1"]);
        assert_eq!(h.last().map(|e| e.result), Some(6.0));
    }

    #[test]
    fn keeps_duplicates() {
        let mut h = History::default();
        h.record("1 + 1", 2.0);
        h.record("1 + 1", 2.0);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn bounded_to_ten_by_default() {
        let mut h = History::default();
        for i in 0..15 {
            h.record(format!("{i} + 0"), f64::from(i));
        }
        assert_eq!(h.len(), 10);
        assert_eq!(h.last().map(|e| e.expression.as_str()), Some("14 + 0"));
        assert_eq!(h.iter().last().map(|e| e.expression.as_str()), Some("5 + 0"));
    }

    #[test]
    fn zero_capacity_becomes_one() {
        let mut h = History::new(0);
        h.record("a", 1.0);
        h.record("b", 2.0);
        assert_eq!(h.max_size(), 1);
        assert_eq!(h.len(), 1);
        assert_eq!(h.last().map(|e| e.expression.as_str()), Some("b"));
    }

    #[test]
    fn clear_empties() {
        let mut h = History::default();
        h.record("sqrt(16)", 4.0);
        h.clear();
        assert!(h.is_empty());
        assert!(h.last().is_none());
    }

    #[test]
    fn entry_display() {
        let e = HistoryEntry {
            expression: "10 / 4".into(),
            result: 2.5,
        };
        assert_eq!(e.to_string(), "10 / 4 = 2.5");
    }
}
