//! Command history for vty sessions
//!
//! A bounded ring of submitted lines with a recall cursor used by the
//! up/down keys.

use std::collections::VecDeque;

/// Default number of remembered lines
pub const HISTORY_LIMIT: usize = 20;

/// Per-session command history
#[derive(Debug, Clone)]
pub struct CommandHistory {
    /// Submitted lines (newest last)
    entries: VecDeque<String>,
    /// Maximum entries
    max_entries: usize,
    /// 0 = editing the live line, n = n-th newest entry is shown
    cursor: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandHistory {
    /// Create a history with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_LIMIT)
    }

    /// Create a history holding at most `max_entries` lines (at least one)
    pub fn with_capacity(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
            cursor: 0,
        }
    }

    /// Remember a submitted line
    pub fn record(&mut self, line: &str) {
        // Skip empty or whitespace-only lines
        if line.trim().is_empty() {
            return;
        }

        if self.entries.len() == self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(line.to_string());

        // Keep the cursor pointing inside the ring
        self.cursor = self.cursor.min(self.entries.len());
    }

    /// Step to the next older entry, if there is one
    pub fn recall_older(&mut self) -> Option<&str> {
        if self.cursor == self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    /// Step to the next newer entry.
    ///
    /// Returns `Some("")` when this lands back on the live line and `None`
    /// when the live line was already shown.
    pub fn recall_newer(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        if self.cursor == 0 {
            Some("")
        } else {
            self.current()
        }
    }

    /// Back to live editing
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    fn current(&self) -> Option<&str> {
        self.entries
            .get(self.entries.len() - self.cursor)
            .map(String::as_str)
    }

    /// Recall cursor (0 = live line)
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_skips_blank() {
        let mut history = CommandHistory::new();
        history.record("");
        history.record("   ");
        assert!(history.is_empty());

        history.record("show version");
        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["show version"]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = CommandHistory::new();
        for i in 0..21 {
            history.record(&format!("cmd {}", i));
        }
        assert_eq!(history.len(), 20);
        let entries: Vec<_> = history.iter().collect();
        assert_eq!(entries.first(), Some(&"cmd 1"));
        assert_eq!(entries.last(), Some(&"cmd 20"));
        assert!(!entries.contains(&"cmd 0"));
    }

    #[test]
    fn test_recall_on_empty_history() {
        let mut history = CommandHistory::new();
        assert_eq!(history.recall_older(), None);
        assert_eq!(history.recall_newer(), None);
        assert_eq!(history.cursor(), 0);
    }

    #[test]
    fn test_recall_walks_both_ways() {
        let mut history = CommandHistory::new();
        history.record("one");
        history.record("two");
        history.record("three");

        assert_eq!(history.recall_older(), Some("three"));
        assert_eq!(history.recall_older(), Some("two"));
        assert_eq!(history.recall_older(), Some("one"));
        // Already at the oldest entry
        assert_eq!(history.recall_older(), None);
        assert_eq!(history.cursor(), 3);

        assert_eq!(history.recall_newer(), Some("two"));
        assert_eq!(history.recall_newer(), Some("three"));
        assert_eq!(history.recall_newer(), Some(""));
        assert_eq!(history.recall_newer(), None);
        assert_eq!(history.cursor(), 0);
    }

    #[test]
    fn test_reset_cursor() {
        let mut history = CommandHistory::with_capacity(2);
        history.record("a");
        history.record("b");
        history.recall_older();
        history.recall_older();
        history.reset_cursor();
        assert_eq!(history.cursor(), 0);
        assert_eq!(history.recall_older(), Some("b"));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut history = CommandHistory::with_capacity(0);
        history.record("a");
        history.record("b");
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["b"]);
    }
}
