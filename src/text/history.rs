//! Undo/redo history layered on [`CaretEngine::replace`].

use super::caret::CaretEngine;

/// Default maximum number of modifications to retain.
pub const DEFAULT_MAX_HISTORY_DEPTH: usize = 1000;

/// One reversible edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Modification {
    /// Rune offset where the edit starts.
    pub start_rune: usize,
    /// Text inserted by the edit.
    pub apply_text: String,
    /// Text the edit replaced.
    pub reverse_text: String,
}

impl Modification {
    fn apply_runes(&self) -> usize {
        self.apply_text.chars().count()
    }

    fn reverse_runes(&self) -> usize {
        self.reverse_text.chars().count()
    }
}

/// Linear undo history with a redo branch.
///
/// Entries before `next_index` are undoable, entries from it onward are
/// redoable. Recording a fresh edit discards the redo branch.
#[derive(Clone, Debug)]
pub struct EditHistory {
    entries: Vec<Modification>,
    next_index: usize,
    /// Maximum number of entries retained. Oldest entries are dropped when exceeded.
    max_depth: usize,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::with_max_depth(DEFAULT_MAX_HISTORY_DEPTH)
    }
}

impl EditHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            entries: Vec::new(),
            next_index: 0,
            max_depth: max_depth.max(1),
        }
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Change the depth limit, dropping the oldest entries if needed.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth.max(1);
        self.enforce_depth();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    #[must_use]
    pub fn entries(&self) -> &[Modification] {
        &self.entries
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.next_index > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.next_index < self.entries.len()
    }

    /// Log an edit that replaced `reverse_text` with `apply_text` at
    /// `start_rune`.
    pub fn record(
        &mut self,
        start_rune: usize,
        apply_text: impl Into<String>,
        reverse_text: impl Into<String>,
    ) {
        self.entries.truncate(self.next_index);
        self.entries.push(Modification {
            start_rune,
            apply_text: apply_text.into(),
            reverse_text: reverse_text.into(),
        });
        self.next_index += 1;
        self.enforce_depth();
    }

    /// Revert the most recent undoable edit, selecting the restored text.
    ///
    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self, engine: &mut CaretEngine) -> bool {
        if self.next_index == 0 {
            return false;
        }
        let m = &self.entries[self.next_index - 1];
        let end = m.start_rune + m.apply_runes();
        engine.splice(m.start_rune, end, &m.reverse_text);
        engine.set_caret(m.start_rune + m.reverse_runes(), m.start_rune);
        self.next_index -= 1;
        tracing::trace!(next_index = self.next_index, "undo");
        true
    }

    /// Reapply the most recently undone edit, selecting the applied text.
    ///
    /// Returns false when there is nothing to redo.
    pub fn redo(&mut self, engine: &mut CaretEngine) -> bool {
        let Some(m) = self.entries.get(self.next_index) else {
            return false;
        };
        let end = m.start_rune + m.reverse_runes();
        engine.splice(m.start_rune, end, &m.apply_text);
        engine.set_caret(m.start_rune + m.apply_runes(), m.start_rune);
        self.next_index += 1;
        tracing::trace!(next_index = self.next_index, "redo");
        true
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_index = 0;
    }

    fn enforce_depth(&mut self) {
        if self.entries.len() > self.max_depth {
            let excess = self.entries.len() - self.max_depth;
            self.entries.drain(..excess);
            self.next_index = self.next_index.saturating_sub(excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(text: &str) -> CaretEngine {
        let mut engine = CaretEngine::new();
        engine.set_text(text);
        engine
    }

    #[test]
    fn test_undo_redo_insert() {
        let mut e = engine("hello");
        let mut history = EditHistory::new();
        e.replace(5, 5, " world");
        history.record(5, " world", "");

        assert!(history.undo(&mut e));
        assert_eq!(e.text(), "hello");
        assert_eq!(e.selection(), (5, 5));
        assert!(!history.undo(&mut e));

        assert!(history.redo(&mut e));
        assert_eq!(e.text(), "hello world");
        assert_eq!(e.selection(), (11, 5));
        assert!(!history.redo(&mut e));
    }

    #[test]
    fn test_undo_restores_replaced_text_selected() {
        let mut e = engine("hello world");
        let mut history = EditHistory::new();
        e.replace(0, 5, "bye");
        history.record(0, "bye", "hello");
        assert_eq!(e.text(), "bye world");

        history.undo(&mut e);
        assert_eq!(e.text(), "hello world");
        assert_eq!(e.selection(), (5, 0));
    }

    #[test]
    fn test_undo_keeps_newlines_in_single_line_mode() {
        let mut e = engine("a\nb");
        let mut history = EditHistory::new();
        e.set_single_line(true);
        e.replace(0, 3, "");
        history.record(0, "", "a\nb");

        history.undo(&mut e);
        assert_eq!(e.text(), "a\nb");
        assert_eq!(e.selection(), (3, 0));
        history.redo(&mut e);
        assert_eq!(e.text(), "");
    }

    #[test]
    fn test_record_discards_redo_branch() {
        let mut e = engine("");
        let mut history = EditHistory::new();
        e.replace(0, 0, "a");
        history.record(0, "a", "");
        e.replace(1, 1, "b");
        history.record(1, "b", "");
        history.undo(&mut e);
        assert!(history.can_redo());

        e.replace(1, 1, "c");
        history.record(1, "c", "");
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[1].apply_text, "c");
    }

    #[test]
    fn test_max_depth_drops_oldest() {
        let mut history = EditHistory::with_max_depth(3);
        for i in 0..5 {
            history.record(i, "x", "");
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.next_index(), 3);
        assert_eq!(history.entries()[0].start_rune, 2);
    }

    #[test]
    fn test_undo_redo_do_not_record() {
        let mut e = engine("ab");
        let mut history = EditHistory::new();
        e.replace(2, 2, "c");
        history.record(2, "c", "");
        history.undo(&mut e);
        history.redo(&mut e);
        assert_eq!(history.len(), 1);
        assert_eq!(e.text(), "abc");
    }
}
