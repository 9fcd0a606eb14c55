//! Editor widget driver.
//!
//! [`Editor`] turns decoded key and pointer events into [`CaretEngine`]
//! operations, records every user-visible edit in an [`EditHistory`], and
//! queues [`EditorEvent`]s for the host to drain with
//! [`events`](Editor::events).
//!
//! # Example
//!
//! ```
//! use glyphcaret::{Editor, EditorEvent, KeyCode, KeyEvent};
//!
//! let mut editor = Editor::new();
//! editor.handle_key(KeyEvent::char('h'));
//! editor.handle_key(KeyEvent::char('i'));
//! editor.handle_key(KeyEvent::key(KeyCode::Backspace));
//! assert_eq!(editor.text(), "h");
//!
//! editor.undo();
//! assert_eq!(editor.text(), "hi");
//! assert!(editor.events().contains(&EditorEvent::Change));
//! ```

use crate::input::{KeyCode, KeyEvent, KeyModifiers, PointerEvent, PointerKind};
use crate::text::{CaretEngine, DEFAULT_MAX_HISTORY_DEPTH, EditHistory, SelectionAction};

/// Editor configuration options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorOptions {
    /// Keep the text on one line: no wrapping, newlines become spaces.
    pub single_line: bool,
    /// Enter emits [`EditorEvent::Submit`] instead of inserting a newline.
    pub submit: bool,
    /// Display every rune except `\n` as this rune.
    pub mask: Option<char>,
    /// Maximum length in runes; zero means unlimited.
    pub max_len: usize,
    /// Only runes contained in this string may be inserted.
    pub filter: Option<String>,
    /// Number of edits kept for undo.
    pub max_history_depth: usize,
    /// Reject every edit from keys, pointer or clipboard.
    pub read_only: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            single_line: false,
            submit: false,
            mask: None,
            max_len: 0,
            filter: None,
            max_history_depth: DEFAULT_MAX_HISTORY_DEPTH,
            read_only: false,
        }
    }
}

impl EditorOptions {
    #[must_use]
    pub fn with_single_line(mut self, single_line: bool) -> Self {
        self.single_line = single_line;
        self
    }

    #[must_use]
    pub fn with_submit(mut self, submit: bool) -> Self {
        self.submit = submit;
        self
    }

    #[must_use]
    pub fn with_mask(mut self, mask: Option<char>) -> Self {
        self.mask = mask;
        self
    }

    #[must_use]
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    #[must_use]
    pub fn with_max_history_depth(mut self, depth: usize) -> Self {
        self.max_history_depth = depth;
        self
    }

    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

/// Notification for the host, drained with [`Editor::events`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorEvent {
    /// The text changed.
    Change,
    /// Enter was pressed in submit mode; carries the whole text.
    Submit(String),
    /// The caret or the selection moved.
    Select,
    /// Text to place on the clipboard.
    Copy(String),
    /// The editor wants the clipboard contents, delivered through
    /// [`Editor::paste`].
    PasteRequest,
}

/// Text editor state driven by decoded input events.
#[derive(Debug, Default)]
pub struct Editor {
    engine: CaretEngine,
    history: EditHistory,
    options: EditorOptions,
    events: Vec<EditorEvent>,
    dragging: bool,
}

impl Editor {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(EditorOptions::default())
    }

    #[must_use]
    pub fn with_options(options: EditorOptions) -> Self {
        let mut editor = Self {
            engine: CaretEngine::new(),
            history: EditHistory::new(),
            options: EditorOptions::default(),
            events: Vec::new(),
            dragging: false,
        };
        editor.set_options(options);
        editor
    }

    #[must_use]
    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Replace the options, applying the ones the engine and history track.
    pub fn set_options(&mut self, options: EditorOptions) {
        self.engine.set_single_line(options.single_line);
        self.engine.set_mask(options.mask);
        self.history.set_max_depth(options.max_history_depth);
        self.options = options;
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.options.read_only = read_only;
    }

    #[must_use]
    pub fn engine(&self) -> &CaretEngine {
        &self.engine
    }

    /// The engine, for layout and viewport settings.
    pub fn engine_mut(&mut self) -> &mut CaretEngine {
        &mut self.engine
    }

    #[must_use]
    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    /// Take the queued events.
    pub fn events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // Text
    // =========================================================================

    #[must_use]
    pub fn text(&self) -> String {
        self.engine.text()
    }

    /// Length in runes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.engine.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.engine.is_empty()
    }

    #[must_use]
    pub fn selection(&self) -> (usize, usize) {
        self.engine.selection()
    }

    #[must_use]
    pub fn selected_text(&self) -> String {
        self.engine.selected_text()
    }

    pub fn set_caret(&mut self, start: usize, end: usize) {
        self.track(|ed| ed.engine.set_caret(start, end));
    }

    /// Replace the whole text without recording it, forgetting the history.
    pub fn set_text(&mut self, text: &str) {
        self.engine.set_text(text);
        self.engine.take_changed();
        self.history.clear();
        self.dragging = false;
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Replace the selection with `s`, leaving the caret after it.
    ///
    /// Returns the number of runes inserted after filtering.
    pub fn insert(&mut self, s: &str) -> usize {
        self.track(|ed| ed.insert_text(s))
    }

    /// Replace the runes between `start` and `end` with `s`, as an input
    /// method commit does.
    pub fn replace(&mut self, start: usize, end: usize, s: &str) -> usize {
        self.track(|ed| recorded_replace(&mut ed.history, &ed.options, &mut ed.engine, start, end, s))
    }

    /// Delete `runes` runes at the caret, or the selection.
    pub fn delete(&mut self, runes: isize) {
        self.track(|ed| ed.delete_runes(runes));
    }

    /// Delete `words` words at the caret, or the selection and then words.
    pub fn delete_word(&mut self, words: isize) {
        self.track(|ed| ed.delete_words(words));
    }

    /// Insert clipboard text delivered after [`EditorEvent::PasteRequest`].
    ///
    /// Ignored when read-only.
    pub fn paste(&mut self, text: &str) -> bool {
        if self.options.read_only {
            return false;
        }
        self.track(|ed| ed.insert_text(text));
        self.engine.scroll_to_caret();
        true
    }

    /// Revert the last recorded edit.
    pub fn undo(&mut self) -> bool {
        self.track(|ed| ed.history.undo(&mut ed.engine))
    }

    /// Reapply the last undone edit.
    pub fn redo(&mut self) -> bool {
        self.track(|ed| ed.history.redo(&mut ed.engine))
    }

    fn insert_text(&mut self, s: &str) -> usize {
        let (start, end) = self.engine.selection();
        let n = recorded_replace(&mut self.history, &self.options, &mut self.engine, start, end, s);
        let caret = start.min(end) + n;
        self.engine.set_caret(caret, caret);
        n
    }

    fn delete_runes(&mut self, runes: isize) {
        let Self {
            engine,
            history,
            options,
            ..
        } = self;
        engine.delete_with(runes, &mut |engine, start, end| {
            recorded_replace(history, options, engine, start, end, "");
        });
    }

    fn delete_words(&mut self, words: isize) {
        let Self {
            engine,
            history,
            options,
            ..
        } = self;
        engine.delete_word_with(words, &mut |engine, start, end| {
            recorded_replace(history, options, engine, start, end, "");
        });
    }

    /// Run `f`, then queue change and selection events for what it did.
    fn track<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let before = self.engine.selection();
        let result = f(self);
        if self.engine.take_changed() {
            self.events.push(EditorEvent::Change);
        }
        if self.engine.selection() != before {
            self.events.push(EditorEvent::Select);
        }
        result
    }

    // =========================================================================
    // Keys
    // =========================================================================

    /// Apply a key press. Returns whether the key was used.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let handled = self.track(|ed| ed.command(key));
        if handled {
            self.engine.scroll_to_caret();
        }
        tracing::trace!(?key, handled, "key");
        handled
    }

    fn command(&mut self, key: KeyEvent) -> bool {
        let action = if key.shift() {
            SelectionAction::Extend
        } else {
            SelectionAction::Clear
        };
        let word = key.word();
        let editable = !self.options.read_only;
        match key.code {
            KeyCode::Enter => {
                if self.options.submit && !key.shift() {
                    self.events.push(EditorEvent::Submit(self.engine.text()));
                } else if editable {
                    self.insert_text("\n");
                }
            }
            KeyCode::Backspace => {
                if editable && word {
                    self.delete_words(-1);
                } else if editable {
                    self.delete_runes(-1);
                }
            }
            KeyCode::Delete => {
                if editable && word {
                    self.delete_words(1);
                } else if editable {
                    self.delete_runes(1);
                }
            }
            KeyCode::Up => self.engine.move_lines(-1, action),
            KeyCode::Down => self.engine.move_lines(1, action),
            KeyCode::Left | KeyCode::Right => {
                let dir: isize = if key.code == KeyCode::Left { -1 } else { 1 };
                if word {
                    self.engine.move_word(dir, action);
                } else if action == SelectionAction::Clear {
                    self.engine.clear_selection();
                    self.engine.move_caret(dir, dir);
                } else {
                    self.engine.move_caret(dir, 0);
                }
            }
            KeyCode::PageUp => self.engine.move_pages(-1, action),
            KeyCode::PageDown => self.engine.move_pages(1, action),
            KeyCode::Home => {
                if key.ctrl() {
                    self.engine.move_text_start(action);
                } else {
                    self.engine.move_line_start(action);
                }
            }
            KeyCode::End => {
                if key.ctrl() {
                    self.engine.move_text_end(action);
                } else {
                    self.engine.move_line_end(action);
                }
            }
            KeyCode::Char(_) if key.modifiers.intersects(KeyModifiers::SHORTCUT) && !key.alt() => {
                return self.shortcut(key);
            }
            KeyCode::Char(c) if !word => {
                if !editable {
                    return false;
                }
                let mut buf = [0u8; 4];
                self.insert_text(c.encode_utf8(&mut buf));
            }
            _ => return false,
        }
        true
    }

    fn shortcut(&mut self, key: KeyEvent) -> bool {
        let editable = !self.options.read_only;
        if key.is_shortcut('a') {
            let len = self.engine.len();
            self.engine.set_caret(len, 0);
        } else if key.is_shortcut('c') || key.is_shortcut('x') {
            let text = self.engine.selected_text();
            if text.is_empty() {
                return false;
            }
            self.events.push(EditorEvent::Copy(text));
            if key.is_shortcut('x') && editable {
                self.delete_runes(1);
            }
        } else if key.is_shortcut('v') && editable {
            self.events.push(EditorEvent::PasteRequest);
        } else if key.is_shortcut('z') && editable {
            self.history.undo(&mut self.engine);
        } else if (key.is_shift_shortcut('z') || key.is_shortcut('y')) && editable {
            self.history.redo(&mut self.engine);
        } else {
            return false;
        }
        true
    }

    // =========================================================================
    // Pointer
    // =========================================================================

    /// Apply a pointer event. Returns whether the event was used.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        self.track(|ed| ed.pointer(event))
    }

    fn pointer(&mut self, event: PointerEvent) -> bool {
        match event.kind {
            PointerKind::Press => {
                let (prev, _) = self.engine.selection();
                self.engine.move_coord(event.position);
                if event.shift() {
                    // Keep whichever end is farther from the click as the anchor.
                    let (start, end) = self.engine.selection();
                    if end.abs_diff(start) < start.abs_diff(prev) {
                        self.engine.set_caret(start, prev);
                    }
                } else {
                    self.engine.clear_selection();
                }
                self.dragging = true;
                match event.click_count {
                    0 | 1 => {}
                    2 => {
                        self.engine.move_word(-1, SelectionAction::Clear);
                        self.engine.move_word(1, SelectionAction::Extend);
                        self.dragging = false;
                    }
                    _ => {
                        self.engine.move_line_start(SelectionAction::Clear);
                        self.engine.move_line_end(SelectionAction::Extend);
                        self.dragging = false;
                    }
                }
                self.engine.scroll_to_caret();
            }
            PointerKind::Drag | PointerKind::Release => {
                if !self.dragging {
                    return false;
                }
                self.engine.move_coord(event.position);
                self.engine.scroll_to_caret();
                if event.kind == PointerKind::Release {
                    self.dragging = false;
                }
            }
            PointerKind::Scroll(delta) => self.engine.scroll_rel(delta.x, delta.y),
        }
        true
    }
}

/// Replace through `engine`, logging the edit in `history`.
///
/// `options` filter and cap the inserted text first.
fn recorded_replace(
    history: &mut EditHistory,
    options: &EditorOptions,
    engine: &mut CaretEngine,
    start: usize,
    end: usize,
    s: &str,
) -> usize {
    let len = engine.len();
    let (start, end) = if start > end { (end, start) } else { (start, end) };
    let (start, end) = (start.min(len), end.min(len));
    let kept = len - (end - start);

    let mut text = String::with_capacity(s.len());
    let mut count = 0;
    for c in s.chars() {
        if options.max_len > 0 && kept + count >= options.max_len {
            break;
        }
        if options.filter.as_deref().is_some_and(|f| !f.contains(c)) {
            continue;
        }
        let c = if options.single_line && c == '\n' { ' ' } else { c };
        text.push(c);
        count += 1;
    }

    let reverse = engine.text_range(start, end);
    if text.is_empty() && reverse.is_empty() {
        return 0;
    }
    history.record(start, text.as_str(), reverse);
    engine.replace(start, end, &text)
}
