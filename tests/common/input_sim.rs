//! Input simulation for driving an [`Editor`] in tests.
//!
//! Builds a sequence of key and pointer events, then replays it.

use glyphcaret::{Editor, EditorEvent, KeyCode, KeyEvent, KeyModifiers, PointerEvent};

/// A single simulated input.
#[derive(Clone, Debug)]
pub enum InputEvent {
    Key(KeyEvent),
    Pointer(PointerEvent),
    /// Clipboard text delivered in answer to a paste request.
    Paste(String),
}

/// Builder for input sequences.
#[derive(Clone, Debug, Default)]
pub struct InputSequence {
    events: Vec<InputEvent>,
}

impl InputSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Type each character of `text`, with Enter for newlines.
    #[must_use]
    pub fn type_text(mut self, text: &str) -> Self {
        for c in text.chars() {
            let code = if c == '\n' { KeyCode::Enter } else { KeyCode::Char(c) };
            self.events.push(InputEvent::Key(KeyEvent::key(code)));
        }
        self
    }

    #[must_use]
    pub fn key(mut self, code: KeyCode) -> Self {
        self.events.push(InputEvent::Key(KeyEvent::key(code)));
        self
    }

    #[must_use]
    pub fn key_with(mut self, code: KeyCode, modifiers: KeyModifiers) -> Self {
        self.events.push(InputEvent::Key(KeyEvent::new(code, modifiers)));
        self
    }

    /// Press `code` `n` times.
    #[must_use]
    pub fn repeat(mut self, code: KeyCode, n: usize) -> Self {
        for _ in 0..n {
            self.events.push(InputEvent::Key(KeyEvent::key(code)));
        }
        self
    }

    /// Ctrl plus a letter.
    #[must_use]
    pub fn shortcut(self, c: char) -> Self {
        self.key_with(KeyCode::Char(c), KeyModifiers::CTRL)
    }

    #[must_use]
    pub fn click(mut self, x: i32, y: i32) -> Self {
        self.events.push(InputEvent::Pointer(PointerEvent::press(x, y)));
        self.events.push(InputEvent::Pointer(PointerEvent::release(x, y)));
        self
    }

    /// Press at `from`, drag to `to` and release there.
    #[must_use]
    pub fn drag(mut self, from: (i32, i32), to: (i32, i32)) -> Self {
        self.events
            .push(InputEvent::Pointer(PointerEvent::press(from.0, from.1)));
        self.events
            .push(InputEvent::Pointer(PointerEvent::drag(to.0, to.1)));
        self.events
            .push(InputEvent::Pointer(PointerEvent::release(to.0, to.1)));
        self
    }

    #[must_use]
    pub fn paste(mut self, text: &str) -> Self {
        self.events.push(InputEvent::Paste(text.to_string()));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Feed every event to `editor` and collect what it reported.
    pub fn replay(&self, editor: &mut Editor) -> Vec<EditorEvent> {
        let mut out = Vec::new();
        for event in &self.events {
            match event {
                InputEvent::Key(key) => {
                    editor.handle_key(*key);
                }
                InputEvent::Pointer(pointer) => {
                    editor.handle_pointer(*pointer);
                }
                InputEvent::Paste(text) => {
                    editor.paste(text);
                }
            }
            out.extend(editor.events());
        }
        out
    }
}
