//! Keyboard event types.

use bitflags::bitflags;

bitflags! {
    /// Keyboard modifier flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        /// Shift key.
        const SHIFT = 0b0000_0001;
        /// Alt/Option key.
        const ALT = 0b0000_0010;
        /// Control key.
        const CTRL = 0b0000_0100;
        /// Super/Command key.
        const SUPER = 0b0000_1000;
    }
}

impl KeyModifiers {
    /// Modifiers that turn character moves and deletes into word moves.
    pub const WORD: Self = Self::CTRL.union(Self::ALT);
    /// Modifiers that turn letter keys into editing shortcuts.
    pub const SHORTCUT: Self = Self::CTRL.union(Self::SUPER);
}

/// A key code representing a keyboard key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Backspace (delete backward).
    Backspace,
    /// Enter/Return key.
    Enter,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Tab,
    /// Delete forward.
    Delete,
    /// A character key (includes space).
    Char(char),
    /// Escape key.
    Esc,
}

/// A keyboard event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code.
    pub code: KeyCode,
    /// Modifier keys held.
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    /// Create a new key event.
    #[must_use]
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Create a key event with no modifiers.
    #[must_use]
    pub fn key(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::empty())
    }

    /// Create a character key event.
    #[must_use]
    pub fn char(c: char) -> Self {
        Self::key(KeyCode::Char(c))
    }

    /// Create a Ctrl+key event.
    #[must_use]
    pub fn with_ctrl(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::CTRL)
    }

    /// Create a Shift+key event.
    #[must_use]
    pub fn with_shift(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::SHIFT)
    }

    /// Check if Shift is held.
    #[must_use]
    pub fn shift(&self) -> bool {
        self.modifiers.contains(KeyModifiers::SHIFT)
    }

    /// Check if Ctrl is held.
    #[must_use]
    pub fn ctrl(&self) -> bool {
        self.modifiers.contains(KeyModifiers::CTRL)
    }

    /// Check if Alt is held.
    #[must_use]
    pub fn alt(&self) -> bool {
        self.modifiers.contains(KeyModifiers::ALT)
    }

    /// Check if a word-wise modifier (Ctrl or Alt) is held.
    #[must_use]
    pub fn word(&self) -> bool {
        self.modifiers.intersects(KeyModifiers::WORD)
    }

    /// Check if this is the platform shortcut modifier (Ctrl or Super)
    /// plus the letter `c`, in either case, with nothing else held.
    #[must_use]
    pub fn is_shortcut(&self, c: char) -> bool {
        self.shortcut_letter(KeyModifiers::empty(), c)
    }

    /// Like [`KeyEvent::is_shortcut`] but with Shift held as well.
    #[must_use]
    pub fn is_shift_shortcut(&self, c: char) -> bool {
        self.shortcut_letter(KeyModifiers::SHIFT, c)
    }

    fn shortcut_letter(&self, extra: KeyModifiers, c: char) -> bool {
        let held = self.modifiers.difference(extra);
        self.modifiers.contains(extra)
            && KeyModifiers::SHORTCUT.iter().any(|m| held == m)
            && matches!(self.code, KeyCode::Char(k) if k.eq_ignore_ascii_case(&c))
    }
}
