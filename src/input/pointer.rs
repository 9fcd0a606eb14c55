//! Pointer event types.

use crate::geom::Point;
use crate::input::KeyModifiers;

/// Kind of pointer event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// Primary button pressed.
    Press,
    /// Pointer moved with the primary button held.
    Drag,
    /// Primary button released.
    Release,
    /// Wheel or touchpad scroll by a pixel delta.
    Scroll(Point),
}

/// A pointer event in viewport coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub position: Point,
    /// Modifier keys held.
    pub modifiers: KeyModifiers,
    /// Number of presses in quick succession: 1 for a click, 2 for a
    /// double click, 3 for a triple click.
    pub click_count: u8,
}

impl PointerEvent {
    /// Create a new pointer event.
    #[must_use]
    pub fn new(kind: PointerKind, position: Point) -> Self {
        Self {
            kind,
            position,
            modifiers: KeyModifiers::empty(),
            click_count: 1,
        }
    }

    /// Create a single-click press event.
    #[must_use]
    pub fn press(x: i32, y: i32) -> Self {
        Self::new(PointerKind::Press, Point::new(x, y))
    }

    #[must_use]
    pub fn drag(x: i32, y: i32) -> Self {
        Self::new(PointerKind::Drag, Point::new(x, y))
    }

    #[must_use]
    pub fn release(x: i32, y: i32) -> Self {
        Self::new(PointerKind::Release, Point::new(x, y))
    }

    /// Create a scroll event by (`dx`, `dy`) pixels.
    #[must_use]
    pub fn scroll(dx: i32, dy: i32) -> Self {
        Self::new(PointerKind::Scroll(Point::new(dx, dy)), Point::default())
    }

    /// Set modifier keys.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: KeyModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Set the click count of a press.
    #[must_use]
    pub fn with_clicks(mut self, click_count: u8) -> Self {
        self.click_count = click_count;
        self
    }

    /// Check if Shift is held.
    #[must_use]
    pub fn shift(&self) -> bool {
        self.modifiers.contains(KeyModifiers::SHIFT)
    }

    #[must_use]
    pub fn is_press(&self) -> bool {
        self.kind == PointerKind::Press
    }

    #[must_use]
    pub fn is_scroll(&self) -> bool {
        matches!(self.kind, PointerKind::Scroll(_))
    }
}
