//! `glyphcaret` - gap-buffer text editing with bidi-aware caret positioning
//!
//! The crate keeps editable text in a gap buffer, shapes it through a
//! pluggable [`Shaper`], and indexes the resulting glyph stream into caret
//! positions that can be queried by rune offset, line and column, or pixel.
//! On top of that index sit caret and selection movement, editing with
//! undo/redo, scrolling, and an [`Editor`] that consumes decoded key and
//! pointer events.

// Crate-level lint configuration
#![forbid(unsafe_code)]
#![allow(clippy::cast_possible_truncation)] // Intentional metric casts
#![allow(clippy::cast_sign_loss)] // Intentional coordinate conversions
#![allow(clippy::cast_precision_loss)] // Intentional for f32 caret coordinates
#![allow(clippy::cast_possible_wrap)] // Intentional coordinate conversions
#![allow(clippy::module_name_repetitions)] // Allow text::TextIndex etc
#![allow(clippy::missing_errors_doc)] // Docs WIP
#![allow(clippy::missing_panics_doc)] // Docs WIP
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::use_self)] // Allow explicit type names in impl blocks
#![allow(clippy::needless_pass_by_value)] // Allow pass by value for small Copy types
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::cast_lossless)] // as casts are fine for primitive widening
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::semicolon_if_nothing_returned)] // Style preference
#![allow(clippy::len_without_is_empty)] // Rune and byte lengths differ

pub mod editor;
pub mod error;
pub mod fixed;
pub mod geom;
pub mod input;
pub mod shape;
pub mod text;
pub mod unicode;

// Re-export core types at crate root
pub use error::{Error, Result};
pub use fixed::Fixed;
pub use geom::{Point, Rect};

// Re-export shaping types
pub use shape::{
    Alignment, Font, Glyph, GlyphFlags, GlyphId, LayoutParams, Locale, MonospaceShaper,
    NullShaper, Shaper,
};

// Re-export text types
pub use text::{
    CaretEngine, CaretInfo, CaretPosition, Dimensions, Dirty, EditHistory, GapBuffer,
    ImeSnippet, LineInfo, MaskReader, Modification, PositionIndex, Query, Region,
    SelectionAction,
};

// Re-export input and editor types
pub use editor::{Editor, EditorEvent, EditorOptions};
pub use input::{KeyCode, KeyEvent, KeyModifiers, PointerEvent, PointerKind};
pub use unicode::{Direction, WidthMethod};
