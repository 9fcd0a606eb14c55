//! Text storage, caret positioning and editing.
//!
//! - [`GapBuffer`]: UTF-8 storage with a movable gap at the edit site
//! - [`PositionIndex`]: caret positions of a shaped glyph stream
//! - [`CaretEngine`]: caret and selection movement, editing, scrolling
//! - [`EditHistory`]: undo/redo of recorded edits

mod caret;
mod gap;
mod history;
mod index;
mod mask;

pub use caret::{CaretEngine, CaretInfo, Dimensions, Dirty, ImeSnippet, SelectionAction};
pub use gap::{BufferReader, GapBuffer, MIN_SPACE};
pub use history::{DEFAULT_MAX_HISTORY_DEPTH, EditHistory, Modification};
pub use index::{CaretPosition, LineInfo, PositionIndex, Query, Region, make_region};
pub use mask::MaskReader;
