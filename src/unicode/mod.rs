//! Unicode utilities for grapheme handling, display width and bidi levels.

mod bidi;
mod grapheme;
mod width;

pub use bidi::{BidiInfo, Direction, resolve_bidi, visual_order};
pub use grapheme::{GraphemeInfo, grapheme_indices, grapheme_info};
pub use width::{TAB_CELLS, WidthMethod, cluster_cells, display_width_with_method};
