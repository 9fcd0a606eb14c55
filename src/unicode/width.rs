//! Display width of grapheme clusters, measured in monospace cells.

use unicode_width::UnicodeWidthStr;

/// Number of cells a horizontal tab occupies.
pub const TAB_CELLS: u32 = 4;

/// Width calculation method for ambiguous-width characters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WidthMethod {
    /// POSIX-like wcwidth: ambiguous width = 1.
    #[default]
    WcWidth,
    /// Unicode East Asian Width: ambiguous width = 2.
    Unicode,
}

/// Get the display width of a string in cells using a specific method.
#[must_use]
pub fn display_width_with_method(s: &str, method: WidthMethod) -> usize {
    match method {
        WidthMethod::WcWidth => UnicodeWidthStr::width(s),
        WidthMethod::Unicode => UnicodeWidthStr::width_cjk(s),
    }
}

/// Cells occupied by one grapheme cluster.
///
/// Tabs take [`TAB_CELLS`]; clusters made only of control characters (a
/// lone `\r`, for example) take none.
#[must_use]
pub fn cluster_cells(cluster: &str, method: WidthMethod) -> u32 {
    if cluster == "\t" {
        return TAB_CELLS;
    }
    if cluster.chars().all(char::is_control) {
        return 0;
    }
    let width = if cluster.is_ascii() {
        cluster.len()
    } else {
        display_width_with_method(cluster, method)
    };
    u32::try_from(width).unwrap_or(u32::MAX)
}
