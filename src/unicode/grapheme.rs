//! Grapheme cluster iteration.

use crate::unicode::width::{WidthMethod, cluster_cells};
use unicode_segmentation::UnicodeSegmentation;

/// Grapheme metadata for layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphemeInfo {
    /// Byte offset of the cluster within the measured string.
    pub byte_offset: usize,
    /// Index of the cluster's first `char` within the measured string.
    pub char_offset: usize,
    /// Number of `char`s (runes) in the cluster.
    pub runes: u32,
    /// Display width in cells.
    pub cells: u32,
    /// Cluster consists of whitespace only; lines may break after it.
    pub whitespace: bool,
}

/// Iterate over grapheme clusters with byte indices.
pub fn grapheme_indices(s: &str) -> impl Iterator<Item = (usize, &str)> {
    s.grapheme_indices(true)
}

/// Compute grapheme info for a string.
#[must_use]
pub fn grapheme_info(s: &str, method: WidthMethod) -> Vec<GraphemeInfo> {
    let mut infos = Vec::new();
    let mut char_offset = 0;

    for (byte_offset, grapheme) in grapheme_indices(s) {
        let runes = grapheme.chars().count();
        infos.push(GraphemeInfo {
            byte_offset,
            char_offset,
            runes: u32::try_from(runes).unwrap_or(u32::MAX),
            cells: cluster_cells(grapheme, method),
            whitespace: grapheme.chars().all(char::is_whitespace),
        });
        char_offset += runes;
    }

    infos
}
