//! Bidirectional (BiDi) text resolution.
//!
//! This module wraps the Unicode Bidirectional Algorithm (UAX #9) for the
//! shapers: [`resolve_bidi`] yields per-`char` embedding levels for one
//! paragraph and [`visual_order`] applies rule L2 to a line's runs.

use unicode_bidi::{BidiClass, BidiInfo as UnicodeBidiInfo, Level};

/// Text direction, used both for locales and detected paragraph direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
    /// No strong direction; detect it from the text.
    Neutral,
}

impl Direction {
    /// Check if text in this direction progresses toward the origin.
    #[must_use]
    pub const fn is_rtl(self) -> bool {
        matches!(self, Self::Rtl)
    }

    /// Embedding level of a paragraph in this direction.
    #[must_use]
    pub const fn base_level(self) -> u8 {
        match self {
            Self::Rtl => 1,
            Self::Ltr | Self::Neutral => 0,
        }
    }
}

/// Result of resolving BiDi embedding levels for a paragraph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BidiInfo {
    /// Direction the paragraph was laid out in.
    pub base_direction: Direction,
    /// Embedding level per Unicode scalar value (`char`).
    pub levels: Vec<u8>,
}

impl BidiInfo {
    /// Paragraph embedding level.
    #[must_use]
    pub const fn base_level(&self) -> u8 {
        self.base_direction.base_level()
    }
}

/// Resolve bidirectional embedding levels for one paragraph of `text`.
///
/// `default` is used when the text carries no strong character; a
/// `Neutral` default detects the direction from the first strong character
/// and falls back to left-to-right.
///
/// The returned `levels` are per `char` (Unicode scalar value), not per byte.
#[must_use]
pub fn resolve_bidi(text: &str, default: Direction) -> BidiInfo {
    let base_direction = match detect_base_direction(text) {
        Direction::Neutral if default == Direction::Neutral => Direction::Ltr,
        Direction::Neutral => default,
        detected => detected,
    };
    if text.is_empty() {
        return BidiInfo {
            base_direction,
            levels: Vec::new(),
        };
    }

    let para_level = if base_direction.is_rtl() {
        Level::rtl()
    } else {
        Level::ltr()
    };
    let bidi = UnicodeBidiInfo::new(text, Some(para_level));

    // `unicode-bidi` stores one level per byte, repeated across the bytes of
    // a code point; the first byte is representative.
    let levels = text
        .char_indices()
        .map(|(byte_idx, _)| bidi.levels[byte_idx].number())
        .collect();

    BidiInfo {
        base_direction,
        levels,
    }
}

fn detect_base_direction(text: &str) -> Direction {
    for ch in text.chars() {
        match unicode_bidi::bidi_class(ch) {
            BidiClass::L => return Direction::Ltr,
            BidiClass::R | BidiClass::AL => return Direction::Rtl,
            _ => {}
        }
    }
    Direction::Neutral
}

/// Visual order of a line's runs given their embedding levels (rule L2).
///
/// Returns run indices from left to right. From the highest level down to
/// the lowest odd level, every maximal sequence of runs at that level or
/// above is reversed.
#[must_use]
pub fn visual_order(run_levels: &[u8]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..run_levels.len()).collect();
    let Some(&highest) = run_levels.iter().max() else {
        return order;
    };
    let lowest_odd = run_levels
        .iter()
        .copied()
        .filter(|l| l % 2 == 1)
        .min()
        .unwrap_or(highest.saturating_add(1));

    let mut level = highest;
    while level >= lowest_odd && level > 0 {
        let mut i = 0;
        while i < order.len() {
            if run_levels[order[i]] >= level {
                let start = i;
                while i < order.len() && run_levels[order[i]] >= level {
                    i += 1;
                }
                order[start..i].reverse();
            } else {
                i += 1;
            }
        }
        level -= 1;
    }
    order
}
