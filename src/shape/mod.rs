//! The shaping seam: glyph records, layout parameters and the [`Shaper`] trait.
//!
//! The editing engine never shapes text. It hands a [`Shaper`] the current
//! logical text as a byte stream together with [`LayoutParams`], then pulls
//! positioned glyphs one at a time. Glyphs arrive in logical (rune) order;
//! each carries its visual position, so bidi reordering is already applied.

mod mono;

pub use mono::MonospaceShaper;

use crate::error::Result;
use crate::fixed::Fixed;
use crate::unicode::Direction;
use bitflags::bitflags;
use std::fmt;
use std::io::Read;

/// Per-shaper identifier for the shape of a glyph.
pub type GlyphId = u64;

bitflags! {
    /// Properties of a shaped glyph.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct GlyphFlags: u16 {
        /// The glyph's run progresses toward the origin (right-to-left).
        const TOWARD_ORIGIN = 0x01;
        /// Last glyph of a line.
        const LINE_BREAK = 0x02;
        /// Last glyph of a run of uniform direction and style.
        const RUN_BREAK = 0x04;
        /// Last glyph of a cluster; only such glyphs report a rune count.
        const CLUSTER_BREAK = 0x08;
        /// Zero-width glyph standing in for a paragraph-separating newline.
        const PARAGRAPH_BREAK = 0x10;
        /// First glyph after a paragraph break.
        const PARAGRAPH_START = 0x20;
        /// Glyph of the truncator inserted where text was cut off.
        const TRUNCATOR = 0x40;
    }
}

impl GlyphFlags {
    #[must_use]
    pub const fn is_toward_origin(self) -> bool {
        self.contains(Self::TOWARD_ORIGIN)
    }

    #[must_use]
    pub const fn is_line_break(self) -> bool {
        self.contains(Self::LINE_BREAK)
    }

    #[must_use]
    pub const fn is_run_break(self) -> bool {
        self.contains(Self::RUN_BREAK)
    }

    #[must_use]
    pub const fn is_cluster_break(self) -> bool {
        self.contains(Self::CLUSTER_BREAK)
    }

    #[must_use]
    pub const fn is_paragraph_break(self) -> bool {
        self.contains(Self::PARAGRAPH_BREAK)
    }

    #[must_use]
    pub const fn is_paragraph_start(self) -> bool {
        self.contains(Self::PARAGRAPH_START)
    }

    #[must_use]
    pub const fn is_truncator(self) -> bool {
        self.contains(Self::TRUNCATOR)
    }
}

impl fmt::Display for GlyphFlags {
    /// Compact one-letter-per-flag rendering, `_` for unset flags.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters = [
            (Self::PARAGRAPH_START, 'S'),
            (Self::PARAGRAPH_BREAK, 'P'),
            (Self::TOWARD_ORIGIN, 'T'),
            (Self::LINE_BREAK, 'L'),
            (Self::RUN_BREAK, 'R'),
            (Self::CLUSTER_BREAK, 'C'),
            (Self::TRUNCATOR, '\u{2026}'),
        ];
        for (flag, letter) in letters {
            let c = if self.contains(flag) { letter } else { '_' };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// A shaped, positioned glyph.
///
/// `x` and `y` locate the glyph's dot (its left edge on the baseline) in
/// document coordinates. Only the last glyph of a cluster carries the
/// cluster's rune count; every other glyph reports zero runes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Glyph {
    pub id: GlyphId,
    pub x: Fixed,
    pub y: i32,
    pub advance: Fixed,
    pub ascent: Fixed,
    pub descent: Fixed,
    pub runes: u32,
    pub flags: GlyphFlags,
}

/// Horizontal placement of lines within the available width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Alignment {
    /// Leading edge: left for left-to-right text, right for right-to-left.
    #[default]
    Start,
    /// Trailing edge.
    End,
    Middle,
}

impl Alignment {
    /// Offset of a line of width `line` within `available`, for text laid out
    /// in direction `dir`.
    #[must_use]
    pub fn align(self, dir: Direction, line: Fixed, available: Fixed) -> Fixed {
        let spare = available - line;
        if spare <= Fixed::ZERO {
            return Fixed::ZERO;
        }
        match (self, dir.is_rtl()) {
            (Self::Start, false) | (Self::End, true) => Fixed::ZERO,
            (Self::Start, true) | (Self::End, false) => spare,
            (Self::Middle, _) => spare / 2,
        }
    }
}

/// Preferred typeface.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Font {
    pub typeface: String,
    pub italic: bool,
    /// Weight on the usual 100-900 scale.
    pub weight: u16,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            typeface: "monospace".to_string(),
            italic: false,
            weight: 400,
        }
    }
}

/// Language and primary direction of the text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Locale {
    /// BCP 47 language tag, empty when unknown.
    pub language: String,
    pub direction: Direction,
}

impl Locale {
    #[must_use]
    pub fn new(language: impl Into<String>, direction: Direction) -> Self {
        Self {
            language: language.into(),
            direction,
        }
    }
}

/// Static shaping attributes applied to a whole text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutParams {
    pub font: Font,
    /// Pixels per em.
    pub px_per_em: Fixed,
    pub alignment: Alignment,
    /// Lines are aligned within at least this width.
    pub min_width: i32,
    /// Lines wrap beyond this width; `i32::MAX` disables wrapping.
    pub max_width: i32,
    /// Maximum number of lines; zero means unlimited.
    pub max_lines: usize,
    pub locale: Locale,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            font: Font::default(),
            px_per_em: Fixed::from_int(16),
            alignment: Alignment::Start,
            min_width: 0,
            max_width: i32::MAX,
            max_lines: 0,
            locale: Locale::default(),
        }
    }
}

impl LayoutParams {
    #[must_use]
    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    #[must_use]
    pub const fn with_px_per_em(mut self, px_per_em: Fixed) -> Self {
        self.px_per_em = px_per_em;
        self
    }

    #[must_use]
    pub const fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    #[must_use]
    pub const fn with_widths(mut self, min_width: i32, max_width: i32) -> Self {
        self.min_width = min_width;
        self.max_width = max_width;
        self
    }

    #[must_use]
    pub const fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }
}

/// Converts text into a stream of positioned glyphs.
pub trait Shaper {
    /// Shape everything `text` yields, replacing any previous layout.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` cannot be read, is not UTF-8, or cannot
    /// be shaped.
    fn layout(&mut self, params: &LayoutParams, text: &mut dyn Read) -> Result<()>;

    /// Next glyph of the most recent layout, in logical order.
    fn next_glyph(&mut self) -> Option<Glyph>;
}

/// Shaper emitting one zero-width cluster glyph per rune on a single line.
///
/// Positions built from it keep every rune offset addressable, which is all
/// the engine needs when real shaping is unavailable.
#[derive(Clone, Debug, Default)]
pub struct NullShaper {
    remaining: u32,
}

impl NullShaper {
    #[must_use]
    pub const fn new() -> Self {
        Self { remaining: 0 }
    }

    /// Lay out `runes` placeholder glyphs without reading any text.
    pub fn layout_runes(&mut self, runes: usize) {
        self.remaining = u32::try_from(runes).unwrap_or(u32::MAX);
    }
}

impl Shaper for NullShaper {
    fn layout(&mut self, _params: &LayoutParams, text: &mut dyn Read) -> Result<()> {
        let text = read_text(text)?;
        self.layout_runes(text.chars().count());
        Ok(())
    }

    fn next_glyph(&mut self) -> Option<Glyph> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let mut flags = GlyphFlags::CLUSTER_BREAK;
        if self.remaining == 0 {
            flags |= GlyphFlags::RUN_BREAK | GlyphFlags::LINE_BREAK;
        }
        Some(Glyph {
            runes: 1,
            flags,
            ..Glyph::default()
        })
    }
}

/// Read a whole text stream, failing on invalid UTF-8.
pub(crate) fn read_text(text: &mut dyn Read) -> Result<String> {
    let mut bytes = Vec::new();
    text.read_to_end(&mut bytes)?;
    Ok(String::from_utf8(bytes)?)
}
