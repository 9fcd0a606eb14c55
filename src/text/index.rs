//! Caret position index over a shaped glyph stream.
//!
//! [`PositionIndex`] consumes glyphs one at a time, in the order a
//! [`Shaper`](crate::shape::Shaper) yields them, and records every valid
//! caret position: its rune offset, line and column, and pixel location.
//! Positions are kept sorted by rune offset. A rune offset can own two
//! positions where a bidi run or line boundary makes both sides of a glyph
//! reachable, so callers must never assume offsets are unique.

use crate::fixed::Fixed;
use crate::geom::{Point, Rect};
use crate::shape::Glyph;

/// One valid caret location.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaretPosition {
    /// Offset in runes from the start of the text.
    pub rune_offset: usize,
    pub line: u32,
    /// Column in runes from the start of the line.
    pub column: u32,
    pub pixel_x: Fixed,
    /// Baseline of the line.
    pub pixel_y: i32,
    pub ascent: Fixed,
    pub descent: Fixed,
    /// Run within the line, counted at every run break.
    pub run_index: u32,
    /// The run progresses toward the origin (right-to-left).
    pub toward_origin: bool,
}

/// Extent of one shaped line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineInfo {
    pub x_offset: Fixed,
    /// Baseline of the line.
    pub y_offset: i32,
    pub width: Fixed,
    pub ascent: Fixed,
    pub descent: Fixed,
    pub glyph_count: u32,
}

/// An area of interest within shaped text, in document coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Region {
    pub bounds: Rect,
    /// Pixels between the baseline and the bottom of `bounds`.
    pub baseline: i32,
}

/// Lookup key for [`PositionIndex::closest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Query {
    ByRune(usize),
    ByLineCol(u32, u32),
    ByPixel(Fixed, i32),
}

/// Sorted caret positions and line metrics of one shaping pass.
#[derive(Clone, Debug)]
pub struct PositionIndex {
    glyphs: Vec<Glyph>,
    positions: Vec<CaretPosition>,
    lines: Vec<LineInfo>,

    // Extent of the line being indexed.
    line_min: Fixed,
    line_max: Fixed,
    line_glyphs: u32,
    /// Template for the next caret position.
    pos: CaretPosition,
    /// Progression of the current run, to detect bidi changes.
    toward_origin: bool,
    /// Advance accumulated over the glyphs of the current cluster.
    cluster_advance: Fixed,
    /// Suppresses the position before the next glyph; cleared at line and
    /// direction boundaries.
    skip_prior: bool,
}

impl Default for PositionIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionIndex {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            glyphs: Vec::new(),
            positions: Vec::new(),
            lines: Vec::new(),
            line_min: Fixed::MAX,
            line_max: Fixed::ZERO,
            line_glyphs: 0,
            pos: CaretPosition {
                rune_offset: 0,
                line: 0,
                column: 0,
                pixel_x: Fixed::ZERO,
                pixel_y: 0,
                ascent: Fixed::ZERO,
                descent: Fixed::ZERO,
                run_index: 0,
                toward_origin: false,
            },
            toward_origin: false,
            cluster_advance: Fixed::ZERO,
            skip_prior: false,
        }
    }

    /// Index a complete glyph stream.
    pub fn from_glyphs(glyphs: impl IntoIterator<Item = Glyph>) -> Self {
        let mut index = Self::new();
        for gl in glyphs {
            index.glyph(gl);
        }
        index.finish();
        index
    }

    /// Seal the index after the last glyph.
    ///
    /// An empty stream still yields one position, at the start of the text.
    pub fn finish(&mut self) {
        if self.positions.is_empty() {
            self.positions.push(CaretPosition::default());
        }
    }

    #[must_use]
    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    #[must_use]
    pub fn positions(&self) -> &[CaretPosition] {
        &self.positions
    }

    #[must_use]
    pub fn lines(&self) -> &[LineInfo] {
        &self.lines
    }

    /// Index one glyph, generating the caret positions around it.
    pub fn glyph(&mut self, gl: Glyph) {
        self.glyphs.push(gl);
        self.line_glyphs += 1;
        if gl.x < self.line_min {
            self.line_min = gl.x;
        }
        let end = gl.x + gl.advance;
        if end > self.line_max {
            self.line_max = end;
        }

        let toward_origin = gl.flags.is_toward_origin();
        if !self.skip_prior || toward_origin != self.toward_origin || gl.flags.is_paragraph_start() {
            // Position before the glyph, taking the progression of this run.
            self.toward_origin = toward_origin;
            self.pos.toward_origin = toward_origin;
            let mut pos = self.pos;
            pos.pixel_x = gl.x;
            pos.pixel_y = gl.y;
            pos.ascent = gl.ascent;
            pos.descent = gl.descent;
            if pos.toward_origin {
                pos.pixel_x += gl.advance;
            }
            self.pos = pos;
            self.positions.push(pos);
            self.skip_prior = true;
        }

        let breaks_paragraph = gl.flags.is_paragraph_break();
        let insert_after = gl.flags.is_cluster_break() && !breaks_paragraph && gl.runes > 0;
        if breaks_paragraph {
            // Zero width: a position on each side would be indistinguishable.
            self.cluster_advance = Fixed::ZERO;
            self.pos.rune_offset += gl.runes as usize;
        }
        self.cluster_advance += gl.advance;
        if insert_after {
            let mut pos = self.pos;
            pos.pixel_y = gl.y;
            pos.ascent = gl.ascent;
            pos.descent = gl.descent;
            let width = self.cluster_advance;
            let runes = i32::try_from(gl.runes).unwrap_or(i32::MAX);
            let mut per_rune = width / runes;
            let mut adjust = Fixed::ZERO;
            if pos.toward_origin {
                // Right-to-left: step back from the far edge of the cluster.
                adjust = width;
                per_rune = -per_rune;
            }
            for i in 1..=runes {
                pos.pixel_x = gl.x + adjust + per_rune * i;
                pos.rune_offset += 1;
                pos.column += 1;
                self.positions.push(pos);
            }
            self.pos = pos;
            self.cluster_advance = Fixed::ZERO;
        }

        if gl.flags.is_run_break() {
            self.pos.run_index += 1;
        }
        if gl.flags.is_line_break() {
            let last = self.positions.last().copied().unwrap_or_default();
            self.lines.push(LineInfo {
                x_offset: self.line_min,
                y_offset: gl.y,
                width: self.line_max - self.line_min,
                ascent: last.ascent,
                descent: last.descent,
                glyph_count: self.line_glyphs,
            });
            self.pos.line += 1;
            self.pos.column = 0;
            self.pos.run_index = 0;
            self.line_min = Fixed::MAX;
            self.line_max = Fixed::ZERO;
            self.line_glyphs = 0;
            self.skip_prior = false;
        }
    }

    /// Resolve a query to the closest caret position.
    #[must_use]
    pub fn closest(&self, query: Query) -> CaretPosition {
        match query {
            Query::ByRune(idx) => self.closest_to_rune(idx).0,
            Query::ByLineCol(line, col) => self.closest_to_line_col(line, col),
            Query::ByPixel(x, y) => self.closest_to_xy(x, y),
        }
    }

    /// The first position at rune `idx`, or the closest one before it.
    ///
    /// Also returns the position's index in [`positions`](Self::positions).
    #[must_use]
    pub fn closest_to_rune(&self, idx: usize) -> (CaretPosition, usize) {
        if self.positions.is_empty() {
            return (CaretPosition::default(), 0);
        }
        let mut i = self.positions.partition_point(|p| p.rune_offset < idx);
        i = i.saturating_sub(1);
        let closest = (self.positions[i], i);
        for (j, p) in self.positions.iter().enumerate().skip(i) {
            if p.rune_offset == idx {
                return (*p, j);
            }
            if p.rune_offset > idx {
                break;
            }
        }
        closest
    }

    /// The position at exactly (`line`, `col`), or the closest one before it.
    #[must_use]
    pub fn closest_to_line_col(&self, line: u32, col: u32) -> CaretPosition {
        if self.positions.is_empty() {
            return CaretPosition::default();
        }
        let i = self
            .positions
            .partition_point(|p| (p.line, p.column) < (line, col))
            .saturating_sub(1);
        let prior = self.positions[i];
        match self.positions.get(i + 1) {
            Some(next) if (next.line, next.column) == (line, col) => *next,
            _ => prior,
        }
    }

    /// The position nearest to pixel (`x`, `y`).
    ///
    /// The line is found by binary search on baselines; within the line the
    /// positions are scanned linearly, since bidi text has no total order on
    /// x. A point below the text resolves to the last position.
    #[must_use]
    pub fn closest_to_xy(&self, x: Fixed, y: i32) -> CaretPosition {
        if self.positions.is_empty() {
            return CaretPosition::default();
        }
        let i = self
            .positions
            .partition_point(|p| p.pixel_y.saturating_add(p.descent.round()) < y);
        let Some(first) = self.positions.get(i) else {
            return self.positions[self.positions.len() - 1];
        };
        let mut closest = i;
        let mut closest_dist = first.pixel_x.distance(x);
        for (j, candidate) in self.positions.iter().enumerate().skip(i + 1) {
            if candidate.line != first.line {
                break;
            }
            let dist = candidate.pixel_x.distance(x);
            if dist.round() == 0 {
                return *candidate;
            }
            if dist < closest_dist {
                closest_dist = dist;
                closest = j;
            }
        }
        self.positions[closest]
    }

    /// The position after `pos`, which must come unmodified from one of the
    /// `closest_*` queries. The flag is set when there is no next position.
    #[must_use]
    pub fn increment_position(&self, pos: CaretPosition) -> (CaretPosition, bool) {
        let (mut candidate, mut index) = self.closest_to_rune(pos.rune_offset);
        while candidate != pos && index + 1 < self.positions.len() {
            index += 1;
            candidate = self.positions[index];
        }
        match self.positions.get(index + 1) {
            Some(next) => (*next, false),
            None => (candidate, true),
        }
    }

    /// Highlight regions covering the runes in [`start`, `end`) that are
    /// visible within `viewport`.
    ///
    /// `rects` is cleared and reused. Lines fully inside the range get one
    /// region spanning the line; boundary lines are split per bidi run.
    pub fn locate(&self, viewport: Rect, start: usize, end: usize, rects: &mut Vec<Region>) {
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        rects.clear();
        let (caret_start, _) = self.closest_to_rune(start);
        let (caret_end, _) = self.closest_to_rune(end);

        for (line_no, line) in self.lines.iter().enumerate().skip(caret_start.line as usize) {
            let line_no = u32::try_from(line_no).unwrap_or(u32::MAX);
            if line_no > caret_end.line {
                break;
            }
            let pos = self.closest_to_line_col(line_no, 0);
            if pos.pixel_y + pos.descent.ceil() < viewport.min.y {
                continue;
            }
            if pos.pixel_y - pos.ascent.ceil() > viewport.max.y {
                break;
            }
            let y = pos.pixel_y;
            if line_no > caret_start.line && line_no < caret_end.line {
                rects.push(make_region(line, y, line.x_offset, line.x_offset + line.width));
                continue;
            }
            let mut sel_start = if line_no == caret_start.line {
                caret_start
            } else {
                self.closest_to_line_col(line_no, 0)
            };
            let sel_end = if line_no == caret_end.line {
                caret_end
            } else {
                self.closest_to_line_col(line_no, u32::MAX)
            };

            let mut eof = false;
            'line: while !eof {
                let start_x = sel_start.pixel_x;
                if sel_start.run_index == sel_end.run_index {
                    rects.push(make_region(line, y, start_x, sel_end.pixel_x));
                    break;
                }
                let direction = sel_start.toward_origin;
                let mut previous = sel_start;
                'run: while !eof {
                    // Advance to the next logical run.
                    let run = sel_start.run_index;
                    while sel_start.run_index == run {
                        previous = sel_start;
                        (sel_start, eof) = self.increment_position(sel_start);
                        if eof {
                            rects.push(make_region(line, y, start_x, sel_start.pixel_x));
                            break 'run;
                        }
                    }
                    if sel_start.toward_origin != direction {
                        rects.push(make_region(line, y, start_x, previous.pixel_x));
                        break;
                    }
                    if sel_start.run_index == sel_end.run_index {
                        rects.push(make_region(line, y, start_x, sel_end.pixel_x));
                        break 'line;
                    }
                }
            }
        }
    }
}

/// Text-aligned rectangle from `start` to `end` on the line with baseline `y`.
#[must_use]
pub fn make_region(line: &LineInfo, y: i32, start: Fixed, end: Fixed) -> Region {
    let (start, end) = if start > end { (end, start) } else { (start, end) };
    Region {
        bounds: Rect::new(
            Point::new(start.round(), y - line.ascent.ceil()),
            Point::new(end.round(), y + line.descent.floor()),
        ),
        baseline: line.descent.floor(),
    }
}
