//! Caret and selection engine.
//!
//! [`CaretEngine`] owns the text (a [`GapBuffer`]), the shaping inputs and
//! the caret. Every mutation or shaping input change only marks the layout
//! dirty; the glyph stream is reshaped or re-indexed lazily, the first time a
//! query needs positions. All rune offsets handed to the engine are clamped
//! and snapped to valid caret positions, so no operation fails.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::io::{self, Write};

use crate::fixed::Fixed;
use crate::geom::{Point, Rect};
use crate::shape::{
    Alignment, Font, Glyph, LayoutParams, Locale, MonospaceShaper, NullShaper, Shaper,
};

use super::gap::GapBuffer;
use super::index::{CaretPosition, PositionIndex, Region};
use super::mask::MaskReader;

/// Runes between two entries of the rune to byte offset table.
const RUNES_PER_OFFSET_ENTRY: usize = 50;

/// Validity of the cached layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Dirty {
    #[default]
    Clean,
    /// Text or a shaping input changed; the text must be shaped again.
    NeedsReshape,
    /// Only the viewport changed; the cached glyphs are indexed again.
    NeedsReindex,
}

/// What a caret movement does to the selection anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SelectionAction {
    /// The anchor snaps to the caret.
    #[default]
    Clear,
    /// The anchor stays, extending the selection.
    Extend,
}

/// Size of shaped text and the distance of its first baseline from the bottom.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub size: Point,
    pub baseline: i32,
}

/// Caret location relative to the viewport, with its extent above and
/// below the baseline in whole pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CaretInfo {
    pub pos: Point,
    pub ascent: i32,
    pub descent: i32,
}

/// Text around the input method's region of interest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImeSnippet {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Selection {
    /// The caret.
    start: usize,
    /// The anchor.
    end: usize,
    /// Horizontal offset remembered across vertical moves.
    xoff: Fixed,
}

#[derive(Clone, Copy, Debug, Default)]
struct OffsetEntry {
    runes: usize,
    bytes: usize,
}

struct Layout {
    shaper: Box<dyn Shaper>,
    index: PositionIndex,
    dims: Dimensions,
}

/// Text, caret and selection over a lazily shaped layout.
pub struct CaretEngine {
    buffer: GapBuffer,
    params: LayoutParams,
    single_line: bool,
    mask: Option<char>,
    view_size: Point,
    scroll: Point,
    caret: Selection,
    /// Composition range of the input method, in runes.
    ime: (usize, usize),

    dirty: Cell<Dirty>,
    layout: RefCell<Layout>,
    offsets: RefCell<Vec<OffsetEntry>>,
}

impl Default for CaretEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CaretEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaretEngine")
            .field("buffer", &self.buffer)
            .field("params", &self.params)
            .field("single_line", &self.single_line)
            .field("mask", &self.mask)
            .field("view_size", &self.view_size)
            .field("scroll", &self.scroll)
            .field("caret", &self.caret)
            .field("dirty", &self.dirty.get())
            .finish_non_exhaustive()
    }
}

impl CaretEngine {
    /// Empty engine laid out by a [`MonospaceShaper`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_shaper(Box::new(MonospaceShaper::new()))
    }

    #[must_use]
    pub fn with_shaper(shaper: Box<dyn Shaper>) -> Self {
        Self {
            buffer: GapBuffer::new(),
            params: LayoutParams::default(),
            single_line: false,
            mask: None,
            view_size: Point::default(),
            scroll: Point::default(),
            caret: Selection::default(),
            ime: (0, 0),
            dirty: Cell::new(Dirty::NeedsReshape),
            layout: RefCell::new(Layout {
                shaper,
                index: PositionIndex::new(),
                dims: Dimensions::default(),
            }),
            offsets: RefCell::new(Vec::new()),
        }
    }

    // =========================================================================
    // Layout state
    // =========================================================================

    /// Current validity of the cached layout.
    #[must_use]
    pub fn dirty(&self) -> Dirty {
        self.dirty.get()
    }

    fn invalidate(&mut self) {
        self.offsets.get_mut().clear();
        self.dirty.set(Dirty::NeedsReshape);
    }

    fn invalidate_index(&mut self) {
        self.offsets.get_mut().clear();
        if self.dirty.get() == Dirty::Clean {
            self.dirty.set(Dirty::NeedsReindex);
        }
    }

    /// Bring the layout up to date.
    pub fn make_valid(&self) {
        match self.dirty.get() {
            Dirty::Clean => return,
            Dirty::NeedsReshape => self.reshape(),
            Dirty::NeedsReindex => self.reindex(),
        }
        self.dirty.set(Dirty::Clean);
    }

    fn effective_params(&self) -> LayoutParams {
        let mut params = self.params.clone();
        if self.single_line {
            params.max_width = i32::MAX;
        }
        params
    }

    fn reshape(&self) {
        let params = self.effective_params();
        let mut layout = self.layout.borrow_mut();
        let mut reader = self.buffer.reader_at(0);
        let result = match self.mask {
            Some(mask) => layout.shaper.layout(&params, &mut MaskReader::new(reader, mask)),
            None => layout.shaper.layout(&params, &mut reader),
        };
        let mut index = PositionIndex::new();
        match result {
            Ok(()) => {
                while let Some(gl) = layout.shaper.next_glyph() {
                    index.glyph(gl);
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "shaping failed, falling back to null layout");
                let mut null = NullShaper::new();
                null.layout_runes(self.rune_count());
                while let Some(gl) = null.next_glyph() {
                    index.glyph(gl);
                }
            }
        }
        index.finish();
        layout.dims = glyph_dimensions(index.glyphs());
        layout.index = index;
        tracing::debug!(
            glyphs = layout.index.glyphs().len(),
            positions = layout.index.positions().len(),
            lines = layout.index.lines().len(),
            "text reshaped"
        );
    }

    fn reindex(&self) {
        let mut layout = self.layout.borrow_mut();
        let glyphs = layout.index.glyphs().to_vec();
        layout.index = PositionIndex::from_glyphs(glyphs);
        layout.dims = glyph_dimensions(layout.index.glyphs());
        tracing::debug!(
            positions = layout.index.positions().len(),
            lines = layout.index.lines().len(),
            "position index rebuilt"
        );
    }

    fn valid_layout(&self) -> Ref<'_, Layout> {
        self.make_valid();
        self.layout.borrow()
    }

    /// The position index of the current layout.
    pub fn index(&self) -> Ref<'_, PositionIndex> {
        Ref::map(self.valid_layout(), |l| &l.index)
    }

    fn rune_count(&self) -> usize {
        let (pre, post) = self.buffer.segments();
        pre.iter()
            .chain(post)
            .filter(|&&b| (b & 0xC0) != 0x80)
            .count()
    }

    #[must_use]
    pub fn closest_to_rune(&self, runes: usize) -> CaretPosition {
        self.index().closest_to_rune(runes).0
    }

    #[must_use]
    pub fn closest_to_line_col(&self, line: u32, col: u32) -> CaretPosition {
        self.index().closest_to_line_col(line, col)
    }

    #[must_use]
    pub fn closest_to_xy(&self, x: Fixed, y: i32) -> CaretPosition {
        self.index().closest_to_xy(x, y)
    }

    // =========================================================================
    // Shaping inputs
    // =========================================================================

    #[must_use]
    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    pub fn set_font(&mut self, font: Font) {
        if self.params.font != font {
            self.params.font = font;
            self.invalidate();
        }
    }

    /// Set the text size in pixels per em.
    pub fn set_text_size(&mut self, px_per_em: Fixed) {
        if self.params.px_per_em != px_per_em {
            self.params.px_per_em = px_per_em;
            self.invalidate();
        }
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        if self.params.alignment != alignment {
            self.params.alignment = alignment;
            self.invalidate();
        }
    }

    /// Set the width range lines are aligned and wrapped within.
    pub fn set_constraints(&mut self, min_width: i32, max_width: i32) {
        if (self.params.min_width, self.params.max_width) != (min_width, max_width) {
            self.params.min_width = min_width;
            self.params.max_width = max_width;
            self.invalidate();
        }
    }

    pub fn set_locale(&mut self, locale: Locale) {
        if self.params.locale != locale {
            self.params.locale = locale;
            self.invalidate();
        }
    }

    /// Limit the number of shaped lines; zero means unlimited.
    pub fn set_max_lines(&mut self, max_lines: usize) {
        if self.params.max_lines != max_lines {
            self.params.max_lines = max_lines;
            self.invalidate();
        }
    }

    #[must_use]
    pub fn single_line(&self) -> bool {
        self.single_line
    }

    /// In single-line mode lines never wrap and inserted newlines become spaces.
    pub fn set_single_line(&mut self, single_line: bool) {
        if self.single_line != single_line {
            self.single_line = single_line;
            self.invalidate();
        }
    }

    #[must_use]
    pub fn mask(&self) -> Option<char> {
        self.mask
    }

    /// Display every rune except `\n` as `mask`.
    pub fn set_mask(&mut self, mask: Option<char>) {
        if self.mask != mask {
            self.mask = mask;
            self.invalidate();
        }
    }

    pub fn set_shaper(&mut self, shaper: Box<dyn Shaper>) {
        self.layout.get_mut().shaper = shaper;
        self.invalidate();
    }

    #[must_use]
    pub fn view_size(&self) -> Point {
        self.view_size
    }

    /// Set the size of the visible viewport.
    pub fn set_view_size(&mut self, size: Point) {
        if self.view_size != size {
            self.view_size = size;
            self.invalidate_index();
        }
    }

    // =========================================================================
    // Text access
    // =========================================================================

    /// Replace the whole text, moving the caret to the start.
    pub fn set_text(&mut self, text: &str) {
        self.buffer = GapBuffer::new();
        self.caret = Selection::default();
        self.ime = (0, 0);
        self.invalidate();
        self.replace(0, 0, text);
        self.caret.xoff = Fixed::ZERO;
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    /// Length of the text in runes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.closest_to_rune(usize::MAX).rune_offset
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Byte offset of the rune nearest to `runes`, clamped to the text.
    #[must_use]
    pub fn byte_offset(&self, runes: usize) -> usize {
        let runes = self.closest_to_rune(runes).rune_offset;
        self.rune_offset(runes)
    }

    /// Byte offset of rune `r`, which should come from a caret position.
    fn rune_offset(&self, r: usize) -> usize {
        let mut offsets = self.offsets.borrow_mut();
        if offsets.is_empty() {
            offsets.push(OffsetEntry::default());
        }
        let i = offsets.partition_point(|e| e.runes <= r).saturating_sub(1);
        let last = offsets[offsets.len() - 1].runes;
        let mut entry = offsets[i];
        while entry.runes < r {
            let Some((_, size)) = self.buffer.rune_at(entry.bytes) else {
                break;
            };
            entry.bytes += size;
            entry.runes += 1;
            if entry.runes > last && entry.runes % RUNES_PER_OFFSET_ENTRY == 0 {
                offsets.push(entry);
            }
        }
        entry.bytes
    }

    /// Copy text from byte `offset` into `buf`, returning the bytes copied.
    pub fn read_at(&self, offset: usize, buf: &mut [u8]) -> usize {
        self.buffer.read_at(offset, buf)
    }

    /// The rune starting at byte `offset`.
    #[must_use]
    pub fn rune_at(&self, offset: usize) -> Option<(char, usize)> {
        self.buffer.rune_at(offset)
    }

    /// The rune ending at byte `offset`.
    #[must_use]
    pub fn rune_before(&self, offset: usize) -> Option<(char, usize)> {
        self.buffer.rune_before(offset)
    }

    /// Write the whole text to `w`.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_to(&self, w: &mut dyn Write) -> io::Result<u64> {
        self.buffer.write_to(w)
    }

    /// Report whether the text changed since the last call, and reset.
    pub fn take_changed(&mut self) -> bool {
        self.buffer.take_changed()
    }

    /// Text between two rune offsets, in either order. Both are snapped to
    /// caret positions first.
    #[must_use]
    pub fn text_range(&self, a: usize, b: usize) -> String {
        let a = self.byte_offset(a);
        let b = self.byte_offset(b);
        let (start, end) = if a > b { (b, a) } else { (a, b) };
        let mut buf = vec![0u8; end - start];
        let n = self.buffer.read_at(start, &mut buf);
        debug_assert_eq!(n, buf.len(), "gap buffer read truncated");
        buf.truncate(n);
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[must_use]
    pub fn selected_text(&self) -> String {
        self.text_range(self.caret.start, self.caret.end)
    }

    /// Length of the selection in runes.
    #[must_use]
    pub fn selection_len(&self) -> usize {
        self.caret.start.abs_diff(self.caret.end)
    }

    /// The caret and the selection anchor, in runes. The caret may come after
    /// the anchor.
    #[must_use]
    pub fn selection(&self) -> (usize, usize) {
        (self.caret.start, self.caret.end)
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Replace the runes between `start` and `end` with `s`.
    ///
    /// The offsets are snapped to caret positions and may come in either
    /// order. The caret, the anchor and the input method range follow the
    /// edit. Returns the number of runes inserted.
    pub fn replace(&mut self, start: usize, end: usize, s: &str) -> usize {
        if self.single_line && s.contains('\n') {
            self.splice(start, end, &s.replace('\n', " "))
        } else {
            self.splice(start, end, s)
        }
    }

    /// [`replace`](Self::replace) without the single-line newline rewrite.
    /// Undo and redo replay stored text through this so it comes back exact.
    pub(crate) fn splice(&mut self, start: usize, end: usize, s: &str) -> usize {
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        let start_pos = self.closest_to_rune(start).rune_offset;
        let end_pos = self.closest_to_rune(end).rune_offset;
        let start_off = self.rune_offset(start_pos);
        let inserted = s.chars().count();
        let new_end = start_pos + inserted;

        self.buffer.replace_runes(start_off, end_pos - start_pos, s);
        let adjust = |pos: usize| {
            if new_end < pos && pos <= end_pos {
                new_end
            } else if end_pos < pos {
                pos - end_pos + new_end
            } else {
                pos
            }
        };
        self.caret.start = adjust(self.caret.start);
        self.caret.end = adjust(self.caret.end);
        self.ime = (adjust(self.ime.0), adjust(self.ime.1));
        self.invalidate();
        inserted
    }

    /// Delete `runes` runes at the caret, backward when negative. A
    /// selection counts as one rune and is always removed whole.
    pub fn delete(&mut self, runes: isize) {
        self.delete_with(runes, &mut |engine, start, end| {
            engine.replace(start, end, "");
        });
    }

    /// [`delete`](Self::delete), routing the removal through `replace`.
    pub(crate) fn delete_with(
        &mut self,
        mut runes: isize,
        replace: &mut dyn FnMut(&mut Self, usize, usize),
    ) {
        if runes == 0 {
            return;
        }
        let start = self.caret.start;
        if start != self.caret.end {
            runes -= runes.signum();
        }
        let end = self.caret.end.saturating_add_signed(runes);
        replace(self, start, end);
        self.caret.xoff = Fixed::ZERO;
        self.clear_selection();
    }

    /// Delete `distance` words at the caret, backward when negative.
    ///
    /// A run of whitespace counts as a word of its own, so deleting forward
    /// from inside a word stops before the following space. Returns the
    /// number of runes removed, zero at either end of the text.
    pub fn delete_word(&mut self, distance: isize) -> usize {
        let before = self.len();
        self.delete_word_with(distance, &mut |engine, start, end| {
            engine.replace(start, end, "");
        });
        before.saturating_sub(self.len())
    }

    /// [`delete_word`](Self::delete_word), routing removals through `replace`.
    pub(crate) fn delete_word_with(
        &mut self,
        mut distance: isize,
        replace: &mut dyn FnMut(&mut Self, usize, usize),
    ) {
        if distance == 0 {
            return;
        }
        if self.caret.start != self.caret.end {
            self.delete_with(1, replace);
            distance -= distance.signum();
        }
        if distance == 0 {
            return;
        }
        let words = distance.unsigned_abs();
        let backward = distance < 0;
        let caret = self.rune_offset(self.closest_to_rune(self.caret.start).rune_offset);
        let len = self.buffer.len();
        let target = |offset: usize| {
            if backward {
                caret.checked_sub(offset)
            } else {
                caret.checked_add(offset).filter(|&i| i <= len)
            }
        };
        let at_end = |offset: usize| target(offset).is_none_or(|i| i == 0 || i >= len);
        let next = |offset: usize| {
            let idx = target(offset).unwrap_or(if backward { 0 } else { len });
            let rune = if backward {
                self.buffer.rune_before(idx)
            } else {
                self.buffer.rune_at(idx)
            };
            rune.map_or((None, 0), |(c, size)| (Some(c), size))
        };
        let is_space = |c: Option<char>| c.is_some_and(char::is_whitespace);

        let mut runes: isize = 1;
        let mut bytes = if backward {
            self.buffer.rune_before(caret)
        } else {
            self.buffer.rune_at(caret)
        }
        .map_or(0, |(_, size)| size);
        for _ in 0..words {
            let space = is_space(next(bytes).0);
            loop {
                let (r, size) = next(bytes);
                if is_space(r) != space || at_end(bytes) {
                    break;
                }
                runes += 1;
                bytes += size;
            }
        }
        self.delete_with(if backward { -runes } else { runes }, replace);
    }

    // =========================================================================
    // Caret movement
    // =========================================================================

    fn update_selection(&mut self, action: SelectionAction) {
        if action == SelectionAction::Clear {
            self.clear_selection();
        }
    }

    /// Collapse the selection onto the caret.
    pub fn clear_selection(&mut self) {
        self.caret.end = self.caret.start;
    }

    /// Move the caret to `start` and the anchor to `end`, both snapped.
    pub fn set_caret(&mut self, start: usize, end: usize) {
        self.caret.start = self.closest_to_rune(start).rune_offset;
        self.caret.end = self.closest_to_rune(end).rune_offset;
    }

    /// Move the caret and the anchor by signed rune deltas.
    pub fn move_caret(&mut self, start_delta: isize, end_delta: isize) {
        self.caret.xoff = Fixed::ZERO;
        self.caret.start = self
            .closest_to_rune(self.caret.start.saturating_add_signed(start_delta))
            .rune_offset;
        self.caret.end = self
            .closest_to_rune(self.caret.end.saturating_add_signed(end_delta))
            .rune_offset;
    }

    /// Move the caret `distance` lines up or down, keeping its horizontal
    /// position across repeated moves.
    pub fn move_lines(&mut self, distance: isize, action: SelectionAction) {
        let caret = self.closest_to_rune(self.caret.start);
        let x = caret.pixel_x + self.caret.xoff;
        let line = i64::from(caret.line) + distance as i64;
        let line = u32::try_from(line.max(0)).unwrap_or(u32::MAX);
        let pos = self.closest_to_line_col(line, 0);
        let pos = self.closest_to_xy(x, pos.pixel_y);
        self.caret.start = pos.rune_offset;
        self.caret.xoff = x - pos.pixel_x;
        self.update_selection(action);
    }

    /// Move the caret by whole viewport heights.
    pub fn move_pages(&mut self, pages: i32, action: SelectionAction) {
        let caret = self.closest_to_rune(self.caret.start);
        let x = caret.pixel_x + self.caret.xoff;
        let y = caret
            .pixel_y
            .saturating_add(pages.saturating_mul(self.view_size.y));
        let pos = self.closest_to_xy(x, y);
        self.caret.start = pos.rune_offset;
        self.caret.xoff = x - pos.pixel_x;
        self.update_selection(action);
    }

    /// Move the caret to the start of its line.
    pub fn move_line_start(&mut self, action: SelectionAction) {
        let caret = self.closest_to_rune(self.caret.start);
        let caret = self.closest_to_line_col(caret.line, 0);
        self.caret.start = caret.rune_offset;
        self.caret.xoff = -caret.pixel_x;
        self.update_selection(action);
    }

    /// Move the caret to the end of its line.
    pub fn move_line_end(&mut self, action: SelectionAction) {
        let caret = self.closest_to_rune(self.caret.start);
        let caret = self.closest_to_line_col(caret.line, u32::MAX);
        self.caret.start = caret.rune_offset;
        self.caret.xoff = Fixed::from_int(self.effective_params().max_width) - caret.pixel_x;
        self.update_selection(action);
    }

    pub fn move_text_start(&mut self, action: SelectionAction) {
        self.caret.start = self.closest_to_rune(0).rune_offset;
        self.caret.xoff = Fixed::ZERO;
        self.update_selection(action);
    }

    pub fn move_text_end(&mut self, action: SelectionAction) {
        self.caret.start = self.closest_to_rune(usize::MAX).rune_offset;
        self.caret.xoff = Fixed::ZERO;
        self.update_selection(action);
    }

    /// Move the caret over `distance` words, backward when negative.
    /// Returns the number of runes the caret moved.
    pub fn move_word(&mut self, distance: isize, action: SelectionAction) -> usize {
        let words = distance.unsigned_abs();
        let direction: isize = if distance < 0 { -1 } else { 1 };
        let len = self.len();
        let mut caret = self.closest_to_rune(self.caret.start).rune_offset;
        let from = caret;
        let at_end = |caret: usize| caret == 0 || caret == len;
        let next = |engine: &Self, caret: usize| {
            let off = engine.rune_offset(caret);
            let rune = if direction < 0 {
                engine.buffer.rune_before(off)
            } else {
                engine.buffer.rune_at(off)
            };
            rune.is_some_and(|(c, _)| c.is_whitespace())
        };
        for _ in 0..words {
            while next(self, caret) && !at_end(caret) {
                self.move_caret(direction, 0);
                caret = self.closest_to_rune(self.caret.start).rune_offset;
            }
            self.move_caret(direction, 0);
            caret = self.closest_to_rune(self.caret.start).rune_offset;
            while !next(self, caret) && !at_end(caret) {
                self.move_caret(direction, 0);
                caret = self.closest_to_rune(self.caret.start).rune_offset;
            }
        }
        self.update_selection(action);
        caret.abs_diff(from)
    }

    /// Move the caret to the position nearest a viewport point. The anchor
    /// is left alone.
    pub fn move_coord(&mut self, pos: Point) {
        let x = Fixed::from_int(pos.x.saturating_add(self.scroll.x));
        let y = pos.y.saturating_add(self.scroll.y);
        self.caret.start = self.closest_to_xy(x, y).rune_offset;
        self.caret.xoff = Fixed::ZERO;
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Line and column of the caret.
    #[must_use]
    pub fn caret_pos(&self) -> (u32, u32) {
        let pos = self.closest_to_rune(self.caret.start);
        (pos.line, pos.column)
    }

    /// Caret coordinates relative to the viewport, with sub-pixel precision.
    #[must_use]
    pub fn caret_coords(&self) -> (f32, f32) {
        let pos = self.closest_to_rune(self.caret.start);
        (
            pos.pixel_x.to_f32() - self.scroll.x as f32,
            (pos.pixel_y - self.scroll.y) as f32,
        )
    }

    #[must_use]
    pub fn caret_info(&self) -> CaretInfo {
        let pos = self.closest_to_rune(self.caret.start);
        CaretInfo {
            pos: Point::new(pos.pixel_x.round(), pos.pixel_y) - self.scroll,
            ascent: pos.ascent.ceil(),
            descent: pos.descent.ceil(),
        }
    }

    /// Dimensions of the viewport, with the baseline of the shaped text.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        let dims = self.valid_layout().dims;
        let base = dims.size.y - dims.baseline;
        Dimensions {
            size: self.view_size,
            baseline: self.view_size.y - base,
        }
    }

    /// Dimensions of all shaped text, visible or not.
    #[must_use]
    pub fn full_dimensions(&self) -> Dimensions {
        self.valid_layout().dims
    }

    #[must_use]
    pub fn num_lines(&self) -> usize {
        self.index().lines().len()
    }

    // =========================================================================
    // Scrolling
    // =========================================================================

    /// Range of valid scroll offsets. Single-line text scrolls
    /// horizontally, everything else vertically.
    #[must_use]
    pub fn scroll_bounds(&self) -> Rect {
        let layout = self.valid_layout();
        let mut b = Rect::default();
        if self.single_line {
            if let Some(line) = layout.index.lines().first() {
                b.min.x = line.x_offset.floor().min(0);
            }
            b.max.x = layout.dims.size.x + b.min.x - self.view_size.x;
        } else {
            b.max.y = layout.dims.size.y - self.view_size.y;
        }
        b
    }

    #[must_use]
    pub fn scroll_off(&self) -> Point {
        self.scroll
    }

    pub fn scroll_rel(&mut self, dx: i32, dy: i32) {
        self.scroll_abs(
            self.scroll.x.saturating_add(dx),
            self.scroll.y.saturating_add(dy),
        );
    }

    fn scroll_abs(&mut self, x: i32, y: i32) {
        let b = self.scroll_bounds();
        let mut x = x;
        let mut y = y;
        if x > b.max.x {
            x = b.max.x;
        }
        if x < b.min.x {
            x = b.min.x;
        }
        if y > b.max.y {
            y = b.max.y;
        }
        if y < b.min.y {
            y = b.min.y;
        }
        self.scroll = Point::new(x, y);
    }

    /// Scroll the least amount that brings the caret into view.
    pub fn scroll_to_caret(&mut self) {
        let caret = self.closest_to_rune(self.caret.start);
        if self.single_line {
            let mut dist = 0;
            let d = caret.pixel_x.floor() - self.scroll.x;
            if d < 0 {
                dist = d;
            } else {
                let d = caret.pixel_x.ceil() - (self.scroll.x + self.view_size.x);
                if d > 0 {
                    dist = d;
                }
            }
            self.scroll_rel(dist, 0);
        } else {
            let min_y = caret.pixel_y - caret.ascent.ceil();
            let max_y = caret.pixel_y + caret.descent.ceil();
            let mut dist = 0;
            let d = min_y - self.scroll.y;
            if d < 0 {
                dist = d;
            } else {
                let d = max_y - (self.scroll.y + self.view_size.y);
                if d > 0 {
                    dist = d;
                }
            }
            self.scroll_rel(0, dist);
        }
    }

    // =========================================================================
    // Rendering output
    // =========================================================================

    fn viewport(&self) -> Rect {
        Rect::new(self.scroll, self.scroll + self.view_size)
    }

    /// Regions covering the runes between `start` and `end` on visible
    /// lines, in document coordinates.
    #[must_use]
    pub fn regions(&self, start: usize, end: usize) -> Vec<Region> {
        let mut rects = Vec::new();
        self.index().locate(self.viewport(), start, end, &mut rects);
        rects
    }

    #[must_use]
    pub fn selection_regions(&self) -> Vec<Region> {
        self.regions(self.caret.start, self.caret.end)
    }

    /// Glyphs of the visible lines and the offset to paint them at.
    #[must_use]
    pub fn visible_glyphs(&self) -> (Vec<Glyph>, Point) {
        let viewport = self.viewport();
        let index = self.index();
        let mut first = 0usize;
        let mut count = 0usize;
        let mut above = true;
        for line in index.lines() {
            let glyphs = line.glyph_count as usize;
            if above && line.descent.ceil() + line.y_offset < viewport.min.y {
                first += glyphs;
                continue;
            }
            above = false;
            if line.y_offset - line.ascent.ceil() > viewport.max.y {
                break;
            }
            count += glyphs;
        }
        let glyphs = index.glyphs();
        let first = first.min(glyphs.len());
        let last = (first + count).min(glyphs.len());
        (glyphs[first..last].to_vec(), Point::default() - self.scroll)
    }

    // =========================================================================
    // Input method
    // =========================================================================

    /// Composition range of the input method.
    #[must_use]
    pub fn ime_range(&self) -> (usize, usize) {
        self.ime
    }

    pub fn set_ime_range(&mut self, start: usize, end: usize) {
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        let len = self.len();
        self.ime = (start.min(len), end.min(len));
    }

    /// Text between two rune offsets for an input method, which also
    /// becomes its composition range.
    pub fn ime_snippet(&mut self, start: usize, end: usize) -> ImeSnippet {
        self.set_ime_range(start, end);
        let (start, end) = self.ime;
        ImeSnippet {
            start,
            end,
            text: self.text_range(start, end),
        }
    }
}

/// Union of the logical bounds of `glyphs`.
fn glyph_dimensions(glyphs: &[Glyph]) -> Dimensions {
    let Some(first) = glyphs.first() else {
        return Dimensions::default();
    };
    let bounds = glyphs
        .iter()
        .map(|g| {
            Rect::new(
                Point::new(g.x.floor(), g.y - g.ascent.ceil()),
                Point::new((g.x + g.advance).ceil(), g.y + g.descent.ceil()),
            )
        })
        .reduce(|a, b| a.union(&b))
        .unwrap_or_default();
    let size = bounds.size();
    Dimensions {
        size,
        baseline: size.y - first.y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use std::io::Read;

    fn engine(text: &str) -> CaretEngine {
        let mut e = CaretEngine::new();
        e.set_text(text);
        e
    }

    struct FailingShaper;

    impl Shaper for FailingShaper {
        fn layout(&mut self, _: &LayoutParams, _: &mut dyn Read) -> Result<()> {
            Err(Error::Shaping("no faces".to_string()))
        }

        fn next_glyph(&mut self) -> Option<Glyph> {
            None
        }
    }

    #[test]
    fn test_set_text_resets_caret() {
        let mut e = engine("hello");
        assert_eq!(e.selection(), (0, 0));
        assert_eq!(e.len(), 5);
        assert_eq!(e.text(), "hello");
        assert!(e.take_changed());
        assert!(!e.take_changed());
    }

    #[test]
    fn test_lazy_layout_states() {
        let mut e = engine("abc");
        assert_eq!(e.dirty(), Dirty::NeedsReshape);
        let _ = e.len();
        assert_eq!(e.dirty(), Dirty::Clean);
        e.set_view_size(Point::new(100, 40));
        assert_eq!(e.dirty(), Dirty::NeedsReindex);
        e.make_valid();
        assert_eq!(e.dirty(), Dirty::Clean);
        e.set_text_size(Fixed::from_int(20));
        assert_eq!(e.dirty(), Dirty::NeedsReshape);
        // A reindex request never downgrades a pending reshape.
        e.set_view_size(Point::new(50, 40));
        assert_eq!(e.dirty(), Dirty::NeedsReshape);
    }

    #[test]
    fn test_replace_adjusts_caret_and_anchor() {
        let mut e = engine("hello world");
        e.set_caret(11, 8);
        assert_eq!(e.replace(0, 5, "hi"), 2);
        assert_eq!(e.text(), "hi world");
        assert_eq!(e.selection(), (8, 5));

        // Positions inside the replaced span collapse to its new end.
        e.set_caret(4, 4);
        e.replace(6, 2, "");
        assert_eq!(e.text(), "hild");
        assert_eq!(e.selection(), (2, 2));
    }

    #[test]
    fn test_replace_snaps_and_orders() {
        let mut e = engine("abc");
        e.replace(100, 1, "X");
        assert_eq!(e.text(), "aX");
    }

    #[test]
    fn test_single_line_replaces_newlines() {
        let mut e = CaretEngine::new();
        e.set_single_line(true);
        e.set_text("a\nb");
        assert_eq!(e.text(), "a b");
        assert_eq!(e.num_lines(), 1);
    }

    #[test]
    fn test_delete_selection_counts_as_one() {
        let mut e = engine("abcdef");
        e.set_caret(4, 2);
        e.delete(-1);
        assert_eq!(e.text(), "abef");
        assert_eq!(e.selection(), (2, 2));

        e.set_caret(1, 3);
        e.delete(2);
        assert_eq!(e.text(), "a");
        assert_eq!(e.selection(), (1, 1));
    }

    #[test]
    fn test_delete_at_bounds_is_noop() {
        let mut e = engine("ab");
        e.delete(-1);
        assert_eq!(e.text(), "ab");
        e.set_caret(2, 2);
        e.delete(3);
        assert_eq!(e.text(), "ab");
    }

    #[test]
    fn test_delete_word() {
        let mut e = engine("hello world");
        e.set_caret(3, 3);
        e.delete_word(1);
        assert_eq!(e.text(), "hel world");
        assert_eq!(e.selection(), (3, 3));

        let mut e = engine("hello world");
        e.set_caret(11, 11);
        e.delete_word(-1);
        assert_eq!(e.text(), "hello ");

        let mut e = engine("hello world");
        e.set_caret(6, 6);
        assert_eq!(e.delete_word(-1), 6);
        assert_eq!(e.text(), "world");
    }

    #[test]
    fn test_word_ops_report_runes() {
        let mut e = engine("ab cd");
        assert_eq!(e.move_word(-1, SelectionAction::Clear), 0);
        assert_eq!(e.delete_word(-1), 0);
        assert_eq!(e.move_word(1, SelectionAction::Clear), 2);
        assert_eq!(e.move_word(1, SelectionAction::Clear), 3);
        assert_eq!(e.move_word(1, SelectionAction::Clear), 0);
        assert_eq!(e.delete_word(1), 0);
        assert_eq!(e.text(), "ab cd");
        assert_eq!(e.delete_word(-1), 2);
        assert_eq!(e.text(), "ab ");
    }

    #[test]
    fn test_move_word() {
        let mut e = engine("hello world  foo");
        e.move_word(1, SelectionAction::Clear);
        assert_eq!(e.selection(), (5, 5));
        e.move_word(1, SelectionAction::Clear);
        assert_eq!(e.selection(), (11, 11));
        e.move_word(1, SelectionAction::Extend);
        assert_eq!(e.selection(), (16, 11));
        e.move_word(-2, SelectionAction::Clear);
        assert_eq!(e.selection(), (6, 6));
    }

    #[test]
    fn test_move_lines_keeps_column() {
        let mut e = engine("abcdef\nab\nabcdef");
        e.set_caret(4, 4);
        e.move_lines(1, SelectionAction::Clear);
        assert_eq!(e.caret_pos(), (1, 2));
        e.move_lines(1, SelectionAction::Clear);
        assert_eq!(e.caret_pos(), (2, 4));
        e.move_lines(-5, SelectionAction::Extend);
        assert_eq!(e.caret_pos(), (0, 4));
    }

    #[test]
    fn test_line_start_end() {
        let mut e = engine("ab\ncde");
        e.set_caret(4, 4);
        e.move_line_end(SelectionAction::Clear);
        assert_eq!(e.selection(), (6, 6));
        e.move_line_start(SelectionAction::Extend);
        assert_eq!(e.selection(), (3, 6));
        assert_eq!(e.selected_text(), "cde");
        e.move_text_start(SelectionAction::Clear);
        assert_eq!(e.selection(), (0, 0));
        e.move_text_end(SelectionAction::Clear);
        assert_eq!(e.selection(), (6, 6));
    }

    #[test]
    fn test_move_coord() {
        let mut e = engine("abcd\nefgh");
        e.move_coord(Point::new(17, 20));
        assert_eq!(e.caret_pos(), (1, 2));
    }

    #[test]
    fn test_byte_offset_cache() {
        let text = "\u{e6}".repeat(120);
        let e = engine(&text);
        assert_eq!(e.byte_offset(0), 0);
        assert_eq!(e.byte_offset(110), 220);
        assert_eq!(e.byte_offset(55), 110);
        assert_eq!(e.byte_offset(1000), 240);
        assert!(e.offsets.borrow().len() >= 3);
    }

    #[test]
    fn test_geometry() {
        let mut e = engine("hello");
        e.set_view_size(Point::new(100, 50));
        assert_eq!(e.full_dimensions().size, Point::new(40, 17));
        assert_eq!(e.full_dimensions().baseline, 4);
        assert_eq!(e.dimensions().size, Point::new(100, 50));
        assert_eq!(e.dimensions().baseline, 37);

        e.set_caret(2, 2);
        let info = e.caret_info();
        assert_eq!(info.pos, Point::new(16, 13));
        assert_eq!((info.ascent, info.descent), (13, 4));
        assert_eq!(e.caret_coords(), (16.0, 13.0));
    }

    #[test]
    fn test_scroll_vertical() {
        let mut e = engine(&"line\n".repeat(10));
        e.set_view_size(Point::new(100, 32));
        // Eleven lines; the last baseline is at 173, its descent ends at 177.
        assert_eq!(e.scroll_bounds().max.y, 177 - 32);
        e.move_text_end(SelectionAction::Clear);
        e.scroll_to_caret();
        assert_eq!(e.scroll_off(), Point::new(0, 177 - 32));
        e.scroll_rel(0, -1000);
        assert_eq!(e.scroll_off(), Point::new(0, 0));
    }

    #[test]
    fn test_scroll_horizontal_single_line() {
        let mut e = CaretEngine::new();
        e.set_single_line(true);
        e.set_text(&"x".repeat(20));
        e.set_view_size(Point::new(80, 20));
        e.move_text_end(SelectionAction::Clear);
        e.scroll_to_caret();
        assert_eq!(e.scroll_off(), Point::new(80, 0));
        e.move_text_start(SelectionAction::Clear);
        e.scroll_to_caret();
        assert_eq!(e.scroll_off(), Point::new(0, 0));
    }

    #[test]
    fn test_visible_glyphs_skip_lines_above() {
        let mut e = engine("aa\nbb\ncc");
        e.set_view_size(Point::new(100, 16));
        e.scroll_rel(0, 20);
        let (glyphs, offset) = e.visible_glyphs();
        assert_eq!(offset, Point::new(0, -20));
        assert!(glyphs.iter().all(|g| g.y >= 29));
        assert!(!glyphs.is_empty());
    }

    #[test]
    fn test_selection_regions() {
        let mut e = engine("abcd\nefgh");
        e.set_view_size(Point::new(100, 100));
        e.set_caret(7, 2);
        let regions = e.selection_regions();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].bounds.min.x, 16);
        assert_eq!(regions[1].bounds.max.x, 16);
    }

    #[test]
    fn test_ime_range_follows_edits() {
        let mut e = engine("hello world");
        e.set_ime_range(6, 11);
        e.replace(0, 0, ">> ");
        assert_eq!(e.ime_range(), (9, 14));
        let snippet = e.ime_snippet(14, 9);
        assert_eq!(snippet.text, "world");
        assert_eq!((snippet.start, snippet.end), (9, 14));
    }

    #[test]
    fn test_mask_keeps_positions() {
        let mut e = engine("p\u{e4}ss\nword");
        e.set_mask(Some('*'));
        assert_eq!(e.len(), 9);
        assert_eq!(e.num_lines(), 2);
        // The text itself is untouched.
        assert_eq!(e.text(), "p\u{e4}ss\nword");
    }

    #[test]
    fn test_shaper_failure_falls_back() {
        let mut e = CaretEngine::with_shaper(Box::new(FailingShaper));
        e.set_text("abc");
        assert_eq!(e.len(), 3);
        e.move_caret(2, 2);
        assert_eq!(e.selection(), (2, 2));
    }

    #[test]
    fn test_write_to() {
        let e = engine("abc");
        let mut out = Vec::new();
        assert_eq!(e.write_to(&mut out).unwrap(), 3);
        assert_eq!(out, b"abc");
    }
}
