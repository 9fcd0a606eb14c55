//! A terminal-style shaper: every grapheme cluster is one glyph on a cell grid.

use super::{Glyph, GlyphFlags, GlyphId, LayoutParams, Shaper, read_text};
use crate::error::Result;
use crate::fixed::Fixed;
use crate::unicode::{Direction, WidthMethod, grapheme_info, resolve_bidi, visual_order};
use std::io::Read;

const NEWLINE_ID: GlyphId = '\n' as GlyphId;
const TRUNCATOR_ID: GlyphId = '\u{2026}' as GlyphId;

/// Vertical and horizontal metrics derived from the em size.
#[derive(Clone, Copy, Debug)]
struct Metrics {
    cell: Fixed,
    ascent: Fixed,
    descent: Fixed,
}

impl Metrics {
    fn new(px_per_em: Fixed) -> Self {
        Self {
            cell: px_per_em / 2,
            ascent: px_per_em * 4 / 5,
            descent: px_per_em / 5,
        }
    }

    fn line_height(self) -> i32 {
        (self.ascent + self.descent).ceil()
    }

    fn baseline(self, line: usize) -> i32 {
        let line = i32::try_from(line).unwrap_or(i32::MAX);
        self.ascent
            .ceil()
            .saturating_add(line.saturating_mul(self.line_height()))
    }
}

#[derive(Clone, Copy, Debug)]
struct Cluster {
    id: GlyphId,
    runes: u32,
    advance: Fixed,
    level: u8,
    whitespace: bool,
    newline: bool,
    truncator: bool,
}

#[derive(Clone, Debug)]
struct Line {
    clusters: Vec<Cluster>,
    direction: Direction,
    paragraph_start: bool,
}

impl Line {
    fn width(&self) -> Fixed {
        self.clusters
            .iter()
            .fold(Fixed::ZERO, |w, c| w + c.advance)
    }
}

/// Shaper placing grapheme clusters on a monospace cell grid.
///
/// A cluster advances by its display width in cells, half an em per cell.
/// Lines wrap greedily at the maximum width, preferring to break after
/// whitespace, and each line's bidi runs are placed in visual order.
#[derive(Clone, Debug, Default)]
pub struct MonospaceShaper {
    width_method: WidthMethod,
    glyphs: Vec<Glyph>,
    next: usize,
}

impl MonospaceShaper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how ambiguous-width characters are measured.
    #[must_use]
    pub const fn with_width_method(mut self, method: WidthMethod) -> Self {
        self.width_method = method;
        self
    }

    fn paragraph_clusters(
        &self,
        para: &str,
        newline: bool,
        params: &LayoutParams,
        metrics: Metrics,
    ) -> (Vec<Cluster>, Direction) {
        let bidi = resolve_bidi(para, params.locale.direction);
        let base_level = bidi.base_level();
        let mut clusters: Vec<Cluster> = grapheme_info(para, self.width_method)
            .into_iter()
            .map(|info| {
                let first = para[info.byte_offset..].chars().next().unwrap_or(' ');
                Cluster {
                    id: GlyphId::from(u32::from(first)),
                    runes: info.runes,
                    advance: metrics.cell * i32::try_from(info.cells).unwrap_or(i32::MAX),
                    level: bidi.levels.get(info.char_offset).copied().unwrap_or(base_level),
                    whitespace: info.whitespace,
                    newline: false,
                    truncator: false,
                }
            })
            .collect();
        if newline {
            clusters.push(Cluster {
                id: NEWLINE_ID,
                runes: 1,
                advance: Fixed::ZERO,
                level: base_level,
                whitespace: true,
                newline: true,
                truncator: false,
            });
        }
        (clusters, bidi.base_direction)
    }

    /// Greedy line breaking of one paragraph.
    fn break_lines(
        clusters: Vec<Cluster>,
        direction: Direction,
        paragraph_start: bool,
        max: Fixed,
        out: &mut Vec<Line>,
    ) {
        let mut first = paragraph_start;
        let mut current: Vec<Cluster> = Vec::new();
        let mut width = Fixed::ZERO;
        // Index just past the last whitespace cluster of the current line.
        let mut break_after: Option<usize> = None;

        for cluster in clusters {
            if !cluster.whitespace && !current.is_empty() && width + cluster.advance > max {
                let split = break_after.unwrap_or(current.len());
                let rest = current.split_off(split);
                out.push(Line {
                    clusters: current,
                    direction,
                    paragraph_start: first,
                });
                first = false;
                width = rest.iter().fold(Fixed::ZERO, |w, c| w + c.advance);
                current = rest;
                break_after = None;
            }
            width += cluster.advance;
            current.push(cluster);
            if cluster.whitespace {
                break_after = Some(current.len());
            }
        }
        if !current.is_empty() {
            out.push(Line {
                clusters: current,
                direction,
                paragraph_start: first,
            });
        }
    }

    /// Keep at most `max_lines` lines, folding the rest into a truncator.
    ///
    /// Returns whether anything was cut.
    fn truncate(lines: &mut Vec<Line>, max_lines: usize, trailing: bool, max: Fixed, cell: Fixed) -> bool {
        let total = lines.len() + usize::from(trailing);
        if max_lines == 0 || total <= max_lines {
            return false;
        }
        let mut runes: u32 = lines
            .drain(max_lines.min(lines.len())..)
            .flat_map(|l| l.clusters)
            .fold(0u32, |n, c| n.saturating_add(c.runes));
        let Some(last) = lines.last_mut() else {
            return false;
        };
        if last.clusters.last().is_some_and(|c| c.newline) {
            last.clusters.pop();
            runes = runes.saturating_add(1);
        }
        while !last.clusters.is_empty() && last.width() + cell > max {
            if let Some(c) = last.clusters.pop() {
                runes = runes.saturating_add(c.runes);
            }
        }
        last.clusters.push(Cluster {
            id: TRUNCATOR_ID,
            runes,
            advance: cell,
            level: last.direction.base_level(),
            whitespace: false,
            newline: false,
            truncator: true,
        });
        true
    }

    fn emit_line(&mut self, line: &Line, y: i32, align: Fixed, metrics: Metrics) {
        // Runs are maximal sequences of clusters sharing a bidi level.
        let mut runs: Vec<(usize, usize, u8)> = Vec::new();
        for (i, c) in line.clusters.iter().enumerate() {
            match runs.last_mut() {
                Some((_, end, level)) if *level == c.level => *end = i + 1,
                _ => runs.push((i, i + 1, c.level)),
            }
        }
        let advances: Vec<Fixed> = runs
            .iter()
            .map(|&(start, end, _)| {
                line.clusters[start..end]
                    .iter()
                    .fold(Fixed::ZERO, |w, c| w + c.advance)
            })
            .collect();
        let levels: Vec<u8> = runs.iter().map(|r| r.2).collect();
        let mut run_x = vec![Fixed::ZERO; runs.len()];
        let mut x = align;
        for r in visual_order(&levels) {
            run_x[r] = x;
            x += advances[r];
        }

        let last_run = runs.len().saturating_sub(1);
        for (r, &(start, end, level)) in runs.iter().enumerate() {
            let rtl = level % 2 == 1;
            let mut acc = Fixed::ZERO;
            for i in start..end {
                let c = line.clusters[i];
                let gx = if rtl {
                    acc += c.advance;
                    run_x[r] + advances[r] - acc
                } else {
                    let gx = run_x[r] + acc;
                    acc += c.advance;
                    gx
                };
                let mut flags = GlyphFlags::CLUSTER_BREAK;
                if rtl {
                    flags |= GlyphFlags::TOWARD_ORIGIN;
                }
                if i + 1 == end {
                    flags |= GlyphFlags::RUN_BREAK;
                    if r == last_run {
                        flags |= GlyphFlags::LINE_BREAK;
                    }
                }
                if i == 0 && line.paragraph_start {
                    flags |= GlyphFlags::PARAGRAPH_START;
                }
                if c.newline {
                    flags |= GlyphFlags::PARAGRAPH_BREAK;
                }
                if c.truncator {
                    flags |= GlyphFlags::TRUNCATOR;
                }
                self.glyphs.push(Glyph {
                    id: c.id,
                    x: gx,
                    y,
                    advance: c.advance,
                    ascent: metrics.ascent,
                    descent: metrics.descent,
                    runes: c.runes,
                    flags,
                });
            }
        }
    }
}

impl Shaper for MonospaceShaper {
    fn layout(&mut self, params: &LayoutParams, text: &mut dyn Read) -> Result<()> {
        let text = read_text(text)?;
        self.glyphs.clear();
        self.next = 0;
        if text.is_empty() {
            return Ok(());
        }

        let metrics = Metrics::new(params.px_per_em);
        let max = if params.max_width == i32::MAX {
            Fixed::MAX
        } else {
            Fixed::from_int(params.max_width.max(0))
        };

        let mut lines: Vec<Line> = Vec::new();
        let paragraphs: Vec<&str> = text.split('\n').collect();
        let mut trailing = false;
        for (i, para) in paragraphs.iter().enumerate() {
            let newline = i + 1 < paragraphs.len();
            if !newline && para.is_empty() {
                trailing = true;
                continue;
            }
            let (clusters, direction) = self.paragraph_clusters(para, newline, params, metrics);
            Self::break_lines(clusters, direction, i > 0, max, &mut lines);
        }
        let truncated = Self::truncate(&mut lines, params.max_lines, trailing, max, metrics.cell);

        let widest = lines.iter().map(Line::width).max().unwrap_or(Fixed::ZERO);
        let available = widest.max(Fixed::from_int(params.min_width));
        for (i, line) in lines.iter().enumerate() {
            let align = params.alignment.align(line.direction, line.width(), available);
            self.emit_line(line, metrics.baseline(i), align, metrics);
        }

        if trailing && !truncated {
            let direction = lines.last().map_or(params.locale.direction, |l| l.direction);
            self.glyphs.push(Glyph {
                id: 0,
                x: params.alignment.align(direction, Fixed::ZERO, available),
                y: metrics.baseline(lines.len()),
                advance: Fixed::ZERO,
                ascent: metrics.ascent,
                descent: metrics.descent,
                runes: 0,
                flags: GlyphFlags::PARAGRAPH_START
                    | GlyphFlags::LINE_BREAK
                    | GlyphFlags::RUN_BREAK
                    | GlyphFlags::CLUSTER_BREAK,
            });
        }

        tracing::trace!(
            lines = lines.len(),
            glyphs = self.glyphs.len(),
            truncated,
            "monospace layout"
        );
        Ok(())
    }

    fn next_glyph(&mut self) -> Option<Glyph> {
        let glyph = self.glyphs.get(self.next).copied()?;
        self.next += 1;
        Some(glyph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Alignment;

    fn shape(params: &LayoutParams, text: &str) -> Vec<Glyph> {
        let mut shaper = MonospaceShaper::new();
        shaper.layout(params, &mut text.as_bytes()).unwrap();
        std::iter::from_fn(|| shaper.next_glyph()).collect()
    }

    fn params() -> LayoutParams {
        LayoutParams::default().with_px_per_em(Fixed::from_int(16))
    }

    #[test]
    fn test_empty_text_has_no_glyphs() {
        assert!(shape(&params(), "").is_empty());
    }

    #[test]
    fn test_ascii_line() {
        let glyphs = shape(&params(), "abc");
        assert_eq!(glyphs.len(), 3);
        let xs: Vec<i32> = glyphs.iter().map(|g| g.x.round()).collect();
        assert_eq!(xs, vec![0, 8, 16]);
        assert!(glyphs.iter().all(|g| g.flags.is_cluster_break() && g.runes == 1));
        assert!(glyphs[2].flags.is_line_break() && glyphs[2].flags.is_run_break());
        assert!(!glyphs[0].flags.is_paragraph_start());
        assert_eq!(glyphs[0].y, 13);
    }

    #[test]
    fn test_newline_is_paragraph_break() {
        let glyphs = shape(&params(), "a\nb");
        assert_eq!(glyphs.len(), 3);
        assert!(glyphs[1].flags.is_paragraph_break());
        assert!(glyphs[1].flags.is_line_break());
        assert_eq!(glyphs[1].advance, Fixed::ZERO);
        assert!(glyphs[2].flags.is_paragraph_start());
        assert_eq!(glyphs[2].y, glyphs[0].y + 16);
    }

    #[test]
    fn test_trailing_newline_synthesizes_start() {
        let glyphs = shape(&params(), "a\n");
        assert_eq!(glyphs.len(), 3);
        let last = glyphs[2];
        assert_eq!(last.runes, 0);
        assert!(last.flags.is_paragraph_start() && last.flags.is_line_break());
        assert_eq!(last.x, Fixed::ZERO);
    }

    #[test]
    fn test_rtl_run_progresses_toward_origin() {
        let glyphs = shape(&params(), "\u{627}\u{644}\u{62d}\u{628}");
        let xs: Vec<i32> = glyphs.iter().map(|g| g.x.round()).collect();
        assert_eq!(xs, vec![24, 16, 8, 0]);
        assert!(glyphs.iter().all(|g| g.flags.is_toward_origin()));
    }

    #[test]
    fn test_mixed_direction_runs() {
        // "ab" then two Hebrew letters: the RTL run sits to the right.
        let glyphs = shape(&params(), "ab \u{5d0}\u{5d1}");
        assert_eq!(glyphs.len(), 5);
        assert!(glyphs[2].flags.is_run_break());
        assert!(glyphs[3].flags.is_toward_origin());
        assert_eq!(glyphs[3].x.round(), 32);
        assert_eq!(glyphs[4].x.round(), 24);
        assert!(glyphs[4].flags.is_line_break());
    }

    #[test]
    fn test_wraps_after_whitespace() {
        let params = params().with_widths(0, 40);
        let glyphs = shape(&params, "abc defg");
        let breaks: Vec<usize> = glyphs
            .iter()
            .enumerate()
            .filter(|(_, g)| g.flags.is_line_break())
            .map(|(i, _)| i)
            .collect();
        // "abc " fits on the first line, "defg" wraps.
        assert_eq!(breaks, vec![3, 7]);
        assert_eq!(glyphs[4].x, Fixed::ZERO);
        assert!(!glyphs[4].flags.is_paragraph_start());
    }

    #[test]
    fn test_alignment_end() {
        let params = params().with_widths(80, 80).with_alignment(Alignment::End);
        let glyphs = shape(&params, "ab");
        assert_eq!(glyphs[0].x.round(), 64);
    }

    #[test]
    fn test_max_lines_truncates() {
        let params = params().with_max_lines(1);
        let glyphs = shape(&params, "ab\ncd\nef");
        let last = glyphs.last().unwrap();
        assert!(last.flags.is_truncator());
        // Newline, "cd", newline and "ef".
        assert_eq!(last.runes, 6);
        let runes: u32 = glyphs.iter().map(|g| g.runes).sum();
        assert_eq!(runes, 8);
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let mut shaper = MonospaceShaper::new();
        let bytes: &[u8] = &[b'a', 0xFF];
        let err = shaper.layout(&params(), &mut &bytes[..]).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidUtf8 { offset: 1 }));
    }
}
