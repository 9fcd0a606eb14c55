//! Gap buffer over UTF-8 bytes.
//!
//! The buffer keeps one unused region (the gap) at the site of the last
//! edit, so runs of insertions and deletions near a stable caret cost O(1)
//! each. Moving the caret far away costs one copy proportional to the
//! distance when the gap follows it.
//!
//! All offsets are logical byte offsets: the gap is invisible to callers.

use std::fmt;
use std::io::{self, Read, Write};
use std::ops::Range;

/// Minimum capacity of a freshly allocated gap, in bytes.
pub const MIN_SPACE: usize = 5;

/// Gap buffer holding valid UTF-8 text.
#[derive(Clone, Default)]
pub struct GapBuffer {
    text: Vec<u8>,
    /// Logical byte offset of the insertion point.
    caret: usize,
    gap_start: usize,
    gap_end: usize,
    changed: bool,
}

impl GapBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer holding `text`, with the caret at its start.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let mut buf = Self::new();
        buf.prepend(text);
        buf.changed = false;
        buf
    }

    /// Logical length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len() - self.gap_len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn gap_len(&self) -> usize {
        self.gap_end - self.gap_start
    }

    /// Physical bounds of the gap within the backing storage.
    #[must_use]
    pub const fn gap(&self) -> Range<usize> {
        self.gap_start..self.gap_end
    }

    /// Size of the backing storage, gap included.
    #[must_use]
    pub fn storage_len(&self) -> usize {
        self.text.len()
    }

    /// Logical byte offset of the caret.
    #[must_use]
    pub const fn caret(&self) -> usize {
        self.caret
    }

    /// Move the caret to a logical byte offset, clamped to the text.
    ///
    /// The offset must lie on a character boundary.
    pub fn set_caret(&mut self, offset: usize) {
        self.caret = offset.min(self.len());
    }

    /// Report whether the contents changed since the last call, and reset.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    /// The text before and after the gap.
    #[must_use]
    pub fn segments(&self) -> (&[u8], &[u8]) {
        (&self.text[..self.gap_start], &self.text[self.gap_end..])
    }

    /// Move the gap to the caret, guaranteeing at least `space` free bytes.
    ///
    /// When the gap is too small the storage is reallocated with room for
    /// `max(space, MIN_SPACE)` bytes of gap.
    pub fn move_gap(&mut self, space: usize) {
        let caret = self.caret;
        if self.gap_len() < space {
            let space = space.max(MIN_SPACE);
            let len = self.len();
            let mut text = vec![0u8; len + space];
            // Logical [0, caret) lands before the new gap, [caret, len) after it.
            let (pre, post) = self.segments();
            if caret <= pre.len() {
                text[..caret].copy_from_slice(&pre[..caret]);
                let tail = &mut text[caret + space..];
                tail[..pre.len() - caret].copy_from_slice(&pre[caret..]);
                tail[pre.len() - caret..].copy_from_slice(post);
            } else {
                let split = caret - pre.len();
                text[..pre.len()].copy_from_slice(pre);
                text[pre.len()..caret].copy_from_slice(&post[..split]);
                text[caret + space..].copy_from_slice(&post[split..]);
            }
            tracing::trace!(len, caret, capacity = text.len(), "gap buffer grown");
            self.text = text;
            self.gap_start = caret;
            self.gap_end = caret + space;
        } else if caret < self.gap_start {
            tracing::trace!(from = self.gap_start, to = caret, "gap moved back");
            let shift = self.gap_start - caret;
            self.text
                .copy_within(caret..self.gap_start, self.gap_end - shift);
            self.gap_start = caret;
            self.gap_end -= shift;
        } else if caret > self.gap_start {
            tracing::trace!(from = self.gap_start, to = caret, "gap moved forward");
            let shift = caret - self.gap_start;
            self.text
                .copy_within(self.gap_end..self.gap_end + shift, self.gap_start);
            self.gap_start += shift;
            self.gap_end += shift;
        }
    }

    /// Delete `runes` runes at the caret: backward when negative (the caret
    /// moves back over them), forward when positive.
    pub fn delete_runes(&mut self, runes: isize) {
        self.move_gap(0);
        let mut remaining = runes;
        while remaining < 0 && self.gap_start > 0 {
            let Some((_, size)) = decode_last_rune(&self.text[..self.gap_start]) else {
                break;
            };
            self.gap_start -= size;
            self.caret -= size;
            self.changed = true;
            remaining += 1;
        }
        while remaining > 0 && self.gap_end < self.text.len() {
            let Some((_, size)) = decode_rune(&self.text[self.gap_end..]) else {
                break;
            };
            self.gap_end += size;
            self.changed = true;
            remaining -= 1;
        }
    }

    /// Insert `s` at the caret. The caret stays before the inserted text.
    pub fn prepend(&mut self, s: &str) {
        self.move_gap(s.len());
        self.text[self.gap_start..self.gap_start + s.len()].copy_from_slice(s.as_bytes());
        self.gap_start += s.len();
        self.changed = self.changed || !s.is_empty();
    }

    /// Replace `rune_count` runes starting at `byte_offset` with `s`.
    pub fn replace_runes(&mut self, byte_offset: usize, rune_count: usize, s: &str) {
        self.set_caret(byte_offset);
        self.delete_runes(isize::try_from(rune_count).unwrap_or(isize::MAX));
        self.prepend(s);
    }

    /// Copy text starting at logical `offset` into `buf`.
    ///
    /// Returns the number of bytes copied; zero at or past the end.
    pub fn read_at(&self, offset: usize, buf: &mut [u8]) -> usize {
        if offset >= self.len() {
            return 0;
        }
        let (pre, post) = self.segments();
        let mut n = 0;
        if offset < pre.len() {
            let src = &pre[offset..];
            n = src.len().min(buf.len());
            buf[..n].copy_from_slice(&src[..n]);
        }
        let post_offset = offset.saturating_sub(pre.len());
        let src = &post[post_offset..];
        let m = src.len().min(buf.len() - n);
        buf[n..n + m].copy_from_slice(&src[..m]);
        n + m
    }

    /// The rune starting at logical byte `offset` and its encoded size.
    #[must_use]
    pub fn rune_at(&self, offset: usize) -> Option<(char, usize)> {
        if offset >= self.len() {
            return None;
        }
        let idx = if offset >= self.gap_start {
            offset + self.gap_len()
        } else {
            offset
        };
        let end = if idx < self.gap_start {
            self.gap_start
        } else {
            self.text.len()
        };
        decode_rune(&self.text[idx..end])
    }

    /// The rune ending at logical byte `offset` and its encoded size.
    #[must_use]
    pub fn rune_before(&self, offset: usize) -> Option<(char, usize)> {
        let offset = offset.min(self.len());
        if offset == 0 {
            return None;
        }
        if offset > self.gap_start {
            decode_last_rune(&self.text[self.gap_end..offset + self.gap_len()])
        } else {
            decode_last_rune(&self.text[..offset])
        }
    }

    /// Reader over the logical text starting at byte `offset`.
    #[must_use]
    pub const fn reader_at(&self, offset: usize) -> BufferReader<'_> {
        BufferReader { buf: self, pos: offset }
    }

    /// Write the logical text to `w`.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_to(&self, w: &mut dyn Write) -> io::Result<u64> {
        let (pre, post) = self.segments();
        w.write_all(pre)?;
        w.write_all(post)?;
        Ok((pre.len() + post.len()) as u64)
    }
}

impl fmt::Display for GapBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (pre, post) = self.segments();
        f.write_str(&String::from_utf8_lossy(pre))?;
        f.write_str(&String::from_utf8_lossy(post))
    }
}

impl fmt::Debug for GapBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (pre, post) = self.segments();
        f.debug_struct("GapBuffer")
            .field("pre", &String::from_utf8_lossy(pre))
            .field("gap", &self.gap_len())
            .field("post", &String::from_utf8_lossy(post))
            .field("caret", &self.caret)
            .finish()
    }
}

/// Sequential reader over a [`GapBuffer`].
#[derive(Clone, Copy, Debug)]
pub struct BufferReader<'a> {
    buf: &'a GapBuffer,
    pos: usize,
}

impl Read for BufferReader<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let n = self.buf.read_at(self.pos, out);
        self.pos += n;
        Ok(n)
    }
}

/// Encoded length of a UTF-8 sequence from its leading byte.
const fn utf8_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}

/// Decode the first rune of `bytes`.
pub(crate) fn decode_rune(bytes: &[u8]) -> Option<(char, usize)> {
    let size = utf8_len(*bytes.first()?).min(bytes.len());
    let c = std::str::from_utf8(&bytes[..size]).ok()?.chars().next()?;
    Some((c, size))
}

/// Decode the last rune of `bytes`.
pub(crate) fn decode_last_rune(bytes: &[u8]) -> Option<(char, usize)> {
    let start = bytes
        .iter()
        .rposition(|&b| (b & 0xC0) != 0x80)
        .unwrap_or(0);
    let c = std::str::from_utf8(&bytes[start..]).ok()?.chars().next()?;
    Some((c, bytes.len() - start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(buf: &GapBuffer) {
        let gap = buf.gap();
        assert!(gap.start <= gap.end && gap.end <= buf.storage_len());
        let (pre, post) = buf.segments();
        let mut all = pre.to_vec();
        all.extend_from_slice(post);
        assert!(std::str::from_utf8(&all).is_ok());
    }

    #[test]
    fn test_new_empty() {
        let buf = GapBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.to_string(), "");
        assert_eq!(buf.rune_at(0), None);
        assert_eq!(buf.rune_before(0), None);
    }

    #[test]
    fn test_prepend_keeps_caret() {
        let mut buf = GapBuffer::new();
        buf.prepend("world");
        assert_eq!(buf.caret(), 0);
        buf.prepend("hello ");
        assert_eq!(buf.to_string(), "hello world");
        assert!(buf.take_changed());
        assert!(!buf.take_changed());
        check(&buf);
    }

    #[test]
    fn test_grow_reserves_min_space() {
        let mut buf = GapBuffer::new();
        buf.prepend("ab");
        assert_eq!(buf.storage_len(), MIN_SPACE);
        assert_eq!(buf.gap().len(), MIN_SPACE - 2);
    }

    #[test]
    fn test_move_gap_both_ways() {
        let mut buf = GapBuffer::from_text("abcdef");
        buf.set_caret(4);
        buf.move_gap(0);
        assert_eq!(buf.gap().start, 4);
        assert_eq!(buf.to_string(), "abcdef");
        buf.set_caret(1);
        buf.move_gap(0);
        assert_eq!(buf.gap().start, 1);
        assert_eq!(buf.to_string(), "abcdef");
        check(&buf);
    }

    #[test]
    fn test_grow_with_caret_after_gap() {
        let mut buf = GapBuffer::from_text("abc");
        buf.set_caret(1);
        buf.prepend("X");
        buf.set_caret(3);
        buf.prepend("0123456789");
        assert_eq!(buf.to_string(), "aXb0123456789c");
        check(&buf);
    }

    #[test]
    fn test_grow_with_caret_before_gap() {
        let mut buf = GapBuffer::from_text("abc");
        buf.set_caret(3);
        buf.move_gap(0);
        buf.set_caret(1);
        buf.prepend("0123456789");
        assert_eq!(buf.to_string(), "a0123456789bc");
        check(&buf);
    }

    #[test]
    fn test_delete_runes_backward() {
        let mut buf = GapBuffer::from_text("h\u{e9}llo");
        buf.set_caret(3);
        buf.delete_runes(-2);
        assert_eq!(buf.to_string(), "llo");
        assert_eq!(buf.caret(), 0);
        // Deleting past the start stops there.
        buf.delete_runes(-5);
        assert_eq!(buf.to_string(), "llo");
    }

    #[test]
    fn test_delete_runes_forward() {
        let mut buf = GapBuffer::from_text("\u{e6}bc");
        buf.delete_runes(2);
        assert_eq!(buf.to_string(), "c");
        assert_eq!(buf.caret(), 0);
        buf.delete_runes(10);
        assert!(buf.is_empty());
        check(&buf);
    }

    #[test]
    fn test_replace_runes() {
        let mut buf = GapBuffer::from_text("hello world");
        buf.replace_runes(6, 5, "there");
        assert_eq!(buf.to_string(), "hello there");
        buf.replace_runes(0, 0, "\u{263a} ");
        assert_eq!(buf.to_string(), "\u{263a} hello there");
        check(&buf);
    }

    #[test]
    fn test_read_at_skips_gap() {
        let mut buf = GapBuffer::from_text("1234");
        buf.set_caret(2);
        buf.move_gap(0);
        let mut out = [0u8; 3];
        assert_eq!(buf.read_at(1, &mut out), 3);
        assert_eq!(&out, b"234");
        assert_eq!(buf.read_at(4, &mut out), 0);
        assert_eq!(buf.read_at(9, &mut out), 0);
        let mut none = [0u8; 0];
        assert_eq!(buf.read_at(0, &mut none), 0);
    }

    #[test]
    fn test_runes_around_gap() {
        let mut buf = GapBuffer::from_text("a\u{f8}\u{2022}");
        buf.set_caret(3);
        buf.move_gap(0);
        assert_eq!(buf.rune_at(1), Some(('\u{f8}', 2)));
        assert_eq!(buf.rune_at(3), Some(('\u{2022}', 3)));
        assert_eq!(buf.rune_before(3), Some(('\u{f8}', 2)));
        assert_eq!(buf.rune_before(6), Some(('\u{2022}', 3)));
        assert_eq!(buf.rune_at(6), None);
    }

    #[test]
    fn test_reader_and_write_to() {
        let mut buf = GapBuffer::from_text("abc");
        buf.set_caret(1);
        buf.prepend("-");
        let mut s = String::new();
        buf.reader_at(0).read_to_string(&mut s).unwrap();
        assert_eq!(s, "a-bc");
        let mut out = Vec::new();
        assert_eq!(buf.write_to(&mut out).unwrap(), 4);
        assert_eq!(out, b"a-bc");
    }
}
