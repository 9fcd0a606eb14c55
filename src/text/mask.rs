//! Masking reader for password fields.

use std::io::{self, Read};

/// Reader that replaces every rune of the underlying text, except `\n`,
/// with a mask rune.
///
/// Line structure survives masking, so the shaped layout has the same lines
/// and rune offsets as the unmasked text.
#[derive(Debug)]
pub struct MaskReader<R> {
    inner: R,
    mask: [u8; 4],
    mask_len: usize,
    /// Undecoded input carried over from the last fill.
    pending: Vec<u8>,
    /// Mask bytes that did not fit the caller's buffer.
    overflow: Vec<u8>,
    eof: bool,
}

impl<R: Read> MaskReader<R> {
    pub fn new(inner: R, mask: char) -> Self {
        let mut buf = [0u8; 4];
        let mask_len = mask.encode_utf8(&mut buf).len();
        Self {
            inner,
            mask: buf,
            mask_len,
            pending: Vec::new(),
            overflow: Vec::new(),
            eof: false,
        }
    }

    /// Unwrap the underlying reader, discarding buffered state.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; 256];
        let n = self.inner.read(&mut chunk)?;
        if n == 0 {
            self.eof = true;
        }
        self.pending.extend_from_slice(&chunk[..n]);
        Ok(())
    }

    /// Byte length of the next complete rune in `pending`, if any.
    fn next_rune_len(&self) -> Option<usize> {
        let lead = *self.pending.first()?;
        let size = match lead {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            // Stray continuation or invalid byte: one masked rune.
            _ => 1,
        };
        if size <= self.pending.len() {
            let valid = std::str::from_utf8(&self.pending[..size]).is_ok();
            Some(if valid { size } else { 1 })
        } else if self.eof {
            Some(1)
        } else {
            None
        }
    }
}

impl<R: Read> Read for MaskReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let mut n = 0;
        if !self.overflow.is_empty() {
            n = self.overflow.len().min(out.len());
            out[..n].copy_from_slice(&self.overflow[..n]);
            self.overflow.drain(..n);
        }
        while n < out.len() {
            let Some(size) = self.next_rune_len() else {
                if self.eof {
                    break;
                }
                self.fill()?;
                continue;
            };
            let replacement: &[u8] = if self.pending[0] == b'\n' {
                b"\n"
            } else {
                &self.mask[..self.mask_len]
            };
            let fits = replacement.len().min(out.len() - n);
            out[n..n + fits].copy_from_slice(&replacement[..fits]);
            self.overflow.extend_from_slice(&replacement[fits..]);
            n += fits;
            self.pending.drain(..size);
            if !self.overflow.is_empty() {
                break;
            }
        }
        Ok(n)
    }
}
