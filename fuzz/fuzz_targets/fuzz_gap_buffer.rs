//! Fuzz target for gap buffer edits.
//!
//! Applies arbitrary edits at arbitrary offsets and checks the buffer
//! against a plain string after each one.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use glyphcaret::GapBuffer;

#[derive(Arbitrary, Debug)]
enum Edit {
    Caret(u16),
    Delete(i8),
    Insert(String),
    Replace { at: u16, runes: u8, text: String },
}

/// Byte offset of the `rune`th character, clamped to the end.
fn byte_at(s: &str, rune: usize) -> usize {
    s.char_indices().nth(rune).map_or(s.len(), |(i, _)| i)
}

fuzz_target!(|edits: Vec<Edit>| {
    let mut buf = GapBuffer::new();
    let mut model = String::new();
    let mut caret = 0usize;

    for edit in edits.iter().take(128) {
        let runes = model.chars().count();
        match edit {
            Edit::Caret(r) => {
                caret = byte_at(&model, usize::from(*r) % (runes + 1));
                buf.set_caret(caret);
            }
            Edit::Delete(n) => {
                let n = isize::from(*n);
                buf.delete_runes(n);
                let at = model[..caret].chars().count();
                if n < 0 {
                    let from = byte_at(&model, at.saturating_sub(n.unsigned_abs()));
                    model.replace_range(from..caret, "");
                    caret = from;
                } else {
                    let to = byte_at(&model, at + n.unsigned_abs());
                    model.replace_range(caret..to, "");
                }
            }
            Edit::Insert(s) => {
                buf.prepend(s);
                model.insert_str(caret, s);
            }
            Edit::Replace { at, runes: n, text } => {
                let from = byte_at(&model, usize::from(*at) % (runes + 1));
                let to = byte_at(&model, usize::from(*at) % (runes + 1) + usize::from(*n));
                buf.replace_runes(from, usize::from(*n), text);
                model.replace_range(from..to, text);
                caret = from;
            }
        }

        let gap = buf.gap();
        assert!(gap.start <= gap.end && gap.end <= buf.storage_len());
        assert_eq!(buf.to_string(), model);
        assert_eq!(buf.caret(), caret);
    }
});
