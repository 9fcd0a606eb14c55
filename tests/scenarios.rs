//! End-to-end caret scenarios over the monospace shaper.
//!
//! Metrics at the default 16px em: cells are 8px wide, lines 16px tall,
//! and the first baseline sits at y = 13.

mod common;

use common::engine;
use glyphcaret::{CaretEngine, Editor, EditorOptions, Fixed, Point, SelectionAction};

// ============================================================================
// Caret placement
// ============================================================================

#[test]
fn empty_buffer_caret() {
    let mut e = CaretEngine::new();
    e.set_caret(0, 0);
    assert_eq!(e.selection(), (0, 0));
    assert_eq!(e.caret_pos(), (0, 0));
    assert_eq!(e.len(), 0);
    assert_eq!(e.num_lines(), 0);

    // Every movement is a no-op on an empty document.
    e.move_caret(1, 1);
    e.move_lines(1, SelectionAction::Clear);
    e.move_word(-1, SelectionAction::Clear);
    e.move_text_end(SelectionAction::Extend);
    assert_eq!(e.selection(), (0, 0));
}

#[test]
fn line_end_then_step_over_newline() {
    let mut e = engine("æbc\naøå•");
    e.move_line_end(SelectionAction::Clear);
    assert_eq!(e.selection(), (3, 3));
    e.move_caret(1, 1);

    let (start, _) = e.selection();
    assert_eq!(start, 4);
    assert_eq!(e.byte_offset(start), "æbc\n".len());
    assert_eq!(e.caret_pos(), (1, 0));
}

#[test]
fn delete_word_keeps_trailing_space() {
    let mut e = engine("hello world");
    e.set_caret(3, 3);
    e.delete_word(1);
    assert_eq!(e.text(), "hel world");
    assert_eq!(e.selection(), (3, 3));
}

#[test]
fn rtl_caret_advances_toward_origin() {
    let mut e = engine("\u{627}\u{644}\u{62d}\u{628}");
    let mut x = e.closest_to_rune(0).pixel_x;
    for expected in 1..=3 {
        e.move_caret(1, 1);
        let pos = e.closest_to_rune(e.selection().0);
        assert_eq!(pos.rune_offset, expected);
        assert!(pos.toward_origin);
        assert!(pos.pixel_x < x, "x must decrease at rune {expected}");
        x = pos.pixel_x;
    }
}

#[test]
fn selection_survives_reflow() {
    let text = "a123456789a\nb123456789b\nc123456789c\n";
    let mut e = engine(text);
    e.set_caret(0, 11);
    assert_eq!(e.selected_text(), "a123456789a");

    let endpoints = |e: &CaretEngine| {
        let (start, end) = e.selection();
        let a = e.closest_to_rune(start);
        let b = e.closest_to_rune(end);
        ((a.line, a.column), (b.line, b.column))
    };
    assert_eq!(endpoints(&e), ((0, 0), (0, 11)));

    // Five cells per line: "a1234" / "56789" / "a".
    e.set_constraints(0, 40);
    assert_eq!(e.selection(), (0, 11));
    assert_eq!(endpoints(&e), ((0, 0), (2, 1)));
    assert_eq!(e.num_lines(), 10);

    let line2 = e.closest_to_line_col(2, 0);
    assert_eq!(line2.rune_offset, 10);
    assert_eq!(line2.pixel_x, Fixed::ZERO);
}

// ============================================================================
// Tables
// ============================================================================

#[test]
fn move_word_table() {
    let cases: &[(&str, usize, isize, usize)] = &[
        ("hello world", 0, 1, 5),
        ("hello world", 5, 1, 11),
        ("hello world", 0, 2, 11),
        ("hello world", 11, -1, 6),
        ("hello world", 6, -1, 0),
        ("hello world", 11, -2, 0),
        ("hello world", 0, -1, 0),
        ("hello world", 11, 1, 11),
        ("æbc døå", 0, 1, 3),
        ("æbc døå", 7, -1, 4),
        ("one\ntwo", 0, 1, 3),
        ("one\ntwo", 3, 1, 7),
    ];
    for &(text, start, distance, want) in cases {
        let mut e = engine(text);
        e.set_caret(start, start);
        e.move_word(distance, SelectionAction::Clear);
        assert_eq!(
            e.selection(),
            (want, want),
            "move_word({distance}) from {start} in {text:?}"
        );
    }
}

#[test]
fn delete_word_table() {
    let cases: &[(&str, usize, isize, &str, usize)] = &[
        ("hello world", 0, 1, " world", 0),
        ("hello world", 5, 1, "hello", 5),
        ("hello world", 11, -1, "hello ", 6),
        ("hello world", 11, -2, "hello", 5),
        ("hello world", 6, -1, "world", 0),
        ("hello world", 0, -1, "hello world", 0),
        ("hello world", 11, 1, "hello world", 11),
        ("æbc døå", 7, -1, "æbc ", 4),
    ];
    for &(text, start, distance, want, caret) in cases {
        let mut e = engine(text);
        e.set_caret(start, start);
        e.delete_word(distance);
        assert_eq!(e.text(), want, "delete_word({distance}) from {start} in {text:?}");
        assert_eq!(e.selection(), (caret, caret));
    }
}

#[test]
fn insert_table() {
    let cases: &[(&str, (usize, usize), &str, &str, (usize, usize))] = &[
        ("", (0, 0), "abc", "abc", (3, 3)),
        ("ac", (1, 1), "b", "abc", (2, 2)),
        ("abXXef", (2, 4), "cd", "abcdef", (4, 4)),
        ("abXXef", (4, 2), "cd", "abcdef", (4, 4)),
        ("æø", (1, 1), "å\n", "æå\nø", (3, 3)),
    ];
    let mut ed = Editor::new();
    for &(text, (start, end), insert, want, caret) in cases {
        ed.set_text(text);
        ed.set_caret(start, end);
        ed.insert(insert);
        assert_eq!(ed.text(), want, "insert {insert:?} into {text:?}");
        assert_eq!(ed.selection(), caret);
    }
}

// ============================================================================
// Geometry
// ============================================================================

#[test]
fn pixel_queries_round_trip() {
    let e = engine("abc\ndef");
    let pos = e.closest_to_line_col(1, 2);
    assert_eq!(pos.rune_offset, 6);
    assert_eq!(pos.pixel_x, Fixed::from_int(16));
    assert_eq!(pos.pixel_y, 29);

    let back = e.closest_to_xy(pos.pixel_x, pos.pixel_y);
    assert_eq!(back.rune_offset, 6);
    // Past the end of a line snaps to its last position.
    assert_eq!(e.closest_to_xy(Fixed::from_int(500), 13).rune_offset, 3);
    // Below the text resolves to the last position.
    assert_eq!(e.closest_to_xy(Fixed::ZERO, 1000).rune_offset, 7);
}

#[test]
fn selection_regions_span_lines() {
    let mut e = engine("abc\ndef\nghi");
    e.set_view_size(Point::new(200, 100));
    e.set_caret(5, 1);
    let regions = e.selection_regions();
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].bounds.min.x, 8);
    assert_eq!(regions[1].bounds.min.x, 0);
    assert_eq!(regions[1].bounds.max.x, 8);
    assert!(regions[0].bounds.min.y < regions[1].bounds.min.y);
}

#[test]
fn masked_text_keeps_caret_positions() {
    let mut e = engine("pass\nword");
    let plain: Vec<_> = e.index().positions().to_vec();
    e.set_mask(Some('•'));
    assert_eq!(e.text(), "pass\nword");
    assert_eq!(e.num_lines(), 2);
    let masked: Vec<_> = e.index().positions().to_vec();
    assert_eq!(plain.len(), masked.len());
    for (p, m) in plain.iter().zip(&masked) {
        assert_eq!((p.rune_offset, p.line, p.column), (m.rune_offset, m.line, m.column));
    }
}

#[test]
fn max_lines_folds_into_truncator() {
    let mut e = engine("one\ntwo\nthree");
    e.set_max_lines(2);
    assert_eq!(e.num_lines(), 2);
    // The caret still reaches the runes behind the truncator.
    e.move_text_end(SelectionAction::Clear);
    assert_eq!(e.selection().0, e.len());
    assert_eq!(e.caret_pos().0, 1);
}

#[test]
fn single_line_scrolls_horizontally() {
    let mut ed = Editor::with_options(EditorOptions::default().with_single_line(true));
    ed.engine_mut().set_view_size(Point::new(40, 16));
    ed.insert("abcdefghij");
    ed.engine_mut().scroll_to_caret();
    let bounds = ed.engine().scroll_bounds();
    assert_eq!(bounds.max.x, 40);
    assert_eq!(bounds.max.y, 0);
    assert_eq!(ed.engine().scroll_off(), Point::new(40, 0));
    assert_eq!(ed.engine().caret_info().pos, Point::new(40, 13));
}
