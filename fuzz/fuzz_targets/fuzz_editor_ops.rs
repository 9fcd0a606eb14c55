//! Fuzz target for editor operation sequences.
//!
//! Drives an editor with arbitrary keys, pointer events and layout changes,
//! then checks that every caret query stays inside the text and that
//! undoing everything restores the starting text.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use glyphcaret::{
    Alignment, Editor, EditorOptions, KeyCode, KeyEvent, KeyModifiers, Point, PointerEvent,
};

#[derive(Arbitrary, Debug)]
struct EditorInput {
    initial: String,
    single_line: bool,
    ops: Vec<Op>,
}

#[derive(Arbitrary, Debug)]
enum Op {
    Type(char),
    Key { code: u8, modifiers: u8 },
    Insert(String),
    Select(u16, u16),
    Press { x: i16, y: i16, clicks: u8 },
    Drag { x: i16, y: i16 },
    Scroll { dx: i16, dy: i16 },
    Width(u16),
    Align(u8),
    MaxLines(u8),
}

fn key_code(code: u8) -> KeyCode {
    match code % 13 {
        0 => KeyCode::Backspace,
        1 => KeyCode::Enter,
        2 => KeyCode::Left,
        3 => KeyCode::Right,
        4 => KeyCode::Up,
        5 => KeyCode::Down,
        6 => KeyCode::Home,
        7 => KeyCode::End,
        8 => KeyCode::PageUp,
        9 => KeyCode::PageDown,
        10 => KeyCode::Delete,
        11 => KeyCode::Char('z'),
        _ => KeyCode::Char('a'),
    }
}

fuzz_target!(|input: EditorInput| {
    let options = EditorOptions::default().with_single_line(input.single_line);
    let mut editor = Editor::with_options(options);
    editor.set_text(&input.initial);
    editor.engine_mut().set_view_size(Point::new(120, 48));
    let initial = editor.text();

    for op in input.ops.iter().take(64) {
        match *op {
            Op::Type(c) => {
                editor.handle_key(KeyEvent::char(c));
            }
            Op::Key { code, modifiers } => {
                let modifiers = KeyModifiers::from_bits_truncate(modifiers);
                editor.handle_key(KeyEvent::new(key_code(code), modifiers));
            }
            Op::Insert(ref s) => {
                editor.insert(s);
            }
            Op::Select(a, b) => editor.set_caret(usize::from(a), usize::from(b)),
            Op::Press { x, y, clicks } => {
                let event = PointerEvent::press(i32::from(x), i32::from(y)).with_clicks(clicks % 4);
                editor.handle_pointer(event);
            }
            Op::Drag { x, y } => {
                editor.handle_pointer(PointerEvent::drag(i32::from(x), i32::from(y)));
            }
            Op::Scroll { dx, dy } => {
                editor.handle_pointer(PointerEvent::scroll(i32::from(dx), i32::from(dy)));
            }
            Op::Width(w) => editor.engine_mut().set_constraints(0, i32::from(w)),
            Op::Align(a) => {
                let align = [Alignment::Start, Alignment::Middle, Alignment::End][usize::from(a % 3)];
                editor.engine_mut().set_alignment(align);
            }
            Op::MaxLines(n) => editor.engine_mut().set_max_lines(usize::from(n % 4)),
        }

        let len = editor.len();
        let (start, end) = editor.selection();
        assert!(start <= len && end <= len, "selection {start},{end} outside {len}");
        let (line, _) = editor.engine().caret_pos();
        assert!(line as usize <= editor.engine().num_lines());
        let _ = editor.engine().selection_regions();
        let _ = editor.engine().visible_glyphs();
        let _ = editor.events();
    }

    while editor.undo() {}
    assert_eq!(editor.text(), initial);
});
