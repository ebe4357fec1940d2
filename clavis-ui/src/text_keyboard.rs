use std::sync::{Arc, Mutex, PoisonError};

use clavis_core::keyboard::{KeyColor, KeyHandle, KeyInfo, KeySurface};
use clavis_types::{note_name, KeyClass};

#[derive(Default)]
struct Board {
    keys: Vec<KeyInfo>,
    colors: Vec<KeyColor>,
}

/// Keyboard drawn as two text rows, one column per key: black keys on top,
/// white keys below.
///
/// Cloning yields another handle to the same board, so the surface can be
/// boxed into the highlight state while the command loop keeps a handle to
/// render it.
#[derive(Clone, Default)]
pub struct TextKeyboard {
    board: Arc<Mutex<Board>>,
}

fn glyph(color: KeyColor) -> char {
    match color {
        KeyColor::White => '_',
        KeyColor::Black => '|',
        KeyColor::Highlight => 'o',
        KeyColor::Active => '#',
    }
}

impl TextKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&self) -> String {
        let board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        let (Some(first), Some(last)) = (board.keys.first(), board.keys.last()) else {
            return String::new();
        };
        let mut top = String::with_capacity(board.keys.len());
        let mut bottom = String::with_capacity(board.keys.len());
        for (info, &color) in board.keys.iter().zip(&board.colors) {
            match info.class {
                KeyClass::Black => {
                    top.push(glyph(color));
                    bottom.push(' ');
                }
                KeyClass::White => {
                    top.push(' ');
                    bottom.push(glyph(color));
                }
            }
        }
        format!(
            "{}..{}\n{}\n{}",
            note_name(first.midi_note),
            note_name(last.midi_note),
            top.trim_end(),
            bottom
        )
    }
}

impl KeySurface for TextKeyboard {
    fn layout(&mut self, keys: &[KeyInfo]) {
        let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        board.keys = keys.to_vec();
        board.colors = keys.iter().map(|k| KeyColor::default_for(k.class)).collect();
    }

    fn paint(&mut self, handle: KeyHandle, color: KeyColor) {
        let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = board.colors.get_mut(handle.index()) {
            *slot = color;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clavis_core::keyboard::KeyHighlightState;
    use clavis_types::KeyboardSize;

    #[test]
    fn renders_one_column_per_key() {
        let text = TextKeyboard::new();
        let _state = KeyHighlightState::new(KeyboardSize::Keys61, Box::new(text.clone()));
        let out = text.render();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "C2..C7");
        assert_eq!(lines[2].len(), 61);
        assert_eq!(lines[2].chars().filter(|&c| c == '_').count(), 36);
        assert_eq!(lines[1].chars().filter(|&c| c == '|').count(), 25);
    }

    #[test]
    fn shows_highlight_and_active_keys() {
        let text = TextKeyboard::new();
        let mut state = KeyHighlightState::new(KeyboardSize::Keys61, Box::new(text.clone()));
        state.set_scale([36, 38]);
        state.activate(37);
        let out = text.render();
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[2].starts_with("o o"));
        assert!(lines[1].starts_with(" #"));
    }
}
