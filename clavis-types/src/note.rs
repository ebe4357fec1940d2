use serde::{Deserialize, Serialize};

/// A MIDI note number. Conceptually 0-127, but key arithmetic is total over
/// all integers so notes below or above a keyboard never need special cases.
pub type MidiNote = i32;

/// Pitch-class remainders of the white keys, in ascending order.
const WHITE_REMAINDERS: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Pitch-class remainders of the black keys, in ascending order.
const BLACK_REMAINDERS: [i32; 5] = [1, 3, 6, 8, 10];

/// Colour class of a piano key, derived from the note's pitch class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyClass {
    White,
    Black,
}

impl KeyClass {
    pub fn of(note: MidiNote) -> Self {
        if BLACK_REMAINDERS.contains(&note.rem_euclid(12)) {
            KeyClass::Black
        } else {
            KeyClass::White
        }
    }

    /// Number of keys of this class in one octave (7 white, 5 black).
    pub fn per_octave(&self) -> i32 {
        self.remainders().len() as i32
    }

    fn remainders(&self) -> &'static [i32] {
        match self {
            KeyClass::White => &WHITE_REMAINDERS,
            KeyClass::Black => &BLACK_REMAINDERS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KeyClass::White => "white",
            KeyClass::Black => "black",
        }
    }
}

/// Address of a visual key: its ordinal among keys of the same class,
/// counted from the octave containing the keyboard's starting note.
///
/// A negative index means the note lies below the first octave of the
/// keyboard and cannot be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPosition {
    pub index: i32,
    pub class: KeyClass,
}

impl KeyPosition {
    /// The index as a usable slot number, or `None` when it is negative.
    pub fn slot(&self) -> Option<usize> {
        usize::try_from(self.index).ok()
    }
}

/// Map a MIDI note to its visual key position on a keyboard whose lowest
/// note is `starting_midi_note`.
pub fn locate(midi_note: MidiNote, starting_midi_note: MidiNote) -> KeyPosition {
    let class = KeyClass::of(midi_note);
    let remainder = midi_note.rem_euclid(12);
    let in_octave = class
        .remainders()
        .iter()
        .position(|&r| r == remainder)
        .unwrap_or(0) as i32;
    let complete_octaves = midi_note.div_euclid(12) - starting_midi_note.div_euclid(12);
    KeyPosition {
        index: complete_octaves * class.per_octave() + in_octave,
        class,
    }
}

/// Human-readable note name, e.g. 60 -> "C4".
pub fn note_name(note: MidiNote) -> String {
    const NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    let octave = note.div_euclid(12) - 1;
    format!("{}{}", NAMES[note.rem_euclid(12) as usize], octave)
}
