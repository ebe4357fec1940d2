use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::note::{KeyClass, MidiNote};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyboardError {
    #[error("unsupported keyboard size {0}: only 61, 76 and 88 keys are supported")]
    UnsupportedSize(u16),
}

/// Physical keyboard sizes that can be displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyboardSize {
    #[default]
    Keys61,
    Keys76,
    Keys88,
}

impl KeyboardSize {
    pub const ALL: [KeyboardSize; 3] = [
        KeyboardSize::Keys61,
        KeyboardSize::Keys76,
        KeyboardSize::Keys88,
    ];

    pub fn from_key_count(count: u16) -> Result<Self, KeyboardError> {
        match count {
            61 => Ok(KeyboardSize::Keys61),
            76 => Ok(KeyboardSize::Keys76),
            88 => Ok(KeyboardSize::Keys88),
            other => Err(KeyboardError::UnsupportedSize(other)),
        }
    }

    pub fn key_count(&self) -> u16 {
        match self {
            KeyboardSize::Keys61 => 61,
            KeyboardSize::Keys76 => 76,
            KeyboardSize::Keys88 => 88,
        }
    }

    /// Lowest MIDI note: C2 for 61 keys, E1 for 76, A0 for 88.
    pub fn starting_midi_note(&self) -> MidiNote {
        match self {
            KeyboardSize::Keys61 => 36,
            KeyboardSize::Keys76 => 28,
            KeyboardSize::Keys88 => 21,
        }
    }

    pub fn white_key_count(&self) -> usize {
        match self {
            KeyboardSize::Keys61 => 36,
            KeyboardSize::Keys76 => 45,
            KeyboardSize::Keys88 => 52,
        }
    }

    pub fn black_key_count(&self) -> usize {
        match self {
            KeyboardSize::Keys61 => 25,
            KeyboardSize::Keys76 => 31,
            KeyboardSize::Keys88 => 36,
        }
    }

    pub fn range(&self) -> KeyboardRange {
        KeyboardRange::new(self.starting_midi_note(), self.key_count())
    }
}

impl TryFrom<u16> for KeyboardSize {
    type Error = KeyboardError;

    fn try_from(count: u16) -> Result<Self, Self::Error> {
        Self::from_key_count(count)
    }
}

/// A contiguous run of addressable MIDI notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardRange {
    pub starting_midi_note: MidiNote,
    pub size: u16,
}

impl KeyboardRange {
    pub fn new(starting_midi_note: MidiNote, size: u16) -> Self {
        Self {
            starting_midi_note,
            size,
        }
    }

    /// Highest addressable note, inclusive.
    pub fn last_midi_note(&self) -> MidiNote {
        self.starting_midi_note + self.size as MidiNote - 1
    }

    pub fn contains(&self, note: MidiNote) -> bool {
        note >= self.starting_midi_note && note <= self.last_midi_note()
    }

    pub fn notes(&self) -> impl Iterator<Item = MidiNote> {
        self.starting_midi_note..=self.last_midi_note()
    }

    pub fn count_of(&self, class: KeyClass) -> usize {
        self.notes().filter(|&n| KeyClass::of(n) == class).count()
    }
}
