//! Visual keyboard model: an arena of key slots addressed by opaque handles,
//! the rendering-surface seam, and the highlight/activation state machine.

mod highlight;
mod surface;

pub use highlight::{lock_highlight, KeyHighlightState, SharedHighlight};
pub use surface::{KeySurface, NullSurface, RecordingSurface};

use clavis_types::{locate, KeyClass, KeyboardSize, MidiNote};

/// Semantic colour of a key. The surface decides what it looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyColor {
    White,
    Black,
    Highlight,
    Active,
}

impl KeyColor {
    pub fn default_for(class: KeyClass) -> Self {
        match class {
            KeyClass::White => KeyColor::White,
            KeyClass::Black => KeyColor::Black,
        }
    }
}

/// Opaque reference to one drawn key. Stable until the arena is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyHandle(u32);

impl KeyHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Description of a drawn key, handed to the surface when the layout changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInfo {
    pub handle: KeyHandle,
    pub midi_note: MidiNote,
    pub class: KeyClass,
}

#[derive(Debug, Clone)]
struct KeySlot {
    info: KeyInfo,
    color: KeyColor,
}

/// Every key of a keyboard, in MIDI order, with per-class lookup tables
/// indexed by `locate()` position.
///
/// The tables may start with empty entries: positions are counted from the
/// start of the keyboard's first octave, which can lie below its first key.
#[derive(Debug, Clone)]
pub struct KeyArena {
    size: KeyboardSize,
    slots: Vec<KeySlot>,
    white: Vec<Option<KeyHandle>>,
    black: Vec<Option<KeyHandle>>,
}

impl KeyArena {
    pub fn new(size: KeyboardSize) -> Self {
        let start = size.starting_midi_note();
        let mut arena = Self {
            size,
            slots: Vec::with_capacity(size.key_count() as usize),
            white: Vec::new(),
            black: Vec::new(),
        };
        for note in size.range().notes() {
            let handle = KeyHandle(arena.slots.len() as u32);
            let pos = locate(note, start);
            let table = match pos.class {
                KeyClass::White => &mut arena.white,
                KeyClass::Black => &mut arena.black,
            };
            if let Some(slot) = pos.slot() {
                if table.len() <= slot {
                    table.resize(slot + 1, None);
                }
                table[slot] = Some(handle);
            }
            arena.slots.push(KeySlot {
                info: KeyInfo {
                    handle,
                    midi_note: note,
                    class: pos.class,
                },
                color: KeyColor::default_for(pos.class),
            });
        }
        arena
    }

    pub fn size(&self) -> KeyboardSize {
        self.size
    }

    pub fn starting_midi_note(&self) -> MidiNote {
        self.size.starting_midi_note()
    }

    /// Handle of the key drawn for `note`, or `None` when the note is not on
    /// this keyboard.
    pub fn resolve(&self, note: MidiNote) -> Option<KeyHandle> {
        let pos = locate(note, self.starting_midi_note());
        let table = match pos.class {
            KeyClass::White => &self.white,
            KeyClass::Black => &self.black,
        };
        pos.slot().and_then(|i| table.get(i).copied().flatten())
    }

    pub fn info(&self, handle: KeyHandle) -> Option<KeyInfo> {
        self.slots.get(handle.index()).map(|s| s.info)
    }

    pub fn color(&self, handle: KeyHandle) -> Option<KeyColor> {
        self.slots.get(handle.index()).map(|s| s.color)
    }

    fn set_color(&mut self, handle: KeyHandle, color: KeyColor) {
        if let Some(slot) = self.slots.get_mut(handle.index()) {
            slot.color = color;
        }
    }

    pub fn keys(&self) -> Vec<KeyInfo> {
        self.slots.iter().map(|s| s.info).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
