//! # clavis-types
//!
//! Pure data types and algorithms shared by the clavis crates: MIDI note
//! classification, visual key addressing, keyboard geometry, key and scale
//! names, scale-to-keyboard resolution, chords and chord morphing.
//!
//! Nothing in this crate performs I/O or holds shared state.

pub mod chord;
pub mod keyboard;
pub mod morph;
pub mod music;
pub mod note;
pub mod scale_range;

pub use chord::{filter_duplicate_chords, Chord};
pub use keyboard::{KeyboardError, KeyboardRange, KeyboardSize};
pub use morph::{morph, MorphVector, BEND_CENTER, MAX_MORPH_INTERVAL};
pub use music::{BuiltinTheory, Key, PitchClassSet, ScaleProvider, ScaleType, TheoryError};
pub use note::{locate, note_name, KeyClass, KeyPosition, MidiNote};
pub use scale_range::resolve;
