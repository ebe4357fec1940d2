//! Resolution of a scale onto the MIDI notes of a keyboard.

use crate::music::{Key, PitchClassSet};
use crate::note::MidiNote;

/// First note from which scale members are collected.
///
/// The key's tonic offset aligns the anchor; when the aligned note would fall
/// above the keyboard's first note the anchor moves up one more octave, so it
/// never lies below `starting_midi_note`.
fn scale_anchor(key: Key, starting_midi_note: MidiNote) -> MidiNote {
    let offset = key.tonic() as MidiNote;
    let lowest_possible = (starting_midi_note - offset).rem_euclid(12) + offset;
    if starting_midi_note >= lowest_possible {
        starting_midi_note
    } else {
        lowest_possible + 12
    }
}

/// All MIDI notes of `pitch_classes` on a keyboard of `keyboard_size` keys
/// starting at `starting_midi_note`, in ascending order.
pub fn resolve(
    key: Key,
    pitch_classes: &PitchClassSet,
    starting_midi_note: MidiNote,
    keyboard_size: u16,
) -> Vec<MidiNote> {
    if pitch_classes.is_empty() || keyboard_size == 0 {
        return Vec::new();
    }
    let last = starting_midi_note + keyboard_size as MidiNote - 1;
    (scale_anchor(key, starting_midi_note)..=last)
        .filter(|&n| pitch_classes.contains_note(n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::KeyboardSize;
    use crate::music::{BuiltinTheory, ScaleProvider, ScaleType};

    #[test]
    fn c_major_on_61_keys() {
        let set = BuiltinTheory.scale_notes("C", "MajorScale").unwrap();
        let notes = resolve(Key::C, &set, 36, 61);
        assert_eq!(notes.first(), Some(&36));
        assert_eq!(notes.last(), Some(&96));
        assert_eq!(notes.len(), 36);
        assert!(!notes.contains(&37));
    }

    #[test]
    fn empty_set_yields_nothing() {
        assert!(resolve(Key::D, &PitchClassSet::new(), 36, 61).is_empty());
    }

    #[test]
    fn results_stay_inside_every_keyboard() {
        for size in KeyboardSize::ALL {
            let start = size.starting_midi_note();
            let count = size.key_count();
            for key in Key::ALL {
                for scale in ScaleType::ALL {
                    let set = BuiltinTheory.scale_notes(key.name(), scale.name()).unwrap();
                    let notes = resolve(key, &set, start, count);
                    for n in &notes {
                        assert!(*n >= start && *n < start + count as MidiNote);
                        assert!(set.contains_note(*n));
                    }
                    assert!(notes.windows(2).all(|w| w[0] < w[1]));
                }
            }
        }
    }

    #[test]
    fn standard_boards_cover_whole_range() {
        // Every supported board starts high enough that the anchor is the first key.
        let set = BuiltinTheory.scale_notes("B", "ChromaticScale").unwrap();
        for size in KeyboardSize::ALL {
            let notes = resolve(Key::B, &set, size.starting_midi_note(), size.key_count());
            assert_eq!(notes.len(), size.key_count() as usize);
        }
    }

    #[test]
    fn anchor_rounds_up_an_octave_when_misaligned() {
        // start=5 with G (offset 7): aligned note is 17, which lies above the
        // start, so collection begins an octave later at 29.
        assert_eq!(scale_anchor(Key::G, 5), 29);
        let set = BuiltinTheory.scale_notes("G", "ChromaticScale").unwrap();
        let notes = resolve(Key::G, &set, 5, 30);
        assert_eq!(notes, vec![29, 30, 31, 32, 33, 34]);
    }
}
