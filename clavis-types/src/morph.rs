//! Chord-to-chord pitch-bend interpolation.

use crate::chord::Chord;
use crate::note::MidiNote;

/// Pitch-bend value for "no bend".
pub const BEND_CENTER: f64 = 8192.0;

/// Widest interval (in semitones) a single voice may bend across.
pub const MAX_MORPH_INTERVAL: i32 = 12;

/// Bend units per semitone: an octave spans half the 14-bit bend range.
const BEND_PER_SEMITONE: f64 = BEND_CENTER / MAX_MORPH_INTERVAL as f64;

/// One bend value per paired voice, in voice order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MorphVector(Vec<u16>);

impl MorphVector {
    pub fn values(&self) -> &[u16] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// An empty vector means the transition cannot be bent and the caller
    /// must fall back to a hard chord change.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn bend_for_interval(delta: i32) -> u16 {
    (BEND_CENTER + delta as f64 * BEND_PER_SEMITONE).round() as u16
}

/// Pad by repeating the last note until the chord has `len` voices.
fn padded(chord: &Chord, len: usize) -> Vec<MidiNote> {
    let mut notes = chord.notes().to_vec();
    if let Some(&last) = notes.last() {
        notes.resize(len, last);
    }
    notes
}

/// Bend values that carry each voice of `prev` onto the matching voice of
/// `curr`. Returns an empty vector when any voice moves more than an octave
/// or when either chord has no notes.
pub fn morph(prev: &Chord, curr: &Chord) -> MorphVector {
    if prev.is_empty() || curr.is_empty() {
        return MorphVector::default();
    }
    let voices = prev.len().max(curr.len());
    let from = padded(prev, voices);
    let to = padded(curr, voices);

    let mut bends = Vec::with_capacity(voices);
    for (p, c) in from.iter().zip(&to) {
        let delta = c - p;
        if delta.abs() > MAX_MORPH_INTERVAL {
            return MorphVector::default();
        }
        bends.push(bend_for_interval(delta));
    }
    MorphVector(bends)
}
