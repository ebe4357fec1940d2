use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::note::{note_name, MidiNote};

/// Notes in arrival order. Order is significant: voice `i` of one chord is
/// paired with voice `i` of the next when morphing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chord(Vec<MidiNote>);

impl Chord {
    pub fn new(notes: Vec<MidiNote>) -> Self {
        Self(notes)
    }

    pub fn notes(&self) -> &[MidiNote] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, note: MidiNote) {
        self.0.push(note);
    }

    pub fn into_notes(self) -> Vec<MidiNote> {
        self.0
    }

    /// Space-separated note names, e.g. "C4 E4 G4".
    pub fn describe(&self) -> String {
        self.0.iter().map(|&n| note_name(n)).collect::<Vec<_>>().join(" ")
    }
}

impl From<Vec<MidiNote>> for Chord {
    fn from(notes: Vec<MidiNote>) -> Self {
        Self(notes)
    }
}

impl FromIterator<MidiNote> for Chord {
    fn from_iter<I: IntoIterator<Item = MidiNote>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Keep the first occurrence of every chord; later chords with the same
/// ordered notes are dropped.
pub fn filter_duplicate_chords(chords: &[Chord]) -> Vec<Chord> {
    let mut seen: HashSet<&[MidiNote]> = HashSet::new();
    let mut unique = Vec::new();
    for chord in chords {
        if seen.insert(chord.notes()) {
            unique.push(chord.clone());
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_keep_first_occurrence() {
        let chords = vec![
            Chord::from(vec![60, 64, 67]),
            Chord::from(vec![62, 65]),
            Chord::from(vec![60, 64, 67]),
            Chord::from(vec![64, 60, 67]),
        ];
        let filtered = filter_duplicate_chords(&chords);
        assert_eq!(
            filtered,
            vec![
                Chord::from(vec![60, 64, 67]),
                Chord::from(vec![62, 65]),
                Chord::from(vec![64, 60, 67]),
            ]
        );
    }

    #[test]
    fn describe_uses_note_names() {
        assert_eq!(Chord::from(vec![60, 64, 67]).describe(), "C4 E4 G4");
        assert_eq!(Chord::default().describe(), "");
    }
}
