use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::note::MidiNote;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TheoryError {
    #[error("scale type '{0}' is not recognized")]
    UnknownScale(String),
    #[error("key '{0}' is not recognized")]
    UnknownKey(String),
}

/// Musical key as offered by the key selector, spelled the way it is named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    #[default]
    C,
    G,
    D,
    A,
    E,
    B,
    FSharp,
    GFlat,
    DFlat,
    AFlat,
    EFlat,
    BFlat,
    F,
    CSharp,
}

impl Key {
    pub const ALL: [Key; 14] = [
        Key::C,
        Key::G,
        Key::D,
        Key::A,
        Key::E,
        Key::B,
        Key::FSharp,
        Key::GFlat,
        Key::DFlat,
        Key::AFlat,
        Key::EFlat,
        Key::BFlat,
        Key::F,
        Key::CSharp,
    ];

    /// Keys in circle-of-fifths order, clockwise from C.
    pub const CIRCLE_OF_FIFTHS: [Key; 12] = [
        Key::C,
        Key::G,
        Key::D,
        Key::A,
        Key::E,
        Key::B,
        Key::FSharp,
        Key::CSharp,
        Key::AFlat,
        Key::EFlat,
        Key::BFlat,
        Key::F,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Key::C => "C",
            Key::G => "G",
            Key::D => "D",
            Key::A => "A",
            Key::E => "E",
            Key::B => "B",
            Key::FSharp => "F#",
            Key::GFlat => "Gb",
            Key::DFlat => "Db",
            Key::AFlat => "Ab",
            Key::EFlat => "Eb",
            Key::BFlat => "Bb",
            Key::F => "F",
            Key::CSharp => "C#",
        }
    }

    /// Pitch class of the tonic (the key signature offset).
    pub fn tonic(&self) -> u8 {
        match self {
            Key::C => 0,
            Key::CSharp | Key::DFlat => 1,
            Key::D => 2,
            Key::EFlat => 3,
            Key::E => 4,
            Key::F => 5,
            Key::FSharp | Key::GFlat => 6,
            Key::G => 7,
            Key::AFlat => 8,
            Key::A => 9,
            Key::BFlat => 10,
            Key::B => 11,
        }
    }

    pub fn from_name(name: &str) -> Result<Key, TheoryError> {
        Key::ALL
            .iter()
            .copied()
            .find(|k| k.name() == name.trim())
            .ok_or_else(|| TheoryError::UnknownKey(name.to_string()))
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Scale definition as intervals from the tonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleType {
    Major,
    Minor,
    Dorian,
    HarmonicMinor,
    Lydian,
    Octatonic,
    RagMarwa,
    MelodicMinor,
    Chromatic,
    Mixolydian,
    Phrygian,
    WholeTone,
}

impl ScaleType {
    pub const ALL: [ScaleType; 12] = [
        ScaleType::Major,
        ScaleType::Minor,
        ScaleType::Dorian,
        ScaleType::HarmonicMinor,
        ScaleType::Lydian,
        ScaleType::Octatonic,
        ScaleType::RagMarwa,
        ScaleType::MelodicMinor,
        ScaleType::Chromatic,
        ScaleType::Mixolydian,
        ScaleType::Phrygian,
        ScaleType::WholeTone,
    ];

    /// Selector name, e.g. "MajorScale".
    pub fn name(&self) -> &'static str {
        match self {
            ScaleType::Major => "MajorScale",
            ScaleType::Minor => "MinorScale",
            ScaleType::Dorian => "DorianScale",
            ScaleType::HarmonicMinor => "HarmonicMinorScale",
            ScaleType::Lydian => "LydianScale",
            ScaleType::Octatonic => "OctatonicScale",
            ScaleType::RagMarwa => "RagMarwa",
            ScaleType::MelodicMinor => "MelodicMinorScale",
            ScaleType::Chromatic => "ChromaticScale",
            ScaleType::Mixolydian => "MixolydianScale",
            ScaleType::Phrygian => "PhrygianScale",
            ScaleType::WholeTone => "WholeToneScale",
        }
    }

    /// Semitone intervals from the tonic (ascending form).
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            ScaleType::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleType::Minor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleType::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleType::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            ScaleType::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            ScaleType::Octatonic => &[0, 2, 3, 5, 6, 8, 9, 11],
            ScaleType::RagMarwa => &[0, 1, 4, 6, 9, 11],
            ScaleType::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            ScaleType::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            ScaleType::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            ScaleType::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            ScaleType::WholeTone => &[0, 2, 4, 6, 8, 10],
        }
    }

    pub fn from_name(name: &str) -> Result<ScaleType, TheoryError> {
        ScaleType::ALL
            .iter()
            .copied()
            .find(|s| s.name() == name.trim())
            .ok_or_else(|| TheoryError::UnknownScale(name.to_string()))
    }
}

/// Set of pitch classes (0-11) stored as a bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PitchClassSet(u16);

impl PitchClassSet {
    pub fn new() -> Self {
        Self(0)
    }

    /// Insert a pitch class; values outside 0-11 are reduced modulo 12.
    pub fn insert(&mut self, pitch_class: u8) {
        self.0 |= 1 << (pitch_class % 12);
    }

    pub fn contains(&self, pitch_class: u8) -> bool {
        pitch_class < 12 && self.0 & (1 << pitch_class) != 0
    }

    /// Whether the note's pitch class is a member.
    pub fn contains_note(&self, note: MidiNote) -> bool {
        self.contains(note.rem_euclid(12) as u8)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..12u8).filter(move |&pc| self.contains(pc))
    }

    /// Intervals transposed onto a tonic.
    pub fn from_intervals(tonic: u8, intervals: &[u8]) -> Self {
        intervals.iter().map(|&i| (tonic + i) % 12).collect()
    }
}

impl FromIterator<u8> for PitchClassSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = PitchClassSet::new();
        for pc in iter {
            set.insert(pc);
        }
        set
    }
}

/// Resolves a key and scale name to the pitch classes of that scale.
///
/// Unknown scale names are configuration errors and must be returned to the
/// caller rather than defaulted.
pub trait ScaleProvider: Send + Sync {
    fn scale_notes(&self, key_name: &str, scale_name: &str) -> Result<PitchClassSet, TheoryError>;
}

/// Scale provider backed by the built-in `ScaleType` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTheory;

impl ScaleProvider for BuiltinTheory {
    fn scale_notes(&self, key_name: &str, scale_name: &str) -> Result<PitchClassSet, TheoryError> {
        let scale = ScaleType::from_name(scale_name)?;
        let key = Key::from_name(key_name)?;
        Ok(PitchClassSet::from_intervals(key.tonic(), scale.intervals()))
    }
}
