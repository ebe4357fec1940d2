//! Outbound message transport.
//!
//! `Transport` captures what the application means to send (a chord, a set of
//! bend values, a note for playback) independently of how it reaches the
//! synthesiser. `OscTransport` sends OSC over UDP; `TestTransport` records
//! messages for assertions; `NullTransport` drops them.

mod osc;
mod test;

pub use osc::OscTransport;
pub use test::{NullTransport, SentMessage, TestTransport};

use clavis_types::{Chord, MidiNote, MorphVector};
use thiserror::Error;

pub const CHORD_ON_ADDR: &str = "/chordOn";
pub const MORPH_NOTES_ADDR: &str = "/morphNotes";
pub const KEY_ON_PLAY_ADDR: &str = "/keyOnPlay";
pub const KEY_OFF_PLAY_ADDR: &str = "/keyOffPlay";

/// Result type for transport operations.
pub type TransportResult<T = ()> = Result<T, TransportError>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode OSC packet: {0}")]
    Encode(String),
    #[error("no address found for {0}")]
    Unresolved(String),
}

pub trait Transport: Send + Sync {
    /// Send one message of integer arguments. Argument order is preserved on
    /// the wire.
    fn send_raw(&self, addr: &str, args: Vec<i32>) -> TransportResult;

    /// /chordOn midi...
    fn send_chord_on(&self, chord: &Chord) -> TransportResult {
        let args = chord.notes().to_vec();
        self.send_raw(CHORD_ON_ADDR, args)
    }

    /// /morphNotes bend... (one value per voice)
    fn send_morph_notes(&self, bends: &MorphVector) -> TransportResult {
        let args = bends.values().iter().map(|&b| i32::from(b)).collect();
        self.send_raw(MORPH_NOTES_ADDR, args)
    }

    /// /keyOnPlay channel midi
    fn send_key_on_play(&self, channel: i32, note: MidiNote) -> TransportResult {
        self.send_raw(KEY_ON_PLAY_ADDR, vec![channel, note])
    }

    /// /keyOffPlay channel midi
    fn send_key_off_play(&self, channel: i32, note: MidiNote) -> TransportResult {
        self.send_raw(KEY_OFF_PLAY_ADDR, vec![channel, note])
    }
}
