//! Chord capture and playback: timed grouping of note-ons into chords, the
//! consumer thread, and the player that turns chords into outbound messages.

mod aggregator;
mod debounce;
mod pipeline;
mod player;

pub use aggregator::{AggregatorState, ChordAggregator, DEFAULT_CHORD_WINDOW};
pub use pipeline::ChordPipeline;
pub use player::{
    lock_player, ChordCursor, ChordPlayer, PlayOutcome, PlaybackOptions, SharedPlayer,
    PLAYBACK_CHANNEL,
};
