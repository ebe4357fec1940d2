//! # clavis-core
//!
//! Stateful services behind the clavis keyboard: highlight and activation
//! state over a key arena, chord capture and playback, OSC in and out, MIDI
//! input, configuration, and the action dispatcher that ties them together.

pub mod action;
pub mod chords;
pub mod config;
pub mod dispatch;
pub mod keyboard;
pub mod listener;
pub mod midi;
pub mod state;
pub mod transport;

pub use action::{Action, DispatchResult};
pub use config::{Config, ConfigError};
pub use dispatch::{dispatch_action, DispatchError};
pub use state::AppState;
