use clavis_types::{Key, KeyboardError, KeyboardSize, TheoryError};
use thiserror::Error;

use crate::action::{Action, DispatchResult};
use crate::chords::{lock_player, PlayOutcome};
use crate::config::ConfigError;
use crate::keyboard::lock_highlight;
use crate::state::AppState;
use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Theory(#[from] TheoryError),
    #[error(transparent)]
    Keyboard(#[from] KeyboardError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_outcome(outcome: Option<PlayOutcome>) -> DispatchResult {
    match outcome {
        Some(PlayOutcome::Morphed(bends)) => {
            DispatchResult::with_status(format!("morph {:?}", bends.values()))
        }
        Some(PlayOutcome::HardChange) => DispatchResult::with_status("morph too wide, hard change"),
        Some(_) => DispatchResult::none(),
        None => DispatchResult::with_status("no chords"),
    }
}

/// Apply one action. Configuration errors (unknown key or scale, unsupported
/// keyboard size) are returned and leave the state as it was.
pub fn dispatch_action(action: &Action, state: &mut AppState) -> Result<DispatchResult, DispatchError> {
    match action {
        Action::SelectKey(name) => {
            let key = Key::from_name(name)?;
            let scale = state.scale_name.clone();
            let count = state.apply_selection(key, &scale)?;
            Ok(DispatchResult::with_status(format!("{} {}: {} keys", key, scale, count)))
        }
        Action::SelectScale(name) => {
            let count = state.apply_selection(state.key, name)?;
            Ok(DispatchResult::with_status(format!("{} {}: {} keys", state.key, name, count)))
        }
        Action::SetKeyboardSize(count) => {
            let size = KeyboardSize::from_key_count(*count)?;
            lock_highlight(&state.highlight).set_keyboard(size);
            let scale = state.scale_name.clone();
            state.apply_selection(state.key, &scale)?;
            Ok(DispatchResult::with_status(format!("{} keys", size.key_count())))
        }
        Action::KeyOn(note) => {
            lock_highlight(&state.highlight).activate(*note);
            if state.is_chord_listening() {
                state.aggregator.note_on(*note);
            }
            Ok(DispatchResult::none())
        }
        Action::KeyOff(note) => {
            lock_highlight(&state.highlight).deactivate(*note);
            Ok(DispatchResult::none())
        }
        Action::FlushChord => Ok(match state.aggregator.flush() {
            Some(chord) => DispatchResult::with_status(format!("chord {}", chord.describe())),
            None => DispatchResult::with_status("no pending notes"),
        }),
        Action::ScrubForward => {
            let outcome = lock_player(&state.player).scrub_forward()?;
            Ok(describe_outcome(outcome))
        }
        Action::ScrubBackward => {
            let outcome = lock_player(&state.player).scrub_backward()?;
            Ok(describe_outcome(outcome))
        }
        Action::StopChord => {
            lock_player(&state.player).stop_chord()?;
            Ok(DispatchResult::none())
        }
        Action::SetSendChord(on) => {
            lock_player(&state.player).options_mut().send_chord = *on;
            Ok(DispatchResult::none())
        }
        Action::SetMorph(on) => {
            lock_player(&state.player).options_mut().morph_chords = *on;
            Ok(DispatchResult::none())
        }
        Action::SetFilterDuplicates(on) => {
            lock_player(&state.player).options_mut().filter_duplicates = *on;
            Ok(DispatchResult::none())
        }
        Action::StartChordListener => {
            if state.is_chord_listening() {
                return Ok(DispatchResult::with_status("chord listener already running"));
            }
            state.start_chord_listener()?;
            Ok(DispatchResult::with_status(format!(
                "listening for chords on {}",
                state.chord_listen_addr
            )))
        }
        Action::StopChordListener => {
            if !state.is_chord_listening() {
                return Ok(DispatchResult::with_status("chord listener not running"));
            }
            let discarded = state.stop_chord_listener();
            let mut result = DispatchResult::with_status("chord listener stopped");
            if !discarded.is_empty() {
                result.push_status(format!("discarded partial chord {:?}", discarded));
            }
            Ok(result)
        }
    }
}
