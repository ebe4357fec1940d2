use std::sync::Arc;

use clavis_types::{resolve, BuiltinTheory, Key, KeyboardSize, MidiNote, ScaleProvider};

use crate::chords::{ChordAggregator, ChordPipeline, ChordPlayer, SharedPlayer};
use crate::config::Config;
use crate::dispatch::DispatchError;
use crate::keyboard::{lock_highlight, KeyHighlightState, KeySurface, SharedHighlight};
use crate::listener::{EventSink, FanOut, OscListener};
use crate::transport::Transport;

/// The running chord listener: its socket thread and the consumer thread.
pub struct ChordListening {
    pub listener: OscListener,
    pub pipeline: ChordPipeline,
}

/// Everything the dispatcher mutates. Owned by the composition root; the
/// shared pieces are also handed to listener threads.
pub struct AppState {
    pub key: Key,
    pub scale_name: String,
    pub highlight: SharedHighlight,
    pub aggregator: Arc<ChordAggregator>,
    pub player: SharedPlayer,
    pub theory: Arc<dyn ScaleProvider>,
    pub chord_listen_addr: String,
    pub chord_listening: Option<ChordListening>,
}

impl AppState {
    /// Build state from configuration and apply the configured key and scale.
    pub fn new(
        config: &Config,
        surface: Box<dyn KeySurface>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, DispatchError> {
        Self::with_theory(config, surface, transport, Arc::new(BuiltinTheory))
    }

    pub fn with_theory(
        config: &Config,
        surface: Box<dyn KeySurface>,
        transport: Arc<dyn Transport>,
        theory: Arc<dyn ScaleProvider>,
    ) -> Result<Self, DispatchError> {
        let size = config.keyboard_size()?;
        let key = config.key()?;
        let highlight = KeyHighlightState::new(size, surface).into_shared();
        let aggregator = Arc::new(ChordAggregator::new(config.chord_window())?);
        let player = ChordPlayer::new(transport, config.playback_options()).into_shared();

        let mut state = Self {
            key,
            scale_name: config.scale_name().to_string(),
            highlight,
            aggregator,
            player,
            theory,
            chord_listen_addr: config.chord_listen_addr().to_string(),
            chord_listening: None,
        };
        let scale_name = state.scale_name.clone();
        state.apply_selection(key, &scale_name)?;
        Ok(state)
    }

    pub fn keyboard_size(&self) -> KeyboardSize {
        lock_highlight(&self.highlight).keyboard_size()
    }

    pub fn is_chord_listening(&self) -> bool {
        self.chord_listening.is_some()
    }

    /// Highlight `scale_name` in `key` across the whole keyboard.
    ///
    /// The scale is looked up first, so an unknown name leaves the current
    /// selection untouched.
    pub fn apply_selection(&mut self, key: Key, scale_name: &str) -> Result<usize, DispatchError> {
        let pitch_classes = self.theory.scale_notes(key.name(), scale_name)?;
        let count = {
            let mut highlight = lock_highlight(&self.highlight);
            let range = highlight.keyboard_size().range();
            let notes = resolve(
                key,
                &pitch_classes,
                range.starting_midi_note,
                range.size,
            );
            highlight.reset_all();
            let count = notes.len();
            highlight.set_scale(notes);
            count
        };
        self.key = key;
        self.scale_name = scale_name.to_string();
        log::info!(
            target: "keyboard",
            "selected {} {} ({} keys)",
            key.name(),
            scale_name,
            count
        );
        Ok(count)
    }

    pub fn start_chord_listener(&mut self) -> Result<(), DispatchError> {
        if self.chord_listening.is_some() {
            return Ok(());
        }
        let aggregator: Arc<dyn EventSink> = self.aggregator.clone();
        let display: Arc<dyn EventSink> = self.highlight.clone();
        let sink = Arc::new(FanOut::new().with(aggregator).with(display));
        let listener = OscListener::bind(&self.chord_listen_addr, sink)?;
        let pipeline = ChordPipeline::spawn(self.aggregator.clone(), self.player.clone())?;
        self.chord_listening = Some(ChordListening { listener, pipeline });
        Ok(())
    }

    /// Stop the listener, drop any partial chord and stop the consumer.
    /// Returns the discarded notes.
    pub fn stop_chord_listener(&mut self) -> Vec<MidiNote> {
        let Some(mut listening) = self.chord_listening.take() else {
            return Vec::new();
        };
        listening.listener.stop();
        let discarded = self.aggregator.cancel();
        listening.pipeline.stop();
        discarded
    }
}
