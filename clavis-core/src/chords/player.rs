use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use clavis_types::{morph, Chord, MorphVector};

use crate::transport::{Transport, TransportResult};

/// Channel used for per-note playback messages.
pub const PLAYBACK_CHANNEL: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackOptions {
    /// Send whole chords as one `/chordOn` message.
    pub send_chord: bool,
    /// Follow each chord with `/morphNotes` bend values from the previous one.
    pub morph_chords: bool,
    /// Skip chords whose note sequence was already played.
    pub filter_duplicates: bool,
    /// Chords with fewer notes are dropped.
    pub min_notes: usize,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            send_chord: true,
            morph_chords: false,
            filter_duplicates: false,
            min_notes: 1,
        }
    }
}

/// What `ChordPlayer::play` put on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    /// One `/keyOnPlay` per note.
    Notes,
    /// A single `/chordOn`.
    Chord,
    /// `/morphNotes`, preceded by `/chordOn` when chord sending is on.
    Morphed(MorphVector),
    /// Morph requested but infeasible; no bend values were sent.
    HardChange,
    /// Morphing with nothing to morph from and chord sending off.
    Silent,
}

/// An ordered list of chords with a clamped position, used to step back and
/// forth through what has been played.
#[derive(Debug, Clone, Default)]
pub struct ChordCursor {
    chords: Vec<Chord>,
    position: Option<usize>,
}

impl ChordCursor {
    pub fn new(chords: Vec<Chord>) -> Self {
        Self {
            chords,
            position: None,
        }
    }

    /// Append and move the cursor onto the new chord.
    pub fn push_and_select(&mut self, chord: Chord) {
        self.chords.push(chord);
        self.position = Some(self.chords.len() - 1);
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Step forward, stopping at the last chord.
    pub fn forward(&mut self) -> Option<&Chord> {
        if self.chords.is_empty() {
            return None;
        }
        let last = self.chords.len() - 1;
        let next = match self.position {
            Some(p) => (p + 1).min(last),
            None => 0,
        };
        self.position = Some(next);
        self.chords.get(next)
    }

    /// Step back, stopping at the first chord.
    pub fn backward(&mut self) -> Option<&Chord> {
        if self.chords.is_empty() {
            return None;
        }
        let prev = self.position.map_or(0, |p| p.saturating_sub(1));
        self.position = Some(prev);
        self.chords.get(prev)
    }
}

pub type SharedPlayer = Arc<Mutex<ChordPlayer>>;

pub fn lock_player(player: &Mutex<ChordPlayer>) -> MutexGuard<'_, ChordPlayer> {
    player.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Turns completed chords into outbound messages.
pub struct ChordPlayer {
    transport: Arc<dyn Transport>,
    options: PlaybackOptions,
    previous: Option<Chord>,
    sounding: Option<Chord>,
    seen: HashSet<Chord>,
    cursor: ChordCursor,
}

impl ChordPlayer {
    pub fn new(transport: Arc<dyn Transport>, options: PlaybackOptions) -> Self {
        Self {
            transport,
            options,
            previous: None,
            sounding: None,
            seen: HashSet::new(),
            cursor: ChordCursor::default(),
        }
    }

    pub fn into_shared(self) -> SharedPlayer {
        Arc::new(Mutex::new(self))
    }

    pub fn options(&self) -> PlaybackOptions {
        self.options
    }

    pub fn options_mut(&mut self) -> &mut PlaybackOptions {
        &mut self.options
    }

    pub fn previous(&self) -> Option<&Chord> {
        self.previous.as_ref()
    }

    pub fn cursor(&self) -> &ChordCursor {
        &self.cursor
    }

    /// Accept a freshly completed chord: apply the filters, record it in the
    /// cursor and play it. Returns `None` when the chord was filtered out.
    pub fn ingest(&mut self, chord: Chord) -> TransportResult<Option<PlayOutcome>> {
        if chord.len() < self.options.min_notes {
            log::debug!(
                target: "chords",
                "dropping {:?}: fewer than {} notes",
                chord.notes(),
                self.options.min_notes
            );
            return Ok(None);
        }
        if self.options.filter_duplicates && self.seen.contains(&chord) {
            log::debug!(target: "chords", "dropping duplicate {:?}", chord.notes());
            return Ok(None);
        }
        if self.options.filter_duplicates {
            self.seen.insert(chord.clone());
        }
        self.cursor.push_and_select(chord.clone());
        self.play(&chord).map(Some)
    }

    pub fn play(&mut self, chord: &Chord) -> TransportResult<PlayOutcome> {
        let outcome = if self.options.morph_chords {
            match &self.previous {
                Some(prev) => {
                    let bends = morph(prev, chord);
                    if self.options.send_chord {
                        self.transport.send_chord_on(chord)?;
                    }
                    if bends.is_empty() {
                        log::debug!(
                            target: "chords",
                            "morph {:?} -> {:?} rejected, hard change",
                            prev.notes(),
                            chord.notes()
                        );
                        PlayOutcome::HardChange
                    } else {
                        self.transport.send_morph_notes(&bends)?;
                        PlayOutcome::Morphed(bends)
                    }
                }
                None if self.options.send_chord => {
                    self.transport.send_chord_on(chord)?;
                    PlayOutcome::Chord
                }
                None => PlayOutcome::Silent,
            }
        } else if self.options.send_chord {
            self.transport.send_chord_on(chord)?;
            PlayOutcome::Chord
        } else {
            for &note in chord.notes() {
                self.transport.send_key_on_play(PLAYBACK_CHANNEL, note)?;
            }
            PlayOutcome::Notes
        };
        self.previous = Some(chord.clone());
        self.sounding = Some(chord.clone());
        Ok(outcome)
    }

    /// Release the notes of the last played chord. Returns how many were released.
    pub fn stop_chord(&mut self) -> TransportResult<usize> {
        let Some(chord) = self.sounding.take() else {
            return Ok(0);
        };
        for &note in chord.notes() {
            self.transport.send_key_off_play(PLAYBACK_CHANNEL, note)?;
        }
        Ok(chord.len())
    }

    pub fn scrub_forward(&mut self) -> TransportResult<Option<PlayOutcome>> {
        match self.cursor.forward().cloned() {
            Some(chord) => self.play(&chord).map(Some),
            None => Ok(None),
        }
    }

    pub fn scrub_backward(&mut self) -> TransportResult<Option<PlayOutcome>> {
        match self.cursor.backward().cloned() {
            Some(chord) => self.play(&chord).map(Some),
            None => Ok(None),
        }
    }
}
