use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use clavis_types::{Chord, MidiNote};

use super::debounce::Debouncer;

/// Default quiescence window: a chord is complete after one second without
/// a new note.
pub const DEFAULT_CHORD_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    Idle,
    Collecting,
}

struct Inner {
    pending: Vec<MidiNote>,
    /// Bumped on every note-on, flush and cancel. A timer fire only finalizes
    /// when it carries the current generation.
    generation: u64,
    completed: VecDeque<Chord>,
}

struct Shared {
    inner: Mutex<Inner>,
    completed_ready: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finalize(&self, inner: &mut Inner) -> Option<Chord> {
        if inner.pending.is_empty() {
            return None;
        }
        let chord = Chord::new(std::mem::take(&mut inner.pending));
        inner.completed.push_back(chord.clone());
        self.completed_ready.notify_all();
        log::info!(
            target: "chords",
            "new chord: {:?} ({}), queue size {}",
            chord.notes(),
            chord.describe(),
            inner.completed.len()
        );
        Some(chord)
    }

    fn on_timer(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation {
            self.finalize(&mut inner);
        }
    }
}

/// Groups note-on events into chords separated by a gap of silence.
///
/// Every note-on restarts the quiescence timer; when it expires the pending
/// notes become one chord at the back of the completed queue. Notes may
/// arrive from any thread; the timer runs on its own thread.
pub struct ChordAggregator {
    shared: Arc<Shared>,
    timer: Debouncer,
    window: Duration,
}

impl ChordAggregator {
    pub fn new(window: Duration) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                pending: Vec::new(),
                generation: 0,
                completed: VecDeque::new(),
            }),
            completed_ready: Condvar::new(),
        });
        let timer_shared = Arc::clone(&shared);
        let timer = Debouncer::spawn("chord-timer", window, move |generation| {
            timer_shared.on_timer(generation)
        })?;
        Ok(Self {
            shared,
            timer,
            window,
        })
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn state(&self) -> AggregatorState {
        if self.shared.lock().pending.is_empty() {
            AggregatorState::Idle
        } else {
            AggregatorState::Collecting
        }
    }

    /// Append a note to the pending chord and restart the timer.
    pub fn note_on(&self, note: MidiNote) {
        let mut inner = self.shared.lock();
        if inner.pending.is_empty() {
            log::debug!(target: "chords", "collecting from note {}", note);
        }
        inner.pending.push(note);
        inner.generation += 1;
        // Armed under the lock so arms reach the timer in generation order.
        self.timer.arm(inner.generation);
    }

    /// Finalize the pending chord now, without waiting for the timer.
    pub fn flush(&self) -> Option<Chord> {
        let mut inner = self.shared.lock();
        inner.generation += 1;
        self.timer.cancel();
        self.shared.finalize(&mut inner)
    }

    /// Stop the timer and discard the pending notes without completing a chord.
    pub fn cancel(&self) -> Vec<MidiNote> {
        let mut inner = self.shared.lock();
        inner.generation += 1;
        self.timer.cancel();
        let discarded = std::mem::take(&mut inner.pending);
        if !discarded.is_empty() {
            log::debug!(target: "chords", "discarded partial chord {:?}", discarded);
        }
        discarded
    }

    pub fn pending_notes(&self) -> Vec<MidiNote> {
        self.shared.lock().pending.clone()
    }

    /// Snapshot of the completed queue, oldest first.
    pub fn completed(&self) -> Vec<Chord> {
        self.shared.lock().completed.iter().cloned().collect()
    }

    pub fn drain_completed(&self) -> Vec<Chord> {
        self.shared.lock().completed.drain(..).collect()
    }

    /// Pop the oldest completed chord, waiting up to `timeout` for one.
    pub fn wait_completed(&self, timeout: Duration) -> Option<Chord> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.shared.lock();
        loop {
            if let Some(chord) = inner.completed.pop_front() {
                return Some(chord);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _) = self
                .shared
                .completed_ready
                .wait_timeout(inner, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            inner = guard;
        }
    }
}
