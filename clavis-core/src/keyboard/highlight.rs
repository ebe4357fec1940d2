use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use clavis_types::{locate, KeyPosition, KeyboardSize, MidiNote};

use super::{KeyArena, KeyColor, KeyHandle, KeySurface};

/// Highlight state shared between the listener thread and the UI thread.
pub type SharedHighlight = Arc<Mutex<KeyHighlightState>>;

/// Lock the shared highlight state, recovering from a poisoned lock.
pub fn lock_highlight(state: &Mutex<KeyHighlightState>) -> MutexGuard<'_, KeyHighlightState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Which keys are in the current scale and which are held down, and the
/// colour each key should show as a result.
///
/// Colour priority: active, then highlighted, then the class default.
pub struct KeyHighlightState {
    arena: KeyArena,
    highlighted: BTreeSet<MidiNote>,
    active: BTreeSet<MidiNote>,
    surface: Box<dyn KeySurface>,
}

impl KeyHighlightState {
    pub fn new(size: KeyboardSize, mut surface: Box<dyn KeySurface>) -> Self {
        let arena = KeyArena::new(size);
        surface.layout(&arena.keys());
        Self {
            arena,
            highlighted: BTreeSet::new(),
            active: BTreeSet::new(),
            surface,
        }
    }

    pub fn into_shared(self) -> SharedHighlight {
        Arc::new(Mutex::new(self))
    }

    /// Swap in a different keyboard. Highlights and held keys are dropped;
    /// the caller re-applies the scale.
    pub fn set_keyboard(&mut self, size: KeyboardSize) {
        self.arena = KeyArena::new(size);
        self.highlighted.clear();
        self.active.clear();
        self.surface.layout(&self.arena.keys());
        log::debug!(target: "keyboard", "keyboard resized to {} keys", size.key_count());
    }

    pub fn keyboard_size(&self) -> KeyboardSize {
        self.arena.size()
    }

    pub fn starting_midi_note(&self) -> MidiNote {
        self.arena.starting_midi_note()
    }

    /// Replace the highlighted set wholesale. Held keys keep their state.
    pub fn set_scale<I: IntoIterator<Item = MidiNote>>(&mut self, notes: I) {
        let previous = std::mem::take(&mut self.highlighted);
        self.highlighted = notes.into_iter().collect();
        let dropped: Vec<MidiNote> = previous.difference(&self.highlighted).copied().collect();
        let current: Vec<MidiNote> = self.highlighted.iter().copied().collect();
        for note in dropped.into_iter().chain(current) {
            self.repaint(note);
        }
    }

    /// Clear the highlighted set and return those keys to their default colour.
    pub fn reset_all(&mut self) {
        let previous = std::mem::take(&mut self.highlighted);
        for note in previous {
            self.repaint(note);
        }
    }

    pub fn activate(&mut self, note: MidiNote) {
        self.active.insert(note);
        self.repaint(note);
    }

    pub fn deactivate(&mut self, note: MidiNote) {
        self.active.remove(&note);
        self.repaint(note);
    }

    pub fn is_highlighted(&self, note: MidiNote) -> bool {
        self.highlighted.contains(&note)
    }

    pub fn is_active(&self, note: MidiNote) -> bool {
        self.active.contains(&note)
    }

    pub fn highlighted_notes(&self) -> Vec<MidiNote> {
        self.highlighted.iter().copied().collect()
    }

    pub fn active_notes(&self) -> Vec<MidiNote> {
        self.active.iter().copied().collect()
    }

    pub fn locate(&self, note: MidiNote) -> KeyPosition {
        locate(note, self.starting_midi_note())
    }

    pub fn handle_of(&self, note: MidiNote) -> Option<KeyHandle> {
        self.arena.resolve(note)
    }

    /// Colour currently shown for `note`, or `None` when it is not drawn.
    pub fn color_of(&self, note: MidiNote) -> Option<KeyColor> {
        self.arena.resolve(note).and_then(|h| self.arena.color(h))
    }

    fn resolved_color(&self, note: MidiNote) -> KeyColor {
        if self.active.contains(&note) {
            KeyColor::Active
        } else if self.highlighted.contains(&note) {
            KeyColor::Highlight
        } else {
            KeyColor::default_for(self.locate(note).class)
        }
    }

    fn repaint(&mut self, note: MidiNote) {
        let Some(handle) = self.arena.resolve(note) else {
            log::trace!(target: "keyboard", "note {} is not on the keyboard", note);
            return;
        };
        let color = self.resolved_color(note);
        self.arena.set_color(handle, color);
        self.surface.paint(handle, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::RecordingSurface;

    fn state() -> (KeyHighlightState, RecordingSurface) {
        let surface = RecordingSurface::new();
        let state = KeyHighlightState::new(KeyboardSize::Keys61, Box::new(surface.clone()));
        (state, surface)
    }

    #[test]
    fn activate_then_deactivate_restores_color() {
        let (mut hl, _) = state();
        hl.set_scale([60, 62, 64]);
        for note in [60, 61, 62, 63] {
            let before = hl.color_of(note);
            hl.activate(note);
            assert_eq!(hl.color_of(note), Some(KeyColor::Active));
            hl.deactivate(note);
            assert_eq!(hl.color_of(note), before, "note {}", note);
        }
    }

    #[test]
    fn activate_keeps_highlight_membership() {
        let (mut hl, _) = state();
        hl.set_scale([60]);
        hl.activate(60);
        assert!(hl.is_highlighted(60));
        hl.deactivate(60);
        assert_eq!(hl.color_of(60), Some(KeyColor::Highlight));
    }

    #[test]
    fn set_scale_replaces_instead_of_merging() {
        let (mut hl, _) = state();
        hl.set_scale([60, 62]);
        hl.set_scale([61]);
        assert_eq!(hl.highlighted_notes(), vec![61]);
        assert_eq!(hl.color_of(60), Some(KeyColor::White));
        assert_eq!(hl.color_of(61), Some(KeyColor::Highlight));
    }

    #[test]
    fn set_scale_leaves_held_keys_active() {
        let (mut hl, _) = state();
        hl.activate(64);
        hl.set_scale([64, 65]);
        assert_eq!(hl.active_notes(), vec![64]);
        assert_eq!(hl.color_of(64), Some(KeyColor::Active));
        assert_eq!(hl.color_of(65), Some(KeyColor::Highlight));
    }

    #[test]
    fn reset_all_reverts_to_class_defaults() {
        let (mut hl, _) = state();
        hl.set_scale([60, 61]);
        hl.reset_all();
        assert!(hl.highlighted_notes().is_empty());
        assert_eq!(hl.color_of(60), Some(KeyColor::White));
        assert_eq!(hl.color_of(61), Some(KeyColor::Black));
    }

    #[test]
    fn off_board_notes_are_tracked_but_not_painted() {
        let (mut hl, surface) = state();
        surface.clear();
        hl.activate(20);
        hl.activate(120);
        assert!(hl.is_active(20));
        assert_eq!(hl.color_of(20), None);
        assert!(surface.paints().is_empty());
        hl.deactivate(20);
        assert!(!hl.is_active(20));
    }

    #[test]
    fn paints_go_through_resolved_handles() {
        let (mut hl, surface) = state();
        hl.activate(61);
        let handle = hl.handle_of(61).unwrap();
        assert_eq!(surface.last_color(handle), Some(KeyColor::Active));
    }

    #[test]
    fn resize_relayouts_and_clears() {
        let (mut hl, surface) = state();
        hl.set_scale([60]);
        hl.activate(62);
        hl.set_keyboard(KeyboardSize::Keys88);
        assert_eq!(surface.layout_count(), 2);
        assert!(hl.highlighted_notes().is_empty());
        assert!(hl.active_notes().is_empty());
        assert_eq!(hl.starting_midi_note(), 21);
        assert!(hl.handle_of(21).is_some());
    }
}
