use std::sync::{Arc, Mutex, PoisonError};

use super::{KeyColor, KeyHandle, KeyInfo};

/// Rendering seam for the keyboard.
///
/// The highlight state resolves every colour change to a key handle before
/// calling the surface, so implementations only deal with drawn keys.
pub trait KeySurface: Send {
    /// Called when the key arena is (re)built. Every key starts in its class
    /// default colour.
    fn layout(&mut self, _keys: &[KeyInfo]) {}

    fn paint(&mut self, handle: KeyHandle, color: KeyColor);
}

/// A surface that draws nothing.
pub struct NullSurface;

impl KeySurface for NullSurface {
    fn paint(&mut self, _: KeyHandle, _: KeyColor) {}
}

/// Records every paint call. Clones share the same log so a test can keep one
/// while the highlight state owns another.
#[derive(Clone, Default)]
pub struct RecordingSurface {
    paints: Arc<Mutex<Vec<(KeyHandle, KeyColor)>>>,
    layouts: Arc<Mutex<usize>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paints(&self) -> Vec<(KeyHandle, KeyColor)> {
        self.paints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent colour painted onto `handle`, if any.
    pub fn last_color(&self, handle: KeyHandle) -> Option<KeyColor> {
        self.paints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|(h, _)| *h == handle)
            .map(|(_, c)| *c)
    }

    pub fn layout_count(&self) -> usize {
        *self.layouts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn clear(&self) {
        self.paints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl KeySurface for RecordingSurface {
    fn layout(&mut self, _keys: &[KeyInfo]) {
        *self.layouts.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }

    fn paint(&mut self, handle: KeyHandle, color: KeyColor) {
        self.paints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((handle, color));
    }
}
