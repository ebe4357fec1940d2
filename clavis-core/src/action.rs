use clavis_types::MidiNote;

/// Every mutation the UI thread can request. Applied by `dispatch_action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SelectKey(String),
    SelectScale(String),
    SetKeyboardSize(u16),
    KeyOn(MidiNote),
    KeyOff(MidiNote),
    /// Complete the pending chord without waiting for the window to close.
    FlushChord,
    ScrubForward,
    ScrubBackward,
    StopChord,
    SetSendChord(bool),
    SetMorph(bool),
    SetFilterDuplicates(bool),
    StartChordListener,
    StopChordListener,
}

/// Outcome of a dispatched action, for the UI to report.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub status: Vec<String>,
}

impl DispatchResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_status(message: impl Into<String>) -> Self {
        Self {
            status: vec![message.into()],
        }
    }

    pub fn push_status(&mut self, message: impl Into<String>) {
        self.status.push(message.into());
    }
}
