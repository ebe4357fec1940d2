use std::sync::Arc;

use midir::{MidiInput, MidiInputConnection};

use crate::listener::{EventSink, NoteEvent, NoteEventKind};

const CLIENT_NAME: &str = "clavis";

/// Information about an available MIDI port
#[derive(Debug, Clone)]
pub struct MidiPortInfo {
    pub index: usize,
    pub name: String,
}

/// Parse a raw MIDI message into a note event. Only note-on and note-off are
/// of interest; a note-on with velocity 0 is a note-off.
pub fn decode_midi_message(data: &[u8]) -> Option<NoteEvent> {
    if data.len() < 3 {
        return None;
    }
    let channel = i32::from(data[0] & 0x0F);
    let note = i32::from(data[1] & 0x7F);
    let kind = match data[0] & 0xF0 {
        0x80 => NoteEventKind::Off,
        0x90 if data[2] == 0 => NoteEventKind::Off,
        0x90 => NoteEventKind::On,
        _ => return None,
    };
    Some(NoteEvent {
        kind,
        channel,
        note,
    })
}

pub fn list_ports() -> Vec<MidiPortInfo> {
    let Ok(midi_in) = MidiInput::new(CLIENT_NAME) else {
        return Vec::new();
    };
    midi_in
        .ports()
        .iter()
        .enumerate()
        .filter_map(|(index, port)| {
            midi_in
                .port_name(port)
                .ok()
                .map(|name| MidiPortInfo { index, name })
        })
        .collect()
}

/// Hardware MIDI input delivering note events to the same sink as the OSC
/// listener. The callback runs on midir's thread.
pub struct MidiInputBridge {
    connection: Option<MidiInputConnection<()>>,
    port_name: String,
}

impl MidiInputBridge {
    /// Connect to the first input port whose name contains `pattern`
    /// (case-insensitive).
    pub fn connect(pattern: &str, sink: Arc<dyn EventSink>) -> Result<Self, String> {
        let midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| e.to_string())?;
        let wanted = pattern.to_lowercase();
        let ports = midi_in.ports();
        let (port, port_name) = ports
            .iter()
            .find_map(|p| {
                let name = midi_in.port_name(p).ok()?;
                name.to_lowercase().contains(&wanted).then(|| (p.clone(), name))
            })
            .ok_or_else(|| format!("no MIDI input port matching '{}'", pattern))?;

        let connection = midi_in
            .connect(
                &port,
                "clavis-input",
                move |_timestamp, message, _| {
                    if let Some(event) = decode_midi_message(message) {
                        log::trace!(target: "midi", "<- {:?}", event);
                        sink.handle(event);
                    }
                },
                (),
            )
            .map_err(|e| e.to_string())?;

        log::info!(target: "midi", "connected to {}", port_name);
        Ok(Self {
            connection: Some(connection),
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn disconnect(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close();
            log::info!(target: "midi", "disconnected from {}", self.port_name);
        }
    }
}

impl Drop for MidiInputBridge {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_and_off() {
        let on = decode_midi_message(&[0x91, 60, 100]).unwrap();
        assert_eq!(on.kind, NoteEventKind::On);
        assert_eq!(on.channel, 1);
        assert_eq!(on.note, 60);

        let off = decode_midi_message(&[0x80, 60, 64]).unwrap();
        assert_eq!(off.kind, NoteEventKind::Off);
    }

    #[test]
    fn zero_velocity_note_on_is_note_off() {
        let ev = decode_midi_message(&[0x90, 67, 0]).unwrap();
        assert_eq!(ev.kind, NoteEventKind::Off);
        assert_eq!(ev.note, 67);
    }

    #[test]
    fn other_messages_are_ignored() {
        assert_eq!(decode_midi_message(&[0xB0, 7, 100]), None);
        assert_eq!(decode_midi_message(&[0x90, 60]), None);
        assert_eq!(decode_midi_message(&[]), None);
    }
}
