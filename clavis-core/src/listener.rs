//! Inbound OSC: `/keyOn` and `/keyOff` messages decoded into note events and
//! fanned out to the keyboard display and the chord aggregator.

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use clavis_types::MidiNote;
use rosc::{OscMessage, OscPacket, OscType};
use thiserror::Error;

use crate::chords::ChordAggregator;
use crate::keyboard::{lock_highlight, KeyHighlightState};

pub const KEY_ON_ADDR: &str = "/keyOn";
pub const KEY_OFF_ADDR: &str = "/keyOff";

const RECV_TIMEOUT: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteEventKind {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub kind: NoteEventKind,
    pub channel: i32,
    pub note: MidiNote,
}

#[derive(Debug, Error, PartialEq)]
pub enum MalformedEvent {
    #[error("{addr}: no note argument")]
    MissingNote { addr: String },
    #[error("{addr}: argument {index} is not a number")]
    NotANumber { addr: String, index: usize },
    #[error("{addr}: note {note} is outside 0..=127")]
    OutOfRange { addr: String, note: i64 },
}

fn numeric_arg(msg: &OscMessage, index: usize) -> Result<i64, MalformedEvent> {
    let bad = || MalformedEvent::NotANumber {
        addr: msg.addr.clone(),
        index,
    };
    match msg.args.get(index) {
        Some(OscType::Int(v)) => Ok(i64::from(*v)),
        Some(OscType::Long(v)) => Ok(*v),
        Some(OscType::Float(v)) if v.is_finite() => Ok(v.round() as i64),
        Some(OscType::Double(v)) if v.is_finite() => Ok(v.round() as i64),
        _ => Err(bad()),
    }
}

/// Decode one message. Messages for other addresses yield `Ok(None)`.
///
/// A lone argument is the MIDI number; otherwise argument 0 is the channel and
/// argument 1 the MIDI number. Trailing arguments are ignored.
pub fn decode(msg: &OscMessage) -> Result<Option<NoteEvent>, MalformedEvent> {
    let kind = match msg.addr.as_str() {
        KEY_ON_ADDR => NoteEventKind::On,
        KEY_OFF_ADDR => NoteEventKind::Off,
        _ => return Ok(None),
    };
    let (channel, note) = match msg.args.len() {
        0 => {
            return Err(MalformedEvent::MissingNote {
                addr: msg.addr.clone(),
            })
        }
        1 => (0, numeric_arg(msg, 0)?),
        _ => (numeric_arg(msg, 0)?, numeric_arg(msg, 1)?),
    };
    if !(0..=127).contains(&note) {
        return Err(MalformedEvent::OutOfRange {
            addr: msg.addr.clone(),
            note,
        });
    }
    Ok(Some(NoteEvent {
        kind,
        channel: channel as i32,
        note: note as MidiNote,
    }))
}

/// Receives decoded note events. Called from listener threads.
pub trait EventSink: Send + Sync {
    fn note_on(&self, note: MidiNote);
    fn note_off(&self, note: MidiNote);

    fn handle(&self, event: NoteEvent) {
        match event.kind {
            NoteEventKind::On => self.note_on(event.note),
            NoteEventKind::Off => self.note_off(event.note),
        }
    }
}

impl EventSink for Mutex<KeyHighlightState> {
    fn note_on(&self, note: MidiNote) {
        lock_highlight(self).activate(note);
    }

    fn note_off(&self, note: MidiNote) {
        lock_highlight(self).deactivate(note);
    }
}

impl EventSink for ChordAggregator {
    fn note_on(&self, note: MidiNote) {
        ChordAggregator::note_on(self, note);
    }

    /// Chords are delimited by silence, not by releases.
    fn note_off(&self, _note: MidiNote) {}
}

/// Forwards every event to each sink in order.
#[derive(Default)]
pub struct FanOut {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for FanOut {
    fn note_on(&self, note: MidiNote) {
        for sink in &self.sinks {
            sink.note_on(note);
        }
    }

    fn note_off(&self, note: MidiNote) {
        for sink in &self.sinks {
            sink.note_off(note);
        }
    }
}

fn handle_packet(packet: &OscPacket, sink: &dyn EventSink) {
    match packet {
        OscPacket::Message(msg) => match decode(msg) {
            Ok(Some(event)) => {
                log::debug!(target: "osc", "<- {:?}", event);
                sink.handle(event);
            }
            Ok(None) => log::debug!(target: "osc", "ignoring {}", msg.addr),
            Err(e) => log::warn!(target: "osc", "dropping malformed event: {}", e),
        },
        OscPacket::Bundle(bundle) => {
            for p in &bundle.content {
                handle_packet(p, sink);
            }
        }
    }
}

/// A UDP socket and receive thread feeding an `EventSink`.
pub struct OscListener {
    local_addr: SocketAddr,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl OscListener {
    pub fn bind(addr: &str, sink: Arc<dyn EventSink>) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(RECV_TIMEOUT))?;
        let local_addr = socket.local_addr()?;
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name(format!("osc-listener-{}", local_addr.port()))
            .spawn(move || {
                let mut buf = [0u8; 4096];
                while thread_running.load(Ordering::Relaxed) {
                    match socket.recv(&mut buf) {
                        Ok(n) => match rosc::decoder::decode_udp(&buf[..n]) {
                            Ok((_, packet)) => handle_packet(&packet, sink.as_ref()),
                            Err(e) => log::warn!(target: "osc", "undecodable packet: {}", e),
                        },
                        Err(ref e)
                            if e.kind() == std::io::ErrorKind::WouldBlock
                                || e.kind() == std::io::ErrorKind::TimedOut =>
                        {
                            continue
                        }
                        Err(e) => {
                            log::error!(target: "osc", "listener on {} failed: {}", local_addr, e);
                            break;
                        }
                    }
                }
            })?;

        log::info!(target: "osc", "listening on {}", local_addr);
        Ok(Self {
            local_addr,
            running,
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop receiving and join the thread. The socket is closed when it exits.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            log::info!(target: "osc", "stopped listening on {}", self.local_addr);
        }
    }
}

impl Drop for OscListener {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(addr: &str, args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: addr.to_string(),
            args,
        }
    }

    #[test]
    fn single_argument_is_the_note() {
        let ev = decode(&msg("/keyOn", vec![OscType::Int(60)])).unwrap().unwrap();
        assert_eq!(
            ev,
            NoteEvent {
                kind: NoteEventKind::On,
                channel: 0,
                note: 60
            }
        );
    }

    #[test]
    fn two_arguments_are_channel_then_note() {
        let ev = decode(&msg("/keyOff", vec![OscType::Int(2), OscType::Float(64.0)]))
            .unwrap()
            .unwrap();
        assert_eq!(ev.kind, NoteEventKind::Off);
        assert_eq!(ev.channel, 2);
        assert_eq!(ev.note, 64);
    }

    #[test]
    fn other_addresses_are_ignored() {
        assert_eq!(decode(&msg("/status", vec![])), Ok(None));
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        assert!(matches!(
            decode(&msg("/keyOn", vec![])),
            Err(MalformedEvent::MissingNote { .. })
        ));
        assert!(matches!(
            decode(&msg("/keyOn", vec![OscType::String("C4".into())])),
            Err(MalformedEvent::NotANumber { index: 0, .. })
        ));
        assert!(matches!(
            decode(&msg("/keyOn", vec![OscType::Int(0), OscType::Int(200)])),
            Err(MalformedEvent::OutOfRange { note: 200, .. })
        ));
    }

    #[derive(Default)]
    struct Log(Mutex<Vec<(bool, MidiNote)>>);

    impl EventSink for Log {
        fn note_on(&self, note: MidiNote) {
            self.0.lock().unwrap().push((true, note));
        }
        fn note_off(&self, note: MidiNote) {
            self.0.lock().unwrap().push((false, note));
        }
    }

    #[test]
    fn fan_out_reaches_every_sink() {
        let a = Arc::new(Log::default());
        let b = Arc::new(Log::default());
        let fan = FanOut::new().with(a.clone()).with(b.clone());
        fan.note_on(60);
        fan.note_off(60);
        assert_eq!(fan.len(), 2);
        assert_eq!(*a.0.lock().unwrap(), vec![(true, 60), (false, 60)]);
        assert_eq!(*b.0.lock().unwrap(), vec![(true, 60), (false, 60)]);
    }

    #[test]
    fn bundles_are_unpacked_in_order() {
        let log = Log::default();
        let packet = OscPacket::Bundle(rosc::OscBundle {
            timetag: rosc::OscTime {
                seconds: 0,
                fractional: 1,
            },
            content: vec![
                OscPacket::Message(msg("/keyOn", vec![OscType::Int(60)])),
                OscPacket::Message(msg("/keyOn", vec![])),
                OscPacket::Message(msg("/keyOff", vec![OscType::Int(60)])),
            ],
        });
        handle_packet(&packet, &log);
        assert_eq!(*log.0.lock().unwrap(), vec![(true, 60), (false, 60)]);
    }
}
