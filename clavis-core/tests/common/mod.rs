#![allow(dead_code)]
//! Test harness utilities for clavis-core integration tests.

use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clavis_core::keyboard::RecordingSurface;
use clavis_core::transport::TestTransport;
use clavis_core::{AppState, Config};
use rosc::{OscMessage, OscPacket, OscType};

/// Poll `cond` every 5ms until it holds, or panic after `timeout`.
pub fn wait_until<F: FnMut() -> bool>(what: &str, timeout: Duration, mut cond: F) {
    let start = Instant::now();
    while Instant::now().duration_since(start) < timeout {
        if cond() {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("Timed out waiting for {}", what);
}

/// Send one OSC message to `target` from an ephemeral socket.
pub fn send_osc(target: SocketAddr, addr: &str, args: Vec<OscType>) {
    let packet = OscPacket::Message(OscMessage {
        addr: addr.to_string(),
        args,
    });
    let buf = rosc::encoder::encode(&packet).unwrap();
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.send_to(&buf, target).unwrap();
}

pub fn key_on(target: SocketAddr, note: i32) {
    send_osc(target, "/keyOn", vec![OscType::Int(0), OscType::Int(note)]);
}

pub fn key_off(target: SocketAddr, note: i32) {
    send_osc(target, "/keyOff", vec![OscType::Int(0), OscType::Int(note)]);
}

/// Configuration for tests: ephemeral chord port and a short chord window.
/// `extra` lands in the `[chords]` table.
pub fn test_config(extra: &str) -> Config {
    let window = if extra.contains("window_ms") {
        ""
    } else {
        "window_ms = 60\n"
    };
    let toml = format!(
        "[osc]\nchord_listen_addr = \"127.0.0.1:0\"\n[chords]\n{}{}",
        window, extra
    );
    Config::from_toml_str(&toml).unwrap()
}

pub struct Harness {
    pub state: AppState,
    pub surface: RecordingSurface,
    pub transport: Arc<TestTransport>,
}

/// AppState wired to a recording surface and a recording transport.
pub fn make_harness(extra: &str) -> Harness {
    let surface = RecordingSurface::new();
    let transport = Arc::new(TestTransport::new());
    let state = AppState::new(
        &test_config(extra),
        Box::new(surface.clone()),
        transport.clone(),
    )
    .unwrap();
    Harness {
        state,
        surface,
        transport,
    }
}
