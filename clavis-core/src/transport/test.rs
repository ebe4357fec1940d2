use std::sync::{Mutex, PoisonError};

use super::{Transport, TransportResult};

/// A message recorded by `TestTransport`.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub addr: String,
    pub args: Vec<i32>,
}

impl SentMessage {
    /// Arguments in wire order.
    pub fn ints(&self) -> Vec<i32> {
        self.args.clone()
    }
}

/// A transport that records all messages into a vector for assertions.
/// All sends succeed.
#[derive(Default)]
pub struct TestTransport {
    sent: Mutex<Vec<SentMessage>>,
}

impl TestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages sent to `addr`, in order.
    pub fn sent_to(&self, addr: &str) -> Vec<SentMessage> {
        self.messages()
            .into_iter()
            .filter(|m| m.addr == addr)
            .collect()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.messages().into_iter().map(|m| m.addr).collect()
    }

    pub fn clear(&self) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Transport for TestTransport {
    fn send_raw(&self, addr: &str, args: Vec<i32>) -> TransportResult {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMessage {
                addr: addr.to_string(),
                args,
            });
        Ok(())
    }
}

/// A transport that silently succeeds. Used when no synthesiser is configured.
pub struct NullTransport;

impl Transport for NullTransport {
    fn send_raw(&self, _: &str, _: Vec<i32>) -> TransportResult {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{CHORD_ON_ADDR, KEY_ON_PLAY_ADDR, MORPH_NOTES_ADDR};
    use clavis_types::{morph, Chord};

    #[test]
    fn helpers_build_expected_payloads() {
        let t = TestTransport::new();
        t.send_chord_on(&Chord::from(vec![60, 64, 67])).unwrap();
        t.send_morph_notes(&morph(&Chord::from(vec![60]), &Chord::from(vec![72])))
            .unwrap();
        t.send_key_on_play(0, 61).unwrap();

        let sent = t.messages();
        assert_eq!(sent[0].addr, CHORD_ON_ADDR);
        assert_eq!(sent[0].ints(), vec![60, 64, 67]);
        assert_eq!(sent[1].addr, MORPH_NOTES_ADDR);
        assert_eq!(sent[1].ints(), vec![16384]);
        assert_eq!(sent[2].addr, KEY_ON_PLAY_ADDR);
        assert_eq!(sent[2].ints(), vec![0, 61]);
    }

    #[test]
    fn clear_forgets_messages() {
        let t = TestTransport::new();
        t.send_key_on_play(0, 60).unwrap();
        t.clear();
        assert!(t.messages().is_empty());
    }
}
