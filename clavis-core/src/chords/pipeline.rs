use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::aggregator::ChordAggregator;
use super::player::{lock_player, SharedPlayer};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Consumer thread that drains completed chords into a `ChordPlayer`.
pub struct ChordPipeline {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ChordPipeline {
    pub fn spawn(aggregator: Arc<ChordAggregator>, player: SharedPlayer) -> std::io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("chord-pipeline".into())
            .spawn(move || {
                while thread_running.load(Ordering::Relaxed) {
                    let Some(chord) = aggregator.wait_completed(POLL_INTERVAL) else {
                        continue;
                    };
                    if let Err(e) = lock_player(&player).ingest(chord) {
                        log::error!(target: "osc", "failed to send chord: {}", e);
                    }
                }
            })?;
        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ChordPipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chords::{ChordPlayer, PlaybackOptions};
    use crate::transport::{TestTransport, CHORD_ON_ADDR};
    use std::time::Instant;

    #[test]
    fn completed_chords_reach_the_transport() {
        let aggregator = Arc::new(ChordAggregator::new(Duration::from_millis(40)).unwrap());
        let transport = Arc::new(TestTransport::new());
        let player = ChordPlayer::new(transport.clone(), PlaybackOptions::default()).into_shared();
        let mut pipeline = ChordPipeline::spawn(aggregator.clone(), player.clone()).unwrap();

        aggregator.note_on(60);
        aggregator.note_on(67);

        let deadline = Instant::now() + Duration::from_secs(3);
        while transport.messages().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        pipeline.stop();
        assert!(!pipeline.is_running());

        let sent = transport.sent_to(CHORD_ON_ADDR);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].ints(), vec![60, 67]);
        assert_eq!(lock_player(&player).cursor().len(), 1);
    }
}
