//! A cancellable, restartable one-shot timer on a dedicated thread.
//!
//! Each `arm` restarts the countdown and carries a generation number; when the
//! countdown expires the callback receives the generation of the most recent
//! arm. `cancel` stops the countdown without firing.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

enum TimerCmd {
    Arm(u64),
    Cancel,
    Shutdown,
}

pub struct Debouncer {
    tx: Sender<TimerCmd>,
    handle: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn spawn<F>(name: &str, delay: Duration, on_fire: F) -> std::io::Result<Self>
    where
        F: FnMut(u64) + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || timer_loop(rx, delay, on_fire))?;
        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    /// Start or restart the countdown.
    pub fn arm(&self, generation: u64) {
        let _ = self.tx.send(TimerCmd::Arm(generation));
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(TimerCmd::Cancel);
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        let _ = self.tx.send(TimerCmd::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn timer_loop<F: FnMut(u64)>(rx: Receiver<TimerCmd>, delay: Duration, mut on_fire: F) {
    let mut pending: Option<(Instant, u64)> = None;
    loop {
        let cmd = match pending {
            Some((deadline, generation)) => match rx.recv_deadline(deadline) {
                Ok(cmd) => cmd,
                Err(RecvTimeoutError::Timeout) => {
                    pending = None;
                    on_fire(generation);
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => return,
            },
            None => match rx.recv() {
                Ok(cmd) => cmd,
                Err(_) => return,
            },
        };
        match cmd {
            TimerCmd::Arm(generation) => pending = Some((Instant::now() + delay, generation)),
            TimerCmd::Cancel => pending = None,
            TimerCmd::Shutdown => return,
        }
    }
}
