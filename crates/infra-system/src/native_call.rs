// Native call unit: a callable on a worker thread, awaited with bounded waits
use std::panic::AssertUnwindSafe;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use spawnwatch_core::domain::{NativeCall, NativeOutcome, SENTINEL_STATUS};
use spawnwatch_core::port::{PollOutcome, Pollable, SpawnError};

use crate::panic_guard::{execute_guarded, PanicGuardResult};

/// Pollable wrapper around a native call
///
/// The call runs on its own thread; `poll` is a bounded wait on its result.
pub struct NativeCallUnit {
    label: String,
    rx: Receiver<NativeOutcome>,
}

impl NativeCallUnit {
    /// Start `call` on a dedicated worker thread
    ///
    /// # Errors
    /// SpawnError::Thread if the OS refuses to create the thread
    pub fn spawn(label: String, call: NativeCall) -> Result<Self, SpawnError> {
        let (tx, rx) = mpsc::sync_channel(1);
        let worker_label = label.clone();

        thread::Builder::new()
            .name("spawnwatch-native".to_string())
            .spawn(move || {
                let outcome = match execute_guarded(AssertUnwindSafe(call)) {
                    PanicGuardResult::Success(outcome) => outcome,
                    PanicGuardResult::Panicked(msg) => {
                        warn!(call = %worker_label, panic = %msg, "Native call panicked");
                        NativeOutcome::new(String::new(), SENTINEL_STATUS)
                    }
                };
                // The unit may be gone already; nobody left to tell
                let _ = tx.send(outcome);
            })
            .map_err(|source| SpawnError::Thread {
                label: label.clone(),
                source,
            })?;

        debug!(call = %label, "Native call started");
        Ok(Self { label, rx })
    }
}

impl Pollable for NativeCallUnit {
    fn poll(&mut self, timeout: Duration) -> PollOutcome {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => PollOutcome::Finished {
                status: outcome.status,
                output: outcome.output.into_bytes(),
            },
            Err(RecvTimeoutError::Timeout) => PollOutcome::Pending,
            Err(RecvTimeoutError::Disconnected) => {
                warn!(call = %self.label, "Native call ended without a result");
                PollOutcome::Finished {
                    status: SENTINEL_STATUS,
                    output: Vec::new(),
                }
            }
        }
    }
}
