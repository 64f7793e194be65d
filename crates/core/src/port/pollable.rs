// Pollable Port
// One launched unit of work, inspected with bounded waits

use std::time::Duration;

/// Outcome of a single bounded poll attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing happened within the bound
    Pending,
    /// New output arrived; the unit is still running
    Output(Vec<u8>),
    /// The unit is done. `output` carries trailing bytes (a native call's whole result)
    Finished { status: i32, output: Vec<u8> },
}

/// Pollable unit of work
///
/// Implementations:
/// - SubprocessUnit: shell command with a captured stdout pipe
/// - NativeCallUnit: callable running on a worker thread
pub trait Pollable: Send {
    /// Make at most one attempt at progress, waiting no longer than `timeout`
    ///
    /// Transient conditions (would-block, interrupted) are `Pending`, never errors.
    /// Once `Finished` has been returned the unit must not be polled again.
    fn poll(&mut self, timeout: Duration) -> PollOutcome;

    /// OS process id, when there is one
    fn pid(&self) -> Option<u32> {
        None
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Replays a fixed script of outcomes
    ///
    /// `Pending` steps sleep for the requested bound, so timing behaves like a real unit.
    /// An exhausted script reports `Finished { status: 0 }`.
    pub struct ScriptedUnit {
        steps: VecDeque<PollOutcome>,
        polls: Arc<AtomicUsize>,
    }

    impl ScriptedUnit {
        pub fn new(steps: Vec<PollOutcome>) -> Self {
            Self {
                steps: steps.into(),
                polls: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Shared counter of poll calls made against this unit
        pub fn poll_counter(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.polls)
        }
    }

    impl Pollable for ScriptedUnit {
        fn poll(&mut self, timeout: Duration) -> PollOutcome {
            self.polls.fetch_add(1, Ordering::SeqCst);
            match self.steps.pop_front() {
                Some(PollOutcome::Pending) => {
                    std::thread::sleep(timeout);
                    PollOutcome::Pending
                }
                Some(step) => step,
                None => PollOutcome::Finished {
                    status: 0,
                    output: Vec::new(),
                },
            }
        }
    }
}
