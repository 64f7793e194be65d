// Work Launcher Port
// Turns a Work item into a running Pollable (process spawn, thread start)

use thiserror::Error;

use super::pollable::Pollable;
use crate::domain::Work;

/// Launch errors
#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("Empty command line")]
    EmptyCommand,

    #[error("Spawn failed for `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Output pipe setup failed: {0}")]
    Pipe(String),

    #[error("Failed to start native call `{label}`: {source}")]
    Thread {
        label: String,
        #[source]
        source: std::io::Error,
    },
}

/// Work Launcher trait
///
/// Acquires the OS-level handle for a unit of work. Must not block on the work itself.
pub trait WorkLauncher: Send + Sync {
    /// Launch `work` and hand back its pollable handle
    ///
    /// # Errors
    /// - SpawnError::EmptyCommand for a blank command line
    /// - SpawnError::Spawn if the process cannot be created
    /// - SpawnError::Thread if the native-call worker cannot be started
    fn launch(&self, work: Work) -> Result<Box<dyn Pollable>, SpawnError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::port::pollable::mocks::ScriptedUnit;
    use crate::port::pollable::PollOutcome;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Scripted launch behavior
    #[derive(Debug, Clone)]
    pub enum LaunchScript {
        /// Launch succeeds; the unit replays these outcomes
        Steps(Vec<PollOutcome>),
        /// Launch fails with a spawn error
        Fail(String),
    }

    /// Mock launcher handing out ScriptedUnits in order
    ///
    /// When the queue is empty, launches succeed with a unit that finishes at once with status 0.
    #[derive(Default)]
    pub struct ScriptedLauncher {
        scripts: Mutex<VecDeque<LaunchScript>>,
        launched: Arc<Mutex<Vec<String>>>,
        polls: Mutex<Vec<Arc<AtomicUsize>>>,
    }

    impl ScriptedLauncher {
        pub fn new(scripts: Vec<LaunchScript>) -> Self {
            Self {
                scripts: Mutex::new(scripts.into()),
                launched: Arc::new(Mutex::new(Vec::new())),
                polls: Mutex::new(Vec::new()),
            }
        }

        /// Descriptions of every launched work item, in order
        pub fn launched(&self) -> Vec<String> {
            self.launched.lock().unwrap().clone()
        }

        /// Poll calls made so far against each successfully launched unit, in launch order
        pub fn poll_counts(&self) -> Vec<usize> {
            self.polls
                .lock()
                .unwrap()
                .iter()
                .map(|counter| counter.load(Ordering::SeqCst))
                .collect()
        }

        fn track(&self, unit: ScriptedUnit) -> Box<dyn Pollable> {
            self.polls.lock().unwrap().push(unit.poll_counter());
            Box::new(unit)
        }
    }

    impl WorkLauncher for ScriptedLauncher {
        fn launch(&self, work: Work) -> Result<Box<dyn Pollable>, SpawnError> {
            self.launched
                .lock()
                .unwrap()
                .push(work.describe().to_string());

            let script = self.scripts.lock().unwrap().pop_front();
            match script {
                Some(LaunchScript::Fail(msg)) => Err(SpawnError::Spawn {
                    command: work.describe().to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, msg),
                }),
                Some(LaunchScript::Steps(steps)) => Ok(self.track(ScriptedUnit::new(steps))),
                None => Ok(self.track(ScriptedUnit::new(Vec::new()))),
            }
        }
    }
}
