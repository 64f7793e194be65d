// System work launcher
use spawnwatch_core::domain::Work;
use spawnwatch_core::port::{Pollable, SpawnError, WorkLauncher};

use crate::native_call::NativeCallUnit;
use crate::subprocess::SubprocessUnit;

/// Launches shell commands as subprocesses and native calls on worker threads
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl SystemLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl WorkLauncher for SystemLauncher {
    fn launch(&self, work: Work) -> Result<Box<dyn Pollable>, SpawnError> {
        match work {
            Work::Command(line) => Ok(Box::new(SubprocessUnit::spawn(&line)?)),
            Work::Native { label, call } => Ok(Box::new(NativeCallUnit::spawn(label, call)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spawnwatch_core::domain::NativeOutcome;
    use spawnwatch_core::port::PollOutcome;
    use std::time::Duration;

    #[test]
    fn test_blank_command_is_rejected() {
        let result = SystemLauncher::new().launch(Work::command("  "));
        assert!(matches!(result, Err(SpawnError::EmptyCommand)));
    }

    #[test]
    fn test_native_work_is_dispatched_to_thread() {
        let mut unit = SystemLauncher::new()
            .launch(Work::native("answer", || NativeOutcome::new("42", 0)))
            .unwrap();

        assert_eq!(unit.pid(), None);
        assert_eq!(
            unit.poll(Duration::from_secs(5)),
            PollOutcome::Finished {
                status: 0,
                output: b"42".to_vec()
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_command_work_gets_a_pid() {
        let unit = SystemLauncher::new().launch(Work::command("true")).unwrap();
        assert!(unit.pid().is_some());
    }
}
