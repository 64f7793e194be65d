// Task Domain Model

use serde::{Deserialize, Serialize};

/// Status reported for work that never completed normally
/// (spawn failure, lost handle, panicked native call)
pub const SENTINEL_STATUS: i32 = -1;

/// Task lifecycle state
///
/// `Idle -> Running -> Finished`, and `Finished -> Running` only through a fresh start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Idle,
    Running,
    Finished,
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Idle => write!(f, "IDLE"),
            TaskState::Running => write!(f, "RUNNING"),
            TaskState::Finished => write!(f, "FINISHED"),
        }
    }
}

/// Captured output and status code of a finished task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutput {
    pub output: String,
    pub status: i32,
}

impl TaskOutput {
    pub fn new(output: impl Into<String>, status: i32) -> Self {
        Self {
            output: output.into(),
            status,
        }
    }

    /// Empty output with the sentinel status
    pub fn sentinel() -> Self {
        Self::new(String::new(), SENTINEL_STATUS)
    }

    /// Status code 0
    pub fn succeeded(&self) -> bool {
        self.status == 0
    }

    /// False when the work never ran to completion
    pub fn completed(&self) -> bool {
        self.status != SENTINEL_STATUS
    }

    pub fn into_parts(self) -> (String, i32) {
        (self.output, self.status)
    }
}
