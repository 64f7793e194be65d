// Units of work handed to a task supervisor

use std::fmt;

use super::command::CommandLine;

/// What a native call hands back: text result plus status code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeOutcome {
    pub output: String,
    pub status: i32,
}

impl NativeOutcome {
    pub fn new(output: impl Into<String>, status: i32) -> Self {
        Self {
            output: output.into(),
            status,
        }
    }
}

/// A callable run off the caller's thread
pub type NativeCall = Box<dyn FnOnce() -> NativeOutcome + Send + 'static>;

/// One unit of external work
pub enum Work {
    /// Shell command line; stdout is captured
    Command(CommandLine),
    /// Native callable producing a result string and status code
    Native { label: String, call: NativeCall },
}

impl Work {
    pub fn command(line: impl Into<CommandLine>) -> Self {
        Work::Command(line.into())
    }

    pub fn native<F>(label: impl Into<String>, call: F) -> Self
    where
        F: FnOnce() -> NativeOutcome + Send + 'static,
    {
        Work::Native {
            label: label.into(),
            call: Box::new(call),
        }
    }

    /// Command text or native-call label, for logs
    pub fn describe(&self) -> &str {
        match self {
            Work::Command(line) => line.as_str(),
            Work::Native { label, .. } => label,
        }
    }
}

impl fmt::Debug for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Work::Command(line) => f.debug_tuple("Command").field(line).finish(),
            Work::Native { label, .. } => f
                .debug_struct("Native")
                .field("label", label)
                .finish_non_exhaustive(),
        }
    }
}
