// Domain Layer - Tasks, work items, helper identifiers

pub mod command;
pub mod helper;
pub mod task;
pub mod work;

// Re-exports
pub use command::{powershell_quote, shell_quote, CommandLine};
pub use helper::{HelperId, FALLBACK_PROGRAM};
pub use task::{TaskOutput, TaskState, SENTINEL_STATUS};
pub use work::{NativeCall, NativeOutcome, Work};
