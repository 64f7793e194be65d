// Port Layer - Interfaces for platform-specific collaborators

pub mod event_dispatcher;
pub mod helper_probe;
pub mod pollable;
pub mod work_launcher;

// Re-exports
pub use event_dispatcher::{EventDispatcher, NoopDispatcher};
pub use helper_probe::HelperProbe;
pub use pollable::{PollOutcome, Pollable};
pub use work_launcher::{SpawnError, WorkLauncher};
