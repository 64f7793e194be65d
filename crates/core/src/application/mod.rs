// Application Layer - Supervision and capability services

pub mod capability;
pub mod constants;
pub mod polling;
pub mod probe;
pub mod settings;
pub mod supervisor;

// Re-exports
pub use capability::{CapabilityCache, CapabilitySnapshot, ScanPolicy};
pub use polling::PollPolicy;
pub use probe::SupervisedProbe;
pub use settings::Settings;
pub use supervisor::TaskSupervisor;
