// spawnwatch Infrastructure - System Adapters
// Implements: WorkLauncher, Pollable (subprocess, native call)

pub mod launcher;
pub mod native_call;
pub mod panic_guard;
pub mod shared;
pub mod subprocess;

pub use launcher::SystemLauncher;
pub use native_call::NativeCallUnit;
pub use shared::shared_capabilities;
pub use subprocess::SubprocessUnit;
