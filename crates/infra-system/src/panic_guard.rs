// Panic isolation for native calls
use std::any::Any;
use std::panic::{catch_unwind, UnwindSafe};

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed
    Success(T),
    /// Execution panicked; carries the panic message
    Panicked(String),
}

/// Execute a closure with panic isolation
///
/// A panicking native call must still complete its task (with the sentinel status)
/// instead of leaving the supervisor waiting on a dead worker. Reporting the panic is
/// left to the caller, which knows what was running.
///
/// # Example
/// ```text
/// match execute_guarded(|| risky()) {
///     PanicGuardResult::Success(v) => use_it(v),
///     PanicGuardResult::Panicked(msg) => eprintln!("caught: {msg}"),
/// }
/// ```
pub fn execute_guarded<F, T>(f: F) -> PanicGuardResult<T>
where
    F: FnOnce() -> T + UnwindSafe,
{
    catch_unwind(f).map_or_else(
        |payload| PanicGuardResult::Panicked(panic_message(payload.as_ref())),
        PanicGuardResult::Success,
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
