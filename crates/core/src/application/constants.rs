// Polling constants (no magic values)
use std::time::Duration;

/// Bounded wait per attempt inside blocking waits, and the minimum pacing between
/// `Pending` attempts (20ms)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Default bound for a caller-driven `ready()` (100ms)
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_millis(100);

/// Bytes read from an output pipe per attempt
pub const READ_CHUNK_SIZE: usize = 8192;

/// Environment variable prefix for settings overrides
pub const ENV_PREFIX: &str = "SPAWNWATCH";
