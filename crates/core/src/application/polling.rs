// Readiness-polling timeout policy

use std::time::{Duration, Instant};

use super::constants::{DEFAULT_POLL_INTERVAL, DEFAULT_READY_TIMEOUT};
use super::settings::Settings;

/// Timing policy shared by supervisors
///
/// Timeouts are per poll attempt, never per task: a task with no natural end keeps a
/// blocking wait going forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Bound of each attempt made by blocking waits
    pub poll_interval: Duration,
    /// Bound used by callers that poll with the policy default
    pub ready_timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}

impl PollPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            ready_timeout: Duration::from_millis(settings.ready_timeout_ms),
        }
    }

    /// Sleep out the remainder of one interval after a `Pending` attempt
    /// that returned early, so blocking waits never spin.
    pub(crate) fn pace(&self, attempt_started: Instant) {
        let elapsed = attempt_started.elapsed();
        if elapsed < self.poll_interval {
            std::thread::sleep(self.poll_interval - elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pace_fills_interval() {
        let policy = PollPolicy {
            poll_interval: Duration::from_millis(30),
            ready_timeout: Duration::ZERO,
        };
        let started = Instant::now();
        policy.pace(started);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_pace_skips_when_interval_spent() {
        let policy = PollPolicy {
            poll_interval: Duration::from_millis(5),
            ready_timeout: Duration::ZERO,
        };
        let started = Instant::now() - Duration::from_millis(50);
        let before = Instant::now();
        policy.pace(started);
        assert!(before.elapsed() < Duration::from_millis(5));
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            poll_interval_ms: 7,
            ready_timeout_ms: 250,
            ..Settings::default()
        };
        let policy = PollPolicy::from_settings(&settings);
        assert_eq!(policy.poll_interval, Duration::from_millis(7));
        assert_eq!(policy.ready_timeout, Duration::from_millis(250));
    }
}
