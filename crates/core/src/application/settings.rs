// Runtime settings (deserialized by the composition root)

use serde::Deserialize;

use super::capability::ScanPolicy;
use super::constants::{DEFAULT_POLL_INTERVAL, DEFAULT_READY_TIMEOUT};
use crate::domain::HelperId;
use crate::error::{AppError, Result};

/// Settings for supervisors and the capability cache
///
/// Every field has a default, so an empty source deserializes cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Per-attempt bound inside blocking waits (ms)
    pub poll_interval_ms: u64,
    /// Default `ready()` bound for caller-driven polling (ms)
    pub ready_timeout_ms: u64,
    /// Log every launched command at info level
    pub verbose: bool,
    pub scan_policy: ScanPolicy,
    /// Known helpers, highest priority first
    pub helpers: Vec<HelperId>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            ready_timeout_ms: DEFAULT_READY_TIMEOUT.as_millis() as u64,
            verbose: false,
            scan_policy: ScanPolicy::All,
            helpers: HelperId::desktop_defaults(),
        }
    }
}

impl Settings {
    /// Reject values that would make blocking waits spin or the cache meaningless
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(AppError::Config(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.helpers.is_empty() {
            return Err(AppError::Config(
                "helpers must list at least one helper".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let settings = Settings {
            poll_interval_ms: 0,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_partial_source_keeps_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"verbose": true, "scan_policy": "first_match"}"#).unwrap();
        assert!(settings.verbose);
        assert_eq!(settings.scan_policy, ScanPolicy::FirstMatch);
        assert_eq!(settings.poll_interval_ms, 20);
        assert_eq!(settings.helpers.len(), 4);
    }
}
