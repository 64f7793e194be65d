// Helper Probe Port
// Answers "is this helper installed?" for one identifier at a time

use crate::domain::HelperId;

/// Helper probe trait
///
/// Probes are expensive (they spawn a process); the capability cache calls them at most
/// once per helper per scan.
#[cfg_attr(test, mockall::automock)]
pub trait HelperProbe: Send + Sync {
    /// True if `helper` is present
    fn probe(&self, helper: &HelperId) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Probe with a fixed set of present helpers that records how often each was probed
    pub struct CountingProbe {
        present: HashSet<HelperId>,
        delay: Duration,
        calls: Mutex<HashMap<HelperId, usize>>,
    }

    impl CountingProbe {
        pub fn new<I, S>(present: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<HelperId>,
        {
            Self {
                present: present.into_iter().map(Into::into).collect(),
                delay: Duration::ZERO,
                calls: Mutex::new(HashMap::new()),
            }
        }

        /// Make each probe take `delay`, to widen race windows in tests
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn calls_for(&self, helper: &HelperId) -> usize {
            self.calls
                .lock()
                .unwrap()
                .get(helper)
                .copied()
                .unwrap_or(0)
        }

        pub fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().values().sum()
        }
    }

    impl HelperProbe for CountingProbe {
        fn probe(&self, helper: &HelperId) -> bool {
            *self
                .calls
                .lock()
                .unwrap()
                .entry(helper.clone())
                .or_insert(0) += 1;

            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            self.present.contains(helper)
        }
    }
}
