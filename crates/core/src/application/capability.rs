// Capability Cache
// Lazily-populated, explicitly invalidatable record of which helpers are present
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{HelperId, FALLBACK_PROGRAM};
use crate::port::HelperProbe;

/// How a scan walks the helper list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPolicy {
    /// Probe every helper
    #[default]
    All,
    /// Stop at the first present helper; later helpers are recorded as absent
    FirstMatch,
}

/// Result of one complete scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySnapshot {
    order: Vec<HelperId>,
    available: BTreeMap<HelperId, bool>,
}

impl CapabilitySnapshot {
    /// Presence of `helper`; unknown identifiers are absent
    pub fn is_available(&self, helper: &HelperId) -> bool {
        self.available.get(helper).copied().unwrap_or(false)
    }

    /// First present helper in priority order
    pub fn preferred(&self) -> Option<&HelperId> {
        self.order.iter().find(|h| self.is_available(h))
    }

    /// (helper, present) pairs in priority order
    pub fn iter(&self) -> impl Iterator<Item = (&HelperId, bool)> + '_ {
        self.order.iter().map(move |h| (h, self.is_available(h)))
    }
}

/// Capability cache
///
/// Constructed explicitly and shared by reference (or `Arc`). The first query runs one scan;
/// the scan holds the cache lock, so concurrent first queries wait for it instead of starting
/// their own. `rescan()` drops the snapshot and the next query rebuilds it as a whole.
pub struct CapabilityCache {
    probe: Arc<dyn HelperProbe>,
    helpers: Vec<HelperId>,
    policy: ScanPolicy,
    snapshot: Mutex<Option<Arc<CapabilitySnapshot>>>,
    scans: AtomicU64,
}

impl CapabilityCache {
    /// Create an unscanned cache
    ///
    /// # Arguments
    /// * `probe` - Presence check run once per helper per scan
    /// * `helpers` - The fixed helper set, highest priority first
    pub fn new(probe: Arc<dyn HelperProbe>, helpers: Vec<HelperId>) -> Self {
        Self {
            probe,
            helpers,
            policy: ScanPolicy::All,
            snapshot: Mutex::new(None),
            scans: AtomicU64::new(0),
        }
    }

    pub fn with_policy(mut self, policy: ScanPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn helpers(&self) -> &[HelperId] {
        &self.helpers
    }

    /// Whether a snapshot is currently cached
    pub fn is_scanned(&self) -> bool {
        self.lock().is_some()
    }

    /// Number of scans run since construction
    pub fn scan_count(&self) -> u64 {
        self.scans.load(Ordering::SeqCst)
    }

    /// Cached presence of `helper`, scanning first if needed
    pub fn is_available(&self, helper: &HelperId) -> bool {
        self.snapshot().is_available(helper)
    }

    /// First available helper in priority order
    pub fn preferred(&self) -> Option<HelperId> {
        self.snapshot().preferred().cloned()
    }

    /// Program to launch for dialogs: the preferred helper, or `echo` when none is present
    pub fn preferred_program(&self) -> String {
        self.preferred()
            .map(|h| h.program().to_string())
            .unwrap_or_else(|| FALLBACK_PROGRAM.to_string())
    }

    /// Current snapshot, scanning first if needed
    pub fn snapshot(&self) -> Arc<CapabilitySnapshot> {
        let mut guard = self.lock();
        if let Some(snapshot) = guard.as_ref() {
            return Arc::clone(snapshot);
        }

        let fresh = Arc::new(self.scan());
        *guard = Some(Arc::clone(&fresh));
        fresh
    }

    /// Forget the snapshot; the next query probes every helper again
    ///
    /// Waits for an in-flight scan, so the scan it invalidates is always a finished one.
    pub fn rescan(&self) {
        let mut guard = self.lock();
        *guard = None;
        info!("Capability snapshot invalidated");
    }

    // Runs with the snapshot lock held
    fn scan(&self) -> CapabilitySnapshot {
        let scan_no = self.scans.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(scan = scan_no, helpers = self.helpers.len(), policy = ?self.policy, "Scanning helpers");

        let mut available = BTreeMap::new();
        let mut matched = false;
        for helper in &self.helpers {
            let present = if matched && self.policy == ScanPolicy::FirstMatch {
                false
            } else {
                self.probe.probe(helper)
            };
            matched |= present;
            debug!(helper = %helper, present, "Helper probed");
            available.insert(helper.clone(), present);
        }

        let snapshot = CapabilitySnapshot {
            order: self.helpers.clone(),
            available,
        };
        info!(
            scan = scan_no,
            preferred = ?snapshot.preferred().map(HelperId::program),
            "Helper scan complete"
        );
        snapshot
    }

    // A probe that panicked mid-scan leaves `None` behind, which is a valid state
    fn lock(&self) -> MutexGuard<'_, Option<Arc<CapabilitySnapshot>>> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
