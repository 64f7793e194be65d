// Process-wide capability cache for callers that do not inject their own
use std::sync::{Arc, OnceLock};

use spawnwatch_core::application::{CapabilityCache, SupervisedProbe};
use spawnwatch_core::domain::HelperId;

use crate::launcher::SystemLauncher;

static SHARED_CAPABILITIES: OnceLock<CapabilityCache> = OnceLock::new();

/// Process-wide cache over the desktop helper set, probed through `SystemLauncher`
///
/// Built on first use; scanning still happens lazily on the first query.
/// Tests and embedders that need isolation should construct their own `CapabilityCache`.
pub fn shared_capabilities() -> &'static CapabilityCache {
    SHARED_CAPABILITIES.get_or_init(|| {
        let probe = SupervisedProbe::new(Arc::new(SystemLauncher::new()));
        CapabilityCache::new(Arc::new(probe), HelperId::desktop_defaults())
    })
}
