// Helper presence probe that runs through a TaskSupervisor
use std::sync::Arc;

use tracing::debug;

use super::polling::PollPolicy;
use super::supervisor::TaskSupervisor;
use crate::domain::{HelperId, Work};
use crate::port::{HelperProbe, WorkLauncher};

/// Probes a helper by running its probe command to completion
///
/// Present iff the command exits with status 0. A probe that cannot be launched
/// reports the helper as absent.
pub struct SupervisedProbe {
    launcher: Arc<dyn WorkLauncher>,
    policy: PollPolicy,
}

impl SupervisedProbe {
    pub fn new(launcher: Arc<dyn WorkLauncher>) -> Self {
        Self {
            launcher,
            policy: PollPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl HelperProbe for SupervisedProbe {
    fn probe(&self, helper: &HelperId) -> bool {
        let mut task = TaskSupervisor::new(Arc::clone(&self.launcher)).with_policy(self.policy);
        // Launch failure leaves a sentinel result, which reads as "absent" below
        let _ = task.start(Work::command(helper.probe_command()));
        let out = task.result();

        debug!(helper = %helper, status = out.status, "Probe finished");
        out.succeeded()
    }
}
