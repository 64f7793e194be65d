// Helper identifiers

use serde::{Deserialize, Serialize};

use super::command::CommandLine;

/// Program used when no desktop helper is available
pub const FALLBACK_PROGRAM: &str = "echo";

/// Desktop dialog helpers, highest priority first
const DESKTOP_HELPERS: [&str; 4] = ["zenity", "matedialog", "qarma", "kdialog"];

/// Identifier of one external helper program
///
/// The set of identifiers is fixed by whoever constructs the capability cache;
/// the cache only stores presence per identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HelperId(String);

impl HelperId {
    pub fn new(program: impl Into<String>) -> Self {
        Self(program.into())
    }

    pub fn program(&self) -> &str {
        &self.0
    }

    /// Command whose exit status is 0 iff the helper is on `PATH`
    pub fn probe_command(&self) -> CommandLine {
        #[cfg(windows)]
        {
            CommandLine::raw(format!("where {} >NUL 2>NUL", self.0))
        }

        #[cfg(not(windows))]
        {
            CommandLine::program("which")
                .arg(&self.0)
                .redirect("2>/dev/null")
        }
    }

    /// zenity, matedialog, qarma, kdialog - in that priority order
    pub fn desktop_defaults() -> Vec<HelperId> {
        DESKTOP_HELPERS.iter().map(|p| HelperId::new(*p)).collect()
    }
}

impl std::fmt::Display for HelperId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HelperId {
    fn from(program: &str) -> Self {
        Self::new(program)
    }
}
