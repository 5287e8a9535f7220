//! Service manager commands

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default launchd label of the worker service
pub const DEFAULT_SERVICE_LABEL: &str = "sparta_science.vernal_falls";
/// Default launchd descriptor, resolved relative to the installation directory
pub const DEFAULT_SERVICE_DESCRIPTOR: &str = "sparta_science.vernal_falls.plist";

/// Command sent to the OS service manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCommand {
    Start,
    Stop,
}

impl ServiceCommand {
    /// launchctl verb for this command
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            Self::Start => "bootstrap",
            Self::Stop => "bootout",
        }
    }

    /// Arguments following the verb for the given user domain.
    #[must_use]
    pub fn arguments(self, user: u32, label: &str, descriptor: &str) -> Vec<String> {
        match self {
            Self::Start => vec![format!("gui/{user}"), descriptor.to_string()],
            Self::Stop => vec![format!("gui/{user}/{label}")],
        }
    }

    /// Exit codes that mean the service is already in the requested state
    #[must_use]
    pub fn ignored_exit_codes(self) -> &'static [i32] {
        match self {
            Self::Start => &[libc::EALREADY],
            Self::Stop => &[libc::ESRCH, libc::EINPROGRESS],
        }
    }

    #[must_use]
    pub fn ignores(self, exit_code: i32) -> bool {
        self.ignored_exit_codes().contains(&exit_code)
    }
}

impl fmt::Display for ServiceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Stop => write!(f, "stop"),
        }
    }
}
