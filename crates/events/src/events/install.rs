use serde::{Deserialize, Serialize};
use vernal_types::InstallState;

use super::FailureContext;

/// Lifecycle of an installation attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstallEvent {
    LoginStarted {
        server: String,
        username: String,
    },

    LoginSucceeded {
        version: String,
        organization: String,
    },

    LoginRejected {
        message: String,
    },

    ConfigWritten {
        path: String,
        entries: usize,
    },

    ArchiveInstalling {
        archive: String,
        destination: String,
    },

    Completed {
        version: String,
        destination: String,
    },

    Failed {
        failure: FailureContext,
    },

    Cancelled,

    /// Completion flag cleared; the payload stays on disk
    Uninstalled,

    StateChanged {
        state: InstallState,
    },
}
