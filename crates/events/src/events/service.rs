use serde::{Deserialize, Serialize};
use vernal_types::ServiceCommand;

use super::FailureContext;

/// Service manager commands issued by the watchdog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServiceEvent {
    CommandIssued {
        command: ServiceCommand,
        working_dir: String,
    },

    CommandSucceeded {
        command: ServiceCommand,
    },

    /// Non-zero exit that means the service was already in the requested state
    CommandIgnored {
        command: ServiceCommand,
        exit_code: i32,
    },

    CommandFailed {
        command: ServiceCommand,
        failure: FailureContext,
    },

    WatchdogStopped,
}
