//! Process execution events

use serde::{Deserialize, Serialize};

use super::FailureContext;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PlatformEvent {
    ProcessExecutionStarted {
        command: String,
        args: Vec<String>,
        working_dir: Option<String>,
    },

    ProcessExecutionCompleted {
        command: String,
        exit_code: Option<i32>,
        duration_ms: u64,
    },

    ProcessExecutionFailed {
        command: String,
        failure: FailureContext,
        duration_ms: u64,
    },
}
