//! Platform-specific operation errors

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Errors that can occur while driving external processes and the service manager
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlatformError {
    #[error("process execution failed: {command} - {message}")]
    ProcessExecutionFailed { command: String, message: String },

    #[error("service command `{command}` failed with exit code {exit_code}")]
    ServiceCommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("process terminated by signal: {command}")]
    TerminatedBySignal { command: String },

    #[error("command not found: {command}")]
    CommandNotFound { command: String },

    #[error("permission denied: {operation} - {message}")]
    PermissionDenied { operation: String, message: String },
}

impl UserFacingError for PlatformError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_detail(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::ServiceCommandFailed { stderr, .. } if !stderr.is_empty() => {
                Some(Cow::Borrowed(stderr.as_str()))
            }
            _ => None,
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::CommandNotFound { .. } => Some("Ensure the required system tool is installed."),
            Self::PermissionDenied { .. } => Some("Run the command as the logged-in user."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::ProcessExecutionFailed { .. } => "platform.process",
            Self::ServiceCommandFailed { .. } => "platform.service_command",
            Self::TerminatedBySignal { .. } => "platform.signal",
            Self::CommandNotFound { .. } => "platform.command_not_found",
            Self::PermissionDenied { .. } => "platform.permission_denied",
        })
    }
}
