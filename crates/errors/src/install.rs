//! Installation pipeline error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstallError {
    /// The login round-trip worked but the server refused the credentials.
    #[error("{message}")]
    ServerRejected { message: String },

    #[error("download failed: {message}")]
    DownloadFailed { message: String },

    #[error("Failed to install with exit code: {exit_code}")]
    ArchiveFailed { exit_code: i32, diagnostics: String },

    #[error("failed to write configuration to {path}: {message}")]
    ConfigWriteFailed { path: String, message: String },

    #[error("filesystem operation failed: {operation} on {path}: {message}")]
    FilesystemError {
        operation: String,
        path: String,
        message: String,
    },

    #[error("installation already in progress")]
    AlreadyInProgress,

    #[error("installation cancelled by user")]
    Cancelled,
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::ServerRejected { message } => Cow::Borrowed(message.as_str()),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_detail(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::ArchiveFailed { diagnostics, .. } => Some(Cow::Borrowed(diagnostics.as_str())),
            _ => None,
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ServerRejected { .. } => Some("Check your email and password."),
            Self::DownloadFailed { .. } => Some("Retry the installation."),
            Self::ArchiveFailed { .. } => {
                Some("The downloaded archive could not be installed; contact support if this persists.")
            }
            Self::ConfigWriteFailed { .. } | Self::FilesystemError { .. } => {
                Some("Ensure the installation directory is writable.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::DownloadFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::ServerRejected { .. } => "install.server_rejected",
            Self::DownloadFailed { .. } => "install.download_failed",
            Self::ArchiveFailed { .. } => "install.archive_failed",
            Self::ConfigWriteFailed { .. } => "install.config_write_failed",
            Self::FilesystemError { .. } => "install.filesystem",
            Self::AlreadyInProgress => "install.in_progress",
            Self::Cancelled => "install.cancelled",
        })
    }
}
