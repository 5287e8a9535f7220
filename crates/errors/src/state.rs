//! Persisted state error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateError {
    #[error("failed to read preferences from {path}: {message}")]
    PreferencesRead { path: String, message: String },

    #[error("failed to write preferences to {path}: {message}")]
    PreferencesWrite { path: String, message: String },

    #[error("preferences corrupted at {path}: {message}")]
    PreferencesCorrupted { path: String, message: String },
}
