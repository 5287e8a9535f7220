//! Installation state machine values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress of an in-flight installation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressInfo {
    /// Units processed so far (bytes while downloading)
    pub completed_units: u64,
    /// Total units, `None` while the size is unknown
    pub total_units: Option<u64>,
    /// Whether the attempt can still be cancelled by the user
    pub cancellable: bool,
}

impl ProgressInfo {
    /// Indeterminate progress used while logging in
    #[must_use]
    pub fn indeterminate() -> Self {
        Self {
            completed_units: 0,
            total_units: None,
            cancellable: true,
        }
    }

    /// Determinate (or open-ended) progress
    #[must_use]
    pub fn new(completed_units: u64, total_units: Option<u64>) -> Self {
        Self {
            completed_units,
            total_units,
            cancellable: true,
        }
    }

    #[must_use]
    pub fn is_indeterminate(&self) -> bool {
        self.total_units.is_none_or(|total| total == 0)
    }

    /// Completed fraction in `0.0..=1.0`, `None` when indeterminate
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> Option<f64> {
        match self.total_units {
            Some(total) if total > 0 => {
                Some((self.completed_units.min(total) as f64) / (total as f64))
            }
            _ => None,
        }
    }
}

impl Default for ProgressInfo {
    fn default() -> Self {
        Self::indeterminate()
    }
}

/// Observable state of the installation orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "progress", rename_all = "snake_case")]
pub enum InstallState {
    /// No installation present; credentials are required
    LoggedOut,
    /// An attempt is running
    InProgress(ProgressInfo),
    /// The distribution is installed
    Complete,
}

impl InstallState {
    /// Initial state derived from the persisted completion flag
    #[must_use]
    pub fn from_completion_flag(complete: bool) -> Self {
        if complete {
            Self::Complete
        } else {
            Self::LoggedOut
        }
    }

    #[must_use]
    pub fn progress(&self) -> Option<&ProgressInfo> {
        match self {
            Self::InProgress(progress) => Some(progress),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress(_))
    }
}

impl Default for InstallState {
    fn default() -> Self {
        Self::LoggedOut
    }
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoggedOut => write!(f, "logged out"),
            Self::InProgress(progress) => match progress.total_units {
                Some(total) if total > 0 => {
                    write!(f, "in progress ({}/{total})", progress.completed_units)
                }
                _ => write!(f, "in progress"),
            },
            Self::Complete => write!(f, "complete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_from_flag() {
        assert_eq!(InstallState::from_completion_flag(true), InstallState::Complete);
        assert_eq!(InstallState::from_completion_flag(false), InstallState::LoggedOut);
    }

    #[test]
    fn test_progress_fraction() {
        assert_eq!(ProgressInfo::indeterminate().fraction(), None);
        assert_eq!(ProgressInfo::new(5, Some(10)).fraction(), Some(0.5));
        assert_eq!(ProgressInfo::new(15, Some(10)).fraction(), Some(1.0));
        assert!(ProgressInfo::new(3, Some(0)).is_indeterminate());
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&InstallState::Complete).unwrap();
        assert_eq!(json, r#"{"state":"complete"}"#);

        let busy = InstallState::InProgress(ProgressInfo::new(1, Some(2)));
        let json = serde_json::to_string(&busy).unwrap();
        assert!(json.contains(r#""completedUnits":1"#));
    }
}
