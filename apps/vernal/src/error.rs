//! CLI error handling

use std::fmt;

use vernal_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(vernal_errors::ConfigError),
    /// Error returned by a library crate
    Ops(vernal_errors::Error),
    /// System setup error
    Setup(String),
    /// Installation attempt failed; the failure already went through the reporter
    Reported(vernal_errors::Error),
    /// I/O error
    Io(std::io::Error),
}

impl CliError {
    /// Whether the error was already shown to the user through the event stream
    pub fn already_shown(&self) -> bool {
        matches!(self, CliError::Reported(_))
    }

    /// Underlying domain error, if there is one
    pub fn domain_error(&self) -> Option<&vernal_errors::Error> {
        match self {
            CliError::Ops(e) | CliError::Reported(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {e}"),
            CliError::Ops(e) | CliError::Reported(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(detail) = e.user_detail() {
                    write!(f, "\n  {detail}")?;
                }
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::Setup(msg) => write!(f, "System setup error: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Ops(e) | CliError::Reported(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::Setup(_) => None,
        }
    }
}

impl From<vernal_errors::ConfigError> for CliError {
    fn from(e: vernal_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<vernal_errors::Error> for CliError {
    fn from(e: vernal_errors::Error) -> Self {
        CliError::Ops(e)
    }
}

impl From<vernal_errors::PlatformError> for CliError {
    fn from(e: vernal_errors::PlatformError) -> Self {
        CliError::Ops(e.into())
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
