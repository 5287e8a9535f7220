//! Service manager control
//!
//! `ServiceController::run` hands a [`ServiceCommand`] to the OS service
//! manager. Exit codes in the command's ignore-set mean the service was
//! already in the requested state and count as success.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vernal_errors::PlatformError;
use vernal_events::{AppEvent, EventEmitter, EventSender, ServiceEvent};
use vernal_types::service::{DEFAULT_SERVICE_DESCRIPTOR, DEFAULT_SERVICE_LABEL};
use vernal_types::ServiceCommand;

use crate::context::PlatformContext;
use crate::process::ProcessOperations;

/// Start or stop the worker service for a user
#[async_trait]
pub trait ServiceController: Send + Sync {
    /// Run `command` for `user` with `working_dir` as the current directory.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::ServiceCommandFailed` for exit codes outside
    /// the command's ignore-set, or a process error if the tool cannot run.
    async fn run(
        &self,
        command: ServiceCommand,
        user: u32,
        working_dir: &Path,
    ) -> Result<(), PlatformError>;
}

/// `ServiceController` driving launchd through `launchctl`
pub struct LaunchctlController {
    process: Arc<dyn ProcessOperations>,
    context: PlatformContext,
    launchctl: PathBuf,
    label: String,
    descriptor: String,
}

impl LaunchctlController {
    pub fn new(process: Arc<dyn ProcessOperations>, launchctl: impl Into<PathBuf>) -> Self {
        Self {
            process,
            context: PlatformContext::default(),
            launchctl: launchctl.into(),
            label: DEFAULT_SERVICE_LABEL.to_string(),
            descriptor: DEFAULT_SERVICE_DESCRIPTOR.to_string(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Descriptor path passed to `bootstrap`; relative paths resolve against
    /// the working directory of the Start command.
    #[must_use]
    pub fn with_descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.descriptor = descriptor.into();
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.context = PlatformContext::new(Some(tx));
        self
    }

    fn command_name(&self, command: ServiceCommand) -> String {
        format!("{} {}", self.launchctl.display(), command.verb())
    }
}

#[async_trait]
impl ServiceController for LaunchctlController {
    async fn run(
        &self,
        command: ServiceCommand,
        user: u32,
        working_dir: &Path,
    ) -> Result<(), PlatformError> {
        let mut cmd = self
            .process
            .create_command(&self.launchctl.display().to_string());
        cmd.arg(command.verb())
            .args(command.arguments(user, &self.label, &self.descriptor))
            .current_dir(working_dir);

        let output = self.process.execute_command(&self.context, cmd).await?;
        match output.exit_code {
            Some(0) => Ok(()),
            Some(code) if command.ignores(code) => {
                tracing::debug!(%command, exit_code = code, "service already in requested state");
                self.context
                    .emit(AppEvent::Service(ServiceEvent::CommandIgnored {
                        command,
                        exit_code: code,
                    }));
                Ok(())
            }
            Some(code) => Err(PlatformError::ServiceCommandFailed {
                command: self.command_name(command),
                exit_code: code,
                stderr: output.stderr_text(),
            }),
            None => Err(PlatformError::TerminatedBySignal {
                command: self.command_name(command),
            }),
        }
    }
}
