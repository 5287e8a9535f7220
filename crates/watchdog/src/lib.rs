#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Service lifecycle watchdog for vernal
//!
//! Follows the installer's state and keeps the worker service in step with
//! it: `Complete` starts the service, `LoggedOut` stops it. When the
//! application shuts down the service is stopped regardless of state.
//!
//! Failures are reported and swallowed. Nothing flows back into the
//! installer, so a failed Stop never blocks a later Start.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vernal_errors::Error;
use vernal_events::{
    AppEvent, ErrorReporter, EventEmitter, EventSender, FailureContext, ServiceEvent,
};
use vernal_platform::ServiceController;
use vernal_state::Subscription;
use vernal_types::{InstallState, ServiceCommand};

/// Where and for whom service commands run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchdogConfig {
    /// Working directory of Start
    pub installation_dir: PathBuf,
    /// Working directory of Stop; must outlive the installation directory
    pub scratch_dir: PathBuf,
    /// User whose service domain is targeted
    pub user: u32,
}

/// Keeps the worker service in step with the installation state
pub struct ServiceWatchdog {
    controller: Arc<dyn ServiceController>,
    reporter: Arc<dyn ErrorReporter>,
    events: Option<EventSender>,
    config: WatchdogConfig,
}

impl ServiceWatchdog {
    pub fn new(
        controller: Arc<dyn ServiceController>,
        reporter: Arc<dyn ErrorReporter>,
        config: WatchdogConfig,
    ) -> Self {
        Self {
            controller,
            reporter,
            events: None,
            config,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.events = Some(tx);
        self
    }

    /// Service command a state calls for
    #[must_use]
    pub fn command_for(state: &InstallState) -> Option<ServiceCommand> {
        match state {
            InstallState::Complete => Some(ServiceCommand::Start),
            InstallState::LoggedOut => Some(ServiceCommand::Stop),
            InstallState::InProgress(_) => None,
        }
    }

    fn working_dir(&self, command: ServiceCommand) -> &Path {
        match command {
            ServiceCommand::Start => &self.config.installation_dir,
            ServiceCommand::Stop => &self.config.scratch_dir,
        }
    }

    /// Issue `command`, reporting any failure instead of returning it.
    pub async fn launch(&self, command: ServiceCommand) {
        let working_dir = self.working_dir(command);
        self.emit(AppEvent::Service(ServiceEvent::CommandIssued {
            command,
            working_dir: working_dir.display().to_string(),
        }));

        match self
            .controller
            .run(command, self.config.user, working_dir)
            .await
        {
            Ok(()) => {
                tracing::debug!(%command, "service command succeeded");
                self.emit(AppEvent::Service(ServiceEvent::CommandSucceeded { command }));
            }
            Err(e) => {
                tracing::warn!(%command, error = %e, "service command failed");
                let error = Error::from(e);
                self.emit(AppEvent::Service(ServiceEvent::CommandFailed {
                    command,
                    failure: FailureContext::from_error(&error),
                }));
                self.reporter.report(&error);
            }
        }
    }

    /// Follow `states` until `shutdown` fires, then stop the service.
    ///
    /// The first value of a subscription is the state current at
    /// subscription time, so the service is brought in line immediately.
    pub async fn run(self, mut states: Subscription<InstallState>, shutdown: CancellationToken) {
        loop {
            let state = tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                state = states.recv() => state,
            };
            match state {
                Some(state) => {
                    if let Some(command) = Self::command_for(&state) {
                        self.launch(command).await;
                    }
                }
                None => {
                    // The installer is gone; only shutdown is left to handle.
                    shutdown.cancelled().await;
                    break;
                }
            }
        }

        self.launch(ServiceCommand::Stop).await;
        self.emit(AppEvent::Service(ServiceEvent::WatchdogStopped));
    }

    /// Run the watchdog on its own task
    pub fn spawn(
        self,
        states: Subscription<InstallState>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(states, shutdown))
    }
}

impl EventEmitter for ServiceWatchdog {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}
