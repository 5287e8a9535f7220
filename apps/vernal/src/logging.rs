//! Structured logging integration for events
//!
//! Every event that reaches the CLI is also written to the tracing
//! subscriber, with the event metadata and domain fields as structured
//! fields, so a `--debug` log file holds the full attempt history.

use vernal_events::{
    AppEvent, DownloadEvent, EventMessage, GeneralEvent, InstallEvent, PlatformEvent, ServiceEvent,
};
use tracing::{debug, error, info, warn};

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(message: &EventMessage) {
    let meta = &message.meta;
    let source = meta.source.as_str();
    let correlation = meta.correlation_id.as_deref().unwrap_or("-");

    match &message.event {
        AppEvent::General(general) => match general {
            GeneralEvent::Warning { message, context } => {
                warn!(source, event_id = %meta.event_id, context = ?context, "{message}");
            }
            GeneralEvent::Error { message, details } => {
                error!(source, event_id = %meta.event_id, details = ?details, "{message}");
            }
            GeneralEvent::DebugLog { message, context } => {
                debug!(source, event_id = %meta.event_id, context = ?context, "{message}");
            }
            GeneralEvent::OperationStarted { operation } => {
                info!(source, operation = %operation, "Operation started");
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                info!(source, operation = %operation, success, "Operation completed");
            }
            GeneralEvent::OperationFailed { operation, failure } => {
                error!(
                    source,
                    operation = %operation,
                    code = ?failure.code,
                    message = %failure.message,
                    "Operation failed"
                );
            }
        },

        AppEvent::Download(download) => match download {
            DownloadEvent::Started { url, total_bytes } => {
                info!(source, correlation, url = %url, total_bytes = ?total_bytes, "Download started");
            }
            DownloadEvent::Progress {
                url,
                bytes_downloaded,
                total_bytes,
            } => {
                debug!(
                    source,
                    correlation,
                    url = %url,
                    bytes_downloaded,
                    total_bytes = ?total_bytes,
                    "Download progress"
                );
            }
            DownloadEvent::Completed {
                url,
                bytes_downloaded,
                hash,
            } => {
                info!(
                    source,
                    correlation,
                    url = %url,
                    bytes_downloaded,
                    hash = %hash,
                    "Download completed"
                );
            }
            DownloadEvent::Failed { url, failure } => {
                error!(
                    source,
                    correlation,
                    url = %url,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    "Download failed"
                );
            }
            DownloadEvent::Cancelled {
                url,
                bytes_downloaded,
            } => {
                info!(source, correlation, url = %url, bytes_downloaded, "Download cancelled");
            }
        },

        AppEvent::Install(install) => match install {
            InstallEvent::LoginStarted { server, username } => {
                info!(source, correlation, server = %server, username = %username, "Login started");
            }
            InstallEvent::LoginSucceeded {
                version,
                organization,
            } => {
                info!(
                    source,
                    correlation,
                    version = %version,
                    organization = %organization,
                    "Login succeeded"
                );
            }
            InstallEvent::LoginRejected { message } => {
                warn!(source, correlation, message = %message, "Login rejected");
            }
            InstallEvent::ConfigWritten { path, entries } => {
                info!(source, correlation, path = %path, entries, "Service configuration written");
            }
            InstallEvent::ArchiveInstalling {
                archive,
                destination,
            } => {
                info!(
                    source,
                    correlation,
                    archive = %archive,
                    destination = %destination,
                    "Installing archive"
                );
            }
            InstallEvent::Completed {
                version,
                destination,
            } => {
                info!(
                    source,
                    correlation,
                    version = %version,
                    destination = %destination,
                    "Installation completed"
                );
            }
            InstallEvent::Failed { failure } => {
                error!(
                    source,
                    correlation,
                    code = ?failure.code,
                    message = %failure.message,
                    detail = ?failure.detail,
                    "Installation failed"
                );
            }
            InstallEvent::Cancelled => info!(source, correlation, "Installation cancelled"),
            InstallEvent::Uninstalled => info!(source, "Installation forgotten"),
            InstallEvent::StateChanged { state } => {
                debug!(source, correlation, state = %state, "Install state changed");
            }
        },

        AppEvent::Service(service) => match service {
            ServiceEvent::CommandIssued {
                command,
                working_dir,
            } => {
                info!(source, command = %command, working_dir = %working_dir, "Service command issued");
            }
            ServiceEvent::CommandSucceeded { command } => {
                info!(source, command = %command, "Service command succeeded");
            }
            ServiceEvent::CommandIgnored { command, exit_code } => {
                debug!(source, command = %command, exit_code, "Service already in requested state");
            }
            ServiceEvent::CommandFailed { command, failure } => {
                error!(
                    source,
                    command = %command,
                    message = %failure.message,
                    detail = ?failure.detail,
                    "Service command failed"
                );
            }
            ServiceEvent::WatchdogStopped => info!(source, "Service watchdog stopped"),
        },

        AppEvent::Platform(platform) => match platform {
            PlatformEvent::ProcessExecutionStarted {
                command,
                args,
                working_dir,
            } => {
                debug!(
                    source,
                    command = %command,
                    args = ?args,
                    working_dir = ?working_dir,
                    "Process started"
                );
            }
            PlatformEvent::ProcessExecutionCompleted {
                command,
                exit_code,
                duration_ms,
            } => {
                debug!(source, command = %command, exit_code = ?exit_code, duration_ms, "Process finished");
            }
            PlatformEvent::ProcessExecutionFailed {
                command,
                failure,
                duration_ms,
            } => {
                warn!(
                    source,
                    command = %command,
                    message = %failure.message,
                    duration_ms,
                    "Process could not be run"
                );
            }
        },
    }
}
