//! Event handling and progress display

use console::{Style, Term};
use vernal_events::{AppEvent, EventMessage, GeneralEvent, InstallEvent, ServiceEvent};
use vernal_types::{InstallState, ServiceCommand};

use crate::display::format_size;
use crate::logging::log_event_with_tracing;

/// Event handler for progress display and user feedback
pub struct EventHandler {
    /// Terminal progress and status lines go to
    term: Term,
    colors_enabled: bool,
    /// Show process and download chatter as well
    debug: bool,
    /// Machine output: log only, render nothing
    quiet: bool,
    /// A progress line is on screen and must be cleared before printing
    progress_visible: bool,
}

impl EventHandler {
    /// Create new event handler
    pub fn new(colors_enabled: bool, debug: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors_enabled,
            debug,
            quiet,
            progress_visible: false,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: EventMessage) {
        log_event_with_tracing(&message);
        if self.quiet {
            return;
        }

        match message.event {
            AppEvent::Install(event) => self.handle_install_event(event),
            AppEvent::Service(event) => self.handle_service_event(event),

            AppEvent::General(GeneralEvent::Error { message, details }) => {
                let text = match details {
                    Some(details) => format!("{message}\n  {details}"),
                    None => message,
                };
                self.show_error(&text);
            }
            AppEvent::General(GeneralEvent::Warning { message, .. }) => {
                self.show_warning(&message);
            }
            AppEvent::General(GeneralEvent::OperationStarted { operation }) => {
                self.show_status(&operation);
            }
            AppEvent::General(GeneralEvent::OperationCompleted { operation, success }) => {
                if success {
                    self.show_success(&operation);
                } else {
                    self.show_warning(&operation);
                }
            }

            other => {
                if self.debug {
                    self.show_debug(&format!("{other:?}"));
                }
            }
        }
    }

    fn handle_install_event(&mut self, event: InstallEvent) {
        match event {
            InstallEvent::LoginStarted { server, username } => {
                self.show_status(&format!("Logging in to {server} as {username}"));
            }
            InstallEvent::LoginSucceeded {
                version,
                organization,
            } => {
                self.show_status(&format!(
                    "Logged in to {organization}; installing Vernal Falls {version}"
                ));
            }
            InstallEvent::LoginRejected { message } => {
                // The rejection text reaches the user through the reporter.
                if self.debug {
                    self.show_debug(&format!("login rejected: {message}"));
                }
            }
            InstallEvent::ConfigWritten { path, entries } => {
                self.show_status(&format!("Wrote {entries} settings to {path}"));
            }
            InstallEvent::ArchiveInstalling { destination, .. } => {
                self.show_status(&format!("Unpacking into {destination}"));
            }
            InstallEvent::Completed { version, .. } => {
                self.show_success(&format!("Installed Vernal Falls {version}"));
            }
            InstallEvent::Failed { .. } => {
                // The reporter already printed the failure.
                self.clear_progress();
            }
            InstallEvent::Cancelled => self.show_warning("Installation cancelled"),
            InstallEvent::Uninstalled => self.show_success("Installation forgotten"),
            InstallEvent::StateChanged { state } => self.render_state(state),
        }
    }

    fn handle_service_event(&mut self, event: ServiceEvent) {
        match event {
            ServiceEvent::CommandSucceeded { command } => {
                let text = match command {
                    ServiceCommand::Start => "Service started",
                    ServiceCommand::Stop => "Service stopped",
                };
                self.show_status(text);
            }
            ServiceEvent::CommandIgnored { command, .. } => {
                let text = match command {
                    ServiceCommand::Start => "Service already running",
                    ServiceCommand::Stop => "Service not running",
                };
                self.show_status(text);
            }
            ServiceEvent::CommandFailed { command, failure } => {
                // Also reported as a general error; only note it in debug mode.
                if self.debug {
                    self.show_debug(&format!("{command} failed: {}", failure.message));
                }
            }
            ServiceEvent::CommandIssued {
                command,
                working_dir,
            } => {
                if self.debug {
                    self.show_debug(&format!("{command} in {working_dir}"));
                }
            }
            ServiceEvent::WatchdogStopped => {}
        }
    }

    /// Redraw the single progress line for an in-flight attempt
    fn render_state(&mut self, state: InstallState) {
        let Some(progress) = state.progress() else {
            self.clear_progress();
            return;
        };

        let line = match (progress.total_units, progress.fraction()) {
            (Some(total), Some(fraction)) => format!(
                "Downloading {} / {} ({:.0}%)",
                format_size(progress.completed_units),
                format_size(total),
                fraction * 100.0
            ),
            _ if progress.completed_units > 0 => {
                format!("Downloading {}", format_size(progress.completed_units))
            }
            _ => "Working...".to_string(),
        };

        if self.term.is_term() {
            let _ = self.term.clear_line();
            let _ = self.term.write_str(&self.style(Style::new().cyan(), &line));
            self.progress_visible = true;
        }
    }

    fn clear_progress(&mut self) {
        if self.progress_visible {
            let _ = self.term.clear_line();
            self.progress_visible = false;
        }
    }

    fn style(&self, style: Style, text: &str) -> String {
        if self.colors_enabled {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn print_line(&mut self, line: &str) {
        self.clear_progress();
        let _ = self.term.write_line(line);
    }

    fn show_status(&mut self, message: &str) {
        let line = format!("{} {message}", self.style(Style::new().blue(), "=>"));
        self.print_line(&line);
    }

    fn show_success(&mut self, message: &str) {
        let line = format!("{} {message}", self.style(Style::new().green().bold(), "[OK]"));
        self.print_line(&line);
    }

    fn show_warning(&mut self, message: &str) {
        let line = format!("{} {message}", self.style(Style::new().yellow(), "[WARN]"));
        self.print_line(&line);
    }

    fn show_error(&mut self, message: &str) {
        let line = format!("{} {message}", self.style(Style::new().red().bold(), "[ERROR]"));
        self.print_line(&line);
    }

    fn show_debug(&mut self, message: &str) {
        let line = self.style(Style::new().dim(), message);
        self.print_line(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vernal_events::EventMessage;
    use vernal_types::ProgressInfo;

    #[test]
    fn test_event_handler_accepts_every_domain() {
        let mut handler = EventHandler::new(false, true, false);

        handler.handle_event(EventMessage::from_event(AppEvent::Install(
            InstallEvent::StateChanged {
                state: InstallState::InProgress(ProgressInfo::new(512, Some(1024))),
            },
        )));
        handler.handle_event(EventMessage::from_event(AppEvent::Service(
            ServiceEvent::CommandIgnored {
                command: ServiceCommand::Stop,
                exit_code: 3,
            },
        )));
        handler.handle_event(EventMessage::from_event(AppEvent::General(
            GeneralEvent::error_with_details("Failed to install with exit code: 2", "tar: bad"),
        )));
        assert!(!handler.progress_visible);
    }

    #[test]
    fn test_quiet_handler_renders_nothing() {
        let mut handler = EventHandler::new(false, false, true);
        handler.handle_event(EventMessage::from_event(AppEvent::Install(
            InstallEvent::StateChanged {
                state: InstallState::InProgress(ProgressInfo::indeterminate()),
            },
        )));
        assert!(!handler.progress_visible);
    }
}
