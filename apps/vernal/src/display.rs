//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use serde::Serialize;
use std::io;
use vernal_types::{ColorChoice, InstallState};

use crate::error::CliError;

/// Final result of a command, rendered once the command returns
#[derive(Debug, Serialize)]
#[serde(tag = "result", content = "data", rename_all = "snake_case")]
pub enum CommandResult {
    Install(InstallReport),
    Status(StatusReport),
    Servers(Vec<ServerEntry>),
    Connection(ConnectionReport),
    Success(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallOutcome {
    /// Installed and supervised until interrupted
    Completed,
    Cancelled,
}

#[derive(Debug, Serialize)]
pub struct InstallReport {
    pub outcome: InstallOutcome,
    pub installation_dir: String,
    pub final_state: InstallState,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub state: InstallState,
    pub installation_dir: String,
    pub config_file: String,
    pub payload_present: bool,
    pub server: String,
    pub base_url: String,
    /// Pinned server URL, if any
    pub pinned_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ServerEntry {
    pub name: String,
    pub display_name: String,
    pub base_url: String,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct ConnectionReport {
    pub url: String,
    pub reachable: bool,
}

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render command result
    pub fn render_result(&self, result: &CommandResult) -> io::Result<()> {
        if self.json_output {
            Self::render_json(result)
        } else {
            self.render_human(result)
        }
    }

    /// Render a failed command in JSON mode
    pub fn render_error(&self, error: &CliError) -> io::Result<()> {
        if !self.json_output {
            return Ok(());
        }
        let failure = match error.domain_error() {
            Some(e) => serde_json::to_value(vernal_events::FailureContext::from_error(e)),
            None => serde_json::to_value(vernal_events::FailureContext::new(
                None::<String>,
                error.to_string(),
                None::<String>,
                false,
            )),
        }
        .map_err(io::Error::other)?;
        let json = serde_json::json!({ "result": "error", "data": failure });
        println!("{json}");
        Ok(())
    }

    fn render_json(result: &CommandResult) -> io::Result<()> {
        let json = serde_json::to_string_pretty(result).map_err(io::Error::other)?;
        println!("{json}");
        Ok(())
    }

    fn render_human(&self, result: &CommandResult) -> io::Result<()> {
        match result {
            CommandResult::Install(report) => self.render_install_report(report),
            CommandResult::Status(report) => self.render_status(report),
            CommandResult::Servers(servers) => self.render_servers(servers),
            CommandResult::Connection(report) => self.render_connection(report),
            CommandResult::Success(message) => self.render_success_message(message),
        }
    }

    fn render_install_report(&self, report: &InstallReport) -> io::Result<()> {
        match report.outcome {
            InstallOutcome::Completed => self.term.write_line(&format!(
                "{} installed in {}; service stopped on exit",
                self.bold("Vernal Falls"),
                report.installation_dir
            )),
            InstallOutcome::Cancelled => self.term.write_line("Installation cancelled."),
        }
    }

    fn render_status(&self, report: &StatusReport) -> io::Result<()> {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        let state_cell = match report.state {
            InstallState::Complete => Cell::new("installed").fg(Color::Green),
            InstallState::LoggedOut => Cell::new("not installed").fg(Color::Yellow),
            InstallState::InProgress(_) => Cell::new(report.state.to_string()).fg(Color::Cyan),
        };
        table.add_row(vec![Cell::new("State").add_attribute(Attribute::Bold), state_cell]);

        let rows = [
            ("Installation", report.installation_dir.clone()),
            ("Service config", report.config_file.clone()),
            (
                "Payload",
                if report.payload_present {
                    "present".to_string()
                } else {
                    "missing".to_string()
                },
            ),
            ("Server", report.server.clone()),
            ("Base URL", report.base_url.clone()),
            (
                "Pinned URL",
                report.pinned_url.clone().unwrap_or_else(|| "-".to_string()),
            ),
        ];
        for (label, value) in rows {
            table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), Cell::new(value)]);
        }

        println!("{table}");
        Ok(())
    }

    fn render_servers(&self, servers: &[ServerEntry]) -> io::Result<()> {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("").add_attribute(Attribute::Bold),
            Cell::new("Server").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Base URL").add_attribute(Attribute::Bold),
        ]);

        for server in servers {
            let marker = if server.selected {
                Cell::new("*").fg(Color::Green)
            } else {
                Cell::new("")
            };
            table.add_row(vec![
                marker,
                Cell::new(&server.name),
                Cell::new(&server.display_name),
                Cell::new(&server.base_url),
            ]);
        }

        println!("{table}");
        Ok(())
    }

    fn render_connection(&self, report: &ConnectionReport) -> io::Result<()> {
        let verdict = if report.reachable {
            self.paint(Style::new().green(), "reachable")
        } else {
            self.paint(Style::new().red(), "unreachable")
        };
        self.term
            .write_line(&format!("{} is {verdict}", report.url))
    }

    fn render_success_message(&self, message: &str) -> io::Result<()> {
        self.term.write_line(message)
    }

    fn bold(&self, text: &str) -> String {
        self.paint(Style::new().bold(), text)
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.supports_color() {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Check if colors are supported
    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

/// Format byte size in human readable format
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{size:.0} {}", UNITS[unit_index])
    } else {
        format!("{size:.1} {}", UNITS[unit_index])
    }
}
