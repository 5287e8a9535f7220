//! vernal - Installer and service supervisor for Vernal Falls
//!
//! The CLI wires the installer, the service watchdog and the platform
//! adapters together, renders their events, and turns Ctrl-C into a
//! cancelled attempt followed by a stopped service.

mod cli;
mod display;
mod error;
mod events;
mod logging;
mod setup;

use crate::cli::{Cli, Commands, ServerArgs};
use crate::display::{
    CommandResult, ConnectionReport, InstallOutcome, InstallReport, OutputRenderer, ServerEntry,
    StatusReport,
};
use crate::error::CliError;
use crate::events::EventHandler;
use crate::setup::SystemSetup;
use clap::Parser;
use std::process;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use vernal_config::Config;
use vernal_events::{EventEmitter, EventReceiver, EventSender};
use vernal_platform::ServiceController;
use vernal_state::{Preferences, COMPLETE_KEY, PRODUCTION_URL_KEY};
use vernal_types::{ApiServer, ColorChoice, Credentials, InstallState, ServiceCommand};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    let renderer = OutputRenderer::new(json_mode, cli.global.color.unwrap_or_default());
    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if json_mode {
            let _ = renderer.render_error(&e);
        } else if !e.already_shown() {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting vernal v{}", env!("CARGO_PKG_VERSION"));

    // 1. File config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;

    // 2. Environment variables
    config.merge_env()?;

    // 3. CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global, &cli.command);

    let (event_sender, event_receiver) = vernal_events::channel();
    let setup = SystemSetup::new(config.clone(), event_sender.clone())?;

    let color = config.general.color;
    let renderer = OutputRenderer::new(cli.global.json, color);
    let colors_enabled = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    let mut event_handler = EventHandler::new(colors_enabled, cli.global.debug, cli.global.json);

    let result = execute_command_with_events(
        cli.command,
        &setup,
        event_sender,
        event_receiver,
        &mut event_handler,
    )
    .await?;

    renderer.render_result(&result)?;
    info!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    setup: &SystemSetup,
    event_sender: EventSender,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<CommandResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, setup, event_sender));

    loop {
        select! {
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    event_handler.handle_event(event);
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    setup: &SystemSetup,
    events: EventSender,
) -> Result<CommandResult, CliError> {
    match command {
        Commands::Install {
            username,
            password,
            server: _,
        } => install(setup, &events, username, password).await,

        Commands::Uninstall => {
            let installer = setup.installer().await?;
            installer.uninstall().await?;
            let user = setup.service_user()?;
            setup
                .service_controller()
                .run(ServiceCommand::Stop, user, &setup.config().service.scratch_dir)
                .await?;
            Ok(CommandResult::Success(format!(
                "Installation forgotten; files remain in {}",
                setup.layout().root().display()
            )))
        }

        Commands::Status => status(setup).await,

        Commands::Servers => {
            let selected = &setup.config().server;
            let pinned = setup.pinned_url().await?;
            let mut servers = Vec::with_capacity(ApiServer::ALL.len());
            for server in ApiServer::ALL {
                // The pin replaces the selected entry only.
                let resolved = if server == selected.environment {
                    server.resolve_base_url(pinned.as_deref())
                } else {
                    server.base_url()
                };
                let base_url = resolved?;
                servers.push(ServerEntry {
                    name: server.name().to_string(),
                    display_name: server.display_name().to_string(),
                    base_url: base_url.to_string(),
                    selected: selected.base_url.is_none() && selected.environment == server,
                });
            }
            Ok(CommandResult::Servers(servers))
        }

        Commands::ServerUrl { url } => {
            let preferences = setup.preferences();
            match url {
                Some(url) => {
                    preferences
                        .set_string(PRODUCTION_URL_KEY, url.as_str())
                        .await?;
                    Ok(CommandResult::Success(format!("Server pinned to {url}")))
                }
                None => {
                    preferences.remove(PRODUCTION_URL_KEY).await?;
                    Ok(CommandResult::Success(
                        "Server pin cleared".to_string(),
                    ))
                }
            }
        }

        Commands::CheckConnection { server: _ } => {
            let base = setup.base_url().await?;
            let monitor = setup.connection_monitor(&base)?;
            events.emit_operation_started(format!("Checking {}", monitor.url()));
            let reachable = monitor.update().await;
            Ok(CommandResult::Connection(ConnectionReport {
                url: monitor.url().to_string(),
                reachable,
            }))
        }

        Commands::Start => {
            let user = setup.service_user()?;
            setup
                .service_controller()
                .run(ServiceCommand::Start, user, setup.layout().root())
                .await?;
            Ok(CommandResult::Success("Service started".to_string()))
        }

        Commands::Stop => {
            let user = setup.service_user()?;
            setup
                .service_controller()
                .run(ServiceCommand::Stop, user, &setup.config().service.scratch_dir)
                .await?;
            Ok(CommandResult::Success("Service stopped".to_string()))
        }
    }
}

/// Run one installation attempt under the watchdog.
///
/// Ctrl-C during the attempt cancels it. After a completed install the
/// service keeps running until Ctrl-C; either way the watchdog stops the
/// service on the way out.
async fn install(
    setup: &SystemSetup,
    events: &EventSender,
    username: String,
    password: String,
) -> Result<CommandResult, CliError> {
    let base = setup.base_url().await?;
    let installer = setup.installer().await?;
    let shutdown = CancellationToken::new();
    let watchdog = setup
        .watchdog()?
        .spawn(installer.subscribe(), shutdown.clone());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut attempt = installer.begin_installation(Credentials::new(username, password, base));
    let interrupted = select! {
        joined = &mut attempt => {
            joined.map_err(|e| CliError::Setup(format!("installation task failed: {e}")))?;
            false
        }
        _ = &mut ctrl_c => {
            installer.cancel_installation();
            let _ = attempt.await;
            true
        }
    };

    let final_state = installer.state();
    let attempt_failure = setup.reporter().take_last();
    if final_state == InstallState::Complete && !interrupted {
        events.emit_operation_started("Supervising service; press Ctrl-C to stop");
        let _ = ctrl_c.await;
    }
    shutdown.cancel();
    let _ = watchdog.await;

    let outcome = match final_state {
        InstallState::Complete => InstallOutcome::Completed,
        _ if interrupted => InstallOutcome::Cancelled,
        _ => {
            let failure = attempt_failure.unwrap_or_else(|| {
                vernal_errors::Error::internal("installation ended without completing")
            });
            return Err(CliError::Reported(failure));
        }
    };

    Ok(CommandResult::Install(InstallReport {
        outcome,
        installation_dir: setup.layout().root().display().to_string(),
        final_state,
    }))
}

async fn status(setup: &SystemSetup) -> Result<CommandResult, CliError> {
    let layout = setup.layout();
    let complete = setup
        .preferences()
        .bool(COMPLETE_KEY)
        .await?
        .unwrap_or(false);
    let payload_present = vernal_platform::fs::exists(&layout.payload_dir()).await;
    let base = setup.base_url().await?;
    let config = setup.config();

    Ok(CommandResult::Status(StatusReport {
        state: InstallState::from_completion_flag(complete),
        installation_dir: layout.root().display().to_string(),
        config_file: layout.config_file().display().to_string(),
        payload_present,
        server: config
            .server
            .base_url
            .as_ref()
            .map_or_else(|| config.server.environment.to_string(), |_| "custom".to_string()),
        base_url: base.to_string(),
        pinned_url: setup.pinned_url().await?,
    }))
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled: bool) {
    if debug_enabled {
        // Debug mode: structured JSON logs to a file, even alongside --json
        let log_dir = dirs::data_dir().map_or_else(
            || std::env::temp_dir().join("vernal-logs"),
            |dir| dir.join("vernal").join("logs"),
        );
        if let Err(e) = std::fs::create_dir_all(&log_dir) {
            eprintln!("Warning: Failed to create log directory: {e}");
        }

        let log_file = log_dir.join(format!(
            "vernal-{}.log",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        ));

        match std::fs::File::create(&log_file) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                            |_| tracing_subscriber::EnvFilter::new("info,vernal=debug"),
                        ),
                    )
                    .init();

                if !json_mode {
                    eprintln!("Debug logging enabled: {}", log_file.display());
                }
                return;
            }
            Err(e) => {
                if !json_mode {
                    eprintln!("Warning: Failed to create log file: {e}");
                }
            }
        }
    }

    if json_mode {
        // Keep stdout clean for the result document
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        // Normal mode: minimal logging to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .init();
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs, command: &Commands) {
    if let Some(color) = global.color {
        config.general.color = color;
    }

    if let Some(ServerArgs { server, base_url }) = command.server_args() {
        if let Some(server) = server {
            config.server.environment = *server;
            config.server.base_url = None;
        }
        if let Some(base_url) = base_url {
            config.server.base_url = Some(base_url.clone());
        }
    }
}
