//! Command line interface definition

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use url::Url;
use vernal_types::{ApiServer, ColorChoice};

/// vernal - Installer and service supervisor for Vernal Falls
#[derive(Parser)]
#[command(name = "vernal")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Installer and service supervisor for Vernal Falls")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Write structured debug logs to the vernal data directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Server selection shared by commands that talk to the API
#[derive(Args, Clone, Default)]
pub struct ServerArgs {
    /// Server from the catalogue (localhost, offline, staging, production)
    #[arg(long, value_name = "NAME", value_parser = parse_server, conflicts_with = "base_url")]
    pub server: Option<ApiServer>,

    /// Explicit server base URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<Url>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Log in, install Vernal Falls and supervise its service until Ctrl-C
    #[command(alias = "i")]
    Install {
        /// Account user name
        #[arg(long, short)]
        username: String,

        /// Account password
        #[arg(long, short, env = "VERNAL_PASSWORD", hide_env_values = true)]
        password: String,

        #[command(flatten)]
        server: ServerArgs,
    },

    /// Forget the installation and stop the service (files stay on disk)
    #[command(alias = "rm")]
    Uninstall,

    /// Show installation state and paths
    Status,

    /// List known servers
    Servers,

    /// Pin the selected server's URL, or clear the pin when no URL is given
    ServerUrl {
        /// URL to use instead of the catalogue entry
        url: Option<Url>,
    },

    /// Probe the server health endpoint
    CheckConnection {
        #[command(flatten)]
        server: ServerArgs,
    },

    /// Start the service from the installation directory
    Start,

    /// Stop the service
    Stop,
}

impl Commands {
    /// Server overrides carried by the command, if any
    pub fn server_args(&self) -> Option<&ServerArgs> {
        match self {
            Self::Install { server, .. } | Self::CheckConnection { server } => Some(server),
            _ => None,
        }
    }
}

fn parse_server(value: &str) -> Result<ApiServer, String> {
    value.parse::<ApiServer>().map_err(|e| e.to_string())
}
