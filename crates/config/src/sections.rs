//! Configuration sections

use crate::constants::{
    DEFAULT_CLIENT_ID, DEFAULT_LAUNCHCTL, DEFAULT_SCRATCH_DIR, DEFAULT_TAR,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;
use vernal_types::service::{DEFAULT_SERVICE_DESCRIPTOR, DEFAULT_SERVICE_LABEL};
use vernal_types::{ApiServer, ColorChoice};

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub color: ColorChoice,
}

/// Which server to log in against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub environment: ApiServer,
    /// Replaces the catalogue URL of `environment` when set
    #[serde(default)]
    pub base_url: Option<Url>,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Health endpoint for `check-connection`; derived from the base URL when unset
    #[serde(default)]
    pub health_url: Option<Url>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            environment: ApiServer::default(),
            base_url: None,
            client_id: default_client_id(),
            health_url: None,
        }
    }
}

/// Where the service is installed and where preferences persist
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InstallConfig {
    pub installation_dir: Option<PathBuf>,
    pub preferences_path: Option<PathBuf>,
}

/// Service manager settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_launchctl")]
    pub launchctl: PathBuf,
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default = "default_descriptor")]
    pub descriptor: String,
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
    /// launchd user domain; taken from the home directory owner when unset
    #[serde(default)]
    pub user_id: Option<u32>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            launchctl: default_launchctl(),
            label: default_label(),
            descriptor: default_descriptor(),
            scratch_dir: default_scratch_dir(),
            user_id: None,
        }
    }
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64, // seconds
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            retries: default_retries(),
            retry_delay: default_retry_delay(),
        }
    }
}

/// Archive extraction tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default = "default_tar")]
    pub tar: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self { tar: default_tar() }
    }
}

// Default value functions for serde
fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}

fn default_launchctl() -> PathBuf {
    PathBuf::from(DEFAULT_LAUNCHCTL)
}

fn default_label() -> String {
    DEFAULT_SERVICE_LABEL.to_string()
}

fn default_descriptor() -> String {
    DEFAULT_SERVICE_DESCRIPTOR.to_string()
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SCRATCH_DIR)
}

fn default_tar() -> PathBuf {
    PathBuf::from(DEFAULT_TAR)
}

fn default_timeout() -> u64 {
    300 // 5 minutes
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1 // 1 second
}
