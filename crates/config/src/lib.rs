#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for vernal
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/vernal/config.toml)
//! - Environment variables
//! - CLI flags (applied by the front end)

pub mod constants;
pub mod sections;

pub use sections::{
    ArchiveConfig, GeneralConfig, InstallConfig, NetworkConfig, ServerConfig, ServiceConfig,
};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use url::Url;
use vernal_errors::{ConfigError, Error};
use vernal_types::ApiServer;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub install: InstallConfig,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        Ok(app_config_dir()?.join(constants::CONFIG_FILE_NAME))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if fs::try_exists(&config_path).await.unwrap_or(false) {
            Self::load_from_file(&config_path).await
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Merge overrides from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` or `ConfigError::UnknownServer`
    /// for values that do not parse.
    pub fn merge_vars<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        // VERNAL_SERVER
        if let Some(server) = lookup("VERNAL_SERVER") {
            self.server.environment = ApiServer::from_str(&server)?;
        }

        // VERNAL_BASE_URL
        if let Some(base_url) = lookup("VERNAL_BASE_URL") {
            self.server.base_url =
                Some(Url::parse(&base_url).map_err(|_| ConfigError::InvalidValue {
                    field: "VERNAL_BASE_URL".to_string(),
                    value: base_url,
                })?);
        }

        // VERNAL_INSTALL_DIR
        if let Some(dir) = lookup("VERNAL_INSTALL_DIR") {
            if dir.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "VERNAL_INSTALL_DIR".to_string(),
                    value: dir,
                }
                .into());
            }
            self.install.installation_dir = Some(PathBuf::from(dir));
        }

        // VERNAL_USER_ID
        if let Some(uid) = lookup("VERNAL_USER_ID") {
            self.service.user_id = Some(uid.trim().parse().map_err(|_| {
                ConfigError::InvalidValue {
                    field: "VERNAL_USER_ID".to_string(),
                    value: uid,
                }
            })?);
        }

        Ok(())
    }

    /// Installation directory (with default under the user data dir)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` when no directory is configured and
    /// the platform data directory cannot be determined.
    pub fn installation_dir(&self) -> Result<PathBuf, Error> {
        if let Some(dir) = &self.install.installation_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(constants::INSTALLATION_DIR_NAME))
            .ok_or_else(|| {
                ConfigError::MissingField {
                    field: "installation_dir".to_string(),
                }
                .into()
            })
    }

    /// Preferences file (with default next to the config file)
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn preferences_path(&self) -> Result<PathBuf, Error> {
        match &self.install.preferences_path {
            Some(path) => Ok(path.clone()),
            None => Ok(app_config_dir()?.join(constants::PREFERENCES_FILE_NAME)),
        }
    }

    /// Server base URL.
    ///
    /// An explicit `base_url` wins, then the persisted production-URL
    /// preference, then the catalogue entry of `environment`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when the preference is not a URL.
    pub fn server_base_url(&self, preference_override: Option<&str>) -> Result<Url, Error> {
        if let Some(url) = &self.server.base_url {
            return Ok(url.clone());
        }
        Ok(self
            .server
            .environment
            .resolve_base_url(preference_override)?)
    }

    /// Health endpoint for a resolved base URL
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the joined URL is invalid.
    pub fn health_url(&self, base: &Url) -> Result<Url, Error> {
        if let Some(url) = &self.server.health_url {
            return Ok(url.clone());
        }
        let mut root = base.clone();
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        root.join(constants::HEALTH_CHECK_PATH).map_err(|e| {
            ConfigError::InvalidValue {
                field: "server.health_url".to_string(),
                value: e.to_string(),
            }
            .into()
        })
    }
}

fn app_config_dir() -> Result<PathBuf, Error> {
    let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
        path: "config directory".to_string(),
    })?;
    Ok(config_dir.join(constants::APP_DIR_NAME))
}
