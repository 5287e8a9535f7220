//! Catalogue of known API servers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;
use vernal_errors::ConfigError;

/// Path of the login endpoint relative to a server base URL
pub const LOGIN_PATH: &str = "api/app-setup";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiServer {
    Localhost,
    Offline,
    Staging,
    Production,
}

impl ApiServer {
    /// All servers in presentation order
    pub const ALL: [ApiServer; 4] = [
        ApiServer::Localhost,
        ApiServer::Offline,
        ApiServer::Staging,
        ApiServer::Production,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Localhost => "localhost",
            Self::Offline => "offline",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Offline => "Sparta Offline System",
            Self::Production => "home.spartascience.com",
            other => other.name(),
        }
    }

    #[must_use]
    pub fn base_url_str(self) -> &'static str {
        match self {
            Self::Localhost => "http://localhost:4000",
            Self::Offline => "http://spartascan.local",
            Self::Staging => "https://staging.spartascience.com",
            Self::Production => "https://home.spartascience.com",
        }
    }

    /// Base URL of this server.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the catalogue entry does not parse.
    pub fn base_url(self) -> Result<Url, ConfigError> {
        Url::parse(self.base_url_str()).map_err(|e| ConfigError::InvalidValue {
            field: format!("server.{}", self.name()),
            value: e.to_string(),
        })
    }

    /// Base URL, replaced by `override_url` when one is set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when the override is not a URL.
    pub fn resolve_base_url(self, override_url: Option<&str>) -> Result<Url, ConfigError> {
        match override_url.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
                field: "production url".to_string(),
                value: format!("{raw} ({e})"),
            }),
            None => self.base_url(),
        }
    }
}

impl Default for ApiServer {
    fn default() -> Self {
        Self::Production
    }
}

impl fmt::Display for ApiServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ApiServer {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|server| server.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownServer {
                name: s.to_string(),
            })
    }
}

/// Login endpoint for a base URL, tolerating a trailing slash or a path prefix.
#[must_use]
pub fn login_url(base: &Url) -> Url {
    let mut url = base.clone();
    {
        let path = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{path}/{LOGIN_PATH}"));
    }
    url.set_query(None);
    url
}
