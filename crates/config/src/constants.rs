//! Fixed names and defaults that are not worth a configuration knob

/// Directory under the user config dir holding `config.toml` and preferences
pub const APP_DIR_NAME: &str = "vernal";

pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// Directory under the user data dir the service is installed into
pub const INSTALLATION_DIR_NAME: &str = "sparta_science.vernal";

/// Client identifier sent with every login request
pub const DEFAULT_CLIENT_ID: &str = "delete-me-please-test";

/// Health endpoint polled by the connection monitor, relative to the server
pub const HEALTH_CHECK_PATH: &str = "api/health-check";

pub const DEFAULT_LAUNCHCTL: &str = "/bin/launchctl";

pub const DEFAULT_TAR: &str = "/usr/bin/tar";

/// Working directory for stop commands, which must not depend on the install dir
pub const DEFAULT_SCRATCH_DIR: &str = "/tmp";

