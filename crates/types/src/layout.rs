//! On-disk layout of an installation

use std::path::{Path, PathBuf};

/// Name of the service configuration file written from the login response
pub const CONFIG_FILE_NAME: &str = "config.yml";
/// Name of the downloaded distribution archive
pub const ARCHIVE_FILE_NAME: &str = "vernal_falls.tar.gz";
/// Name of the directory the archive is extracted into
pub const PAYLOAD_DIR_NAME: &str = "vernal_falls";

/// Paths derived from the per-user installation directory.
///
/// Nothing is created on construction; the installer creates the root
/// lazily once a login succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationLayout {
    root: PathBuf,
}

impl InstallationLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    #[must_use]
    pub fn archive_file(&self) -> PathBuf {
        self.root.join(ARCHIVE_FILE_NAME)
    }

    #[must_use]
    pub fn payload_dir(&self) -> PathBuf {
        self.root.join(PAYLOAD_DIR_NAME)
    }
}
