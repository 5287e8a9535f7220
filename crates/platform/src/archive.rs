//! Distribution archive extraction

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vernal_errors::{InstallError, PlatformError};
use vernal_events::EventSender;

use crate::context::PlatformContext;
use crate::fs;
use crate::process::ProcessOperations;

/// Unpacks a downloaded archive into a destination directory
#[async_trait]
pub trait ArchiveInstaller: Send + Sync {
    /// Extract `archive` into `destination`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `InstallError::ArchiveFailed` carrying the tool's exit code
    /// and diagnostics, or a filesystem error.
    async fn install(&self, archive: &Path, destination: &Path) -> Result<(), InstallError>;
}

/// `ArchiveInstaller` running `tar -xzf <archive> -C <destination>`
pub struct TarArchiveInstaller {
    process: Arc<dyn ProcessOperations>,
    context: PlatformContext,
    tar: PathBuf,
}

impl TarArchiveInstaller {
    pub fn new(process: Arc<dyn ProcessOperations>, tar: impl Into<PathBuf>) -> Self {
        Self {
            process,
            context: PlatformContext::default(),
            tar: tar.into(),
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.context = PlatformContext::new(Some(tx));
        self
    }

    async fn discard(destination: &Path) {
        if let Err(e) = fs::remove_dir_all(destination).await {
            tracing::warn!(path = %destination.display(), error = %e, "failed to remove partial extraction");
        }
    }
}

// tar never ran, so there is no exit code to report.
fn spawn_failure(error: &PlatformError) -> InstallError {
    InstallError::ArchiveFailed {
        exit_code: -1,
        diagnostics: error.to_string(),
    }
}

#[async_trait]
impl ArchiveInstaller for TarArchiveInstaller {
    async fn install(&self, archive: &Path, destination: &Path) -> Result<(), InstallError> {
        fs::create_dir_all(destination).await?;

        let mut cmd = self.process.create_command(&self.tar.display().to_string());
        cmd.arg("-xzf")
            .arg(archive.display().to_string())
            .arg("-C")
            .arg(destination.display().to_string());

        let output = match self.process.execute_command(&self.context, cmd).await {
            Ok(output) => output,
            Err(e) => {
                Self::discard(destination).await;
                return Err(spawn_failure(&e));
            }
        };

        if output.success() {
            tracing::debug!(archive = %archive.display(), destination = %destination.display(), "archive extracted");
            return Ok(());
        }

        Self::discard(destination).await;
        let diagnostics = match output.exit_code {
            Some(_) => output.stderr_text(),
            None => format!("{} terminated by signal", self.tar.display()),
        };
        Err(InstallError::ArchiveFailed {
            exit_code: output.exit_code.unwrap_or(-1),
            diagnostics,
        })
    }
}
