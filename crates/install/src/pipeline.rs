//! One installation attempt, from login to completion flag

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vernal_errors::{Error, InstallError};
use vernal_events::{AppEvent, FailureContext, InstallEvent};
use vernal_net::{login, redacted, DownloadProgress, ProgressCallback};
use vernal_platform::fs;
use vernal_state::COMPLETE_KEY;
use vernal_types::{Credentials, InstallState, LoginResponse};

use crate::config_file;
use crate::installer::Shared;

/// What a finished attempt installed
struct Installed {
    version: String,
}

impl Shared {
    pub(crate) async fn run_attempt(
        self: Arc<Self>,
        generation: u64,
        credentials: Credentials,
        cancel: CancellationToken,
    ) {
        match self.attempt(generation, &credentials, &cancel).await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {
                tracing::debug!(generation, "attempt cancelled");
                // Normally `cancel_installation` already left InProgress.
                self.conclude(generation, InstallState::LoggedOut);
            }
            Err(e) => {
                tracing::warn!(generation, error = %e, "installation attempt failed");
                if self.fail(generation, &e) {
                    self.emit_for_attempt(
                        generation,
                        AppEvent::Install(InstallEvent::Failed {
                            failure: FailureContext::from_error(&e),
                        }),
                    );
                } else {
                    tracing::debug!(generation, "dropping failure of a superseded attempt");
                }
            }
        }
    }

    /// Run the pipeline while owning the installation directory.
    async fn attempt(
        self: &Arc<Self>,
        generation: u64,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let _slot = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            slot = self.attempt_slot.lock() => slot,
        };
        let installed = self.install(generation, credentials, cancel).await?;
        self.persist_completion(generation, installed).await
    }

    async fn install(
        self: &Arc<Self>,
        generation: u64,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> Result<Installed, Error> {
        self.emit_for_attempt(
            generation,
            AppEvent::Install(InstallEvent::LoginStarted {
                server: redacted(&credentials.server_base_url),
                username: credentials.username.clone(),
            }),
        );

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            response = login(&self.net, credentials, &self.client_id) => response?,
        };

        let success = match response {
            LoginResponse::Success(success) => success,
            LoginResponse::Failure(failure) => {
                self.emit_for_attempt(
                    generation,
                    AppEvent::Install(InstallEvent::LoginRejected {
                        message: failure.error.clone(),
                    }),
                );
                return Err(InstallError::ServerRejected {
                    message: failure.error,
                }
                .into());
            }
        };
        self.emit_for_attempt(
            generation,
            AppEvent::Install(InstallEvent::LoginSucceeded {
                version: success.message.distribution_version.clone(),
                organization: success.organization.name.clone(),
            }),
        );

        fs::create_dir_all(self.layout.root()).await?;
        let config_path = self.layout.config_file();
        config_file::write(&success.config, &config_path).await?;
        self.emit_for_attempt(
            generation,
            AppEvent::Install(InstallEvent::ConfigWritten {
                path: config_path.display().to_string(),
                entries: success.config.len(),
            }),
        );

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let archive = self
            .downloader
            .download(
                &success.message.download_url,
                &self.layout.archive_file(),
                self.progress_callback(generation),
                cancel,
            )
            .await?;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let payload = self.layout.payload_dir();
        self.emit_for_attempt(
            generation,
            AppEvent::Install(InstallEvent::ArchiveInstalling {
                archive: archive.display().to_string(),
                destination: payload.display().to_string(),
            }),
        );
        // Dropping the extraction kills the archiver.
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            result = self.archive.install(&archive, &payload) => result?,
        }

        Ok(Installed {
            version: success.message.distribution_version,
        })
    }

    fn progress_callback(self: &Arc<Self>, generation: u64) -> ProgressCallback {
        let weak = Arc::downgrade(self);
        Arc::new(move |progress: DownloadProgress| {
            if let Some(shared) = weak.upgrade() {
                shared.apply_progress(generation, progress.downloaded, progress.total);
            }
        })
    }

    /// Persist the completion flag, then publish `Complete`.
    async fn persist_completion(&self, generation: u64, installed: Installed) -> Result<(), Error> {
        if self.with_current(generation, |_| ()).is_none() {
            return Err(Error::Cancelled);
        }
        self.preferences.set_bool(COMPLETE_KEY, true).await?;

        if self.conclude(generation, InstallState::Complete) {
            tracing::info!(generation, version = %installed.version, "installation complete");
            self.emit_for_attempt(
                generation,
                AppEvent::Install(InstallEvent::Completed {
                    version: installed.version,
                    destination: self.layout.payload_dir().display().to_string(),
                }),
            );
        } else {
            // Superseded while the flag was being written. Newer attempts are
            // still waiting for the slot, so the flag is ours to clear.
            if let Err(e) = self.preferences.remove(COMPLETE_KEY).await {
                tracing::warn!(error = %e, "failed to roll back completion flag");
            }
        }
        Ok(())
    }
}
