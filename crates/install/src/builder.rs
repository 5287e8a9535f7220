//! Builder wiring the installer's collaborators

use std::sync::Arc;
use vernal_errors::{ConfigError, Error};
use vernal_events::{ErrorReporter, EventSender};
use vernal_net::{Downloader, HttpDownloader, NetClient};
use vernal_platform::ArchiveInstaller;
use vernal_state::{Preferences, COMPLETE_KEY};
use vernal_types::{InstallState, InstallationLayout};

use crate::Installer;

/// Client id sent with the login request unless overridden
const DEFAULT_CLIENT_ID: &str = "delete-me-please-test";

/// Builder for [`Installer`].
///
/// `layout`, `archive_installer`, `preferences` and `error_reporter` are
/// required. Without an explicit client the installer uses a default
/// [`NetClient`]; without an explicit downloader it streams with
/// [`HttpDownloader`] over that client.
#[derive(Default)]
pub struct InstallerBuilder {
    net: Option<NetClient>,
    downloader: Option<Arc<dyn Downloader>>,
    archive: Option<Arc<dyn ArchiveInstaller>>,
    preferences: Option<Arc<dyn Preferences>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    events: Option<EventSender>,
    layout: Option<InstallationLayout>,
    client_id: Option<String>,
}

impl InstallerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_net_client(mut self, net: NetClient) -> Self {
        self.net = Some(net);
        self
    }

    #[must_use]
    pub fn with_downloader(mut self, downloader: Arc<dyn Downloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    #[must_use]
    pub fn with_archive_installer(mut self, archive: Arc<dyn ArchiveInstaller>) -> Self {
        self.archive = Some(archive);
        self
    }

    #[must_use]
    pub fn with_preferences(mut self, preferences: Arc<dyn Preferences>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    #[must_use]
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: InstallationLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Build the installer, restoring its initial state from the persisted
    /// completion flag.
    ///
    /// An unreadable flag is logged and treated as not installed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` for a missing required
    /// collaborator, or an error if the default HTTP client cannot be built.
    pub async fn build(self) -> Result<Installer, Error> {
        let layout = self.layout.ok_or_else(|| missing("layout"))?;
        let archive = self.archive.ok_or_else(|| missing("archive_installer"))?;
        let preferences = self.preferences.ok_or_else(|| missing("preferences"))?;
        let reporter = self.reporter.ok_or_else(|| missing("error_reporter"))?;

        let net = match self.net {
            Some(net) => net,
            None => NetClient::with_defaults()?,
        };
        let downloader = self.downloader.unwrap_or_else(|| {
            let downloader = HttpDownloader::new(net.clone());
            Arc::new(match &self.events {
                Some(tx) => downloader.with_event_sender(tx.clone()),
                None => downloader,
            })
        });

        let initial = match preferences.bool(COMPLETE_KEY).await {
            Ok(flag) => InstallState::from_completion_flag(flag.unwrap_or(false)),
            Err(e) => {
                tracing::warn!(error = %e, "could not read completion flag; starting logged out");
                InstallState::LoggedOut
            }
        };
        tracing::debug!(state = %initial, root = %layout.root().display(), "installer ready");

        Ok(Installer::from_parts(
            net,
            downloader,
            archive,
            preferences,
            reporter,
            self.events,
            layout,
            self.client_id
                .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
            initial,
        ))
    }
}

fn missing(field: &str) -> Error {
    ConfigError::MissingField {
        field: field.to_string(),
    }
    .into()
}
