//! System setup and component wiring

use crate::error::CliError;
use std::os::unix::fs::MetadataExt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};
use url::Url;
use vernal_config::Config;
use vernal_errors::Error;
use vernal_events::{ErrorReporter, EventSender};
use vernal_install::{Installer, InstallerBuilder};
use vernal_net::{ConnectionMonitor, NetClient, NetConfig};
use vernal_platform::{LaunchctlController, Platform, TarArchiveInstaller};
use vernal_state::{FilePreferences, Preferences, PRODUCTION_URL_KEY};
use vernal_types::InstallationLayout;
use vernal_watchdog::{ServiceWatchdog, WatchdogConfig};

/// Reporter that shows failures through the event stream and remembers the
/// last installation failure, so the command can exit non-zero after an
/// attempt fails.
///
/// Service command failures come from the watchdog and are shown only.
pub struct CliReporter {
    events: EventSender,
    last: Mutex<Option<Error>>,
}

impl CliReporter {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            last: Mutex::new(None),
        }
    }

    /// Take the most recent installation failure
    pub fn take_last(&self) -> Option<Error> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl ErrorReporter for CliReporter {
    fn report(&self, error: &Error) {
        self.events.report(error);
        if !matches!(error, Error::Platform(_)) {
            *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(error.clone());
        }
    }
}

/// Component wiring for one CLI invocation
pub struct SystemSetup {
    config: Config,
    events: EventSender,
    platform: Platform,
    preferences: Arc<FilePreferences>,
    layout: InstallationLayout,
    reporter: Arc<CliReporter>,
}

impl SystemSetup {
    /// Resolve paths from the configuration
    pub fn new(config: Config, events: EventSender) -> Result<Self, CliError> {
        let layout = InstallationLayout::new(config.installation_dir()?);
        let preferences = Arc::new(FilePreferences::new(config.preferences_path()?));
        debug!(
            root = %layout.root().display(),
            preferences = %preferences.path().display(),
            "resolved installation paths"
        );
        Ok(Self {
            config,
            reporter: Arc::new(CliReporter::new(events.clone())),
            events,
            platform: Platform::current(),
            preferences,
            layout,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &InstallationLayout {
        &self.layout
    }

    pub fn preferences(&self) -> &FilePreferences {
        &self.preferences
    }

    pub fn reporter(&self) -> &Arc<CliReporter> {
        &self.reporter
    }

    /// HTTP client configured from the `[network]` section
    pub fn net_client(&self) -> Result<NetClient, CliError> {
        Ok(NetClient::new(NetConfig::from(&self.config.network))?)
    }

    /// Pinned server URL from preferences
    pub async fn pinned_url(&self) -> Result<Option<String>, CliError> {
        Ok(self.preferences.string(PRODUCTION_URL_KEY).await?)
    }

    /// Base URL of the selected server, honouring the pinned URL
    pub async fn base_url(&self) -> Result<Url, CliError> {
        let pinned = self.pinned_url().await?;
        Ok(self.config.server_base_url(pinned.as_deref())?)
    }

    /// Installer restored from the persisted completion flag
    pub async fn installer(&self) -> Result<Installer, CliError> {
        let net = self.net_client()?;
        let archive = TarArchiveInstaller::new(self.platform.process(), &self.config.archive.tar)
            .with_event_sender(self.events.clone());

        let installer = InstallerBuilder::new()
            .with_net_client(net)
            .with_archive_installer(Arc::new(archive))
            .with_preferences(self.preferences.clone())
            .with_error_reporter(self.reporter.clone())
            .with_event_sender(self.events.clone())
            .with_layout(self.layout.clone())
            .with_client_id(self.config.server.client_id.clone())
            .build()
            .await?;
        info!(state = %installer.state(), "installer ready");
        Ok(installer)
    }

    /// launchctl front end configured from the `[service]` section
    pub fn service_controller(&self) -> LaunchctlController {
        LaunchctlController::new(self.platform.process(), &self.config.service.launchctl)
            .with_label(self.config.service.label.clone())
            .with_descriptor(self.config.service.descriptor.clone())
            .with_event_sender(self.events.clone())
    }

    /// Watchdog keeping the service in step with the installer
    pub fn watchdog(&self) -> Result<ServiceWatchdog, CliError> {
        let config = WatchdogConfig {
            installation_dir: self.layout.root().to_path_buf(),
            scratch_dir: self.config.service.scratch_dir.clone(),
            user: self.service_user()?,
        };
        Ok(ServiceWatchdog::new(
            Arc::new(self.service_controller()),
            self.reporter.clone(),
            config,
        )
        .with_event_sender(self.events.clone()))
    }

    /// Health check against `base`
    pub fn connection_monitor(&self, base: &Url) -> Result<ConnectionMonitor, CliError> {
        let url = self.config.health_url(base)?;
        Ok(ConnectionMonitor::new(self.net_client()?, url))
    }

    /// User whose launchd domain the service lives in.
    ///
    /// Configured explicitly, or the owner of the home directory.
    pub fn service_user(&self) -> Result<u32, CliError> {
        if let Some(uid) = self.config.service.user_id {
            return Ok(uid);
        }
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Setup("cannot determine home directory".to_string()))?;
        let uid = std::fs::metadata(&home)?.uid();
        debug!(uid, home = %home.display(), "service user from home directory owner");
        Ok(uid)
    }
}
