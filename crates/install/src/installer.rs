//! The installation orchestrator

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vernal_errors::Error;
use vernal_events::{AppEvent, ErrorReporter, EventEmitter, EventMeta, EventSender, InstallEvent};
use vernal_net::{Downloader, NetClient};
use vernal_platform::ArchiveInstaller;
use vernal_state::{Preferences, StateCapsule, Subscription, COMPLETE_KEY};
use vernal_types::{Credentials, InstallState, InstallationLayout, ProgressInfo};

/// Drives installation attempts and publishes [`InstallState`].
///
/// Cloning is cheap; clones share one state and one attempt slot.
#[derive(Clone)]
pub struct Installer {
    pub(crate) shared: Arc<Shared>,
}

pub(crate) struct Shared {
    pub(crate) net: NetClient,
    pub(crate) downloader: Arc<dyn Downloader>,
    pub(crate) archive: Arc<dyn ArchiveInstaller>,
    pub(crate) preferences: Arc<dyn Preferences>,
    pub(crate) reporter: Arc<dyn ErrorReporter>,
    pub(crate) events: Option<EventSender>,
    pub(crate) layout: InstallationLayout,
    pub(crate) client_id: String,
    state: StateCapsule<InstallState>,
    // Lock order: `control` before the capsule's internal lock.
    control: Mutex<Control>,
    /// Held by the attempt that owns the installation directory, from
    /// before login until its task ends.
    pub(crate) attempt_slot: tokio::sync::Mutex<()>,
}

struct Control {
    generation: u64,
    cancel: CancellationToken,
}

impl Installer {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        net: NetClient,
        downloader: Arc<dyn Downloader>,
        archive: Arc<dyn ArchiveInstaller>,
        preferences: Arc<dyn Preferences>,
        reporter: Arc<dyn ErrorReporter>,
        events: Option<EventSender>,
        layout: InstallationLayout,
        client_id: String,
        initial: InstallState,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                net,
                downloader,
                archive,
                preferences,
                reporter,
                events,
                layout,
                client_id,
                state: StateCapsule::new(initial),
                control: Mutex::new(Control {
                    generation: 0,
                    cancel: CancellationToken::new(),
                }),
                attempt_slot: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Start a fresh attempt, cancelling any attempt still in flight.
    ///
    /// The state is `InProgress` with indeterminate, cancellable progress by
    /// the time this returns; the attempt itself runs on a spawned task whose
    /// handle is returned. The new attempt touches the installation directory
    /// only after the cancelled one has unwound. Must be called from within a
    /// tokio runtime.
    pub fn begin_installation(&self, credentials: Credentials) -> JoinHandle<()> {
        let (generation, cancel) = {
            let mut control = self.shared.lock_control();
            control.cancel.cancel();
            control.generation += 1;
            control.cancel = CancellationToken::new();
            self.shared
                .publish(InstallState::InProgress(ProgressInfo::indeterminate()));
            (control.generation, control.cancel.clone())
        };
        tracing::debug!(generation, username = %credentials.username, "installation attempt started");

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move { shared.run_attempt(generation, credentials, cancel).await })
    }

    /// Abandon the attempt in flight and return to `LoggedOut`.
    ///
    /// Does nothing unless an attempt is in progress.
    pub fn cancel_installation(&self) {
        let cancelled = {
            let mut control = self.shared.lock_control();
            let cancelled = self.shared.state.publish_if(|current| {
                current.is_in_progress().then_some(InstallState::LoggedOut)
            });
            if cancelled {
                control.cancel.cancel();
                control.generation += 1;
            }
            cancelled
        };
        if cancelled {
            tracing::debug!("installation attempt cancelled");
            self.shared.emit(AppEvent::Install(InstallEvent::Cancelled));
            self.shared.emit_state(InstallState::LoggedOut);
        }
    }

    /// Return to `LoggedOut` and clear the persisted completion flag.
    ///
    /// The installed payload stays on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion flag cannot be cleared.
    pub async fn uninstall(&self) -> Result<(), Error> {
        let changed = {
            let mut control = self.shared.lock_control();
            control.cancel.cancel();
            control.generation += 1;
            self.shared.state.publish_if(|current| {
                (*current != InstallState::LoggedOut).then_some(InstallState::LoggedOut)
            })
        };
        if changed {
            self.shared.emit_state(InstallState::LoggedOut);
        }

        self.shared.preferences.remove(COMPLETE_KEY).await?;
        self.shared.emit(AppEvent::Install(InstallEvent::Uninstalled));
        Ok(())
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> InstallState {
        self.shared.state.current()
    }

    /// Observe every state transition, starting with the current state.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<InstallState> {
        self.shared.state.subscribe()
    }

    #[must_use]
    pub fn layout(&self) -> &InstallationLayout {
        &self.shared.layout
    }
}

impl std::fmt::Debug for Installer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installer")
            .field("layout", &self.shared.layout)
            .field("state", &self.shared.state.current())
            .finish_non_exhaustive()
    }
}

impl Shared {
    fn lock_control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: InstallState) {
        self.emit_state(state);
        self.state.publish(state);
    }

    fn emit_state(&self, state: InstallState) {
        self.emit(AppEvent::Install(InstallEvent::StateChanged { state }));
    }

    /// Emit an event tagged with the attempt that produced it
    pub(crate) fn emit_for_attempt(&self, generation: u64, event: AppEvent) {
        let meta = EventMeta::new(event.log_level(), event.event_source()).with_attempt(generation);
        self.emit_with_meta(meta, event);
    }

    /// Run `f` only while `generation` is the live attempt.
    ///
    /// The attempt slot stays locked for the duration of `f`, so nothing can
    /// supersede the attempt between the check and whatever `f` publishes.
    pub(crate) fn with_current<R>(
        &self,
        generation: u64,
        f: impl FnOnce(&Self) -> R,
    ) -> Option<R> {
        let control = self.lock_control();
        (control.generation == generation).then(|| f(self))
    }

    /// Fold download progress into the state of a live attempt.
    pub(crate) fn apply_progress(&self, generation: u64, downloaded: u64, total: Option<u64>) {
        self.with_current(generation, |shared| {
            let mut next = None;
            shared.state.publish_if(|current| {
                let InstallState::InProgress(previous) = current else {
                    return None;
                };
                let progress = ProgressInfo {
                    completed_units: previous.completed_units.max(downloaded),
                    total_units: total.or(previous.total_units),
                    cancellable: previous.cancellable,
                };
                next = (progress != *previous).then_some(InstallState::InProgress(progress));
                next
            });
            if let Some(state) = next {
                shared.emit_state(state);
            }
        });
    }

    /// End a live attempt in `state`; returns false for a superseded attempt.
    pub(crate) fn conclude(&self, generation: u64, state: InstallState) -> bool {
        self.with_current(generation, |shared| shared.publish(state))
            .is_some()
    }

    /// Report `error` and return to `LoggedOut`, if the attempt is still live.
    pub(crate) fn fail(&self, generation: u64, error: &Error) -> bool {
        self.with_current(generation, |shared| {
            shared.reporter.report(error);
            shared.publish(InstallState::LoggedOut);
        })
        .is_some()
    }
}

impl EventEmitter for Shared {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}
