//! Integration tests for watchdog

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use httpmock::prelude::*;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;
    use vernal_errors::{Error, InstallError, PlatformError};
    use vernal_events::ErrorReporter;
    use vernal_install::InstallerBuilder;
    use vernal_net::{NetClient, NetConfig};
    use vernal_platform::{ArchiveInstaller, ServiceController};
    use vernal_state::{MemoryPreferences, StateCapsule};
    use vernal_types::{Credentials, InstallState, InstallationLayout, ProgressInfo, ServiceCommand};
    use vernal_watchdog::*;

    type Call = (ServiceCommand, u32, PathBuf);

    /// Forwards every call to the test; fails commands listed in `failing`
    struct ChannelController {
        calls: mpsc::UnboundedSender<Call>,
        failing: Vec<ServiceCommand>,
    }

    #[async_trait]
    impl ServiceController for ChannelController {
        async fn run(
            &self,
            command: ServiceCommand,
            user: u32,
            working_dir: &Path,
        ) -> Result<(), PlatformError> {
            let _ = self.calls.send((command, user, working_dir.to_path_buf()));
            if self.failing.contains(&command) {
                return Err(PlatformError::ServiceCommandFailed {
                    command: command.verb().to_string(),
                    exit_code: 5,
                    stderr: "Input/output error".to_string(),
                });
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        errors: Mutex<Vec<Error>>,
    }

    impl ErrorReporter for RecordingReporter {
        fn report(&self, error: &Error) {
            self.errors.lock().unwrap().push(error.clone());
        }
    }

    fn config() -> WatchdogConfig {
        WatchdogConfig {
            installation_dir: PathBuf::from("/Users/me/Library/Application Support/vernal"),
            scratch_dir: PathBuf::from("/tmp"),
            user: 501,
        }
    }

    fn watchdog(
        failing: Vec<ServiceCommand>,
    ) -> (
        ServiceWatchdog,
        mpsc::UnboundedReceiver<Call>,
        Arc<RecordingReporter>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let reporter = Arc::new(RecordingReporter::default());
        let controller = Arc::new(ChannelController { calls: tx, failing });
        (
            ServiceWatchdog::new(controller, reporter.clone(), config()),
            rx,
            reporter,
        )
    }

    async fn next_call(rx: &mut mpsc::UnboundedReceiver<Call>) -> Call {
        tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("timed out waiting for service command")
            .expect("controller dropped")
    }

    #[tokio::test]
    async fn test_follows_state_transitions() {
        let capsule = StateCapsule::new(InstallState::LoggedOut);
        let (watchdog, mut calls, reporter) = watchdog(Vec::new());
        let shutdown = CancellationToken::new();
        let handle = watchdog.spawn(capsule.subscribe(), shutdown.clone());

        // Replayed initial state.
        assert_eq!(
            next_call(&mut calls).await,
            (ServiceCommand::Stop, 501, PathBuf::from("/tmp"))
        );

        capsule.publish(InstallState::InProgress(ProgressInfo::indeterminate()));
        capsule.publish(InstallState::InProgress(ProgressInfo::new(5, Some(10))));
        capsule.publish(InstallState::Complete);
        assert_eq!(
            next_call(&mut calls).await,
            (ServiceCommand::Start, 501, config().installation_dir)
        );

        capsule.publish(InstallState::LoggedOut);
        assert_eq!(next_call(&mut calls).await.0, ServiceCommand::Stop);

        shutdown.cancel();
        handle.await.unwrap();
        assert_eq!(next_call(&mut calls).await.0, ServiceCommand::Stop);
        assert!(calls.try_recv().is_err());
        assert!(reporter.errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_reported_and_swallowed() {
        let capsule = StateCapsule::new(InstallState::LoggedOut);
        let (watchdog, mut calls, reporter) = watchdog(vec![ServiceCommand::Stop]);
        let shutdown = CancellationToken::new();
        let handle = watchdog.spawn(capsule.subscribe(), shutdown.clone());

        assert_eq!(next_call(&mut calls).await.0, ServiceCommand::Stop);
        capsule.publish(InstallState::Complete);
        assert_eq!(next_call(&mut calls).await.0, ServiceCommand::Start);

        shutdown.cancel();
        handle.await.unwrap();

        let errors = reporter.errors.lock().unwrap().clone();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(
            e,
            Error::Platform(PlatformError::ServiceCommandFailed { exit_code: 5, .. })
        )));
    }

    #[tokio::test]
    async fn test_shutdown_stops_regardless_of_state() {
        let capsule = StateCapsule::new(InstallState::Complete);
        let (watchdog, mut calls, _reporter) = watchdog(Vec::new());
        let shutdown = CancellationToken::new();
        let handle = watchdog.spawn(capsule.subscribe(), shutdown.clone());

        assert_eq!(next_call(&mut calls).await.0, ServiceCommand::Start);
        shutdown.cancel();
        handle.await.unwrap();
        assert_eq!(
            next_call(&mut calls).await,
            (ServiceCommand::Stop, 501, PathBuf::from("/tmp"))
        );
        assert_eq!(capsule.current(), InstallState::Complete);
    }

    #[tokio::test]
    async fn test_stop_when_installer_is_gone() {
        let capsule = StateCapsule::new(InstallState::InProgress(ProgressInfo::indeterminate()));
        let (watchdog, mut calls, _reporter) = watchdog(Vec::new());
        let shutdown = CancellationToken::new();
        let handle = watchdog.spawn(capsule.subscribe(), shutdown.clone());

        drop(capsule);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(calls.try_recv().is_err());

        shutdown.cancel();
        handle.await.unwrap();
        assert_eq!(next_call(&mut calls).await.0, ServiceCommand::Stop);
    }

    struct UnpackingArchive;

    #[async_trait]
    impl ArchiveInstaller for UnpackingArchive {
        async fn install(&self, _archive: &Path, destination: &Path) -> Result<(), InstallError> {
            std::fs::create_dir_all(destination).unwrap();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_end_to_end_install_starts_service() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/app-setup");
                then.status(200).body(format!(
                    r#"{{
                        "message": {{"download_url": "{}", "vernal_falls_version": "1.0.0"}},
                        "vernal_falls_config": {{"env": "staging"}},
                        "org": {{"id": 1, "name": "Sparta"}}
                    }}"#,
                    server.url("/vernal_falls.tar.gz")
                ));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/vernal_falls.tar.gz");
                then.status(200).body("archive");
            })
            .await;

        let temp = tempfile::tempdir().unwrap();
        let layout = InstallationLayout::new(temp.path().join("vernal"));
        let reporter = Arc::new(RecordingReporter::default());
        let installer = InstallerBuilder::new()
            .with_net_client(
                NetClient::new(NetConfig {
                    retry_count: 0,
                    ..NetConfig::default()
                })
                .unwrap(),
            )
            .with_layout(layout.clone())
            .with_archive_installer(Arc::new(UnpackingArchive))
            .with_preferences(Arc::new(MemoryPreferences::new()))
            .with_error_reporter(reporter.clone())
            .build()
            .await
            .unwrap();

        let (tx, mut calls) = mpsc::unbounded_channel();
        let controller = Arc::new(ChannelController {
            calls: tx,
            failing: Vec::new(),
        });
        let watchdog = ServiceWatchdog::new(
            controller,
            reporter.clone(),
            WatchdogConfig {
                installation_dir: layout.root().to_path_buf(),
                scratch_dir: PathBuf::from("/tmp"),
                user: 501,
            },
        );
        let shutdown = CancellationToken::new();
        let handle = watchdog.spawn(installer.subscribe(), shutdown.clone());
        assert_eq!(next_call(&mut calls).await.0, ServiceCommand::Stop);

        let base = url::Url::parse(&server.base_url()).unwrap();
        installer
            .begin_installation(Credentials::new("user", "pass", base))
            .await
            .unwrap();
        assert_eq!(installer.state(), InstallState::Complete);
        assert_eq!(
            next_call(&mut calls).await,
            (ServiceCommand::Start, 501, layout.root().to_path_buf())
        );
        assert_eq!(
            std::fs::read_to_string(layout.config_file()).unwrap(),
            "env: \"staging\"\n"
        );

        shutdown.cancel();
        handle.await.unwrap();
        assert!(reporter.errors.lock().unwrap().is_empty());
    }
}
