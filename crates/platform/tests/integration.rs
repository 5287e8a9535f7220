//! Integration tests for platform

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;
    use vernal_errors::{InstallError, PlatformError};
    use vernal_events::{channel, AppEvent, PlatformEvent, ServiceEvent};
    use vernal_platform::*;
    use vernal_types::ServiceCommand;

    /// Records every command and answers with a canned output
    struct ScriptedProcess {
        calls: Mutex<Vec<PlatformCommand>>,
        output: CommandOutput,
    }

    impl ScriptedProcess {
        fn exiting(code: i32, stderr: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                output: CommandOutput {
                    exit_code: Some(code),
                    stdout: Vec::new(),
                    stderr: stderr.as_bytes().to_vec(),
                },
            })
        }

        fn calls(&self) -> Vec<PlatformCommand> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProcessOperations for ScriptedProcess {
        async fn execute_command(
            &self,
            _ctx: &PlatformContext,
            cmd: PlatformCommand,
        ) -> Result<CommandOutput, PlatformError> {
            self.calls.lock().unwrap().push(cmd);
            Ok(self.output.clone())
        }
    }

    #[tokio::test]
    async fn test_launchctl_start_arguments() {
        let process = ScriptedProcess::exiting(0, "");
        let controller = LaunchctlController::new(process.clone(), "/bin/launchctl");

        controller
            .run(ServiceCommand::Start, 501, Path::new("/opt/vernal"))
            .await
            .unwrap();

        let calls = process.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program(), "/bin/launchctl");
        assert_eq!(
            calls[0].get_args(),
            ["bootstrap", "gui/501", "sparta_science.vernal_falls.plist"]
        );
        assert_eq!(calls[0].get_current_dir(), Some(Path::new("/opt/vernal")));
    }

    #[tokio::test]
    async fn test_launchctl_stop_arguments_with_custom_label() {
        let process = ScriptedProcess::exiting(0, "");
        let controller =
            LaunchctlController::new(process.clone(), "/bin/launchctl").with_label("com.example.worker");

        controller
            .run(ServiceCommand::Stop, 42, Path::new("/tmp"))
            .await
            .unwrap();

        assert_eq!(
            process.calls()[0].get_args(),
            ["bootout", "gui/42/com.example.worker"]
        );
    }

    #[tokio::test]
    async fn test_ignored_exit_codes_are_success() {
        let (tx, mut rx) = channel();
        let process = ScriptedProcess::exiting(libc_esrch(), "No such process");
        let controller =
            LaunchctlController::new(process, "/bin/launchctl").with_event_sender(tx);

        controller
            .run(ServiceCommand::Stop, 501, Path::new("/tmp"))
            .await
            .unwrap();

        let message = rx.try_recv().unwrap();
        assert!(matches!(
            message.event,
            AppEvent::Service(ServiceEvent::CommandIgnored {
                command: ServiceCommand::Stop,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_other_exit_codes_fail_with_stderr() {
        let process = ScriptedProcess::exiting(5, "Bootstrap failed: 5: Input/output error\n");
        let controller = LaunchctlController::new(process, "/bin/launchctl");

        let err = controller
            .run(ServiceCommand::Start, 501, Path::new("/opt/vernal"))
            .await
            .unwrap_err();

        match err {
            PlatformError::ServiceCommandFailed {
                command,
                exit_code,
                stderr,
            } => {
                assert_eq!(command, "/bin/launchctl bootstrap");
                assert_eq!(exit_code, 5);
                assert_eq!(stderr, "Bootstrap failed: 5: Input/output error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_start_does_not_ignore_stop_codes() {
        let process = ScriptedProcess::exiting(libc_esrch(), "");
        let controller = LaunchctlController::new(process, "/bin/launchctl");
        assert!(controller
            .run(ServiceCommand::Start, 501, Path::new("/opt/vernal"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_tar_arguments_and_success() {
        let temp = tempdir().unwrap();
        let archive = temp.path().join("vernal_falls.tar.gz");
        let destination = temp.path().join("payload").join("vernal_falls");
        let process = ScriptedProcess::exiting(0, "");
        let installer = TarArchiveInstaller::new(process.clone(), "/usr/bin/tar");

        installer.install(&archive, &destination).await.unwrap();

        assert!(destination.is_dir());
        let calls = process.calls();
        assert_eq!(calls[0].program(), "/usr/bin/tar");
        assert_eq!(
            calls[0].get_args().to_vec(),
            vec![
                "-xzf".to_string(),
                archive.display().to_string(),
                "-C".to_string(),
                destination.display().to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_tar_failure_removes_partial_destination() {
        let temp = tempdir().unwrap();
        let destination = temp.path().join("vernal_falls");
        let process = ScriptedProcess::exiting(2, "tar: Error opening archive: Unrecognized archive format\n");
        let installer = TarArchiveInstaller::new(process, "/usr/bin/tar");

        let err = installer
            .install(&temp.path().join("corrupt.tar.gz"), &destination)
            .await
            .unwrap_err();

        match &err {
            InstallError::ArchiveFailed {
                exit_code,
                diagnostics,
            } => {
                assert_eq!(*exit_code, 2);
                assert!(diagnostics.contains("Unrecognized archive format"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_string(), "Failed to install with exit code: 2");
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_host_process_captures_exit_code_and_stderr() {
        let (tx, mut rx) = channel();
        let platform = Platform::current();
        let ctx = PlatformContext::new(Some(tx));
        let temp = tempdir().unwrap();

        let mut cmd = PlatformCommand::new("sh");
        cmd.args(["-c", "pwd; echo oops >&2; exit 3"])
            .current_dir(temp.path());
        let output = platform.process().execute_command(&ctx, cmd).await.unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stderr_text(), "oops");
        let cwd = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
        assert_eq!(
            cwd.canonicalize().unwrap(),
            temp.path().canonicalize().unwrap()
        );

        let first = rx.try_recv().unwrap();
        assert!(matches!(
            first.event,
            AppEvent::Platform(PlatformEvent::ProcessExecutionStarted { .. })
        ));
        let second = rx.try_recv().unwrap();
        assert!(matches!(
            second.event,
            AppEvent::Platform(PlatformEvent::ProcessExecutionCompleted {
                exit_code: Some(3),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_host_process_missing_program() {
        let platform = Platform::current();
        let err = platform
            .process()
            .execute_command(
                &PlatformContext::default(),
                PlatformCommand::new("/nonexistent/vernal-tool"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::CommandNotFound { .. }));
    }

    #[tokio::test]
    async fn test_write_atomic_and_remove() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("a").join("b");
        fs::create_dir_all(&dir).await.unwrap();
        let file = dir.join("config.yml");
        fs::write_atomic(&file, b"env: \"staging\"\n").await.unwrap();
        assert_eq!(std::fs::read(&file).unwrap(), b"env: \"staging\"\n");
        assert!(!dir.join("config.yml.tmp").exists());

        fs::remove_dir_all(&dir).await.unwrap();
        assert!(!fs::exists(&dir).await);
        // Second removal is a no-op.
        fs::remove_dir_all(&dir).await.unwrap();
    }

    #[test]
    fn test_command_display() {
        let mut cmd = PlatformCommand::new("/bin/launchctl");
        cmd.arg("bootout").arg("gui/501/label");
        assert_eq!(cmd.display(), "/bin/launchctl bootout gui/501/label");
    }

    fn libc_esrch() -> i32 {
        ServiceCommand::Stop.ignored_exit_codes()[0]
    }
}
