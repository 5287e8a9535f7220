//! Host process operations backed by `tokio::process`

use async_trait::async_trait;
use std::convert::TryFrom;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use vernal_errors::PlatformError;
use vernal_events::{AppEvent, EventEmitter, FailureContext, PlatformEvent};

use super::{CommandOutput, PlatformCommand, ProcessOperations};
use crate::context::PlatformContext;

/// Runs commands on the host with `tokio::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct HostProcessOperations;

impl HostProcessOperations {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn emit_process_started(ctx: &PlatformContext, cmd: &PlatformCommand) {
    ctx.emit(AppEvent::Platform(PlatformEvent::ProcessExecutionStarted {
        command: cmd.program().to_string(),
        args: cmd.get_args().to_vec(),
        working_dir: cmd.get_current_dir().map(|dir| dir.display().to_string()),
    }));
}

fn emit_process_completed(
    ctx: &PlatformContext,
    cmd: &PlatformCommand,
    output: &CommandOutput,
    duration: Duration,
) {
    ctx.emit(AppEvent::Platform(PlatformEvent::ProcessExecutionCompleted {
        command: cmd.program().to_string(),
        exit_code: output.exit_code,
        duration_ms: duration_to_millis(duration),
    }));
}

fn emit_process_failed(
    ctx: &PlatformContext,
    cmd: &PlatformCommand,
    error: &PlatformError,
    duration: Duration,
) {
    ctx.emit(AppEvent::Platform(PlatformEvent::ProcessExecutionFailed {
        command: cmd.program().to_string(),
        failure: FailureContext::from_error(error),
        duration_ms: duration_to_millis(duration),
    }));
}

#[async_trait]
impl ProcessOperations for HostProcessOperations {
    async fn execute_command(
        &self,
        ctx: &PlatformContext,
        cmd: PlatformCommand,
    ) -> Result<CommandOutput, PlatformError> {
        let start = Instant::now();
        emit_process_started(ctx, &cmd);
        tracing::debug!(command = %cmd.display(), cwd = ?cmd.get_current_dir(), "executing");

        let mut command = Command::new(cmd.program());
        command
            .args(cmd.get_args())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = cmd.get_current_dir() {
            command.current_dir(dir);
        }

        let result = command
            .output()
            .await
            .map(|output| CommandOutput {
                exit_code: output.status.code(),
                stdout: output.stdout,
                stderr: output.stderr,
            })
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PlatformError::CommandNotFound {
                        command: cmd.program().to_string(),
                    }
                } else {
                    PlatformError::ProcessExecutionFailed {
                        command: cmd.program().to_string(),
                        message: e.to_string(),
                    }
                }
            });

        let duration = start.elapsed();
        match &result {
            Ok(output) => emit_process_completed(ctx, &cmd, output, duration),
            Err(e) => emit_process_failed(ctx, &cmd, e, duration),
        }
        result
    }
}
