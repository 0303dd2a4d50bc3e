//! External command execution.
//!
//! Every version-control operation goes through [`CommandExecutor`], which
//! runs one command to completion, captures its output and normalizes
//! failures into [`CommandError`]. No retries happen here.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::debug;

use crate::error::CommandError;

/// Default per-command timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Options applied to a single command invocation.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Working directory for the child process (inherits ours when `None`).
    pub cwd: Option<PathBuf>,

    /// Upper bound on runtime. A zero duration disables the bound.
    pub timeout: Duration,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ExecOptions {
    pub fn in_dir(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(cwd.into()),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Result of one external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Whether the process exited with status 0.
    pub exit_succeeded: bool,

    /// Exit code, `None` when terminated by a signal.
    pub exit_code: Option<i32>,

    /// Captured stdout with trailing whitespace removed.
    pub output: String,

    /// Diagnostic text for a failed command (stderr, or stdout when stderr is empty).
    pub error_message: Option<String>,
}

impl ExecutionResult {
    /// Convert a non-zero exit into [`CommandError::Failed`].
    pub fn into_result(self, command: &str) -> Result<ExecutionResult, CommandError> {
        if self.exit_succeeded {
            return Ok(self);
        }
        Err(self.into_failure(command))
    }

    /// Describe this result as a failure of `command`, whatever its exit status.
    pub fn into_failure(self, command: &str) -> CommandError {
        CommandError::Failed {
            command: command.to_string(),
            code: self.exit_code,
            message: self.error_message.unwrap_or_default(),
        }
    }
}

/// Render a command for logs and error messages.
pub fn display_command(command: &[&str]) -> String {
    command.join(" ")
}

/// Runs external commands one at a time.
pub struct CommandExecutor;

impl CommandExecutor {
    /// Run `command` and return its result regardless of exit status.
    ///
    /// Only spawn failures and timeouts are errors here; a non-zero exit is
    /// reported through [`ExecutionResult::exit_succeeded`].
    pub async fn capture(
        command: &[&str],
        options: &ExecOptions,
    ) -> Result<ExecutionResult, CommandError> {
        let (exe, args) = command.split_first().ok_or(CommandError::EmptyCommand)?;
        let rendered = display_command(command);
        let start = Instant::now();

        let mut cmd = Command::new(exe);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }

        let child = cmd.spawn().map_err(|source| CommandError::Spawn {
            command: rendered.clone(),
            source,
        })?;

        let waited = if options.timeout.is_zero() {
            child.wait_with_output().await
        } else {
            tokio::time::timeout(options.timeout, child.wait_with_output())
                .await
                .map_err(|_| CommandError::TimedOut {
                    command: rendered.clone(),
                    timeout_secs: options.timeout.as_secs(),
                })?
        };
        let output = waited.map_err(|source| CommandError::Spawn {
            command: rendered.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let exit_succeeded = output.status.success();

        debug!(
            command = %rendered,
            exit_code = ?output.status.code(),
            duration_ms = start.elapsed().as_millis() as u64,
            "command finished"
        );

        let error_message = if exit_succeeded {
            None
        } else if stderr.is_empty() {
            Some(stdout.trim().to_string())
        } else {
            Some(stderr)
        };

        Ok(ExecutionResult {
            exit_succeeded,
            exit_code: output.status.code(),
            output: stdout,
            error_message,
        })
    }

    /// Run `command`, treating a non-zero exit as [`CommandError::Failed`].
    pub async fn execute(
        command: &[&str],
        options: &ExecOptions,
    ) -> Result<ExecutionResult, CommandError> {
        let result = Self::capture(command, options).await?;
        result.into_result(&display_command(command))
    }
}
