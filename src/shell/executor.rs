//! Shell command execution
//!
//! Runs a single confirmed command string through the host's default
//! command interpreter and captures stdout, stderr and the exit code.
//! No validation or sanitisation happens here: the confirmation gate and
//! the user are the only safety boundary.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::host::OsFamily;

/// Whether a proposed command was run or skipped by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Executed,
    Skipped,
}

/// Result of handling one proposed command
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    /// The command text exactly as proposed
    pub command: String,
    pub status: ExecutionStatus,
    /// Process exit code; `None` when skipped, killed by a signal, timed out
    /// or the shell could not be spawned
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Whether the configured command timeout expired
    pub timed_out: bool,
    /// Wall-clock duration in milliseconds
    pub duration_ms: f64,
}

impl ExecutionOutcome {
    /// Outcome for a command the user declined to run
    pub fn skipped(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            status: ExecutionStatus::Skipped,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            timed_out: false,
            duration_ms: 0.0,
        }
    }

    /// Outcome for a command that ran and exited with `exit_code`
    pub fn executed(
        command: impl Into<String>,
        exit_code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            status: ExecutionStatus::Executed,
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            timed_out: false,
            duration_ms: 0.0,
        }
    }

    /// True only for executed commands that exited with code 0
    pub fn succeeded(&self) -> bool {
        self.status == ExecutionStatus::Executed && self.exit_code == Some(0)
    }
}

/// Something that can run a confirmed command string
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command`. Never fails: a non-zero exit code is data, not an error.
    async fn execute(&self, command: &str) -> ExecutionOutcome;
}

/// Runs commands through `sh -c` (unix) or `cmd /C` (windows)
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    family: OsFamily,
    command_timeout: Option<Duration>,
}

impl ShellExecutor {
    /// Create an executor for the given platform
    ///
    /// # Arguments
    /// * `family` - Host OS family, selects the interpreter
    /// * `command_timeout` - Optional bound on a single command's run time
    pub fn new(family: OsFamily, command_timeout: Option<Duration>) -> Self {
        Self {
            family,
            command_timeout,
        }
    }

    fn build_command(&self, command: &str) -> Command {
        let mut cmd = match self.family {
            OsFamily::Windows => {
                let mut c = Command::new("cmd");
                c.arg("/C").arg(command);
                c
            }
            _ => {
                let mut c = Command::new("sh");
                c.arg("-c").arg(command);
                c
            }
        };
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl CommandRunner for ShellExecutor {
    async fn execute(&self, command: &str) -> ExecutionOutcome {
        let start = Instant::now();
        let output = self.build_command(command).output();

        let result = match self.command_timeout {
            Some(limit) => match timeout(limit, output).await {
                Ok(result) => result,
                Err(_) => {
                    // kill_on_drop reaps the child when the future is dropped
                    warn!(command, timeout_secs = limit.as_secs(), "Command timed out");
                    let mut outcome = ExecutionOutcome::executed(
                        command,
                        None,
                        String::new(),
                        format!("Command timed out after {}s", limit.as_secs()),
                    );
                    outcome.timed_out = true;
                    outcome.duration_ms = start.elapsed().as_secs_f64() * 1000.0;
                    return outcome;
                }
            },
            None => output.await,
        };

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut outcome = match result {
            Ok(output) => ExecutionOutcome::executed(
                command,
                output.status.code(),
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr),
            ),
            Err(e) => {
                warn!(command, error = %e, "Failed to spawn shell");
                ExecutionOutcome::executed(command, None, String::new(), format!("Failed to execute command: {}", e))
            }
        };
        outcome.duration_ms = duration_ms;

        debug!(
            command,
            exit_code = ?outcome.exit_code,
            duration_ms,
            "Command finished"
        );
        outcome
    }
}
