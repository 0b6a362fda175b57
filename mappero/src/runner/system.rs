//! Runner that spawns real child processes.

use super::{ProcessOutcome, ProcessRunner};
use crate::command::Command;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Spawns commands as child processes and waits for them.
///
/// Standard output and error are captured. With a deadline configured, a
/// process that outlives it is killed and reported as cancelled.
#[derive(Debug, Clone, Default)]
pub struct SystemProcessRunner {
    timeout: Option<Duration>,
}

impl SystemProcessRunner {
    /// Creates a runner without a deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a per-command deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the per-command deadline.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(&self, command: &Command) -> ProcessOutcome {
        info!(command = %command, "Running command");

        let child = tokio::process::Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                error!(command = %command, error = %e, "Failed to spawn command");
                return ProcessOutcome::abnormal(format!(
                    "failed to spawn '{}': {e}",
                    command.program()
                ));
            }
        };

        // Dropping the wait future on timeout drops the child, which kills it.
        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(waited) => waited,
                Err(_) => {
                    warn!(
                        command = %command,
                        timeout_secs = limit.as_secs_f64(),
                        "Command exceeded its deadline and was killed"
                    );
                    return ProcessOutcome::cancelled(format!(
                        "deadline of {:.1}s exceeded",
                        limit.as_secs_f64()
                    ));
                }
            },
            None => child.wait_with_output().await,
        };

        let output = match waited {
            Ok(output) => output,
            Err(e) => {
                error!(command = %command, error = %e, "Failed to wait for command");
                return ProcessOutcome::abnormal(format!("failed to wait for process: {e}"));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        match output.status.code() {
            Some(0) => {
                debug!(command = %command, stdout_bytes = stdout.len(), "Command succeeded");
                ProcessOutcome::success(String::new()).with_output(stdout, stderr)
            }
            Some(code) => {
                error!(command = %command, exit_code = code, "Command failed");
                ProcessOutcome::failure(code, String::new()).with_output(stdout, stderr)
            }
            None => {
                error!(command = %command, "Command terminated by signal");
                let stderr = if stderr.is_empty() {
                    "process terminated by signal".to_string()
                } else {
                    stderr
                };
                ProcessOutcome::abnormal(String::new()).with_output(stdout, stderr)
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::runner::StageStatus;

    #[tokio::test]
    async fn test_zero_exit_succeeds() {
        let runner = SystemProcessRunner::new();
        let outcome = runner.run(&Command::new("sh", ["-c", "echo extracted"])).await;

        assert_eq!(outcome.status, StageStatus::Succeeded);
        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(outcome.stdout.trim(), "extracted");
    }

    #[tokio::test]
    async fn test_nonzero_exit_fails_with_output() {
        let runner = SystemProcessRunner::new();
        let outcome = runner
            .run(&Command::new("sh", ["-c", "echo progress; echo broken >&2; exit 3"]))
            .await;

        assert_eq!(outcome.status, StageStatus::Failed);
        assert_eq!(outcome.exit_code, Some(3));
        assert_eq!(outcome.stdout.trim(), "progress");
        assert_eq!(outcome.stderr.trim(), "broken");
    }

    #[tokio::test]
    async fn test_missing_binary_fails_without_exit_code() {
        let runner = SystemProcessRunner::new();
        let outcome = runner
            .run(&Command::new("mappero-definitely-not-installed", ["mapper"]))
            .await;

        assert_eq!(outcome.status, StageStatus::Failed);
        assert_eq!(outcome.exit_code, None);
        assert!(outcome.stderr.contains("failed to spawn"));
    }

    #[tokio::test]
    async fn test_deadline_cancels_process() {
        let runner = SystemProcessRunner::new().with_timeout(Duration::from_millis(100));
        let outcome = runner.run(&Command::new("sleep", ["5"])).await;

        assert_eq!(outcome.status, StageStatus::Cancelled);
        assert_eq!(outcome.exit_code, None);
        assert!(outcome.stderr.contains("deadline"));
    }
}
