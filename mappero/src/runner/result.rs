//! Process outcomes and stage results.

use crate::command::Command;
use crate::errors::StageFailure;
use crate::stages::StageKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal status of one external invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// The process exited with code zero.
    Succeeded,
    /// The process exited non-zero, was killed by a signal, or never started.
    Failed,
    /// The process was killed after exceeding its deadline.
    Cancelled,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl StageStatus {
    /// Returns true if the status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// What a [`ProcessRunner`](super::ProcessRunner) observed for one command.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    /// Terminal status.
    pub status: StageStatus,
    /// Exit code, when the process exited normally.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ProcessOutcome {
    /// A zero exit with the given standard output.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Succeeded,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A non-zero exit with the given standard error.
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Failed,
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// A process that could not be started, or ended without an exit code.
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Failed,
            exit_code: None,
            stdout: String::new(),
            stderr: reason.into(),
        }
    }

    /// A process that was killed by the runner.
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Cancelled,
            exit_code: None,
            stdout: String::new(),
            stderr: reason.into(),
        }
    }

    /// Attaches captured output to the outcome.
    pub fn with_output(mut self, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self.stderr = stderr.into();
        self
    }

    /// Returns true if the process succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Outcome of one stage: which stage ran, the exact command, and how the
/// process ended.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    /// The stage that ran.
    pub stage: StageKind,
    /// The command that was executed.
    pub command: Command,
    /// Terminal status.
    pub status: StageStatus,
    /// Exit code, when the process exited normally.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// When the stage started.
    pub started_at: DateTime<Utc>,
    /// When the stage ended.
    pub ended_at: DateTime<Utc>,
}

impl StageResult {
    /// Combines a process outcome with the stage and command that produced it.
    pub fn from_outcome(
        stage: StageKind,
        command: Command,
        outcome: ProcessOutcome,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            stage,
            command,
            status: outcome.status,
            exit_code: outcome.exit_code,
            stdout: outcome.stdout,
            stderr: outcome.stderr,
            started_at,
            ended_at: Utc::now(),
        }
    }

    /// Returns true if the stage succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if the stage failed or was cancelled.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Returns the duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        (self.ended_at - self.started_at).num_milliseconds() as f64
    }

    /// Returns the failure details if the stage did not succeed.
    #[must_use]
    pub fn failure(&self) -> Option<StageFailure> {
        if self.is_success() {
            return None;
        }
        Some(StageFailure {
            stage: self.stage,
            status: self.status,
            command_line: self.command.to_string(),
            exit_code: self.exit_code,
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        })
    }

    /// Converts a failed result into an error.
    ///
    /// # Errors
    ///
    /// Returns the [`StageFailure`] if the stage failed or was cancelled.
    pub fn into_result(self) -> Result<Self, StageFailure> {
        match self.failure() {
            Some(failure) => Err(failure),
            None => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper_command() -> Command {
        Command::new("colmap", ["mapper", "--database_path", "/ws/database.db"])
    }

    #[test]
    fn test_stage_result_success() {
        let result = StageResult::from_outcome(
            StageKind::Mapper,
            mapper_command(),
            ProcessOutcome::success("Elapsed time: 0.1 [minutes]"),
            Utc::now(),
        );

        assert!(result.is_success());
        assert!(!result.is_failure());
        assert_eq!(result.exit_code, Some(0));
        assert!(result.failure().is_none());
        assert!(result.into_result().is_ok());
    }

    #[test]
    fn test_stage_result_failure_carries_command() {
        let result = StageResult::from_outcome(
            StageKind::Mapper,
            mapper_command(),
            ProcessOutcome::failure(3, "No good initial image pair found."),
            Utc::now(),
        );

        let failure = result.into_result().unwrap_err();
        assert_eq!(failure.stage, StageKind::Mapper);
        assert_eq!(failure.exit_code, Some(3));
        assert_eq!(failure.command_line, "colmap mapper --database_path /ws/database.db");
        assert_eq!(failure.stderr, "No good initial image pair found.");
    }

    #[test]
    fn test_cancelled_counts_as_failure() {
        let result = StageResult::from_outcome(
            StageKind::PatchMatchStereo,
            Command::new("colmap", ["patch_match_stereo"]),
            ProcessOutcome::cancelled("deadline exceeded"),
            Utc::now(),
        );

        assert!(result.is_failure());
        let failure = result.failure().unwrap();
        assert_eq!(failure.status, StageStatus::Cancelled);
        assert_eq!(failure.exit_code, None);
    }

    #[test]
    fn test_stage_result_duration() {
        let started = Utc::now();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let result = StageResult::from_outcome(
            StageKind::StereoFusion,
            Command::new("colmap", ["stereo_fusion"]),
            ProcessOutcome::success(""),
            started,
        );

        assert!(result.duration_ms() >= 10.0);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(StageStatus::Succeeded.to_string(), "succeeded");
        assert_eq!(StageStatus::Failed.to_string(), "failed");
        assert_eq!(StageStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_outcome_with_output() {
        let outcome = ProcessOutcome::failure(1, "").with_output("partial", "boom");
        assert_eq!(outcome.stdout, "partial");
        assert_eq!(outcome.stderr, "boom");
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_stage_result_serialization() {
        let result = StageResult::from_outcome(
            StageKind::Mapper,
            mapper_command(),
            ProcessOutcome::success(""),
            Utc::now(),
        );

        let json = serde_json::to_string(&result).unwrap();
        let deserialized: StageResult = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.stage, StageKind::Mapper);
        assert_eq!(deserialized.status, StageStatus::Succeeded);
        assert_eq!(deserialized.command, result.command);
    }
}
