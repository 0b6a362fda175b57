//! Error types for the mappero orchestrator.
//!
//! Errors fall into three families that callers must be able to tell apart:
//! preconditions and configuration problems detected before any process is
//! spawned, stage failures reported by an external tool, and tasks that are
//! recognised but not built yet.

use crate::runner::StageStatus;
use crate::stages::StageKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for mappero operations.
#[derive(Debug, Error)]
pub enum MapperoError {
    /// A precondition for starting a pipeline does not hold.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A configuration value is missing or malformed.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// An external stage exited unsuccessfully.
    #[error("{0}")]
    StageFailed(#[from] StageFailure),

    /// The requested task is recognised but not implemented.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// A workspace path could not be prepared.
    #[error("{0}")]
    Workspace(#[from] WorkspaceError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MapperoError {
    /// Creates a precondition error.
    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Creates a not-implemented error.
    #[must_use]
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::NotImplemented(message.into())
    }

    /// Short machine-readable name of the error family.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Precondition(_) => "precondition",
            Self::Configuration(_) => "configuration",
            Self::StageFailed(_) => "stage_failed",
            Self::NotImplemented(_) => "not_implemented",
            Self::Workspace(_) => "workspace",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }

    /// Returns true if the error was raised before any process was spawned.
    #[must_use]
    pub fn is_pre_spawn(&self) -> bool {
        matches!(
            self,
            Self::Precondition(_) | Self::Configuration(_) | Self::NotImplemented(_)
        )
    }
}

/// Errors in the pipeline configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigurationError {
    /// The matcher method name is not one of the supported methods.
    #[error("Unknown matcher method '{method}' (expected one of: exhaustive, sequential, vocab_tree)")]
    UnknownMatcher {
        /// The rejected method name.
        method: String,
    },

    /// A value required by the selected options is not set.
    #[error("Missing configuration value '{key}': {reason}")]
    MissingValue {
        /// Dotted configuration key.
        key: String,
        /// Why the value is required.
        reason: String,
    },

    /// The configuration file could not be read or parsed.
    #[error("Failed to load configuration from {}: {message}", .path.display())]
    Load {
        /// The configuration file.
        path: PathBuf,
        /// The underlying problem.
        message: String,
    },
}

impl ConfigurationError {
    /// Creates an unknown matcher error.
    #[must_use]
    pub fn unknown_matcher(method: impl Into<String>) -> Self {
        Self::UnknownMatcher {
            method: method.into(),
        }
    }

    /// Creates a missing value error.
    #[must_use]
    pub fn missing_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MissingValue {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Creates a load error.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while preparing workspace directories.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The workspace root does not exist or is not a directory.
    #[error("Workspace root {} does not exist or is not a directory", .path.display())]
    MissingRoot {
        /// The workspace root.
        path: PathBuf,
    },

    /// A path that should be a directory exists as something else.
    #[error("{} exists and is not a directory", .path.display())]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// Creating a directory failed.
    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir {
        /// The directory being created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Failure of one external stage, with everything needed to diagnose it
/// without re-running the tool.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("Stage {stage} {status}{}: {command_line}", .exit_code.map(|c| format!(" with exit code {c}")).unwrap_or_default())]
pub struct StageFailure {
    /// The stage that failed.
    pub stage: StageKind,
    /// Terminal status of the stage (failed or cancelled).
    pub status: StageStatus,
    /// The full command line that was executed.
    pub command_line: String,
    /// Process exit code, absent when the process never ran or was killed.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error, or the spawn/cancel reason.
    pub stderr: String,
}

impl StageFailure {
    /// Returns the captured diagnostics, standard error first.
    #[must_use]
    pub fn diagnostics(&self) -> String {
        match (self.stderr.trim(), self.stdout.trim()) {
            ("", out) => out.to_string(),
            (err, "") => err.to_string(),
            (err, out) => format!("{err}\n{out}"),
        }
    }

    /// Converts to a JSON value for event payloads.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "stage": self.stage,
            "status": self.status,
            "command": self.command_line,
            "exit_code": self.exit_code,
            "stderr": self.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper_failure() -> StageFailure {
        StageFailure {
            stage: StageKind::Mapper,
            status: StageStatus::Failed,
            command_line: "colmap mapper --database_path /ws/database.db".to_string(),
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "No good initial image pair found.".to_string(),
        }
    }

    #[test]
    fn test_stage_failure_display() {
        let err = mapper_failure();
        let text = err.to_string();

        assert!(text.contains("mapper"));
        assert!(text.contains("exit code 1"));
        assert!(text.contains("colmap mapper --database_path"));
    }

    #[test]
    fn test_stage_failure_without_exit_code() {
        let mut err = mapper_failure();
        err.exit_code = None;
        assert!(!err.to_string().contains("exit code"));
    }

    #[test]
    fn test_stage_failure_diagnostics() {
        let mut err = mapper_failure();
        assert_eq!(err.diagnostics(), "No good initial image pair found.");

        err.stdout = "Loading database".to_string();
        assert_eq!(
            err.diagnostics(),
            "No good initial image pair found.\nLoading database"
        );
    }

    #[test]
    fn test_stage_failure_to_json() {
        let json = mapper_failure().to_json();
        assert_eq!(json["stage"], "mapper");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["exit_code"], 1);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(MapperoError::precondition("no images").kind(), "precondition");
        assert_eq!(MapperoError::not_implemented("triangulation").kind(), "not_implemented");

        let err: MapperoError = ConfigurationError::unknown_matcher("spatial").into();
        assert_eq!(err.kind(), "configuration");
        assert!(err.is_pre_spawn());

        let err: MapperoError = mapper_failure().into();
        assert_eq!(err.kind(), "stage_failed");
        assert!(!err.is_pre_spawn());
    }

    #[test]
    fn test_unknown_matcher_message() {
        let err = ConfigurationError::unknown_matcher("spatial");
        assert!(err.to_string().contains("'spatial'"));
    }

    #[test]
    fn test_workspace_error_display() {
        let err = WorkspaceError::NotADirectory {
            path: PathBuf::from("/ws/sparse"),
        };
        assert_eq!(err.to_string(), "/ws/sparse exists and is not a directory");
    }
}
