//! Pipeline results.

use super::PipelineState;
use crate::errors::{MapperoError, StageFailure};
use crate::runner::StageResult;
use crate::stages::StageKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one pipeline run: the terminal state and every stage that ran.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// Pipeline name (e.g. "sfm").
    pub name: String,
    /// Terminal state.
    pub state: PipelineState,
    /// Results of the stages that ran, in order.
    pub stages: Vec<StageResult>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run ended.
    pub ended_at: DateTime<Utc>,
}

impl PipelineResult {
    /// Returns true if every stage succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.state == PipelineState::Succeeded
    }

    /// Returns the stage the pipeline halted at, if it failed.
    #[must_use]
    pub fn failed_stage(&self) -> Option<StageKind> {
        self.state.failed_stage()
    }

    /// Returns the failure details of the halting stage.
    #[must_use]
    pub fn failure(&self) -> Option<StageFailure> {
        self.stages.last().and_then(StageResult::failure)
    }

    /// Returns the result of the given stage, if it ran.
    #[must_use]
    pub fn stage(&self, kind: StageKind) -> Option<&StageResult> {
        self.stages.iter().find(|s| s.stage == kind)
    }

    /// Returns the wall-clock duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.ended_at - self.started_at).num_milliseconds()
    }

    /// Converts a failed pipeline into a stage failure error.
    ///
    /// # Errors
    ///
    /// Returns [`MapperoError::StageFailed`] for the halting stage.
    pub fn into_result(self) -> Result<Self, MapperoError> {
        match self.failure() {
            Some(failure) => Err(failure.into()),
            None => Ok(self),
        }
    }
}
