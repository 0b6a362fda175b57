//! Pipeline state machine.

use crate::stages::StageKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a pipeline is in its lifecycle.
///
/// `Idle -> Running(i) -> Running(i + 1) ... -> Succeeded | Failed(i)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    /// Not started.
    #[default]
    Idle,
    /// Running the stage at `index`.
    Running {
        /// The running stage.
        stage: StageKind,
        /// Position in the pipeline.
        index: usize,
    },
    /// Every stage succeeded.
    Succeeded,
    /// The stage at `index` failed; no later stage ran.
    Failed {
        /// The failed stage.
        stage: StageKind,
        /// Position in the pipeline.
        index: usize,
    },
}

impl PipelineState {
    /// Moves to running the given stage.
    #[must_use]
    pub fn start(self, stage: StageKind, index: usize) -> Self {
        debug_assert!(!self.is_terminal(), "cannot start a stage after {self}");
        Self::Running { stage, index }
    }

    /// Moves a running stage to the failed state.
    #[must_use]
    pub fn fail(self) -> Self {
        match self {
            Self::Running { stage, index } => Self::Failed { stage, index },
            other => other,
        }
    }

    /// Marks the pipeline finished; no-op if a stage already failed.
    #[must_use]
    pub fn finish(self) -> Self {
        match self {
            Self::Idle | Self::Running { .. } => Self::Succeeded,
            other => other,
        }
    }

    /// Returns true for `Succeeded` and `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed { .. })
    }

    /// Returns the stage that failed, if any.
    #[must_use]
    pub fn failed_stage(&self) -> Option<StageKind> {
        match self {
            Self::Failed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running { stage, index } => write!(f, "running({stage}, #{index})"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed { stage, .. } => write!(f, "failed({stage})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let state = PipelineState::default()
            .start(StageKind::PatchMatchStereo, 0)
            .start(StageKind::StereoFusion, 1)
            .finish();
        assert_eq!(state, PipelineState::Succeeded);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_failure_is_sticky() {
        let state = PipelineState::Idle
            .start(StageKind::FeatureExtraction, 0)
            .start(StageKind::Mapper, 2)
            .fail()
            .finish();
        assert_eq!(
            state,
            PipelineState::Failed {
                stage: StageKind::Mapper,
                index: 2
            }
        );
        assert_eq!(state.failed_stage(), Some(StageKind::Mapper));
        assert_eq!(state.to_string(), "failed(mapper)");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(PipelineState::Failed {
            stage: StageKind::Mapper,
            index: 2,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"state": "failed", "stage": "mapper", "index": 2}));
    }
}
