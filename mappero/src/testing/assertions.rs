//! Test assertions for stage and pipeline results.

use super::RecordingRunner;
use crate::pipeline::{PipelineResult, PipelineState};
use crate::runner::StageResult;
use crate::stages::StageKind;

/// Asserts that the stage succeeded.
pub fn assert_stage_succeeded(result: &StageResult) {
    assert!(
        result.is_success(),
        "Expected {} to succeed, got {} (stderr: {})",
        result.stage,
        result.status,
        result.stderr
    );
}

/// Asserts that the stage did not succeed.
pub fn assert_stage_failed(result: &StageResult) {
    assert!(
        result.is_failure(),
        "Expected {} to fail, but it succeeded",
        result.stage
    );
}

/// Asserts that every stage of the pipeline ran and succeeded.
pub fn assert_pipeline_succeeded(result: &PipelineResult) {
    assert_eq!(
        result.state,
        PipelineState::Succeeded,
        "Expected pipeline '{}' to succeed",
        result.name
    );
    for stage in &result.stages {
        assert_stage_succeeded(stage);
    }
}

/// Asserts that the pipeline halted at `stage` and that it was the last to run.
pub fn assert_pipeline_failed_at(result: &PipelineResult, stage: StageKind) {
    assert_eq!(
        result.failed_stage(),
        Some(stage),
        "Expected pipeline '{}' to fail at {}, state was {:?}",
        result.name,
        stage,
        result.state
    );
    let last = result.stages.last().map(|s| s.stage);
    assert_eq!(last, Some(stage), "Stages ran after the failing stage");
}

/// Asserts that the runner never received a command.
pub fn assert_no_spawns(runner: &RecordingRunner) {
    assert_eq!(
        runner.call_count(),
        0,
        "Expected no process spawns, got {:?}",
        runner.subcommands()
    );
}

/// Asserts the exact sequence of subcommands the runner received.
pub fn assert_spawned_subcommands(runner: &RecordingRunner, expected: &[&str]) {
    let actual = runner.subcommands();
    assert_eq!(actual, expected, "Unexpected spawn sequence");
}
