//! Testing utilities for mappero pipelines.
//!
//! This module provides:
//! - A fake process runner that records commands instead of spawning
//! - Image set fixtures
//! - Assertions over stage and pipeline results

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_no_spawns, assert_pipeline_failed_at, assert_pipeline_succeeded,
    assert_spawned_subcommands, assert_stage_failed, assert_stage_succeeded,
};
pub use fixtures::{fake_images, no_images};
pub use mocks::RecordingRunner;
