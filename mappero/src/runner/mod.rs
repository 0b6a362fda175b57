//! Execution of external tool commands.
//!
//! The [`ProcessRunner`] trait is the seam between the orchestrator and the
//! reconstruction binaries: stages and pipelines only ever see a runner, so
//! tests substitute a fake that records invocations instead of spawning.

mod result;
mod system;

pub use result::{ProcessOutcome, StageResult, StageStatus};
pub use system::SystemProcessRunner;

use crate::command::Command;
use async_trait::async_trait;
use std::fmt::Debug;

/// Executes one command and reports how it ended.
///
/// Implementations make exactly one attempt per call and never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessRunner: Send + Sync + Debug {
    /// Runs the command to completion.
    async fn run(&self, command: &Command) -> ProcessOutcome;
}
