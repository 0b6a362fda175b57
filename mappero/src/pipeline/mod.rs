//! Pipeline sequencing.
//!
//! This module provides:
//! - The pipeline state machine
//! - Pipeline results
//! - The sequencer that runs stages in order and halts on the first failure
//! - Task dispatch for the command-line front end

mod result;
mod sequencer;
mod state;
mod task;


pub use result::PipelineResult;
pub use sequencer::Sequencer;
pub use state::PipelineState;
pub use task::{Task, TaskOptions};
