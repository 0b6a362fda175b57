//! Pipeline event sinks.
//!
//! The sequencer reports progress as events instead of printing. Console
//! output, test capture and any other presentation plug in as an
//! [`EventSink`].

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Event emitted when a pipeline starts.
pub const PIPELINE_STARTED: &str = "pipeline.started";
/// Event emitted when every stage of a pipeline succeeded.
pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
/// Event emitted when a pipeline halted on a failed stage.
pub const PIPELINE_FAILED: &str = "pipeline.failed";
/// Event emitted before a stage's process is spawned.
pub const STAGE_STARTED: &str = "stage.started";
/// Event emitted when a stage succeeded.
pub const STAGE_COMPLETED: &str = "stage.completed";
/// Event emitted when a stage failed or was cancelled.
pub const STAGE_FAILED: &str = "stage.failed";
