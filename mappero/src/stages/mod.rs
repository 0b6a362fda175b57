//! The reconstruction stage library.
//!
//! One constructor per external stage. Each turns domain inputs (config
//! groups and workspace paths) into a [`StageParameters`](crate::command::StageParameters)
//! set, builds the command, and records which directories must exist before
//! the tool runs. [`StageLibrary::run`] executes an invocation through the
//! configured [`ProcessRunner`](crate::runner::ProcessRunner).

mod kind;
mod library;
pub mod params;

pub use kind::{MeshAlgorithm, StageKind, Tool};
pub use library::{StageInvocation, StageLibrary};
