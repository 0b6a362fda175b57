//! # Mappero
//!
//! Orchestration of COLMAP and GLOMAP 3D-reconstruction pipelines.
//!
//! Mappero does not reconstruct anything itself. It drives the external
//! tools stage by stage against a managed workspace directory:
//!
//! - **Command building**: typed stage parameters become `--key value` tokens
//! - **Process running**: one attempt per stage, behind a substitutable runner
//! - **Workspace management**: canonical paths derived from one root
//! - **Stage library**: one constructor per reconstruction stage
//! - **Pipeline sequencing**: ordered stages that halt on the first failure
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mappero::prelude::*;
//! use std::sync::Arc;
//!
//! let workspace = Workspace::open("/data/south-building")?;
//! let config = PipelineConfig::default();
//! let images = discover_and_record(&workspace.default_image_dir(), &workspace.image_manifest_path())?;
//!
//! let library = StageLibrary::new(config.tools.clone(), Arc::new(SystemProcessRunner::new()));
//! let sequencer = Sequencer::new(library).with_event_sink(Arc::new(LoggingEventSink::default()));
//!
//! let result = sequencer
//!     .run_sfm(&images, &workspace, &config, MatcherMethod::Exhaustive)
//!     .await?
//!     .into_result()?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod command;
pub mod config;
pub mod errors;
pub mod events;
pub mod images;
pub mod pipeline;
pub mod runner;
pub mod stages;
pub mod testing;
pub mod workspace;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::command::{build_command, Command, ParamValue, StageParameters};
    pub use crate::config::{
        ConfigOverrides, MatcherMethod, MatcherSelection, PipelineConfig, ToolsConfig,
    };
    pub use crate::errors::{ConfigurationError, MapperoError, StageFailure, WorkspaceError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::images::{discover_and_record, discover_images, ImageSet};
    pub use crate::pipeline::{PipelineResult, PipelineState, Sequencer, Task, TaskOptions};
    pub use crate::runner::{
        ProcessOutcome, ProcessRunner, StageResult, StageStatus, SystemProcessRunner,
    };
    pub use crate::stages::{MeshAlgorithm, StageInvocation, StageKind, StageLibrary};
    pub use crate::workspace::{ensure_dir, Workspace};
}
