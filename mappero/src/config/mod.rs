//! Pipeline configuration.
//!
//! Configuration is loaded from a JSON or YAML file, merged with command-line
//! overrides, and then treated as read-only by the stage library. The
//! resolved configuration is written into the workspace for provenance.

mod matcher;
mod pipeline;

pub use matcher::{MatcherMethod, MatcherSelection};
pub use pipeline::{
    ConfigFormat, ConfigOverrides, FeatureExtractionConfig, MatcherConfig, PipelineConfig,
    SequentialMatcherConfig, ToolsConfig,
};
