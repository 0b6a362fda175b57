//! Task dispatch for the command-line front end.

use super::sequencer::require_images;
use super::{PipelineResult, Sequencer};
use crate::config::{MatcherMethod, PipelineConfig};
use crate::errors::MapperoError;
use crate::images::ImageSet;
use crate::stages::MeshAlgorithm;
use crate::workspace::Workspace;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level tasks selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    /// Feature extraction, matching and mapping.
    #[default]
    Sfm,
    /// Dense stereo and fusion.
    Mvs,
    /// Fusion only.
    Fusion,
    /// Meshing only.
    Mesh,
    /// Bundle adjustment; recognised but not available as a task.
    BundleAdjustment,
    /// Point triangulation; recognised but not available as a task.
    Triangulation,
}

impl Task {
    /// Returns the task name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sfm => "sfm",
            Self::Mvs => "mvs",
            Self::Fusion => "fusion",
            Self::Mesh => "mesh",
            Self::BundleAdjustment => "bundle_adjustment",
            Self::Triangulation => "triangulation",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-task choices that are not part of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOptions {
    /// Matcher method name, validated when the SfM task is planned.
    pub matcher: String,
    /// Mesher used by the mesh task.
    pub mesher: MeshAlgorithm,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            matcher: MatcherMethod::default().as_str().to_string(),
            mesher: MeshAlgorithm::default(),
        }
    }
}

impl Sequencer {
    /// Runs a top-level task.
    ///
    /// # Errors
    ///
    /// Returns a precondition error for an empty image set, a configuration
    /// error for an unknown matcher, and [`MapperoError::NotImplemented`]
    /// for tasks that are recognised but not available. No process is
    /// spawned in any of these cases.
    pub async fn run_task(
        &self,
        task: Task,
        images: &ImageSet,
        workspace: &Workspace,
        config: &PipelineConfig,
        options: &TaskOptions,
    ) -> Result<PipelineResult, MapperoError> {
        require_images(images)?;
        match task {
            Task::Sfm => {
                let method: MatcherMethod = options.matcher.parse()?;
                self.run_sfm(images, workspace, config, method).await
            }
            Task::Mvs => self.run_mvs(images, workspace).await,
            Task::Fusion => self.run_fusion(images, workspace).await,
            Task::Mesh => self.run_mesh(images, workspace, options.mesher).await,
            Task::BundleAdjustment => Err(MapperoError::not_implemented(
                "bundle adjustment is not yet implemented",
            )),
            Task::Triangulation => Err(MapperoError::not_implemented(
                "triangulation is not yet implemented",
            )),
        }
    }
}
