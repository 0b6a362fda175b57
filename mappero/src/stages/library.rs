//! Stage invocations and their execution.

use super::params;
use super::{MeshAlgorithm, StageKind};
use crate::command::{build_command, Command, StageParameters};
use crate::config::{FeatureExtractionConfig, MatcherSelection, ToolsConfig};
use crate::errors::MapperoError;
use crate::runner::{ProcessRunner, StageResult};
use crate::workspace::ensure_dir;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// A fully built stage, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageInvocation {
    /// Which stage this is.
    pub kind: StageKind,
    /// The command to execute.
    pub command: Command,
    /// Directories that must exist before the command runs.
    pub required_dirs: Vec<PathBuf>,
}

impl StageInvocation {
    fn new(kind: StageKind, command: Command) -> Self {
        Self {
            kind,
            command,
            required_dirs: Vec::new(),
        }
    }

    fn requires_dir(mut self, dir: &Path) -> Self {
        self.required_dirs.push(dir.to_path_buf());
        self
    }

    fn requires_parent_of(self, file: &Path) -> Self {
        match file.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => self.requires_dir(parent),
            None => self,
        }
    }
}

/// Builds stage invocations for the configured tools and runs them.
#[derive(Debug, Clone)]
pub struct StageLibrary {
    tools: ToolsConfig,
    runner: Arc<dyn ProcessRunner>,
}

impl StageLibrary {
    /// Creates a stage library.
    #[must_use]
    pub fn new(tools: ToolsConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { tools, runner }
    }

    /// Returns the tool configuration.
    #[must_use]
    pub fn tools(&self) -> &ToolsConfig {
        &self.tools
    }

    fn invocation(&self, kind: StageKind, params: StageParameters) -> StageInvocation {
        let program = kind.tool().binary(&self.tools);
        StageInvocation::new(kind, build_command(program, &[kind.subcommand()], params))
    }

    /// Feature extraction from `image_dir` into `database`.
    #[must_use]
    pub fn feature_extraction(
        &self,
        config: &FeatureExtractionConfig,
        image_dir: &Path,
        database: &Path,
    ) -> StageInvocation {
        self.invocation(
            StageKind::FeatureExtraction,
            params::feature_extraction(config, image_dir, database),
        )
        .requires_parent_of(database)
    }

    /// Feature matching with the selected method.
    #[must_use]
    pub fn matcher(&self, database: &Path, selection: &MatcherSelection) -> StageInvocation {
        let kind = match selection {
            MatcherSelection::Exhaustive { .. } => StageKind::ExhaustiveMatcher,
            MatcherSelection::Sequential { .. } => StageKind::SequentialMatcher,
            MatcherSelection::VocabTree { .. } => StageKind::VocabTreeMatcher,
        };
        self.invocation(kind, params::matcher(database, selection))
    }

    /// Incremental mapping into `output_dir`.
    #[must_use]
    pub fn mapper(&self, database: &Path, image_dir: &Path, output_dir: &Path) -> StageInvocation {
        self.invocation(StageKind::Mapper, params::mapper(database, image_dir, output_dir))
            .requires_dir(output_dir)
    }

    /// Bundle adjustment of the model in `input_dir`.
    #[must_use]
    pub fn bundle_adjustment(&self, input_dir: &Path, output_dir: &Path) -> StageInvocation {
        self.invocation(
            StageKind::BundleAdjuster,
            params::bundle_adjustment(input_dir, output_dir),
        )
        .requires_dir(output_dir)
    }

    /// Point triangulation for the model in `input_dir`.
    #[must_use]
    pub fn point_triangulation(
        &self,
        database: &Path,
        image_dir: &Path,
        input_dir: &Path,
        output_dir: &Path,
    ) -> StageInvocation {
        self.invocation(
            StageKind::PointTriangulator,
            params::point_triangulation(database, image_dir, input_dir, output_dir),
        )
        .requires_dir(output_dir)
    }

    /// Patch-match stereo inside the dense workspace.
    #[must_use]
    pub fn patch_match_stereo(&self, dense_dir: &Path) -> StageInvocation {
        self.invocation(StageKind::PatchMatchStereo, params::patch_match_stereo(dense_dir))
            .requires_dir(dense_dir)
    }

    /// Fusion of the dense workspace's depth maps into `output_cloud`.
    #[must_use]
    pub fn stereo_fusion(&self, dense_dir: &Path, output_cloud: &Path) -> StageInvocation {
        self.invocation(
            StageKind::StereoFusion,
            params::stereo_fusion(dense_dir, output_cloud),
        )
        .requires_parent_of(output_cloud)
    }

    /// Surface reconstruction from `input` into `output_mesh`.
    #[must_use]
    pub fn mesher(&self, algorithm: MeshAlgorithm, input: &Path, output_mesh: &Path) -> StageInvocation {
        self.invocation(algorithm.stage(), params::mesher(input, output_mesh))
            .requires_parent_of(output_mesh)
    }

    /// Global mapping with GLOMAP into `output_dir`.
    #[must_use]
    pub fn glomap_mapper(&self, database: &Path, image_dir: &Path, output_dir: &Path) -> StageInvocation {
        self.invocation(StageKind::GlomapMapper, params::mapper(database, image_dir, output_dir))
            .requires_dir(output_dir)
    }

    /// Prepares the invocation's directories and runs its command once.
    ///
    /// A process that fails is reported through the returned result, not as
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns a workspace error if a required directory cannot be created;
    /// the command is not run in that case.
    pub async fn run(&self, invocation: &StageInvocation) -> Result<StageResult, MapperoError> {
        for dir in &invocation.required_dirs {
            ensure_dir(dir)?;
        }

        info!(stage = %invocation.kind, "Starting stage");
        let started_at = Utc::now();
        let outcome = self.runner.run(&invocation.command).await;
        let result = StageResult::from_outcome(
            invocation.kind,
            invocation.command.clone(),
            outcome,
            started_at,
        );

        if result.is_success() {
            info!(
                stage = %result.stage,
                duration_ms = result.duration_ms(),
                "Stage complete"
            );
        } else {
            debug!(
                stage = %result.stage,
                status = %result.status,
                exit_code = ?result.exit_code,
                "Stage did not succeed"
            );
        }
        Ok(result)
    }
}
