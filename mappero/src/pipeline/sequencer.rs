//! Ordered, fail-fast execution of stage invocations.

use super::{PipelineResult, PipelineState};
use crate::config::{MatcherMethod, MatcherSelection, PipelineConfig};
use crate::errors::MapperoError;
use crate::events::{self, EventSink, NoOpEventSink};
use crate::images::ImageSet;
use crate::stages::{MeshAlgorithm, StageInvocation, StageLibrary};
use crate::workspace::Workspace;
use chrono::Utc;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Runs pipelines of stages against a workspace.
///
/// Every pipeline is planned in full before the first process is spawned,
/// then run one stage at a time. The first stage that does not succeed ends
/// the run. Failures are reported through the event sink only.
#[derive(Debug, Clone)]
pub struct Sequencer {
    library: StageLibrary,
    events: Arc<dyn EventSink>,
}

impl Sequencer {
    /// Creates a sequencer that emits no events.
    #[must_use]
    pub fn new(library: StageLibrary) -> Self {
        Self {
            library,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the stage library.
    #[must_use]
    pub fn library(&self) -> &StageLibrary {
        &self.library
    }

    /// Plans the SfM pipeline: feature extraction, matching, mapping.
    #[must_use]
    pub fn plan_sfm(
        &self,
        images: &ImageSet,
        workspace: &Workspace,
        config: &PipelineConfig,
        matcher: &MatcherSelection,
    ) -> Vec<StageInvocation> {
        let database = workspace.database_path();
        vec![
            self.library
                .feature_extraction(&config.feature_extraction, images.root(), &database),
            self.library.matcher(&database, matcher),
            self.library
                .mapper(&database, images.root(), &workspace.sparse_dir()),
        ]
    }

    /// Plans the MVS pipeline: patch-match stereo, then fusion.
    #[must_use]
    pub fn plan_mvs(&self, workspace: &Workspace) -> Vec<StageInvocation> {
        let dense = workspace.dense_dir();
        vec![
            self.library.patch_match_stereo(&dense),
            self.library
                .stereo_fusion(&dense, &workspace.fused_cloud_path()),
        ]
    }

    /// Runs feature extraction, matching and mapping into `sparse/`.
    ///
    /// # Errors
    ///
    /// Returns a precondition error for an empty image set and a
    /// configuration error if the matcher cannot be resolved; no process is
    /// spawned in either case.
    pub async fn run_sfm(
        &self,
        images: &ImageSet,
        workspace: &Workspace,
        config: &PipelineConfig,
        matcher: MatcherMethod,
    ) -> Result<PipelineResult, MapperoError> {
        require_images(images)?;
        let selection = MatcherSelection::resolve(matcher, &config.matcher)?;
        let stages = self.plan_sfm(images, workspace, config, &selection);
        self.execute("sfm", stages).await
    }

    /// Runs dense stereo and fusion inside `dense/`.
    ///
    /// # Errors
    ///
    /// Returns a precondition error for an empty image set.
    pub async fn run_mvs(
        &self,
        images: &ImageSet,
        workspace: &Workspace,
    ) -> Result<PipelineResult, MapperoError> {
        require_images(images)?;
        self.execute("mvs", self.plan_mvs(workspace)).await
    }

    /// Runs the GLOMAP global mapper into `glomap/`.
    ///
    /// # Errors
    ///
    /// Returns a precondition error for an empty image set.
    pub async fn run_glomap_sfm(
        &self,
        images: &ImageSet,
        workspace: &Workspace,
    ) -> Result<PipelineResult, MapperoError> {
        require_images(images)?;
        let stage = self.library.glomap_mapper(
            &workspace.database_path(),
            images.root(),
            &workspace.glomap_dir(),
        );
        self.execute("glomap_sfm", vec![stage]).await
    }

    /// Runs stereo fusion alone.
    ///
    /// # Errors
    ///
    /// Returns a precondition error for an empty image set.
    pub async fn run_fusion(
        &self,
        images: &ImageSet,
        workspace: &Workspace,
    ) -> Result<PipelineResult, MapperoError> {
        require_images(images)?;
        let stage = self
            .library
            .stereo_fusion(&workspace.dense_dir(), &workspace.fused_cloud_path());
        self.execute("fusion", vec![stage]).await
    }

    /// Meshes the fused cloud with the given algorithm.
    ///
    /// # Errors
    ///
    /// Returns a precondition error for an empty image set.
    pub async fn run_mesh(
        &self,
        images: &ImageSet,
        workspace: &Workspace,
        algorithm: MeshAlgorithm,
    ) -> Result<PipelineResult, MapperoError> {
        require_images(images)?;
        let output = match algorithm {
            MeshAlgorithm::Poisson => workspace.poisson_mesh_path(),
            MeshAlgorithm::Delaunay => workspace.delaunay_mesh_path(),
        };
        let stage = self
            .library
            .mesher(algorithm, &workspace.fused_cloud_path(), &output);
        self.execute("mesh", vec![stage]).await
    }

    /// Runs bundle adjustment of the model in `input_dir` alone.
    ///
    /// # Errors
    ///
    /// Returns a precondition error for an empty image set.
    pub async fn run_bundle_adjustment(
        &self,
        images: &ImageSet,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<PipelineResult, MapperoError> {
        require_images(images)?;
        let stage = self.library.bundle_adjustment(input_dir, output_dir);
        self.execute("bundle_adjustment", vec![stage]).await
    }

    /// Re-triangulates the model in `input_dir` alone.
    ///
    /// # Errors
    ///
    /// Returns a precondition error for an empty image set.
    pub async fn run_triangulation(
        &self,
        images: &ImageSet,
        workspace: &Workspace,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<PipelineResult, MapperoError> {
        require_images(images)?;
        let stage = self.library.point_triangulation(
            &workspace.database_path(),
            images.root(),
            input_dir,
            output_dir,
        );
        self.execute("triangulation", vec![stage]).await
    }

    /// Runs planned stages in order, stopping at the first that does not
    /// succeed.
    ///
    /// A failed stage ends the run with a [`PipelineState::Failed`] result,
    /// not an error; use [`PipelineResult::into_result`] to turn it into one.
    ///
    /// # Errors
    ///
    /// Returns a workspace error if a stage's directories cannot be
    /// prepared. The stage is not run and the pipeline stops.
    pub async fn execute(
        &self,
        name: &str,
        stages: Vec<StageInvocation>,
    ) -> Result<PipelineResult, MapperoError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut state = PipelineState::Idle;
        let mut results = Vec::with_capacity(stages.len());

        info!(run_id = %run_id, pipeline = name, stages = stages.len(), "Starting pipeline");
        self.events.emit(
            events::PIPELINE_STARTED,
            Some(json!({
                "run_id": run_id,
                "pipeline": name,
                "stages": stages.iter().map(|s| s.kind).collect::<Vec<_>>(),
            })),
        );

        for (index, invocation) in stages.iter().enumerate() {
            state = state.start(invocation.kind, index);
            self.events.emit(
                events::STAGE_STARTED,
                Some(json!({
                    "run_id": run_id,
                    "stage": invocation.kind,
                    "index": index,
                    "command": invocation.command.to_string(),
                })),
            );

            let result = match self.library.run(invocation).await {
                Ok(result) => result,
                Err(e) => {
                    self.events.emit(
                        events::PIPELINE_FAILED,
                        Some(json!({
                            "run_id": run_id,
                            "pipeline": name,
                            "stage": invocation.kind,
                            "error": e.to_string(),
                        })),
                    );
                    return Err(e);
                }
            };

            if let Some(failure) = result.failure() {
                self.events.emit(
                    events::STAGE_FAILED,
                    Some(json!({
                        "run_id": run_id,
                        "index": index,
                        "failure": failure.to_json(),
                    })),
                );
                results.push(result);
                state = state.fail();
                break;
            }

            self.events.emit(
                events::STAGE_COMPLETED,
                Some(json!({
                    "run_id": run_id,
                    "stage": invocation.kind,
                    "index": index,
                    "duration_ms": result.duration_ms(),
                })),
            );
            results.push(result);
        }

        let state = state.finish();
        let pipeline = PipelineResult {
            run_id,
            name: name.to_string(),
            state,
            stages: results,
            started_at,
            ended_at: Utc::now(),
        };

        match pipeline.failed_stage() {
            Some(stage) => {
                self.events.emit(
                    events::PIPELINE_FAILED,
                    Some(json!({
                        "run_id": run_id,
                        "pipeline": name,
                        "stage": stage,
                    })),
                );
            }
            None => {
                info!(
                    run_id = %run_id,
                    pipeline = name,
                    duration_ms = pipeline.duration_ms(),
                    "Pipeline complete"
                );
                self.events.emit(
                    events::PIPELINE_COMPLETED,
                    Some(json!({
                        "run_id": run_id,
                        "pipeline": name,
                        "stages": pipeline.stages.len(),
                        "duration_ms": pipeline.duration_ms(),
                    })),
                );
            }
        }

        Ok(pipeline)
    }
}

/// Fails with a precondition error when no images were discovered.
///
/// # Errors
///
/// Returns [`MapperoError::Precondition`] for an empty set.
pub(crate) fn require_images(images: &ImageSet) -> Result<(), MapperoError> {
    if images.is_empty() {
        return Err(MapperoError::precondition(format!(
            "no images found in {}",
            images.root().display()
        )));
    }
    Ok(())
}
