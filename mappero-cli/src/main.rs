//! mappero CLI: runs COLMAP and GLOMAP reconstruction pipelines on a workspace.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use mappero::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "mappero")]
#[command(about = "Run COLMAP/GLOMAP structure-from-motion and multi-view stereo pipelines")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a COLMAP task on a workspace.
    Colmap(ColmapArgs),

    /// Run GLOMAP global structure-from-motion on a workspace.
    Glomap(GlomapArgs),
}

#[derive(Debug, Clone, Args)]
struct CommonArgs {
    /// Workspace directory (must exist).
    workspace: PathBuf,

    /// Configuration file (JSON or YAML). Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Image directory. Defaults to <WORKSPACE>/images.
    #[arg(long)]
    image_path: Option<PathBuf>,

    /// Hand the finished model off to an external viewer.
    #[arg(long)]
    vis: bool,

    /// Keep statistical outliers when visualizing.
    #[arg(long)]
    keep_outliers: bool,

    /// Kill a stage that runs longer than this many seconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Args)]
struct ColmapArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Task to run.
    #[arg(long, value_enum, default_value_t = TaskArg::Sfm)]
    task: TaskArg,

    /// Matcher method: exhaustive, sequential or vocab_tree.
    #[arg(long, default_value = "exhaustive")]
    matcher: String,

    /// Maximum image size for feature extraction.
    #[arg(long)]
    max_image_size: Option<u32>,

    /// Maximum number of features per image.
    #[arg(long)]
    max_num_features: Option<u32>,

    /// Exhaustive matcher block size.
    #[arg(long)]
    block_size: Option<u32>,

    /// Mesher used by the mesh task.
    #[arg(long, value_enum, default_value_t = MesherArg::Poisson)]
    mesher: MesherArg,
}

#[derive(Debug, Clone, Args)]
struct GlomapArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TaskArg {
    Sfm,
    Mvs,
    Fusion,
    Mesh,
    BundleAdjustment,
    Triangulation,
}

impl TaskArg {
    fn to_core(self) -> Task {
        match self {
            Self::Sfm => Task::Sfm,
            Self::Mvs => Task::Mvs,
            Self::Fusion => Task::Fusion,
            Self::Mesh => Task::Mesh,
            Self::BundleAdjustment => Task::BundleAdjustment,
            Self::Triangulation => Task::Triangulation,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MesherArg {
    Poisson,
    Delaunay,
}

impl MesherArg {
    fn to_core(self) -> MeshAlgorithm {
        match self {
            Self::Poisson => MeshAlgorithm::Poisson,
            Self::Delaunay => MeshAlgorithm::Delaunay,
        }
    }
}

/// Everything resolved before the first stage runs.
struct Prepared {
    workspace: Workspace,
    config: PipelineConfig,
    images: ImageSet,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Colmap(args) => run_colmap(&args).await,
        Commands::Glomap(args) => run_glomap(&args).await,
    }
}

async fn run_colmap(args: &ColmapArgs) -> Result<()> {
    let overrides = ConfigOverrides {
        max_image_size: args.max_image_size,
        max_num_features: args.max_num_features,
        block_size: args.block_size,
        ..ConfigOverrides::default()
    };
    let Some(prepared) = prepare(&args.common, &overrides, Workspace::image_manifest_path)? else {
        return Ok(());
    };

    let options = TaskOptions {
        matcher: args.matcher.clone(),
        mesher: args.mesher.to_core(),
    };
    let task = args.task.to_core();
    let sequencer = sequencer(&args.common, &prepared.config);

    let result = sequencer
        .run_task(
            task,
            &prepared.images,
            &prepared.workspace,
            &prepared.config,
            &options,
        )
        .await
        .with_context(|| format!("task '{task}' could not run"))?;
    report(result)?;

    if args.common.vis {
        let model = match task {
            Task::Sfm => prepared.workspace.sparse_dir(),
            Task::Mesh => match options.mesher {
                MeshAlgorithm::Poisson => prepared.workspace.poisson_mesh_path(),
                MeshAlgorithm::Delaunay => prepared.workspace.delaunay_mesh_path(),
            },
            _ => prepared.workspace.fused_cloud_path(),
        };
        hand_off_to_viewer(&model, args.common.keep_outliers);
    }

    info!("colmap pipeline complete");
    Ok(())
}

async fn run_glomap(args: &GlomapArgs) -> Result<()> {
    let Some(prepared) = prepare(
        &args.common,
        &ConfigOverrides::default(),
        Workspace::glomap_manifest_path,
    )?
    else {
        return Ok(());
    };

    let sequencer = sequencer(&args.common, &prepared.config);
    let result = sequencer
        .run_glomap_sfm(&prepared.images, &prepared.workspace)
        .await
        .context("glomap sfm could not run")?;
    report(result)?;

    if args.common.vis {
        hand_off_to_viewer(&prepared.workspace.glomap_dir(), args.common.keep_outliers);
    }

    info!("glomap pipeline complete");
    Ok(())
}

/// Opens the workspace, resolves configuration and discovers images.
///
/// Returns `None` when no images were found; that case is logged, not an
/// error.
fn prepare(
    args: &CommonArgs,
    overrides: &ConfigOverrides,
    manifest: fn(&Workspace) -> PathBuf,
) -> Result<Option<Prepared>> {
    let workspace = Workspace::open(&args.workspace)
        .with_context(|| format!("cannot use workspace {}", args.workspace.display()))?;

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    }
    .with_overrides(overrides);

    let image_dir = args
        .image_path
        .clone()
        .unwrap_or_else(|| workspace.default_image_dir());
    let manifest = manifest(&workspace);
    if let Some(parent) = manifest.parent() {
        workspace.ensure(parent)?;
    }

    let images = discover_and_record(&image_dir, &manifest)
        .with_context(|| format!("cannot scan images in {}", image_dir.display()))?;
    if images.is_empty() {
        error!(path = %image_dir.display(), "No images found in the specified path");
        return Ok(None);
    }
    info!(count = images.len(), path = %image_dir.display(), "Found images");

    config.save_resolved(&workspace)?;

    Ok(Some(Prepared {
        workspace,
        config,
        images,
    }))
}

fn sequencer(args: &CommonArgs, config: &PipelineConfig) -> Sequencer {
    let mut runner = SystemProcessRunner::new();
    if let Some(secs) = args.timeout_secs {
        runner = runner.with_timeout(Duration::from_secs(secs));
    }
    let library = StageLibrary::new(config.tools.clone(), Arc::new(runner));
    Sequencer::new(library).with_event_sink(Arc::new(LoggingEventSink::default()))
}

/// Logs the diagnostics of a failed pipeline and turns it into an error.
fn report(result: PipelineResult) -> Result<()> {
    if let Some(failure) = result.failure() {
        error!(
            run_id = %result.run_id,
            stage = %failure.stage,
            exit_code = ?failure.exit_code,
            command = %failure.command_line,
            "Stage output:\n{}",
            failure.diagnostics()
        );
        return Err(failure.into());
    }
    info!(
        run_id = %result.run_id,
        pipeline = %result.name,
        stages = result.stages.len(),
        duration_ms = result.duration_ms(),
        "Pipeline succeeded"
    );
    Ok(())
}

/// No viewer is bundled; log what would be handed over.
fn hand_off_to_viewer(model: &Path, keep_outliers: bool) {
    let remove_statistical_outlier = !keep_outliers;
    info!(
        model = %model.display(),
        remove_statistical_outlier,
        "Visualization requested; open the model in an external viewer"
    );
}
