//! Stage and tool identifiers.

use crate::config::ToolsConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// External reconstruction tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// COLMAP.
    Colmap,
    /// GLOMAP.
    Glomap,
}

impl Tool {
    /// Returns the configured executable for this tool.
    #[must_use]
    pub fn binary<'a>(&self, tools: &'a ToolsConfig) -> &'a str {
        match self {
            Self::Colmap => &tools.colmap,
            Self::Glomap => &tools.glomap,
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Colmap => write!(f, "colmap"),
            Self::Glomap => write!(f, "glomap"),
        }
    }
}

/// Every stage the orchestrator can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// SIFT feature extraction into the database.
    FeatureExtraction,
    /// Exhaustive pairwise matching.
    ExhaustiveMatcher,
    /// Sequential neighbour matching.
    SequentialMatcher,
    /// Vocabulary tree matching.
    VocabTreeMatcher,
    /// Incremental sparse mapping.
    Mapper,
    /// Bundle adjustment of an existing sparse model.
    BundleAdjuster,
    /// Re-triangulation with known poses.
    PointTriangulator,
    /// Patch-match dense stereo.
    PatchMatchStereo,
    /// Depth map fusion into a point cloud.
    StereoFusion,
    /// Poisson surface reconstruction.
    PoissonMesher,
    /// Delaunay surface reconstruction.
    DelaunayMesher,
    /// Global sparse mapping with GLOMAP.
    GlomapMapper,
}

impl StageKind {
    /// Returns the stage name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FeatureExtraction => "feature_extraction",
            Self::ExhaustiveMatcher => "exhaustive_matcher",
            Self::SequentialMatcher => "sequential_matcher",
            Self::VocabTreeMatcher => "vocab_tree_matcher",
            Self::Mapper => "mapper",
            Self::BundleAdjuster => "bundle_adjuster",
            Self::PointTriangulator => "point_triangulator",
            Self::PatchMatchStereo => "patch_match_stereo",
            Self::StereoFusion => "stereo_fusion",
            Self::PoissonMesher => "poisson_mesher",
            Self::DelaunayMesher => "delaunay_mesher",
            Self::GlomapMapper => "glomap_mapper",
        }
    }

    /// Returns the tool that runs this stage.
    #[must_use]
    pub fn tool(&self) -> Tool {
        match self {
            Self::GlomapMapper => Tool::Glomap,
            _ => Tool::Colmap,
        }
    }

    /// Returns the tool subcommand for this stage.
    #[must_use]
    pub fn subcommand(&self) -> &'static str {
        match self {
            Self::FeatureExtraction => "feature_extractor",
            Self::GlomapMapper => "mapper",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Surface reconstruction algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshAlgorithm {
    /// Screened Poisson reconstruction from the fused cloud.
    #[default]
    Poisson,
    /// Delaunay-based reconstruction.
    Delaunay,
}

impl MeshAlgorithm {
    /// Returns the stage that runs this algorithm.
    #[must_use]
    pub fn stage(&self) -> StageKind {
        match self {
            Self::Poisson => StageKind::PoissonMesher,
            Self::Delaunay => StageKind::DelaunayMesher,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subcommands() {
        assert_eq!(StageKind::FeatureExtraction.subcommand(), "feature_extractor");
        assert_eq!(StageKind::ExhaustiveMatcher.subcommand(), "exhaustive_matcher");
        assert_eq!(StageKind::VocabTreeMatcher.subcommand(), "vocab_tree_matcher");
        assert_eq!(StageKind::BundleAdjuster.subcommand(), "bundle_adjuster");
        assert_eq!(StageKind::GlomapMapper.subcommand(), "mapper");
    }

    #[test]
    fn test_tools() {
        assert_eq!(StageKind::Mapper.tool(), Tool::Colmap);
        assert_eq!(StageKind::GlomapMapper.tool(), Tool::Glomap);

        let tools = ToolsConfig {
            colmap: "/opt/colmap".to_string(),
            ..ToolsConfig::default()
        };
        assert_eq!(Tool::Colmap.binary(&tools), "/opt/colmap");
        assert_eq!(Tool::Glomap.binary(&tools), "glomap");
    }

    #[test]
    fn test_display_matches_serde() {
        let kind = StageKind::PatchMatchStereo;
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, format!("\"{kind}\""));
    }

    #[test]
    fn test_mesh_algorithm_stage() {
        assert_eq!(MeshAlgorithm::default().stage(), StageKind::PoissonMesher);
        assert_eq!(MeshAlgorithm::Delaunay.stage(), StageKind::DelaunayMesher);
    }
}
