//! Parameter sets for each stage.
//!
//! These are pure: they only translate inputs into flag/value pairs.

use crate::command::StageParameters;
use crate::config::{FeatureExtractionConfig, MatcherSelection};
use std::path::Path;

/// Feature extraction parameters.
#[must_use]
pub fn feature_extraction(
    config: &FeatureExtractionConfig,
    image_dir: &Path,
    database: &Path,
) -> StageParameters {
    StageParameters::new()
        .with("database_path", database)
        .with("image_path", image_dir)
        .with("ImageReader.single_camera", config.single_camera)
        .with("ImageReader.camera_model", config.camera_model.clone())
        .with("SiftExtraction.max_image_size", config.max_image_size)
        .with("SiftExtraction.max_num_features", config.max_num_features)
        .with("SiftExtraction.use_gpu", config.use_gpu)
}

/// Matcher parameters: the database plus exactly one method-specific key.
#[must_use]
pub fn matcher(database: &Path, selection: &MatcherSelection) -> StageParameters {
    let params = StageParameters::new().with("database_path", database);
    match selection {
        MatcherSelection::Exhaustive { block_size } => {
            params.with("ExhaustiveMatching.block_size", *block_size)
        }
        MatcherSelection::Sequential { overlap } => {
            params.with("SequentialMatching.overlap", *overlap)
        }
        MatcherSelection::VocabTree { vocab_tree_path } => {
            params.with("VocabTreeMatching.vocab_tree_path", vocab_tree_path.as_path())
        }
    }
}

/// Sparse mapper parameters (shared by the COLMAP and GLOMAP mappers).
#[must_use]
pub fn mapper(database: &Path, image_dir: &Path, output_dir: &Path) -> StageParameters {
    StageParameters::new()
        .with("database_path", database)
        .with("image_path", image_dir)
        .with("output_path", output_dir)
}

/// Bundle adjustment parameters.
#[must_use]
pub fn bundle_adjustment(input_dir: &Path, output_dir: &Path) -> StageParameters {
    StageParameters::new()
        .with("input_path", input_dir)
        .with("output_path", output_dir)
}

/// Point triangulation parameters.
#[must_use]
pub fn point_triangulation(
    database: &Path,
    image_dir: &Path,
    input_dir: &Path,
    output_dir: &Path,
) -> StageParameters {
    StageParameters::new()
        .with("database_path", database)
        .with("image_path", image_dir)
        .with("input_path", input_dir)
        .with("output_path", output_dir)
}

/// Patch-match stereo parameters, geometric consistency on.
#[must_use]
pub fn patch_match_stereo(dense_dir: &Path) -> StageParameters {
    StageParameters::new()
        .with("workspace_path", dense_dir)
        .with("workspace_format", "COLMAP")
        .with("PatchMatchStereo.geom_consistency", true)
}

/// Stereo fusion parameters, fusing geometric depth maps.
#[must_use]
pub fn stereo_fusion(dense_dir: &Path, output_cloud: &Path) -> StageParameters {
    StageParameters::new()
        .with("workspace_path", dense_dir)
        .with("workspace_format", "COLMAP")
        .with("input_type", "geometric")
        .with("output_path", output_cloud)
}

/// Mesher parameters (Poisson and Delaunay share the same contract).
#[must_use]
pub fn mesher(input: &Path, output_mesh: &Path) -> StageParameters {
    StageParameters::new()
        .with("input_path", input)
        .with("output_path", output_mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ParamValue;
    use std::path::PathBuf;

    fn db() -> PathBuf {
        PathBuf::from("/ws/database.db")
    }

    #[test]
    fn test_feature_extraction_unset_limits_are_absent() {
        let params = feature_extraction(
            &FeatureExtractionConfig::default(),
            Path::new("/ws/images"),
            &db(),
        );

        assert_eq!(params.get("ImageReader.single_camera"), Some(&ParamValue::Bool(false)));
        assert!(params.get("SiftExtraction.max_image_size").unwrap().is_absent());
        assert!(params.get("SiftExtraction.max_num_features").unwrap().is_absent());
        assert_eq!(params.present_count(), 3);
    }

    #[test]
    fn test_feature_extraction_forwards_config() {
        let config = FeatureExtractionConfig::default()
            .single_camera()
            .with_max_image_size(3200)
            .with_max_num_features(8192);
        let params = feature_extraction(&config, Path::new("/ws/images"), &db());

        assert_eq!(params.get("ImageReader.single_camera"), Some(&ParamValue::Bool(true)));
        assert_eq!(params.get("SiftExtraction.max_image_size"), Some(&ParamValue::Int(3200)));
        assert_eq!(params.get("SiftExtraction.max_num_features"), Some(&ParamValue::Int(8192)));
        assert_eq!(
            params.keys().take(2).collect::<Vec<_>>(),
            vec!["database_path", "image_path"]
        );
    }

    #[test]
    fn test_exhaustive_matcher_has_one_method_key() {
        let params = matcher(&db(), &MatcherSelection::Exhaustive { block_size: 50 });

        let keys: Vec<_> = params.keys().collect();
        assert_eq!(keys, vec!["database_path", "ExhaustiveMatching.block_size"]);
        assert_eq!(params.get("ExhaustiveMatching.block_size"), Some(&ParamValue::Int(50)));
    }

    #[test]
    fn test_sequential_matcher_has_one_method_key() {
        let params = matcher(&db(), &MatcherSelection::Sequential { overlap: 15 });

        let keys: Vec<_> = params.keys().collect();
        assert_eq!(keys, vec!["database_path", "SequentialMatching.overlap"]);
    }

    #[test]
    fn test_vocab_tree_matcher_has_one_method_key() {
        let params = matcher(
            &db(),
            &MatcherSelection::VocabTree {
                vocab_tree_path: PathBuf::from("/trees/tree.bin"),
            },
        );

        let keys: Vec<_> = params.keys().collect();
        assert_eq!(keys, vec!["database_path", "VocabTreeMatching.vocab_tree_path"]);
    }

    #[test]
    fn test_dense_stages_fix_format() {
        let stereo = patch_match_stereo(Path::new("/ws/dense"));
        assert_eq!(stereo.get("workspace_format"), Some(&ParamValue::Str("COLMAP".into())));
        assert_eq!(
            stereo.get("PatchMatchStereo.geom_consistency"),
            Some(&ParamValue::Bool(true))
        );

        let fusion = stereo_fusion(Path::new("/ws/dense"), Path::new("/ws/dense/fused.ply"));
        assert_eq!(fusion.get("input_type"), Some(&ParamValue::Str("geometric".into())));
        assert_eq!(fusion.len(), 4);
    }

    #[test]
    fn test_path_only_stages() {
        assert_eq!(
            bundle_adjustment(Path::new("/ws/sparse/0"), Path::new("/ws/sparse/ba"))
                .keys()
                .collect::<Vec<_>>(),
            vec!["input_path", "output_path"]
        );
        assert_eq!(
            point_triangulation(&db(), Path::new("/i"), Path::new("/in"), Path::new("/out"))
                .keys()
                .collect::<Vec<_>>(),
            vec!["database_path", "image_path", "input_path", "output_path"]
        );
        assert_eq!(
            mesher(Path::new("/ws/dense/fused.ply"), Path::new("/ws/dense/m.ply")).len(),
            2
        );
    }
}
