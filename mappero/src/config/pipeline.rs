//! Configuration groups and loading.

use crate::errors::{ConfigurationError, MapperoError};
use crate::workspace::Workspace;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Complete configuration for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// External tool binaries.
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Feature extraction options.
    #[serde(default)]
    pub feature_extraction: FeatureExtractionConfig,
    /// Matcher options.
    #[serde(default)]
    pub matcher: MatcherConfig,
}

impl PipelineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a configuration file.
    ///
    /// Files ending in `.yaml` or `.yml` are parsed as YAML, anything else
    /// as JSON. Missing fields take their defaults, so partial files are
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Load`] if the file cannot be read or is
    /// not valid configuration in its format.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::load(path, e.to_string()))?;
        let parsed = match ConfigFormat::from_path(path) {
            ConfigFormat::Yaml => Self::from_yaml(&text).map_err(|e| e.to_string()),
            ConfigFormat::Json => Self::from_json(&text).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| ConfigurationError::load(path, message))
    }

    /// Parses configuration YAML.
    ///
    /// # Errors
    ///
    /// Returns the parse error if the text is not valid configuration YAML.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Parses configuration JSON.
    ///
    /// # Errors
    ///
    /// Returns the parse error if the text is not valid configuration JSON.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Applies command-line overrides on top of the loaded values.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(size) = overrides.max_image_size {
            self.feature_extraction.max_image_size = Some(size);
        }
        if let Some(features) = overrides.max_num_features {
            self.feature_extraction.max_num_features = Some(features);
        }
        if let Some(block_size) = overrides.block_size {
            self.matcher.block_size = block_size;
        }
        if let Some(ref colmap) = overrides.colmap_binary {
            self.tools.colmap.clone_from(colmap);
        }
        if let Some(ref glomap) = overrides.glomap_binary {
            self.tools.glomap.clone_from(glomap);
        }
        self
    }

    /// Writes the resolved configuration into the workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_resolved(&self, workspace: &Workspace) -> Result<PathBuf, MapperoError> {
        let path = workspace.config_snapshot_path();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        info!(path = %path.display(), "Configuration saved");
        Ok(path)
    }
}

/// Names or paths of the external tool binaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// COLMAP executable.
    #[serde(default = "default_colmap")]
    pub colmap: String,
    /// GLOMAP executable.
    #[serde(default = "default_glomap")]
    pub glomap: String,
}

fn default_colmap() -> String {
    "colmap".to_string()
}

fn default_glomap() -> String {
    "glomap".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            colmap: default_colmap(),
            glomap: default_glomap(),
        }
    }
}

/// Feature extraction options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureExtractionConfig {
    /// Whether all images share one camera.
    #[serde(default)]
    pub single_camera: bool,
    /// Maximum image dimension; unset leaves the tool default.
    #[serde(default)]
    pub max_image_size: Option<u32>,
    /// Maximum number of features per image; unset leaves the tool default.
    #[serde(default)]
    pub max_num_features: Option<u32>,
    /// Camera model name (e.g. `SIMPLE_RADIAL`, `OPENCV`).
    #[serde(default)]
    pub camera_model: Option<String>,
    /// Whether to extract on the GPU.
    #[serde(default)]
    pub use_gpu: Option<bool>,
}

impl FeatureExtractionConfig {
    /// Sets the maximum image size.
    #[must_use]
    pub fn with_max_image_size(mut self, size: u32) -> Self {
        self.max_image_size = Some(size);
        self
    }

    /// Sets the maximum number of features.
    #[must_use]
    pub fn with_max_num_features(mut self, count: u32) -> Self {
        self.max_num_features = Some(count);
        self
    }

    /// Marks all images as sharing one camera.
    #[must_use]
    pub fn single_camera(mut self) -> Self {
        self.single_camera = true;
        self
    }
}

/// Matcher options for every supported method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Block size for exhaustive matching.
    #[serde(default = "default_block_size")]
    pub block_size: u32,
    /// Sequential matching options.
    #[serde(default)]
    pub sequential: SequentialMatcherConfig,
    /// Vocabulary tree file for vocab-tree matching.
    #[serde(default)]
    pub vocab_tree_path: Option<PathBuf>,
}

fn default_block_size() -> u32 {
    50
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            sequential: SequentialMatcherConfig::default(),
            vocab_tree_path: None,
        }
    }
}

/// Sequential matching options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequentialMatcherConfig {
    /// Number of neighbouring images each image is matched against.
    #[serde(default = "default_overlap")]
    pub overlap: u32,
}

fn default_overlap() -> u32 {
    10
}

impl Default for SequentialMatcherConfig {
    fn default() -> Self {
        Self {
            overlap: default_overlap(),
        }
    }
}

/// On-disk format of a configuration file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.json` and any unrecognised extension.
    Json,
    /// `.yaml` or `.yml`.
    Yaml,
}

impl ConfigFormat {
    /// Picks the format for a configuration path.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

/// Values given on the command line that take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Overrides `feature_extraction.max_image_size`.
    pub max_image_size: Option<u32>,
    /// Overrides `feature_extraction.max_num_features`.
    pub max_num_features: Option<u32>,
    /// Overrides `matcher.block_size`.
    pub block_size: Option<u32>,
    /// Overrides `tools.colmap`.
    pub colmap_binary: Option<String>,
    /// Overrides `tools.glomap`.
    pub glomap_binary: Option<String>,
}
