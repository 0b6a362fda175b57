//! Matcher method selection.

use super::MatcherConfig;
use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The matching strategies the orchestrator knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherMethod {
    /// Match every image pair.
    #[default]
    Exhaustive,
    /// Match each image against its neighbours in capture order.
    Sequential,
    /// Retrieve candidate pairs with a vocabulary tree.
    VocabTree,
}

impl MatcherMethod {
    /// All supported methods.
    pub const ALL: [Self; 3] = [Self::Exhaustive, Self::Sequential, Self::VocabTree];

    /// Returns the method's configuration name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exhaustive => "exhaustive",
            Self::Sequential => "sequential",
            Self::VocabTree => "vocab_tree",
        }
    }
}

impl fmt::Display for MatcherMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatcherMethod {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exhaustive" => Ok(Self::Exhaustive),
            "sequential" => Ok(Self::Sequential),
            "vocab_tree" | "vocab-tree" => Ok(Self::VocabTree),
            _ => Err(ConfigurationError::unknown_matcher(s)),
        }
    }
}

/// A matcher method together with the one parameter that method needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum MatcherSelection {
    /// Exhaustive matching in blocks of `block_size` images.
    Exhaustive {
        /// Images per matching block.
        block_size: u32,
    },
    /// Sequential matching against `overlap` neighbours.
    Sequential {
        /// Neighbour count.
        overlap: u32,
    },
    /// Vocabulary tree matching.
    VocabTree {
        /// Vocabulary tree file.
        vocab_tree_path: PathBuf,
    },
}

impl MatcherSelection {
    /// Resolves a method against the matcher configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingValue`] when vocab-tree matching
    /// is selected without a vocabulary tree path.
    pub fn resolve(method: MatcherMethod, config: &MatcherConfig) -> Result<Self, ConfigurationError> {
        match method {
            MatcherMethod::Exhaustive => Ok(Self::Exhaustive {
                block_size: config.block_size,
            }),
            MatcherMethod::Sequential => Ok(Self::Sequential {
                overlap: config.sequential.overlap,
            }),
            MatcherMethod::VocabTree => config
                .vocab_tree_path
                .clone()
                .map(|vocab_tree_path| Self::VocabTree { vocab_tree_path })
                .ok_or_else(|| {
                    ConfigurationError::missing_value(
                        "matcher.vocab_tree_path",
                        "vocab_tree matching needs a vocabulary tree file",
                    )
                }),
        }
    }

    /// Parses a method name and resolves it.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unknown names or missing values.
    pub fn from_name(name: &str, config: &MatcherConfig) -> Result<Self, ConfigurationError> {
        Self::resolve(name.parse()?, config)
    }

    /// Returns the selected method.
    #[must_use]
    pub fn method(&self) -> MatcherMethod {
        match self {
            Self::Exhaustive { .. } => MatcherMethod::Exhaustive,
            Self::Sequential { .. } => MatcherMethod::Sequential,
            Self::VocabTree { .. } => MatcherMethod::VocabTree,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_methods() {
        assert_eq!("exhaustive".parse::<MatcherMethod>().unwrap(), MatcherMethod::Exhaustive);
        assert_eq!("Sequential".parse::<MatcherMethod>().unwrap(), MatcherMethod::Sequential);
        assert_eq!("vocab_tree".parse::<MatcherMethod>().unwrap(), MatcherMethod::VocabTree);
        assert_eq!("vocab-tree".parse::<MatcherMethod>().unwrap(), MatcherMethod::VocabTree);
    }

    #[test]
    fn test_parse_unknown_method() {
        let err = "spatial".parse::<MatcherMethod>().unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownMatcher { ref method } if method == "spatial"));
    }

    #[test]
    fn test_display_round_trips() {
        for method in MatcherMethod::ALL {
            assert_eq!(method.to_string().parse::<MatcherMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_resolve_exhaustive_uses_block_size() {
        let config = MatcherConfig {
            block_size: 64,
            ..MatcherConfig::default()
        };
        assert_eq!(
            MatcherSelection::resolve(MatcherMethod::Exhaustive, &config).unwrap(),
            MatcherSelection::Exhaustive { block_size: 64 }
        );
    }

    #[test]
    fn test_resolve_sequential_uses_overlap() {
        let selection =
            MatcherSelection::resolve(MatcherMethod::Sequential, &MatcherConfig::default()).unwrap();
        assert_eq!(selection, MatcherSelection::Sequential { overlap: 10 });
        assert_eq!(selection.method(), MatcherMethod::Sequential);
    }

    #[test]
    fn test_resolve_vocab_tree_requires_path() {
        let err = MatcherSelection::resolve(MatcherMethod::VocabTree, &MatcherConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingValue { ref key, .. } if key == "matcher.vocab_tree_path"));

        let config = MatcherConfig {
            vocab_tree_path: Some(PathBuf::from("/trees/vocab_tree_flickr100K_words32K.bin")),
            ..MatcherConfig::default()
        };
        let selection = MatcherSelection::resolve(MatcherMethod::VocabTree, &config).unwrap();
        assert_eq!(selection.method(), MatcherMethod::VocabTree);
    }

    #[test]
    fn test_from_name_unknown() {
        assert!(MatcherSelection::from_name("brute_force", &MatcherConfig::default()).is_err());
    }

    #[test]
    fn test_selection_serialization() {
        let json = serde_json::to_value(MatcherSelection::Exhaustive { block_size: 50 }).unwrap();
        assert_eq!(json, serde_json::json!({"method": "exhaustive", "block_size": 50}));
    }
}
