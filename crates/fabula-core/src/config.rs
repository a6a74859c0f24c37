//! Fabula configuration management
//!
//! Handles configuration from TOML files and environment variables with
//! sensible defaults. Validation is fail-fast: a config that selects a
//! strategy without the tables that strategy needs is rejected before
//! any document is processed.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level extraction configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Relation-extraction strategy
    pub strategy: ExtractionStrategy,

    /// Fixed relation label used by the adjacency strategy
    pub adjacency_label: AdjacencyLabel,

    /// Entity filter configuration
    pub filter: FilterConfig,

    /// Graph assembly configuration
    pub graph: GraphConfig,
}

/// Newtype so the adjacency label defaults to "related_to" under serde
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdjacencyLabel(pub String);

impl Default for AdjacencyLabel {
    fn default() -> Self {
        Self("related_to".to_string())
    }
}

impl ExtractionConfig {
    /// Load from a TOML file and validate
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileRead {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path,
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment-variable overrides
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(value) = std::env::var("FABULA_STRATEGY") {
            self.strategy = value.parse()?;
        }
        if let Ok(value) = std::env::var("FABULA_MERGE_POLICY") {
            self.graph.merge_policy = value.parse()?;
        }
        if let Ok(value) = std::env::var("FABULA_KEY_POLICY") {
            self.graph.key_policy = value.parse()?;
        }
        Ok(self)
    }

    /// Validate the configuration, rejecting empty or malformed tables
    /// for the strategies that need them
    pub fn validate(&self) -> Result<(), ConfigError> {
        let filter = &self.filter;

        if filter.strategy.uses_allow_list()
            && filter.allowed_labels.is_empty()
            && filter.lexicon.is_empty()
        {
            return Err(ConfigError::EmptyTable(
                "allow-list filtering needs filter.allowed_labels or filter.lexicon".to_string(),
            ));
        }

        if filter.strategy.uses_patterns()
            && filter.lexicon.is_empty()
            && filter.patterns.is_empty()
        {
            return Err(ConfigError::EmptyTable(
                "pattern filtering needs filter.lexicon or filter.patterns".to_string(),
            ));
        }

        for (surface, label) in &filter.lexicon {
            if surface.is_empty() || label.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "filter.lexicon".to_string(),
                    value: format!("{surface:?} -> {label:?}"),
                });
            }
            // Lexicon lookups are by lowercased token text; a key with
            // uppercase characters could never match.
            if *surface != surface.to_lowercase() {
                return Err(ConfigError::InvalidValue {
                    key: "filter.lexicon".to_string(),
                    value: surface.clone(),
                });
            }
        }

        for rule in &filter.patterns {
            if rule.pattern.is_empty() || rule.label.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "filter.patterns".to_string(),
                    value: format!("{:?} -> {:?}", rule.pattern, rule.label),
                });
            }
        }

        if self.strategy == ExtractionStrategy::Adjacency {
            if filter.lexicon.is_empty() {
                return Err(ConfigError::MissingRequired(
                    "filter.lexicon (the adjacency strategy matches known surface forms)"
                        .to_string(),
                ));
            }
            if self.adjacency_label.0.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "adjacency_label".to_string(),
                    value: String::new(),
                });
            }
        }

        Ok(())
    }
}

// ============================================================================
// Strategy Selection
// ============================================================================

/// Closed set of relation-extraction strategies.
///
/// Each is selected explicitly by configuration; the degraded adjacency
/// strategy is never inferred from missing annotations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Per-sentence subject/action/object slot scan over dependency roles
    #[default]
    Dependency,
    /// One triple per subject/object token, labeled by its dependency
    /// role, pointing from its governing token
    HeadAttachment,
    /// Lexical adjacency: known surface form -> following token, with a
    /// fixed relation label
    Adjacency,
}

impl ExtractionStrategy {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dependency => "dependency",
            Self::HeadAttachment => "head_attachment",
            Self::Adjacency => "adjacency",
        }
    }
}

impl std::fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ExtractionStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dependency" => Ok(Self::Dependency),
            "head_attachment" => Ok(Self::HeadAttachment),
            "adjacency" => Ok(Self::Adjacency),
            _ => Err(ConfigError::InvalidValue {
                key: "strategy".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Entity Filter Configuration
// ============================================================================

/// Which entity-admission strategies run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterStrategy {
    /// Admit by statistical label set or lexicon membership
    #[default]
    AllowList,
    /// Admit by exact surface/regex match only, ignoring statistical labels
    Pattern,
    /// Both together; pattern matches seed the entity set before
    /// extraction runs
    Combined,
}

impl FilterStrategy {
    /// Whether allow-list admission applies
    pub fn uses_allow_list(&self) -> bool {
        matches!(self, Self::AllowList | Self::Combined)
    }

    /// Whether pattern seeding applies
    pub fn uses_patterns(&self) -> bool {
        matches!(self, Self::Pattern | Self::Combined)
    }
}

/// A regex surface rule admitting matching tokens with a custom label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRule {
    /// Regex matched against token text
    pub pattern: String,

    /// Label assigned on match
    pub label: String,
}

/// Entity filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Admission strategy
    pub strategy: FilterStrategy,

    /// Statistical entity-type labels accepted by the allow-list
    pub allowed_labels: Vec<String>,

    /// Domain lexicon: lowercase surface form -> custom label
    pub lexicon: HashMap<String, String>,

    /// Regex surface rules
    pub patterns: Vec<PatternRule>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            strategy: FilterStrategy::default(),
            allowed_labels: default_allowed_labels(),
            lexicon: HashMap::new(),
            patterns: Vec::new(),
        }
    }
}

/// Entity-type labels recognized by default
fn default_allowed_labels() -> Vec<String> {
    ["PERSON", "NORP", "ORG", "GPE", "LOC", "ANIMAL", "OBJECT"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// ============================================================================
// Graph Assembly Configuration
// ============================================================================

/// Merge policy for an edge whose (source, target) pair already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Later relation label replaces the earlier one
    #[default]
    Overwrite,
    /// A differing relation label is an error
    Reject,
    /// Relation labels collect in insertion order
    Accumulate,
}

impl std::str::FromStr for MergePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "reject" => Ok(Self::Reject),
            "accumulate" => Ok(Self::Accumulate),
            _ => Err(ConfigError::InvalidValue {
                key: "graph.merge_policy".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Canonicalization applied to entity keys before node lookup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPolicy {
    /// Case-sensitive keys: "Lion" and "lion" are distinct nodes
    #[default]
    Exact,
    /// Lowercased keys: "Lion" and "lion" merge into one node
    Lowercase,
}

impl KeyPolicy {
    /// Canonicalize an entity key
    pub fn canonicalize(&self, key: &str) -> String {
        match self {
            Self::Exact => key.to_string(),
            Self::Lowercase => key.to_lowercase(),
        }
    }
}

impl std::str::FromStr for KeyPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "lowercase" => Ok(Self::Lowercase),
            _ => Err(ConfigError::InvalidValue {
                key: "graph.key_policy".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Graph assembly configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Edge collision policy
    pub merge_policy: MergePolicy,

    /// Entity key canonicalization
    pub key_policy: KeyPolicy,
}

// ============================================================================
// Errors
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Empty lexicon/pattern table: {0}")]
    EmptyTable(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractionConfig::default();
        assert_eq!(config.strategy, ExtractionStrategy::Dependency);
        assert_eq!(config.graph.merge_policy, MergePolicy::Overwrite);
        assert_eq!(config.graph.key_policy, KeyPolicy::Exact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(
            "dependency".parse::<ExtractionStrategy>().unwrap(),
            ExtractionStrategy::Dependency
        );
        assert_eq!(
            "head_attachment".parse::<ExtractionStrategy>().unwrap(),
            ExtractionStrategy::HeadAttachment
        );
        assert!("unknown".parse::<ExtractionStrategy>().is_err());
    }

    #[test]
    fn test_allow_list_rejects_empty_tables() {
        let config = ExtractionConfig {
            filter: FilterConfig {
                allowed_labels: Vec::new(),
                lexicon: HashMap::new(),
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyTable(_))
        ));
    }

    #[test]
    fn test_lexicon_keys_must_be_lowercase() {
        let mut lexicon = HashMap::new();
        lexicon.insert("Lion".to_string(), "ANIMAL".to_string());

        let config = ExtractionConfig {
            filter: FilterConfig {
                lexicon,
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_adjacency_requires_lexicon() {
        let config = ExtractionConfig {
            strategy: ExtractionStrategy::Adjacency,
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_pattern_strategy_rejects_empty_tables() {
        let config = ExtractionConfig {
            filter: FilterConfig {
                strategy: FilterStrategy::Pattern,
                allowed_labels: default_allowed_labels(),
                lexicon: HashMap::new(),
                patterns: Vec::new(),
            },
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyTable(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
strategy = "adjacency"
adjacency_label = "near"

[filter]
strategy = "pattern"

[filter.lexicon]
lion = "ANIMAL"
jungle = "LOC"

[graph]
merge_policy = "accumulate"
key_policy = "lowercase"
"#
        )
        .unwrap();

        let config = ExtractionConfig::from_file(file.path()).unwrap();
        assert_eq!(config.strategy, ExtractionStrategy::Adjacency);
        assert_eq!(config.adjacency_label.0, "near");
        assert_eq!(config.filter.lexicon.get("lion").unwrap(), "ANIMAL");
        assert_eq!(config.graph.merge_policy, MergePolicy::Accumulate);
        assert_eq!(config.graph.key_policy, KeyPolicy::Lowercase);
    }

    #[test]
    fn test_from_file_fails_fast_on_invalid_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
strategy = "adjacency"
"#
        )
        .unwrap();

        // Adjacency without a lexicon must be rejected at load time.
        assert!(ExtractionConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_key_policy_canonicalize() {
        assert_eq!(KeyPolicy::Exact.canonicalize("Lion"), "Lion");
        assert_eq!(KeyPolicy::Lowercase.canonicalize("Lion"), "lion");
    }
}
