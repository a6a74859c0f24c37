//! Fabula Core - Domain models, configuration, and shared types
//!
//! This crate defines the core abstractions used throughout the Fabula
//! pipeline:
//! - Annotated document model (the annotation-engine contract)
//! - Knowledge types (entities, relation triples, the entity registry)
//! - Common error types
//! - Configuration management

pub mod config;
pub mod document;

pub use config::{
    AdjacencyLabel, ConfigError, ExtractionConfig, ExtractionStrategy, FilterConfig,
    FilterStrategy, GraphConfig, KeyPolicy, MergePolicy, PatternRule,
};
pub use document::{AnnotatedDocument, Annotator, EntitySpan, Sentence, Token};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Fabula operations
#[derive(Error, Debug)]
pub enum FabulaError {
    #[error("Annotation failed: {0}")]
    Annotation(String),

    #[error("Invalid annotated document: {0}")]
    InvalidDocument(String),

    #[error("Conflicting relation for edge {source_key} -> {target}: \"{existing}\" vs \"{incoming}\"")]
    EdgeConflict {
        source_key: String,
        target: String,
        existing: String,
        incoming: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FabulaError>;

// ============================================================================
// Knowledge Types
// ============================================================================

/// An entity admitted into the graph, keyed by its canonical surface text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Canonical key (surface text, canonicalized per [`KeyPolicy`])
    pub key: String,

    /// Entity-type label; empty when no label was available
    pub label: String,
}

impl Entity {
    /// Create a new entity
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// A (subject, relation, object) fact extracted from one sentence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationTriple {
    /// Subject entity key
    pub subject: String,

    /// Relation label (verb lemma, dependency role, or a fixed label,
    /// depending on the extraction strategy)
    pub relation: String,

    /// Object entity key
    pub object: String,
}

impl RelationTriple {
    /// Create a new triple
    pub fn new(
        subject: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            relation: relation.into(),
            object: object.into(),
        }
    }
}

impl std::fmt::Display for RelationTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.relation, self.object)
    }
}

// ============================================================================
// Entity Registry
// ============================================================================

/// Ordered set of admitted entities.
///
/// Keys are unique; registering an existing key overwrites its label
/// (last-write-wins). Iteration yields entities in first-observation
/// order, so repeated runs over the same document produce the same
/// sequence.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    index: HashMap<String, usize>,
}

impl EntityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity, overwriting the label of an existing key
    pub fn register(&mut self, key: impl Into<String>, label: impl Into<String>) {
        let key = key.into();
        let label = label.into();

        if let Some(&pos) = self.index.get(&key) {
            self.entities[pos].label = label;
        } else {
            self.index.insert(key.clone(), self.entities.len());
            self.entities.push(Entity::new(key, label));
        }
    }

    /// Whether a key has been registered
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Current label of a registered key
    pub fn label_of(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&pos| self.entities[pos].label.as_str())
    }

    /// Number of registered entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate entities in first-observation order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }
}

impl<'a> IntoIterator for &'a EntityRegistry {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================
