//! Fabula Extractor - Relation-extraction pipeline
//!
//! Turns an annotated document into an ordered set of entities and
//! relation triples. Entity admission is rule-based (allow-list and
//! lexicon/pattern strategies); relation extraction is one of a closed
//! set of strategies selected by configuration.

pub mod adjacency;
pub mod dependency;
pub mod filter;

pub use adjacency::AdjacencyExtractor;
pub use dependency::{DependencyExtractor, HeadAttachmentExtractor};
pub use filter::EntityFilter;

use serde::{Deserialize, Serialize};

use fabula_core::{
    AnnotatedDocument, Annotator, EntityRegistry, ExtractionConfig, ExtractionStrategy,
    RelationTriple, Result,
};

// ============================================================================
// Extraction Statistics
// ============================================================================

/// Counters describing one extraction pass.
///
/// An extraction miss (a sentence yielding no complete triple) is not an
/// error; it is only counted here for callers that want to log it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Sentences scanned
    pub sentences: usize,
    /// Triples emitted across the document
    pub triples_emitted: usize,
    /// Sentences that yielded no triple
    pub misses: usize,
    /// Entities seeded by the filter before extraction ran
    pub seeded_entities: usize,
}

impl ExtractionStats {
    /// Fraction of sentences that produced at least one triple
    pub fn hit_rate(&self) -> f32 {
        if self.sentences == 0 {
            0.0
        } else {
            (self.sentences - self.misses) as f32 / self.sentences as f32
        }
    }
}

// ============================================================================
// Extraction Traits and Outcome
// ============================================================================

/// Trait for relation-extraction strategies
pub trait RelationExtractor: Send + Sync {
    /// Scan the document and produce triples in sentence order,
    /// registering every triple endpoint in the registry
    fn extract(
        &self,
        doc: &AnnotatedDocument,
        filter: &EntityFilter,
        registry: &mut EntityRegistry,
        stats: &mut ExtractionStats,
    ) -> Vec<RelationTriple>;

    /// Strategy name for logging
    fn name(&self) -> &str;
}

/// Everything one pass over a document produces
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    /// Admitted entities, in first-observation order
    pub entities: EntityRegistry,
    /// Extracted triples, in sentence order
    pub triples: Vec<RelationTriple>,
    /// Pass counters
    pub stats: ExtractionStats,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Configured extraction pipeline: entity filter + one strategy.
///
/// Construction is the fail-fast point for configuration: empty tables
/// and malformed patterns are rejected here, before any document is
/// processed. Extraction itself cannot fail; every sentence degrades to
/// "no triple".
pub struct Pipeline {
    filter: EntityFilter,
    extractor: Box<dyn RelationExtractor>,
}

impl Pipeline {
    /// Build a pipeline from a validated configuration
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        config.validate()?;
        let filter = EntityFilter::from_config(&config.filter)?;

        let extractor: Box<dyn RelationExtractor> = match config.strategy {
            ExtractionStrategy::Dependency => Box::new(DependencyExtractor),
            ExtractionStrategy::HeadAttachment => Box::new(HeadAttachmentExtractor),
            ExtractionStrategy::Adjacency => {
                Box::new(AdjacencyExtractor::new(config.adjacency_label.0.clone()))
            }
        };

        Ok(Self { filter, extractor })
    }

    /// Run the pass: seed entities, then extract triples
    pub fn run(&self, doc: &AnnotatedDocument) -> ExtractionOutcome {
        let mut registry = EntityRegistry::new();
        let mut stats = ExtractionStats::default();

        stats.seeded_entities = self.filter.seed(doc, &mut registry);

        let triples = self
            .extractor
            .extract(doc, &self.filter, &mut registry, &mut stats);
        stats.triples_emitted = triples.len();

        tracing::debug!(
            strategy = self.extractor.name(),
            sentences = stats.sentences,
            triples = stats.triples_emitted,
            misses = stats.misses,
            entities = registry.len(),
            "extraction pass complete"
        );

        ExtractionOutcome {
            entities: registry,
            triples,
            stats,
        }
    }

    /// Annotate raw text with an external engine, then run the pass.
    /// Annotation failures propagate unchanged.
    pub fn annotate_and_run(
        &self,
        annotator: &dyn Annotator,
        text: &str,
    ) -> Result<ExtractionOutcome> {
        let doc = annotator.annotate(text)?;
        Ok(self.run(&doc))
    }

    /// Name of the configured strategy
    pub fn strategy_name(&self) -> &str {
        self.extractor.name()
    }
}

// ============================================================================
// Tests
// ============================================================================
