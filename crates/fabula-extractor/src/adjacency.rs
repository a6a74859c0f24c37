//! Lexical-adjacency relation extraction
//!
//! Degraded strategy for input with no dependency parse: every
//! occurrence of a known lexicon surface form relates, with a fixed
//! label, to the token immediately following it in linear document
//! order, regardless of grammatical relationship. Must be selected
//! explicitly; it is never a silent fallback.

use fabula_core::{AnnotatedDocument, EntityRegistry, RelationTriple, Token};

use crate::{EntityFilter, ExtractionStats, RelationExtractor};

/// Adjacency extractor with its fixed relation label
pub struct AdjacencyExtractor {
    label: String,
}

impl AdjacencyExtractor {
    /// Create an extractor emitting the given relation label
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl RelationExtractor for AdjacencyExtractor {
    fn extract(
        &self,
        doc: &AnnotatedDocument,
        filter: &EntityFilter,
        registry: &mut EntityRegistry,
        stats: &mut ExtractionStats,
    ) -> Vec<RelationTriple> {
        stats.sentences += doc.sentences.len();

        // Linear token order across the whole document; sentence
        // boundaries do not break adjacency.
        let tokens: Vec<&Token> = doc
            .sentences
            .iter()
            .flat_map(|sentence| sentence.tokens.iter())
            .collect();

        let mut triples = Vec::new();
        for pair in tokens.windows(2) {
            let (token, next) = (pair[0], pair[1]);

            let label = match filter.lexicon_label(&token.text) {
                Some(label) => label.to_string(),
                None => continue,
            };

            registry.register(token.text.clone(), label);
            // The following token is admitted by the adjacency rule
            // itself; an unlabeled registration must not clobber a label
            // it earned elsewhere.
            if !registry.contains(&next.text) {
                registry.register(next.text.clone(), String::new());
            }

            triples.push(RelationTriple::new(
                token.text.clone(),
                self.label.clone(),
                next.text.clone(),
            ));
        }

        triples
    }

    fn name(&self) -> &str {
        "adjacency"
    }
}

// ============================================================================
// Tests
// ============================================================================
