//! Dependency-based relation extraction
//!
//! Two strategies driven by the engine's dependency parse:
//! - [`DependencyExtractor`]: per-sentence subject/action/object slot
//!   scan, at most one triple per sentence.
//! - [`HeadAttachmentExtractor`]: one triple per qualifying token,
//!   labeled by its dependency role, pointing from its governing token.

use fabula_core::{AnnotatedDocument, EntityRegistry, RelationTriple, Token};

use crate::{EntityFilter, ExtractionStats, RelationExtractor};

/// Roles marking a clausal subject
const SUBJECT_ROLES: &[&str] = &["nsubj"];

/// Roles marking a direct object
const OBJECT_ROLES: &[&str] = &["dobj"];

/// Roles marking the sentence action (root verb or auxiliary)
const ACTION_ROLES: &[&str] = &["ROOT", "aux"];

/// Roles that attach a token to its head in head-attachment extraction
const ATTACHMENT_ROLES: &[&str] = &["nsubj", "dobj", "pobj"];

// ============================================================================
// Slot Accumulator
// ============================================================================

/// Per-sentence accumulator for the three candidate slots.
///
/// Reset at the start of each sentence; each slot holds the last-seen
/// qualifying token (sequential overwrite during the scan).
#[derive(Debug, Default)]
struct SentenceSlots {
    /// Candidate subject: (surface text, admitted label)
    subject: Option<(String, String)>,
    /// Candidate object: (surface text, admitted label)
    object: Option<(String, String)>,
    /// Candidate action: verb lemma
    action: Option<String>,
}

impl SentenceSlots {
    /// Observe one token, overwriting any slot it qualifies for
    fn observe(&mut self, token: &Token, filter: &EntityFilter) {
        let dep = token.dep.as_str();

        if SUBJECT_ROLES.contains(&dep) {
            if let Some(label) = filter.admit(&token.text, &token.entity_label) {
                self.subject = Some((token.text.clone(), label));
            }
        }

        if OBJECT_ROLES.contains(&dep) {
            if let Some(label) = filter.admit(&token.text, &token.entity_label) {
                self.object = Some((token.text.clone(), label));
            }
        }

        if ACTION_ROLES.contains(&dep) {
            self.action = Some(token.lemma.clone());
        }
    }

    /// Emit the sentence triple if all three slots are filled,
    /// registering both endpoints with their admitted labels
    fn into_triple(self, registry: &mut EntityRegistry) -> Option<RelationTriple> {
        let (subject, subject_label) = self.subject?;
        let (object, object_label) = self.object?;
        let action = self.action?;

        registry.register(subject.clone(), subject_label);
        registry.register(object.clone(), object_label);

        Some(RelationTriple::new(subject, action, object))
    }
}

// ============================================================================
// Dependency Extractor
// ============================================================================

/// Slot-scan extractor: zero or one triple per sentence
pub struct DependencyExtractor;

impl RelationExtractor for DependencyExtractor {
    fn extract(
        &self,
        doc: &AnnotatedDocument,
        filter: &EntityFilter,
        registry: &mut EntityRegistry,
        stats: &mut ExtractionStats,
    ) -> Vec<RelationTriple> {
        let mut triples = Vec::new();

        for sentence in &doc.sentences {
            stats.sentences += 1;

            let mut slots = SentenceSlots::default();
            for token in &sentence.tokens {
                slots.observe(token, filter);
            }

            match slots.into_triple(registry) {
                Some(triple) => triples.push(triple),
                None => {
                    stats.misses += 1;
                    tracing::debug!(sentence = sentence.index, "no complete triple");
                }
            }
        }

        triples
    }

    fn name(&self) -> &str {
        "dependency"
    }
}

// ============================================================================
// Head-Attachment Extractor
// ============================================================================

/// Head-attachment extractor: one triple per subject/object token with a
/// resolvable head, labeled by the token's dependency role. Unlike the
/// slot scan, a sentence may yield several triples.
pub struct HeadAttachmentExtractor;

impl RelationExtractor for HeadAttachmentExtractor {
    fn extract(
        &self,
        doc: &AnnotatedDocument,
        filter: &EntityFilter,
        registry: &mut EntityRegistry,
        stats: &mut ExtractionStats,
    ) -> Vec<RelationTriple> {
        let mut triples = Vec::new();

        for sentence in &doc.sentences {
            stats.sentences += 1;
            let emitted_before = triples.len();

            for token in &sentence.tokens {
                if !ATTACHMENT_ROLES.contains(&token.dep.as_str()) {
                    continue;
                }
                let head = match token.head.and_then(|pos| sentence.tokens.get(pos)) {
                    Some(head) if head.position != token.position => head,
                    _ => continue,
                };

                let token_label = match filter.admit(&token.text, &token.entity_label) {
                    Some(label) => label,
                    None => continue,
                };
                let head_label = match filter.admit(&head.text, &head.entity_label) {
                    Some(label) => label,
                    None => continue,
                };

                registry.register(head.text.clone(), head_label);
                registry.register(token.text.clone(), token_label);
                triples.push(RelationTriple::new(
                    head.text.clone(),
                    token.dep.clone(),
                    token.text.clone(),
                ));
            }

            if triples.len() == emitted_before {
                stats.misses += 1;
                tracing::debug!(sentence = sentence.index, "no attachable pair");
            }
        }

        triples
    }

    fn name(&self) -> &str {
        "head_attachment"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use fabula_core::{FilterConfig, FilterStrategy, Sentence};

    fn animal_filter() -> EntityFilter {
        let mut config = FilterConfig {
            strategy: FilterStrategy::AllowList,
            ..Default::default()
        };
        config
            .lexicon
            .insert("jungle".to_string(), "LOC".to_string());
        EntityFilter::from_config(&config).unwrap()
    }

    fn lion_rules_jungle() -> Sentence {
        Sentence::new(
            0,
            vec![
                Token::new("The", "the", "det", 0),
                Token::new("lion", "lion", "nsubj", 1).with_entity_label("ANIMAL"),
                Token::new("rules", "rule", "ROOT", 2),
                Token::new("the", "the", "det", 3),
                Token::new("jungle", "jungle", "dobj", 4),
            ],
        )
    }

    #[test]
    fn test_slot_scan_emits_single_triple() {
        let doc = AnnotatedDocument {
            sentences: vec![lion_rules_jungle()],
            ..Default::default()
        };

        let mut registry = EntityRegistry::new();
        let mut stats = ExtractionStats::default();
        let triples =
            DependencyExtractor.extract(&doc, &animal_filter(), &mut registry, &mut stats);

        assert_eq!(triples, vec![RelationTriple::new("lion", "rule", "jungle")]);
        assert_eq!(registry.label_of("lion"), Some("ANIMAL"));
        assert_eq!(registry.label_of("jungle"), Some("LOC"));
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_slot_scan_last_object_wins() {
        // "The hare mocked the lion but admired the elephant."
        let sentence = Sentence::new(
            0,
            vec![
                Token::new("The", "the", "det", 0),
                Token::new("hare", "hare", "nsubj", 1).with_entity_label("ANIMAL"),
                Token::new("mocked", "mock", "ROOT", 2),
                Token::new("the", "the", "det", 3),
                Token::new("lion", "lion", "dobj", 4).with_entity_label("ANIMAL"),
                Token::new("but", "but", "cc", 5),
                Token::new("admired", "admire", "conj", 6),
                Token::new("the", "the", "det", 7),
                Token::new("elephant", "elephant", "dobj", 8).with_entity_label("ANIMAL"),
            ],
        );
        let doc = AnnotatedDocument {
            sentences: vec![sentence],
            ..Default::default()
        };

        let mut registry = EntityRegistry::new();
        let mut stats = ExtractionStats::default();
        let triples =
            DependencyExtractor.extract(&doc, &animal_filter(), &mut registry, &mut stats);

        // The object slot was overwritten from "lion" to "elephant"
        // before the scan ended.
        assert_eq!(
            triples,
            vec![RelationTriple::new("hare", "mock", "elephant")]
        );
        // Only the final slot values are registered.
        assert!(!registry.contains("lion"));
    }

    #[test]
    fn test_slot_scan_partial_sentence_is_a_miss() {
        // "The lion roared." has a subject and an action but no object.
        let sentence = Sentence::new(
            0,
            vec![
                Token::new("The", "the", "det", 0),
                Token::new("lion", "lion", "nsubj", 1).with_entity_label("ANIMAL"),
                Token::new("roared", "roar", "ROOT", 2),
            ],
        );
        let doc = AnnotatedDocument {
            sentences: vec![sentence],
            ..Default::default()
        };

        let mut registry = EntityRegistry::new();
        let mut stats = ExtractionStats::default();
        let triples =
            DependencyExtractor.extract(&doc, &animal_filter(), &mut registry, &mut stats);

        assert!(triples.is_empty());
        assert_eq!(stats.misses, 1);
        // The extractor itself registers nothing for a miss.
        assert!(registry.is_empty());
    }

    #[test]
    fn test_slot_scan_subject_must_pass_filter() {
        // "wind" carries no recognized label; the subject slot stays empty.
        let sentence = Sentence::new(
            0,
            vec![
                Token::new("wind", "wind", "nsubj", 0),
                Token::new("shook", "shake", "ROOT", 1),
                Token::new("jungle", "jungle", "dobj", 2),
            ],
        );
        let doc = AnnotatedDocument {
            sentences: vec![sentence],
            ..Default::default()
        };

        let mut registry = EntityRegistry::new();
        let mut stats = ExtractionStats::default();
        let triples =
            DependencyExtractor.extract(&doc, &animal_filter(), &mut registry, &mut stats);

        assert!(triples.is_empty());
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_head_attachment_emits_per_token() {
        let sentence = Sentence::new(
            0,
            vec![
                Token::new("lion", "lion", "nsubj", 0)
                    .with_entity_label("ANIMAL")
                    .with_head(1),
                Token::new("chased", "chase", "ROOT", 1),
                Token::new("hare", "hare", "dobj", 2)
                    .with_entity_label("ANIMAL")
                    .with_head(1),
            ],
        );
        let doc = AnnotatedDocument {
            sentences: vec![sentence],
            ..Default::default()
        };

        // "chased" carries no entity label, so the filter drops both
        // attachments unless the verb itself is admitted; extend the
        // lexicon to admit it.
        let mut config = FilterConfig::default();
        config
            .lexicon
            .insert("chased".to_string(), "ACTION".to_string());
        let filter = EntityFilter::from_config(&config).unwrap();

        let mut registry = EntityRegistry::new();
        let mut stats = ExtractionStats::default();
        let triples = HeadAttachmentExtractor.extract(&doc, &filter, &mut registry, &mut stats);

        assert_eq!(
            triples,
            vec![
                RelationTriple::new("chased", "nsubj", "lion"),
                RelationTriple::new("chased", "dobj", "hare"),
            ]
        );
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_head_attachment_requires_filtered_endpoints() {
        let sentence = Sentence::new(
            0,
            vec![
                Token::new("lion", "lion", "nsubj", 0)
                    .with_entity_label("ANIMAL")
                    .with_head(1),
                Token::new("chased", "chase", "ROOT", 1),
            ],
        );
        let doc = AnnotatedDocument {
            sentences: vec![sentence],
            ..Default::default()
        };

        let mut registry = EntityRegistry::new();
        let mut stats = ExtractionStats::default();
        let triples =
            HeadAttachmentExtractor.extract(&doc, &animal_filter(), &mut registry, &mut stats);

        // The head "chased" fails the filter: no triple, no nodes.
        assert!(triples.is_empty());
        assert!(registry.is_empty());
        assert_eq!(stats.misses, 1);
    }
}
