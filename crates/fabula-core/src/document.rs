//! Annotated document model
//!
//! Types produced by an external annotation engine and consumed, never
//! built, by the extraction pipeline. The serde JSON shape of
//! [`AnnotatedDocument`] is the wire contract with that engine.

use serde::{Deserialize, Serialize};

use crate::{FabulaError, Result};

/// Smallest annotated unit of text (roughly a word)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface text
    pub text: String,

    /// Normalized lemma
    pub lemma: String,

    /// Dependency-role label (e.g. "nsubj", "dobj", "ROOT", "aux").
    /// Exactly one role per token.
    pub dep: String,

    /// Coarse entity-type label from the statistical model; empty when
    /// the model assigned none
    #[serde(default)]
    pub entity_label: String,

    /// Position within the owning sentence
    pub position: usize,

    /// Position of the governing token within the same sentence, when
    /// the engine supplies a full dependency parse
    #[serde(default)]
    pub head: Option<usize>,
}

impl Token {
    /// Create a token with no entity label and no head link
    pub fn new(
        text: impl Into<String>,
        lemma: impl Into<String>,
        dep: impl Into<String>,
        position: usize,
    ) -> Self {
        Self {
            text: text.into(),
            lemma: lemma.into(),
            dep: dep.into(),
            entity_label: String::new(),
            position,
            head: None,
        }
    }

    /// Set the statistical entity-type label
    pub fn with_entity_label(mut self, label: impl Into<String>) -> Self {
        self.entity_label = label.into();
        self
    }

    /// Set the governing-token position
    pub fn with_head(mut self, head: usize) -> Self {
        self.head = Some(head);
        self
    }

    /// Whether the statistical model assigned an entity label
    pub fn has_entity_label(&self) -> bool {
        !self.entity_label.is_empty()
    }
}

/// One sentence of annotated tokens, in surface order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// Sentence index within the document
    pub index: usize,

    /// Tokens in surface order
    pub tokens: Vec<Token>,
}

impl Sentence {
    /// Create a sentence
    pub fn new(index: usize, tokens: Vec<Token>) -> Self {
        Self { index, tokens }
    }
}

/// A document-level entity span reported by the statistical model,
/// independent of per-token roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Span surface text
    pub text: String,

    /// Entity-type label
    pub label: String,
}

/// A fully annotated document, as handed over by the annotation engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    /// Original raw text, if the engine passed it through
    #[serde(default)]
    pub text: String,

    /// Sentences in document order
    pub sentences: Vec<Sentence>,

    /// Document-level entity spans, if the engine exposes them
    #[serde(default)]
    pub spans: Vec<EntitySpan>,
}

impl AnnotatedDocument {
    /// Deserialize a document from the engine's JSON representation
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| FabulaError::InvalidDocument(e.to_string()))
    }

    /// Total token count across all sentences
    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(|s| s.tokens.len()).sum()
    }
}

/// Trait for external annotation engines.
///
/// Implementations perform tokenization, sentence segmentation,
/// dependency parsing, and named-entity recognition; the pipeline only
/// consumes the result. Annotation failures propagate unchanged.
pub trait Annotator: Send + Sync {
    /// Annotate raw text
    fn annotate(&self, text: &str) -> Result<AnnotatedDocument>;

    /// Engine name for logging
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_from_json() {
        let raw = r#"{
            "text": "The lion rules the jungle.",
            "sentences": [
                {
                    "index": 0,
                    "tokens": [
                        {"text": "The", "lemma": "the", "dep": "det", "position": 0},
                        {"text": "lion", "lemma": "lion", "dep": "nsubj", "entity_label": "ANIMAL", "position": 1, "head": 2},
                        {"text": "rules", "lemma": "rule", "dep": "ROOT", "position": 2},
                        {"text": "the", "lemma": "the", "dep": "det", "position": 3},
                        {"text": "jungle", "lemma": "jungle", "dep": "dobj", "entity_label": "LOC", "position": 4, "head": 2}
                    ]
                }
            ],
            "spans": [{"text": "lion", "label": "ANIMAL"}]
        }"#;

        let doc = AnnotatedDocument::from_json(raw).unwrap();
        assert_eq!(doc.sentences.len(), 1);
        assert_eq!(doc.token_count(), 5);
        assert_eq!(doc.sentences[0].tokens[1].entity_label, "ANIMAL");
        assert_eq!(doc.sentences[0].tokens[1].head, Some(2));
        assert_eq!(doc.spans[0].text, "lion");
    }

    #[test]
    fn test_document_from_json_rejects_malformed() {
        let err = AnnotatedDocument::from_json("{not json").unwrap_err();
        assert!(matches!(err, FabulaError::InvalidDocument(_)));
    }

    #[test]
    fn test_token_defaults() {
        let token = Token::new("roared", "roar", "ROOT", 2);
        assert!(!token.has_entity_label());
        assert_eq!(token.head, None);

        let token = token.with_entity_label("VERB").with_head(0);
        assert!(token.has_entity_label());
        assert_eq!(token.head, Some(0));
    }
}
