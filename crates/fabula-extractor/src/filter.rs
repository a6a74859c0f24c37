//! Entity filter
//!
//! Decides which tokens and spans qualify as entities of interest.
//! Two admission strategies, configurable together or alone:
//! - Allow-list: the statistical entity label is in the configured set,
//!   or the lowercased surface text is in the domain lexicon.
//! - Pattern-match: exact (case-insensitive) lexicon matches and regex
//!   surface rules, independent of statistical labels.

use std::collections::{HashMap, HashSet};

use regex::Regex;

use fabula_core::{AnnotatedDocument, ConfigError, EntityRegistry, FilterConfig, FilterStrategy};

/// Rule-based entity admission
pub struct EntityFilter {
    strategy: FilterStrategy,
    allowed_labels: HashSet<String>,
    lexicon: HashMap<String, String>,
    patterns: Vec<(Regex, String)>,
}

impl EntityFilter {
    /// Compile a filter from configuration.
    ///
    /// This is the fail-fast point for pattern rules: a malformed regex
    /// is a configuration error raised before any document is processed.
    pub fn from_config(config: &FilterConfig) -> Result<Self, ConfigError> {
        let mut patterns = Vec::with_capacity(config.patterns.len());
        for rule in &config.patterns {
            let regex = Regex::new(&rule.pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: rule.pattern.clone(),
                message: e.to_string(),
            })?;
            patterns.push((regex, rule.label.clone()));
        }

        Ok(Self {
            strategy: config.strategy,
            allowed_labels: config.allowed_labels.iter().cloned().collect(),
            lexicon: config.lexicon.clone(),
            patterns,
        })
    }

    /// Decide admission for a surface text with its statistical label.
    /// Returns the label the entity should carry, or `None` to reject.
    pub fn admit(&self, text: &str, statistical_label: &str) -> Option<String> {
        if self.strategy.uses_allow_list() {
            if !statistical_label.is_empty() && self.allowed_labels.contains(statistical_label) {
                return Some(statistical_label.to_string());
            }
            if let Some(label) = self.lexicon.get(&text.to_lowercase()) {
                return Some(label.clone());
            }
        }

        if self.strategy.uses_patterns() {
            if let Some(label) = self.pattern_label(text) {
                return Some(label);
            }
        }

        None
    }

    /// Label from the lexicon or the regex rules, ignoring statistical labels
    fn pattern_label(&self, text: &str) -> Option<String> {
        if let Some(label) = self.lexicon.get(&text.to_lowercase()) {
            return Some(label.clone());
        }
        self.patterns
            .iter()
            .find(|(regex, _)| regex.is_match(text))
            .map(|(_, label)| label.clone())
    }

    /// Lexicon label for a known surface form, if any.
    /// Used by the adjacency strategy.
    pub fn lexicon_label(&self, text: &str) -> Option<&str> {
        self.lexicon.get(&text.to_lowercase()).map(String::as_str)
    }

    /// Seed the registry before relation extraction runs.
    ///
    /// Document-level spans go through allow-list admission first; then
    /// pattern matches over sentence tokens, so a configured lexicon
    /// label overrides the statistical one for the same key. Returns the
    /// number of entities admitted.
    pub fn seed(&self, doc: &AnnotatedDocument, registry: &mut EntityRegistry) -> usize {
        let mut seeded = 0;

        if self.strategy.uses_allow_list() {
            for span in &doc.spans {
                if let Some(label) = self.admit(&span.text, &span.label) {
                    if !registry.contains(&span.text) {
                        seeded += 1;
                    }
                    registry.register(span.text.clone(), label);
                }
            }
        }

        if self.strategy.uses_patterns() {
            for sentence in &doc.sentences {
                for token in &sentence.tokens {
                    if let Some(label) = self.pattern_label(&token.text) {
                        if !registry.contains(&token.text) {
                            seeded += 1;
                        }
                        registry.register(token.text.clone(), label);
                    }
                }
            }
        }

        seeded
    }
}

// ============================================================================
// Tests
// ============================================================================
