//! Fabula Graph - Narrative graph assembly
//!
//! Folds an entity registry and an ordered triple sequence into a
//! directed graph with defined node/edge identity: nodes keyed by
//! canonical entity key, at most one edge per (source, target) pair
//! whose relation labels are merged per the configured policy.
//!
//! Assembly is a single deterministic pass; identical inputs produce
//! identical node and edge iteration order and identical labels. The
//! graph is read-only once assembled.

pub mod export;

pub use export::{EdgeExport, GraphExport, NodeExport, TripleExport};

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use fabula_core::{
    EntityRegistry, FabulaError, GraphConfig, MergePolicy, RelationTriple, Result,
};

// ============================================================================
// Graph Payloads
// ============================================================================

/// Node payload: the canonical entity key and its type label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub key: String,
    pub label: String,
}

impl std::fmt::Display for NodeData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// Edge payload: relation labels in insertion order.
///
/// Exactly one label under the default overwrite policy; several only
/// under the accumulate policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeData {
    pub relations: Vec<String>,
}

impl std::fmt::Display for EdgeData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.relations.join(", "))
    }
}

// ============================================================================
// Narrative Graph
// ============================================================================

/// Directed graph of entities and their relations
#[derive(Debug)]
pub struct NarrativeGraph {
    graph: DiGraph<NodeData, EdgeData>,
    index: HashMap<String, NodeIndex>,
}

impl NarrativeGraph {
    fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Ensure a node for the key, overwriting its label if it exists
    fn ensure_node(&mut self, key: String, label: String) -> NodeIndex {
        match self.index.get(&key) {
            Some(&idx) => {
                self.graph[idx].label = label;
                idx
            }
            None => {
                let idx = self.graph.add_node(NodeData {
                    key: key.clone(),
                    label,
                });
                self.index.insert(key, idx);
                idx
            }
        }
    }

    /// Insert or merge an edge per the given policy
    fn merge_edge(
        &mut self,
        source: NodeIndex,
        target: NodeIndex,
        relation: String,
        policy: MergePolicy,
    ) -> Result<()> {
        match self.graph.find_edge(source, target) {
            None => {
                self.graph.add_edge(
                    source,
                    target,
                    EdgeData {
                        relations: vec![relation],
                    },
                );
            }
            Some(edge) => match policy {
                MergePolicy::Overwrite => {
                    let data = &mut self.graph[edge];
                    data.relations.clear();
                    data.relations.push(relation);
                }
                MergePolicy::Reject => {
                    let existing = &self.graph[edge].relations;
                    if existing.iter().all(|r| r != &relation) {
                        return Err(FabulaError::EdgeConflict {
                            source_key: self.graph[source].key.clone(),
                            target: self.graph[target].key.clone(),
                            existing: existing.join(", "),
                            incoming: relation,
                        });
                    }
                }
                MergePolicy::Accumulate => {
                    let data = &mut self.graph[edge];
                    if !data.relations.contains(&relation) {
                        data.relations.push(relation);
                    }
                }
            },
        }
        Ok(())
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether a canonical key has a node
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Type label of a node
    pub fn node_label(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&idx| self.graph[idx].label.as_str())
    }

    /// Relation labels on the edge between two keys, if present
    pub fn relations_between(&self, source: &str, target: &str) -> Option<&[String]> {
        let (&s, &t) = (self.index.get(source)?, self.index.get(target)?);
        let edge = self.graph.find_edge(s, t)?;
        Some(&self.graph[edge].relations)
    }

    /// Iterate nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &NodeData> {
        self.graph.node_indices().map(|idx| &self.graph[idx])
    }

    /// Iterate edges in insertion order as (source key, target key, labels)
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &[String])> {
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()].key.as_str(),
                self.graph[edge.target()].key.as_str(),
                edge.weight().relations.as_slice(),
            )
        })
    }

    /// Borrow the underlying petgraph structure (read-only)
    pub fn inner(&self) -> &DiGraph<NodeData, EdgeData> {
        &self.graph
    }
}

// ============================================================================
// Graph Assembler
// ============================================================================

/// Folds extraction output into a [`NarrativeGraph`]
pub struct GraphAssembler {
    config: GraphConfig,
}

impl GraphAssembler {
    /// Create an assembler with the given configuration
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    /// Assemble the graph from admitted entities and ordered triples.
    ///
    /// Every registry entity gets a node; the assembler fabricates no
    /// nodes of its own. A triple endpoint missing from the registry is
    /// skipped with a warning. Fails only under the reject merge policy,
    /// on a conflicting relation label.
    pub fn assemble(
        &self,
        entities: &EntityRegistry,
        triples: &[RelationTriple],
    ) -> Result<NarrativeGraph> {
        let key_policy = self.config.key_policy;
        let mut graph = NarrativeGraph::new();

        for entity in entities {
            graph.ensure_node(key_policy.canonicalize(&entity.key), entity.label.clone());
        }

        for triple in triples {
            let source = key_policy.canonicalize(&triple.subject);
            let target = key_policy.canonicalize(&triple.object);

            let (source, target) = match (graph.index.get(&source), graph.index.get(&target)) {
                (Some(&s), Some(&t)) => (s, t),
                _ => {
                    tracing::warn!(%triple, "triple endpoint missing from entity registry");
                    continue;
                }
            };

            graph.merge_edge(source, target, triple.relation.clone(), self.config.merge_policy)?;
        }

        Ok(graph)
    }
}

impl Default for GraphAssembler {
    fn default() -> Self {
        Self::new(GraphConfig::default())
    }
}

// ============================================================================
// Tests
// ============================================================================
