//! Export adapter
//!
//! Shape translation only: the assembled graph becomes a serializable
//! node/edge listing, a flat triple list, or Graphviz DOT text. Layout
//! is entirely the rendering collaborator's concern.

use petgraph::dot::Dot;
use serde::{Deserialize, Serialize};

use fabula_core::Result;

use crate::NarrativeGraph;

/// Exported node with its type label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeExport {
    /// Canonical entity key
    pub key: String,
    /// Entity-type label; empty when unknown
    pub label: String,
}

/// Exported directed edge with its relation labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeExport {
    /// Source entity key
    pub source: String,
    /// Target entity key
    pub target: String,
    /// Relation labels in insertion order (one, unless assembled under
    /// the accumulate policy)
    pub relations: Vec<String>,
}

/// Exported (subject, relation, object) row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripleExport {
    pub subject: String,
    pub relation: String,
    pub object: String,
}

/// Serializable snapshot of an assembled graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<EdgeExport>,
}

impl GraphExport {
    /// Snapshot a graph, preserving its deterministic iteration order
    pub fn from_graph(graph: &NarrativeGraph) -> Self {
        let nodes = graph
            .nodes()
            .map(|node| NodeExport {
                key: node.key.clone(),
                label: node.label.clone(),
            })
            .collect();

        let edges = graph
            .edges()
            .map(|(source, target, relations)| EdgeExport {
                source: source.to_string(),
                target: target.to_string(),
                relations: relations.to_vec(),
            })
            .collect();

        Self { nodes, edges }
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| anyhow::Error::new(e).into())
    }

    /// Flatten to (subject, relation, object) rows, one per relation label
    pub fn triples(&self) -> Vec<TripleExport> {
        self.edges
            .iter()
            .flat_map(|edge| {
                edge.relations.iter().map(|relation| TripleExport {
                    subject: edge.source.clone(),
                    relation: relation.clone(),
                    object: edge.target.clone(),
                })
            })
            .collect()
    }
}

/// Render a graph as Graphviz DOT text
pub fn to_dot(graph: &NarrativeGraph) -> String {
    format!("{}", Dot::new(graph.inner()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GraphAssembler;
    use fabula_core::{EntityRegistry, RelationTriple};

    fn sample_graph() -> NarrativeGraph {
        let mut entities = EntityRegistry::new();
        entities.register("lion", "ANIMAL");
        entities.register("jungle", "LOC");

        let triples = vec![RelationTriple::new("lion", "rule", "jungle")];
        GraphAssembler::default()
            .assemble(&entities, &triples)
            .unwrap()
    }

    #[test]
    fn test_export_shapes() {
        let export = GraphExport::from_graph(&sample_graph());

        assert_eq!(
            export.nodes,
            vec![
                NodeExport {
                    key: "lion".to_string(),
                    label: "ANIMAL".to_string()
                },
                NodeExport {
                    key: "jungle".to_string(),
                    label: "LOC".to_string()
                },
            ]
        );
        assert_eq!(export.edges.len(), 1);
        assert_eq!(export.edges[0].relations, vec!["rule".to_string()]);
    }

    #[test]
    fn test_triples_flatten_relations() {
        let export = GraphExport::from_graph(&sample_graph());
        let triples = export.triples();

        assert_eq!(
            triples,
            vec![TripleExport {
                subject: "lion".to_string(),
                relation: "rule".to_string(),
                object: "jungle".to_string(),
            }]
        );
    }

    #[test]
    fn test_json_round_trip() {
        let export = GraphExport::from_graph(&sample_graph());
        let json = export.to_json().unwrap();

        let parsed: GraphExport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, export);
    }

    #[test]
    fn test_dot_contains_nodes_and_edge_label() {
        let dot = to_dot(&sample_graph());

        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("lion"));
        assert!(dot.contains("jungle"));
        assert!(dot.contains("rule"));
    }
}
