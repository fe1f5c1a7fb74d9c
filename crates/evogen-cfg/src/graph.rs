//! Node/edge model of the program under test.
//!
//! The graph is built once per target (from the instrumenter's JSON output)
//! and immutable thereafter. A reverse adjacency list is precomputed at
//! construction because the approach-level search only ever walks backwards,
//! from a candidate branch towards the entry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from graph construction.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("edge references unknown node: {0}")]
    UnknownNode(String),

    #[error("malformed graph JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// What role a node plays in the program's control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Entry node of a function or the whole subject.
    Root,
    /// A node whose outgoing edges carry branch outcomes.
    Branch,
    /// Plain sequential node.
    Intermediary,
    /// Exit node.
    Exit,
    /// Synthetic node inserted by the instrumenter.
    Placeholder,
}

/// One node of the control-flow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Stable id assigned by the instrumenter.
    pub id: String,
    pub kind: NodeKind,
    /// Source lines this node spans.
    #[serde(default)]
    pub lines: Vec<u32>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            lines: Vec::new(),
        }
    }
}

/// One directed edge.
///
/// `branch_type` is present on control-decision edges (the true/false
/// outcomes of a branch node) and absent on plain sequential edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub branch_type: Option<bool>,
}

impl Edge {
    pub fn plain(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            branch_type: None,
        }
    }

    pub fn branch(from: impl Into<String>, to: impl Into<String>, outcome: bool) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            branch_type: Some(outcome),
        }
    }

    /// Whether this edge is a control decision (weight 2 in approach-level
    /// search) rather than plain sequential flow (weight 1).
    pub fn is_control(&self) -> bool {
        self.branch_type.is_some()
    }
}

/// Immutable control-flow graph with precomputed reverse adjacency.
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    nodes: BTreeMap<String, Node>,
    edges: Vec<Edge>,
    /// Indices into `edges`, keyed by the edge's `to` node.
    incoming: BTreeMap<String, Vec<usize>>,
}

/// Serialized form, as emitted by the instrumenter.
#[derive(Serialize, Deserialize)]
struct GraphFile {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl ControlFlowGraph {
    /// Build a graph, validating that every edge endpoint exists.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, GraphError> {
        let mut node_map = BTreeMap::new();
        for node in nodes {
            if node_map.insert(node.id.clone(), node.clone()).is_some() {
                return Err(GraphError::DuplicateNode(node.id));
            }
        }

        let mut incoming: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, edge) in edges.iter().enumerate() {
            if !node_map.contains_key(&edge.from) {
                return Err(GraphError::UnknownNode(edge.from.clone()));
            }
            if !node_map.contains_key(&edge.to) {
                return Err(GraphError::UnknownNode(edge.to.clone()));
            }
            incoming.entry(edge.to.clone()).or_default().push(i);
        }

        Ok(Self {
            nodes: node_map,
            edges,
            incoming,
        })
    }

    /// Parse a graph from the instrumenter's JSON.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let file: GraphFile = serde_json::from_str(json)?;
        Self::new(file.nodes, file.edges)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edges ending at `id`, in insertion order.
    pub fn incoming_edges(&self, id: &str) -> impl Iterator<Item = &Edge> {
        self.incoming
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.edges[i])
    }

    /// The entry node (first `Root` node by id).
    pub fn entry(&self) -> Option<&Node> {
        self.nodes.values().find(|n| n.kind == NodeKind::Root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> ControlFlowGraph {
        ControlFlowGraph::new(
            vec![
                Node::new("ROOT", NodeKind::Root),
                Node::new("1", NodeKind::Branch),
                Node::new("2", NodeKind::Intermediary),
                Node::new("3", NodeKind::Intermediary),
            ],
            vec![
                Edge::plain("ROOT", "1"),
                Edge::branch("1", "2", true),
                Edge::branch("1", "3", false),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_graph_new() {
        let cfg = diamond();
        assert_eq!(cfg.node_count(), 4);
        assert_eq!(cfg.edges().len(), 3);
    }

    #[test]
    fn test_graph_duplicate_node_rejected() {
        let result = ControlFlowGraph::new(
            vec![
                Node::new("A", NodeKind::Root),
                Node::new("A", NodeKind::Exit),
            ],
            Vec::new(),
        );
        assert!(matches!(result, Err(GraphError::DuplicateNode(_))));
    }

    #[test]
    fn test_graph_unknown_edge_endpoint_rejected() {
        let result = ControlFlowGraph::new(
            vec![Node::new("A", NodeKind::Root)],
            vec![Edge::plain("A", "missing")],
        );
        assert!(matches!(result, Err(GraphError::UnknownNode(_))));
    }

    #[test]
    fn test_graph_incoming_edges() {
        let cfg = diamond();
        let into_two: Vec<_> = cfg.incoming_edges("2").collect();
        assert_eq!(into_two.len(), 1);
        assert_eq!(into_two[0].from, "1");
        assert!(into_two[0].is_control());

        let into_root: Vec<_> = cfg.incoming_edges("ROOT").collect();
        assert!(into_root.is_empty());
    }

    #[test]
    fn test_graph_entry() {
        let cfg = diamond();
        assert_eq!(cfg.entry().unwrap().id, "ROOT");
    }

    #[test]
    fn test_graph_from_json() {
        let json = r#"{
            "nodes": [
                {"id": "ROOT", "kind": "root"},
                {"id": "1", "kind": "branch", "lines": [3, 4]}
            ],
            "edges": [
                {"from": "ROOT", "to": "1"}
            ]
        }"#;
        let cfg = ControlFlowGraph::from_json(json).unwrap();
        assert_eq!(cfg.node_count(), 2);
        assert_eq!(cfg.node("1").unwrap().lines, vec![3, 4]);
        assert!(!cfg.edges()[0].is_control());
    }

    #[test]
    fn test_graph_from_json_malformed() {
        assert!(matches!(
            ControlFlowGraph::from_json("not json"),
            Err(GraphError::Json(_))
        ));
    }
}
