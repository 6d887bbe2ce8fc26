//! The node/edge container agents observe and mutate.
//!
//! `Network` wraps a `petgraph` graph and adds a node-key index, so nodes are
//! addressed by their identifier ([`Node`]) rather than by storage index.
//! Four variants share one implementation:
//!
//! | kind           | directed | parallel edges |
//! |----------------|----------|----------------|
//! | `Graph`        | no       | no             |
//! | `DiGraph`      | yes      | no             |
//! | `MultiGraph`   | no       | yes            |
//! | `MultiDiGraph` | yes      | yes            |
//!
//! Edges are always stored directed; undirected variants look them up in
//! both directions.

use crate::{Node, NodeLabel};
use netsim_types::Attributes;
use petgraph::graph::{DiGraph as PetDiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Which of the four network variants to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    #[default]
    Graph,
    DiGraph,
    MultiGraph,
    MultiDiGraph,
}

impl NetworkKind {
    pub fn is_directed(self) -> bool {
        matches!(self, NetworkKind::DiGraph | NetworkKind::MultiDiGraph)
    }

    pub fn is_multigraph(self) -> bool {
        matches!(self, NetworkKind::MultiGraph | NetworkKind::MultiDiGraph)
    }
}

/// Errors raised by network mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("Node {0} is not in the network")]
    UnknownNode(String),
}

#[derive(Debug, Clone)]
struct NodeSlot {
    node: Node,
    attributes: Attributes,
}

/// Graph container keyed by [`Node`].
#[derive(Debug, Clone, Default)]
pub struct Network {
    kind: NetworkKind,
    graph: PetDiGraph<NodeSlot, Attributes>,
    index: HashMap<Node, NodeIndex>,
}

impl Network {
    /// Create an empty network of the given kind.
    pub fn new(kind: NetworkKind) -> Self {
        Self {
            kind,
            graph: PetDiGraph::new(),
            index: HashMap::new(),
        }
    }

    pub fn kind(&self) -> NetworkKind {
        self.kind
    }

    /// Add a node. Adding an existing node merges the given attributes into
    /// the ones it already has.
    ///
    /// Returns `true` if the node was new.
    pub fn add_node(&mut self, node: Node, attributes: Option<Attributes>) -> bool {
        if let Some(&idx) = self.index.get(&node) {
            if let Some(attributes) = attributes {
                self.graph[idx].attributes.extend(attributes);
            }
            return false;
        }

        let idx = self.graph.add_node(NodeSlot {
            node: node.clone(),
            attributes: attributes.unwrap_or_default(),
        });
        self.index.insert(node, idx);
        true
    }

    /// Add an edge between two existing nodes.
    ///
    /// On simple variants an existing edge between the same endpoints (in
    /// either direction when undirected) has its attributes updated instead
    /// of gaining a parallel edge.
    pub fn add_edge(
        &mut self,
        source: &Node,
        destination: &Node,
        attributes: Option<Attributes>,
    ) -> Result<(), NetworkError> {
        let a = self.node_index(source)?;
        let b = self.node_index(destination)?;

        if !self.kind.is_multigraph() {
            if let Some(edge) = self.find_edge(a, b) {
                if let Some(attributes) = attributes {
                    self.graph[edge].extend(attributes);
                }
                return Ok(());
            }
        }

        self.graph.add_edge(a, b, attributes.unwrap_or_default());
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_node(&self, node: &Node) -> bool {
        self.index.contains_key(node)
    }

    /// Whether an edge links `source` to `destination` (either way when
    /// undirected).
    pub fn has_edge(&self, source: &Node, destination: &Node) -> bool {
        match (self.index.get(source), self.index.get(destination)) {
            (Some(&a), Some(&b)) => self.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.graph.node_weights().map(|slot| &slot.node)
    }

    /// Nodes with their attributes, in insertion order.
    pub fn nodes_with_attributes(&self) -> impl Iterator<Item = (&Node, &Attributes)> + '_ {
        self.graph
            .node_weights()
            .map(|slot| (&slot.node, &slot.attributes))
    }

    pub fn node_attributes(&self, node: &Node) -> Option<&Attributes> {
        self.index
            .get(node)
            .map(|&idx| &self.graph[idx].attributes)
    }

    pub fn node_attributes_mut(&mut self, node: &Node) -> Option<&mut Attributes> {
        let idx = *self.index.get(node)?;
        Some(&mut self.graph[idx].attributes)
    }

    /// Edges as `(source, destination, attributes)` in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&Node, &Node, &Attributes)> + '_ {
        self.graph.raw_edges().iter().map(|edge| {
            (
                &self.graph[edge.source()].node,
                &self.graph[edge.target()].node,
                &edge.weight,
            )
        })
    }

    /// Nodes adjacent to `node`: successors when directed, all neighbours
    /// otherwise. Parallel edges yield repeated neighbours.
    pub fn neighbors<'a>(&'a self, node: &Node) -> impl Iterator<Item = &'a Node> + 'a {
        let idx = self.index.get(node).copied();
        let directed = self.kind.is_directed();
        idx.into_iter().flat_map(move |idx| {
            let iter: Box<dyn Iterator<Item = NodeIndex> + 'a> = if directed {
                Box::new(self.graph.neighbors(idx))
            } else {
                Box::new(self.graph.neighbors_undirected(idx))
            };
            iter.map(move |n| &self.graph[n].node)
        })
    }

    /// Serialisable copy of the current structure and attributes.
    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            kind: self.kind,
            nodes: self
                .graph
                .node_weights()
                .map(|slot| (slot.node.label(), slot.attributes.clone()))
                .collect(),
            edges: self
                .graph
                .raw_edges()
                .iter()
                .map(|edge| {
                    (
                        edge.source().index(),
                        edge.target().index(),
                        edge.weight.clone(),
                    )
                })
                .collect(),
        }
    }

    fn node_index(&self, node: &Node) -> Result<NodeIndex, NetworkError> {
        self.index
            .get(node)
            .copied()
            .ok_or_else(|| NetworkError::UnknownNode(node.to_string()))
    }

    fn find_edge(&self, a: NodeIndex, b: NodeIndex) -> Option<petgraph::graph::EdgeIndex> {
        if self.kind.is_directed() {
            self.graph.find_edge(a, b)
        } else {
            self.graph.find_edge_undirected(a, b).map(|(edge, _)| edge)
        }
    }
}

/// Behaviour-free, serialisable copy of a [`Network`].
///
/// Edge endpoints are positions in `nodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub kind: NetworkKind,
    pub nodes: Vec<(NodeLabel, Attributes)>,
    pub edges: Vec<(usize, usize, Attributes)>,
}

impl NetworkSnapshot {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of nodes whose boolean attribute `name` is `true`.
    pub fn count_true(&self, name: &str) -> usize {
        self.nodes
            .iter()
            .filter(|(_, attrs)| attrs.get(name).and_then(|v| v.as_bool()) == Some(true))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netsim_types::Value;

    fn attrs(pairs: &[(&str, Value)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_add_nodes_and_edges() {
        let mut net = Network::new(NetworkKind::Graph);
        assert!(net.add_node(Node::Index(1), None));
        assert!(net.add_node(Node::Index(2), Some(attrs(&[("state", Value::Bool(true))]))));

        net.add_edge(&Node::Index(1), &Node::Index(2), None).unwrap();

        assert_eq!(net.node_count(), 2);
        assert_eq!(net.edge_count(), 1);
        assert!(net.node_attributes(&Node::Index(1)).unwrap().is_empty());
        assert_eq!(
            net.node_attributes(&Node::Index(2)).unwrap()["state"],
            Value::Bool(true)
        );
    }

    #[test]
    fn test_edge_to_missing_node_fails() {
        let mut net = Network::new(NetworkKind::Graph);
        net.add_node(Node::Index(0), None);
        let err = net.add_edge(&Node::Index(0), &Node::Index(9), None).unwrap_err();
        assert_eq!(err, NetworkError::UnknownNode("Node(9)".to_string()));
    }

    #[test]
    fn test_readding_node_merges_attributes() {
        let mut net = Network::new(NetworkKind::Graph);
        net.add_node(Node::Index(0), Some(attrs(&[("a", Value::Int(1))])));
        assert!(!net.add_node(Node::Index(0), Some(attrs(&[("b", Value::Int(2))]))));

        let stored = net.node_attributes(&Node::Index(0)).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(net.node_count(), 1);
    }

    #[test]
    fn test_simple_undirected_deduplicates_reverse_edges() {
        let mut net = Network::new(NetworkKind::Graph);
        net.add_node(Node::Index(0), None);
        net.add_node(Node::Index(1), None);
        net.add_edge(&Node::Index(0), &Node::Index(1), None).unwrap();
        net.add_edge(&Node::Index(1), &Node::Index(0), None).unwrap();

        assert_eq!(net.edge_count(), 1);
        assert!(net.has_edge(&Node::Index(1), &Node::Index(0)));
    }

    #[test]
    fn test_simple_directed_keeps_both_directions() {
        let mut net = Network::new(NetworkKind::DiGraph);
        net.add_node(Node::Index(0), None);
        net.add_node(Node::Index(1), None);
        net.add_edge(&Node::Index(0), &Node::Index(1), None).unwrap();
        net.add_edge(&Node::Index(1), &Node::Index(0), None).unwrap();
        net.add_edge(&Node::Index(0), &Node::Index(1), None).unwrap();

        assert_eq!(net.edge_count(), 2);
        let succ: Vec<_> = net.neighbors(&Node::Index(0)).collect();
        assert_eq!(succ, vec![&Node::Index(1)]);
    }

    #[test]
    fn test_multigraph_keeps_parallel_edges() {
        let mut net = Network::new(NetworkKind::MultiGraph);
        net.add_node(Node::Index(0), None);
        net.add_node(Node::Index(1), None);
        net.add_edge(&Node::Index(0), &Node::Index(1), None).unwrap();
        net.add_edge(&Node::Index(1), &Node::Index(0), None).unwrap();

        assert_eq!(net.edge_count(), 2);
        assert_eq!(net.neighbors(&Node::Index(0)).count(), 2);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut net = Network::new(NetworkKind::DiGraph);
        net.add_node(Node::Index(0), Some(attrs(&[("alive", Value::Bool(true))])));
        net.add_node(Node::Index(1), Some(attrs(&[("alive", Value::Bool(false))])));
        net.add_edge(&Node::Index(0), &Node::Index(1), Some(attrs(&[("w", Value::Float(0.5))])))
            .unwrap();

        let snapshot = net.snapshot();
        assert_eq!(snapshot.count_true("alive"), 1);
        assert_eq!(snapshot.edges[0].0, 0);
        assert_eq!(snapshot.edges[0].1, 1);

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: NetworkSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
