/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Weighted graph store for the path workbench.
//!
//! Core structures:
//! - `Graph`: undirected graph backed by petgraph::StableGraph
//! - `NodeId`: user-facing node identifier (assigned by count)
//! - `EdgeView`: read-only copy of an edge and its weight

use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::persistence::types::{GraphSnapshot, PersistedEdge};

pub mod spatial;
pub mod view;

pub use view::GraphView;

/// User-facing node identifier
pub type NodeId = u32;

/// Traversal cost of an edge, always strictly positive
pub type EdgeWeight = u32;

/// Errors from graph mutations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("edge weight must be greater than zero")]
    NonPositiveWeight,

    #[error("there is no edge between {0} and {1}")]
    MissingEdge(NodeId, NodeId),
}

/// Read-only view of an edge, endpoints ordered so that `a <= b`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeView {
    pub a: NodeId,
    pub b: NodeId,
    pub weight: EdgeWeight,
}

/// Main graph structure backed by petgraph::StableGraph
#[derive(Clone, Debug, Default)]
pub struct Graph {
    /// The underlying petgraph stable graph (node weight is the NodeId)
    inner: StableUnGraph<NodeId, EdgeWeight>,

    /// NodeId to petgraph index, ordered for deterministic enumeration
    index: BTreeMap<NodeId, NodeIndex>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, numbering it by the current node count.
    ///
    /// After removals the count may already be taken, in which case the
    /// smallest free identifier above it is used.
    pub fn add_node(&mut self) -> NodeId {
        let mut id = self.index.len() as NodeId;
        while self.index.contains_key(&id) {
            id += 1;
        }
        self.insert_node(id);
        id
    }

    /// Add a node with an explicit identifier. Returns false if it already exists.
    pub fn add_node_with_id(&mut self, id: NodeId) -> bool {
        if self.index.contains_key(&id) {
            return false;
        }
        self.insert_node(id);
        true
    }

    fn insert_node(&mut self, id: NodeId) {
        let idx = self.inner.add_node(id);
        self.index.insert(id, idx);
    }

    /// Remove a node and all its incident edges
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        match self.index.remove(&id) {
            Some(idx) => self.inner.remove_node(idx).is_some(),
            None => false,
        }
    }

    /// Add an undirected edge, overwriting the weight if the edge exists
    pub fn add_edge(
        &mut self,
        a: NodeId,
        b: NodeId,
        weight: EdgeWeight,
    ) -> Result<(), GraphError> {
        if weight == 0 {
            return Err(GraphError::NonPositiveWeight);
        }
        let ia = self.node_index(a)?;
        let ib = self.node_index(b)?;
        self.inner.update_edge(ia, ib, weight);
        Ok(())
    }

    /// Remove the edge between `a` and `b`, returning its weight
    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> Result<EdgeWeight, GraphError> {
        let ia = self.node_index(a)?;
        let ib = self.node_index(b)?;
        self.inner
            .find_edge(ia, ib)
            .and_then(|edge| self.inner.remove_edge(edge))
            .ok_or(GraphError::MissingEdge(a, b))
    }

    fn node_index(&self, id: NodeId) -> Result<NodeIndex, GraphError> {
        self.index
            .get(&id)
            .copied()
            .ok_or(GraphError::UnknownNode(id))
    }

    /// Check whether a node exists
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Check whether an edge exists between `a` and `b`
    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.edge_weight(a, b).is_some()
    }

    /// Weight of the edge between `a` and `b`, if any
    pub fn edge_weight(&self, a: NodeId, b: NodeId) -> Option<EdgeWeight> {
        let ia = *self.index.get(&a)?;
        let ib = *self.index.get(&b)?;
        let edge = self.inner.find_edge(ia, ib)?;
        self.inner.edge_weight(edge).copied()
    }

    /// Iterate over node ids in ascending order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.index.keys().copied()
    }

    /// Neighbor ids of a node in ascending order (empty for unknown nodes)
    pub fn neighbor_ids(&self, id: NodeId) -> Vec<NodeId> {
        let Some(&idx) = self.index.get(&id) else {
            return Vec::new();
        };
        let mut neighbors: Vec<NodeId> = self.inner.neighbors(idx).map(|n| self.inner[n]).collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    /// All edges, sorted by endpoints
    pub fn edges(&self) -> Vec<EdgeView> {
        let mut edges: Vec<EdgeView> = self
            .inner
            .edge_references()
            .map(|e| {
                let (x, y) = (self.inner[e.source()], self.inner[e.target()]);
                EdgeView {
                    a: x.min(y),
                    b: x.max(y),
                    weight: *e.weight(),
                }
            })
            .collect();
        edges.sort_unstable_by_key(|e| (e.a, e.b));
        edges
    }

    /// Count of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    /// Count of edges in the graph
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Drop every node and edge
    pub fn clear(&mut self) {
        self.inner.clear();
        self.index.clear();
    }

    /// Serialize the graph to a persistable snapshot
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let edges = self
            .edges()
            .into_iter()
            .map(|e| PersistedEdge {
                a: e.a,
                b: e.b,
                weight: e.weight,
            })
            .collect();

        let timestamp_secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        GraphSnapshot {
            nodes: self.node_ids().collect(),
            edges,
            timestamp_secs,
        }
    }

    /// Rebuild a graph from a persisted snapshot.
    ///
    /// Edges referencing missing nodes or carrying a zero weight are dropped.
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Self {
        let mut graph = Graph::new();
        for &id in &snapshot.nodes {
            graph.add_node_with_id(id);
        }
        for edge in &snapshot.edges {
            if let Err(e) = graph.add_edge(edge.a, edge.b, edge.weight) {
                log::warn!("Dropping persisted edge {}-{}: {e}", edge.a, edge.b);
            }
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_new() {
        let graph = Graph::new();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_add_node_numbers_by_count() {
        let mut graph = Graph::new();
        assert_eq!(graph.add_node(), 0);
        assert_eq!(graph.add_node(), 1);
        assert_eq!(graph.add_node(), 2);
        assert_eq!(graph.node_ids().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_add_node_after_removal_skips_taken_ids() {
        let mut graph = Graph::new();
        for _ in 0..3 {
            graph.add_node();
        }
        assert!(graph.remove_node(0));
        // count is 2, but 2 is still taken
        assert_eq!(graph.add_node(), 3);
        assert_eq!(graph.node_ids().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_add_node_with_id_rejects_duplicates() {
        let mut graph = Graph::new();
        assert!(graph.add_node_with_id(7));
        assert!(!graph.add_node_with_id(7));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_add_edge_is_undirected() {
        let mut graph = Graph::new();
        let a = graph.add_node();
        let b = graph.add_node();
        graph.add_edge(a, b, 4).unwrap();

        assert!(graph.has_edge(a, b));
        assert!(graph.has_edge(b, a));
        assert_eq!(graph.edge_weight(b, a), Some(4));
        assert_eq!(graph.neighbor_ids(a), vec![b]);
        assert_eq!(graph.neighbor_ids(b), vec![a]);
    }

    #[test]
    fn test_add_edge_overwrites_weight() {
        let mut graph = Graph::new();
        let a = graph.add_node();
        let b = graph.add_node();
        graph.add_edge(a, b, 4).unwrap();
        graph.add_edge(b, a, 9).unwrap();

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge_weight(a, b), Some(9));
    }

    #[test]
    fn test_add_edge_invalid() {
        let mut graph = Graph::new();
        let a = graph.add_node();
        let b = graph.add_node();

        assert_eq!(graph.add_edge(a, 99, 1), Err(GraphError::UnknownNode(99)));
        assert_eq!(graph.add_edge(a, b, 0), Err(GraphError::NonPositiveWeight));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_remove_edge() {
        let mut graph = Graph::new();
        let a = graph.add_node();
        let b = graph.add_node();
        graph.add_edge(a, b, 3).unwrap();

        assert_eq!(graph.remove_edge(b, a), Ok(3));
        assert!(!graph.has_edge(a, b));
        assert_eq!(graph.remove_edge(a, b), Err(GraphError::MissingEdge(a, b)));
    }

    #[test]
    fn test_remove_node_drops_incident_edges() {
        let mut graph = Graph::new();
        let a = graph.add_node();
        let b = graph.add_node();
        let c = graph.add_node();
        graph.add_edge(a, b, 1).unwrap();
        graph.add_edge(b, c, 1).unwrap();

        assert!(graph.remove_node(b));
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.neighbor_ids(a).is_empty());
        assert!(!graph.remove_node(b));
    }

    #[test]
    fn test_edges_sorted_and_normalized() {
        let mut graph = Graph::new();
        for _ in 0..3 {
            graph.add_node();
        }
        graph.add_edge(2, 0, 5).unwrap();
        graph.add_edge(1, 0, 1).unwrap();

        let edges = graph.edges();
        assert_eq!(
            edges,
            vec![
                EdgeView { a: 0, b: 1, weight: 1 },
                EdgeView { a: 0, b: 2, weight: 5 },
            ]
        );
    }

    #[test]
    fn test_clear() {
        let mut graph = Graph::new();
        let a = graph.add_node();
        let b = graph.add_node();
        graph.add_edge(a, b, 1).unwrap();
        graph.clear();

        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.add_node(), 0);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut graph = Graph::new();
        for _ in 0..4 {
            graph.add_node();
        }
        graph.add_edge(0, 1, 1).unwrap();
        graph.add_edge(2, 3, 7).unwrap();
        graph.remove_node(1);

        let snapshot = graph.to_snapshot();
        let restored = Graph::from_snapshot(&snapshot);

        assert_eq!(restored.node_ids().collect::<Vec<_>>(), vec![0, 2, 3]);
        assert_eq!(restored.edges(), graph.edges());
    }

    #[test]
    fn test_snapshot_drops_dangling_edges() {
        let snapshot = GraphSnapshot {
            nodes: vec![0, 1],
            edges: vec![
                PersistedEdge { a: 0, b: 1, weight: 2 },
                PersistedEdge { a: 0, b: 5, weight: 2 },
                PersistedEdge { a: 1, b: 0, weight: 0 },
            ],
            timestamp_secs: 0,
        };
        let graph = Graph::from_snapshot(&snapshot);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge_weight(0, 1), Some(2));
    }
}
