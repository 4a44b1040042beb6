/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Read-only graph capability consumed by layout and pathfinding.
//!
//! The search engine never sees `Graph` directly, only this trait, so tests
//! and alternative stores can feed it their own adjacency.

use super::{Graph, NodeId};

/// Read-only access to nodes, adjacency and edge weights
pub trait GraphView {
    /// All node ids, ascending
    fn nodes(&self) -> Vec<NodeId>;

    /// Neighbors of `node`, ascending (empty for unknown nodes)
    fn neighbors(&self, node: NodeId) -> Vec<NodeId>;

    /// Weight of the edge between two adjacent nodes; `None` when unset
    fn weight(&self, a: NodeId, b: NodeId) -> Option<f64>;

    fn contains(&self, node: NodeId) -> bool {
        self.nodes().contains(&node)
    }
}

impl GraphView for Graph {
    fn nodes(&self) -> Vec<NodeId> {
        self.node_ids().collect()
    }

    fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        self.neighbor_ids(node)
    }

    fn weight(&self, a: NodeId, b: NodeId) -> Option<f64> {
        self.edge_weight(a, b).map(f64::from)
    }

    fn contains(&self, node: NodeId) -> bool {
        self.contains_node(node)
    }
}
