/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Shortest paths over weighted graphs.
//!
//! - `heuristic`: straight-line distance between laid-out nodes
//! - `astar`: best-first search and predecessor-chain reconstruction
//!
//! An unreachable goal is not an error: the search returns an empty [`Path`].

use thiserror::Error;

use crate::graph::{GraphView, NodeId};

pub mod astar;
pub mod heuristic;

pub use astar::{PathFinder, reconstruct_path, search};
pub use heuristic::{HeuristicKind, heuristic};

/// Weight assumed for an edge whose weight is unset
pub const DEFAULT_EDGE_WEIGHT: f64 = 1.0;

/// Errors from the search engine. All of them are caller precondition failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("node {0} is not in the graph")]
    UnknownNode(NodeId),

    #[error("node {0} has no layout position")]
    MissingPosition(NodeId),

    #[error("predecessor chain is broken at node {0}")]
    BrokenChain(NodeId),

    #[error("search gave up after expanding {limit} nodes")]
    ExpansionLimit { limit: usize },
}

/// Result of a search: nodes from start to goal inclusive, or empty if unreachable
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub nodes: Vec<NodeId>,

    /// Sum of edge weights along `nodes`
    pub cost: f64,

    /// Number of non-goal pops from the open set
    pub expanded: usize,
}

impl Path {
    /// The "no path" outcome
    pub fn unreachable(expanded: usize) -> Self {
        Self {
            nodes: Vec::new(),
            cost: f64::INFINITY,
            expanded,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn start(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn goal(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// Consecutive node pairs along the path
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.nodes.windows(2).map(|pair| (pair[0], pair[1]))
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Whether the path walks the edge between `a` and `b` in either direction
    pub fn contains_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.edges()
            .any(|(x, y)| (x == a && y == b) || (x == b && y == a))
    }
}

/// Total weight of walking `nodes` in order, `None` if two consecutive nodes
/// are not adjacent. Unset weights count as [`DEFAULT_EDGE_WEIGHT`].
pub fn path_cost(graph: &dyn GraphView, nodes: &[NodeId]) -> Option<f64> {
    nodes.windows(2).try_fold(0.0, |total, pair| {
        let (a, b) = (pair[0], pair[1]);
        if !graph.neighbors(a).contains(&b) {
            return None;
        }
        Some(total + graph.weight(a, b).unwrap_or(DEFAULT_EDGE_WEIGHT))
    })
}
