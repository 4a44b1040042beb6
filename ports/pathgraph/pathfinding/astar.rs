/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! A* best-first search.
//!
//! f(n) = g(n) + h(n), where g is the best known cost from the start and h the
//! heuristic estimate to the goal. The open set is a binary heap that may hold
//! several entries for the same node; an entry pushed before a cheaper route
//! was found is simply expanded again, which relaxes nothing, since
//! `g_score` is the single source of truth. There is no closed set.
//!
//! Node positions come from the injected [`Layout`] and are recomputed on
//! every call.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use log::{debug, trace};

use super::{DEFAULT_EDGE_WEIGHT, HeuristicKind, Path, SearchError};
use crate::graph::{GraphView, NodeId};
use crate::layout::{Layout, Positions};

/// Open-set entry, ordered so the heap pops the lowest f-score first and,
/// among equal f-scores, the lowest node id.
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f_score: f64,
    node: NodeId,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Configurable A* search.
///
/// ```ignore
/// let layout = ShellLayout::default();
/// let path = PathFinder::new(&layout)
///     .with_heuristic(HeuristicKind::Zero)
///     .search(&graph, 0, 3)?;
/// ```
pub struct PathFinder<'a> {
    layout: &'a dyn Layout,
    heuristic: HeuristicKind,
    max_expansions: Option<usize>,
}

impl<'a> PathFinder<'a> {
    /// Create a finder using the Euclidean heuristic over `layout` and no expansion cap
    pub fn new(layout: &'a dyn Layout) -> Self {
        Self {
            layout,
            heuristic: HeuristicKind::default(),
            max_expansions: None,
        }
    }

    #[must_use]
    pub fn with_heuristic(mut self, heuristic: HeuristicKind) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Give up with [`SearchError::ExpansionLimit`] after expanding `limit` nodes
    #[must_use]
    pub fn with_max_expansions(mut self, limit: usize) -> Self {
        self.max_expansions = Some(limit);
        self
    }

    /// Find the cheapest path from `start` to `goal`.
    ///
    /// Returns an empty [`Path`] when the goal is unreachable. Does not mutate the graph.
    pub fn search(
        &self,
        graph: &dyn GraphView,
        start: NodeId,
        goal: NodeId,
    ) -> Result<Path, SearchError> {
        for node in [start, goal] {
            if !graph.contains(node) {
                return Err(SearchError::UnknownNode(node));
            }
        }

        let positions = if self.heuristic.needs_positions() {
            self.layout.positions(graph)
        } else {
            Positions::new()
        };
        let estimate = |node: NodeId| self.heuristic.estimate(node, goal, &positions);

        let mut g_score: HashMap<NodeId, f64> = graph
            .nodes()
            .into_iter()
            .map(|node| (node, f64::INFINITY))
            .collect();
        g_score.insert(start, 0.0);

        let mut came_from: HashMap<NodeId, Option<NodeId>> = HashMap::from([(start, None)]);

        let mut open_set = BinaryHeap::new();
        open_set.push(OpenEntry {
            f_score: estimate(start)?,
            node: start,
        });

        let mut expanded = 0;

        while let Some(OpenEntry { node: current, .. }) = open_set.pop() {
            if current == goal {
                let nodes = reconstruct_path(&came_from, goal)?;
                let cost = g_score.get(&goal).copied().unwrap_or(0.0);
                debug!(
                    "Path {start} -> {goal}: {} nodes, cost {cost}, {expanded} expansions",
                    nodes.len()
                );
                return Ok(Path {
                    nodes,
                    cost,
                    expanded,
                });
            }

            expanded += 1;
            if let Some(limit) = self.max_expansions
                && expanded > limit
            {
                return Err(SearchError::ExpansionLimit { limit });
            }

            let current_g = g_score.get(&current).copied().unwrap_or(f64::INFINITY);
            trace!("Expanding {current} (g = {current_g})");

            for neighbor in graph.neighbors(current) {
                let weight = graph.weight(current, neighbor).unwrap_or(DEFAULT_EDGE_WEIGHT);
                let tentative_g = current_g + weight;
                let known_g = g_score.get(&neighbor).copied().unwrap_or(f64::INFINITY);

                if tentative_g < known_g {
                    came_from.insert(neighbor, Some(current));
                    g_score.insert(neighbor, tentative_g);
                    open_set.push(OpenEntry {
                        f_score: tentative_g + estimate(neighbor)?,
                        node: neighbor,
                    });
                }
            }
        }

        debug!("No path {start} -> {goal} after {expanded} expansions");
        Ok(Path::unreachable(expanded))
    }
}

/// Search with the default finder (Euclidean heuristic, no expansion cap)
pub fn search(
    graph: &dyn GraphView,
    layout: &dyn Layout,
    start: NodeId,
    goal: NodeId,
) -> Result<Path, SearchError> {
    PathFinder::new(layout).search(graph, start, goal)
}

/// Walk predecessors back from `goal` to the node whose predecessor is `None`,
/// returning the chain in start-to-goal order.
pub fn reconstruct_path(
    came_from: &HashMap<NodeId, Option<NodeId>>,
    goal: NodeId,
) -> Result<Vec<NodeId>, SearchError> {
    let mut path = Vec::new();
    let mut current = Some(goal);

    while let Some(node) = current {
        // a chain longer than the map must revisit a node
        if path.len() >= came_from.len() {
            return Err(SearchError::BrokenChain(node));
        }
        path.push(node);
        current = *came_from.get(&node).ok_or(SearchError::BrokenChain(node))?;
    }

    path.reverse();
    Ok(path)
}
