/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Node positioning for drawing and for the A* distance estimate.
//!
//! Layouts are pure functions of the current graph. Callers recompute them
//! whenever they need positions; nothing here caches.

use std::collections::HashMap;
use std::f64::consts::{PI, TAU};

use euclid::default::Point2D;
use serde::{Deserialize, Serialize};

use crate::graph::{GraphView, NodeId};

pub mod force;

pub use force::{ForceConfig, ForceLayout};

/// Node id to 2-D coordinate
pub type Positions = HashMap<NodeId, Point2D<f64>>;

/// Something that can place every node of a graph on the plane
pub trait Layout {
    fn positions(&self, graph: &dyn GraphView) -> Positions;
}

impl<F> Layout for F
where
    F: Fn(&dyn GraphView) -> Positions,
{
    fn positions(&self, graph: &dyn GraphView) -> Positions {
        self(graph)
    }
}

/// All nodes on a single circle, in ascending id order.
///
/// A lone node sits at the center. Otherwise node `i` of `n` is placed at
/// angle `pi + 2*pi*i/n` on a circle of radius `scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShellLayout {
    pub scale: f64,
    pub center: Point2D<f64>,
}

impl ShellLayout {
    pub fn new(scale: f64, center: Point2D<f64>) -> Self {
        Self { scale, center }
    }
}

impl Default for ShellLayout {
    fn default() -> Self {
        Self::new(1.0, Point2D::origin())
    }
}

impl Layout for ShellLayout {
    fn positions(&self, graph: &dyn GraphView) -> Positions {
        let nodes = graph.nodes();
        if nodes.len() == 1 {
            return nodes.into_iter().map(|n| (n, self.center)).collect();
        }

        let count = nodes.len() as f64;
        nodes
            .into_iter()
            .enumerate()
            .map(|(i, node)| {
                let theta = PI + TAU * i as f64 / count;
                let position = Point2D::new(
                    self.center.x + self.scale * theta.cos(),
                    self.center.y + self.scale * theta.sin(),
                );
                (node, position)
            })
            .collect()
    }
}

/// Layout selectable from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    #[default]
    Shell,
    Force,
}

impl LayoutKind {
    /// Build the layout with default parameters
    pub fn build(self) -> Box<dyn Layout> {
        match self {
            LayoutKind::Shell => Box::new(ShellLayout::default()),
            LayoutKind::Force => Box::new(ForceLayout::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    fn graph_with(n: usize) -> Graph {
        let mut graph = Graph::new();
        for _ in 0..n {
            graph.add_node();
        }
        graph
    }

    #[test]
    fn test_shell_layout_empty_graph() {
        let positions = ShellLayout::default().positions(&Graph::new());
        assert!(positions.is_empty());
    }

    #[test]
    fn test_shell_layout_single_node_at_center() {
        let layout = ShellLayout::new(3.0, Point2D::new(1.0, -1.0));
        let positions = layout.positions(&graph_with(1));
        assert_eq!(positions[&0], Point2D::new(1.0, -1.0));
    }

    #[test]
    fn test_shell_layout_places_nodes_on_circle() {
        let positions = ShellLayout::default().positions(&graph_with(4));
        assert_eq!(positions.len(), 4);

        for p in positions.values() {
            let radius = (p.x * p.x + p.y * p.y).sqrt();
            assert!((radius - 1.0).abs() < 1e-12);
        }

        // first node starts at angle pi
        assert!((positions[&0].x + 1.0).abs() < 1e-12);
        assert!(positions[&0].y.abs() < 1e-12);
        // quarter turn per node with four nodes
        assert!(positions[&1].x.abs() < 1e-12);
        assert!((positions[&1].y + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_shell_layout_is_deterministic() {
        let graph = graph_with(6);
        let a = ShellLayout::default().positions(&graph);
        let b = ShellLayout::default().positions(&graph);
        assert_eq!(a, b);
    }

    #[test]
    fn test_closure_as_layout() {
        fn origin_layout(graph: &dyn GraphView) -> Positions {
            graph.nodes().into_iter().map(|n| (n, Point2D::origin())).collect()
        }

        let positions = origin_layout.positions(&graph_with(2));
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[&1], Point2D::origin());
    }

    #[test]
    fn test_layout_kind_builds() {
        let graph = graph_with(3);
        assert_eq!(LayoutKind::Shell.build().positions(&graph).len(), 3);
        assert_eq!(LayoutKind::Force.build().positions(&graph).len(), 3);
    }
}
