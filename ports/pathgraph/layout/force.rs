/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Force-directed layout.
//!
//! Uses:
//! - Spatial hash grid for O(n) average-case repulsion
//! - Hooke's law springs on edges
//! - Velocity damping
//! - Early stop on convergence
//!
//! Seeded from the shell layout, so the result is deterministic.

use std::collections::HashMap;
use std::f64::consts::TAU;

use euclid::default::{Point2D, Vector2D};
use log::trace;

use super::{Layout, Positions, ShellLayout};
use crate::graph::spatial::SpatialGrid;
use crate::graph::{GraphView, NodeId};

/// Force simulation parameters
#[derive(Debug, Clone)]
pub struct ForceConfig {
    /// Repulsion strength between nodes
    pub repulsion_strength: f64,

    /// Spring strength for edges (Hooke's law)
    pub spring_strength: f64,

    /// Velocity damping factor (0.0 - 1.0)
    pub damping: f64,

    /// Ideal spring length for edges
    pub spring_rest_length: f64,

    /// Repulsion is ignored beyond this distance (also the grid cell size)
    pub repulsion_cutoff: f64,

    /// Integration timestep
    pub dt: f64,

    /// Upper bound on simulation steps
    pub iterations: usize,

    /// Stop once every node moves slower than this
    pub velocity_threshold: f64,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            repulsion_strength: 5000.0,
            spring_strength: 0.1,
            damping: 0.92,
            spring_rest_length: 100.0,
            repulsion_cutoff: 300.0,
            dt: 0.1,
            iterations: 300,
            velocity_threshold: 0.01,
        }
    }
}

/// Force-directed layout rescaled so the farthest node is `scale` from the centroid
#[derive(Debug, Clone)]
pub struct ForceLayout {
    pub config: ForceConfig,
    pub scale: f64,
    pub center: Point2D<f64>,
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self {
            config: ForceConfig::default(),
            scale: 1.0,
            center: Point2D::origin(),
        }
    }
}

impl ForceLayout {
    pub fn new(config: ForceConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    fn simulate(&self, nodes: &[NodeId], edges: &[(usize, usize)], positions: &mut [Point2D<f64>]) {
        let config = &self.config;
        let slot: HashMap<NodeId, usize> = nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();
        let mut velocities = vec![Vector2D::<f64>::zero(); nodes.len()];
        let mut grid = SpatialGrid::new(config.repulsion_cutoff);

        for step in 0..config.iterations {
            grid.clear();
            for (i, &node) in nodes.iter().enumerate() {
                grid.insert(node, positions[i]);
            }

            let mut forces = vec![Vector2D::<f64>::zero(); nodes.len()];

            for (i, &node) in nodes.iter().enumerate() {
                for other in grid.query_nearby(positions[i]) {
                    if other == node {
                        continue;
                    }
                    let Some(&j) = slot.get(&other) else {
                        continue;
                    };
                    let delta = positions[i] - positions[j];
                    let distance = delta.length();
                    if distance > f64::EPSILON && distance < config.repulsion_cutoff {
                        let repulsion = config.repulsion_strength / (distance * distance);
                        forces[i] += delta / distance * repulsion;
                    }
                }
            }

            for &(a, b) in edges {
                let delta = positions[b] - positions[a];
                let distance = delta.length();
                if distance <= f64::EPSILON {
                    continue;
                }
                let displacement = distance - config.spring_rest_length;
                let pull = delta / distance * (config.spring_strength * displacement);
                forces[a] += pull;
                forces[b] -= pull;
            }

            let mut max_velocity = 0.0_f64;
            for i in 0..nodes.len() {
                velocities[i] = (velocities[i] + forces[i] * config.dt) * config.damping;
                positions[i] += velocities[i] * config.dt;
                max_velocity = max_velocity.max(velocities[i].length());
            }

            if max_velocity < config.velocity_threshold {
                trace!("Force layout converged after {step} steps");
                break;
            }
        }
    }

    fn rescale(&self, positions: &mut [Point2D<f64>]) {
        let count = positions.len() as f64;
        let sum = positions
            .iter()
            .fold(Vector2D::<f64>::zero(), |acc, p| acc + p.to_vector());
        let centroid = (sum / count).to_point();

        let extent = positions
            .iter()
            .map(|p| (*p - centroid).length())
            .fold(0.0_f64, f64::max);

        for p in positions.iter_mut() {
            let offset = *p - centroid;
            let offset = if extent > f64::EPSILON {
                offset * (self.scale / extent)
            } else {
                Vector2D::zero()
            };
            *p = self.center + offset;
        }
    }
}

impl Layout for ForceLayout {
    fn positions(&self, graph: &dyn GraphView) -> Positions {
        let nodes = graph.nodes();
        if nodes.len() <= 1 {
            return ShellLayout::new(self.scale, self.center).positions(graph);
        }

        let slot: HashMap<NodeId, usize> = nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();
        let mut edges = Vec::new();
        for (i, &node) in nodes.iter().enumerate() {
            for neighbor in graph.neighbors(node) {
                if let Some(&j) = slot.get(&neighbor)
                    && i < j
                {
                    edges.push((i, j));
                }
            }
        }

        let radius = (self.config.spring_rest_length * nodes.len() as f64 / TAU)
            .max(self.config.spring_rest_length);
        let seed = ShellLayout::new(radius, Point2D::origin()).positions(graph);
        let mut positions: Vec<Point2D<f64>> = nodes
            .iter()
            .map(|n| seed.get(n).copied().unwrap_or_else(Point2D::origin))
            .collect();

        self.simulate(&nodes, &edges, &mut positions);
        self.rescale(&mut positions);

        nodes.into_iter().zip(positions).collect()
    }
}
