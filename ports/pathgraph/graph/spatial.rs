/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Spatial hash grid for O(n) average-case neighbor queries.
//!
//! Used by the force layout to find nearby nodes without checking all pairs.

use crate::graph::NodeId;
use euclid::default::Point2D;
use std::collections::HashMap;

/// Spatial hash grid for efficient neighbor queries
pub struct SpatialGrid {
    cell_size: f64,

    /// Grid cells: (x, y) -> nodes in that cell
    cells: HashMap<(i64, i64), Vec<NodeId>>,
}

impl SpatialGrid {
    /// Create a new spatial grid with the given cell size
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(f64::EPSILON),
            cells: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Insert a node at a position
    pub fn insert(&mut self, node: NodeId, position: Point2D<f64>) {
        let cell = self.position_to_cell(position);
        self.cells.entry(cell).or_default().push(node);
    }

    /// Get all nodes in the same cell and the 8 adjacent cells
    pub fn query_nearby(&self, position: Point2D<f64>) -> Vec<NodeId> {
        let (cx, cy) = self.position_to_cell(position);
        let mut nearby = Vec::new();

        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(nodes) = self.cells.get(&(cx + dx, cy + dy)) {
                    nearby.extend_from_slice(nodes);
                }
            }
        }

        nearby
    }

    fn position_to_cell(&self, position: Point2D<f64>) -> (i64, i64) {
        let x = (position.x / self.cell_size).floor() as i64;
        let y = (position.y / self.cell_size).floor() as i64;
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_grid_insertion() {
        let mut grid = SpatialGrid::new(100.0);
        grid.insert(3, Point2D::new(50.0, 50.0));

        let nearby = grid.query_nearby(Point2D::new(160.0, 60.0));
        assert!(nearby.contains(&3));
    }

    #[test]
    fn test_spatial_grid_far_nodes_excluded() {
        let mut grid = SpatialGrid::new(10.0);
        grid.insert(1, Point2D::new(0.0, 0.0));
        grid.insert(2, Point2D::new(100.0, 100.0));

        let nearby = grid.query_nearby(Point2D::new(1.0, 1.0));
        assert_eq!(nearby, vec![1]);
    }

    #[test]
    fn test_spatial_grid_negative_coordinates() {
        let mut grid = SpatialGrid::new(1.0);
        grid.insert(5, Point2D::new(-0.5, -0.5));

        assert!(grid.query_nearby(Point2D::new(0.2, 0.2)).contains(&5));
    }

    #[test]
    fn test_spatial_grid_clear() {
        let mut grid = SpatialGrid::new(100.0);
        grid.insert(0, Point2D::new(0.0, 0.0));
        grid.clear();

        assert!(grid.query_nearby(Point2D::new(0.0, 0.0)).is_empty());
    }
}
