/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Remaining-cost estimates for A*.

use serde::{Deserialize, Serialize};

use super::SearchError;
use crate::graph::NodeId;
use crate::layout::Positions;

/// Straight-line distance between two laid-out nodes.
///
/// Fails with [`SearchError::MissingPosition`] if either node has no position.
pub fn heuristic(a: NodeId, b: NodeId, positions: &Positions) -> Result<f64, SearchError> {
    let pa = positions.get(&a).ok_or(SearchError::MissingPosition(a))?;
    let pb = positions.get(&b).ok_or(SearchError::MissingPosition(b))?;
    let (dx, dy) = (pa.x - pb.x, pa.y - pb.y);
    Ok((dx * dx + dy * dy).sqrt())
}

/// Which estimate guides the search.
///
/// Layout distances are unrelated to edge weights, so `Euclidean` can
/// overestimate and return a suboptimal path. `Zero` turns the search into
/// Dijkstra and is always optimal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeuristicKind {
    #[default]
    Euclidean,
    Zero,
}

impl HeuristicKind {
    /// Whether this estimate needs node positions
    pub fn needs_positions(self) -> bool {
        matches!(self, HeuristicKind::Euclidean)
    }

    pub fn estimate(
        self,
        node: NodeId,
        goal: NodeId,
        positions: &Positions,
    ) -> Result<f64, SearchError> {
        match self {
            HeuristicKind::Euclidean => heuristic(node, goal, positions),
            HeuristicKind::Zero => Ok(0.0),
        }
    }
}
