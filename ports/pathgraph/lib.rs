/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Weighted-graph workbench with an A* path finder.
//!
//! The graph store, layout, persistence and rendering layers surround the
//! search engine in [`pathfinding`]; [`shell`] ties them into an
//! interactive session.

pub mod config;
pub mod graph;
pub mod layout;
pub mod pathfinding;
pub mod persistence;
pub mod render;
mod search;
pub mod shell;
mod util;

pub use graph::{Graph, GraphView, NodeId};
pub use pathfinding::{Path, PathFinder, SearchError};
