/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Serializable types for graph persistence.
//!
//! Uses rkyv. Node ids are already stable integers, so they are stored as-is.

use rkyv::{Archive, Deserialize, Serialize};

/// Persisted undirected edge
#[derive(Archive, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PersistedEdge {
    pub a: u32,
    pub b: u32,
    pub weight: u32,
}

/// Full graph snapshot
#[derive(Archive, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GraphSnapshot {
    pub nodes: Vec<u32>,
    pub edges: Vec<PersistedEdge>,
    pub timestamp_secs: u64,
}

/// Log entry for mutation journaling
#[derive(Archive, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum LogEntry {
    AddNode { id: u32 },
    RemoveNode { id: u32 },
    AddEdge { a: u32, b: u32, weight: u32 },
    RemoveEdge { a: u32, b: u32 },
    ClearGraph,
    /// The working graph was replaced wholesale (e.g. a saved graph was loaded)
    ReplaceGraph { snapshot: GraphSnapshot },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_snapshot_archive() {
        let snapshot = GraphSnapshot {
            nodes: vec![0, 1, 4],
            edges: vec![PersistedEdge { a: 0, b: 4, weight: 3 }],
            timestamp_secs: 1234567890,
        };

        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&snapshot).unwrap();
        let archived =
            rkyv::access::<ArchivedGraphSnapshot, rkyv::rancor::Error>(&bytes).unwrap();
        assert_eq!(archived.nodes.len(), 3);
        assert_eq!(archived.edges.len(), 1);
        assert_eq!(archived.edges[0].weight, 3);
        assert_eq!(archived.timestamp_secs, 1234567890);
    }

    #[test]
    fn test_log_entry_replace_graph_carries_snapshot() {
        let entry = LogEntry::ReplaceGraph {
            snapshot: GraphSnapshot {
                nodes: vec![2],
                edges: Vec::new(),
                timestamp_secs: 0,
            },
        };

        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&entry).unwrap();
        let restored = rkyv::from_bytes::<LogEntry, rkyv::rancor::Error>(&bytes).unwrap();
        assert_eq!(restored, entry);
    }
}
