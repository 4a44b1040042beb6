/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Graph persistence using fjall (append-only log) + redb (snapshots) + rkyv (serialization).
//!
//! Architecture:
//! - Named graphs are saved as rkyv snapshots in a redb table
//! - Every mutation of the working graph is journaled to fjall as a LogEntry
//! - Periodic session snapshots write the working graph to redb and clear the log
//! - On startup: load the session snapshot, replay log entries after it

pub mod types;

use crate::config;
use crate::graph::Graph;
use crate::util::is_valid_name;
use log::{debug, warn};
use redb::{ReadableDatabase, ReadableTable};
use std::fmt::Display;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;
use types::{GraphSnapshot, LogEntry};

/// Name-keyed table of rkyv-encoded snapshots
type BlobTable = redb::TableDefinition<'static, &'static str, &'static [u8]>;

const GRAPHS_TABLE: BlobTable = redb::TableDefinition::new("graphs");
const SESSION_TABLE: BlobTable = redb::TableDefinition::new("session");
const SESSION_KEY: &str = "latest";
pub const DEFAULT_SNAPSHOT_INTERVAL_SECS: u64 = 300;

/// Errors from the graph store
#[derive(Debug, Error)]
pub enum GraphStoreError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Fjall error: {0}")]
    Fjall(String),

    #[error("Redb error: {0}")]
    Redb(String),

    #[error("Encoding error: {0}")]
    Encode(String),

    #[error("invalid graph name {0:?}")]
    InvalidName(String),
}

fn redb_err(e: impl Display) -> GraphStoreError {
    GraphStoreError::Redb(format!("{e}"))
}

fn fjall_err(e: impl Display) -> GraphStoreError {
    GraphStoreError::Fjall(format!("{e}"))
}

fn encode_err(e: impl Display) -> GraphStoreError {
    GraphStoreError::Encode(format!("{e}"))
}

/// Persistent graph store backed by fjall (log) + redb (snapshots)
pub struct GraphStore {
    /// Kept alive so the Keyspace borrow remains valid (fjall requires it).
    _db: fjall::Database,
    log_keyspace: fjall::Keyspace,
    snapshot_db: redb::Database,
    log_sequence: u64,
    last_snapshot: Instant,
    snapshot_interval: Duration,
}

impl GraphStore {
    /// Open or create a graph store at the given directory
    pub fn open(base_dir: PathBuf) -> Result<Self, GraphStoreError> {
        std::fs::create_dir_all(&base_dir)
            .map_err(|e| GraphStoreError::Io(format!("Failed to create dir: {e}")))?;

        let log_path = base_dir.join("log");
        let snapshot_path = base_dir.join("graphs.redb");

        let db = fjall::Database::builder(&log_path).open().map_err(fjall_err)?;

        let log_keyspace = db
            .keyspace("mutations", || fjall::KeyspaceCreateOptions::default())
            .map_err(fjall_err)?;

        let snapshot_db = redb::Database::create(&snapshot_path).map_err(redb_err)?;

        let log_sequence = Self::find_max_sequence(&log_keyspace) + 1;
        debug!("Opened graph store at {}", base_dir.display());

        Ok(Self {
            _db: db,
            log_keyspace,
            snapshot_db,
            log_sequence,
            last_snapshot: Instant::now(),
            snapshot_interval: Duration::from_secs(DEFAULT_SNAPSHOT_INTERVAL_SECS),
        })
    }

    /// Save `graph` under `name`, replacing any graph with that name
    pub fn save_graph(&mut self, name: &str, graph: &Graph) -> Result<(), GraphStoreError> {
        let name = checked_name(name)?;
        let bytes = encode_snapshot(&graph.to_snapshot())?;
        self.write_entry(GRAPHS_TABLE, name, &bytes)?;
        debug!("Saved graph {name:?} ({} nodes)", graph.node_count());
        Ok(())
    }

    /// Load the graph saved under `name`, `None` if there is none
    pub fn load_graph(&self, name: &str) -> Result<Option<Graph>, GraphStoreError> {
        let name = checked_name(name)?;
        let Some(bytes) = self.read_entry(GRAPHS_TABLE, name)? else {
            return Ok(None);
        };
        let snapshot = decode_snapshot(&bytes)?;
        Ok(Some(Graph::from_snapshot(&snapshot)))
    }

    /// Delete the graph saved under `name`. Returns false if there was none.
    pub fn delete_graph(&mut self, name: &str) -> Result<bool, GraphStoreError> {
        let name = checked_name(name)?;
        let write_txn = self.snapshot_db.begin_write().map_err(redb_err)?;
        let removed = {
            let mut table = write_txn.open_table(GRAPHS_TABLE).map_err(redb_err)?;
            table.remove(name).map_err(redb_err)?.is_some()
        };
        write_txn.commit().map_err(redb_err)?;
        Ok(removed)
    }

    /// Names of all saved graphs, sorted
    pub fn list_graphs(&self) -> Result<Vec<String>, GraphStoreError> {
        let read_txn = self.snapshot_db.begin_read().map_err(redb_err)?;
        let table = match read_txn.open_table(GRAPHS_TABLE) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(redb_err(e)),
        };

        let mut names = Vec::new();
        for entry in table.iter().map_err(redb_err)? {
            let (key, _) = entry.map_err(redb_err)?;
            names.push(key.value().to_string());
        }
        Ok(names)
    }

    /// Append a mutation of the working graph to the log
    pub fn log_mutation(&mut self, entry: &LogEntry) {
        let bytes = match rkyv::to_bytes::<rkyv::rancor::Error>(entry) {
            Ok(b) => b,
            Err(e) => {
                warn!("Failed to serialize log entry: {e}");
                return;
            },
        };

        let key = self.log_sequence.to_be_bytes();
        if let Err(e) = self.log_keyspace.insert(key, bytes.as_ref()) {
            warn!("Failed to write log entry: {e}");
        }
        self.log_sequence += 1;
    }

    /// Take a full snapshot of the working graph and compact the log
    pub fn take_snapshot(&mut self, graph: &Graph) {
        let write_result = encode_snapshot(&graph.to_snapshot())
            .and_then(|bytes| self.write_entry(SESSION_TABLE, SESSION_KEY, &bytes));

        if let Err(e) = write_result {
            warn!("Failed to write snapshot: {e}");
            return;
        }

        // Clear the log since we have a fresh snapshot
        self.clear_log();
        self.last_snapshot = Instant::now();
    }

    /// Recover the working graph from snapshot + log replay
    pub fn recover(&self) -> Option<Graph> {
        let mut graph = match self.load_session_snapshot() {
            Some(snapshot) => Graph::from_snapshot(&snapshot),
            None => Graph::new(),
        };

        self.replay_log(&mut graph);

        if graph.node_count() > 0 {
            Some(graph)
        } else {
            None
        }
    }

    /// Check if it's time for a periodic snapshot
    pub fn check_periodic_snapshot(&mut self, graph: &Graph) {
        if self.last_snapshot.elapsed() >= self.snapshot_interval {
            self.take_snapshot(graph);
        }
    }

    /// Configure periodic snapshot interval (seconds).
    pub fn set_snapshot_interval_secs(&mut self, secs: u64) -> Result<(), GraphStoreError> {
        if secs == 0 {
            return Err(GraphStoreError::Io(
                "Snapshot interval must be greater than zero seconds".to_string(),
            ));
        }
        self.snapshot_interval = Duration::from_secs(secs);
        Ok(())
    }

    /// Current periodic snapshot interval in seconds.
    pub fn snapshot_interval_secs(&self) -> u64 {
        self.snapshot_interval.as_secs()
    }

    /// Forget the working session (snapshot + mutation log). Saved graphs are kept.
    pub fn clear_session(&mut self) -> Result<(), GraphStoreError> {
        let write_txn = self.snapshot_db.begin_write().map_err(redb_err)?;
        {
            let mut table = write_txn.open_table(SESSION_TABLE).map_err(redb_err)?;
            table.remove(SESSION_KEY).map_err(redb_err)?;
        }
        write_txn.commit().map_err(redb_err)?;

        self.clear_log();
        self.last_snapshot = Instant::now();
        Ok(())
    }

    fn write_entry(
        &self,
        definition: BlobTable,
        key: &str,
        bytes: &[u8],
    ) -> Result<(), GraphStoreError> {
        let write_txn = self.snapshot_db.begin_write().map_err(redb_err)?;
        {
            let mut table = write_txn.open_table(definition).map_err(redb_err)?;
            table.insert(key, bytes).map_err(redb_err)?;
        }
        write_txn.commit().map_err(redb_err)?;
        Ok(())
    }

    fn read_entry(
        &self,
        definition: BlobTable,
        key: &str,
    ) -> Result<Option<Vec<u8>>, GraphStoreError> {
        let read_txn = self.snapshot_db.begin_read().map_err(redb_err)?;
        let table = match read_txn.open_table(definition) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(redb_err(e)),
        };
        let entry = table.get(key).map_err(redb_err)?;
        Ok(entry.map(|guard| guard.value().to_vec()))
    }

    fn load_session_snapshot(&self) -> Option<GraphSnapshot> {
        let bytes = match self.read_entry(SESSION_TABLE, SESSION_KEY) {
            Ok(bytes) => bytes?,
            Err(e) => {
                warn!("Failed to read session snapshot: {e}");
                return None;
            },
        };
        match decode_snapshot(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Ignoring corrupt session snapshot: {e}");
                None
            },
        }
    }

    fn replay_log(&self, graph: &mut Graph) {
        for guard in self.log_keyspace.iter() {
            let (_, value) = match guard.into_inner() {
                Ok(kv) => kv,
                Err(_) => continue,
            };

            // Copy to aligned buffer; stored bytes may not satisfy rkyv alignment
            let mut aligned = rkyv::util::AlignedVec::<16>::new();
            aligned.extend_from_slice(value.as_ref());

            match rkyv::from_bytes::<LogEntry, rkyv::rancor::Error>(&aligned) {
                Ok(entry) => apply_log_entry(graph, entry),
                Err(e) => warn!("Skipping corrupt log entry: {e}"),
            }
        }
    }

    fn clear_log(&mut self) {
        let keys: Vec<Vec<u8>> = self
            .log_keyspace
            .iter()
            .filter_map(|guard| guard.key().ok().map(|k| k.to_vec()))
            .collect();
        for key in keys {
            let _ = self.log_keyspace.remove(key);
        }
        self.log_sequence = 0;
    }

    fn find_max_sequence(keyspace: &fjall::Keyspace) -> u64 {
        let mut max = 0u64;
        for guard in keyspace.iter() {
            if let Ok(key_bytes) = guard.key()
                && let Ok(bytes) = <[u8; 8]>::try_from(key_bytes.as_ref())
            {
                max = max.max(u64::from_be_bytes(bytes));
            }
        }
        max
    }

    /// Get the default storage directory for graph data
    pub fn default_data_dir() -> PathBuf {
        config::config_dir().join("graphs")
    }
}

/// Apply one journaled mutation to `graph`
pub fn apply_log_entry(graph: &mut Graph, entry: LogEntry) {
    match entry {
        LogEntry::AddNode { id } => {
            graph.add_node_with_id(id);
        },
        LogEntry::RemoveNode { id } => {
            graph.remove_node(id);
        },
        LogEntry::AddEdge { a, b, weight } => {
            if let Err(e) = graph.add_edge(a, b, weight) {
                warn!("Skipping journaled edge {a}-{b}: {e}");
            }
        },
        LogEntry::RemoveEdge { a, b } => {
            if let Err(e) = graph.remove_edge(a, b) {
                warn!("Skipping journaled edge removal {a}-{b}: {e}");
            }
        },
        LogEntry::ClearGraph => graph.clear(),
        LogEntry::ReplaceGraph { snapshot } => {
            *graph = Graph::from_snapshot(&snapshot);
        },
    }
}

fn checked_name(name: &str) -> Result<&str, GraphStoreError> {
    let trimmed = name.trim();
    if is_valid_name(trimmed) {
        Ok(trimmed)
    } else {
        Err(GraphStoreError::InvalidName(name.to_string()))
    }
}

fn encode_snapshot(snapshot: &GraphSnapshot) -> Result<Vec<u8>, GraphStoreError> {
    rkyv::to_bytes::<rkyv::rancor::Error>(snapshot)
        .map(|bytes| bytes.to_vec())
        .map_err(encode_err)
}

fn decode_snapshot(bytes: &[u8]) -> Result<GraphSnapshot, GraphStoreError> {
    // Copy to aligned buffer; redb bytes may not satisfy rkyv alignment
    let mut aligned = rkyv::util::AlignedVec::<16>::new();
    aligned.extend_from_slice(bytes);
    rkyv::from_bytes::<GraphSnapshot, rkyv::rancor::Error>(&aligned).map_err(encode_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use types::GraphSnapshot;

    fn create_test_store() -> (GraphStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = GraphStore::open(dir.path().to_path_buf()).unwrap();
        (store, dir)
    }

    fn diamond() -> Graph {
        let mut graph = Graph::new();
        for _ in 0..4 {
            graph.add_node();
        }
        graph.add_edge(0, 1, 1).unwrap();
        graph.add_edge(1, 2, 1).unwrap();
        graph.add_edge(0, 2, 5).unwrap();
        graph.add_edge(2, 3, 1).unwrap();
        graph
    }

    #[test]
    fn test_empty_startup() {
        let (store, _dir) = create_test_store();
        assert!(store.recover().is_none());
        assert!(store.list_graphs().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_named_graph() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        {
            let mut store = GraphStore::open(path.clone()).unwrap();
            store.save_graph("diamond", &diamond()).unwrap();
        }

        {
            let store = GraphStore::open(path).unwrap();
            let graph = store.load_graph("diamond").unwrap().unwrap();
            assert_eq!(graph.node_count(), 4);
            assert_eq!(graph.edges(), diamond().edges());
        }
    }

    #[test]
    fn test_load_missing_graph() {
        let (store, _dir) = create_test_store();
        assert!(store.load_graph("nope").unwrap().is_none());
    }

    #[test]
    fn test_save_overwrites() {
        let (mut store, _dir) = create_test_store();
        store.save_graph("g", &diamond()).unwrap();
        store.save_graph("g", &Graph::new()).unwrap();

        let graph = store.load_graph("g").unwrap().unwrap();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(store.list_graphs().unwrap(), vec!["g".to_string()]);
    }

    #[test]
    fn test_list_and_delete_graphs() {
        let (mut store, _dir) = create_test_store();
        store.save_graph("zeta", &diamond()).unwrap();
        store.save_graph("alpha", &diamond()).unwrap();

        assert_eq!(
            store.list_graphs().unwrap(),
            vec!["alpha".to_string(), "zeta".to_string()]
        );

        assert!(store.delete_graph("zeta").unwrap());
        assert!(!store.delete_graph("zeta").unwrap());
        assert_eq!(store.list_graphs().unwrap(), vec!["alpha".to_string()]);
    }

    #[test]
    fn test_invalid_names_rejected() {
        let (mut store, _dir) = create_test_store();
        for name in ["", "   ", "../up", "a/b", "tab\there"] {
            assert!(matches!(
                store.save_graph(name, &diamond()),
                Err(GraphStoreError::InvalidName(_))
            ));
        }
        assert!(matches!(
            store.load_graph(".."),
            Err(GraphStoreError::InvalidName(_))
        ));
    }

    #[test]
    fn test_corrupt_named_graph_is_an_error() {
        let (store, _dir) = create_test_store();
        store
            .write_entry(GRAPHS_TABLE, "broken", b"corrupt-snapshot")
            .unwrap();
        assert!(matches!(
            store.load_graph("broken"),
            Err(GraphStoreError::Encode(_))
        ));
    }

    #[test]
    fn test_log_and_recover() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        {
            let mut store = GraphStore::open(path.clone()).unwrap();
            store.log_mutation(&LogEntry::AddNode { id: 0 });
            store.log_mutation(&LogEntry::AddNode { id: 1 });
            store.log_mutation(&LogEntry::AddEdge { a: 0, b: 1, weight: 4 });
        }

        {
            let store = GraphStore::open(path).unwrap();
            let graph = store.recover().unwrap();
            assert_eq!(graph.node_count(), 2);
            assert_eq!(graph.edge_weight(1, 0), Some(4));
        }
    }

    #[test]
    fn test_snapshot_and_recover() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        {
            let mut store = GraphStore::open(path.clone()).unwrap();
            store.take_snapshot(&diamond());
        }

        {
            let store = GraphStore::open(path).unwrap();
            let graph = store.recover().unwrap();
            assert_eq!(graph.node_count(), 4);
            assert_eq!(graph.edge_count(), 4);
        }
    }

    #[test]
    fn test_snapshot_plus_log_recovery() {
        let (mut store, _dir) = create_test_store();
        store.take_snapshot(&diamond());
        store.log_mutation(&LogEntry::AddNode { id: 4 });
        store.log_mutation(&LogEntry::AddEdge { a: 3, b: 4, weight: 2 });
        store.log_mutation(&LogEntry::RemoveEdge { a: 0, b: 2 });

        let graph = store.recover().unwrap();
        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_weight(3, 4), Some(2));
        assert!(!graph.has_edge(0, 2));
    }

    #[test]
    fn test_log_remove_node_recover() {
        let (mut store, _dir) = create_test_store();
        store.log_mutation(&LogEntry::AddNode { id: 0 });
        store.log_mutation(&LogEntry::AddNode { id: 1 });
        store.log_mutation(&LogEntry::AddEdge { a: 0, b: 1, weight: 1 });
        store.log_mutation(&LogEntry::RemoveNode { id: 0 });

        let graph = store.recover().unwrap();
        assert_eq!(graph.node_ids().collect::<Vec<_>>(), vec![1]);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_log_clear_graph_recover() {
        let (mut store, _dir) = create_test_store();
        store.log_mutation(&LogEntry::AddNode { id: 0 });
        store.log_mutation(&LogEntry::ClearGraph);

        assert!(store.recover().is_none());
    }

    #[test]
    fn test_log_replace_graph_recover() {
        let (mut store, _dir) = create_test_store();
        store.log_mutation(&LogEntry::AddNode { id: 9 });
        store.log_mutation(&LogEntry::ReplaceGraph {
            snapshot: diamond().to_snapshot(),
        });
        store.log_mutation(&LogEntry::RemoveEdge { a: 2, b: 3 });

        let graph = store.recover().unwrap();
        assert!(!graph.contains_node(9));
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_replay_skips_invalid_mutations() {
        let (mut store, _dir) = create_test_store();
        store.log_mutation(&LogEntry::AddNode { id: 0 });
        store.log_mutation(&LogEntry::AddEdge { a: 0, b: 7, weight: 1 });
        store.log_mutation(&LogEntry::RemoveEdge { a: 0, b: 7 });
        store.log_mutation(&LogEntry::RemoveNode { id: 7 });

        let graph = store.recover().unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_recover_ignores_corrupt_log_entries() {
        let (mut store, _dir) = create_test_store();
        store.log_mutation(&LogEntry::AddNode { id: 3 });
        // Append an invalid rkyv payload directly to the log.
        let corrupt_key = 99u64.to_be_bytes();
        store.log_keyspace.insert(corrupt_key, b"not-rkyv").unwrap();

        let graph = store.recover().unwrap();
        assert_eq!(graph.node_ids().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_recover_with_corrupt_snapshot_replays_log_only() {
        let (mut store, _dir) = create_test_store();
        store
            .write_entry(SESSION_TABLE, SESSION_KEY, b"corrupt-snapshot")
            .unwrap();
        store.log_mutation(&LogEntry::AddNode { id: 5 });

        let graph = store.recover().unwrap();
        assert_eq!(graph.node_ids().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_clear_session_keeps_named_graphs() {
        let (mut store, _dir) = create_test_store();
        store.save_graph("kept", &diamond()).unwrap();
        store.take_snapshot(&diamond());
        store.log_mutation(&LogEntry::AddNode { id: 10 });

        store.clear_session().unwrap();

        assert!(store.recover().is_none());
        assert!(store.load_graph("kept").unwrap().is_some());
    }

    #[test]
    fn test_sequence_continues_after_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        {
            let mut store = GraphStore::open(path.clone()).unwrap();
            store.log_mutation(&LogEntry::AddNode { id: 0 });
            store.log_mutation(&LogEntry::AddNode { id: 1 });
        }

        {
            let mut store = GraphStore::open(path.clone()).unwrap();
            store.log_mutation(&LogEntry::RemoveNode { id: 0 });
        }

        let store = GraphStore::open(path).unwrap();
        let graph = store.recover().unwrap();
        assert_eq!(graph.node_ids().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_set_snapshot_interval_secs() {
        let (mut store, _dir) = create_test_store();
        store.set_snapshot_interval_secs(42).unwrap();
        assert_eq!(store.snapshot_interval_secs(), 42);
    }

    #[test]
    fn test_set_snapshot_interval_secs_rejects_zero() {
        let (mut store, _dir) = create_test_store();
        assert!(store.set_snapshot_interval_secs(0).is_err());
        assert_eq!(
            store.snapshot_interval_secs(),
            DEFAULT_SNAPSHOT_INTERVAL_SECS
        );
    }

    #[test]
    fn test_snapshot_roundtrip_encoding() {
        let snapshot: GraphSnapshot = diamond().to_snapshot();
        let bytes = encode_snapshot(&snapshot).unwrap();
        assert_eq!(decode_snapshot(&bytes).unwrap(), snapshot);
    }
}
