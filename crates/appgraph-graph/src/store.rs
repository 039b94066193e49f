use crate::edge::{EdgeId, EdgeKind, StoredEdge};
use crate::graph::{GraphStats, PropertyGraph};
use crate::node::{NodeId, NodeLabel, Properties, StoredNode};
use sled::{Batch, Db};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sled(#[from] sled::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("Cannot create {kind} edge {from} -> {to}: endpoint does not exist")]
    MissingEndpoint {
        from: NodeId,
        to: NodeId,
        kind: EdgeKind,
    },
}

const NODE_PREFIX: u8 = b'n';
const EDGE_PREFIX: u8 = b'e';

fn record_key(prefix: u8, id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(prefix);
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// Where and how the graph is persisted.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Flush to disk after every committed transaction.
    pub flush_on_commit: bool,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flush_on_commit: true,
        }
    }
}

/// Property graph persisted in sled.
///
/// Nodes live under `n` + big-endian id and relationships under `e` + id,
/// both bincode-encoded. Writes only happen through a [`WriteTxn`].
pub struct GraphStore {
    db: Db,
    flush_on_commit: bool,
}

impl GraphStore {
    /// Opens or creates a graph store at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::open_with(&StoreConfig::new(path.as_ref()))
    }

    pub fn open_with(config: &StoreConfig) -> Result<Self, StoreError> {
        let db = sled::open(&config.path)?;
        Ok(Self {
            db,
            flush_on_commit: config.flush_on_commit,
        })
    }

    /// Opens a store that is deleted when dropped.
    pub fn temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self {
            db,
            flush_on_commit: false,
        })
    }

    /// Starts a unit of work. Nothing is visible until [`WriteTxn::commit`].
    pub fn begin(&self) -> WriteTxn<'_> {
        WriteTxn {
            store: self,
            batch: Batch::default(),
            pending: HashSet::new(),
            nodes_created: 0,
            edges_created: 0,
            committed: false,
        }
    }

    /// Runs `f` in a transaction: commits if it returns `Ok`, discards every
    /// write otherwise.
    pub fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut WriteTxn<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut txn = self.begin();
        let value = f(&mut txn)?;
        txn.commit()?;
        Ok(value)
    }

    pub fn contains_node(&self, id: NodeId) -> Result<bool, StoreError> {
        Ok(self.db.contains_key(record_key(NODE_PREFIX, id.0))?)
    }

    pub fn node(&self, id: NodeId) -> Result<Option<StoredNode>, StoreError> {
        match self.db.get(record_key(NODE_PREFIX, id.0))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All committed nodes, in creation order.
    pub fn nodes(&self) -> Result<Vec<StoredNode>, StoreError> {
        self.scan(NODE_PREFIX)
    }

    /// All committed relationships, in creation order.
    pub fn edges(&self) -> Result<Vec<StoredEdge>, StoreError> {
        self.scan(EDGE_PREFIX)
    }

    fn scan<T: serde::de::DeserializeOwned>(&self, prefix: u8) -> Result<Vec<T>, StoreError> {
        let mut records = Vec::new();
        for entry in self.db.scan_prefix([prefix]) {
            let (_, bytes) = entry?;
            records.push(bincode::deserialize(&bytes)?);
        }
        Ok(records)
    }

    fn count(&self, prefix: u8) -> Result<usize, StoreError> {
        let mut count = 0;
        for key in self.db.scan_prefix([prefix]).keys() {
            key?;
            count += 1;
        }
        Ok(count)
    }

    pub fn node_count(&self) -> Result<usize, StoreError> {
        self.count(NODE_PREFIX)
    }

    pub fn edge_count(&self) -> Result<usize, StoreError> {
        self.count(EDGE_PREFIX)
    }

    /// Loads the stored graph, optionally restricted to one `app_key`.
    pub fn load_graph(&self, app_key: Option<&str>) -> Result<PropertyGraph, StoreError> {
        Ok(PropertyGraph::from_records(
            self.nodes()?,
            self.edges()?,
            app_key,
        ))
    }

    pub fn stats(&self) -> Result<GraphStats, StoreError> {
        Ok(self.load_graph(None)?.stats())
    }

    /// Removes every node and relationship.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.db.clear()?;
        self.db.flush()?;
        Ok(())
    }
}

/// Counts written by a committed transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxnSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// A buffered unit of work against a [`GraphStore`].
///
/// Writes are collected in a `sled::Batch` and applied atomically on
/// commit. Dropping the transaction without committing discards them.
pub struct WriteTxn<'s> {
    store: &'s GraphStore,
    batch: Batch,
    /// Nodes created in this transaction, not yet committed.
    pending: HashSet<NodeId>,
    nodes_created: usize,
    edges_created: usize,
    committed: bool,
}

impl WriteTxn<'_> {
    /// Creates a node carrying `label` and `properties`.
    pub fn create_node(
        &mut self,
        label: NodeLabel,
        properties: Properties,
    ) -> Result<NodeId, StoreError> {
        let id = NodeId(self.store.db.generate_id()?);
        let node = StoredNode {
            id,
            label,
            properties,
        };
        self.batch
            .insert(record_key(NODE_PREFIX, id.0), bincode::serialize(&node)?);
        self.pending.insert(id);
        self.nodes_created += 1;
        Ok(id)
    }

    /// Creates a directed relationship. Both endpoints must already exist,
    /// either committed or created earlier in this transaction.
    pub fn create_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        kind: EdgeKind,
    ) -> Result<EdgeId, StoreError> {
        if !self.node_exists(from)? || !self.node_exists(to)? {
            return Err(StoreError::MissingEndpoint { from, to, kind });
        }

        let id = EdgeId(self.store.db.generate_id()?);
        let edge = StoredEdge { id, from, to, kind };
        self.batch
            .insert(record_key(EDGE_PREFIX, id.0), bincode::serialize(&edge)?);
        self.edges_created += 1;
        Ok(id)
    }

    fn node_exists(&self, id: NodeId) -> Result<bool, StoreError> {
        Ok(self.pending.contains(&id) || self.store.contains_node(id)?)
    }

    pub fn nodes_created(&self) -> usize {
        self.nodes_created
    }

    pub fn edges_created(&self) -> usize {
        self.edges_created
    }

    /// Applies every buffered write atomically.
    pub fn commit(mut self) -> Result<TxnSummary, StoreError> {
        let batch = std::mem::take(&mut self.batch);
        self.store.db.apply_batch(batch)?;
        if self.store.flush_on_commit {
            self.store.db.flush()?;
        }
        self.committed = true;
        Ok(TxnSummary {
            nodes: self.nodes_created,
            edges: self.edges_created,
        })
    }

    /// Discards every buffered write.
    pub fn rollback(self) {}
}

impl Drop for WriteTxn<'_> {
    fn drop(&mut self) {
        if !self.committed && self.nodes_created + self.edges_created > 0 {
            tracing::debug!(
                nodes = self.nodes_created,
                edges = self.edges_created,
                "Rolling back uncommitted graph transaction"
            );
        }
    }
}
