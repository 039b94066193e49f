//! In-memory view of a persisted application graph.
//!
//! `PropertyGraph` wraps petgraph and indexes nodes by store id. It is
//! loaded from a [`GraphStore`](crate::GraphStore) and is read-only.

use crate::edge::{EdgeKind, StoredEdge};
use crate::node::{NodeId, NodeLabel, StoredNode};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A snapshot of stored nodes and relationships.
#[derive(Debug, Default)]
pub struct PropertyGraph {
    graph: DiGraph<StoredNode, EdgeKind>,

    /// Maps store ids to graph node indexes.
    id_index: HashMap<NodeId, NodeIndex>,
}

impl PropertyGraph {
    /// Builds the view from raw records. With `app_key` set, only nodes of
    /// that application and relationships between them are kept.
    pub fn from_records(
        nodes: Vec<StoredNode>,
        edges: Vec<StoredEdge>,
        app_key: Option<&str>,
    ) -> Self {
        let mut view = Self::default();

        for node in nodes {
            if app_key.is_some() && node.app_key() != app_key {
                continue;
            }
            let id = node.id;
            let index = view.graph.add_node(node);
            view.id_index.insert(id, index);
        }

        for edge in edges {
            let endpoints = (view.id_index.get(&edge.from), view.id_index.get(&edge.to));
            let (Some(&from), Some(&to)) = endpoints else {
                continue;
            };
            view.graph.add_edge(from, to, edge.kind);
        }

        view
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node(&self, id: NodeId) -> Option<&StoredNode> {
        let index = self.id_index.get(&id)?;
        self.graph.node_weight(*index)
    }

    /// Iterates over all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &StoredNode> {
        self.graph.node_weights()
    }

    pub fn nodes_with_label(&self, label: NodeLabel) -> Vec<&StoredNode> {
        self.nodes().filter(|n| n.label == label).collect()
    }

    /// Finds the first node with the given label and `name` property.
    pub fn find(&self, label: NodeLabel, name: &str) -> Option<&StoredNode> {
        self.nodes()
            .find(|n| n.label == label && n.name() == Some(name))
    }

    /// All relationships of one kind as (source, target) pairs.
    pub fn edges_of_kind(&self, kind: EdgeKind) -> Vec<(&StoredNode, &StoredNode)> {
        self.graph
            .edge_references()
            .filter(|e| *e.weight() == kind)
            .map(|e| (&self.graph[e.source()], &self.graph[e.target()]))
            .collect()
    }

    /// Number of `kind` relationships from `from` to `to`.
    pub fn count_edges(&self, from: NodeId, to: NodeId, kind: EdgeKind) -> usize {
        let (Some(&from), Some(&to)) = (self.id_index.get(&from), self.id_index.get(&to)) else {
            return 0;
        };
        self.graph
            .edges_connecting(from, to)
            .filter(|e| *e.weight() == kind)
            .count()
    }

    /// Targets of `kind` relationships leaving `id`.
    pub fn outgoing(&self, id: NodeId, kind: EdgeKind) -> Vec<&StoredNode> {
        let Some(&index) = self.id_index.get(&id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(index, Direction::Outgoing)
            .filter(|e| *e.weight() == kind)
            .map(|e| &self.graph[e.target()])
            .collect()
    }

    /// Sources of `kind` relationships entering `id`.
    pub fn incoming(&self, id: NodeId, kind: EdgeKind) -> Vec<&StoredNode> {
        let Some(&index) = self.id_index.get(&id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(index, Direction::Incoming)
            .filter(|e| *e.weight() == kind)
            .map(|e| &self.graph[e.source()])
            .collect()
    }
}

/// Graph statistics for the status command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes_by_label: BTreeMap<NodeLabel, usize>,
    pub edges_by_kind: BTreeMap<EdgeKind, usize>,
}

impl PropertyGraph {
    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            ..GraphStats::default()
        };
        for node in self.nodes() {
            *stats.nodes_by_label.entry(node.label).or_default() += 1;
        }
        for kind in self.graph.edge_weights() {
            *stats.edges_by_kind.entry(*kind).or_default() += 1;
        }
        stats
    }
}
