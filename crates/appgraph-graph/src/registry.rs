//! Identity registry: which node was created for which entity.
//!
//! One registry lives exactly as long as one application's insertion.
//! Identity never crosses kinds, so classes, methods and variables each get
//! their own map.

use crate::error::IntegrityError;
use crate::node::NodeId;
use appgraph_model::{ClassId, MethodId, VariableId};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Kind of entity tracked by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Class,
    Method,
    Variable,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Class => "class",
            Self::Method => "method",
            Self::Variable => "variable",
        };
        write!(f, "{}", s)
    }
}

/// An entity id that can key the registry.
pub trait EntityKey: Copy + Eq + Hash {
    const KIND: EntityKind;

    fn raw(self) -> u64;
}

impl EntityKey for ClassId {
    const KIND: EntityKind = EntityKind::Class;

    fn raw(self) -> u64 {
        self.get()
    }
}

impl EntityKey for MethodId {
    const KIND: EntityKind = EntityKind::Method;

    fn raw(self) -> u64 {
        self.get()
    }
}

impl EntityKey for VariableId {
    const KIND: EntityKind = EntityKind::Variable;

    fn raw(self) -> u64 {
        self.get()
    }
}

/// Entity id to node map for one kind.
#[derive(Debug)]
pub struct Registry<K> {
    nodes: HashMap<K, NodeId>,
}

impl<K> Default for Registry<K> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }
}

impl<K: EntityKey> Registry<K> {
    /// Records the node created for `key`. A second registration of the
    /// same key means two nodes for one entity and is refused.
    pub fn register(&mut self, key: K, node: NodeId) -> Result<(), IntegrityError> {
        if self.nodes.contains_key(&key) {
            return Err(IntegrityError::AlreadyRegistered {
                kind: K::KIND,
                id: key.raw(),
            });
        }
        self.nodes.insert(key, node);
        Ok(())
    }

    /// The node for `key`, or `None` when it was never materialized.
    pub fn get(&self, key: K) -> Option<NodeId> {
        self.nodes.get(&key).copied()
    }

    /// The node for `key`. A miss is an integrity error.
    pub fn lookup(&self, key: K) -> Result<NodeId, IntegrityError> {
        self.get(key).ok_or(IntegrityError::Unregistered {
            kind: K::KIND,
            id: key.raw(),
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// The three per-kind registries of one insertion.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    pub classes: Registry<ClassId>,
    pub methods: Registry<MethodId>,
    pub variables: Registry<VariableId>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of registered entities.
    pub fn len(&self) -> usize {
        self.classes.len() + self.methods.len() + self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
