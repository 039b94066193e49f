//! Relationship types of the application graph.
//!
//! The vocabulary is fixed: downstream queries match on these names, so
//! the display strings are part of the compatibility surface.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// The type of relationship between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    /// Application declares a class.
    AppOwnsClass,

    /// Class declares a field.
    ClassOwnsVariable,

    /// Class declares a method.
    ClassOwnsMethod,

    /// Method declares a parameter.
    MethodOwnsArgument,

    /// Method reads or writes a field.
    Uses,

    /// Class A extends class B.
    Extends,

    /// Class implements interface.
    Implements,

    /// Method A calls method B.
    Calls,
}

impl EdgeKind {
    /// Every kind, containment kinds first.
    pub const ALL: [EdgeKind; 8] = [
        Self::AppOwnsClass,
        Self::ClassOwnsVariable,
        Self::ClassOwnsMethod,
        Self::MethodOwnsArgument,
        Self::Uses,
        Self::Extends,
        Self::Implements,
        Self::Calls,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AppOwnsClass => "APP_OWNS_CLASS",
            Self::ClassOwnsVariable => "CLASS_OWNS_VARIABLE",
            Self::ClassOwnsMethod => "CLASS_OWNS_METHOD",
            Self::MethodOwnsArgument => "METHOD_OWNS_ARGUMENT",
            Self::Uses => "USES",
            Self::Extends => "EXTENDS",
            Self::Implements => "IMPLEMENTS",
            Self::Calls => "CALLS",
        }
    }

    /// True for the kinds written during the containment pass.
    pub fn is_containment(&self) -> bool {
        !matches!(self, Self::Extends | Self::Implements | Self::Calls)
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unique identifier of a persisted relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub(crate) u64);

impl EdgeId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A relationship as persisted in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEdge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
}
