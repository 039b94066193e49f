//! Errors of the model-to-graph transformation.

use crate::derived::Reference;
use crate::node::NodeId;
use crate::registry::EntityKind;
use crate::store::StoreError;
use thiserror::Error;

/// The identity registry disagrees with what the traversal expects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// Nodes would carry no application key.
    #[error("application key is empty")]
    EmptyAppKey,

    /// A lookup for an entity that has no node in this session.
    #[error("{kind} {id} has no node in this insertion")]
    Unregistered { kind: EntityKind, id: u64 },

    /// The same entity id was materialized twice.
    #[error("{kind} {id} was already materialized in this insertion")]
    AlreadyRegistered { kind: EntityKind, id: u64 },

    /// A derived edge points outside the application and the session is
    /// configured to reject that.
    #[error("{reference} target {to} of {from} is outside the application")]
    UnresolvedReference {
        reference: Reference,
        from: u64,
        to: u64,
    },
}

/// Failure inside one phase of an insertion.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

/// Failure of a whole application insertion.
#[derive(Error, Debug)]
pub enum InsertError {
    /// The containment phase failed and was rolled back. Nothing of this
    /// application was written.
    #[error("containment of application '{app_key}' failed")]
    Containment {
        app_key: String,
        #[source]
        source: GraphError,
    },

    /// The derivation phase failed and was rolled back, but the containment
    /// phase had already committed: the store holds this application's
    /// nodes and ownership edges without inheritance or call edges.
    #[error("derived edges of application '{app_key}' failed (containment committed at {app_node})")]
    Derivation {
        app_key: String,
        app_node: NodeId,
        #[source]
        source: GraphError,
    },
}

impl InsertError {
    /// True when part of the application remains in the store.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Derivation { .. })
    }

    pub fn app_key(&self) -> &str {
        match self {
            Self::Containment { app_key, .. } | Self::Derivation { app_key, .. } => app_key,
        }
    }

    /// The underlying phase failure.
    pub fn phase_error(&self) -> &GraphError {
        match self {
            Self::Containment { source, .. } | Self::Derivation { source, .. } => source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_insert_error_leaves_cause_to_source() {
        let err = InsertError::Containment {
            app_key: "k".to_string(),
            source: IntegrityError::EmptyAppKey.into(),
        };

        assert_eq!(err.to_string(), "containment of application 'k' failed");
        assert_eq!(
            err.source().map(|cause| cause.to_string()),
            Some("application key is empty".to_string())
        );
    }
}
