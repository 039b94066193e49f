//! Second pass: inheritance and call edges.
//!
//! These edges may point at any entity of the application, including ones
//! walked after their source, so they are only built once every class and
//! method has a node. Targets outside the application have no node at all;
//! what happens to them is decided by [`UnresolvedPolicy`].

use crate::edge::EdgeKind;
use crate::error::{IntegrityError, Result};
use crate::node::NodeId;
use crate::registry::IdentityRegistry;
use crate::store::WriteTxn;
use appgraph_model::{Application, Class};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of cross reference behind a derived edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reference {
    Parent,
    Interface,
    Call,
}

impl Reference {
    fn edge_kind(self) -> EdgeKind {
        match self {
            Self::Parent => EdgeKind::Extends,
            Self::Interface => EdgeKind::Implements,
            Self::Call => EdgeKind::Calls,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Parent => "parent",
            Self::Interface => "interface",
            Self::Call => "call",
        };
        write!(f, "{}", s)
    }
}

/// What to do with a derived edge whose target is not part of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Create no edge and count the reference as skipped.
    #[default]
    Skip,
    /// Abort the derivation phase with an integrity error.
    Fail,
}

/// Counts of derived edges written, plus skipped references.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub extends: usize,
    pub implements: usize,
    pub calls: usize,
    pub skipped: usize,
}

impl DerivedStats {
    pub fn edges(&self) -> usize {
        self.extends + self.implements + self.calls
    }
}

/// Builds `EXTENDS`, `IMPLEMENTS` and `CALLS` edges for one application.
pub struct DerivedGraphBuilder<'a, 's> {
    txn: &'a mut WriteTxn<'s>,
    registry: &'a IdentityRegistry,
    policy: UnresolvedPolicy,
    stats: DerivedStats,
}

impl<'a, 's> DerivedGraphBuilder<'a, 's> {
    pub fn new(
        txn: &'a mut WriteTxn<'s>,
        registry: &'a IdentityRegistry,
        policy: UnresolvedPolicy,
    ) -> Self {
        Self {
            txn,
            registry,
            policy,
            stats: DerivedStats::default(),
        }
    }

    pub fn build(mut self, app: &Application) -> Result<DerivedStats> {
        for class in &app.classes {
            self.add_hierarchy(class)?;
        }
        for class in &app.classes {
            self.add_calls(class)?;
        }
        Ok(self.stats)
    }

    fn add_hierarchy(&mut self, class: &Class) -> Result<()> {
        let class_node = self.registry.classes.lookup(class.id)?;

        // A parent known only by name (platform base class) has no reference
        // and produces nothing.
        if let Some(parent) = class.parent {
            let target = self.registry.classes.get(parent);
            self.link(Reference::Parent, class_node, class.id.get(), target, parent.get())?;
        }

        for &interface in &class.interfaces {
            let target = self.registry.classes.get(interface);
            self.link(
                Reference::Interface,
                class_node,
                class.id.get(),
                target,
                interface.get(),
            )?;
        }

        Ok(())
    }

    fn add_calls(&mut self, class: &Class) -> Result<()> {
        for method in &class.methods {
            let caller = self.registry.methods.lookup(method.id)?;
            for &callee in &method.called_methods {
                let target = self.registry.methods.get(callee);
                self.link(Reference::Call, caller, method.id.get(), target, callee.get())?;
            }
        }
        Ok(())
    }

    fn link(
        &mut self,
        reference: Reference,
        from_node: NodeId,
        from: u64,
        target: Option<NodeId>,
        to: u64,
    ) -> Result<()> {
        let Some(to_node) = target else {
            return match self.policy {
                UnresolvedPolicy::Skip => {
                    tracing::debug!(
                        %reference,
                        from,
                        to,
                        "Skipping reference outside the application"
                    );
                    self.stats.skipped += 1;
                    Ok(())
                }
                UnresolvedPolicy::Fail => Err(IntegrityError::UnresolvedReference {
                    reference,
                    from,
                    to,
                }
                .into()),
            };
        };

        self.txn.create_edge(from_node, to_node, reference.edge_kind())?;
        match reference {
            Reference::Parent => self.stats.extends += 1,
            Reference::Interface => self.stats.implements += 1,
            Reference::Call => self.stats.calls += 1,
        }
        Ok(())
    }
}
