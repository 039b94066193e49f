//! Insertion of one application as two atomic units of work.
//!
//! ```text
//! InsertionSession --contain()--> Contained --derive()--> InsertReport
//!      (tx #1: nodes, ownership, USES)   (tx #2: EXTENDS, IMPLEMENTS, CALLS)
//! ```
//!
//! Derived edges can only be written through a [`Contained`], which only a
//! committed containment phase produces. The identity registry is created
//! by `contain()` and dropped when `derive()` returns, so nothing leaks from
//! one application into the next.
//!
//! If the second unit fails, the first stays committed. Callers see this as
//! [`InsertError::Derivation`] and must treat the application as partially
//! inserted.

use crate::containment::ContainmentBuilder;
use crate::derived::{DerivedGraphBuilder, DerivedStats, UnresolvedPolicy};
use crate::error::{InsertError, IntegrityError, Result};
use crate::materialize::analysis_timestamp;
use crate::node::NodeId;
use crate::registry::IdentityRegistry;
use crate::store::{GraphStore, StoreError, TxnSummary};
use appgraph_model::Application;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Tuning of an insertion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOptions {
    /// Handling of inheritance and call targets outside the application.
    #[serde(default)]
    pub unresolved: UnresolvedPolicy,
}

/// Outcome of a complete insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertReport {
    pub app_key: String,
    pub app_node: NodeId,
    /// Value stamped as `date_analysis` on the application node.
    pub analyzed_at: String,
    pub nodes_created: usize,
    /// Ownership and `USES` edges.
    pub containment_edges: usize,
    pub derived: DerivedStats,
}

impl InsertReport {
    pub fn derived_edges(&self) -> usize {
        self.derived.edges()
    }

    pub fn edges_created(&self) -> usize {
        self.containment_edges + self.derived.edges()
    }

    /// Inheritance or call targets that produced no edge.
    pub fn skipped_references(&self) -> usize {
        self.derived.skipped
    }
}

/// Insertion of one application, before anything is written.
pub struct InsertionSession<'a> {
    store: &'a GraphStore,
    app: &'a Application,
    options: InsertOptions,
}

impl<'a> InsertionSession<'a> {
    pub fn new(store: &'a GraphStore, app: &'a Application, options: InsertOptions) -> Self {
        Self {
            store,
            app,
            options,
        }
    }

    /// Runs both phases.
    pub fn run(self) -> std::result::Result<InsertReport, InsertError> {
        self.contain()?.derive()
    }

    /// Phase one: every node plus ownership and `USES` edges, committed as
    /// one unit. On failure nothing of the application is written.
    ///
    /// An application without a key is rejected before anything starts.
    pub fn contain(self) -> std::result::Result<Contained<'a>, InsertError> {
        let app = self.app;
        if app.key.trim().is_empty() {
            return Err(InsertError::Containment {
                app_key: app.key.clone(),
                source: IntegrityError::EmptyAppKey.into(),
            });
        }

        info!(
            app_key = %app.key,
            classes = app.classes.len(),
            entities = app.entity_count(),
            "Inserting application"
        );

        let analyzed_at = analysis_timestamp();
        let mut registry = IdentityRegistry::new();

        let (app_node, summary) = self
            .store
            .transaction(|txn| -> Result<_> {
                let app_node = ContainmentBuilder::new(txn, &mut registry, &app.key)
                    .build(app, &analyzed_at)?;
                let summary = TxnSummary {
                    nodes: txn.nodes_created(),
                    edges: txn.edges_created(),
                };
                Ok((app_node, summary))
            })
            .map_err(|source| InsertError::Containment {
                app_key: app.key.clone(),
                source,
            })?;

        info!(
            app_key = %app.key,
            nodes = summary.nodes,
            edges = summary.edges,
            "Containment committed"
        );

        Ok(Contained {
            store: self.store,
            app,
            options: self.options,
            registry,
            app_node,
            analyzed_at,
            summary,
        })
    }
}

/// A committed containment phase, holding the identity registry of the
/// application it covered.
#[must_use = "derived edges are only written by Contained::derive"]
pub struct Contained<'a> {
    store: &'a GraphStore,
    app: &'a Application,
    options: InsertOptions,
    registry: IdentityRegistry,
    app_node: NodeId,
    analyzed_at: String,
    summary: TxnSummary,
}

impl<'a> Contained<'a> {
    pub fn app_node(&self) -> NodeId {
        self.app_node
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// Phase two: inheritance and call edges, committed as one unit.
    pub fn derive(self) -> std::result::Result<InsertReport, InsertError> {
        let Contained {
            store,
            app,
            options,
            registry,
            app_node,
            analyzed_at,
            summary,
        } = self;

        let derived = store
            .transaction(|txn| -> Result<_> {
                DerivedGraphBuilder::new(txn, &registry, options.unresolved).build(app)
            })
            .map_err(|source| {
                warn!(
                    app_key = %app.key,
                    error = %source,
                    "Derived edges failed; containment stays committed"
                );
                InsertError::Derivation {
                    app_key: app.key.clone(),
                    app_node,
                    source,
                }
            })?;

        info!(
            app_key = %app.key,
            extends = derived.extends,
            implements = derived.implements,
            calls = derived.calls,
            skipped = derived.skipped,
            "Derived edges committed"
        );

        Ok(InsertReport {
            app_key: app.key.clone(),
            app_node,
            analyzed_at,
            nodes_created: summary.nodes,
            containment_edges: summary.edges,
            derived,
        })
    }
}

/// Inserts applications into a graph store, one at a time.
///
/// Holds the store exclusively: `insert_app` takes `&mut self`, so two
/// insertions never interleave on one inserter.
pub struct GraphInserter {
    store: GraphStore,
    options: InsertOptions,
}

impl GraphInserter {
    /// Opens or creates the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> std::result::Result<Self, StoreError> {
        Ok(Self::new(GraphStore::open(path)?))
    }

    pub fn new(store: GraphStore) -> Self {
        Self {
            store,
            options: InsertOptions::default(),
        }
    }

    pub fn with_options(mut self, options: InsertOptions) -> Self {
        self.options = options;
        self
    }

    /// Inserts `app` with a fresh identity registry.
    ///
    /// Inserting the same application twice yields two disjoint node sets.
    pub fn insert_app(
        &mut self,
        app: &Application,
    ) -> std::result::Result<InsertReport, InsertError> {
        InsertionSession::new(&self.store, app, self.options).run()
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn into_store(self) -> GraphStore {
        self.store
    }
}
