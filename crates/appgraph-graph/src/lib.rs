//! Appgraph Graph - persists an analyzed application as a property graph
//!
//! Every class, method, field and argument of an [`Application`] becomes
//! one node; ownership, field usage, inheritance and calls become typed
//! relationships. Metrics are flattened into node properties.
//!
//! # Architecture
//!
//! Insertion runs in two transactions over a sled-backed [`GraphStore`]:
//! 1. Containment: nodes, ownership edges and `USES`, recording each
//!    entity's node in an [`IdentityRegistry`]
//! 2. Derivation: `EXTENDS`, `IMPLEMENTS` and `CALLS`, resolved through that
//!    registry once every node exists
//!
//! # Example
//!
//! ```no_run
//! use appgraph_graph::{EdgeKind, GraphInserter};
//! use appgraph_model::Application;
//!
//! let app = Application::from_json_file("model.json")?;
//! let mut inserter = GraphInserter::open(".appgraph/graph.db")?;
//! let report = inserter.insert_app(&app)?;
//!
//! let graph = inserter.store().load_graph(Some(report.app_key.as_str()))?;
//! println!("{} calls", graph.edges_of_kind(EdgeKind::Calls).len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [`Application`]: appgraph_model::Application

mod containment;
mod derived;
mod edge;
mod error;
mod graph;
mod materialize;
mod node;
mod registry;
mod session;
mod store;

pub use containment::ContainmentBuilder;
pub use derived::{DerivedGraphBuilder, DerivedStats, Reference, UnresolvedPolicy};
pub use edge::{EdgeId, EdgeKind, StoredEdge};
pub use error::{GraphError, InsertError, IntegrityError};
pub use graph::{GraphStats, PropertyGraph};
pub use materialize::{
    analysis_timestamp, node_properties, Materializer, NodeSource, APP_KEY, DATE_ANALYSIS,
    DATE_ANALYSIS_FORMAT,
};
pub use node::{NodeId, NodeLabel, Properties, PropertyValue, StoredNode};
pub use registry::{EntityKey, EntityKind, IdentityRegistry, Registry};
pub use session::{Contained, GraphInserter, InsertOptions, InsertReport, InsertionSession};
pub use store::{GraphStore, StoreConfig, StoreError, TxnSummary, WriteTxn};
