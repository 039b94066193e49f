//! Appgraph Model - the analyzed application as plain data
//!
//! An upstream analyzer discovers classes, methods, fields and metrics and
//! hands them over as an [`Application`]. This crate only describes that
//! shape; turning it into a property graph is `appgraph-graph`'s job.
//!
//! # Example
//!
//! ```
//! use appgraph_model::{Application, Class, IdAllocator, Method, Metric, Modifier};
//!
//! let mut ids = IdAllocator::new();
//! let app = Application::new("com.example-42", "Example").with_class(
//!     Class::new(ids.class(), "A", Modifier::Public)
//!         .with_metric(Metric::new("LOC", 10))
//!         .with_method(Method::new(ids.method(), "m", Modifier::Public, "m#A", "void")),
//! );
//!
//! assert_eq!(app.entity_count(), 3);
//! ```

mod application;
mod entity;
mod error;
mod ids;
mod metric;

pub use application::Application;
pub use entity::{Argument, Class, Method, Modifier, Variable};
pub use error::{ModelError, Result};
pub use ids::{ClassId, IdAllocator, MethodId, VariableId};
pub use metric::{Metric, MetricValue};
