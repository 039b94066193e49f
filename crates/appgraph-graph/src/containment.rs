//! First pass: ownership structure and field usage.
//!
//! Walks application -> classes -> members top-down. Every entity is
//! materialized exactly once and immediately linked to its owner. A class's
//! fields are all materialized before its methods, so a method's `USES`
//! edges to fields of its own class (or of any class walked earlier) can be
//! resolved on the spot.

use crate::edge::EdgeKind;
use crate::error::Result;
use crate::materialize::Materializer;
use crate::node::NodeId;
use crate::registry::IdentityRegistry;
use crate::store::WriteTxn;
use appgraph_model::{Application, Class, Method};

/// Builds the containment graph of one application into a transaction.
pub struct ContainmentBuilder<'a, 's> {
    materializer: Materializer<'a, 's>,
}

impl<'a, 's> ContainmentBuilder<'a, 's> {
    pub fn new(
        txn: &'a mut WriteTxn<'s>,
        registry: &'a mut IdentityRegistry,
        app_key: &'a str,
    ) -> Self {
        Self {
            materializer: Materializer::new(txn, registry, app_key),
        }
    }

    /// Materializes `app` and everything it owns. Returns the application node.
    pub fn build(mut self, app: &Application, analyzed_at: &str) -> Result<NodeId> {
        let app_node = self.materializer.app(app, analyzed_at)?;

        for class in &app.classes {
            let class_node = self.add_class(class)?;
            self.link(app_node, class_node, EdgeKind::AppOwnsClass)?;
        }

        Ok(app_node)
    }

    fn add_class(&mut self, class: &Class) -> Result<NodeId> {
        let class_node = self.materializer.class(class)?;

        for variable in &class.variables {
            let variable_node = self.materializer.variable(variable)?;
            self.link(class_node, variable_node, EdgeKind::ClassOwnsVariable)?;
        }

        for method in &class.methods {
            let method_node = self.add_method(method)?;
            self.link(class_node, method_node, EdgeKind::ClassOwnsMethod)?;
        }

        Ok(class_node)
    }

    fn add_method(&mut self, method: &Method) -> Result<NodeId> {
        let method_node = self.materializer.method(method)?;

        for argument in &method.arguments {
            let argument_node = self.materializer.argument(argument)?;
            self.link(method_node, argument_node, EdgeKind::MethodOwnsArgument)?;
        }

        for &variable in &method.used_variables {
            // A miss means the field belongs to a class not walked yet.
            let variable_node = self.materializer.registry().variables.lookup(variable)?;
            self.link(method_node, variable_node, EdgeKind::Uses)?;
        }

        Ok(method_node)
    }

    fn link(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) -> Result<()> {
        self.materializer.txn().create_edge(from, to, kind)?;
        Ok(())
    }
}
