//! Entity to node conversion.
//!
//! A node is a snapshot: every property is copied out of the entity at
//! insertion time. Scalars are written first, then one property per metric,
//! so a metric sharing a name with a scalar (or an earlier metric) wins.
//! [`APP_KEY`] is written last and cannot be overwritten by a metric.

use crate::error::Result;
use crate::node::{NodeId, NodeLabel, Properties, PropertyValue};
use crate::registry::IdentityRegistry;
use crate::store::WriteTxn;
use appgraph_model::{Application, Argument, Class, Method, Metric, MetricValue, Variable};

/// Property holding the key of the application a node belongs to.
pub const APP_KEY: &str = "app_key";

/// Property holding the insertion time on the application node.
pub const DATE_ANALYSIS: &str = "date_analysis";

/// Format of [`DATE_ANALYSIS`]: `2024-06-05 14:03:27.512`.
pub const DATE_ANALYSIS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Current local time rendered for [`DATE_ANALYSIS`].
pub fn analysis_timestamp() -> String {
    chrono::Local::now().format(DATE_ANALYSIS_FORMAT).to_string()
}

/// An entity that becomes exactly one node.
pub trait NodeSource {
    const LABEL: NodeLabel;

    /// Writes the entity's own attributes.
    fn scalar_properties(&self, props: &mut Properties);

    fn metrics(&self) -> &[Metric] {
        &[]
    }
}

impl NodeSource for Application {
    const LABEL: NodeLabel = NodeLabel::App;

    fn scalar_properties(&self, props: &mut Properties) {
        set(props, "name", self.name.as_str());
        set(props, "category", self.category.as_str());
        set(props, "package", self.package.as_str());
        set(props, "developer", self.developer.as_str());
        set(props, "rating", self.rating);
        set(props, "nb_download", self.nb_download);
        set(props, "date_download", self.date_download.as_str());
        set(props, "size", self.size);
        set(props, "price", self.price.as_str());
    }

    fn metrics(&self) -> &[Metric] {
        &self.metrics
    }
}

impl NodeSource for Class {
    const LABEL: NodeLabel = NodeLabel::Class;

    fn scalar_properties(&self, props: &mut Properties) {
        set(props, "name", self.name.as_str());
        set(props, "modifier", self.modifier.as_str());
        if let Some(parent_name) = &self.parent_name {
            set(props, "parent_name", parent_name.as_str());
        }
    }

    fn metrics(&self) -> &[Metric] {
        &self.metrics
    }
}

impl NodeSource for Variable {
    const LABEL: NodeLabel = NodeLabel::Variable;

    fn scalar_properties(&self, props: &mut Properties) {
        set(props, "name", self.name.as_str());
        set(props, "modifier", self.modifier.as_str());
        set(props, "type", self.type_name.as_str());
    }

    fn metrics(&self) -> &[Metric] {
        &self.metrics
    }
}

impl NodeSource for Method {
    const LABEL: NodeLabel = NodeLabel::Method;

    fn scalar_properties(&self, props: &mut Properties) {
        set(props, "name", self.name.as_str());
        set(props, "modifier", self.modifier.as_str());
        set(props, "full_name", self.full_name.as_str());
        set(props, "return_type", self.return_type.as_str());
    }

    fn metrics(&self) -> &[Metric] {
        &self.metrics
    }
}

impl NodeSource for Argument {
    const LABEL: NodeLabel = NodeLabel::Argument;

    fn scalar_properties(&self, props: &mut Properties) {
        set(props, "name", self.name.as_str());
        set(props, "position", self.position);
    }
}

fn set(props: &mut Properties, name: &str, value: impl Into<PropertyValue>) {
    props.insert(name.to_string(), value.into());
}

fn stamp_metrics(props: &mut Properties, metrics: &[Metric]) {
    for metric in metrics {
        let value = match metric.value {
            MetricValue::Integer(v) => PropertyValue::Integer(v),
            MetricValue::Real(v) => PropertyValue::Real(v),
        };
        props.insert(metric.name.clone(), value);
    }
}

/// Full property bag of `entity`: scalars, metrics, then the application key.
pub fn node_properties<E: NodeSource>(entity: &E, app_key: &str) -> Properties {
    let mut props = Properties::new();
    entity.scalar_properties(&mut props);
    stamp_metrics(&mut props, entity.metrics());
    set(&mut props, APP_KEY, app_key);
    props
}

/// Creates nodes inside one transaction and records them in the registry.
///
/// Creates no relationships.
pub struct Materializer<'a, 's> {
    txn: &'a mut WriteTxn<'s>,
    registry: &'a mut IdentityRegistry,
    app_key: &'a str,
}

impl<'a, 's> Materializer<'a, 's> {
    pub fn new(
        txn: &'a mut WriteTxn<'s>,
        registry: &'a mut IdentityRegistry,
        app_key: &'a str,
    ) -> Self {
        Self {
            txn,
            registry,
            app_key,
        }
    }

    /// The application node, stamped with `analyzed_at`.
    pub fn app(&mut self, app: &Application, analyzed_at: &str) -> Result<NodeId> {
        let mut props = Properties::new();
        app.scalar_properties(&mut props);
        set(&mut props, DATE_ANALYSIS, analyzed_at);
        stamp_metrics(&mut props, app.metrics());
        set(&mut props, APP_KEY, self.app_key);

        Ok(self.txn.create_node(NodeLabel::App, props)?)
    }

    pub fn class(&mut self, class: &Class) -> Result<NodeId> {
        let node = self.create(class)?;
        self.registry.classes.register(class.id, node)?;
        Ok(node)
    }

    pub fn variable(&mut self, variable: &Variable) -> Result<NodeId> {
        let node = self.create(variable)?;
        self.registry.variables.register(variable.id, node)?;
        Ok(node)
    }

    pub fn method(&mut self, method: &Method) -> Result<NodeId> {
        let node = self.create(method)?;
        self.registry.methods.register(method.id, node)?;
        Ok(node)
    }

    /// Arguments are never the target of a later lookup, so they are not
    /// registered.
    pub fn argument(&mut self, argument: &Argument) -> Result<NodeId> {
        self.create(argument)
    }

    fn create<E: NodeSource>(&mut self, entity: &E) -> Result<NodeId> {
        let props = node_properties(entity, self.app_key);
        Ok(self.txn.create_node(E::LABEL, props)?)
    }

    /// Access to the transaction for relationship creation.
    pub fn txn(&mut self) -> &mut WriteTxn<'s> {
        self.txn
    }

    pub fn registry(&self) -> &IdentityRegistry {
        self.registry
    }
}
