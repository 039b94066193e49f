//! Classes and their members.
//!
//! Ownership is structural (a class holds its variables and methods by
//! value); every other relationship is an id reference that may point at
//! any entity of the same application, or outside of it.

use crate::ids::{ClassId, MethodId, VariableId};
use crate::metric::Metric;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Visibility modifier of a class, method or variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Public,
    Protected,
    Private,
    /// Package-private: no modifier written in source.
    #[default]
    Default,
}

impl Modifier {
    /// Lowercase token stored on graph nodes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A formal parameter of a method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    /// Zero-based position in the parameter list.
    pub position: u32,
}

impl Argument {
    pub fn new(name: impl Into<String>, position: u32) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// A field declared by a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub id: VariableId,
    pub name: String,
    #[serde(default)]
    pub modifier: Modifier,
    /// Declared type, as written by the analyzer.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl Variable {
    pub fn new(
        id: VariableId,
        name: impl Into<String>,
        modifier: Modifier,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            modifier,
            type_name: type_name.into(),
            metrics: Vec::new(),
        }
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }
}

/// A method declared by a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub id: MethodId,
    pub name: String,
    #[serde(default)]
    pub modifier: Modifier,
    /// Fully qualified signature, e.g. `onCreate#com.example.MainActivity`.
    pub full_name: String,
    pub return_type: String,
    #[serde(default)]
    pub arguments: Vec<Argument>,
    /// Fields read or written by this method.
    #[serde(default)]
    pub used_variables: BTreeSet<VariableId>,
    /// Methods invoked by this method, possibly outside the application.
    #[serde(default)]
    pub called_methods: BTreeSet<MethodId>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl Method {
    pub fn new(
        id: MethodId,
        name: impl Into<String>,
        modifier: Modifier,
        full_name: impl Into<String>,
        return_type: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            modifier,
            full_name: full_name.into(),
            return_type: return_type.into(),
            arguments: Vec::new(),
            used_variables: BTreeSet::new(),
            called_methods: BTreeSet::new(),
            metrics: Vec::new(),
        }
    }

    pub fn with_argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn with_used_variable(mut self, variable: VariableId) -> Self {
        self.used_variables.insert(variable);
        self
    }

    pub fn with_call(mut self, callee: MethodId) -> Self {
        self.called_methods.insert(callee);
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }
}

/// A class of the analyzed application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub id: ClassId,
    pub name: String,
    #[serde(default)]
    pub modifier: Modifier,
    /// Name of the superclass as seen in source, known even when the
    /// superclass itself is not part of the application.
    #[serde(default)]
    pub parent_name: Option<String>,
    /// The superclass, when it belongs to the application.
    #[serde(default)]
    pub parent: Option<ClassId>,
    #[serde(default)]
    pub interfaces: BTreeSet<ClassId>,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub methods: Vec<Method>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl Class {
    pub fn new(id: ClassId, name: impl Into<String>, modifier: Modifier) -> Self {
        Self {
            id,
            name: name.into(),
            modifier,
            parent_name: None,
            parent: None,
            interfaces: BTreeSet::new(),
            variables: Vec::new(),
            methods: Vec::new(),
            metrics: Vec::new(),
        }
    }

    /// Sets the superclass that belongs to the application.
    pub fn extending(mut self, parent: ClassId, parent_name: impl Into<String>) -> Self {
        self.parent = Some(parent);
        self.parent_name = Some(parent_name.into());
        self
    }

    /// Records a superclass that lives outside the application.
    pub fn extending_external(mut self, parent_name: impl Into<String>) -> Self {
        self.parent = None;
        self.parent_name = Some(parent_name.into());
        self
    }

    pub fn implementing(mut self, interface: ClassId) -> Self {
        self.interfaces.insert(interface);
        self
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }
}
