//! The root of an analyzed model.

use crate::entity::{Class, Method};
use crate::error::{ModelError, Result};
use crate::ids::MethodId;
use crate::metric::Metric;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// An analyzed application: store metadata plus every class found in it.
///
/// The `key` distinguishes this analysis from every other one that ends up
/// in the same graph store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub developer: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub nb_download: i64,
    /// Date the package was downloaded, as reported by the store.
    #[serde(default)]
    pub date_download: String,
    /// Package size in bytes.
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub classes: Vec<Class>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl Application {
    /// Creates an application with empty store metadata.
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            category: String::new(),
            package: String::new(),
            developer: String::new(),
            rating: 0.0,
            nb_download: 0,
            date_download: String::new(),
            size: 0,
            price: String::new(),
            classes: Vec::new(),
            metrics: Vec::new(),
        }
    }

    /// Parses analyzer output.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses an analyzer output file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn with_class(mut self, class: Class) -> Self {
        self.classes.push(class);
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }

    /// Finds a method owned by any class of this application.
    pub fn method(&self, id: MethodId) -> Option<&Method> {
        self.methods().find(|m| m.id == id)
    }

    /// Iterates over every method of every class, in traversal order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.classes.iter().flat_map(|c| c.methods.iter())
    }

    /// Number of graph nodes a full insertion of this model creates:
    /// the application itself plus every class, variable, method and argument.
    pub fn entity_count(&self) -> usize {
        let members: usize = self
            .classes
            .iter()
            .map(|c| {
                let arguments: usize = c.methods.iter().map(|m| m.arguments.len()).sum();
                1 + c.variables.len() + c.methods.len() + arguments
            })
            .sum();
        1 + members
    }
}
