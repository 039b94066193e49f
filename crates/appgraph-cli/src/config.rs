//! Project configuration stored in `.appgraph/config.json`.

use appgraph_graph::{InsertOptions, StoreConfig, UnresolvedPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::commands::Result;

pub const CONFIG_DIR: &str = ".appgraph";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,

    /// Graph store location, relative to the project root.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Handling of inheritance and call targets outside the application.
    #[serde(default)]
    pub unresolved: UnresolvedPolicy,

    #[serde(default = "default_flush")]
    pub flush_on_commit: bool,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_database() -> PathBuf {
    Path::new(CONFIG_DIR).join("graph.db")
}

fn default_flush() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            database: default_database(),
            unresolved: UnresolvedPolicy::default(),
            flush_on_commit: default_flush(),
        }
    }
}

impl Config {
    pub fn path(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Loads the config under `root`, or the defaults when there is none.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path(root);
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, root: &Path) -> Result<PathBuf> {
        let path = Self::path(root);
        fs::create_dir_all(root.join(CONFIG_DIR))?;
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    pub fn store_config(&self, root: &Path) -> StoreConfig {
        StoreConfig {
            path: root.join(&self.database),
            flush_on_commit: self.flush_on_commit,
        }
    }

    pub fn insert_options(&self) -> InsertOptions {
        InsertOptions {
            unresolved: self.unresolved,
        }
    }
}
