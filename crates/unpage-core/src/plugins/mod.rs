//! Provider plugins that populate the knowledge graph.
//!
//! A plugin with the graph capability implements [`Populator`]. The
//! [`PluginManager`] is built once per run from [`Config`] and handed to
//! whatever needs plugin lookup.

mod inventory;

pub use inventory::{InventoryError, InventoryFile, InventoryPopulator, InventoryResource};

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;
use crate::knowledge::Graph;

/// A populator failed as a whole.
///
/// Per-resource access errors never become a `PopulateError`; populators log
/// and skip them.
#[derive(Debug, Error)]
#[error("plugin '{plugin}' failed: {message}")]
pub struct PopulateError {
    pub plugin: String,
    pub message: String,
}

impl PopulateError {
    pub fn new(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            message: message.into(),
        }
    }
}

/// Lists resources from one provider into the graph.
#[async_trait]
pub trait Populator: Send + Sync {
    /// Plugin name for logs and error reports.
    fn name(&self) -> &str;

    /// Add every reachable resource with [`Graph::add_node`].
    ///
    /// Must not call [`Graph::infer_edges`] or save the graph.
    async fn populate_graph(&self, graph: &Graph) -> Result<(), PopulateError>;
}

/// The plugins enabled for one run.
#[derive(Default)]
pub struct PluginManager {
    populators: Vec<Arc<dyn Populator>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate every enabled plugin from configuration.
    pub fn from_config(config: &Config) -> Self {
        let mut manager = Self::new();
        for source in config.plugins.inventory.iter().filter(|s| s.enabled) {
            manager.register(Arc::new(InventoryPopulator::new(&source.name, &source.path)));
        }
        manager
    }

    /// Add a populator. A later plugin with the same name replaces the earlier one.
    pub fn register(&mut self, populator: Arc<dyn Populator>) {
        self.populators.retain(|p| p.name() != populator.name());
        self.populators.push(populator);
    }

    /// Plugins with the knowledge graph capability.
    pub fn populators(&self) -> Vec<Arc<dyn Populator>> {
        self.populators.clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Populator>> {
        self.populators.iter().find(|p| p.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.populators.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.populators.is_empty()
    }
}
