pub mod build;
pub mod config;
pub mod knowledge;
pub mod plugins;

pub use build::{
    BuildError, BuildLock, BuildReport, GraphBuildOrchestrator, LockError, PidStatus,
};
pub use config::{Config, ConfigError, GraphConfig, InventorySource, PluginsConfig};
pub use knowledge::{Edge, Graph, GraphStats, KnowledgeError, Node, NodeKind, Reference};
pub use plugins::{InventoryPopulator, PluginManager, PopulateError, Populator};
