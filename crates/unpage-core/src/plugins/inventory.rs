//! Inventory plugin: resources exported to JSON or YAML files.
//!
//! Each file in the configured directory looks like:
//!
//! ```text
//! context:
//!   project_id: my-project
//! resources:
//!   - node_id: projects/my-project/zones/us-central1-a/instances/vm-1
//!     node_type: gcp_compute_instance
//!     raw_data: { ... }
//! ```
//!
//! Unreadable files, unparsable files and unknown node types are logged and
//! skipped. A missing inventory directory fails the whole plugin.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{PopulateError, Populator};
use crate::config::INVENTORY_EXTENSIONS;
use crate::knowledge::{Graph, KnowledgeError, Node, NodeKind};

/// Why an inventory file or resource was skipped.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Resource has an empty node_id")]
    EmptyNodeId,

    #[error(transparent)]
    NodeType(#[from] KnowledgeError),
}

/// One inventory file.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryFile {
    /// Provider context applied to every resource in the file.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    #[serde(default)]
    pub resources: Vec<InventoryResource>,
}

/// One exported resource.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryResource {
    pub node_id: String,
    pub node_type: String,
    #[serde(default)]
    pub raw_data: Value,
    /// Overrides file-level context keys.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

impl InventoryResource {
    /// Build a node, merging file context under resource context.
    pub fn into_node(
        self,
        file_context: &BTreeMap<String, String>,
    ) -> Result<Node, InventoryError> {
        if self.node_id.is_empty() {
            return Err(InventoryError::EmptyNodeId);
        }
        let kind: NodeKind = self.node_type.parse()?;

        let mut context = file_context.clone();
        context.extend(self.context);

        Ok(Node::new(self.node_id, kind, self.raw_data).with_context(context))
    }
}

/// Populates the graph from a directory of inventory files.
#[derive(Debug, Clone)]
pub struct InventoryPopulator {
    name: String,
    dir: PathBuf,
}

impl InventoryPopulator {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Inventory files in the directory, sorted by path.
    async fn inventory_files(&self) -> Result<Vec<PathBuf>, PopulateError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            PopulateError::new(
                &self.name,
                format!("cannot read inventory directory {}: {}", self.dir.display(), e),
            )
        })?;

        let mut files = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
                    let path = entry.path();
                    if is_file && has_inventory_extension(&path) {
                        files.push(path);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    // Keep what was listed so far
                    tracing::warn!(plugin = %self.name, error = %e, "Failed to list inventory directory");
                    break;
                }
            }
        }

        files.sort();
        Ok(files)
    }

    /// Parse one inventory file; `.json` as JSON, anything else as YAML.
    pub async fn read_file(path: &Path) -> Result<InventoryFile, InventoryError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| InventoryError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|source| InventoryError::Json {
                path: path.to_path_buf(),
                source,
            }),
            _ => serde_yaml::from_str(&content).map_err(|source| InventoryError::Yaml {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[async_trait]
impl Populator for InventoryPopulator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn populate_graph(&self, graph: &Graph) -> Result<(), PopulateError> {
        tracing::info!(plugin = %self.name, dir = %self.dir.display(), "Populating from inventory");

        let mut added = 0usize;
        for path in self.inventory_files().await? {
            let file = match Self::read_file(&path).await {
                Ok(file) => file,
                Err(e) => {
                    tracing::warn!(
                        plugin = %self.name,
                        path = %path.display(),
                        error = %e,
                        "Skipping unreadable inventory file"
                    );
                    continue;
                }
            };

            for resource in file.resources {
                let node_id = resource.node_id.clone();
                match resource.into_node(&file.context) {
                    Ok(node) => {
                        graph.add_node(node);
                        added += 1;
                    }
                    Err(e) => tracing::warn!(
                        plugin = %self.name,
                        path = %path.display(),
                        node_id = %node_id,
                        error = %e,
                        "Skipping inventory resource"
                    ),
                }
            }
        }

        tracing::info!(plugin = %self.name, nodes = added, "Inventory populated");
        Ok(())
    }
}

fn has_inventory_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| INVENTORY_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}
