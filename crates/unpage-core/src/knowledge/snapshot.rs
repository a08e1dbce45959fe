//! On-disk graph snapshots.
//!
//! ```text
//! {
//!   "version": 1,
//!   "saved_at": "2026-01-01T00:00:00Z",
//!   "nodes": [{"node_id", "node_type", "raw_data", "context"?}, ...],
//!   "edges": [{"source_node_id", "target_node_id", "properties": {...}}, ...]
//! }
//! ```
//!
//! The identifier index is derived and never stored: loading replays every
//! node through [`Graph::add_node`] in first-registration order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::edge::Edge;
use super::error::KnowledgeError;
use super::graph::Graph;
use super::node::Node;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form of a [`Graph`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Capture the current nodes and edges.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            nodes: self.iter_nodes(),
            edges: self.edges(),
        }
    }

    /// Rebuild a graph from a snapshot, re-deriving the identifier index.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self, KnowledgeError> {
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(KnowledgeError::UnsupportedVersion {
                found: snapshot.version,
                supported: SNAPSHOT_VERSION,
            });
        }

        let graph = Graph::new();
        for node in snapshot.nodes {
            graph.add_node(node);
        }
        graph.restore_edges(snapshot.edges);
        Ok(graph)
    }

    /// Write the graph to `path`.
    ///
    /// The snapshot is written to a sibling temp file and renamed into place,
    /// so a failed save never clobbers the previous snapshot.
    pub fn save(&self, path: &Path) -> Result<(), KnowledgeError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| KnowledgeError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(&self.snapshot())?;
        let tmp = temp_path(path);
        fs::write(&tmp, json).map_err(|e| KnowledgeError::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(KnowledgeError::io(path, e));
        }

        tracing::info!(
            path = %path.display(),
            nodes = self.node_count(),
            edges = self.edge_count(),
            "Saved graph snapshot"
        );
        Ok(())
    }

    /// Load a graph written by [`Graph::save`].
    pub fn load(path: &Path) -> Result<Self, KnowledgeError> {
        let json = fs::read_to_string(path).map_err(|e| KnowledgeError::io(path, e))?;
        let snapshot: GraphSnapshot = serde_json::from_str(&json)?;
        Self::from_snapshot(snapshot)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
