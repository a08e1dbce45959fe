//! Knowledge graph error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the knowledge graph.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// A node's raw payload does not have the shape its node type expects.
    #[error("Malformed payload for node {node_id}: {message}")]
    MalformedPayload { node_id: String, message: String },

    /// Node type tag not known to this version.
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// IO error.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot (de)serialization error.
    #[error("Snapshot serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot written by an incompatible version.
    #[error("Unsupported snapshot version {found} (expected at most {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

impl KnowledgeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KnowledgeError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(node_id: &str, message: impl Into<String>) -> Self {
        KnowledgeError::MalformedPayload {
            node_id: node_id.to_string(),
            message: message.into(),
        }
    }
}
