//! Typed, directed edges between node ids.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A relationship between two nodes, both given by canonical node id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source_node_id: String,
    pub target_node_id: String,
    pub properties: EdgeProperties,
}

/// Edge properties. `relationship_type` is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeProperties {
    pub relationship_type: String,
    /// Anything else a snapshot carried along.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Identity of an edge: (source, target, relationship type).
pub type EdgeKey = (String, String, String);

impl Edge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relationship_type: impl Into<String>,
    ) -> Self {
        Self {
            source_node_id: source.into(),
            target_node_id: target.into(),
            properties: EdgeProperties {
                relationship_type: relationship_type.into(),
                extra: BTreeMap::new(),
            },
        }
    }

    pub fn relationship_type(&self) -> &str {
        &self.properties.relationship_type
    }

    pub fn key(&self) -> EdgeKey {
        (
            self.source_node_id.clone(),
            self.target_node_id.clone(),
            self.properties.relationship_type.clone(),
        )
    }
}
