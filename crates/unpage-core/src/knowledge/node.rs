//! Nodes and reference identifiers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::error::KnowledgeError;
use super::ontology::{relationship, NodeKind};
use super::payload::Payload;

/// One infrastructure resource in the knowledge graph.
///
/// The serialized form is also the snapshot node record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Provider-namespaced id, e.g. `projects/P/zones/Z/instances/I`.
    pub node_id: String,
    /// Resource kind; decides identifier and reference derivation.
    pub node_type: NodeKind,
    /// The provider's native representation, stored verbatim.
    #[serde(default)]
    pub raw_data: Value,
    /// Provider context the populator ran with (project, account, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

impl Node {
    /// Create a node without provider context.
    pub fn new(node_id: impl Into<String>, node_type: NodeKind, raw_data: Value) -> Self {
        Self {
            node_id: node_id.into(),
            node_type,
            raw_data,
            context: BTreeMap::new(),
        }
    }

    /// Attach provider context.
    pub fn with_context(mut self, context: BTreeMap<String, String>) -> Self {
        self.context = context;
        self
    }

    /// All strings by which other nodes may refer to this node.
    ///
    /// May contain `None` and duplicates; the graph filters both.
    pub fn get_identifiers(&self) -> Result<Vec<Option<String>>, KnowledgeError> {
        let mut identifiers = vec![Some(self.node_id.clone())];
        let payload = Payload::new(&self.node_id, &self.raw_data)?;
        identifiers.extend(self.node_type.identifiers(&payload)?);
        Ok(identifiers)
    }

    /// Outbound relationships this node believes it has.
    pub fn get_reference_identifiers(&self) -> Result<Vec<Reference>, KnowledgeError> {
        let payload = Payload::new(&self.node_id, &self.raw_data)?;
        self.node_type.references(&payload)
    }
}

/// An identifier a node points to, optionally typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Target identifier; `None` is filtered during inference.
    pub identifier: Option<String>,
    /// Relationship label; `None` means [`relationship::RELATED_TO`].
    pub relationship_type: Option<String>,
}

impl Reference {
    /// A reference with an explicit relationship type.
    pub fn typed(identifier: impl Into<String>, relationship_type: &str) -> Self {
        Self {
            identifier: non_empty(identifier.into()),
            relationship_type: Some(relationship_type.to_string()),
        }
    }

    /// An untyped reference.
    pub fn bare(identifier: impl Into<String>) -> Self {
        Self {
            identifier: non_empty(identifier.into()),
            relationship_type: None,
        }
    }

    pub fn relationship(&self) -> &str {
        self.relationship_type
            .as_deref()
            .unwrap_or(relationship::RELATED_TO)
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifiers_start_with_node_id() {
        let node = Node::new(
            "projects/p/zones/z/instances/vm-1",
            NodeKind::GcpComputeInstance,
            json!({"name": "vm-1", "selfLink": "https://x/instances/vm-1"}),
        );
        let ids = node.get_identifiers().unwrap();
        assert_eq!(ids[0].as_deref(), Some("projects/p/zones/z/instances/vm-1"));
        assert!(ids.contains(&Some("https://x/instances/vm-1".to_string())));
        assert!(ids.contains(&Some("vm-1".to_string())));
    }

    #[test]
    fn test_generic_resource_identifiers() {
        let node = Node::new("rootly_incident:42", NodeKind::Resource, json!({"title": "db down"}));
        let ids: Vec<_> = node.get_identifiers().unwrap().into_iter().flatten().collect();
        assert_eq!(ids, vec!["rootly_incident:42"]);
        assert!(node.get_reference_identifiers().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_raw_data() {
        let node = Node::new("disk-1", NodeKind::GcpPersistentDisk, json!("oops"));
        assert!(node.get_identifiers().is_err());
        assert!(node.get_reference_identifiers().is_err());
    }

    #[test]
    fn test_bare_reference_relationship() {
        let reference = Reference::bare("vm-1");
        assert_eq!(reference.relationship(), relationship::RELATED_TO);
        assert_eq!(Reference::bare("").identifier, None);
    }

    #[test]
    fn test_node_record_serialization() {
        let node = Node::new("b", NodeKind::GcpStorageBucket, json!({"name": "b"}));
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["node_type"], "gcp_storage_bucket");
        assert!(value.get("context").is_none());
    }
}
