//! Resource kinds of the infrastructure knowledge graph.
//!
//! Every node carries a [`NodeKind`] tag. The tag decides how identifiers and
//! references are derived from the node's raw payload. Derivation is layered:
//!
//! - **Generic**: the node id itself
//! - **Provider base**: e.g. GCP `selfLink`, Azure resource id and name
//! - **Kind specific**: IP addresses, attached disks, forwarding targets, ...
//!
//! Each layer appends to the output of the layer before it.

mod azure;
mod gcp;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::KnowledgeError;
use super::payload::Payload;
use super::Reference;

/// Relationship types produced by the built-in node kinds.
pub mod relationship {
    /// Used for references that carry no explicit type.
    pub const RELATED_TO: &str = "related_to";
    pub const ATTACHED_TO: &str = "attached_to";
    pub const HAS_DISK: &str = "has_disk";
    pub const FORWARDS_TO: &str = "forwards_to";
    pub const ROUTES_TO: &str = "routes_to";
    pub const USES_DISK_ACCESS: &str = "uses_disk_access";
}

/// Cloud or vendor a node kind belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Generic,
    Gcp,
    Azure,
}

/// Concrete resource kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Any resource without kind-specific identifiers (incidents, alerts, ...)
    Resource,
    GcpComputeInstance,
    GcpPersistentDisk,
    GcpStorageBucket,
    GcpSqlInstance,
    GcpForwardingRule,
    GcpBackendService,
    AzureManagedDisk,
}

impl NodeKind {
    /// All kinds, in declaration order.
    pub const ALL: &'static [NodeKind] = &[
        NodeKind::Resource,
        NodeKind::GcpComputeInstance,
        NodeKind::GcpPersistentDisk,
        NodeKind::GcpStorageBucket,
        NodeKind::GcpSqlInstance,
        NodeKind::GcpForwardingRule,
        NodeKind::GcpBackendService,
        NodeKind::AzureManagedDisk,
    ];

    /// The tag stored in snapshots and inventory files.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::GcpComputeInstance => "gcp_compute_instance",
            Self::GcpPersistentDisk => "gcp_persistent_disk",
            Self::GcpStorageBucket => "gcp_storage_bucket",
            Self::GcpSqlInstance => "gcp_sql_instance",
            Self::GcpForwardingRule => "gcp_forwarding_rule",
            Self::GcpBackendService => "gcp_backend_service",
            Self::AzureManagedDisk => "azure_managed_disk",
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            Self::Resource => Provider::Generic,
            Self::GcpComputeInstance
            | Self::GcpPersistentDisk
            | Self::GcpStorageBucket
            | Self::GcpSqlInstance
            | Self::GcpForwardingRule
            | Self::GcpBackendService => Provider::Gcp,
            Self::AzureManagedDisk => Provider::Azure,
        }
    }

    /// Provider-base and kind-specific identifiers.
    pub(crate) fn identifiers(
        &self,
        payload: &Payload<'_>,
    ) -> Result<Vec<Option<String>>, KnowledgeError> {
        let mut identifiers = match self.provider() {
            Provider::Generic => Vec::new(),
            Provider::Gcp => gcp::base_identifiers(payload),
            Provider::Azure => azure::base_identifiers(payload),
        };

        identifiers.extend(match self {
            Self::Resource => Vec::new(),
            Self::GcpComputeInstance => gcp::compute_instance_identifiers(payload)?,
            Self::GcpPersistentDisk | Self::GcpStorageBucket | Self::GcpBackendService => {
                gcp::named_resource_identifiers(payload)
            }
            Self::GcpSqlInstance => gcp::sql_instance_identifiers(payload)?,
            Self::GcpForwardingRule => gcp::forwarding_rule_identifiers(payload),
            Self::AzureManagedDisk => azure::managed_disk_identifiers(payload)?,
        });

        Ok(identifiers)
    }

    /// Provider-base and kind-specific outbound references.
    pub(crate) fn references(&self, payload: &Payload<'_>) -> Result<Vec<Reference>, KnowledgeError> {
        // No provider base layer contributes references today.
        let references = match self {
            Self::Resource | Self::GcpStorageBucket | Self::GcpSqlInstance => Vec::new(),
            Self::GcpComputeInstance => gcp::compute_instance_references(payload)?,
            Self::GcpPersistentDisk => gcp::persistent_disk_references(payload)?,
            Self::GcpForwardingRule => gcp::forwarding_rule_references(payload),
            Self::GcpBackendService => gcp::backend_service_references(payload)?,
            Self::AzureManagedDisk => azure::managed_disk_references(payload),
        };
        Ok(references)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for NodeKind {
    type Err = KnowledgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| KnowledgeError::UnknownNodeType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(kind.tag().parse::<NodeKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn test_serde_tag_matches_tag() {
        for kind in NodeKind::ALL {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.tag()));
        }
    }

    #[test]
    fn test_unknown_tag() {
        let err = "aws_ec2_instance".parse::<NodeKind>().unwrap_err();
        assert!(matches!(err, KnowledgeError::UnknownNodeType(t) if t == "aws_ec2_instance"));
    }
}
