//! Knowledge graph of cloud infrastructure.
//!
//! This module turns overlapping resource descriptions from many providers
//! into one directed graph:
//! - **Identity resolution** via an identifier index (ARNs, IPs, names, URLs)
//! - **Edge inference** from the references each resource declares
//! - **Snapshots** so a built graph can be reloaded without re-querying providers
//!
//! # Components
//!
//! - [`Graph`] - Node map, identifier index and edge set
//! - [`Node`] - One resource: id, [`NodeKind`] tag and raw payload
//! - [`Edge`] - Typed relationship between two node ids
//! - [`IdentifierIndex`] - First-writer-wins identifier ownership
//!
//! # Example
//!
//! ```ignore
//! use unpage_core::knowledge::{Graph, Node, NodeKind};
//!
//! let graph = Graph::new();
//! graph.add_node(Node::new("vm-1", NodeKind::GcpComputeInstance, instance_json));
//! graph.add_node(Node::new("disk-1", NodeKind::GcpPersistentDisk, disk_json));
//! graph.infer_edges();
//! graph.save(Path::new("graph.json"))?;
//! ```

mod edge;
mod error;
mod graph;
mod index;
mod node;
pub mod ontology;
mod payload;
mod snapshot;

pub use edge::{Edge, EdgeKey, EdgeProperties};
pub use error::KnowledgeError;
pub use graph::{Graph, GraphStats, InferenceStats};
pub use index::{IdentifierIndex, Registration};
pub use node::{Node, Reference};
pub use ontology::{relationship, NodeKind, Provider};
pub use snapshot::{GraphSnapshot, SNAPSHOT_VERSION};
