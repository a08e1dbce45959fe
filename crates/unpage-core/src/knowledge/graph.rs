//! The in-memory knowledge graph.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::edge::{Edge, EdgeKey};
use super::index::{IdentifierIndex, Registration};
use super::node::Node;

/// Directed graph of infrastructure resources.
///
/// Built in two phases: populators call [`Graph::add_node`] concurrently, then
/// [`Graph::infer_edges`] runs once over everything they collected.
///
/// Populators run on a multi-threaded runtime, so the node map and identifier
/// index sit behind one lock. Every method takes the lock for a single
/// synchronous section and never holds it across an `.await`.
#[derive(Debug, Default)]
pub struct Graph {
    state: RwLock<GraphState>,
}

#[derive(Debug, Default)]
struct GraphState {
    nodes: HashMap<String, StoredNode>,
    /// Next insertion sequence number.
    next_seq: u64,
    index: IdentifierIndex,
    edges: BTreeMap<EdgeKey, Edge>,
}

#[derive(Debug)]
struct StoredNode {
    /// Order of first registration; snapshots replay nodes in this order so
    /// identifier ownership survives a reload.
    seq: u64,
    node: Node,
    /// Identifiers derived from `node` when it was last added.
    identifiers: Vec<String>,
}

/// Replay every stored node's identifiers in registration order.
fn rebuild_index(nodes: &HashMap<String, StoredNode>) -> IdentifierIndex {
    let mut stored: Vec<&StoredNode> = nodes.values().collect();
    stored.sort_by_key(|s| s.seq);

    let mut index = IdentifierIndex::new();
    for s in stored {
        for identifier in &s.identifiers {
            index.register(identifier, &s.node.node_id);
        }
    }
    index
}

/// Counters from one inference pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InferenceStats {
    /// Distinct edges after the pass.
    pub edges: usize,
    /// References whose identifier is not in the index.
    pub dangling_references: usize,
    /// References that resolved back to the referencing node.
    pub self_references: usize,
    /// Nodes whose references could not be derived.
    pub failed_nodes: usize,
}

/// Summary of the graph contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub identifiers: usize,
    pub nodes_by_type: BTreeMap<String, usize>,
    pub edges_by_relationship: BTreeMap<String, usize>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node and all of its identifiers.
    ///
    /// Identifiers already owned by a different node are skipped. If
    /// identifier derivation fails the node is stored but owns no
    /// identifiers. No edges are created.
    ///
    /// Re-adding a node id replaces the stored node and keeps its original
    /// registration sequence. When the new payload derives a different
    /// identifier set, the index is rebuilt from every stored node in
    /// sequence order, so ownership always matches what a snapshot reload
    /// would produce.
    pub fn add_node(&self, node: Node) {
        // Derivation is pure, so it runs outside the lock.
        let identifiers: Vec<String> = match node.get_identifiers() {
            Ok(identifiers) => identifiers
                .into_iter()
                .flatten()
                .filter(|identifier| !identifier.is_empty())
                .collect(),
            Err(e) => {
                tracing::warn!(
                    node_id = %node.node_id,
                    node_type = %node.node_type,
                    error = %e,
                    "Skipping identifier indexing for node"
                );
                Vec::new()
            }
        };

        let mut state = self.state.write();
        let GraphState {
            nodes,
            next_seq,
            index,
            ..
        } = &mut *state;

        if let Some(stored) = nodes.get_mut(&node.node_id) {
            let changed = stored.identifiers != identifiers;
            let node_id = node.node_id.clone();
            stored.node = node;
            stored.identifiers = identifiers;
            if changed {
                *index = rebuild_index(nodes);
                tracing::debug!(
                    node_id = %node_id,
                    identifiers = index.len(),
                    "Re-added node with new identifiers; rebuilt index"
                );
            }
            return;
        }

        let mut registered = 0usize;
        for identifier in &identifiers {
            match index.register(identifier, &node.node_id) {
                Registration::Registered => registered += 1,
                Registration::Unchanged => {}
                Registration::Conflict { owner } => {
                    tracing::warn!(
                        identifier = %identifier,
                        owner = %owner,
                        node_id = %node.node_id,
                        "Identifier already registered to another node; keeping first owner"
                    );
                }
            }
        }

        tracing::debug!(
            node_id = %node.node_id,
            node_type = %node.node_type,
            identifiers = registered,
            "Added node"
        );

        let seq = *next_seq;
        *next_seq += 1;
        nodes.insert(
            node.node_id.clone(),
            StoredNode {
                seq,
                node,
                identifiers,
            },
        );
    }

    /// Resolve references into edges, replacing any previous edge set.
    ///
    /// Must run after every populator has finished: identifiers registered
    /// later would be missed. The result depends only on the node set and
    /// the identifier index, never on iteration order.
    pub fn infer_edges(&self) -> InferenceStats {
        let mut state = self.state.write();
        let GraphState {
            nodes,
            index,
            edges,
            ..
        } = &mut *state;

        let mut stats = InferenceStats::default();
        let mut inferred: BTreeMap<EdgeKey, Edge> = BTreeMap::new();

        for StoredNode { node, .. } in nodes.values() {
            let references = match node.get_reference_identifiers() {
                Ok(references) => references,
                Err(e) => {
                    tracing::warn!(
                        node_id = %node.node_id,
                        node_type = %node.node_type,
                        error = %e,
                        "Skipping reference resolution for node"
                    );
                    stats.failed_nodes += 1;
                    continue;
                }
            };

            for reference in references {
                let Some(identifier) = reference.identifier.as_deref() else {
                    continue;
                };
                match index.resolve(identifier) {
                    Some(target) if target == node.node_id => stats.self_references += 1,
                    Some(target) => {
                        let edge = Edge::new(&node.node_id, target, reference.relationship());
                        inferred.entry(edge.key()).or_insert(edge);
                    }
                    None => {
                        tracing::trace!(
                            node_id = %node.node_id,
                            identifier = %identifier,
                            "Reference did not resolve"
                        );
                        stats.dangling_references += 1;
                    }
                }
            }
        }

        stats.edges = inferred.len();
        *edges = inferred;

        tracing::info!(
            edges = stats.edges,
            dangling = stats.dangling_references,
            failed_nodes = stats.failed_nodes,
            "Inferred edges"
        );

        stats
    }

    /// A copy of the node with this id.
    pub fn get_node(&self, node_id: &str) -> Option<Node> {
        self.state
            .read()
            .nodes
            .get(node_id)
            .map(|stored| stored.node.clone())
    }

    pub fn contains_node(&self, node_id: &str) -> bool {
        self.state.read().nodes.contains_key(node_id)
    }

    /// Node id owning `identifier`.
    pub fn resolve(&self, identifier: &str) -> Option<String> {
        self.state.read().index.resolve(identifier).map(str::to_string)
    }

    /// The node owning `identifier`.
    pub fn find_node(&self, identifier: &str) -> Option<Node> {
        let state = self.state.read();
        let node_id = state.index.resolve(identifier)?;
        state.nodes.get(node_id).map(|stored| stored.node.clone())
    }

    /// Identifiers currently owned by `node_id`.
    pub fn identifiers_of(&self, node_id: &str) -> Vec<String> {
        self.state
            .read()
            .index
            .identifiers_of(node_id)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// All nodes in first-registration order.
    pub fn iter_nodes(&self) -> Vec<Node> {
        let state = self.state.read();
        let mut stored: Vec<&StoredNode> = state.nodes.values().collect();
        stored.sort_by_key(|s| s.seq);
        stored.into_iter().map(|s| s.node.clone()).collect()
    }

    /// All edges, ordered by (source, target, relationship type).
    pub fn edges(&self) -> Vec<Edge> {
        self.state.read().edges.values().cloned().collect()
    }

    /// Edges leaving `node_id`.
    pub fn outgoing_edges(&self, node_id: &str) -> Vec<Edge> {
        self.state
            .read()
            .edges
            .values()
            .filter(|e| e.source_node_id == node_id)
            .cloned()
            .collect()
    }

    /// Edges arriving at `node_id`.
    pub fn incoming_edges(&self, node_id: &str) -> Vec<Edge> {
        self.state
            .read()
            .edges
            .values()
            .filter(|e| e.target_node_id == node_id)
            .cloned()
            .collect()
    }

    /// Node ids connected to `node_id` in either direction.
    pub fn neighbors(&self, node_id: &str) -> Vec<String> {
        let state = self.state.read();
        let neighbors: BTreeSet<&str> = state
            .edges
            .values()
            .filter_map(|e| {
                if e.source_node_id == node_id {
                    Some(e.target_node_id.as_str())
                } else if e.target_node_id == node_id {
                    Some(e.source_node_id.as_str())
                } else {
                    None
                }
            })
            .collect();
        neighbors.into_iter().map(str::to_string).collect()
    }

    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.state.read().edges.len()
    }

    pub fn identifier_count(&self) -> usize {
        self.state.read().index.len()
    }

    /// Counts by node type and relationship type.
    pub fn stats(&self) -> GraphStats {
        let state = self.state.read();

        let mut nodes_by_type = BTreeMap::new();
        for stored in state.nodes.values() {
            *nodes_by_type
                .entry(stored.node.node_type.tag().to_string())
                .or_insert(0) += 1;
        }

        let mut edges_by_relationship = BTreeMap::new();
        for edge in state.edges.values() {
            *edges_by_relationship
                .entry(edge.relationship_type().to_string())
                .or_insert(0) += 1;
        }

        GraphStats {
            nodes: state.nodes.len(),
            edges: state.edges.len(),
            identifiers: state.index.len(),
            nodes_by_type,
            edges_by_relationship,
        }
    }

    /// Replace the edge set with edges read from a snapshot.
    ///
    /// Edges whose endpoints are not both present are dropped.
    pub(crate) fn restore_edges(&self, restored: Vec<Edge>) -> usize {
        let mut state = self.state.write();
        let GraphState { nodes, edges, .. } = &mut *state;

        let mut kept = BTreeMap::new();
        for edge in restored {
            if nodes.contains_key(&edge.source_node_id) && nodes.contains_key(&edge.target_node_id)
            {
                kept.entry(edge.key()).or_insert(edge);
            } else {
                tracing::warn!(
                    source = %edge.source_node_id,
                    target = %edge.target_node_id,
                    "Dropping snapshot edge with unknown endpoint"
                );
            }
        }

        *edges = kept;
        edges.len()
    }
}
