//! Identifier index: any known identifier -> owning node id.

use std::collections::HashMap;

/// Outcome of registering one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The identifier was new and now belongs to the node.
    Registered,
    /// The node already owned it.
    Unchanged,
    /// Another node registered it first and keeps it.
    Conflict { owner: String },
}

/// Exact-match, case-sensitive mapping from identifier to node id.
///
/// First registration wins: a later node claiming an identifier that is
/// already owned is rejected, so a resolved edge target never moves.
#[derive(Debug, Default, Clone)]
pub struct IdentifierIndex {
    owners: HashMap<String, String>,
}

impl IdentifierIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, identifier: &str, node_id: &str) -> Registration {
        match self.owners.get(identifier) {
            Some(owner) if owner == node_id => Registration::Unchanged,
            Some(owner) => Registration::Conflict {
                owner: owner.clone(),
            },
            None => {
                self.owners
                    .insert(identifier.to_string(), node_id.to_string());
                Registration::Registered
            }
        }
    }

    /// Node id owning `identifier`, if any.
    pub fn resolve(&self, identifier: &str) -> Option<&str> {
        self.owners.get(identifier).map(String::as_str)
    }

    /// Identifiers owned by `node_id`, sorted.
    pub fn identifiers_of(&self, node_id: &str) -> Vec<&str> {
        let mut identifiers: Vec<&str> = self
            .owners
            .iter()
            .filter(|(_, owner)| owner.as_str() == node_id)
            .map(|(identifier, _)| identifier.as_str())
            .collect();
        identifiers.sort_unstable();
        identifiers
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
