//! Node types

use crate::ids::{NodeId, NodeTypeId};
use serde::{Deserialize, Serialize};

/// A node of a hypergraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Internal identifier
    pub id: NodeId,

    /// Node type
    pub type_id: NodeTypeId,

    /// Public identifier (`_id` of the payload)
    pub payload_id: String,

    /// Display name (`name` of the payload)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Full payload, only filled in by detailed lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// Nodes of one type, as returned by grouped lookups
#[derive(Debug, Clone, Serialize)]
pub struct NodeGroup {
    pub node_type: String,
    pub nodes: Vec<Node>,
}

/// A node tagged with the name of its type
#[derive(Debug, Clone, Serialize)]
pub struct TypedNode {
    pub node_type: String,
    #[serde(flatten)]
    pub node: Node,
}

/// Set-membership filter over nodes of one type.
///
/// Values inside one filter kind are ORed, different kinds are ANDed. An
/// empty filter matches every node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeFilter {
    #[serde(default)]
    pub payload_ids: Vec<String>,
    #[serde(default)]
    pub internal_ids: Vec<NodeId>,
    #[serde(default)]
    pub names: Vec<String>,
}

impl NodeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload_id(mut self, id: impl Into<String>) -> Self {
        self.payload_ids.push(id.into());
        self
    }

    pub fn with_internal_id(mut self, id: NodeId) -> Self {
        self.internal_ids.push(id);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.payload_ids.is_empty() && self.internal_ids.is_empty() && self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_filter_builder() {
        let filter = NodeFilter::new()
            .with_payload_id("BRCA1")
            .with_payload_id("TP53")
            .with_name("tumor protein");
        assert_eq!(filter.payload_ids.len(), 2);
        assert_eq!(filter.names.len(), 1);
        assert!(!filter.is_empty());
        assert!(NodeFilter::new().is_empty());
    }
}
