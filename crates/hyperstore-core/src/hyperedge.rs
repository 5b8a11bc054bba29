//! Hyperedge types

use crate::ids::{HyperedgeId, HyperedgeTypeId, NodeId};
use serde::{Deserialize, Serialize};

/// A typed, ordered N-ary relation among nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperedge {
    /// Internal identifier
    pub id: HyperedgeId,

    /// Hyperedge type
    pub type_id: HyperedgeTypeId,

    /// Public identifier, optional depending on the mapping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_id: Option<String>,

    /// Member nodes in insertion order
    pub node_ids: Vec<NodeId>,

    /// Public ids of the members, parallel to `node_ids`
    pub node_payload_ids: Vec<String>,

    /// Optional weight (`weight` of the payload)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    /// Full payload, only filled in by detailed lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl Hyperedge {
    pub fn arity(&self) -> usize {
        self.node_ids.len()
    }
}

/// Hyperedges of one type, as returned by grouped lookups
#[derive(Debug, Clone, Serialize)]
pub struct HyperedgeGroup {
    pub hyperedge_type: String,
    pub hyperedges: Vec<Hyperedge>,
}
