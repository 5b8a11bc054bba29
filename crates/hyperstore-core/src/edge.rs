//! Edge types

use crate::ids::{EdgeId, EdgeTypeId, NodeId};
use serde::{Deserialize, Serialize};

/// Direction for adjacency lookups, relative to the queried node set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Edges leaving the nodes (`from` side)
    #[default]
    Outgoing,
    /// Edges arriving at the nodes (`to` side)
    Incoming,
}

/// Which end of an edge to report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    From,
    To,
}

/// A directed, typed edge between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Internal identifier
    pub id: EdgeId,

    /// Edge type
    pub type_id: EdgeTypeId,

    /// Public identifier, optional depending on the mapping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_id: Option<String>,

    /// Source node
    pub from_id: NodeId,

    /// Target node
    pub to_id: NodeId,

    /// Public id of the source node
    pub from_payload_id: String,

    /// Public id of the target node
    pub to_payload_id: String,

    /// Optional weight (`weight` of the payload)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    /// Full payload, only filled in by detailed lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// Edges of one type, as returned by grouped lookups
#[derive(Debug, Clone, Serialize)]
pub struct EdgeGroup {
    pub edge_type: String,
    pub edges: Vec<Edge>,
}

/// Filter over edges or hyperedges of one type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_id: Option<String>,
}

impl RecordFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_internal_id(id: impl Into<i64>) -> Self {
        Self {
            internal_id: Some(id.into()),
            payload_id: None,
        }
    }

    pub fn by_payload_id(id: impl Into<String>) -> Self {
        Self {
            internal_id: None,
            payload_id: Some(id.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serde() {
        let d: Direction = serde_json::from_str("\"incoming\"").unwrap();
        assert_eq!(d, Direction::Incoming);
        assert_eq!(Direction::default(), Direction::Outgoing);
    }

    #[test]
    fn test_record_filter() {
        let f = RecordFilter::by_payload_id("e1");
        assert_eq!(f.payload_id.as_deref(), Some("e1"));
        assert!(f.internal_id.is_none());
        assert!(RecordFilter::all().payload_id.is_none());
    }
}
