//! Hypergraph (versioned container) types

use crate::ids::HypergraphId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimal metadata of a stored hypergraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypergraph {
    /// Internal identifier, stable across versioned replacements
    pub id: HypergraphId,

    /// Public identifier, taken from the `_id` of the metadata payload
    pub payload_id: String,

    /// When the hypergraph was first uploaded
    pub stored_at: DateTime<Utc>,

    /// When the hypergraph was last (re)uploaded
    pub updated_at: DateTime<Utc>,
}

/// Hypergraph metadata as read from its metadata file
#[derive(Debug, Clone, PartialEq)]
pub struct HypergraphMetadata {
    pub payload_id: String,
    pub schema_id: String,
    pub payload: serde_json::Value,
}

impl HypergraphMetadata {
    /// Extract the public id and schema reference from a metadata payload.
    ///
    /// Returns `None` when either `_id` or `_schema` is missing.
    pub fn from_payload(payload: serde_json::Value) -> Option<Self> {
        let payload_id = payload.get("_id")?.as_str()?.to_string();
        let schema_id = payload.get("_schema")?.as_str()?.to_string();
        Some(Self {
            payload_id,
            schema_id,
            payload,
        })
    }
}
