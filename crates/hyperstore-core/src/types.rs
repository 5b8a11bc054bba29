//! Schema documents and type declarations

use crate::error::{Error, Result};
use crate::ids::{EdgeTypeId, HyperedgeTypeId, NodeTypeId};
use serde::{Deserialize, Serialize};

/// The three kinds of graph entity a type (and a mapping) can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Node,
    Edge,
    Hyperedge,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Edge => "edge",
            Self::Hyperedge => "hyperedge",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A JSON Schema stored in the registry, keyed by its `$id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub schema_id: String,
    pub body: serde_json::Value,
}

impl SchemaDocument {
    /// Build a document from a parsed JSON Schema.
    ///
    /// The body must declare both `$id` and `$schema`.
    pub fn from_value(body: serde_json::Value, origin: &str) -> Result<Self> {
        let schema_id = body
            .get("$id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Config(format!("Missing $id in {}. Is it a JSON Schema?", origin)))?
            .to_string();
        if body.get("$schema").and_then(|v| v.as_str()).is_none() {
            return Err(Error::Config(format!(
                "Missing $schema in {}. Is it a JSON Schema?",
                origin
            )));
        }
        Ok(Self { schema_id, body })
    }
}

/// Optional weight metadata attached to edge and hyperedge types
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

/// A registered node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeType {
    pub id: NodeTypeId,
    pub name: String,
    pub schema_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// A registered edge type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeType {
    pub id: EdgeTypeId,
    pub name: String,
    pub schema_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub weight: WeightDecl,
    pub from_type: NodeTypeId,
    pub to_type: NodeTypeId,
    pub is_directed: bool,
    pub is_symmetric: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// A registered hyperedge type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperedgeType {
    pub id: HyperedgeTypeId,
    pub name: String,
    pub schema_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub weight: WeightDecl,
    /// Accepted member node types, in declaration order
    pub node_types: Vec<NodeTypeId>,
    pub is_tuple: bool,
    pub is_directed: bool,
    pub is_symmetric: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl HyperedgeType {
    pub fn accepts(&self, node_type: NodeTypeId) -> bool {
        self.node_types.contains(&node_type)
    }
}

/// A type together with how many instances a hypergraph holds
#[derive(Debug, Clone, Serialize)]
pub struct TypeUsage<T> {
    #[serde(flatten)]
    pub declaration: T,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_document_requires_id_and_schema() {
        let doc = SchemaDocument::from_value(
            json!({"$id": "urn:gene", "$schema": "http://json-schema.org/draft-07/schema#"}),
            "gene.json",
        )
        .unwrap();
        assert_eq!(doc.schema_id, "urn:gene");

        assert!(SchemaDocument::from_value(json!({"$schema": "x"}), "a.json").is_err());
        assert!(SchemaDocument::from_value(json!({"$id": "x"}), "a.json").is_err());
    }

    #[test]
    fn test_category_serde() {
        let c: Category = serde_json::from_str("\"hyperedge\"").unwrap();
        assert_eq!(c, Category::Hyperedge);
        assert_eq!(Category::Edge.to_string(), "edge");
    }

    #[test]
    fn test_hyperedge_type_accepts() {
        let het = HyperedgeType {
            id: HyperedgeTypeId(1),
            name: "complex".into(),
            schema_id: "urn:complex".into(),
            description: None,
            weight: WeightDecl::default(),
            node_types: vec![NodeTypeId(1), NodeTypeId(3)],
            is_tuple: false,
            is_directed: false,
            is_symmetric: true,
            payload: None,
        };
        assert!(het.accepts(NodeTypeId(3)));
        assert!(!het.accepts(NodeTypeId(2)));
    }
}
