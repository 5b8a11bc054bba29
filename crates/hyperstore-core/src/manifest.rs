//! Metadata and data manifests
//!
//! A metadata manifest declares JSON Schemas and the node, edge and
//! hyperedge types using them. A data manifest lists hypergraphs to load,
//! each with its metadata file and the tabular files feeding it. Both are
//! checked against built-in meta-schemas before they are deserialized.

use crate::error::{Error, Result};
use crate::mapping::MappingDescriptor;
use crate::types::WeightDecl;
use crate::validation::PayloadValidator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Meta-schema of metadata manifests
pub const METADATA_MANIFEST_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "$id": "urn:hyperstore:metadata-manifest",
  "type": "object",
  "definitions": {
    "name": { "type": "string", "minLength": 1 },
    "weight": {
      "type": "object",
      "properties": {
        "name": { "type": "string" },
        "desc": { "type": "string" }
      },
      "additionalProperties": false
    }
  },
  "properties": {
    "schemas": {
      "type": "array",
      "items": { "type": "string", "minLength": 1 }
    },
    "node_types": {
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "name": { "$ref": "#/definitions/name" },
          "desc": { "type": "string" },
          "schema_id": { "$ref": "#/definitions/name" }
        },
        "required": ["name", "schema_id"]
      }
    },
    "edge_types": {
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "name": { "$ref": "#/definitions/name" },
          "desc": { "type": "string" },
          "schema_id": { "$ref": "#/definitions/name" },
          "node_type_a": { "$ref": "#/definitions/name" },
          "node_type_b": { "$ref": "#/definitions/name" },
          "is_directed": { "type": "boolean" },
          "is_symmetric": { "type": "boolean" },
          "weight": { "$ref": "#/definitions/weight" }
        },
        "required": ["name", "schema_id", "node_type_a", "node_type_b"]
      }
    },
    "hyperedge_types": {
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "name": { "$ref": "#/definitions/name" },
          "desc": { "type": "string" },
          "schema_id": { "$ref": "#/definitions/name" },
          "node_types": {
            "type": "array",
            "items": { "$ref": "#/definitions/name" },
            "minItems": 1
          },
          "is_tuple": { "type": "boolean" },
          "is_directed": { "type": "boolean" },
          "is_symmetric": { "type": "boolean" },
          "weight": { "$ref": "#/definitions/weight" }
        },
        "required": ["name", "schema_id", "node_types"]
      }
    }
  }
}"##;

/// Meta-schema of data manifests
pub const DATA_MANIFEST_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "$id": "urn:hyperstore:data-manifest",
  "type": "object",
  "definitions": {
    "expr": {
      "oneOf": [
        { "type": "string", "minLength": 1 },
        { "type": "array", "items": { "type": "string", "minLength": 1 }, "minItems": 1 }
      ]
    },
    "conditions": {
      "type": "array",
      "items": { "type": "object", "minProperties": 1 }
    },
    "class": { "enum": ["node", "edge", "hyperedge"] },
    "mapping": {
      "type": "object",
      "properties": {
        "class": { "$ref": "#/definitions/class" },
        "type": { "type": "string", "minLength": 1 },
        "key": { "$ref": "#/definitions/expr" },
        "join": { "$ref": "#/definitions/expr" },
        "key_f": { "$ref": "#/definitions/expr" },
        "key_t": { "$ref": "#/definitions/expr" },
        "keys": {
          "type": "array",
          "minItems": 1,
          "items": {
            "type": "object",
            "properties": {
              "class": { "$ref": "#/definitions/class" },
              "type": { "type": "string", "minLength": 1 },
              "key": { "$ref": "#/definitions/expr" }
            },
            "required": ["class", "type", "key"]
          }
        },
        "mappings": { "type": ["object", "array"] },
        "switch": {
          "type": "object",
          "properties": {
            "when": {
              "type": "array",
              "items": {
                "type": "object",
                "properties": {
                  "property": {},
                  "value": {},
                  "mappings": { "type": ["object", "array"] }
                },
                "required": ["property", "value", "mappings"]
              }
            },
            "default": {
              "type": "object",
              "properties": {
                "mappings": { "type": ["object", "array"] }
              },
              "required": ["mappings"]
            }
          }
        },
        "filter_in": { "$ref": "#/definitions/conditions" },
        "filter_out": { "$ref": "#/definitions/conditions" },
        "unpack": {
          "type": "array",
          "items": {
            "type": "object",
            "properties": {
              "val": { "type": "string", "minLength": 1 },
              "split": { "$ref": "#/definitions/expr" }
            },
            "required": ["val", "split"]
          }
        }
      },
      "required": ["class", "type"],
      "allOf": [
        {
          "if": { "properties": { "class": { "const": "node" } } },
          "then": { "anyOf": [ { "required": ["key"] }, { "required": ["join"] } ] }
        },
        {
          "if": { "properties": { "class": { "const": "edge" } } },
          "then": { "anyOf": [ { "required": ["key_f", "key_t"] }, { "required": ["join"] } ] }
        },
        {
          "if": { "properties": { "class": { "const": "hyperedge" } } },
          "then": { "anyOf": [ { "required": ["keys"] }, { "required": ["join"] } ] }
        }
      ]
    }
  },
  "properties": {
    "hypergraphs": {
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "metafile": { "type": "string", "minLength": 1 },
          "datafiles": {
            "type": "array",
            "items": {
              "type": "object",
              "properties": {
                "file": { "type": "string", "minLength": 1 },
                "maps": {
                  "type": "array",
                  "items": { "$ref": "#/definitions/mapping" }
                }
              },
              "required": ["file", "maps"]
            }
          }
        },
        "required": ["metafile", "datafiles"]
      }
    }
  },
  "required": ["hypergraphs"]
}"##;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTypeDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    pub schema_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeTypeDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    pub schema_id: String,
    pub node_type_a: String,
    pub node_type_b: String,
    #[serde(default)]
    pub is_directed: bool,
    #[serde(default)]
    pub is_symmetric: bool,
    #[serde(default)]
    pub weight: WeightDecl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HyperedgeTypeDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    pub schema_id: String,
    pub node_types: Vec<String>,
    #[serde(default)]
    pub is_tuple: bool,
    #[serde(default)]
    pub is_directed: bool,
    #[serde(default)]
    pub is_symmetric: bool,
    #[serde(default)]
    pub weight: WeightDecl,
}

/// Schemas and type declarations to register.
///
/// Only built from a document that passed the metadata meta-schema.
#[derive(Debug, Clone, Serialize)]
pub struct MetadataManifest {
    schemas: Vec<String>,
    node_types: Vec<NodeTypeDecl>,
    edge_types: Vec<EdgeTypeDecl>,
    hyperedge_types: Vec<HyperedgeTypeDecl>,
}

#[derive(Deserialize)]
struct MetadataDocument {
    #[serde(default)]
    schemas: Vec<String>,
    #[serde(default)]
    node_types: Vec<NodeTypeDecl>,
    #[serde(default)]
    edge_types: Vec<EdgeTypeDecl>,
    #[serde(default)]
    hyperedge_types: Vec<HyperedgeTypeDecl>,
}

impl MetadataManifest {
    /// Check a parsed document against the meta-schema, then deserialize it
    pub fn from_value(value: Value) -> Result<Self> {
        check_manifest("Metadata", METADATA_MANIFEST_SCHEMA, &value)?;
        let doc: MetadataDocument = serde_json::from_value(value)?;
        Ok(Self {
            schemas: doc.schemas,
            node_types: doc.node_types,
            edge_types: doc.edge_types,
            hyperedge_types: doc.hyperedge_types,
        })
    }

    /// Read a manifest file (JSON or YAML)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_value(load_document(path.as_ref())?)
    }

    /// Schema file paths, relative to the manifest directory
    pub fn schemas(&self) -> &[String] {
        &self.schemas
    }

    pub fn node_types(&self) -> &[NodeTypeDecl] {
        &self.node_types
    }

    pub fn edge_types(&self) -> &[EdgeTypeDecl] {
        &self.edge_types
    }

    pub fn hyperedge_types(&self) -> &[HyperedgeTypeDecl] {
        &self.hyperedge_types
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFileDecl {
    /// Path relative to the hypergraph metadata file
    pub file: String,
    pub maps: Vec<MappingDescriptor>,
}

/// One hypergraph of a data manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypergraphDecl {
    /// Path of the metadata file, relative to the data manifest
    pub metafile: String,
    pub datafiles: Vec<DataFileDecl>,
}

/// Hypergraphs to load, in order. Like [`MetadataManifest`], only built
/// from a checked document.
#[derive(Debug, Clone, Serialize)]
pub struct DataManifest {
    hypergraphs: Vec<HypergraphDecl>,
}

#[derive(Deserialize)]
struct DataDocument {
    hypergraphs: Vec<HypergraphDecl>,
}

impl DataManifest {
    pub fn from_value(value: Value) -> Result<Self> {
        check_manifest("Data", DATA_MANIFEST_SCHEMA, &value)?;
        let doc: DataDocument = serde_json::from_value(value)?;
        Ok(Self {
            hypergraphs: doc.hypergraphs,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_value(load_document(path.as_ref())?)
    }

    pub fn hypergraphs(&self) -> &[HypergraphDecl] {
        &self.hypergraphs
    }
}

fn check_manifest(kind: &str, meta_schema: &str, document: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(meta_schema)?;
    let validator = PayloadValidator::from_value(&format!("{} manifest", kind), &schema)?;
    let errors = validator.violations(document);
    if errors.is_empty() {
        return Ok(());
    }
    for (i, error) in errors.iter().enumerate() {
        tracing::error!("ERROR {} in {} manifest: {}", i, kind.to_lowercase(), error);
    }
    Err(Error::InvalidManifest {
        manifest: kind.to_string(),
        errors,
    })
}

/// Parse a JSON or YAML document; `.json` files are read as JSON, anything
/// else as YAML
pub fn load_document(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(&text)?)
    } else {
        Ok(serde_yaml::from_str(&text)?)
    }
}

/// Resolve a manifest reference against the directory it is relative to
pub fn resolve_path(base: &Path, reference: &str) -> PathBuf {
    let path = Path::new(reference);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Directory a manifest file's relative references are resolved against
pub fn base_dir(path: &Path) -> PathBuf {
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use serde_json::json;

    #[test]
    fn test_metadata_manifest_parses() {
        let manifest = MetadataManifest::from_value(json!({
            "schemas": ["gene.json"],
            "node_types": [{"name": "gene", "desc": "Genes", "schema_id": "urn:gene"}],
            "edge_types": [{
                "name": "interacts",
                "schema_id": "urn:interaction",
                "node_type_a": "gene",
                "node_type_b": "gene",
                "is_directed": true,
                "is_symmetric": false,
                "weight": {"name": "score"}
            }],
            "hyperedge_types": [{
                "name": "complex",
                "schema_id": "urn:complex",
                "node_types": ["gene"]
            }]
        }))
        .unwrap();
        assert_eq!(manifest.node_types()[0].name, "gene");
        assert!(manifest.edge_types()[0].is_directed);
        assert_eq!(manifest.edge_types()[0].weight.name.as_deref(), Some("score"));
        assert!(!manifest.hyperedge_types()[0].is_tuple);
    }

    #[test]
    fn test_metadata_manifest_rejects_missing_fields() {
        let err = MetadataManifest::from_value(json!({
            "edge_types": [{"name": "interacts", "schema_id": "urn:i"}]
        }))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidManifest { .. }));
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
    }

    #[test]
    fn test_data_manifest_parses() {
        let manifest = DataManifest::from_value(json!({
            "hypergraphs": [{
                "metafile": "meta.yaml",
                "datafiles": [{
                    "file": "genes.tsv",
                    "maps": [
                        {"class": "node", "type": "gene", "key": "id", "mappings": {"\"name\"": "symbol"}},
                        {"class": "edge", "type": "interacts", "key_f": "a", "key_t": "b"}
                    ]
                }]
            }]
        }))
        .unwrap();
        let maps = &manifest.hypergraphs()[0].datafiles[0].maps;
        assert_eq!(maps[0].class, Category::Node);
        assert_eq!(maps[1].type_name, "interacts");
    }

    #[test]
    fn test_data_manifest_edge_needs_endpoints_or_join() {
        let err = DataManifest::from_value(json!({
            "hypergraphs": [{
                "metafile": "meta.yaml",
                "datafiles": [{
                    "file": "genes.tsv",
                    "maps": [{"class": "edge", "type": "interacts", "key_f": "a"}]
                }]
            }]
        }))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidManifest { .. }));
    }

    #[test]
    fn test_load_yaml_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.yaml");
        std::fs::write(&path, "_id: comorbidities\n_schema: urn:hg\nyear: 2020\n").unwrap();
        let doc = load_document(&path).unwrap();
        assert_eq!(doc["_id"], "comorbidities");
        assert_eq!(doc["year"], 2020);
    }

    #[test]
    fn test_resolve_path() {
        let base = Path::new("/data/manifests");
        assert_eq!(resolve_path(base, "genes.tsv"), PathBuf::from("/data/manifests/genes.tsv"));
        assert_eq!(resolve_path(base, "/abs/genes.tsv"), PathBuf::from("/abs/genes.tsv"));
        assert_eq!(base_dir(Path::new("/data/m.yaml")), PathBuf::from("/data"));
    }
}
