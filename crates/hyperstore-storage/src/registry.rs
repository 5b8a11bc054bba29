//! Schema & type registry
//!
//! Schemas and type declarations come from metadata manifests. A manifest is
//! registered in a single transaction: any missing reference, or a duplicate
//! under [`DuplicatePolicy::Reject`], leaves the store untouched.

use crate::error::{StorageError, StorageResult};
use crate::store::{json_column, HypergraphStore};
use hyperstore_core::manifest::{base_dir, load_document, resolve_path};
use hyperstore_core::{
    Category, EdgeType, EdgeTypeId, HyperedgeType, HyperedgeTypeId, MetadataManifest, NodeType,
    NodeTypeId, PayloadValidator, SchemaDocument, TypeCatalog, WeightDecl,
};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// What to do when a schema id or type name is already registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Fail the whole manifest
    #[default]
    Reject,
    /// Log and ignore the duplicate
    Skip,
}

/// Newly stored items of one manifest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub schemas: usize,
    pub node_types: usize,
    pub edge_types: usize,
    pub hyperedge_types: usize,
}

/// Every registered type, indexed by name and internal id
#[derive(Debug, Default)]
pub struct TypeIndex {
    node_types: Vec<NodeType>,
    edge_types: Vec<EdgeType>,
    hyperedge_types: Vec<HyperedgeType>,
    node_names: HashMap<String, usize>,
    edge_names: HashMap<String, usize>,
    hyperedge_names: HashMap<String, usize>,
    node_ids: HashMap<NodeTypeId, usize>,
    edge_ids: HashMap<EdgeTypeId, usize>,
    hyperedge_ids: HashMap<HyperedgeTypeId, usize>,
}

impl TypeIndex {
    pub(crate) fn load(conn: &Connection) -> StorageResult<Self> {
        let mut index = Self::default();

        let mut stmt = conn.prepare(
            "SELECT nt_id, nt_name, node_schema_id, nt_desc, payload FROM node_type ORDER BY nt_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(NodeType {
                id: NodeTypeId(row.get(0)?),
                name: row.get(1)?,
                schema_id: row.get(2)?,
                description: row.get(3)?,
                payload: optional_json(row, 4)?,
            })
        })?;
        for row in rows {
            let node_type = row?;
            index.node_names.insert(node_type.name.clone(), index.node_types.len());
            index.node_ids.insert(node_type.id, index.node_types.len());
            index.node_types.push(node_type);
        }

        let mut stmt = conn.prepare(
            "SELECT et_id, et_name, edge_schema_id, et_desc, weight_name, weight_desc, \
             a_nt_id, b_nt_id, is_directed, is_symmetric, payload FROM edge_type ORDER BY et_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(EdgeType {
                id: EdgeTypeId(row.get(0)?),
                name: row.get(1)?,
                schema_id: row.get(2)?,
                description: row.get(3)?,
                weight: WeightDecl {
                    name: row.get(4)?,
                    desc: row.get(5)?,
                },
                from_type: NodeTypeId(row.get(6)?),
                to_type: NodeTypeId(row.get(7)?),
                is_directed: row.get(8)?,
                is_symmetric: row.get(9)?,
                payload: optional_json(row, 10)?,
            })
        })?;
        for row in rows {
            let edge_type = row?;
            index.edge_names.insert(edge_type.name.clone(), index.edge_types.len());
            index.edge_ids.insert(edge_type.id, index.edge_types.len());
            index.edge_types.push(edge_type);
        }

        let mut members: HashMap<i64, Vec<NodeTypeId>> = HashMap::new();
        let mut stmt =
            conn.prepare("SELECT het_id, nt_id FROM hyperedge_type_node_type ORDER BY het_nt_id")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (het_id, nt_id) = row?;
            members.entry(het_id).or_default().push(NodeTypeId(nt_id));
        }

        let mut stmt = conn.prepare(
            "SELECT het_id, het_name, hyperedge_schema_id, het_desc, weight_name, weight_desc, \
             is_tuple, is_directed, is_symmetric, payload FROM hyperedge_type ORDER BY het_id",
        )?;
        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            Ok(HyperedgeType {
                id: HyperedgeTypeId(id),
                name: row.get(1)?,
                schema_id: row.get(2)?,
                description: row.get(3)?,
                weight: WeightDecl {
                    name: row.get(4)?,
                    desc: row.get(5)?,
                },
                node_types: members.get(&id).cloned().unwrap_or_default(),
                is_tuple: row.get(6)?,
                is_directed: row.get(7)?,
                is_symmetric: row.get(8)?,
                payload: optional_json(row, 9)?,
            })
        })?;
        for row in rows {
            let hyperedge_type = row?;
            index
                .hyperedge_names
                .insert(hyperedge_type.name.clone(), index.hyperedge_types.len());
            index
                .hyperedge_ids
                .insert(hyperedge_type.id, index.hyperedge_types.len());
            index.hyperedge_types.push(hyperedge_type);
        }

        tracing::debug!(
            "Loaded {} node types, {} edge types and {} hyperedge types",
            index.node_types.len(),
            index.edge_types.len(),
            index.hyperedge_types.len()
        );
        Ok(index)
    }

    pub fn node_types(&self) -> &[NodeType] {
        &self.node_types
    }

    pub fn edge_types(&self) -> &[EdgeType] {
        &self.edge_types
    }

    pub fn hyperedge_types(&self) -> &[HyperedgeType] {
        &self.hyperedge_types
    }

    pub fn node_type(&self, name: &str) -> Option<&NodeType> {
        self.node_names.get(name).map(|&i| &self.node_types[i])
    }

    pub fn edge_type(&self, name: &str) -> Option<&EdgeType> {
        self.edge_names.get(name).map(|&i| &self.edge_types[i])
    }

    pub fn hyperedge_type(&self, name: &str) -> Option<&HyperedgeType> {
        self.hyperedge_names.get(name).map(|&i| &self.hyperedge_types[i])
    }

    pub fn node_type_by_id(&self, id: NodeTypeId) -> Option<&NodeType> {
        self.node_ids.get(&id).map(|&i| &self.node_types[i])
    }

    pub fn edge_type_by_id(&self, id: EdgeTypeId) -> Option<&EdgeType> {
        self.edge_ids.get(&id).map(|&i| &self.edge_types[i])
    }

    pub fn hyperedge_type_by_id(&self, id: HyperedgeTypeId) -> Option<&HyperedgeType> {
        self.hyperedge_ids.get(&id).map(|&i| &self.hyperedge_types[i])
    }

    /// Name of a node type, empty for unknown ids
    pub(crate) fn node_type_name(&self, id: NodeTypeId) -> String {
        self.node_type_by_id(id)
            .map(|t| t.name.clone())
            .unwrap_or_default()
    }
}

impl TypeCatalog for TypeIndex {
    fn type_id(&self, category: Category, name: &str) -> Option<i64> {
        match category {
            Category::Node => self.node_type(name).map(|t| t.id.get()),
            Category::Edge => self.edge_type(name).map(|t| t.id.get()),
            Category::Hyperedge => self.hyperedge_type(name).map(|t| t.id.get()),
        }
    }
}

fn optional_json(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<Value>> {
    match row.get_ref(idx)? {
        rusqlite::types::ValueRef::Null => Ok(None),
        _ => json_column(row, idx).map(Some),
    }
}

/// Body of a registered schema
pub(crate) fn load_schema(conn: &Connection, schema_id: &str) -> StorageResult<Option<Value>> {
    let text: Option<String> = conn
        .query_row(
            "SELECT payload FROM json_schemas WHERE schema_id = ?1",
            params![schema_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(text.map(|t| serde_json::from_str(&t)).transpose()?)
}

fn exists(conn: &Connection, sql: &str, key: &str) -> StorageResult<bool> {
    Ok(conn
        .query_row(sql, params![key], |_| Ok(()))
        .optional()?
        .is_some())
}

fn schema_exists(conn: &Connection, schema_id: &str) -> StorageResult<bool> {
    exists(conn, "SELECT 1 FROM json_schemas WHERE schema_id = ?1", schema_id)
}

fn node_type_id(conn: &Connection, name: &str) -> StorageResult<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT nt_id FROM node_type WHERE nt_name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?)
}

/// Tracks names seen so far and applies the duplicate policy
struct Dedup {
    what: &'static str,
    policy: DuplicatePolicy,
    seen: HashSet<String>,
}

impl Dedup {
    fn new(what: &'static str, policy: DuplicatePolicy) -> Self {
        Self {
            what,
            policy,
            seen: HashSet::new(),
        }
    }

    /// `Ok(true)` when the item is new and should be stored
    fn admit(&mut self, name: &str, stored: bool) -> StorageResult<bool> {
        if !stored && self.seen.insert(name.to_string()) {
            return Ok(true);
        }
        match self.policy {
            DuplicatePolicy::Skip => {
                tracing::warn!("{} {} already registered, skipping", self.what, name);
                Ok(false)
            }
            DuplicatePolicy::Reject => Err(StorageError::Duplicate {
                what: self.what.to_string(),
                name: name.to_string(),
            }),
        }
    }
}

impl HypergraphStore {
    /// Register one schema document. Returns whether it was stored.
    pub fn register_schema(
        &self,
        document: &SchemaDocument,
        policy: DuplicatePolicy,
    ) -> StorageResult<bool> {
        self.ensure_writable("register a schema")?;
        PayloadValidator::compile(document)?;

        let conn = self.lock()?;
        let stored = schema_exists(&conn, &document.schema_id)?;
        if !Dedup::new("Schema", policy).admit(&document.schema_id, stored)? {
            return Ok(false);
        }
        conn.execute(
            "INSERT INTO json_schemas (schema_id, payload) VALUES (?1, ?2)",
            params![document.schema_id, serde_json::to_string(&document.body)?],
        )?;
        tracing::info!("Registered schema {}", document.schema_id);
        Ok(true)
    }

    /// Read a metadata manifest and register it; schema paths are relative
    /// to the manifest's directory
    pub fn populate_manifest(
        &self,
        path: impl AsRef<Path>,
        policy: DuplicatePolicy,
    ) -> StorageResult<RegistryStats> {
        let path = path.as_ref();
        let manifest = MetadataManifest::load(path)?;
        self.upload_manifest(&manifest, &base_dir(path), policy)
    }

    /// Register every schema and type of a manifest, all or nothing
    pub fn upload_manifest(
        &self,
        manifest: &MetadataManifest,
        base: &Path,
        policy: DuplicatePolicy,
    ) -> StorageResult<RegistryStats> {
        self.ensure_writable("upload a metadata manifest")?;

        // Schemas are read and compiled before the transaction starts
        let mut documents = Vec::with_capacity(manifest.schemas().len());
        for reference in manifest.schemas() {
            let path = resolve_path(base, reference);
            let document = SchemaDocument::from_value(load_document(&path)?, reference)?;
            PayloadValidator::compile(&document)?;
            documents.push(document);
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut stats = RegistryStats::default();

        let mut schemas = Dedup::new("Schema", policy);
        for document in &documents {
            if !schemas.admit(&document.schema_id, schema_exists(&tx, &document.schema_id)?)? {
                continue;
            }
            tx.execute(
                "INSERT INTO json_schemas (schema_id, payload) VALUES (?1, ?2)",
                params![document.schema_id, serde_json::to_string(&document.body)?],
            )?;
            stats.schemas += 1;
        }

        let require_schema = |context: &str, schema_id: &str| -> StorageResult<()> {
            if schema_exists(&tx, schema_id)? {
                Ok(())
            } else {
                let err = StorageError::UnknownSchema {
                    context: context.to_string(),
                    schema_id: schema_id.to_string(),
                };
                tracing::error!("{}", err);
                Err(err)
            }
        };
        let require_node_type = |context: &str, name: &str| -> StorageResult<i64> {
            node_type_id(&tx, name)?.ok_or_else(|| {
                tracing::error!("{} needs unknown node type {}", context, name);
                StorageError::UnknownType {
                    category: Category::Node,
                    name: name.to_string(),
                }
            })
        };

        let mut node_types = Dedup::new("Node type", policy);
        for decl in manifest.node_types() {
            let context = format!("Node type {}", decl.name);
            require_schema(&context, &decl.schema_id)?;
            let stored = exists(&tx, "SELECT 1 FROM node_type WHERE nt_name = ?1", &decl.name)?;
            if !node_types.admit(&decl.name, stored)? {
                continue;
            }
            tx.execute(
                "INSERT INTO node_type (nt_name, nt_desc, node_schema_id) VALUES (?1, ?2, ?3)",
                params![decl.name, decl.desc, decl.schema_id],
            )?;
            stats.node_types += 1;
        }

        let mut edge_types = Dedup::new("Edge type", policy);
        for decl in manifest.edge_types() {
            let context = format!("Edge type {}", decl.name);
            require_schema(&context, &decl.schema_id)?;
            let a = require_node_type(&context, &decl.node_type_a)?;
            let b = require_node_type(&context, &decl.node_type_b)?;
            let stored = exists(&tx, "SELECT 1 FROM edge_type WHERE et_name = ?1", &decl.name)?;
            if !edge_types.admit(&decl.name, stored)? {
                continue;
            }
            tx.execute(
                "INSERT INTO edge_type (et_name, et_desc, a_nt_id, b_nt_id, is_directed, \
                 is_symmetric, edge_schema_id, weight_name, weight_desc) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    decl.name,
                    decl.desc,
                    a,
                    b,
                    decl.is_directed,
                    decl.is_symmetric,
                    decl.schema_id,
                    decl.weight.name,
                    decl.weight.desc
                ],
            )?;
            stats.edge_types += 1;
        }

        let mut hyperedge_types = Dedup::new("Hyperedge type", policy);
        for decl in manifest.hyperedge_types() {
            let context = format!("Hyperedge type {}", decl.name);
            require_schema(&context, &decl.schema_id)?;
            let mut accepted: Vec<i64> = Vec::with_capacity(decl.node_types.len());
            for name in &decl.node_types {
                let id = require_node_type(&context, name)?;
                if !accepted.contains(&id) {
                    accepted.push(id);
                }
            }
            let stored = exists(
                &tx,
                "SELECT 1 FROM hyperedge_type WHERE het_name = ?1",
                &decl.name,
            )?;
            if !hyperedge_types.admit(&decl.name, stored)? {
                continue;
            }
            tx.execute(
                "INSERT INTO hyperedge_type (het_name, het_desc, is_tuple, is_directed, \
                 is_symmetric, hyperedge_schema_id, weight_name, weight_desc) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    decl.name,
                    decl.desc,
                    decl.is_tuple,
                    decl.is_directed,
                    decl.is_symmetric,
                    decl.schema_id,
                    decl.weight.name,
                    decl.weight.desc
                ],
            )?;
            let het_id = tx.last_insert_rowid();
            for nt_id in accepted {
                tx.execute(
                    "INSERT INTO hyperedge_type_node_type (het_id, nt_id) VALUES (?1, ?2)",
                    params![het_id, nt_id],
                )?;
            }
            stats.hyperedge_types += 1;
        }

        tx.commit()?;
        self.invalidate_types();

        tracing::info!(
            "Stored {} schemas, {} node types, {} edge types and {} hyperedge types",
            stats.schemas,
            stats.node_types,
            stats.edge_types,
            stats.hyperedge_types
        );
        Ok(stats)
    }

    /// Ids of every registered schema
    pub fn registered_schemas(&self) -> StorageResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT schema_id FROM json_schemas ORDER BY schema_id")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
    }

    pub fn schema(&self, schema_id: &str) -> StorageResult<Option<Value>> {
        let conn = self.lock()?;
        load_schema(&conn, schema_id)
    }

    pub fn node_types(&self) -> StorageResult<Vec<NodeType>> {
        let conn = self.lock()?;
        Ok(self.type_index(&conn)?.node_types().to_vec())
    }

    pub fn edge_types(&self) -> StorageResult<Vec<EdgeType>> {
        let conn = self.lock()?;
        Ok(self.type_index(&conn)?.edge_types().to_vec())
    }

    pub fn hyperedge_types(&self) -> StorageResult<Vec<HyperedgeType>> {
        let conn = self.lock()?;
        Ok(self.type_index(&conn)?.hyperedge_types().to_vec())
    }

    /// Node types accepted by a hyperedge type, in declaration order
    pub fn accepted_node_types(&self, hyperedge_type: &str) -> StorageResult<Option<Vec<NodeType>>> {
        let conn = self.lock()?;
        let index = self.type_index(&conn)?;
        Ok(index.hyperedge_type(hyperedge_type).map(|het| {
            het.node_types
                .iter()
                .filter_map(|id| index.node_type_by_id(*id).cloned())
                .collect()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema_doc(id: &str) -> SchemaDocument {
        SchemaDocument::from_value(
            json!({
                "$id": id,
                "$schema": "http://json-schema.org/draft-07/schema#",
                "type": "object"
            }),
            id,
        )
        .unwrap()
    }

    fn manifest(value: Value) -> MetadataManifest {
        MetadataManifest::from_value(value).unwrap()
    }

    #[test]
    fn test_register_schema_policies() {
        let store = HypergraphStore::in_memory().unwrap();
        let doc = schema_doc("urn:gene");
        assert!(store.register_schema(&doc, DuplicatePolicy::Reject).unwrap());
        assert!(!store.register_schema(&doc, DuplicatePolicy::Skip).unwrap());

        let err = store.register_schema(&doc, DuplicatePolicy::Reject).unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { .. }));
        assert_eq!(store.registered_schemas().unwrap(), vec!["urn:gene"]);
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let store = HypergraphStore::in_memory().unwrap();
        let doc = SchemaDocument::from_value(
            json!({
                "$id": "urn:broken",
                "$schema": "http://json-schema.org/draft-07/schema#",
                "type": "no-such-type"
            }),
            "broken.json",
        )
        .unwrap();
        assert!(store.register_schema(&doc, DuplicatePolicy::Reject).is_err());
        assert!(store.registered_schemas().unwrap().is_empty());
    }

    #[test]
    fn test_manifest_registers_types_in_order() {
        let store = HypergraphStore::in_memory().unwrap();
        store
            .register_schema(&schema_doc("urn:any"), DuplicatePolicy::Reject)
            .unwrap();

        let stats = store
            .upload_manifest(
                &manifest(json!({
                    "node_types": [
                        {"name": "gene", "schema_id": "urn:any"},
                        {"name": "drug", "schema_id": "urn:any", "desc": "Compounds"}
                    ],
                    "edge_types": [{
                        "name": "targets",
                        "schema_id": "urn:any",
                        "node_type_a": "drug",
                        "node_type_b": "gene",
                        "is_directed": true,
                        "weight": {"name": "affinity"}
                    }],
                    "hyperedge_types": [{
                        "name": "complex",
                        "schema_id": "urn:any",
                        "node_types": ["gene", "drug", "gene"]
                    }]
                })),
                Path::new("."),
                DuplicatePolicy::Reject,
            )
            .unwrap();
        assert_eq!(
            stats,
            RegistryStats {
                schemas: 0,
                node_types: 2,
                edge_types: 1,
                hyperedge_types: 1
            }
        );

        let edge_types = store.edge_types().unwrap();
        assert_eq!(edge_types[0].weight.name.as_deref(), Some("affinity"));
        assert!(edge_types[0].is_directed);

        let accepted: Vec<_> = store
            .accepted_node_types("complex")
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(accepted, vec!["gene", "drug"]);
        assert!(store.accepted_node_types("unknown").unwrap().is_none());
    }

    #[test]
    fn test_manifest_is_all_or_nothing() {
        let store = HypergraphStore::in_memory().unwrap();
        store
            .register_schema(&schema_doc("urn:any"), DuplicatePolicy::Reject)
            .unwrap();

        let err = store
            .upload_manifest(
                &manifest(json!({
                    "node_types": [
                        {"name": "a", "schema_id": "urn:any"},
                        {"name": "b", "schema_id": "urn:any"},
                        {"name": "c", "schema_id": "urn:missing"},
                        {"name": "d", "schema_id": "urn:any"},
                        {"name": "e", "schema_id": "urn:any"}
                    ]
                })),
                Path::new("."),
                DuplicatePolicy::Reject,
            )
            .unwrap_err();
        assert!(matches!(err, StorageError::UnknownSchema { .. }));
        assert!(store.node_types().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_type_policies() {
        let store = HypergraphStore::in_memory().unwrap();
        store
            .register_schema(&schema_doc("urn:any"), DuplicatePolicy::Reject)
            .unwrap();
        let twice = manifest(json!({
            "node_types": [
                {"name": "gene", "schema_id": "urn:any"},
                {"name": "gene", "schema_id": "urn:any"}
            ]
        }));

        let err = store
            .upload_manifest(&twice, Path::new("."), DuplicatePolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { .. }));
        assert!(store.node_types().unwrap().is_empty());

        let stats = store
            .upload_manifest(&twice, Path::new("."), DuplicatePolicy::Skip)
            .unwrap();
        assert_eq!(stats.node_types, 1);
        assert_eq!(store.node_types().unwrap().len(), 1);
    }

    #[test]
    fn test_edge_type_with_unknown_node_type() {
        let store = HypergraphStore::in_memory().unwrap();
        store
            .register_schema(&schema_doc("urn:any"), DuplicatePolicy::Reject)
            .unwrap();
        let err = store
            .upload_manifest(
                &manifest(json!({
                    "node_types": [{"name": "gene", "schema_id": "urn:any"}],
                    "edge_types": [{
                        "name": "targets",
                        "schema_id": "urn:any",
                        "node_type_a": "drug",
                        "node_type_b": "gene"
                    }]
                })),
                Path::new("."),
                DuplicatePolicy::Skip,
            )
            .unwrap_err();
        assert!(matches!(err, StorageError::UnknownType { .. }));
        assert!(store.node_types().unwrap().is_empty());
    }

    #[test]
    fn test_populate_manifest_from_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("schemas")).unwrap();
        std::fs::write(
            dir.path().join("schemas/gene.json"),
            r#"{"$id": "urn:gene", "$schema": "http://json-schema.org/draft-07/schema#", "type": "object"}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("metadata.yaml"),
            "schemas:\n  - schemas/gene.json\nnode_types:\n  - name: gene\n    schema_id: urn:gene\n",
        )
        .unwrap();

        let store = HypergraphStore::in_memory().unwrap();
        let stats = store
            .populate_manifest(dir.path().join("metadata.yaml"), DuplicatePolicy::Reject)
            .unwrap();
        assert_eq!(stats.schemas, 1);
        assert_eq!(stats.node_types, 1);
        assert!(store.schema("urn:gene").unwrap().is_some());
    }

    #[test]
    fn test_manifest_file_is_checked_before_registering() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("metadata.yaml"),
            "node_types:\n  - name: gene\n    schema_id: urn:any\nedge_types:\n  - name: interacts\n    schema_id: urn:any\n",
        )
        .unwrap();

        let store = HypergraphStore::in_memory().unwrap();
        store
            .register_schema(&schema_doc("urn:any"), DuplicatePolicy::Reject)
            .unwrap();
        let err = store
            .populate_manifest(dir.path().join("metadata.yaml"), DuplicatePolicy::Reject)
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Core(hyperstore_core::Error::InvalidManifest { .. })
        ));
        assert_eq!(err.kind(), hyperstore_core::ErrorKind::Configuration);
        assert!(store.node_types().unwrap().is_empty());
    }
}
