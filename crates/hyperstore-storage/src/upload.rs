//! Bulk loading of hypergraphs from data manifests
//!
//! Each hypergraph is loaded in one transaction: its metadata is validated
//! and stored (replacing any previous version), then every node mapping is
//! run, then every edge mapping, then every hyperedge mapping. Records
//! inserted in a phase can be referenced by the following rows and phases.

use crate::error::{StorageError, StorageResult};
use crate::registry::{load_schema, TypeIndex};
use crate::store::{find_hypergraph, json_column, now_timestamp, HypergraphStore};
use hyperstore_core::manifest::{base_dir, load_document, resolve_path};
use hyperstore_core::mapping::{EdgeRef, HyperedgeRef, NodeRef, Resolved};
use hyperstore_core::{
    Category, DataManifest, EdgeId, HyperedgeId, HypergraphDecl, HypergraphId, HypergraphMetadata,
    MappingDescriptor, NodeId, PayloadValidator, Record, RecordStream, Resolver, Target,
};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Outcome of one category's phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    /// Mappings run
    pub mappings: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Rows skipped by `filter_in` / `filter_out`
    pub filtered_out: usize,
}

/// Outcome of one hypergraph upload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadStats {
    /// Public id of the hypergraph
    pub hypergraph: String,
    /// Whether a previous version was replaced
    pub replaced: bool,
    pub nodes: CategoryStats,
    pub edges: CategoryStats,
    pub hyperedges: CategoryStats,
}

impl UploadStats {
    fn category_mut(&mut self, category: Category) -> &mut CategoryStats {
        match category {
            Category::Node => &mut self.nodes,
            Category::Edge => &mut self.edges,
            Category::Hyperedge => &mut self.hyperedges,
        }
    }
}

/// Public ids of the records stored so far in the current upload
#[derive(Debug, Default)]
pub(crate) struct LoadIndex {
    nodes: HashMap<String, NodeRef>,
    edges: HashMap<String, EdgeRef>,
    hyperedges: HashMap<String, HyperedgeRef>,
}

/// Resolver over the upload's transaction
struct LoadResolver<'a> {
    conn: &'a Connection,
    index: &'a LoadIndex,
}

impl Resolver for LoadResolver<'_> {
    fn resolve(&self, category: Category, payload_id: &str) -> Option<Resolved> {
        match category {
            Category::Node => self.index.nodes.get(payload_id).cloned().map(Resolved::Node),
            Category::Edge => self.index.edges.get(payload_id).cloned().map(Resolved::Edge),
            Category::Hyperedge => self
                .index
                .hyperedges
                .get(payload_id)
                .cloned()
                .map(Resolved::Hyperedge),
        }
    }

    fn current(
        &self,
        category: Category,
        internal_id: i64,
    ) -> hyperstore_core::Result<Option<(i64, Value)>> {
        let sql = match category {
            Category::Node => "SELECT nt_id, payload FROM node WHERE n_id = ?1",
            Category::Edge => "SELECT et_id, payload FROM edge WHERE e_id = ?1",
            Category::Hyperedge => "SELECT het_id, payload FROM hyperedge WHERE he_id = ?1",
        };
        self.conn
            .query_row(sql, params![internal_id], |row| {
                Ok((row.get::<_, i64>(0)?, json_column(row, 1)?))
            })
            .optional()
            .map_err(|e| hyperstore_core::Error::Backend(Box::new(e)))
    }
}

/// A mapping bound to its file and target type
struct Job<'a> {
    path: PathBuf,
    descriptor: &'a MappingDescriptor,
    target: Target,
    schema_id: String,
}

/// Compiled payload schemas, by id
#[derive(Default)]
struct Validators(HashMap<String, PayloadValidator>);

impl Validators {
    fn get(&mut self, conn: &Connection, schema_id: &str) -> StorageResult<&PayloadValidator> {
        if !self.0.contains_key(schema_id) {
            let body = load_schema(conn, schema_id)?.ok_or_else(|| StorageError::UnknownSchema {
                context: "Payload validation".to_string(),
                schema_id: schema_id.to_string(),
            })?;
            self.0.insert(
                schema_id.to_string(),
                PayloadValidator::from_value(schema_id, &body)?,
            );
        }
        self.0
            .get(schema_id)
            .ok_or_else(|| StorageError::Database(format!("validator {} vanished", schema_id)))
    }
}

impl HypergraphStore {
    /// Read a data manifest and upload every hypergraph it lists
    pub fn populate_data_manifest(
        &self,
        path: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> StorageResult<Vec<UploadStats>> {
        let path = path.as_ref();
        let manifest = DataManifest::load(path)?;
        self.upload_data_manifest(&manifest, &base_dir(path), cancel)
    }

    /// Upload hypergraphs in order. Each one is its own failure unit: the
    /// first failure stops the run, earlier hypergraphs stay stored.
    pub fn upload_data_manifest(
        &self,
        manifest: &DataManifest,
        base: &Path,
        cancel: &CancellationToken,
    ) -> StorageResult<Vec<UploadStats>> {
        manifest
            .hypergraphs()
            .iter()
            .map(|decl| self.upload_hypergraph(decl, base, cancel))
            .collect()
    }

    /// Store (or replace) one hypergraph with all its data files
    pub fn upload_hypergraph(
        &self,
        decl: &HypergraphDecl,
        base: &Path,
        cancel: &CancellationToken,
    ) -> StorageResult<UploadStats> {
        self.ensure_writable("upload a hypergraph")?;

        let metafile = resolve_path(base, &decl.metafile);
        let metadata = HypergraphMetadata::from_payload(load_document(&metafile)?).ok_or_else(
            || {
                hyperstore_core::Error::Config(format!(
                    "Metadata file {} needs string _id and _schema keys",
                    metafile.display()
                ))
            },
        )?;
        let data_base = base_dir(&metafile);

        let mut conn = self.lock()?;
        let types = self.type_index(&conn)?;
        let tx = conn.transaction()?;

        let mut validators = Validators::default();
        validators.get(&tx, &metadata.schema_id)?.validate(
            &metadata.payload,
            &format!("Hypergraph metadata {}", metafile.display()),
        )?;

        let (h_id, replaced) = store_metadata(&tx, &metadata)?;
        let mut stats = UploadStats {
            hypergraph: metadata.payload_id.clone(),
            replaced,
            ..UploadStats::default()
        };

        let mut phases: [Vec<Job<'_>>; 3] = Default::default();
        for datafile in &decl.datafiles {
            let path = resolve_path(&data_base, &datafile.file);
            for descriptor in &datafile.maps {
                let (slot, target, schema_id) = classify(&types, descriptor)?;
                phases[slot].push(Job {
                    path: path.clone(),
                    descriptor,
                    target,
                    schema_id,
                });
            }
        }

        let mut index = LoadIndex::default();
        for jobs in &phases {
            for job in jobs {
                if cancel.is_cancelled() {
                    return Err(StorageError::Cancelled);
                }
                run_job(
                    &tx,
                    h_id,
                    job,
                    &types,
                    &mut validators,
                    &mut index,
                    &mut stats,
                    cancel,
                )?;
            }
        }

        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        tx.commit()?;
        self.invalidate_hypergraphs();

        tracing::info!(
            "Hypergraph {} {}: {} nodes, {} edges, {} hyperedges",
            stats.hypergraph,
            if replaced { "replaced" } else { "stored" },
            stats.nodes.inserted,
            stats.edges.inserted,
            stats.hyperedges.inserted
        );
        Ok(stats)
    }
}

/// Insert the hypergraph row, or clear and update the existing one.
/// Returns its internal id and whether it existed.
fn store_metadata(
    conn: &Connection,
    metadata: &HypergraphMetadata,
) -> StorageResult<(HypergraphId, bool)> {
    let now = now_timestamp();
    let payload = serde_json::to_string(&metadata.payload)?;

    match find_hypergraph(conn, &metadata.payload_id)? {
        Some(existing) => {
            tracing::info!(
                "Replacing hypergraph {} (stored at {})",
                existing.payload_id,
                existing.stored_at
            );
            let h_id = existing.id.get();
            conn.execute("DELETE FROM hyperedge WHERE h_id = ?1", params![h_id])?;
            conn.execute("DELETE FROM edge WHERE h_id = ?1", params![h_id])?;
            conn.execute("DELETE FROM node WHERE h_id = ?1", params![h_id])?;
            conn.execute(
                "UPDATE hypergraph SET payload = ?1, updated_at = ?2 WHERE h_id = ?3",
                params![payload, now, h_id],
            )?;
            Ok((existing.id, true))
        }
        None => {
            conn.execute(
                "INSERT INTO hypergraph (h_payload_id, stored_at, updated_at, payload) \
                 VALUES (?1, ?2, ?2, ?3)",
                params![metadata.payload_id, now, payload],
            )?;
            Ok((HypergraphId(conn.last_insert_rowid()), false))
        }
    }
}

/// Phase slot, target and schema of a mapping
fn classify(
    types: &TypeIndex,
    descriptor: &MappingDescriptor,
) -> StorageResult<(usize, Target, String)> {
    let unknown = || StorageError::UnknownType {
        category: descriptor.class,
        name: descriptor.type_name.clone(),
    };
    Ok(match descriptor.class {
        Category::Node => {
            let t = types.node_type(&descriptor.type_name).ok_or_else(unknown)?;
            (0, Target::node(t), t.schema_id.clone())
        }
        Category::Edge => {
            let t = types.edge_type(&descriptor.type_name).ok_or_else(unknown)?;
            (1, Target::edge(t), t.schema_id.clone())
        }
        Category::Hyperedge => {
            let t = types
                .hyperedge_type(&descriptor.type_name)
                .ok_or_else(unknown)?;
            (2, Target::hyperedge(t), t.schema_id.clone())
        }
    })
}

#[allow(clippy::too_many_arguments)]
fn run_job(
    conn: &Connection,
    h_id: HypergraphId,
    job: &Job<'_>,
    types: &TypeIndex,
    validators: &mut Validators,
    index: &mut LoadIndex,
    stats: &mut UploadStats,
    cancel: &CancellationToken,
) -> StorageResult<()> {
    let category = job.target.category();
    tracing::debug!(
        "Loading {} type {} from {}",
        category,
        job.descriptor.type_name,
        job.path.display()
    );

    let mut stream = RecordStream::open(&job.path, job.descriptor, job.target.clone(), types)?;
    let validator = validators.get(conn, &job.schema_id)?;
    let file = job.path.display().to_string();
    let (mut inserted, mut updated) = (0, 0);

    loop {
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        let next = stream.next_record(&LoadResolver {
            conn,
            index: &*index,
        })?;
        let Some(mut record) = next else {
            break;
        };

        let context = format!(
            "{} data from line {} in {}",
            capitalize(category.as_str()),
            record.line,
            file
        );
        if let Err(e) = validator.validate_marked(&mut record.payload, &context) {
            tracing::error!("Offending payload: {}", record.payload);
            return Err(e.into());
        }

        match record.existing {
            Some(id) => {
                update_record(conn, category, id, &record)?;
                updated += 1;
            }
            None => {
                insert_record(conn, h_id, &job.target, record, index)?;
                inserted += 1;
            }
        }
    }

    let category_stats = stats.category_mut(category);
    category_stats.mappings += 1;
    category_stats.inserted += inserted;
    category_stats.updated += updated;
    category_stats.filtered_out += stream.filtered_out();

    tracing::debug!(
        "{} {} inserted, {} updated, {} filtered out from {}",
        inserted,
        job.descriptor.type_name,
        updated,
        stream.filtered_out(),
        file
    );
    Ok(())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn payload_str(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}

fn payload_weight(payload: &Value) -> Option<f64> {
    payload.get("weight").and_then(Value::as_f64)
}

fn update_record(
    conn: &Connection,
    category: Category,
    id: i64,
    record: &Record,
) -> StorageResult<()> {
    let payload = serde_json::to_string(&record.payload)?;
    match category {
        Category::Node => conn.execute(
            "UPDATE node SET payload = ?1, n_payload_name = ?2 WHERE n_id = ?3",
            params![payload, payload_str(&record.payload, "name"), id],
        )?,
        Category::Edge => conn.execute(
            "UPDATE edge SET payload = ?1, e_payload_weight = ?2 WHERE e_id = ?3",
            params![payload, payload_weight(&record.payload), id],
        )?,
        Category::Hyperedge => conn.execute(
            "UPDATE hyperedge SET payload = ?1, he_payload_weight = ?2 WHERE he_id = ?3",
            params![payload, payload_weight(&record.payload), id],
        )?,
    };
    Ok(())
}

fn insert_record(
    conn: &Connection,
    h_id: HypergraphId,
    target: &Target,
    record: Record,
    index: &mut LoadIndex,
) -> StorageResult<()> {
    let payload_id = payload_str(&record.payload, "_id");
    let payload = serde_json::to_string(&record.payload)?;

    match target {
        Target::Node { type_id } => {
            let payload_id = payload_id.unwrap_or_default();
            conn.execute(
                "INSERT INTO node (h_id, nt_id, n_payload_id, n_payload_name, payload) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    h_id.get(),
                    type_id.get(),
                    payload_id,
                    payload_str(&record.payload, "name"),
                    payload
                ],
            )?;
            let node = NodeRef {
                id: NodeId(conn.last_insert_rowid()),
                type_id: *type_id,
                payload_id: payload_id.clone(),
            };
            if index.nodes.insert(payload_id.clone(), node).is_some() {
                tracing::warn!(
                    "Node {} appears more than once, line {} now wins",
                    payload_id,
                    record.line
                );
            }
        }
        Target::Edge { type_id, .. } => {
            let [from, to] = <[NodeRef; 2]>::try_from(record.links).map_err(|links| {
                StorageError::Database(format!("edge needs 2 endpoints, got {}", links.len()))
            })?;
            conn.execute(
                "INSERT INTO edge (h_id, et_id, from_id, to_id, e_payload_id, e_payload_f_id, \
                 e_payload_t_id, e_payload_weight, payload) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    h_id.get(),
                    type_id.get(),
                    from.id.get(),
                    to.id.get(),
                    payload_id,
                    from.payload_id,
                    to.payload_id,
                    payload_weight(&record.payload),
                    payload
                ],
            )?;
            if let Some(payload_id) = payload_id {
                index.edges.insert(
                    payload_id,
                    EdgeRef {
                        id: EdgeId(conn.last_insert_rowid()),
                        type_id: *type_id,
                        from,
                        to,
                    },
                );
            }
        }
        Target::Hyperedge { type_id, .. } => {
            conn.execute(
                "INSERT INTO hyperedge (h_id, het_id, he_payload_id, he_payload_weight, payload) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    h_id.get(),
                    type_id.get(),
                    payload_id,
                    payload_weight(&record.payload),
                    payload
                ],
            )?;
            let he_id = conn.last_insert_rowid();
            let mut stmt =
                conn.prepare_cached("INSERT INTO hyperedge_node (he_id, n_id) VALUES (?1, ?2)")?;
            for member in &record.links {
                stmt.execute(params![he_id, member.id.get()])?;
            }
            if let Some(payload_id) = payload_id {
                index.hyperedges.insert(
                    payload_id,
                    HyperedgeRef {
                        id: HyperedgeId(he_id),
                        type_id: *type_id,
                        members: record.links,
                    },
                );
            }
        }
    }
    Ok(())
}
