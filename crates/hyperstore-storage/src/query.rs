//! Read-only graph traversal queries
//!
//! Every query is scoped to one hypergraph given by public id. An unknown
//! hypergraph yields `None`; unknown type names yield empty results.

use crate::error::StorageResult;
use crate::registry::TypeIndex;
use crate::store::{find_hypergraph, json_column, HypergraphStore};
use hyperstore_core::{
    Direction, Edge, EdgeGroup, EdgeId, EdgeType, EdgeTypeId, Endpoint, Hyperedge, HyperedgeGroup, HyperedgeId,
    HyperedgeType, HyperedgeTypeId, Hypergraph, HypergraphId, Node, NodeFilter, NodeGroup, NodeId,
    NodeType, NodeTypeId, RecordFilter, TypeUsage, TypedNode, UpperQuery,
};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, Row};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

const NODE_COLUMNS: &str = "n.n_id, n.nt_id, n.n_payload_id, n.n_payload_name, n.payload";
const EDGE_COLUMNS: &str = "e.e_id, e.et_id, e.e_payload_id, e.from_id, e.to_id, \
     e.e_payload_f_id, e.e_payload_t_id, e.e_payload_weight, e.payload";
const HYPEREDGE_COLUMNS: &str =
    "he.he_id, he.het_id, he.he_payload_id, he.he_payload_weight, he.payload";

/// Conditions ANDed into a WHERE clause, with their bound values
#[derive(Debug, Default)]
struct Conditions {
    clauses: Vec<String>,
    params: Vec<SqlValue>,
}

impl Conditions {
    fn eq(&mut self, column: &str, value: impl Into<SqlValue>) -> &mut Self {
        self.clauses.push(format!("{} = ?", column));
        self.params.push(value.into());
        self
    }

    /// `column IN (...)`, skipped when `values` is empty
    fn any_of(&mut self, column: &str, values: impl IntoIterator<Item = SqlValue>) -> &mut Self {
        let values: Vec<SqlValue> = values.into_iter().collect();
        if !values.is_empty() {
            let marks = vec!["?"; values.len()].join(", ");
            self.clauses.push(format!("{} IN ({})", column, marks));
            self.params.extend(values);
        }
        self
    }

    fn node_filter(&mut self, alias: &str, filter: &NodeFilter) -> &mut Self {
        self.any_of(
            &format!("{}.n_payload_id", alias),
            filter.payload_ids.iter().cloned().map(SqlValue::Text),
        )
        .any_of(
            &format!("{}.n_id", alias),
            filter.internal_ids.iter().map(|id| SqlValue::Integer(id.get())),
        )
        .any_of(
            &format!("{}.n_payload_name", alias),
            filter.names.iter().cloned().map(SqlValue::Text),
        )
    }

    fn record_filter(&mut self, id_column: &str, payload_column: &str, filter: &RecordFilter) -> &mut Self {
        if let Some(id) = filter.internal_id {
            self.eq(id_column, id);
        }
        if let Some(payload_id) = &filter.payload_id {
            self.eq(payload_column, payload_id.clone());
        }
        self
    }

    fn sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

fn node_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Node> {
    Ok(Node {
        id: NodeId(row.get(offset)?),
        type_id: NodeTypeId(row.get(offset + 1)?),
        payload_id: row.get(offset + 2)?,
        name: row.get(offset + 3)?,
        payload: Some(json_column(row, offset + 4)?),
    })
}

fn edge_from_row(row: &Row<'_>) -> rusqlite::Result<Edge> {
    Ok(Edge {
        id: EdgeId(row.get(0)?),
        type_id: EdgeTypeId(row.get(1)?),
        payload_id: row.get(2)?,
        from_id: NodeId(row.get(3)?),
        to_id: NodeId(row.get(4)?),
        from_payload_id: row.get(5)?,
        to_payload_id: row.get(6)?,
        weight: row.get(7)?,
        payload: Some(json_column(row, 8)?),
    })
}

fn hyperedge_from_row(row: &Row<'_>) -> rusqlite::Result<Hyperedge> {
    Ok(Hyperedge {
        id: HyperedgeId(row.get(0)?),
        type_id: HyperedgeTypeId(row.get(1)?),
        payload_id: row.get(2)?,
        node_ids: Vec::new(),
        node_payload_ids: Vec::new(),
        weight: row.get(3)?,
        payload: Some(json_column(row, 4)?),
    })
}

fn select<T>(
    conn: &Connection,
    sql: &str,
    params: &[SqlValue],
    map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> StorageResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), map)?;
    Ok(rows.collect::<rusqlite::Result<Vec<T>>>()?)
}

/// Fill in member lists, in membership order
fn load_members(conn: &Connection, hyperedges: &mut [Hyperedge]) -> StorageResult<()> {
    let mut stmt = conn.prepare_cached(
        "SELECT n.n_id, n.n_payload_id FROM hyperedge_node he_nr \
         JOIN node n ON n.n_id = he_nr.n_id \
         WHERE he_nr.he_id = ?1 ORDER BY he_nr.he_n_id",
    )?;
    for hyperedge in hyperedges.iter_mut() {
        let rows = stmt.query_map(params![hyperedge.id.get()], |row| {
            Ok((NodeId(row.get(0)?), row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (id, payload_id) = row?;
            hyperedge.node_ids.push(id);
            hyperedge.node_payload_ids.push(payload_id);
        }
    }
    Ok(())
}

/// Group items by key in first-encounter order
fn group_by<T, K: Eq + std::hash::Hash + Clone>(
    items: impl IntoIterator<Item = T>,
    key: impl Fn(&T) -> K,
) -> Vec<(K, Vec<T>)> {
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    let mut positions: HashMap<K, usize> = HashMap::new();
    for item in items {
        let k = key(&item);
        match positions.get(&k) {
            Some(&i) => groups[i].1.push(item),
            None => {
                positions.insert(k.clone(), groups.len());
                groups.push((k, vec![item]));
            }
        }
    }
    groups
}

fn group_nodes(types: &TypeIndex, nodes: Vec<Node>) -> Vec<NodeGroup> {
    group_by(nodes, |n| n.type_id)
        .into_iter()
        .map(|(type_id, nodes)| NodeGroup {
            node_type: types.node_type_name(type_id),
            nodes,
        })
        .collect()
}

/// Keep the first occurrence of each node
fn dedup_nodes(nodes: Vec<Node>) -> Vec<Node> {
    let mut seen = HashSet::new();
    nodes.into_iter().filter(|n| seen.insert(n.id)).collect()
}

fn typed(types: &TypeIndex, node: Node) -> TypedNode {
    TypedNode {
        node_type: types.node_type_name(node.type_id),
        node,
    }
}

/// Drops a TEMP table when the query is done with it
struct TempTable<'c> {
    conn: &'c Connection,
    name: String,
}

impl<'c> TempTable<'c> {
    fn create(conn: &'c Connection, select: &str, params: &[SqlValue]) -> StorageResult<Self> {
        let name = format!("upper_{}", ulid::Ulid::new().to_string().to_lowercase());
        conn.execute_batch(&format!(
            "CREATE TEMP TABLE {} (n_id INTEGER PRIMARY KEY);",
            name
        ))?;
        let table = Self { conn, name };
        conn.execute(
            &format!("INSERT INTO temp.{} {}", table.name, select),
            params_from_iter(params.iter()),
        )?;
        Ok(table)
    }
}

impl Drop for TempTable<'_> {
    fn drop(&mut self) {
        if let Err(e) = self
            .conn
            .execute_batch(&format!("DROP TABLE IF EXISTS temp.{};", self.name))
        {
            tracing::warn!("Could not drop temporary table {}: {}", self.name, e);
        }
    }
}

/// Resolved type ids of an upper query
struct UpperPlan {
    first: i64,
    second: i64,
    target: Option<i64>,
    degree: Option<(i64, u32)>,
}

impl UpperPlan {
    /// `None` when a named type does not exist
    fn resolve(types: &TypeIndex, query: &UpperQuery) -> Option<Self> {
        let edge_id = |name: &str| types.edge_type(name).map(|t| t.id.get());
        let first = edge_id(&query.first_edge_type)?;
        let second = edge_id(&query.second_edge_type)?;
        let target = match &query.target_node_type {
            Some(name) => Some(types.node_type(name)?.id.get()),
            None => None,
        };
        let degree = match (&query.degree, query.degree_edge_type()) {
            (Some(threshold), Some(name)) => Some((edge_id(name)?, threshold.min)),
            _ => None,
        };
        Some(Self {
            first,
            second,
            target,
            degree,
        })
    }

    /// Intermediate nodes: targets of the first edge type from the seeds
    fn intermediates<'c>(
        &self,
        conn: &'c Connection,
        h_id: HypergraphId,
        seeds: &[String],
    ) -> StorageResult<TempTable<'c>> {
        let mut conditions = Conditions::default();
        conditions
            .eq("s.h_id", h_id.get())
            .any_of("s.n_payload_id", seeds.iter().cloned().map(SqlValue::Text))
            .eq("e1.et_id", self.first);
        if let Some((edge_type, min)) = self.degree {
            conditions.clauses.push(
                "(SELECT COUNT(*) FROM edge d WHERE d.from_id = e1.to_id AND d.et_id = ?) >= ?"
                    .to_string(),
            );
            conditions.params.push(SqlValue::Integer(edge_type));
            conditions.params.push(SqlValue::Integer(i64::from(min)));
        }
        let select = format!(
            "SELECT DISTINCT e1.to_id AS n_id FROM node s JOIN edge e1 ON e1.from_id = s.n_id{}",
            conditions.sql()
        );
        TempTable::create(conn, &select, &conditions.params)
    }
}

impl HypergraphStore {
    /// Every stored hypergraph
    pub fn hypergraphs(&self) -> StorageResult<Vec<Hypergraph>> {
        let conn = self.lock()?;
        let mut all: Vec<Hypergraph> = self.hypergraph_index(&conn)?.values().cloned().collect();
        all.sort_by_key(|h| h.id);
        Ok(all)
    }

    pub fn hypergraph(&self, public_id: &str) -> StorageResult<Option<Hypergraph>> {
        let conn = self.lock()?;
        Ok(self.hypergraph_index(&conn)?.get(public_id).cloned())
    }

    /// Metadata payload a hypergraph was stored with
    pub fn hypergraph_metadata(&self, public_id: &str) -> StorageResult<Option<Value>> {
        let conn = self.lock()?;
        let Some(hypergraph) = find_hypergraph(&conn, public_id)? else {
            return Ok(None);
        };
        let payload = conn.query_row(
            "SELECT payload FROM hypergraph WHERE h_id = ?1",
            params![hypergraph.id.get()],
            |row| json_column(row, 0),
        )?;
        Ok(Some(payload))
    }

    /// Runs `f` with the connection, the type index and the hypergraph id,
    /// or returns `None` for an unknown hypergraph
    fn scoped<T>(
        &self,
        hypergraph: &str,
        f: impl FnOnce(&Connection, &TypeIndex, HypergraphId) -> StorageResult<T>,
    ) -> StorageResult<Option<T>> {
        let conn = self.lock()?;
        let Some(h_id) = self.resolve_hypergraph(&conn, hypergraph)? else {
            return Ok(None);
        };
        let types = self.type_index(&conn)?;
        f(&*conn, &*types, h_id).map(Some)
    }

    /// Node types with nodes in the hypergraph, optionally one by name
    pub fn node_types_in(
        &self,
        hypergraph: &str,
        name: Option<&str>,
    ) -> StorageResult<Option<Vec<TypeUsage<NodeType>>>> {
        self.scoped(hypergraph, |conn, types, h_id| {
            let counts = select(
                conn,
                "SELECT nt_id, COUNT(*) FROM node WHERE h_id = ? GROUP BY nt_id ORDER BY nt_id",
                &[SqlValue::Integer(h_id.get())],
                |row| Ok((NodeTypeId(row.get(0)?), row.get::<_, i64>(1)?)),
            )?;
            Ok(counts
                .into_iter()
                .filter_map(|(id, count)| types.node_type_by_id(id).map(|t| (t, count)))
                .filter(|(t, _)| name.map_or(true, |n| t.name == n))
                .map(|(t, count)| TypeUsage {
                    declaration: t.clone(),
                    count: count as usize,
                })
                .collect())
        })
    }

    pub fn edge_types_in(
        &self,
        hypergraph: &str,
        name: Option<&str>,
    ) -> StorageResult<Option<Vec<TypeUsage<EdgeType>>>> {
        self.scoped(hypergraph, |conn, types, h_id| {
            let counts = select(
                conn,
                "SELECT et_id, COUNT(*) FROM edge WHERE h_id = ? GROUP BY et_id ORDER BY et_id",
                &[SqlValue::Integer(h_id.get())],
                |row| Ok((EdgeTypeId(row.get(0)?), row.get::<_, i64>(1)?)),
            )?;
            Ok(counts
                .into_iter()
                .filter_map(|(id, count)| types.edge_type_by_id(id).map(|t| (t, count)))
                .filter(|(t, _)| name.map_or(true, |n| t.name == n))
                .map(|(t, count)| TypeUsage {
                    declaration: t.clone(),
                    count: count as usize,
                })
                .collect())
        })
    }

    pub fn hyperedge_types_in(
        &self,
        hypergraph: &str,
        name: Option<&str>,
    ) -> StorageResult<Option<Vec<TypeUsage<HyperedgeType>>>> {
        self.scoped(hypergraph, |conn, types, h_id| {
            let counts = select(
                conn,
                "SELECT het_id, COUNT(*) FROM hyperedge WHERE h_id = ? GROUP BY het_id ORDER BY het_id",
                &[SqlValue::Integer(h_id.get())],
                |row| Ok((HyperedgeTypeId(row.get(0)?), row.get::<_, i64>(1)?)),
            )?;
            Ok(counts
                .into_iter()
                .filter_map(|(id, count)| types.hyperedge_type_by_id(id).map(|t| (t, count)))
                .filter(|(t, _)| name.map_or(true, |n| t.name == n))
                .map(|(t, count)| TypeUsage {
                    declaration: t.clone(),
                    count: count as usize,
                })
                .collect())
        })
    }

    /// Nodes of a type, filtered by public ids, internal ids and names
    pub fn nodes(
        &self,
        hypergraph: &str,
        node_type: &str,
        filter: &NodeFilter,
    ) -> StorageResult<Option<Vec<Node>>> {
        self.scoped(hypergraph, |conn, types, h_id| {
            let Some(nt) = types.node_type(node_type) else {
                return Ok(Vec::new());
            };
            let mut conditions = Conditions::default();
            conditions
                .eq("n.h_id", h_id.get())
                .eq("n.nt_id", nt.id.get())
                .node_filter("n", filter);
            select(
                conn,
                &format!("SELECT {} FROM node n{} ORDER BY n.n_id", NODE_COLUMNS, conditions.sql()),
                &conditions.params,
                |row| node_from_row(row, 0),
            )
        })
    }

    /// Edges incident to the selected nodes, grouped by edge type
    pub fn node_edges(
        &self,
        hypergraph: &str,
        node_type: &str,
        filter: &NodeFilter,
        direction: Direction,
        edge_type: Option<&str>,
    ) -> StorageResult<Option<Vec<EdgeGroup>>> {
        self.scoped(hypergraph, |conn, types, h_id| {
            let Some(nt) = types.node_type(node_type) else {
                return Ok(Vec::new());
            };
            let mut conditions = Conditions::default();
            conditions
                .eq("n.h_id", h_id.get())
                .eq("n.nt_id", nt.id.get())
                .node_filter("n", filter);
            if let Some(name) = edge_type {
                let Some(et) = types.edge_type(name) else {
                    return Ok(Vec::new());
                };
                conditions.eq("e.et_id", et.id.get());
            }
            let join = match direction {
                Direction::Outgoing => "e.from_id",
                Direction::Incoming => "e.to_id",
            };
            let edges = select(
                conn,
                &format!(
                    "SELECT {} FROM node n JOIN edge e ON n.n_id = {}{} ORDER BY e.e_id",
                    EDGE_COLUMNS,
                    join,
                    conditions.sql()
                ),
                &conditions.params,
                edge_from_row,
            )?;
            Ok(group_by(edges, |e| e.type_id)
                .into_iter()
                .map(|(type_id, edges)| EdgeGroup {
                    edge_type: types
                        .edge_type_by_id(type_id)
                        .map(|t| t.name.clone())
                        .unwrap_or_default(),
                    edges,
                })
                .collect())
        })
    }

    /// Nodes one edge away from the selected nodes, de-duplicated and
    /// grouped by node type
    pub fn node_neighbours(
        &self,
        hypergraph: &str,
        node_type: &str,
        filter: &NodeFilter,
        edge_type: &str,
        direction: Direction,
    ) -> StorageResult<Option<Vec<NodeGroup>>> {
        self.scoped(hypergraph, |conn, types, h_id| {
            let (Some(nt), Some(et)) = (types.node_type(node_type), types.edge_type(edge_type))
            else {
                return Ok(Vec::new());
            };
            let mut conditions = Conditions::default();
            conditions
                .eq("n.h_id", h_id.get())
                .eq("n.nt_id", nt.id.get())
                .node_filter("n", filter)
                .eq("e.et_id", et.id.get());
            let (near, far) = match direction {
                Direction::Outgoing => ("e.from_id", "e.to_id"),
                Direction::Incoming => ("e.to_id", "e.from_id"),
            };
            let neighbours = select(
                conn,
                &format!(
                    "SELECT m.n_id, m.nt_id, m.n_payload_id, m.n_payload_name, m.payload \
                     FROM node n JOIN edge e ON n.n_id = {} JOIN node m ON m.n_id = {}{} \
                     ORDER BY e.e_id",
                    near,
                    far,
                    conditions.sql()
                ),
                &conditions.params,
                |row| node_from_row(row, 0),
            )?;
            Ok(group_nodes(types, dedup_nodes(neighbours)))
        })
    }

    /// Hyperedges the selected nodes belong to, grouped by hyperedge type
    pub fn node_hyperedges(
        &self,
        hypergraph: &str,
        node_type: &str,
        filter: &NodeFilter,
        hyperedge_type: Option<&str>,
    ) -> StorageResult<Option<Vec<HyperedgeGroup>>> {
        self.scoped(hypergraph, |conn, types, h_id| {
            let Some(nt) = types.node_type(node_type) else {
                return Ok(Vec::new());
            };
            let mut conditions = Conditions::default();
            conditions
                .eq("n.h_id", h_id.get())
                .eq("n.nt_id", nt.id.get())
                .node_filter("n", filter);
            if let Some(name) = hyperedge_type {
                let Some(het) = types.hyperedge_type(name) else {
                    return Ok(Vec::new());
                };
                conditions.eq("he.het_id", het.id.get());
            }
            let found = select(
                conn,
                &format!(
                    "SELECT {} FROM node n \
                     JOIN hyperedge_node he_nr ON he_nr.n_id = n.n_id \
                     JOIN hyperedge he ON he.he_id = he_nr.he_id{} \
                     ORDER BY he_nr.he_n_id",
                    HYPEREDGE_COLUMNS,
                    conditions.sql()
                ),
                &conditions.params,
                hyperedge_from_row,
            )?;
            let mut seen = HashSet::new();
            let mut hyperedges: Vec<Hyperedge> =
                found.into_iter().filter(|h| seen.insert(h.id)).collect();
            load_members(conn, &mut hyperedges)?;
            Ok(group_by(hyperedges, |h| h.type_id)
                .into_iter()
                .map(|(type_id, hyperedges)| HyperedgeGroup {
                    hyperedge_type: types
                        .hyperedge_type_by_id(type_id)
                        .map(|t| t.name.clone())
                        .unwrap_or_default(),
                    hyperedges,
                })
                .collect())
        })
    }

    /// Nodes sharing a hyperedge with the selected nodes (themselves
    /// included), in membership order, grouped by node type
    pub fn hyperedge_neighbours(
        &self,
        hypergraph: &str,
        node_type: &str,
        filter: &NodeFilter,
        hyperedge_type: Option<&str>,
    ) -> StorageResult<Option<Vec<NodeGroup>>> {
        self.scoped(hypergraph, |conn, types, h_id| {
            let Some(nt) = types.node_type(node_type) else {
                return Ok(Vec::new());
            };
            let mut conditions = Conditions::default();
            conditions
                .eq("n.h_id", h_id.get())
                .eq("n.nt_id", nt.id.get())
                .node_filter("n", filter);
            if let Some(name) = hyperedge_type {
                let Some(het) = types.hyperedge_type(name) else {
                    return Ok(Vec::new());
                };
                conditions.eq("he.het_id", het.id.get());
            }
            let members = select(
                conn,
                &format!(
                    "SELECT m.n_id, m.nt_id, m.n_payload_id, m.n_payload_name, m.payload \
                     FROM node n \
                     JOIN hyperedge_node a ON a.n_id = n.n_id \
                     JOIN hyperedge he ON he.he_id = a.he_id \
                     JOIN hyperedge_node b ON b.he_id = a.he_id \
                     JOIN node m ON m.n_id = b.n_id{} \
                     ORDER BY b.he_id, b.he_n_id",
                    conditions.sql()
                ),
                &conditions.params,
                |row| node_from_row(row, 0),
            )?;
            Ok(group_nodes(types, dedup_nodes(members)))
        })
    }

    /// Edges of a type, optionally one by internal or public id
    pub fn edges(
        &self,
        hypergraph: &str,
        edge_type: &str,
        filter: &RecordFilter,
    ) -> StorageResult<Option<Vec<Edge>>> {
        self.scoped(hypergraph, |conn, types, h_id| {
            let Some(et) = types.edge_type(edge_type) else {
                return Ok(Vec::new());
            };
            let mut conditions = Conditions::default();
            conditions
                .eq("e.h_id", h_id.get())
                .eq("e.et_id", et.id.get())
                .record_filter("e.e_id", "e.e_payload_id", filter);
            select(
                conn,
                &format!("SELECT {} FROM edge e{} ORDER BY e.e_id", EDGE_COLUMNS, conditions.sql()),
                &conditions.params,
                edge_from_row,
            )
        })
    }

    /// Source or target nodes of the selected edges
    pub fn edge_endpoints(
        &self,
        hypergraph: &str,
        edge_type: &str,
        endpoint: Endpoint,
        filter: &RecordFilter,
    ) -> StorageResult<Option<Vec<TypedNode>>> {
        self.scoped(hypergraph, |conn, types, h_id| {
            let Some(et) = types.edge_type(edge_type) else {
                return Ok(Vec::new());
            };
            let mut conditions = Conditions::default();
            conditions
                .eq("e.h_id", h_id.get())
                .eq("e.et_id", et.id.get())
                .record_filter("e.e_id", "e.e_payload_id", filter);
            let column = match endpoint {
                Endpoint::From => "e.from_id",
                Endpoint::To => "e.to_id",
            };
            let nodes = select(
                conn,
                &format!(
                    "SELECT {} FROM edge e JOIN node n ON n.n_id = {}{} ORDER BY e.e_id",
                    NODE_COLUMNS,
                    column,
                    conditions.sql()
                ),
                &conditions.params,
                |row| node_from_row(row, 0),
            )?;
            Ok(nodes.into_iter().map(|n| typed(types, n)).collect())
        })
    }

    /// Hyperedges of a type with their members, optionally one by internal
    /// or public id
    pub fn hyperedges(
        &self,
        hypergraph: &str,
        hyperedge_type: &str,
        filter: &RecordFilter,
    ) -> StorageResult<Option<Vec<Hyperedge>>> {
        self.scoped(hypergraph, |conn, types, h_id| {
            let Some(het) = types.hyperedge_type(hyperedge_type) else {
                return Ok(Vec::new());
            };
            let mut conditions = Conditions::default();
            conditions
                .eq("he.h_id", h_id.get())
                .eq("he.het_id", het.id.get())
                .record_filter("he.he_id", "he.he_payload_id", filter);
            let mut hyperedges = select(
                conn,
                &format!(
                    "SELECT {} FROM hyperedge he{} ORDER BY he.he_id",
                    HYPEREDGE_COLUMNS,
                    conditions.sql()
                ),
                &conditions.params,
                hyperedge_from_row,
            )?;
            load_members(conn, &mut hyperedges)?;
            Ok(hyperedges)
        })
    }

    /// Member nodes of the selected hyperedges, hyperedge by hyperedge in
    /// membership order
    pub fn hyperedge_members(
        &self,
        hypergraph: &str,
        hyperedge_type: &str,
        filter: &RecordFilter,
    ) -> StorageResult<Option<Vec<TypedNode>>> {
        self.scoped(hypergraph, |conn, types, h_id| {
            let Some(het) = types.hyperedge_type(hyperedge_type) else {
                return Ok(Vec::new());
            };
            let mut conditions = Conditions::default();
            conditions
                .eq("he.h_id", h_id.get())
                .eq("he.het_id", het.id.get())
                .record_filter("he.he_id", "he.he_payload_id", filter);
            let nodes = select(
                conn,
                &format!(
                    "SELECT {} FROM hyperedge he \
                     JOIN hyperedge_node he_nr ON he_nr.he_id = he.he_id \
                     JOIN node n ON n.n_id = he_nr.n_id{} \
                     ORDER BY he.he_id, he_nr.he_n_id",
                    NODE_COLUMNS,
                    conditions.sql()
                ),
                &conditions.params,
                |row| node_from_row(row, 0),
            )?;
            Ok(nodes.into_iter().map(|n| typed(types, n)).collect())
        })
    }

    /// Two-hop traversal: nodes reached through the second edge type from
    /// the nodes the seeds reach through the first one
    pub fn upper_nodes(
        &self,
        hypergraph: &str,
        query: &UpperQuery,
    ) -> StorageResult<Option<Vec<TypedNode>>> {
        self.scoped(hypergraph, |conn, types, h_id| {
            let Some(plan) = UpperPlan::resolve(types, query) else {
                return Ok(Vec::new());
            };
            let table = plan.intermediates(conn, h_id, &query.seeds)?;

            let mut conditions = Conditions::default();
            conditions.eq("e2.et_id", plan.second);
            if let Some(target) = plan.target {
                conditions.eq("n.nt_id", target);
            }
            let nodes = select(
                conn,
                &format!(
                    "SELECT DISTINCT {} FROM {} b \
                     JOIN edge e2 ON e2.from_id = b.n_id \
                     JOIN node n ON n.n_id = e2.to_id{} \
                     ORDER BY n.n_id",
                    NODE_COLUMNS,
                    table.name,
                    conditions.sql()
                ),
                &conditions.params,
                |row| node_from_row(row, 0),
            )?;
            drop(table);
            Ok(nodes.into_iter().map(|n| typed(types, n)).collect())
        })
    }

    /// Two-hop traversal: the second-hop edges leaving the intermediate nodes
    pub fn upper_edges(
        &self,
        hypergraph: &str,
        query: &UpperQuery,
    ) -> StorageResult<Option<Vec<Edge>>> {
        self.scoped(hypergraph, |conn, types, h_id| {
            let Some(plan) = UpperPlan::resolve(types, query) else {
                return Ok(Vec::new());
            };
            let table = plan.intermediates(conn, h_id, &query.seeds)?;

            let mut conditions = Conditions::default();
            conditions.eq("e.et_id", plan.second);
            if let Some(target) = plan.target {
                conditions.eq("n.nt_id", target);
            }
            let edges = select(
                conn,
                &format!(
                    "SELECT {} FROM {} b \
                     JOIN edge e ON e.from_id = b.n_id \
                     JOIN node n ON n.n_id = e.to_id{} \
                     ORDER BY e.e_id",
                    EDGE_COLUMNS,
                    table.name,
                    conditions.sql()
                ),
                &conditions.params,
                edge_from_row,
            )?;
            drop(table);
            Ok(edges)
        })
    }

    /// Two-hop traversal: edges of `edge_type` running between two
    /// intermediate nodes. The target type of the query is not applied.
    pub fn upper_network_edges(
        &self,
        hypergraph: &str,
        query: &UpperQuery,
        edge_type: &str,
    ) -> StorageResult<Option<Vec<Edge>>> {
        self.scoped(hypergraph, |conn, types, h_id| {
            let Some(plan) = UpperPlan::resolve(types, query) else {
                return Ok(Vec::new());
            };
            let Some(et) = types.edge_type(edge_type) else {
                return Ok(Vec::new());
            };
            let table = plan.intermediates(conn, h_id, &query.seeds)?;

            let mut conditions = Conditions::default();
            conditions.eq("e.et_id", et.id.get());
            let edges = select(
                conn,
                &format!(
                    "SELECT {} FROM edge e \
                     JOIN {} f ON f.n_id = e.from_id \
                     JOIN {} t ON t.n_id = e.to_id{} \
                     ORDER BY e.e_id",
                    EDGE_COLUMNS,
                    table.name,
                    table.name,
                    conditions.sql()
                ),
                &conditions.params,
                edge_from_row,
            )?;
            drop(table);
            Ok(edges)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conditions_sql() {
        let mut c = Conditions::default();
        assert_eq!(c.sql(), "");
        c.eq("n.h_id", 1i64)
            .node_filter("n", &NodeFilter::new().with_payload_id("a").with_payload_id("b"))
            .any_of("n.n_id", Vec::new());
        assert_eq!(c.sql(), " WHERE n.h_id = ? AND n.n_payload_id IN (?, ?)");
        assert_eq!(c.params.len(), 3);
    }

    #[test]
    fn test_group_by_keeps_first_encounter_order() {
        let groups = group_by(vec![("b", 1), ("a", 2), ("b", 3)], |item| item.0);
        assert_eq!(groups, vec![("b", vec![("b", 1), ("b", 3)]), ("a", vec![("a", 2)])]);
    }

    #[test]
    fn test_temp_table_is_dropped() {
        let conn = Connection::open_in_memory().unwrap();
        let name = {
            let table = TempTable::create(&conn, "SELECT 1 AS n_id", &[]).unwrap();
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table.name), [], |row| row.get(0))
                .unwrap();
            assert_eq!(count, 1);
            table.name.clone()
        };
        let left: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_temp_master WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(left, 0);
    }
}
