//! The hypergraph store: connection handling, bootstrap and caches

use crate::cache::Cache;
use crate::config::StoreConfig;
use crate::error::{StorageError, StorageResult};
use crate::migration::{self, schema_version, CURRENT_VERSION};
use crate::registry::TypeIndex;
use chrono::{DateTime, SecondsFormat, Utc};
use hyperstore_core::{Hypergraph, HypergraphId};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Hypergraphs by public id
pub type HypergraphIndex = HashMap<String, Hypergraph>;

/// Row counts of a store
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub schema_version: u32,
    pub schemas: usize,
    pub node_types: usize,
    pub edge_types: usize,
    pub hyperedge_types: usize,
    pub hypergraphs: usize,
    pub nodes: usize,
    pub edges: usize,
    pub hyperedges: usize,
}

/// SQLite-backed hypergraph store.
///
/// One connection is shared by every caller. Reads may run from several
/// threads; bulk uploads are expected to be serialized by the caller.
pub struct HypergraphStore {
    conn: Mutex<Connection>,
    read_only: bool,
    types: Cache<TypeIndex>,
    hypergraphs: Cache<HypergraphIndex>,
}

impl std::fmt::Debug for HypergraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HypergraphStore")
            .field("read_only", &self.read_only)
            .finish()
    }
}

impl HypergraphStore {
    /// Open (and bootstrap, unless read-only) the database at `path`
    pub fn open(path: impl AsRef<Path>, read_only: bool) -> StorageResult<Self> {
        Self::open_with(&StoreConfig::new(path.as_ref()).read_only(read_only))
    }

    pub fn open_with(config: &StoreConfig) -> StorageResult<Self> {
        let conn = if config.read_only {
            Connection::open_with_flags(
                &config.path,
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        } else {
            Connection::open(&config.path)?
        };
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        conn.execute_batch(&config.pragmas())?;

        tracing::debug!(
            "Opened store {} ({})",
            config.path.display(),
            if config.read_only { "read-only" } else { "read-write" }
        );
        Self::bootstrap(conn, config.read_only)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::bootstrap(conn, false)
    }

    fn bootstrap(mut conn: Connection, read_only: bool) -> StorageResult<Self> {
        if read_only {
            let version = schema_version(&conn)?;
            if version != CURRENT_VERSION {
                return Err(hyperstore_core::Error::Config(format!(
                    "Store schema version is {} but {} is needed; open it read-write once to bootstrap it",
                    version, CURRENT_VERSION
                ))
                .into());
            }
        } else {
            migration::migrate(&mut conn)?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
            read_only,
            types: Cache::new(),
            hypergraphs: Cache::new(),
        })
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub(crate) fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }

    pub(crate) fn ensure_writable(&self, operation: &str) -> StorageResult<()> {
        if self.read_only {
            return Err(StorageError::ReadOnly(operation.to_string()));
        }
        Ok(())
    }

    pub(crate) fn type_index(&self, conn: &Connection) -> StorageResult<Arc<TypeIndex>> {
        self.types.get_or_populate(|| TypeIndex::load(conn))
    }

    pub(crate) fn hypergraph_index(&self, conn: &Connection) -> StorageResult<Arc<HypergraphIndex>> {
        self.hypergraphs.get_or_populate(|| {
            let mut stmt =
                conn.prepare("SELECT h_id, h_payload_id, stored_at, updated_at FROM hypergraph")?;
            let rows = stmt.query_map([], hypergraph_from_row)?;
            let mut index = HashMap::new();
            for row in rows {
                let hypergraph = row?;
                index.insert(hypergraph.payload_id.clone(), hypergraph);
            }
            Ok(index)
        })
    }

    pub(crate) fn invalidate_types(&self) {
        self.types.invalidate();
    }

    pub(crate) fn invalidate_hypergraphs(&self) {
        self.hypergraphs.invalidate();
    }

    /// Internal id of a hypergraph, by public id
    pub(crate) fn resolve_hypergraph(
        &self,
        conn: &Connection,
        public_id: &str,
    ) -> StorageResult<Option<HypergraphId>> {
        Ok(self.hypergraph_index(conn)?.get(public_id).map(|h| h.id))
    }

    pub fn stats(&self) -> StorageResult<StoreStats> {
        let conn = self.lock()?;
        let count = |table: &str| -> StorageResult<usize> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?;
            Ok(n as usize)
        };
        Ok(StoreStats {
            schema_version: schema_version(&conn)?,
            schemas: count("json_schemas")?,
            node_types: count("node_type")?,
            edge_types: count("edge_type")?,
            hyperedge_types: count("hyperedge_type")?,
            hypergraphs: count("hypergraph")?,
            nodes: count("node")?,
            edges: count("edge")?,
            hyperedges: count("hyperedge")?,
        })
    }
}

/// Timestamps are stored as RFC 3339 text with microseconds
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Parse a JSON payload column
pub(crate) fn json_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<serde_json::Value> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn hypergraph_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Hypergraph> {
    let stored_at: String = row.get(2)?;
    let updated_at: String = row.get(3)?;
    Ok(Hypergraph {
        id: HypergraphId(row.get(0)?),
        payload_id: row.get(1)?,
        stored_at: parse_timestamp(2, &stored_at)?,
        updated_at: parse_timestamp(3, &updated_at)?,
    })
}

/// Metadata row of a hypergraph, by public id
pub(crate) fn find_hypergraph(
    conn: &Connection,
    public_id: &str,
) -> StorageResult<Option<Hypergraph>> {
    Ok(conn
        .query_row(
            "SELECT h_id, h_payload_id, stored_at, updated_at FROM hypergraph WHERE h_payload_id = ?1",
            params![public_id],
            hypergraph_from_row,
        )
        .optional()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_sets_version() {
        let store = HypergraphStore::in_memory().unwrap();
        // Re-running is a no-op
        {
            let mut conn = store.lock().unwrap();
            assert!(migration::migrate(&mut conn).unwrap().is_empty());
        }

        let stats = store.stats().unwrap();
        assert_eq!(stats.schema_version, CURRENT_VERSION);
        assert_eq!(stats.nodes, 0);
    }

    #[test]
    fn test_read_only_needs_bootstrapped_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        rusqlite::Connection::open(&path).unwrap();

        let err = HypergraphStore::open(&path, true).unwrap_err();
        assert_eq!(err.kind(), hyperstore_core::ErrorKind::Configuration);

        drop(HypergraphStore::open(&path, false).unwrap());
        let store = HypergraphStore::open(&path, true).unwrap();
        assert!(store.is_read_only());
        assert!(store.ensure_writable("upload").is_err());
    }

    #[test]
    fn test_timestamps_round_trip() {
        let text = now_timestamp();
        let parsed = parse_timestamp(0, &text).unwrap();
        assert_eq!(parsed.to_rfc3339_opts(SecondsFormat::Micros, true), text);
    }
}
