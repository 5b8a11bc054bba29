//! Versioned schema steps
//!
//! Each step carries the DDL that brings a store from the previous version
//! to its own. The applied version is kept in `PRAGMA user_version`.

use crate::error::{StorageError, StorageResult};
use crate::schema::SCHEMA_V1;
use rusqlite::Connection;

#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    sql: &'static str,
}

/// Every schema step, in version order starting at 1
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "schemas, type registry, hypergraphs, nodes, edges and hyperedges",
    sql: SCHEMA_V1,
}];

/// Schema version a store is brought to on open
pub const CURRENT_VERSION: u32 = MIGRATIONS.len() as u32;

pub fn schema_version(conn: &Connection) -> StorageResult<u32> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version as u32)
}

/// Apply the pending steps in one transaction and return them.
/// A store written by a newer version is refused.
pub fn migrate(conn: &mut Connection) -> StorageResult<Vec<&'static Migration>> {
    let current = schema_version(conn)?;
    if current > CURRENT_VERSION {
        return Err(StorageError::Migration(format!(
            "Store schema version {} is newer than the supported version {}",
            current, CURRENT_VERSION
        )));
    }

    let pending: Vec<&'static Migration> =
        MIGRATIONS.iter().filter(|m| m.version > current).collect();
    if pending.is_empty() {
        tracing::debug!("Schema already at version {}", current);
        return Ok(pending);
    }

    let tx = conn.transaction()?;
    for step in &pending {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        tracing::info!("Applied schema version {}: {}", step.version, step.description);
    }
    tx.commit()?;
    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_are_contiguous() {
        for (i, step) in MIGRATIONS.iter().enumerate() {
            assert_eq!(step.version as usize, i + 1);
        }
        assert_eq!(CURRENT_VERSION, 1);
    }

    #[test]
    fn test_migrate_applies_pending_steps_once() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);

        let applied = migrate(&mut conn).unwrap();
        assert_eq!(applied.len(), MIGRATIONS.len());
        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'hyperedge_node'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);

        assert!(migrate(&mut conn).unwrap().is_empty());
    }

    #[test]
    fn test_newer_store_is_refused() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", CURRENT_VERSION + 1)
            .unwrap();
        let err = migrate(&mut conn).unwrap_err();
        assert!(matches!(err, StorageError::Migration(_)));
    }
}
