//! Connection settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a store opens its database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file
    pub path: PathBuf,

    /// Query-only connection
    pub read_only: bool,

    /// How long to wait on a locked database, in milliseconds
    pub busy_timeout_ms: u64,

    /// SQLite page cache size (`PRAGMA cache_size`), driver default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_size: Option<i64>,

    /// Write-ahead logging (read-write connections only)
    pub wal_mode: bool,

    /// Foreign key enforcement (read-write connections only)
    pub foreign_keys: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("hyperstore.db"),
            read_only: false,
            busy_timeout_ms: 5_000,
            cache_size: None,
            wal_mode: true,
            foreign_keys: true,
        }
    }
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Pragmas applied right after the connection is opened
    pub(crate) fn pragmas(&self) -> String {
        let mut pragmas = Vec::new();
        if !self.read_only {
            pragmas.push("PRAGMA encoding = 'UTF-8';".to_string());
            if self.wal_mode {
                pragmas.push("PRAGMA journal_mode = WAL;".to_string());
            }
            pragmas.push(format!(
                "PRAGMA foreign_keys = {};",
                if self.foreign_keys { "ON" } else { "OFF" }
            ));
        }
        if let Some(size) = self.cache_size {
            pragmas.push(format!("PRAGMA cache_size = {};", size));
        }
        pragmas.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"path": "/tmp/graphs.db", "read_only": true}"#).unwrap();
        assert_eq!(config.path, PathBuf::from("/tmp/graphs.db"));
        assert!(config.read_only);
        assert_eq!(config.busy_timeout_ms, 5_000);
        assert!(config.wal_mode);
    }

    #[test]
    fn test_read_only_pragmas_do_not_write() {
        let config = StoreConfig::new("x.db").read_only(true);
        assert!(!config.pragmas().contains("journal_mode"));

        let config = StoreConfig::new("x.db");
        let pragmas = config.pragmas();
        assert!(pragmas.contains("journal_mode = WAL"));
        assert!(pragmas.contains("foreign_keys = ON"));
    }
}
