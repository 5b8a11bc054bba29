//! CLI configuration

use anyhow::Context;
use hyperstore_storage::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory
pub const CONFIG_FILE: &str = "hyperstore.toml";

/// Per-user configuration file
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hyperstore").join(CONFIG_FILE))
}

/// Configuration for the CLI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
}

impl Config {
    /// Load the configuration: an explicit file must exist; otherwise
    /// `./hyperstore.toml`, then the per-user file, then defaults.
    /// Returns the file it was read from, if any.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
        }
        let candidates = std::iter::once(PathBuf::from(CONFIG_FILE)).chain(user_config_path());
        for path in candidates {
            if path.is_file() {
                return Ok((Self::from_file(&path)?, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_table_overrides_defaults() {
        let config = Config::from_toml(
            r#"
            [store]
            path = "/tmp/graphs.db"
            busy_timeout_ms = 100
            "#,
        )
        .unwrap();
        assert_eq!(config.store.path, PathBuf::from("/tmp/graphs.db"));
        assert_eq!(config.store.busy_timeout_ms, 100);
        assert!(config.store.wal_mode);
        assert!(!config.store.read_only);
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.store.cache_size = Some(-2000);
        let text = config.to_toml().unwrap();
        assert!(text.contains("[store]"));
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
