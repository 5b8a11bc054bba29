//! Hyperstore Storage - SQLite persistence for typed property hypergraphs
//!
//! This crate owns the relational layout, the type registry, bulk loading
//! of tabular data and the read-side traversal queries.

#![allow(clippy::result_large_err)]

pub mod cache;
pub mod config;
pub mod error;
pub mod migration;
pub mod query;
pub mod registry;
pub mod schema;
pub mod store;
pub mod upload;

pub use cache::Cache;
pub use config::StoreConfig;
pub use error::{StorageError, StorageResult};
pub use migration::{Migration, CURRENT_VERSION, MIGRATIONS};
pub use registry::{DuplicatePolicy, RegistryStats, TypeIndex};
pub use store::{HypergraphIndex, HypergraphStore, StoreStats};
pub use upload::{CategoryStats, UploadStats};
