//! Storage error types

use hyperstore_core::{Category, ErrorKind};
use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Storage-specific error types
#[derive(Error, Debug)]
pub enum StorageError {
    #[error(transparent)]
    Core(#[from] hyperstore_core::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store is opened read-only, cannot {0}")]
    ReadOnly(String),

    #[error("Upload cancelled")]
    Cancelled,

    #[error("Lock poisoned: {0}")]
    Lock(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Unknown {category} type {name}")]
    UnknownType { category: Category, name: String },

    #[error("{context} needs schema {schema_id}, which is not registered")]
    UnknownSchema { context: String, schema_id: String },

    #[error("{what} {name} is already registered")]
    Duplicate { what: String, name: String },

    #[error("Database error: {0}")]
    Database(String),
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(e) => e.kind(),
            Self::UnknownType { .. } | Self::UnknownSchema { .. } | Self::Duplicate { .. } => {
                ErrorKind::Configuration
            }
            Self::ReadOnly(_) => ErrorKind::Request,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Sqlite(_)
            | Self::Serialization(_)
            | Self::Lock(_)
            | Self::Migration(_)
            | Self::Database(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_core_errors() {
        let err = StorageError::from(hyperstore_core::Error::InvalidRequest("x".into()));
        assert_eq!(err.kind(), ErrorKind::Request);
        assert_eq!(StorageError::Cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(
            StorageError::UnknownType {
                category: Category::Edge,
                name: "interacts".into()
            }
            .to_string(),
            "Unknown edge type interacts"
        );
    }
}
