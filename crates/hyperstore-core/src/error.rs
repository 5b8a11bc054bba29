//! Error types for Hyperstore Core

use thiserror::Error;

/// Result type alias using Hyperstore's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification used by callers to decide how to report a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Manifest or mapping problems detected before any row is processed
    Configuration,
    /// A row could not be turned into a valid record
    Data,
    /// A read request violated a domain rule
    Request,
    /// The operation was cancelled by the caller
    Cancelled,
    /// Anything else (I/O, database, serialization)
    Internal,
}

/// Hyperstore error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Column {column} {context}, is not available in columns from file {file}")]
    MissingColumn {
        column: String,
        context: String,
        file: String,
    },

    #[error("Unknown typecast '{cast}' for column {column} in file {file}")]
    UnknownCast {
        column: String,
        cast: String,
        file: String,
    },

    #[error("File {0} does not contain a header (empty or all comments?)")]
    MissingHeader(String),

    #[error(
        "Mismatch in expected number of columns at line {line} from {file}: {expected} vs {found}"
    )]
    ColumnCount {
        file: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line} from {file} depends on {category} {key} which is not stored yet (or has wrong identifiers)")]
    UnresolvedReference {
        file: String,
        line: usize,
        category: String,
        key: String,
    },

    #[error("Line {line} from {file}: {message}")]
    TypeMismatch {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Line {line} from {file}: cannot cast '{value}' to {cast}")]
    BadCast {
        file: String,
        line: usize,
        value: String,
        cast: String,
    },

    #[error("{context} failed validation with {} error(s): {}", .errors.len(), .errors.join("; "))]
    SchemaViolation { context: String, errors: Vec<String> },

    #[error("{manifest} manifest is invalid: {}", .errors.join("; "))]
    InvalidManifest { manifest: String, errors: Vec<String> },

    #[error("Invalid JSON Schema {schema_id}: {reason}")]
    InvalidSchema { schema_id: String, reason: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Lookup failed: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_)
            | Self::MissingColumn { .. }
            | Self::UnknownCast { .. }
            | Self::MissingHeader(_)
            | Self::InvalidManifest { .. }
            | Self::InvalidSchema { .. } => ErrorKind::Configuration,
            Self::ColumnCount { .. }
            | Self::UnresolvedReference { .. }
            | Self::TypeMismatch { .. }
            | Self::BadCast { .. }
            | Self::SchemaViolation { .. } => ErrorKind::Data,
            Self::InvalidRequest(_) => ErrorKind::Request,
            Self::Backend(_) | Self::Io { .. } | Self::Serialization(_) | Self::Yaml(_) => {
                ErrorKind::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::Config("x".into()).kind(), ErrorKind::Configuration);
        assert_eq!(
            Error::ColumnCount {
                file: "a.tsv".into(),
                line: 3,
                expected: 2,
                found: 3
            }
            .kind(),
            ErrorKind::Data
        );
        assert_eq!(Error::InvalidRequest("x".into()).kind(), ErrorKind::Request);
    }

    #[test]
    fn test_schema_violation_lists_every_error() {
        let err = Error::SchemaViolation {
            context: "Node data from line 4 in genes.tsv".into(),
            errors: vec!["/name: missing".into(), "/score: not a number".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 error(s)"));
        assert!(msg.contains("/name: missing"));
        assert!(msg.contains("/score: not a number"));
    }
}
