//! Error types for the persistence layer.

use appraisal_protocol::RecordSetError;
use thiserror::Error;

/// Database operation result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error (connection, query, constraint, busy store)
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// IO error (file system operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller supplied an incomplete or inconsistent request
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Write target that is not one of the known tables
    #[error("Unsupported table name: {0}")]
    UnsupportedTarget(String),

    /// Batch columns that the established table does not have
    #[error("Schema mismatch for table '{table}': unknown columns {columns:?}")]
    SchemaMismatch { table: String, columns: Vec<String> },

    /// Batch columns whose values the store assigns itself
    #[error("Reserved columns in batch for table '{table}': {columns:?}")]
    ReservedColumns { table: String, columns: Vec<String> },

    /// Rows read back could not form a record set
    #[error("Record set error: {0}")]
    RecordSet(#[from] RecordSetError),
}

impl DbError {
    /// Create an invalid arguments error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create an unsupported target error.
    pub fn unsupported_target(name: impl Into<String>) -> Self {
        Self::UnsupportedTarget(name.into())
    }

    /// True when the error comes from the caller's request rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArguments(_)
                | Self::UnsupportedTarget(_)
                | Self::SchemaMismatch { .. }
                | Self::ReservedColumns { .. }
        )
    }
}
