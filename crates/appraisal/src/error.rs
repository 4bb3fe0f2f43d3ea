//! Error types for the pipeline

use crate::model::ModelError;
use appraisal_db::DbError;
use appraisal_protocol::RecordSetError;
use thiserror::Error;

/// Pipeline result type.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline error type
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Required fields absent from the input
    #[error("Missing required fields: {0:?}")]
    SchemaViolation(Vec<String>),

    /// Category outside the configured vocabulary
    #[error("Unknown category '{category}' in column '{column}'")]
    UnknownCategory { column: String, category: String },

    /// Every input row was removed during cleaning
    #[error("No rows left to predict after removing null values")]
    EmptyInput,

    #[error("Failed to load input: {0}")]
    Load(String),

    #[error("Record set error: {0}")]
    RecordSet(#[from] RecordSetError),

    #[error(transparent)]
    Store(#[from] DbError),

    #[error("Model error: {0}")]
    UpstreamModel(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True when the caller's input caused the failure (maps to 4xx).
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::SchemaViolation(_)
            | Self::UnknownCategory { .. }
            | Self::EmptyInput
            | Self::Load(_)
            | Self::RecordSet(_) => true,
            Self::Store(err) => err.is_client_error(),
            Self::UpstreamModel(_) | Self::Io(_) | Self::Config(_) => false,
        }
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        if !err.is_io_error() {
            return Self::Load(err.to_string());
        }
        match err.into_kind() {
            csv::ErrorKind::Io(io) => Self::Io(io),
            other => Self::Load(format!("{:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classes() {
        assert!(PipelineError::SchemaViolation(vec!["MEDIAN_INCOME".into()]).is_client_error());
        assert!(PipelineError::EmptyInput.is_client_error());
        assert!(PipelineError::Store(DbError::unsupported_target("foo")).is_client_error());
        assert!(!PipelineError::Store(DbError::Io(std::io::Error::other("disk"))).is_client_error());
        assert!(!PipelineError::UpstreamModel(ModelError::Shape {
            expected: 2,
            found: 1
        })
        .is_client_error());
    }

    #[test]
    fn test_schema_violation_lists_fields() {
        let err = PipelineError::SchemaViolation(vec!["MEDIAN_INCOME".into(), "AGENCY".into()]);
        assert_eq!(
            err.to_string(),
            "Missing required fields: [\"MEDIAN_INCOME\", \"AGENCY\"]"
        );
    }
}
