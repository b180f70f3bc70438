//! Error types for the tabtext pipeline

use thiserror::Error;

/// Result type alias for tabtext operations
pub type Result<T> = std::result::Result<T, TabTextError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum TabTextError {
    /// Empty or malformed row set, nothing to infer a schema from
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// A referenced column does not exist in the schema
    #[error("Invalid column: {0}")]
    InvalidColumn(String),

    /// Informational only. Category and vocabulary truncation are silent
    /// capacity bounds; the pipeline never returns this variant.
    #[error("Capacity exceeded for {what}: limit {limit}, found {actual}")]
    CapacityExceeded {
        what: String,
        limit: usize,
        actual: usize,
    },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Session is busy with another prepare call")]
    SessionBusy,

    #[error("No dataset loaded")]
    NotLoaded,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },
}

impl From<polars::error::PolarsError> for TabTextError {
    fn from(err: polars::error::PolarsError) -> Self {
        TabTextError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for TabTextError {
    fn from(err: serde_json::Error) -> Self {
        TabTextError::SerializationError(err.to_string())
    }
}
