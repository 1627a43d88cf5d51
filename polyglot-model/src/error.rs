//! Error types for the model layer.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while validating schemas or converting records.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The schema declaration is inconsistent.
    #[error("invalid schema for {entity_type}: {reason}")]
    InvalidSchema { entity_type: String, reason: String },

    /// An entity type was registered twice.
    #[error("entity type already registered: {0}")]
    DuplicateEntity(String),

    /// A record lacks a value for one of its key columns.
    #[error("record for {entity_type} is missing key column {column}")]
    MissingKey { entity_type: String, column: String },

    /// Record values were not a JSON object.
    #[error("record values must be a JSON object, got {0}")]
    NotAnObject(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
