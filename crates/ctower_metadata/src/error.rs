//! Error types for provisioning output metadata.

use thiserror::Error;

/// Result type alias for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors that can occur while decoding or querying provisioning outputs.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to decode provisioning output: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Provisioning output is missing required fields: {}", missing.join(", "))]
    MissingFields { missing: Vec<String> },

    #[error("{name} key not found")]
    FieldNotFound { name: String },
}
