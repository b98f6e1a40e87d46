//! Error types for provider adapters.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for IaaS operations.
pub type IaasResult<T> = Result<T, IaasError>;

/// Errors that can occur while assembling provider documents.
#[derive(Error, Debug)]
pub enum IaasError {
    #[error("Unknown IaaS: {0} (expected one of: aws, gcp)")]
    UnknownIaas(String),

    #[error("Metadata error: {0}")]
    Metadata(#[from] ctower_metadata::MetadataError),

    #[error("Template error: {0}")]
    Template(#[from] ctower_templates::TemplateError),

    #[error("Compose error: {0}")]
    Compose(#[from] ctower_overlay::ComposeError),

    #[error("Stemcell version for alias '{alias}' not found in {document}")]
    StemcellVersionNotFound { alias: String, document: String },

    #[error("Invalid value '{value}' for {field}: {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    #[error("Settings are missing required values: {}", missing.join(", "))]
    MissingSettings { missing: Vec<String> },

    #[error("Invalid bundled resource {resource}: {source}")]
    InvalidResource {
        resource: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse settings file {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
