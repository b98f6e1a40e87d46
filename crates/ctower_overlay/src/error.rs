//! Error types for overlay composition.

use thiserror::Error;

use ctower_templates::TemplateError;

use crate::operation::OperationKind;

/// Result type alias for composition.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Errors that can occur while composing a document.
///
/// Operation failures carry the operation set name, the operation's index
/// within that set and its path.
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Failed to parse document {document}: {source}")]
    InvalidDocument {
        document: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse operation set {set}: {source}")]
    InvalidOperations {
        set: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Operation {index} in {set}: invalid path '{path}': {message}")]
    InvalidPath {
        set: String,
        index: usize,
        path: String,
        message: String,
    },

    #[error("Operation {index} in {set}: {kind} requires a value")]
    MissingValue {
        set: String,
        index: usize,
        kind: OperationKind,
    },

    #[error("Unresolved variable in {set}: {source}")]
    UnresolvedVariable {
        set: String,
        #[source]
        source: TemplateError,
    },

    #[error("Operation {index} in {set} ({kind} {path}): missing path segment '{segment}'")]
    MissingPath {
        set: String,
        index: usize,
        kind: OperationKind,
        path: String,
        segment: String,
    },

    #[error("Operation {index} in {set} ({kind} {path}): expected {expected} at '{segment}', found {found}")]
    TypeMismatch {
        set: String,
        index: usize,
        kind: OperationKind,
        path: String,
        segment: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Operation {index} in {set} ({kind} {path}): '{segment}' matched {count} items, expected one")]
    AmbiguousMatch {
        set: String,
        index: usize,
        kind: OperationKind,
        path: String,
        segment: String,
        count: usize,
    },

    #[error("Failed to serialize composed document: {0}")]
    Serialize(#[source] serde_yaml::Error),
}

impl ComposeError {
    /// Path of the operation that failed, if the failure came from one.
    pub fn operation_path(&self) -> Option<&str> {
        match self {
            ComposeError::InvalidPath { path, .. }
            | ComposeError::MissingPath { path, .. }
            | ComposeError::TypeMismatch { path, .. }
            | ComposeError::AmbiguousMatch { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Name of the operation set or document the failure came from.
    pub fn source_name(&self) -> Option<&str> {
        match self {
            ComposeError::InvalidDocument { document, .. } => Some(document),
            ComposeError::InvalidOperations { set, .. }
            | ComposeError::InvalidPath { set, .. }
            | ComposeError::MissingValue { set, .. }
            | ComposeError::UnresolvedVariable { set, .. }
            | ComposeError::MissingPath { set, .. }
            | ComposeError::TypeMismatch { set, .. }
            | ComposeError::AmbiguousMatch { set, .. } => Some(set),
            ComposeError::Serialize(_) => None,
        }
    }
}
