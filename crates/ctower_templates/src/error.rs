//! Error types for template rendering.

use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while rendering a template.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template {template}: unresolved placeholder <% {path} %> at line {line}")]
    UnresolvedField {
        template: String,
        path: String,
        line: usize,
    },

    #[error("template {template}: placeholder <% {path} %> at line {line} does not resolve to a scalar or list")]
    NotScalar {
        template: String,
        path: String,
        line: usize,
    },

    #[error("template {template}: malformed placeholder at line {line}: {message}")]
    Syntax {
        template: String,
        line: usize,
        message: String,
    },

    #[error("template {template}: invalid YAML: {source}")]
    Yaml {
        template: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid field path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("Variables must serialize to a record, got {0}")]
    NotARecord(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TemplateError {
    /// The field path an unresolved or non-scalar placeholder referred to.
    pub fn field_path(&self) -> Option<&str> {
        match self {
            TemplateError::UnresolvedField { path, .. } | TemplateError::NotScalar { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }
}
