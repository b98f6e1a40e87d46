//! Operation sets and their parsed operations.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use ctower_templates::is_blank_document;

use crate::error::{ComposeError, ComposeResult};
use crate::path::{OpsPath, Segment};

/// The action an operation performs at its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Add,
    Replace,
    Remove,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Add => "add",
            OperationKind::Replace => "replace",
            OperationKind::Remove => "remove",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single parsed operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub path: OpsPath,
    /// Present for `add` and `replace`.
    pub value: Option<Value>,
}

#[derive(Deserialize)]
struct RawOperation {
    #[serde(rename = "type")]
    kind: OperationKind,
    path: String,
    #[serde(default)]
    value: Option<Value>,
}

/// A named, ordered bundle of operations kept as text until composition,
/// since its values may reference variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSet {
    name: String,
    text: String,
}

impl OperationSet {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parse the set's text as-is, without variable substitution.
    pub fn parse(&self) -> ComposeResult<Vec<Operation>> {
        parse_operations(&self.name, &self.text)
    }
}

/// Parse operation text belonging to the set `set`.
///
/// Text holding only comments or document markers yields no operations.
pub fn parse_operations(set: &str, text: &str) -> ComposeResult<Vec<Operation>> {
    if is_blank_document(text) {
        return Ok(Vec::new());
    }

    let document: Value =
        serde_yaml::from_str(text).map_err(|source| ComposeError::InvalidOperations {
            set: set.to_string(),
            source,
        })?;
    operations_from_value(set, document)
}

/// Build the operations of `set` from its already parsed document.
pub fn operations_from_value(set: &str, document: Value) -> ComposeResult<Vec<Operation>> {
    if document.is_null() {
        return Ok(Vec::new());
    }

    let raw: Vec<RawOperation> =
        serde_yaml::from_value(document).map_err(|source| ComposeError::InvalidOperations {
            set: set.to_string(),
            source,
        })?;

    raw.into_iter()
        .enumerate()
        .map(|(index, op)| build_operation(set, index, op))
        .collect()
}

fn build_operation(set: &str, index: usize, raw: RawOperation) -> ComposeResult<Operation> {
    let invalid_path = |message: String| ComposeError::InvalidPath {
        set: set.to_string(),
        index,
        path: raw.path.clone(),
        message,
    };

    let path: OpsPath = raw.path.parse().map_err(invalid_path)?;

    match raw.kind {
        OperationKind::Add | OperationKind::Replace if raw.value.is_none() => {
            return Err(ComposeError::MissingValue {
                set: set.to_string(),
                index,
                kind: raw.kind,
            });
        }
        OperationKind::Remove if path.is_root() => {
            return Err(invalid_path("cannot remove the document root".to_string()));
        }
        OperationKind::Remove
            if matches!(path.segments().last(), Some(last) if last.segment == Segment::Append) =>
        {
            return Err(invalid_path("cannot remove '-'".to_string()));
        }
        _ => {}
    }

    Ok(Operation {
        kind: raw.kind,
        path,
        value: raw.value,
    })
}
