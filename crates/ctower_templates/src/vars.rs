//! Variable records and field paths.
//!
//! A [`Variables`] record is the flat set of named values a template or an
//! operation set may reference. Values are scalars (strings, booleans, numbers)
//! or lists of scalars; nested records are allowed so that grouped values such
//! as release references can be addressed as `.cpi.url`.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{TemplateError, TemplateResult};

/// A dotted field path such as `.cpi.url`, resolved against a [`Variables`] record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl FromStr for FieldPath {
    type Err = TemplateError;

    fn from_str(s: &str) -> TemplateResult<Self> {
        let invalid = |message: &str| TemplateError::InvalidPath {
            path: s.to_string(),
            message: message.to_string(),
        };

        let rest = s
            .strip_prefix('.')
            .ok_or_else(|| invalid("field paths start with '.'"))?;
        if rest.is_empty() {
            return Err(invalid("empty field path"));
        }

        let mut segments = Vec::new();
        for ident in rest.split('.') {
            if !is_identifier(ident) {
                return Err(invalid(&format!("'{}' is not an identifier", ident)));
            }
            segments.push(ident.to_string());
        }

        Ok(Self { segments })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Named values available to templates and operation sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    fields: Map<String, Value>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from any serializable struct. `None` fields are left out,
    /// so a placeholder naming one fails to resolve.
    pub fn from_serialize<T: Serialize>(value: &T) -> TemplateResult<Self> {
        match serde_json::to_value(value)? {
            Value::Object(fields) => Ok(Self {
                fields: fields.into_iter().filter(|(_, v)| !v.is_null()).collect(),
            }),
            other => Err(TemplateError::NotARecord(json_kind(&other).to_string())),
        }
    }

    /// Add or overwrite a field.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Resolve a field path, descending through nested records.
    pub fn resolve(&self, path: &FieldPath) -> Option<&Value> {
        let (first, rest) = path.segments().split_first()?;
        let mut current = self.fields.get(first)?;
        for segment in rest {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "record",
    }
}
