//! Placeholder substitution.
//!
//! Placeholders are written `<% .field %>` or `<% .group.field %>` and are
//! resolved against a [`Variables`] record. Rendering is single pass: values
//! are inserted as-is and never rescanned. Any placeholder that fails to
//! resolve aborts the render and no partial output is returned.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{TemplateError, TemplateResult};
use crate::vars::{FieldPath, Variables};

pub(crate) static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<%\s*(.*?)\s*%>").expect("placeholder pattern is valid"));

const OPEN: &str = "<%";

/// Template renderer for `<% .field %>` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render `template`, replacing every placeholder with its value.
    ///
    /// Scalars are written verbatim and lists as `[a, b]`. `name`
    /// identifies the template in error messages.
    pub fn render(&self, name: &str, template: &str, variables: &Variables) -> TemplateResult<String> {
        let (output, substitutions) = substitute(name, template, variables, text_value)?;
        debug!("Rendered template {} ({} substitutions)", name, substitutions);
        Ok(output)
    }
}

/// Walk `template` placeholder by placeholder, writing `format(value)` in
/// place of each one.
///
/// Every placeholder must parse and resolve; errors carry the 1-based line
/// of the placeholder.
pub(crate) fn substitute(
    name: &str,
    template: &str,
    variables: &Variables,
    format: impl Fn(&Value) -> Option<String>,
) -> TemplateResult<(String, usize)> {
    let mut output = String::with_capacity(template.len());
    let mut last = 0;
    let mut line = 1;
    let mut substitutions = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        let gap = &template[last..whole.start()];
        check_gap(name, gap, line)?;
        line += count_lines(gap);

        let expr = caps.get(1).map_or("", |m| m.as_str());
        let path = parse_path(name, expr, line)?;
        let value = resolve(name, &path, variables, line)?;
        let rendered = format(value).ok_or_else(|| TemplateError::NotScalar {
            template: name.to_string(),
            path: path.to_string(),
            line,
        })?;

        output.push_str(gap);
        output.push_str(&rendered);
        line += count_lines(whole.as_str());
        last = whole.end();
        substitutions += 1;
    }

    let tail = &template[last..];
    check_gap(name, tail, line)?;
    output.push_str(tail);

    Ok((output, substitutions))
}

pub(crate) fn parse_path(name: &str, expr: &str, line: usize) -> TemplateResult<FieldPath> {
    expr.parse::<FieldPath>().map_err(|e| TemplateError::Syntax {
        template: name.to_string(),
        line,
        message: e.to_string(),
    })
}

pub(crate) fn resolve<'v>(
    name: &str,
    path: &FieldPath,
    variables: &'v Variables,
    line: usize,
) -> TemplateResult<&'v Value> {
    variables
        .resolve(path)
        .ok_or_else(|| TemplateError::UnresolvedField {
            template: name.to_string(),
            path: path.to_string(),
            line,
        })
}

/// Text outside placeholders must not open one that never closes.
fn check_gap(name: &str, gap: &str, line: usize) -> TemplateResult<()> {
    match gap.find(OPEN) {
        Some(offset) => Err(TemplateError::Syntax {
            template: name.to_string(),
            line: line + count_lines(&gap[..offset]),
            message: "unterminated placeholder".to_string(),
        }),
        None => Ok(()),
    }
}

pub(crate) fn count_lines(s: &str) -> usize {
    s.bytes().filter(|b| *b == b'\n').count()
}

fn text_scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some("null".to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let items = items.iter().map(text_scalar).collect::<Option<Vec<_>>>()?;
            Some(format!("[{}]", items.join(", ")))
        }
        other => text_scalar(other),
    }
}
