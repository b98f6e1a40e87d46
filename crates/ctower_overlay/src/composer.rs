//! Overlay composition.
//!
//! Composition renders the base document and every operation set against the
//! variables, concatenates the operations in the order the sets were given,
//! then applies them one by one. Later operations win over earlier ones at
//! the same path. Any failure aborts the whole composition.
//!
//! Placeholders are filled in the parsed YAML of each document, never in its
//! text, so a value cannot change the structure around it.

use serde_yaml::Value;
use tracing::{debug, info};

use ctower_templates::{to_yaml_string, TemplateError, TemplateRenderer, Variables};

use crate::error::{ComposeError, ComposeResult};
use crate::operation::{operations_from_value, Operation, OperationSet};
use crate::patch::{self, ApplyError};

/// A named skeleton document with placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseDocument {
    name: String,
    text: String,
}

impl BaseDocument {
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
}

/// An operation together with where it came from.
struct PlannedOperation<'s> {
    set: &'s str,
    index: usize,
    operation: Operation,
}

/// Composes base documents with ordered operation sets.
#[derive(Debug, Clone)]
pub struct OverlayComposer {
    renderer: TemplateRenderer,
}

impl Default for OverlayComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayComposer {
    pub fn new() -> Self {
        Self {
            renderer: TemplateRenderer::new(),
        }
    }

    /// Compose `base` with `sets`, in order, and return the final YAML text.
    pub fn compose<'s>(
        &self,
        base: &BaseDocument,
        sets: impl IntoIterator<Item = &'s OperationSet>,
        variables: &Variables,
    ) -> ComposeResult<String> {
        let document = self.compose_value(base, sets, variables)?;
        to_yaml_string(&document).map_err(ComposeError::Serialize)
    }

    /// Compose and return the document tree instead of text.
    pub fn compose_value<'s>(
        &self,
        base: &BaseDocument,
        sets: impl IntoIterator<Item = &'s OperationSet>,
        variables: &Variables,
    ) -> ComposeResult<Value> {
        let mut document = self.render_base(base, variables)?;

        let mut set_names = Vec::new();
        let mut plan = Vec::new();
        for set in sets {
            set_names.push(set.name());
            plan.extend(self.render_set(set, variables)?);
        }

        info!(
            "Composing {} with {} operation sets [{}] ({} operations)",
            base.name(),
            set_names.len(),
            set_names.join(", "),
            plan.len()
        );

        for planned in &plan {
            debug!(
                "Applying {} {} from {}",
                planned.operation.kind, planned.operation.path, planned.set
            );
            patch::apply(&mut document, &planned.operation)
                .map_err(|e| contextualize(planned, e))?;
        }

        Ok(document)
    }

    fn render_base(&self, base: &BaseDocument, variables: &Variables) -> ComposeResult<Value> {
        self.renderer
            .render_yaml(base.name(), base.text(), variables)
            .map_err(|error| match error {
                TemplateError::Yaml { source, .. } => ComposeError::InvalidDocument {
                    document: base.name().to_string(),
                    source,
                },
                source => ComposeError::UnresolvedVariable {
                    set: base.name().to_string(),
                    source,
                },
            })
    }

    fn render_set<'s>(
        &self,
        set: &'s OperationSet,
        variables: &Variables,
    ) -> ComposeResult<Vec<PlannedOperation<'s>>> {
        let rendered = self
            .renderer
            .render_yaml(set.name(), set.text(), variables)
            .map_err(|error| match error {
                TemplateError::Yaml { source, .. } => ComposeError::InvalidOperations {
                    set: set.name().to_string(),
                    source,
                },
                source => ComposeError::UnresolvedVariable {
                    set: set.name().to_string(),
                    source,
                },
            })?;

        let operations = operations_from_value(set.name(), rendered)?;
        Ok(operations
            .into_iter()
            .enumerate()
            .map(|(index, operation)| PlannedOperation {
                set: set.name(),
                index,
                operation,
            })
            .collect())
    }
}

fn contextualize(planned: &PlannedOperation<'_>, error: ApplyError) -> ComposeError {
    let set = planned.set.to_string();
    let index = planned.index;
    let kind = planned.operation.kind;
    let path = planned.operation.path.to_string();

    match error {
        ApplyError::Missing { segment } => ComposeError::MissingPath {
            set,
            index,
            kind,
            path,
            segment,
        },
        ApplyError::Mismatch {
            segment,
            expected,
            found,
        } => ComposeError::TypeMismatch {
            set,
            index,
            kind,
            path,
            segment,
            expected,
            found,
        },
        ApplyError::Ambiguous { segment, count } => ComposeError::AmbiguousMatch {
            set,
            index,
            kind,
            path,
            segment,
            count,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BaseDocument {
        BaseDocument::new(
            "director",
            "name: <% .director_name %>\nnetworks:\n- name: default\n  subnets:\n  - range: <% .internal_cidr %>\n",
        )
    }

    fn vars() -> Variables {
        Variables::new()
            .with("director_name", "bosh-concourse")
            .with("internal_cidr", "10.0.0.0/24")
            .with("external_ip", "52.1.2.3")
    }

    #[test]
    fn test_compose_without_operations() {
        let composer = OverlayComposer::new();
        let doc = composer.compose_value(&base(), [], &vars()).unwrap();
        assert_eq!(doc["name"].as_str(), Some("bosh-concourse"));
        assert_eq!(doc["networks"][0]["subnets"][0]["range"].as_str(), Some("10.0.0.0/24"));
    }

    #[test]
    fn test_operations_see_variables() {
        let set = OperationSet::new(
            "external-ip",
            "- type: add\n  path: /networks/-\n  value: {name: public, static_ips: [<% .external_ip %>]}\n",
        );
        let doc = OverlayComposer::new()
            .compose_value(&base(), [&set], &vars())
            .unwrap();
        assert_eq!(doc["networks"][1]["static_ips"][0].as_str(), Some("52.1.2.3"));
    }

    #[test]
    fn test_unresolved_variable_in_base() {
        let err = OverlayComposer::new()
            .compose(&base(), [], &Variables::new().with("director_name", "x"))
            .unwrap_err();
        match err {
            ComposeError::UnresolvedVariable { set, source } => {
                assert_eq!(set, "director");
                assert_eq!(source.field_path(), Some(".internal_cidr"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_failure_carries_operation_context() {
        let set = OperationSet::new(
            "custom",
            "- type: replace\n  path: /name\n  value: ok\n- type: replace\n  path: /director_uuid\n  value: x\n",
        );
        let err = OverlayComposer::new()
            .compose(&base(), [&set], &vars())
            .unwrap_err();
        assert!(matches!(
            err,
            ComposeError::MissingPath { ref set, index: 1, ref segment, .. }
                if set == "custom" && segment == "director_uuid"
        ));
        assert_eq!(err.operation_path(), Some("/director_uuid"));
    }
}
