//! Applying a single operation to a YAML document.

use serde_yaml::{Mapping, Value};

use crate::operation::{Operation, OperationKind};
use crate::path::{PathSegment, Segment};

/// Why an operation could not be applied. The composer adds the operation's
/// set, index and path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ApplyError {
    Missing {
        segment: String,
    },
    Mismatch {
        segment: String,
        expected: &'static str,
        found: &'static str,
    },
    Ambiguous {
        segment: String,
        count: usize,
    },
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Apply `op` to `document` in place.
pub(crate) fn apply(document: &mut Value, op: &Operation) -> Result<(), ApplyError> {
    let segments = op.path.segments();
    let Some((last, parents)) = segments.split_last() else {
        // Root path. Remove is rejected at parse time.
        if let Some(value) = &op.value {
            *document = value.clone();
        }
        return Ok(());
    };

    let create = op.kind != OperationKind::Remove;
    let mut current = document;
    for (position, segment) in parents.iter().enumerate() {
        let next = &segments[position + 1].segment;
        match descend(current, segment, next, create)? {
            Some(child) => current = child,
            // An optional parent is missing, so the remove has nothing to do.
            None => return Ok(()),
        }
    }

    match op.kind {
        OperationKind::Add => add(current, last, value_of(op)),
        OperationKind::Replace => replace(current, last, value_of(op)),
        OperationKind::Remove => remove(current, last),
    }
}

fn value_of(op: &Operation) -> Value {
    op.value.clone().unwrap_or(Value::Null)
}

/// An empty container suitable for holding `next`.
fn container_for(next: &Segment) -> Value {
    match next {
        Segment::Key(_) => Value::Mapping(Mapping::new()),
        Segment::Index(_) | Segment::Append | Segment::Match { .. } => {
            Value::Sequence(Vec::new())
        }
    }
}

fn matcher_element(field: &str, value: &str) -> Value {
    let mut element = Mapping::new();
    element.insert(Value::String(field.to_string()), Value::String(value.to_string()));
    Value::Mapping(element)
}

fn scalar_eq(candidate: &Value, expected: &str) -> bool {
    match candidate {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        _ => false,
    }
}

fn find_matches(items: &[Value], field: &str, value: &str) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.get(field).is_some_and(|v| scalar_eq(v, value)))
        .map(|(index, _)| index)
        .collect()
}

fn single_match(
    items: &[Value],
    field: &str,
    value: &str,
    segment: &PathSegment,
) -> Result<Option<usize>, ApplyError> {
    let matches = find_matches(items, field, value);
    match matches.as_slice() {
        [] => Ok(None),
        [index] => Ok(Some(*index)),
        _ => Err(ApplyError::Ambiguous {
            segment: segment.segment.to_string(),
            count: matches.len(),
        }),
    }
}

fn missing(segment: &PathSegment) -> ApplyError {
    ApplyError::Missing {
        segment: segment.segment.to_string(),
    }
}

fn mismatch(segment: &PathSegment, expected: &'static str, found: &Value) -> ApplyError {
    ApplyError::Mismatch {
        segment: segment.segment.to_string(),
        expected,
        found: kind_of(found),
    }
}

fn as_mapping<'v>(value: &'v mut Value, segment: &PathSegment) -> Result<&'v mut Mapping, ApplyError> {
    match value {
        Value::Mapping(map) => Ok(map),
        other => Err(mismatch(segment, "mapping", other)),
    }
}

fn as_sequence<'v>(
    value: &'v mut Value,
    segment: &PathSegment,
) -> Result<&'v mut Vec<Value>, ApplyError> {
    match value {
        Value::Sequence(items) => Ok(items),
        other => Err(mismatch(segment, "sequence", other)),
    }
}

/// An optional, null parent becomes the container its segment needs.
fn materialize(current: &mut Value, segment: &PathSegment) {
    if segment.optional && current.is_null() {
        *current = container_for(&segment.segment);
    }
}

/// Step into the child addressed by `segment`. Missing optional children are
/// created when `create` is set; otherwise `None` signals there is nothing
/// below to act on.
fn descend<'a>(
    current: &'a mut Value,
    segment: &PathSegment,
    next: &Segment,
    create: bool,
) -> Result<Option<&'a mut Value>, ApplyError> {
    let skip = |segment: &PathSegment| {
        if segment.optional {
            Ok(None)
        } else {
            Err(missing(segment))
        }
    };

    if create {
        materialize(current, segment);
    } else if segment.optional && current.is_null() {
        return Ok(None);
    }

    match &segment.segment {
        Segment::Key(key) => {
            let map = as_mapping(current, segment)?;
            let key = Value::String(key.clone());
            if !map.contains_key(&key) {
                if !create {
                    return skip(segment);
                }
                if !segment.optional {
                    return Err(missing(segment));
                }
                map.insert(key.clone(), container_for(next));
            }
            Ok(map.get_mut(&key))
        }
        Segment::Index(index) => {
            let items = as_sequence(current, segment)?;
            match items.get_mut(*index) {
                Some(item) => Ok(Some(item)),
                None if !create => skip(segment),
                None => Err(missing(segment)),
            }
        }
        Segment::Append => {
            let items = as_sequence(current, segment)?;
            if !create {
                return skip(segment);
            }
            if !segment.optional {
                return Err(missing(segment));
            }
            items.push(container_for(next));
            Ok(items.last_mut())
        }
        Segment::Match { field, value } => {
            let items = as_sequence(current, segment)?;
            let position = match single_match(items, field, value, segment)? {
                Some(position) => position,
                None if !create => return skip(segment),
                None if segment.optional => {
                    items.push(matcher_element(field, value));
                    items.len() - 1
                }
                None => return Err(missing(segment)),
            };
            Ok(items.get_mut(position))
        }
    }
}

fn add(current: &mut Value, segment: &PathSegment, value: Value) -> Result<(), ApplyError> {
    materialize(current, segment);

    match &segment.segment {
        Segment::Key(key) => {
            let map = as_mapping(current, segment)?;
            map.insert(Value::String(key.clone()), value);
            Ok(())
        }
        Segment::Index(index) => {
            let items = as_sequence(current, segment)?;
            if *index > items.len() {
                return Err(missing(segment));
            }
            items.insert(*index, value);
            Ok(())
        }
        Segment::Append => {
            let items = as_sequence(current, segment)?;
            items.push(value);
            Ok(())
        }
        Segment::Match { field, value: wanted } => {
            let items = as_sequence(current, segment)?;
            match single_match(items, field, wanted, segment)? {
                Some(position) => items[position] = value,
                None => items.push(value),
            }
            Ok(())
        }
    }
}

fn replace(current: &mut Value, segment: &PathSegment, value: Value) -> Result<(), ApplyError> {
    materialize(current, segment);

    match &segment.segment {
        Segment::Key(key) => {
            let map = as_mapping(current, segment)?;
            let key = Value::String(key.clone());
            if !map.contains_key(&key) && !segment.optional {
                return Err(missing(segment));
            }
            map.insert(key, value);
            Ok(())
        }
        Segment::Index(index) => {
            let items = as_sequence(current, segment)?;
            match items.get_mut(*index) {
                Some(item) => {
                    *item = value;
                    Ok(())
                }
                None => Err(missing(segment)),
            }
        }
        // Conventional ops files append with `replace` on `/-`.
        Segment::Append => {
            let items = as_sequence(current, segment)?;
            items.push(value);
            Ok(())
        }
        Segment::Match { field, value: wanted } => {
            let items = as_sequence(current, segment)?;
            match single_match(items, field, wanted, segment)? {
                Some(position) => items[position] = value,
                None if segment.optional => items.push(value),
                None => return Err(missing(segment)),
            }
            Ok(())
        }
    }
}

fn remove(current: &mut Value, segment: &PathSegment) -> Result<(), ApplyError> {
    match &segment.segment {
        Segment::Key(key) => {
            let map = as_mapping(current, segment)?;
            let key = Value::String(key.clone());
            if !map.contains_key(&key) {
                return if segment.optional {
                    Ok(())
                } else {
                    Err(missing(segment))
                };
            }
            // Rebuild to keep the remaining keys in their original order.
            let entries = std::mem::take(map);
            *map = entries.into_iter().filter(|(k, _)| *k != key).collect();
            Ok(())
        }
        Segment::Index(index) => {
            let items = as_sequence(current, segment)?;
            if *index < items.len() {
                items.remove(*index);
                Ok(())
            } else if segment.optional {
                Ok(())
            } else {
                Err(missing(segment))
            }
        }
        Segment::Append => Err(missing(segment)),
        Segment::Match { field, value } => {
            let items = as_sequence(current, segment)?;
            match single_match(items, field, value, segment)? {
                Some(position) => {
                    items.remove(position);
                    Ok(())
                }
                None if segment.optional => Ok(()),
                None => Err(missing(segment)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::parse_operations;

    fn doc(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    fn apply_all(document: &mut Value, ops: &str) -> Result<(), ApplyError> {
        for op in parse_operations("test", ops).unwrap() {
            apply(document, &op)?;
        }
        Ok(())
    }

    const BASE: &str = r#"
name: bosh
releases:
- name: bosh
  version: "270"
instance_groups:
- name: bosh
  jobs:
  - name: nats
  - name: postgres
  properties:
    director:
      name: bosh
"#;

    #[test]
    fn test_add_appends_to_sequence() {
        let mut d = doc(BASE);
        apply_all(&mut d, "- type: add\n  path: /releases/-\n  value: {name: cpi}\n").unwrap();
        assert_eq!(d["releases"][1]["name"].as_str(), Some("cpi"));
    }

    #[test]
    fn test_add_inserts_at_index() {
        let mut d = doc(BASE);
        apply_all(&mut d, "- type: add\n  path: /releases/0\n  value: {name: first}\n").unwrap();
        assert_eq!(d["releases"][0]["name"].as_str(), Some("first"));
        assert_eq!(d["releases"][1]["name"].as_str(), Some("bosh"));
    }

    #[test]
    fn test_add_through_matcher() {
        let mut d = doc(BASE);
        apply_all(
            &mut d,
            "- type: add\n  path: /instance_groups/name=bosh/properties/director/trusted_certs\n  value: cert\n",
        )
        .unwrap();
        assert_eq!(
            d["instance_groups"][0]["properties"]["director"]["trusted_certs"].as_str(),
            Some("cert")
        );
    }

    #[test]
    fn test_add_missing_intermediate_fails() {
        let mut d = doc(BASE);
        let err = apply_all(
            &mut d,
            "- type: add\n  path: /resource_pools/name=vms/cloud_properties/instance_type\n  value: m4.large\n",
        )
        .unwrap_err();
        assert_eq!(
            err,
            ApplyError::Missing {
                segment: "resource_pools".to_string()
            }
        );
        assert!(d.get("resource_pools").is_none());
    }

    #[test]
    fn test_add_optional_creates_intermediates() {
        let mut d = doc(BASE);
        apply_all(
            &mut d,
            "- type: add\n  path: /resource_pools?/name=vms/cloud_properties/instance_type\n  value: m4.large\n",
        )
        .unwrap();
        assert_eq!(d["resource_pools"][0]["name"].as_str(), Some("vms"));
        assert_eq!(
            d["resource_pools"][0]["cloud_properties"]["instance_type"].as_str(),
            Some("m4.large")
        );
    }

    #[test]
    fn test_replace_requires_existing_target() {
        let mut d = doc(BASE);
        let err = apply_all(&mut d, "- type: replace\n  path: /director_uuid\n  value: x\n").unwrap_err();
        assert!(matches!(err, ApplyError::Missing { .. }));

        apply_all(&mut d, "- type: replace\n  path: /name\n  value: director\n").unwrap();
        assert_eq!(d["name"].as_str(), Some("director"));
    }

    #[test]
    fn test_replace_optional_creates_target() {
        let mut d = doc(BASE);
        apply_all(
            &mut d,
            "- type: replace\n  path: /instance_groups/name=bosh/properties/director/default_ssh_options?/gw_host\n  value: 1.2.3.4\n",
        )
        .unwrap();
        assert_eq!(
            d["instance_groups"][0]["properties"]["director"]["default_ssh_options"]["gw_host"].as_str(),
            Some("1.2.3.4")
        );
    }

    #[test]
    fn test_remove() {
        let mut d = doc(BASE);
        apply_all(
            &mut d,
            "- type: remove\n  path: /instance_groups/name=bosh/jobs/name=postgres\n",
        )
        .unwrap();
        assert_eq!(d["instance_groups"][0]["jobs"].as_sequence().unwrap().len(), 1);

        let err = apply_all(&mut d, "- type: remove\n  path: /instance_groups/name=bosh/jobs/name=postgres\n")
            .unwrap_err();
        assert!(matches!(err, ApplyError::Missing { .. }));

        apply_all(&mut d, "- type: remove\n  path: /instance_groups/name=bosh/jobs/name=postgres?\n").unwrap();
    }

    #[test]
    fn test_remove_keeps_key_order() {
        let mut d = doc("a: 1\nb: 2\nc: 3\n");
        apply_all(&mut d, "- type: remove\n  path: /b\n").unwrap();
        let keys: Vec<_> = d.as_mapping().unwrap().keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_type_mismatch() {
        let mut d = doc(BASE);
        let err = apply_all(&mut d, "- type: add\n  path: /name/0\n  value: x\n").unwrap_err();
        assert_eq!(
            err,
            ApplyError::Mismatch {
                segment: "0".to_string(),
                expected: "sequence",
                found: "string"
            }
        );
    }

    #[test]
    fn test_ambiguous_matcher() {
        let mut d = doc("jobs:\n- name: a\n- name: a\n");
        let err = apply_all(&mut d, "- type: replace\n  path: /jobs/name=a\n  value: {name: b}\n").unwrap_err();
        assert!(matches!(err, ApplyError::Ambiguous { count: 2, .. }));
    }

    #[test]
    fn test_replace_root() {
        let mut d = doc(BASE);
        apply_all(&mut d, "- type: replace\n  path: /\n  value: {name: other}\n").unwrap();
        assert_eq!(d, doc("name: other\n"));
    }
}
