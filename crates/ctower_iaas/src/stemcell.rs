//! Stemcell version lookup in release versions documents.
//!
//! A release versions document is an operation set (JSON or YAML) that pins
//! releases and stemcells, for example:
//!
//! ```json
//! [{"type": "replace", "path": "/stemcells/alias=xenial/version", "value": "621.5"}]
//! ```

use serde_yaml::Value;
use tracing::debug;

use ctower_overlay::{parse_operations, Segment};

use crate::error::{IaasError, IaasResult};
use crate::provider::IaasKind;

const DOCUMENT: &str = "release versions";

/// Find the version pinned for stemcell `alias`.
///
/// The first operation targeting `/stemcells/alias=<alias>/version` wins.
pub fn stemcell_version(release_versions: &str, alias: &str) -> IaasResult<String> {
    let operations = parse_operations(DOCUMENT, release_versions)?;

    for operation in &operations {
        let segments: Vec<&Segment> = operation.path.segments().iter().map(|s| &s.segment).collect();
        let targets_alias = matches!(
            segments.as_slice(),
            [Segment::Key(stemcells), Segment::Match { field, value }, Segment::Key(version)]
                if stemcells == "stemcells" && field == "alias" && value == alias && version == "version"
        );
        if !targets_alias {
            continue;
        }

        let version = match &operation.value {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => continue,
        };
        if version.trim().is_empty() {
            continue;
        }

        debug!("Stemcell {} pinned at {}", alias, version);
        return Ok(version);
    }

    Err(IaasError::StemcellVersionNotFound {
        alias: alias.to_string(),
        document: DOCUMENT.to_string(),
    })
}

/// Resolve the stemcell download URL for `kind`.
///
/// Every adapter's [`Iaas::resolve_stemcell_location`](crate::Iaas::resolve_stemcell_location)
/// delegates here. Only the release versions document is read, so callers
/// without provisioning output can resolve a location without an adapter.
pub fn stemcell_location(kind: IaasKind, release_versions: &str) -> IaasResult<String> {
    let version = stemcell_version(release_versions, kind.stemcell_alias())?;
    Ok(kind.stemcell_url(&version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_from_json_document() {
        let doc = r#"[
            {"type": "replace", "path": "/releases/name=concourse/version", "value": "5.7.2"},
            {"type": "replace", "path": "/stemcells/alias=xenial/version", "value": "621.5"}
        ]"#;
        assert_eq!(stemcell_version(doc, "xenial").unwrap(), "621.5");
    }

    #[test]
    fn test_version_from_yaml_document() {
        let doc = "- type: replace\n  path: /stemcells/alias=xenial/version\n  value: \"456.3\"\n";
        assert_eq!(stemcell_version(doc, "xenial").unwrap(), "456.3");
    }

    #[test]
    fn test_numeric_version() {
        let doc = "- type: replace\n  path: /stemcells/alias=xenial/version\n  value: 621\n";
        assert_eq!(stemcell_version(doc, "xenial").unwrap(), "621");
    }

    #[test]
    fn test_other_alias_is_not_found() {
        let doc = r#"[{"type": "replace", "path": "/stemcells/alias=trusty/version", "value": "3586.60"}]"#;
        let err = stemcell_version(doc, "xenial").unwrap_err();
        assert!(matches!(err, IaasError::StemcellVersionNotFound { ref alias, .. } if alias == "xenial"));
    }

    #[test]
    fn test_empty_document_is_not_found() {
        assert!(matches!(
            stemcell_version("[]", "xenial"),
            Err(IaasError::StemcellVersionNotFound { .. })
        ));
    }

    #[test]
    fn test_location_uses_provider_url_layout() {
        let versions = r#"[{"type": "replace", "path": "/stemcells/alias=xenial/version", "value": "621.5"}]"#;
        assert_eq!(
            stemcell_location(IaasKind::Aws, versions).unwrap(),
            IaasKind::Aws.stemcell_url("621.5")
        );
        assert!(matches!(
            stemcell_location(IaasKind::Gcp, "[]"),
            Err(IaasError::StemcellVersionNotFound { .. })
        ));
    }
}
