//! Bundled documents each provider adapter composes from.
//!
//! Resources are compiled into the binary and handed to adapters at
//! construction, so the adapters never read global state.

use serde::{Deserialize, Serialize};
use tracing::debug;

use ctower_overlay::{BaseDocument, OperationSet};

use crate::error::{IaasError, IaasResult};
use crate::provider::IaasKind;
use crate::settings::{DeploymentSettings, ReleaseSettings};

/// Order in which built-in operation sets are applied to the director
/// manifest. User sets always follow.
pub const MANIFEST_OPERATION_ORDER: [&str; 3] = ["cpi", "external-ip", "director-custom"];

const DIRECTOR_MANIFEST: &str = include_str!("../resources/director/bosh.yml");
const EXTERNAL_IP_OPERATIONS: &str = include_str!("../resources/director/external-ip.yml");

const AWS_CPI_OPERATIONS: &str = include_str!("../resources/aws/cpi.yml");
const AWS_DIRECTOR_CUSTOM_OPERATIONS: &str = include_str!("../resources/aws/director-custom.yml");
const AWS_CLOUD_CONFIG: &str = include_str!("../resources/aws/cloud-config.yml");
const AWS_DIRECTOR_VERSIONS: &str = include_str!("../resources/aws/director-versions.json");
const AWS_RELEASE_VERSIONS: &str = include_str!("../resources/aws/versions.json");

const GCP_CPI_OPERATIONS: &str = include_str!("../resources/gcp/cpi.yml");
const GCP_DIRECTOR_CUSTOM_OPERATIONS: &str = include_str!("../resources/gcp/director-custom.yml");
const GCP_CLOUD_CONFIG: &str = include_str!("../resources/gcp/cloud-config.yml");
const GCP_DIRECTOR_VERSIONS: &str = include_str!("../resources/gcp/director-versions.json");
const GCP_RELEASE_VERSIONS: &str = include_str!("../resources/gcp/versions.json");

/// A downloadable release or stemcell pinned by version and checksum.
///
/// Bundled references carry no checksum; see [`ProviderResources::pin_checksums`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRef {
    pub url: String,
    pub version: String,
    #[serde(default)]
    pub sha1: String,
}

#[derive(Deserialize)]
struct DirectorVersions {
    cpi: ReleaseRef,
    stemcell: ReleaseRef,
}

/// Everything an adapter needs besides the environment.
#[derive(Debug, Clone)]
pub struct ProviderResources {
    pub director_manifest: BaseDocument,
    pub cpi_operations: OperationSet,
    pub external_ip_operations: OperationSet,
    pub director_custom_operations: OperationSet,
    pub cloud_config: BaseDocument,
    /// Release versions document, in operation set form.
    pub release_versions: String,
    pub cpi: ReleaseRef,
    pub stemcell: ReleaseRef,
}

impl ProviderResources {
    /// Resources compiled in for `kind`.
    pub fn bundled(kind: IaasKind) -> IaasResult<Self> {
        let (cpi, custom, cloud_config, director_versions, release_versions) = match kind {
            IaasKind::Aws => (
                AWS_CPI_OPERATIONS,
                AWS_DIRECTOR_CUSTOM_OPERATIONS,
                AWS_CLOUD_CONFIG,
                AWS_DIRECTOR_VERSIONS,
                AWS_RELEASE_VERSIONS,
            ),
            IaasKind::Gcp => (
                GCP_CPI_OPERATIONS,
                GCP_DIRECTOR_CUSTOM_OPERATIONS,
                GCP_CLOUD_CONFIG,
                GCP_DIRECTOR_VERSIONS,
                GCP_RELEASE_VERSIONS,
            ),
        };

        let versions: DirectorVersions =
            serde_json::from_str(director_versions).map_err(|source| IaasError::InvalidResource {
                resource: format!("{}/director-versions.json", kind),
                source,
            })?;
        debug!(
            "Loaded {} resources (cpi {}, stemcell {})",
            kind, versions.cpi.version, versions.stemcell.version
        );

        let [cpi_name, external_ip_name, custom_name] = MANIFEST_OPERATION_ORDER;
        Ok(Self {
            director_manifest: BaseDocument::new("director", DIRECTOR_MANIFEST),
            cpi_operations: OperationSet::new(cpi_name, cpi),
            external_ip_operations: OperationSet::new(external_ip_name, EXTERNAL_IP_OPERATIONS),
            director_custom_operations: OperationSet::new(custom_name, custom),
            cloud_config: BaseDocument::new("cloud-config", cloud_config),
            release_versions: release_versions.to_string(),
            cpi: versions.cpi,
            stemcell: versions.stemcell,
        })
    }

    /// Apply the operator's release checksums and require one for both the
    /// CPI and the stemcell.
    ///
    /// A checksum from settings replaces the one in the resources.
    pub fn pin_checksums(&mut self, releases: &ReleaseSettings) -> IaasResult<()> {
        for (pinned, release) in [
            (&releases.cpi_sha1, &mut self.cpi),
            (&releases.stemcell_sha1, &mut self.stemcell),
        ] {
            if !pinned.trim().is_empty() {
                release.sha1 = pinned.trim().to_lowercase();
            }
        }

        DeploymentSettings::require(&[
            ("releases.cpi_sha1", &self.cpi.sha1),
            ("releases.stemcell_sha1", &self.stemcell.sha1),
        ])?;

        for (field, release) in [
            ("releases.cpi_sha1", &self.cpi),
            ("releases.stemcell_sha1", &self.stemcell),
        ] {
            let sha1 = &release.sha1;
            if sha1.len() != 40 || !sha1.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(IaasError::InvalidValue {
                    field: field.to_string(),
                    value: sha1.clone(),
                    message: "expected 40 hexadecimal digits".to_string(),
                });
            }
        }

        debug!(
            "Pinned cpi {} ({}) and stemcell {} ({})",
            self.cpi.version, self.cpi.sha1, self.stemcell.version, self.stemcell.sha1
        );
        Ok(())
    }

    /// Built-in manifest operation sets in application order.
    pub fn manifest_operations(&self) -> [&OperationSet; 3] {
        [
            &self.cpi_operations,
            &self.external_ip_operations,
            &self.director_custom_operations,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sets_follow_fixed_order() {
        for kind in IaasKind::all() {
            let resources = ProviderResources::bundled(kind).unwrap();
            let names: Vec<_> = resources.manifest_operations().iter().map(|s| s.name()).collect();
            assert_eq!(names, MANIFEST_OPERATION_ORDER);
        }
    }

    #[test]
    fn test_bundled_operation_sets_parse() {
        for kind in IaasKind::all() {
            let resources = ProviderResources::bundled(kind).unwrap();
            for set in resources.manifest_operations() {
                // Placeholders sit in values only, so raw text is valid YAML.
                let ops = set.parse().unwrap();
                assert!(!ops.is_empty(), "{} {} is empty", kind, set.name());
            }
        }
    }

    #[test]
    fn test_director_versions_pin_urls_only() {
        let aws = ProviderResources::bundled(IaasKind::Aws).unwrap();
        assert!(aws.cpi.url.contains("bosh-aws-cpi-release"));
        assert!(aws.cpi.sha1.is_empty());
        assert!(aws.stemcell.sha1.is_empty());

        let gcp = ProviderResources::bundled(IaasKind::Gcp).unwrap();
        assert!(gcp.cpi.url.contains("bosh-google-cpi-release"));
        assert!(!gcp.stemcell.version.is_empty());
        assert!(gcp.stemcell.sha1.is_empty());
    }

    const CPI_SHA1: &str = "0123456789abcdef0123456789abcdef01234567";
    const STEMCELL_SHA1: &str = "89ABCDEF0123456789ABCDEF0123456789ABCDEF";

    #[test]
    fn test_pin_checksums_from_settings() {
        let mut resources = ProviderResources::bundled(IaasKind::Aws).unwrap();
        resources
            .pin_checksums(&ReleaseSettings {
                cpi_sha1: CPI_SHA1.to_string(),
                stemcell_sha1: format!(" {STEMCELL_SHA1} "),
            })
            .unwrap();
        assert_eq!(resources.cpi.sha1, CPI_SHA1);
        assert_eq!(resources.stemcell.sha1, STEMCELL_SHA1.to_lowercase());
    }

    #[test]
    fn test_unpinned_checksums_are_reported() {
        let mut resources = ProviderResources::bundled(IaasKind::Gcp).unwrap();
        match resources.pin_checksums(&ReleaseSettings::default()) {
            Err(IaasError::MissingSettings { missing }) => {
                assert_eq!(missing, vec!["releases.cpi_sha1", "releases.stemcell_sha1"])
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_checksum_is_rejected() {
        let mut resources = ProviderResources::bundled(IaasKind::Aws).unwrap();
        let err = resources
            .pin_checksums(&ReleaseSettings {
                cpi_sha1: CPI_SHA1.to_string(),
                stemcell_sha1: "not-a-checksum".to_string(),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            IaasError::InvalidValue { ref field, .. } if field == "releases.stemcell_sha1"
        ));
    }
}
