//! IaaS kinds and the adapter interface.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use ctower_metadata::{AwsMetadata, GcpMetadata, Metadata};
use ctower_overlay::OperationSet;

use crate::aws::{AwsEnvironment, AwsIaas};
use crate::error::{IaasError, IaasResult};
use crate::gcp::{GcpEnvironment, GcpIaas};
use crate::resources::ProviderResources;
use crate::settings::DeploymentSettings;

/// Supported infrastructure providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IaasKind {
    Aws,
    Gcp,
}

impl IaasKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IaasKind::Aws => "aws",
            IaasKind::Gcp => "gcp",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![IaasKind::Aws, IaasKind::Gcp]
    }

    /// Key of the stemcell alias the release versions document pins.
    pub fn stemcell_alias(&self) -> &'static str {
        "xenial"
    }

    /// Download location of the light stemcell for `version`.
    pub fn stemcell_url(&self, version: &str) -> String {
        match self {
            IaasKind::Aws => format!(
                "https://s3.amazonaws.com/bosh-aws-light-stemcells/{v}/light-bosh-stemcell-{v}-aws-xen-hvm-ubuntu-xenial-go_agent.tgz",
                v = version
            ),
            IaasKind::Gcp => format!(
                "https://storage.googleapis.com/bosh-gce-light-stemcells/{v}/light-bosh-stemcell-{v}-google-kvm-ubuntu-xenial-go_agent.tgz",
                v = version
            ),
        }
    }
}

impl FromStr for IaasKind {
    type Err = IaasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aws" => Ok(IaasKind::Aws),
            "gcp" => Ok(IaasKind::Gcp),
            _ => Err(IaasError::UnknownIaas(s.to_string())),
        }
    }
}

impl fmt::Display for IaasKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A provider adapter able to produce every deployment document.
///
/// Implementations hold their validated environment, so each build is a pure
/// function of the bundled resources and the inputs passed here.
#[cfg_attr(test, mockall::automock)]
pub trait Iaas {
    fn kind(&self) -> IaasKind;

    /// Compose the director manifest from the bundled base document, the
    /// built-in operation sets and then `custom`, in that order.
    fn build_manifest(&self, custom: &[OperationSet]) -> IaasResult<String>;

    /// Render the provider's cloud config.
    fn build_cloud_config(&self) -> IaasResult<String>;

    /// Locate the stemcell pinned by the given release versions document.
    fn resolve_stemcell_location(&self, release_versions: &str) -> IaasResult<String>;
}

/// Build the adapter for `kind` from raw provisioning output.
///
/// Output is decoded and validated before the environment is derived, so an
/// adapter is only ever built from complete metadata.
pub fn select(
    kind: IaasKind,
    mut resources: ProviderResources,
    outputs: &[u8],
    settings: &DeploymentSettings,
) -> IaasResult<Box<dyn Iaas>> {
    info!("Selecting {} adapter", kind);

    match kind {
        IaasKind::Aws => {
            let metadata = AwsMetadata::load(outputs)?;
            let env = AwsEnvironment::new(&metadata, settings)?;
            resources.pin_checksums(&settings.releases)?;
            Ok(Box::new(AwsIaas::new(resources, env)))
        }
        IaasKind::Gcp => {
            let metadata = GcpMetadata::load(outputs)?;
            let env = GcpEnvironment::new(&metadata, settings)?;
            resources.pin_checksums(&settings.releases)?;
            Ok(Box::new(GcpIaas::new(resources, env)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iaas_kind_parse() {
        assert_eq!("aws".parse::<IaasKind>().unwrap(), IaasKind::Aws);
        assert_eq!("GCP".parse::<IaasKind>().unwrap(), IaasKind::Gcp);
        assert!(matches!(
            "azure".parse::<IaasKind>(),
            Err(IaasError::UnknownIaas(ref name)) if name == "azure"
        ));
    }

    #[test]
    fn test_iaas_kind_display_round_trips() {
        for kind in IaasKind::all() {
            assert_eq!(kind.to_string().parse::<IaasKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_stemcell_urls() {
        assert_eq!(
            IaasKind::Aws.stemcell_url("621.5"),
            "https://s3.amazonaws.com/bosh-aws-light-stemcells/621.5/light-bosh-stemcell-621.5-aws-xen-hvm-ubuntu-xenial-go_agent.tgz"
        );
        assert_eq!(
            IaasKind::Gcp.stemcell_url("621.5"),
            "https://storage.googleapis.com/bosh-gce-light-stemcells/621.5/light-bosh-stemcell-621.5-google-kvm-ubuntu-xenial-go_agent.tgz"
        );
    }

    #[test]
    fn test_select_rejects_incomplete_outputs() {
        let resources = ProviderResources::bundled(IaasKind::Gcp).unwrap();
        let err = select(
            IaasKind::Gcp,
            resources,
            br#"{"network": {"value": "default"}}"#,
            &DeploymentSettings::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, IaasError::Metadata(_)));
    }
}
