//! Assembly of every deployment document in one pass.

use tracing::info;

use ctower_overlay::OperationSet;

use crate::error::IaasResult;
use crate::provider::Iaas;

/// The documents handed to the deployment tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentDocuments {
    pub manifest: String,
    pub cloud_config: String,
    pub stemcell_url: String,
}

/// Build the manifest, cloud config and stemcell location with `iaas`.
///
/// The first failing step aborts assembly; no partial result is returned.
pub fn assemble(
    iaas: &dyn Iaas,
    release_versions: &str,
    custom: &[OperationSet],
) -> IaasResult<DeploymentDocuments> {
    info!(
        "Assembling {} deployment documents with {} custom operation sets",
        iaas.kind(),
        custom.len()
    );

    let manifest = iaas.build_manifest(custom)?;
    let cloud_config = iaas.build_cloud_config()?;
    let stemcell_url = iaas.resolve_stemcell_location(release_versions)?;

    Ok(DeploymentDocuments {
        manifest,
        cloud_config,
        stemcell_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IaasError;
    use crate::provider::{IaasKind, MockIaas};

    #[test]
    fn test_assemble_collects_every_document() {
        let mut iaas = MockIaas::new();
        iaas.expect_kind().return_const(IaasKind::Aws);
        iaas.expect_build_manifest()
            .withf(|custom: &[OperationSet]| custom.len() == 1 && custom[0].name() == "custom")
            .times(1)
            .returning(|_| Ok("name: bosh\n".to_string()));
        iaas.expect_build_cloud_config()
            .times(1)
            .returning(|| Ok("azs: []\n".to_string()));
        iaas.expect_resolve_stemcell_location()
            .withf(|versions: &str| versions == "versions")
            .times(1)
            .returning(|_| Ok("https://example.com/stemcell.tgz".to_string()));

        let custom = vec![OperationSet::new("custom", "")];
        let docs = assemble(&iaas, "versions", &custom).unwrap();
        assert_eq!(docs.manifest, "name: bosh\n");
        assert_eq!(docs.cloud_config, "azs: []\n");
        assert_eq!(docs.stemcell_url, "https://example.com/stemcell.tgz");
    }

    #[test]
    fn test_assemble_stops_at_first_failure() {
        let mut iaas = MockIaas::new();
        iaas.expect_kind().return_const(IaasKind::Gcp);
        iaas.expect_build_manifest().returning(|_| {
            Err(IaasError::StemcellVersionNotFound {
                alias: "xenial".to_string(),
                document: "release versions".to_string(),
            })
        });
        iaas.expect_build_cloud_config().never();
        iaas.expect_resolve_stemcell_location().never();

        assert!(assemble(&iaas, "", &[]).is_err());
    }
}
