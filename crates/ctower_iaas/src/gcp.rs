//! GCP adapter.

use serde::Serialize;
use tracing::info;

use ctower_metadata::{GcpMetadata, Metadata};
use ctower_overlay::{OperationSet, OverlayComposer};
use ctower_templates::{TemplateRenderer, Variables};

use crate::error::IaasResult;
use crate::provider::{Iaas, IaasKind};
use crate::resources::{ProviderResources, ReleaseRef};
use crate::settings::DeploymentSettings;
use crate::stemcell::stemcell_location;

/// Network tag every VM carries so internal firewall rules apply.
const INTERNAL_TAG: &str = "internal";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GcpEnvironment {
    pub director_name: String,
    pub project_id: String,
    pub region: String,
    pub zone: String,
    pub network: String,
    pub public_subnetwork: String,
    pub private_subnetwork: String,
    pub tags: Vec<String>,
    pub gcp_credentials_json: String,
    pub private_key: String,
    pub internal_cidr: String,
    pub internal_gw: String,
    pub internal_ip: String,
    pub external_ip: String,
    pub atc_public_ip: String,
    pub db_host: String,
    pub db_name: String,
    pub db_username: String,
    pub db_password: String,
    pub db_ca_cert: String,
    pub preemptible: bool,
    pub public_cidr_reserved: String,
    pub public_cidr_static: String,
    pub private_cidr: String,
    pub private_cidr_gateway: String,
    pub private_cidr_reserved: String,
    pub dns: Vec<String>,
}

impl GcpEnvironment {
    /// Derive the environment from validated metadata and settings.
    ///
    /// Subnetwork ranges and gateways come from provisioning output; reserved
    /// and static ranges come from settings.
    pub fn new(metadata: &GcpMetadata, settings: &DeploymentSettings) -> IaasResult<Self> {
        metadata.validate()?;
        DeploymentSettings::require(&[
            ("gcp.project", &settings.gcp.project),
            ("director.db_password", &settings.director.db_password),
            ("director.private_key", &settings.director.private_key),
        ])?;

        let network = &settings.network;

        Ok(Self {
            director_name: settings.deployment.clone(),
            project_id: settings.gcp.project.clone(),
            region: settings.gcp.region.clone(),
            zone: settings.gcp.zone.clone(),
            network: metadata.network.as_str().to_string(),
            public_subnetwork: metadata.public_subnetwork_name.as_str().to_string(),
            private_subnetwork: metadata.private_subnetwork_name.as_str().to_string(),
            tags: vec![
                metadata.director_firewall_name.as_str().to_string(),
                INTERNAL_TAG.to_string(),
            ],
            gcp_credentials_json: metadata.director_account_creds.as_str().to_string(),
            private_key: settings.director.private_key.clone(),
            internal_cidr: metadata.public_subnetwork_cidr.as_str().to_string(),
            internal_gw: metadata.public_subnetwork_internal_gw.as_str().to_string(),
            internal_ip: network.director_internal_ip.clone(),
            external_ip: metadata.director_public_ip.as_str().to_string(),
            atc_public_ip: metadata.atc_public_ip.as_str().to_string(),
            db_host: metadata.bosh_db_address.as_str().to_string(),
            db_name: metadata.db_name.as_str().to_string(),
            db_username: settings.director.db_username.clone(),
            db_password: settings.director.db_password.clone(),
            db_ca_cert: metadata.sql_server_cert.as_str().to_string(),
            preemptible: settings.gcp.preemptible,
            public_cidr_reserved: network.public_reserved.clone(),
            public_cidr_static: network.public_static.clone(),
            private_cidr: metadata.private_subnetwork_cidr.as_str().to_string(),
            private_cidr_gateway: metadata.private_subnetwork_internal_gw.as_str().to_string(),
            private_cidr_reserved: network.private_reserved.clone(),
            dns: network.dns.clone(),
        })
    }
}

#[derive(Serialize)]
struct ManifestVariables<'a> {
    #[serde(flatten)]
    env: &'a GcpEnvironment,
    cpi: &'a ReleaseRef,
    stemcell: &'a ReleaseRef,
}

/// Parameters of the GCP cloud config template.
#[derive(Debug, Serialize)]
pub struct GcpCloudConfigParams<'a> {
    pub zone: &'a str,
    pub preemptible: bool,
    pub network: &'a str,
    pub public_subnetwork: &'a str,
    pub private_subnetwork: &'a str,
    pub public_cidr: &'a str,
    pub public_cidr_gateway: &'a str,
    pub public_cidr_reserved: &'a str,
    pub public_cidr_static: &'a str,
    pub private_cidr: &'a str,
    pub private_cidr_gateway: &'a str,
    pub private_cidr_reserved: &'a str,
    pub dns: &'a [String],
}

impl<'a> From<&'a GcpEnvironment> for GcpCloudConfigParams<'a> {
    fn from(env: &'a GcpEnvironment) -> Self {
        Self {
            zone: &env.zone,
            preemptible: env.preemptible,
            network: &env.network,
            public_subnetwork: &env.public_subnetwork,
            private_subnetwork: &env.private_subnetwork,
            public_cidr: &env.internal_cidr,
            public_cidr_gateway: &env.internal_gw,
            public_cidr_reserved: &env.public_cidr_reserved,
            public_cidr_static: &env.public_cidr_static,
            private_cidr: &env.private_cidr,
            private_cidr_gateway: &env.private_cidr_gateway,
            private_cidr_reserved: &env.private_cidr_reserved,
            dns: &env.dns,
        }
    }
}

/// Builds GCP deployment documents.
#[derive(Debug, Clone)]
pub struct GcpIaas {
    resources: ProviderResources,
    env: GcpEnvironment,
    composer: OverlayComposer,
    renderer: TemplateRenderer,
}

impl GcpIaas {
    pub fn new(resources: ProviderResources, env: GcpEnvironment) -> Self {
        Self {
            resources,
            env,
            composer: OverlayComposer::new(),
            renderer: TemplateRenderer::new(),
        }
    }

    pub fn environment(&self) -> &GcpEnvironment {
        &self.env
    }
}

impl Iaas for GcpIaas {
    fn kind(&self) -> IaasKind {
        IaasKind::Gcp
    }

    fn build_manifest(&self, custom: &[OperationSet]) -> IaasResult<String> {
        info!("Building GCP director manifest for {}", self.env.director_name);
        let variables = Variables::from_serialize(&ManifestVariables {
            env: &self.env,
            cpi: &self.resources.cpi,
            stemcell: &self.resources.stemcell,
        })?;
        let sets = self.resources.manifest_operations().into_iter().chain(custom);
        Ok(self
            .composer
            .compose(&self.resources.director_manifest, sets, &variables)?)
    }

    fn build_cloud_config(&self) -> IaasResult<String> {
        info!(
            "Building GCP cloud config for {} (preemptible: {})",
            self.env.zone, self.env.preemptible
        );
        let variables = Variables::from_serialize(&GcpCloudConfigParams::from(&self.env))?;
        let template = &self.resources.cloud_config;
        Ok(self.renderer.render(template.name(), template.text(), &variables)?)
    }

    fn resolve_stemcell_location(&self, release_versions: &str) -> IaasResult<String> {
        stemcell_location(self.kind(), release_versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IaasError;

    const OUTPUTS: &str = r#"{
        "network": {"value": "concourse-network"},
        "private_subnetwork_name": {"value": "concourse-private"},
        "public_subnetwork_name": {"value": "concourse-public"},
        "public_subnetwork_cidr": {"value": "10.0.0.0/24"},
        "private_subnetwork_cidr": {"value": "10.0.1.0/24"},
        "private_subnetwor_internal_gw": {"value": "10.0.1.1"},
        "public_subnetwor_internal_gw": {"value": "10.0.0.1"},
        "atc_public_ip": {"value": "34.1.2.4"},
        "director_account_creds": {"value": "{\"type\": \"service_account\"}"},
        "director_public_ip": {"value": "34.1.2.3"},
        "bosh_db_address": {"value": "10.20.0.3"},
        "db_name": {"value": "bosh-db"},
        "nat_gateway_ip": {"value": "34.1.2.5"},
        "server_ca_cert": {"value": "-----BEGIN CERTIFICATE-----\nxyz\n-----END CERTIFICATE-----"},
        "director_firewall_name": {"value": "concourse-director"}
    }"#;

    fn settings() -> DeploymentSettings {
        let mut settings = DeploymentSettings::default();
        settings.gcp.project = "ci-project".to_string();
        settings.director.db_password = "s3cret".to_string();
        settings.director.private_key = "key".to_string();
        settings
    }

    #[test]
    fn test_environment_from_metadata() {
        let metadata = GcpMetadata::load(OUTPUTS.as_bytes()).unwrap();
        let env = GcpEnvironment::new(&metadata, &settings()).unwrap();
        assert_eq!(env.internal_gw, "10.0.0.1");
        assert_eq!(env.private_cidr_gateway, "10.0.1.1");
        assert_eq!(env.db_ca_cert, "-----BEGIN CERTIFICATE-----\nxyz\n-----END CERTIFICATE-----");
        assert_eq!(env.tags, vec!["concourse-director", "internal"]);
        assert!(env.preemptible);
    }

    #[test]
    fn test_project_is_required() {
        let metadata = GcpMetadata::load(OUTPUTS.as_bytes()).unwrap();
        let mut settings = settings();
        settings.gcp.project.clear();
        let err = GcpEnvironment::new(&metadata, &settings).unwrap_err();
        assert!(matches!(err, IaasError::MissingSettings { ref missing } if missing == &["gcp.project"]));
    }

    #[test]
    fn test_cloud_config_carries_preemptible_flag() {
        let metadata = GcpMetadata::load(OUTPUTS.as_bytes()).unwrap();
        let mut settings = settings();
        settings.gcp.preemptible = false;
        let env = GcpEnvironment::new(&metadata, &settings).unwrap();
        let iaas = GcpIaas::new(ProviderResources::bundled(IaasKind::Gcp).unwrap(), env);

        let cloud_config = iaas.build_cloud_config().unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&cloud_config).unwrap();
        let workers = doc["vm_types"]
            .as_sequence()
            .unwrap()
            .iter()
            .find(|vm| vm["name"].as_str() == Some("concourse-medium"))
            .unwrap();
        assert_eq!(workers["cloud_properties"]["preemptible"].as_bool(), Some(false));
        assert_eq!(doc["azs"][0]["cloud_properties"]["zone"].as_str(), Some("europe-west1-b"));
    }
}
