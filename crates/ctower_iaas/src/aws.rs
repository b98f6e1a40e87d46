//! AWS adapter.

use serde::Serialize;
use tracing::info;

use ctower_metadata::{AwsMetadata, Metadata};
use ctower_overlay::{OperationSet, OverlayComposer};
use ctower_templates::{TemplateRenderer, Variables};

use crate::error::{IaasError, IaasResult};
use crate::provider::{Iaas, IaasKind};
use crate::resources::{ProviderResources, ReleaseRef};
use crate::settings::DeploymentSettings;
use crate::stemcell::stemcell_location;

/// Spot bid for the m4.large medium and compilation VMs (on-demand 0.111).
const MEDIUM_SPOT_BID_PRICE: f64 = 0.13;

/// Everything the AWS director manifest and cloud config are rendered from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AwsEnvironment {
    pub director_name: String,
    pub region: String,
    pub az: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub default_key_name: String,
    pub default_security_groups: Vec<String>,
    pub private_key: String,
    pub public_subnet_id: String,
    pub private_subnet_id: String,
    pub internal_cidr: String,
    pub internal_gw: String,
    pub internal_ip: String,
    pub external_ip: String,
    pub atc_public_ip: String,
    pub blobstore_bucket: String,
    pub s3_aws_access_key_id: String,
    pub s3_aws_secret_access_key: String,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_username: String,
    pub db_password: String,
    pub vms_security_group_id: String,
    pub atc_security_group_id: String,
    pub elb_security_group_id: String,
    pub elb_name: String,
    pub public_cidr_reserved: String,
    pub public_cidr_static: String,
    pub private_cidr: String,
    pub private_cidr_gateway: String,
    pub private_cidr_reserved: String,
    pub dns: Vec<String>,
    pub spot: bool,
    pub worker_type: String,
    pub worker_spot_bid_price: f64,
}

impl AwsEnvironment {
    /// Derive the environment from validated metadata and settings.
    pub fn new(metadata: &AwsMetadata, settings: &DeploymentSettings) -> IaasResult<Self> {
        metadata.validate()?;
        DeploymentSettings::require(&[
            ("director.db_password", &settings.director.db_password),
            ("director.private_key", &settings.director.private_key),
            ("aws.worker_type", &settings.aws.worker_type),
        ])?;

        let aws = &settings.aws;
        let bid = aws.worker_spot_bid_price;
        if aws.spot && (!bid.is_finite() || bid <= 0.0) {
            return Err(IaasError::InvalidValue {
                field: "aws.worker_spot_bid_price".to_string(),
                value: bid.to_string(),
                message: "spot bid must be a positive price".to_string(),
            });
        }

        let db_port = parse_port("bosh_db_port", metadata.bosh_db_port.as_str())?;
        let network = &settings.network;

        Ok(Self {
            director_name: settings.deployment.clone(),
            region: metadata.region.as_str().to_string(),
            az: metadata.availability_zone.as_str().to_string(),
            access_key_id: metadata.bosh_user_access_key_id.as_str().to_string(),
            secret_access_key: metadata.bosh_secret_access_key.as_str().to_string(),
            default_key_name: metadata.director_key_pair.as_str().to_string(),
            default_security_groups: vec![
                metadata.director_security_group_id.as_str().to_string(),
                metadata.vms_security_group_id.as_str().to_string(),
            ],
            private_key: settings.director.private_key.clone(),
            public_subnet_id: metadata.default_subnet_id.as_str().to_string(),
            private_subnet_id: metadata.private_subnet_id.as_str().to_string(),
            internal_cidr: network.public_cidr.clone(),
            internal_gw: network.public_gateway.clone(),
            internal_ip: network.director_internal_ip.clone(),
            external_ip: metadata.director_public_ip.as_str().to_string(),
            atc_public_ip: metadata.atc_public_ip.as_str().to_string(),
            blobstore_bucket: metadata.blobstore_bucket.as_str().to_string(),
            s3_aws_access_key_id: metadata.blobstore_user_access_key_id.as_str().to_string(),
            s3_aws_secret_access_key: metadata.blobstore_secret_access_key.as_str().to_string(),
            db_host: metadata.bosh_db_address.as_str().to_string(),
            db_port,
            db_name: settings.director.db_name.clone(),
            db_username: settings.director.db_username.clone(),
            db_password: settings.director.db_password.clone(),
            vms_security_group_id: metadata.vms_security_group_id.as_str().to_string(),
            atc_security_group_id: metadata.atc_security_group_id.as_str().to_string(),
            elb_security_group_id: metadata.elb_security_group_id.as_str().to_string(),
            elb_name: metadata.elb_name.as_str().to_string(),
            public_cidr_reserved: network.public_reserved.clone(),
            public_cidr_static: network.public_static.clone(),
            private_cidr: network.private_cidr.clone(),
            private_cidr_gateway: network.private_gateway.clone(),
            private_cidr_reserved: network.private_reserved.clone(),
            dns: network.dns.clone(),
            spot: aws.spot,
            worker_type: aws.worker_type.trim().to_string(),
            worker_spot_bid_price: aws.worker_spot_bid_price,
        })
    }
}

pub(crate) fn parse_port(field: &str, value: &str) -> IaasResult<u16> {
    value.trim().parse().map_err(|e: std::num::ParseIntError| IaasError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        message: e.to_string(),
    })
}

#[derive(Serialize)]
struct ManifestVariables<'a> {
    #[serde(flatten)]
    env: &'a AwsEnvironment,
    cpi: &'a ReleaseRef,
    stemcell: &'a ReleaseRef,
}

/// Parameters of the AWS cloud config template.
///
/// Spot bids are `None` when spot instances are disabled and render as
/// `null`, which leaves the VM on-demand.
#[derive(Debug, Serialize)]
pub struct AwsCloudConfigParams<'a> {
    pub availability_zone: &'a str,
    pub vms_security_group_id: &'a str,
    pub atc_security_group_id: &'a str,
    pub load_balancer_security_group_id: &'a str,
    pub load_balancer_id: &'a str,
    pub default_subnet_id: &'a str,
    pub private_subnet_id: &'a str,
    pub public_cidr: &'a str,
    pub public_cidr_gateway: &'a str,
    pub public_cidr_reserved: &'a str,
    pub public_cidr_static: &'a str,
    pub private_cidr: &'a str,
    pub private_cidr_gateway: &'a str,
    pub private_cidr_reserved: &'a str,
    pub dns: &'a [String],
    pub spot: bool,
    pub worker_type: &'a str,
    pub medium_spot_bid_price: Option<f64>,
    pub worker_spot_bid_price: Option<f64>,
}

impl<'a> From<&'a AwsEnvironment> for AwsCloudConfigParams<'a> {
    fn from(env: &'a AwsEnvironment) -> Self {
        Self {
            availability_zone: &env.az,
            vms_security_group_id: &env.vms_security_group_id,
            atc_security_group_id: &env.atc_security_group_id,
            load_balancer_security_group_id: &env.elb_security_group_id,
            load_balancer_id: &env.elb_name,
            default_subnet_id: &env.public_subnet_id,
            private_subnet_id: &env.private_subnet_id,
            public_cidr: &env.internal_cidr,
            public_cidr_gateway: &env.internal_gw,
            public_cidr_reserved: &env.public_cidr_reserved,
            public_cidr_static: &env.public_cidr_static,
            private_cidr: &env.private_cidr,
            private_cidr_gateway: &env.private_cidr_gateway,
            private_cidr_reserved: &env.private_cidr_reserved,
            dns: &env.dns,
            spot: env.spot,
            worker_type: &env.worker_type,
            medium_spot_bid_price: env.spot.then_some(MEDIUM_SPOT_BID_PRICE),
            worker_spot_bid_price: env.spot.then_some(env.worker_spot_bid_price),
        }
    }
}

/// Builds AWS deployment documents.
#[derive(Debug, Clone)]
pub struct AwsIaas {
    resources: ProviderResources,
    env: AwsEnvironment,
    composer: OverlayComposer,
    renderer: TemplateRenderer,
}

impl AwsIaas {
    pub fn new(resources: ProviderResources, env: AwsEnvironment) -> Self {
        Self {
            resources,
            env,
            composer: OverlayComposer::new(),
            renderer: TemplateRenderer::new(),
        }
    }

    pub fn environment(&self) -> &AwsEnvironment {
        &self.env
    }

    fn manifest_variables(&self) -> IaasResult<Variables> {
        Ok(Variables::from_serialize(&ManifestVariables {
            env: &self.env,
            cpi: &self.resources.cpi,
            stemcell: &self.resources.stemcell,
        })?)
    }
}

impl Iaas for AwsIaas {
    fn kind(&self) -> IaasKind {
        IaasKind::Aws
    }

    fn build_manifest(&self, custom: &[OperationSet]) -> IaasResult<String> {
        info!("Building AWS director manifest for {}", self.env.director_name);
        let variables = self.manifest_variables()?;
        let sets = self.resources.manifest_operations().into_iter().chain(custom);
        Ok(self
            .composer
            .compose(&self.resources.director_manifest, sets, &variables)?)
    }

    fn build_cloud_config(&self) -> IaasResult<String> {
        info!(
            "Building AWS cloud config for {} (workers: {}, spot: {})",
            self.env.az, self.env.worker_type, self.env.spot
        );
        let mut variables = Variables::from_serialize(&AwsCloudConfigParams::from(&self.env))?;
        // On-demand pools still name the bid fields, as an explicit null.
        for field in ["medium_spot_bid_price", "worker_spot_bid_price"] {
            if !variables.contains(field) {
                variables.insert(field, serde_json::Value::Null);
            }
        }
        let template = &self.resources.cloud_config;
        Ok(self.renderer.render(template.name(), template.text(), &variables)?)
    }

    fn resolve_stemcell_location(&self, release_versions: &str) -> IaasResult<String> {
        stemcell_location(self.kind(), release_versions)
    }
}
