//! CLI command definitions.
//!
//! Each subcommand produces one deployment document, or checks the inputs
//! they are built from.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use ctower_iaas::{select, Iaas, IaasKind, ProviderResources};

use crate::config;

pub mod assemble;
pub mod cloud_config;
pub mod manifest;
pub mod stemcell_url;
pub mod validate_outputs;

/// ctower - director manifest and cloud config assembly
#[derive(Parser)]
#[command(name = "ctower")]
#[command(version, about = "Assemble director manifests and cloud configs for a CI deployment")]
#[command(long_about = r#"
ctower turns provisioning output into the documents needed to deploy a
director and its CI platform onto AWS or GCP.

COMMANDS:
  manifest          → Compose the director manifest
  cloud-config      → Render the cloud config
  stemcell-url      → Resolve the pinned stemcell download location
  assemble          → Produce all three documents at once
  validate-outputs  → Check provisioning output for missing fields

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Template error
  5 - Composition error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compose the director manifest
    Manifest(manifest::ManifestArgs),

    /// Render the cloud config
    #[command(name = "cloud-config")]
    CloudConfig(cloud_config::CloudConfigArgs),

    /// Resolve the stemcell download location
    #[command(name = "stemcell-url")]
    StemcellUrl(stemcell_url::StemcellUrlArgs),

    /// Produce manifest, cloud config and stemcell location together
    Assemble(assemble::AssembleArgs),

    /// Validate provisioning output
    #[command(name = "validate-outputs")]
    ValidateOutputs(validate_outputs::ValidateOutputsArgs),
}

/// Inputs shared by commands that need a provider adapter.
#[derive(Args)]
pub struct DeploymentArgs {
    /// Target IaaS (aws or gcp)
    #[arg(short, long)]
    pub iaas: IaasKind,

    /// Provisioning output JSON file
    #[arg(short, long)]
    pub outputs: PathBuf,

    /// Settings file (defaults to ./ctower.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl DeploymentArgs {
    /// Build the adapter and return it with the bundled release versions.
    pub fn adapter(&self) -> Result<(Box<dyn Iaas>, String)> {
        let settings = config::load_settings(self.config.as_deref())?;
        let outputs = config::read_outputs(&self.outputs)?;
        let resources = ProviderResources::bundled(self.iaas)?;
        let versions = resources.release_versions.clone();

        let iaas = select(self.iaas, resources, &outputs, &settings)?;
        Ok((iaas, versions))
    }
}
