//! Manifest command - Compose the director manifest.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::DeploymentArgs;
use crate::config;

#[derive(Args)]
pub struct ManifestArgs {
    #[command(flatten)]
    deployment: DeploymentArgs,

    /// Operations file applied after the built-in sets (repeatable, applied in order)
    #[arg(long = "ops-file")]
    ops_files: Vec<PathBuf>,

    /// Write the manifest here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

pub fn execute(args: ManifestArgs) -> Result<()> {
    let (iaas, _) = args.deployment.adapter()?;
    let custom = config::read_operation_sets(&args.ops_files)?;

    info!("Composing {} manifest with {} custom operation files", iaas.kind(), custom.len());
    let manifest = iaas.build_manifest(&custom)?;

    config::write_output(args.out.as_deref(), &manifest)
}
