//! Assemble command - Produce every deployment document.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use ctower_iaas::assemble;

use super::DeploymentArgs;
use crate::config;

#[derive(Args)]
pub struct AssembleArgs {
    #[command(flatten)]
    deployment: DeploymentArgs,

    /// Operations file applied after the built-in sets (repeatable, applied in order)
    #[arg(long = "ops-file")]
    ops_files: Vec<PathBuf>,

    /// Directory receiving manifest.yml, cloud-config.yml and stemcell-url
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

pub fn execute(args: AssembleArgs) -> Result<()> {
    let (iaas, versions) = args.deployment.adapter()?;
    let custom = config::read_operation_sets(&args.ops_files)?;

    let docs = assemble(iaas.as_ref(), &versions, &custom)?;

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    config::write_output(Some(args.out_dir.join("manifest.yml").as_path()), &docs.manifest)?;
    config::write_output(Some(args.out_dir.join("cloud-config.yml").as_path()), &docs.cloud_config)?;
    config::write_output(
        Some(args.out_dir.join("stemcell-url").as_path()),
        &format!("{}\n", docs.stemcell_url),
    )?;

    info!("Assembled {} documents in {}", iaas.kind(), args.out_dir.display());
    Ok(())
}
