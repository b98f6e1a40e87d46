//! Cloud config command - Render the cloud config.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::DeploymentArgs;
use crate::config;

#[derive(Args)]
pub struct CloudConfigArgs {
    #[command(flatten)]
    deployment: DeploymentArgs,

    /// Write the cloud config here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

pub fn execute(args: CloudConfigArgs) -> Result<()> {
    let (iaas, _) = args.deployment.adapter()?;
    let cloud_config = iaas.build_cloud_config()?;
    config::write_output(args.out.as_deref(), &cloud_config)
}
