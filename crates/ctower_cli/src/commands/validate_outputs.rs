//! Validate outputs command - Check provisioning output for missing fields.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use ctower_iaas::IaasKind;
use ctower_metadata::{AwsMetadata, GcpMetadata, Metadata};

use crate::config;

#[derive(Args)]
pub struct ValidateOutputsArgs {
    /// Target IaaS (aws or gcp)
    #[arg(short, long)]
    iaas: IaasKind,

    /// Provisioning output JSON file
    #[arg(short, long)]
    outputs: PathBuf,
}

pub fn execute(args: ValidateOutputsArgs) -> Result<()> {
    let raw = config::read_outputs(&args.outputs)?;

    let fields = match args.iaas {
        IaasKind::Aws => check::<AwsMetadata>(&raw)?,
        IaasKind::Gcp => check::<GcpMetadata>(&raw)?,
    };

    info!("{} provisioning output is complete ({} fields)", args.iaas, fields);
    Ok(())
}

fn check<M: Metadata>(raw: &[u8]) -> Result<usize> {
    M::load(raw)?;
    Ok(M::fields().len())
}
