//! Stemcell URL command - Resolve the pinned stemcell location.
//!
//! Unlike the other document commands this one builds no adapter: resolving
//! a stemcell reads only the release versions document, so it runs without
//! provisioning output or settings. It calls [`stemcell_location`], the same
//! resolution every adapter's `resolve_stemcell_location` delegates to.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use ctower_iaas::{stemcell_location, IaasKind, ProviderResources};

#[derive(Args)]
pub struct StemcellUrlArgs {
    /// Target IaaS (aws or gcp)
    #[arg(short, long)]
    iaas: IaasKind,

    /// Release versions document (defaults to the bundled one)
    #[arg(long)]
    versions: Option<PathBuf>,
}

/// Print the stemcell URL for `--iaas`, without provisioning output.
pub fn execute(args: StemcellUrlArgs) -> Result<()> {
    let versions = match &args.versions {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read release versions {}", path.display()))?,
        None => ProviderResources::bundled(args.iaas)?.release_versions,
    };

    println!("{}", stemcell_location(args.iaas, &versions)?);
    Ok(())
}
