//! Input loading for CLI commands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use ctower_iaas::{DeploymentSettings, SETTINGS_FILE};
use ctower_overlay::OperationSet;

/// Load settings from `path`, or from `ctower.toml` in the working
/// directory when it exists, or fall back to defaults.
pub fn load_settings(path: Option<&Path>) -> Result<DeploymentSettings> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(SETTINGS_FILE);
            if !default.exists() {
                debug!("No {} found, using default settings", SETTINGS_FILE);
                return Ok(DeploymentSettings::default());
            }
            default
        }
    };

    info!("Loading settings from {}", path.display());
    Ok(DeploymentSettings::load(&path)?)
}

/// Read raw provisioning output.
pub fn read_outputs(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read provisioning output {}", path.display()))
}

/// Read user operation files, in the order given. Each set is named after
/// its file.
pub fn read_operation_sets(paths: &[PathBuf]) -> Result<Vec<OperationSet>> {
    paths
        .iter()
        .map(|path| {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read operations file {}", path.display()))?;
            Ok(OperationSet::new(path.display().to_string(), text))
        })
        .collect()
}

/// Write `text` to `out`, or to stdout when no path is given.
pub fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}
