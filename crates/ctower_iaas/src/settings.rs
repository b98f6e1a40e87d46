//! Deployment settings supplied by the operator.
//!
//! Settings cover what provisioning output does not: the deployment name,
//! director network ranges, database credentials and provider account
//! details. They are read from a TOML file; every section is optional and
//! falls back to defaults, but secrets have no default and are checked by
//! the adapter that needs them.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IaasError, IaasResult};

/// Default settings file name.
pub const SETTINGS_FILE: &str = "ctower.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentSettings {
    /// Deployment name, used as the director name.
    pub deployment: String,
    pub network: NetworkSettings,
    pub director: DirectorSettings,
    pub aws: AwsSettings,
    pub gcp: GcpSettings,
    pub releases: ReleaseSettings,
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        Self {
            deployment: "concourse".to_string(),
            network: NetworkSettings::default(),
            director: DirectorSettings::default(),
            aws: AwsSettings::default(),
            gcp: GcpSettings::default(),
            releases: ReleaseSettings::default(),
        }
    }
}

/// Address ranges of the director and deployment networks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    pub public_cidr: String,
    pub public_gateway: String,
    pub public_reserved: String,
    pub public_static: String,
    pub private_cidr: String,
    pub private_gateway: String,
    pub private_reserved: String,
    pub director_internal_ip: String,
    pub dns: Vec<String>,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            public_cidr: "10.0.0.0/24".to_string(),
            public_gateway: "10.0.0.1".to_string(),
            public_reserved: "10.0.0.1-10.0.0.5".to_string(),
            public_static: "10.0.0.6-10.0.0.7".to_string(),
            private_cidr: "10.0.1.0/24".to_string(),
            private_gateway: "10.0.1.1".to_string(),
            private_reserved: "10.0.1.1-10.0.1.5".to_string(),
            director_internal_ip: "10.0.0.6".to_string(),
            dns: vec!["10.0.0.2".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorSettings {
    pub db_name: String,
    pub db_username: String,
    pub db_password: String,
    /// PEM private key for the director's SSH tunnel.
    pub private_key: String,
}

impl Default for DirectorSettings {
    fn default() -> Self {
        Self {
            db_name: "bosh".to_string(),
            db_username: "admin".to_string(),
            db_password: String::new(),
            private_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsSettings {
    /// Bid for spot instances on worker and compilation VMs, falling back
    /// to on-demand when the bid cannot be met.
    pub spot: bool,
    /// EC2 instance type of the worker VMs.
    pub worker_type: String,
    /// Spot bid in USD per hour for a worker VM.
    pub worker_spot_bid_price: f64,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            spot: true,
            worker_type: "m4.xlarge".to_string(),
            worker_spot_bid_price: 0.27,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcpSettings {
    pub project: String,
    pub region: String,
    pub zone: String,
    /// Run worker VMs as preemptible instances.
    pub preemptible: bool,
}

impl Default for GcpSettings {
    fn default() -> Self {
        Self {
            project: String::new(),
            region: "europe-west1".to_string(),
            zone: "europe-west1-b".to_string(),
            preemptible: true,
        }
    }
}

/// SHA-1 checksums the director verifies downloads against. They are
/// pinned by the operator for the CPI and stemcell versions in use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseSettings {
    pub cpi_sha1: String,
    pub stemcell_sha1: String,
}

impl DeploymentSettings {
    /// Parse settings from TOML text.
    pub fn from_toml(text: &str, origin: &Path) -> IaasResult<Self> {
        toml::from_str(text).map_err(|source| IaasError::Settings {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> IaasResult<Self> {
        debug!("Loading settings from {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text, path)
    }

    /// Fail with every named setting whose value is blank.
    pub(crate) fn require(values: &[(&str, &str)]) -> IaasResult<()> {
        let missing: Vec<String> = values
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(IaasError::MissingSettings { missing })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_apply_to_empty_file() {
        let settings = DeploymentSettings::from_toml("", Path::new(SETTINGS_FILE)).unwrap();
        assert_eq!(settings, DeploymentSettings::default());
        assert_eq!(settings.network.director_internal_ip, "10.0.0.6");
        assert!(settings.gcp.preemptible);
        assert!(settings.aws.spot);
        assert_eq!(settings.aws.worker_type, "m4.xlarge");
    }

    #[test]
    fn test_aws_section() {
        let text = "[aws]\nspot = false\nworker_type = \"m5.2xlarge\"\n";
        let settings = DeploymentSettings::from_toml(text, Path::new(SETTINGS_FILE)).unwrap();
        assert!(!settings.aws.spot);
        assert_eq!(settings.aws.worker_type, "m5.2xlarge");
        assert_eq!(settings.aws.worker_spot_bid_price, 0.27);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let text = r#"
deployment = "ci"

[director]
db_password = "s3cret"

[gcp]
project = "my-project"
preemptible = false
"#;
        let settings = DeploymentSettings::from_toml(text, Path::new(SETTINGS_FILE)).unwrap();
        assert_eq!(settings.deployment, "ci");
        assert_eq!(settings.director.db_password, "s3cret");
        assert_eq!(settings.director.db_username, "admin");
        assert_eq!(settings.gcp.project, "my-project");
        assert_eq!(settings.gcp.zone, "europe-west1-b");
        assert!(!settings.gcp.preemptible);
    }

    #[test]
    fn test_release_checksums() {
        let text = "[releases]\ncpi_sha1 = \"aaaa\"\n";
        let settings = DeploymentSettings::from_toml(text, Path::new(SETTINGS_FILE)).unwrap();
        assert_eq!(settings.releases.cpi_sha1, "aaaa");
        assert!(settings.releases.stemcell_sha1.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[network]\ndns = [\"8.8.8.8\", \"8.8.4.4\"]").unwrap();

        let settings = DeploymentSettings::load(file.path()).unwrap();
        assert_eq!(settings.network.dns, vec!["8.8.8.8", "8.8.4.4"]);
    }

    #[test]
    fn test_invalid_toml_names_file() {
        let err = DeploymentSettings::from_toml("deployment = [", Path::new("broken.toml")).unwrap_err();
        match err {
            IaasError::Settings { path, .. } => assert_eq!(path, Path::new("broken.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_require_lists_every_blank_value() {
        let err = DeploymentSettings::require(&[
            ("director.db_password", ""),
            ("director.private_key", "  "),
            ("gcp.project", "p"),
        ])
        .unwrap_err();
        match err {
            IaasError::MissingSettings { missing } => {
                assert_eq!(missing, vec!["director.db_password", "director.private_key"])
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
