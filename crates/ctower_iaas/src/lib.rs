//! ctower IaaS adapters.
//!
//! Each adapter turns validated provisioning output plus deployment settings
//! into the three documents a director deployment needs:
//!
//! - the director manifest, composed from a bundled base document, the
//!   built-in operation sets and any user operation sets
//! - the cloud config, rendered from a bundled template
//! - the stemcell location, resolved from a release versions document
//!
//! The provider is chosen once, with [`select`]:
//!
//! ```no_run
//! use ctower_iaas::{assemble, select, DeploymentSettings, IaasKind, ProviderResources};
//!
//! # fn main() -> Result<(), ctower_iaas::IaasError> {
//! let outputs = std::fs::read("outputs.json")?;
//! let settings = DeploymentSettings::load("ctower.toml".as_ref())?;
//! let resources = ProviderResources::bundled(IaasKind::Aws)?;
//! let versions = resources.release_versions.clone();
//!
//! let iaas = select(IaasKind::Aws, resources, &outputs, &settings)?;
//! let docs = assemble(iaas.as_ref(), &versions, &[])?;
//! println!("{}", docs.manifest);
//! # Ok(())
//! # }
//! ```

pub mod assembly;
pub mod aws;
pub mod error;
pub mod gcp;
pub mod provider;
pub mod resources;
pub mod settings;
pub mod stemcell;

pub use assembly::{assemble, DeploymentDocuments};
pub use aws::{AwsCloudConfigParams, AwsEnvironment, AwsIaas};
pub use error::{IaasError, IaasResult};
pub use gcp::{GcpCloudConfigParams, GcpEnvironment, GcpIaas};
pub use provider::{select, Iaas, IaasKind};
pub use resources::{ProviderResources, ReleaseRef, MANIFEST_OPERATION_ORDER};
pub use settings::{AwsSettings, DeploymentSettings, GcpSettings, ReleaseSettings, SETTINGS_FILE};
pub use stemcell::{stemcell_location, stemcell_version};
