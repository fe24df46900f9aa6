//! caasp-env - CaaSP environment generator
//!
//! Projects the OpenStack compute and floating IP resources of a Terraform state file
//! into the `environment.json` document consumed by the CaaSP configuration tooling.

pub mod environment;
pub mod error;
pub mod output;
pub mod terraform;

use std::path::Path;

pub use environment::{Addresses, Environment, Minion, Role, SshSettings, project};
pub use error::EnvError;
pub use output::OutputFormat;
pub use terraform::{ResourceIndex, TerraformState};

/// Loads the state file at `state_path` and projects it into an [`Environment`].
pub fn generate(state_path: &Path, ssh: &SshSettings) -> Result<Environment, EnvError> {
    let resources = TerraformState::load(state_path)?.into_index()?;
    project(&resources, ssh)
}
