use std::path::PathBuf;

use caasp_env::output::OutputFormat;
use clap::Parser;

pub const DEFAULT_STATE_FILE: &str = "terraform.tfstate";
pub const DEFAULT_SSH_USER: &str = "root";
pub const DEFAULT_SSH_KEY: &str = "../misc-files/id_shared";

/// Generate a CaaSP environment.json from a Terraform state file.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Terraform state file to read
    #[arg(long, env = "TFSTATE_FILE", default_value = DEFAULT_STATE_FILE)]
    pub state: PathBuf,

    #[arg(long, env = "CAASP_SSH_USER", default_value = DEFAULT_SSH_USER)]
    pub ssh_user: String,

    /// SSH private key, relative paths are resolved against the working directory
    #[arg(long, env = "CAASP_SSH_KEY", default_value = DEFAULT_SSH_KEY)]
    pub ssh_key: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}
