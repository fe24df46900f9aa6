use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("The Terraform state file '{}' could not be found.", .path.display())]
    StateNotFound { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse state file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("malformed state file: {0}")]
    MalformedState(String),

    #[error("required resource '{name}' not found in state")]
    MissingResource { name: String },

    #[error("resource '{resource}' has no string attribute '{attribute}'")]
    MissingAttribute { resource: String, attribute: String },

    #[error("render error: {0}")]
    Render(String),
}
