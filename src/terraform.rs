mod state;

pub use state::{Attributes, Resource, ResourceIndex, TerraformState};
