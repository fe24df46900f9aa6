use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::EnvError;

/// Free-form attribute mapping of a single resource instance.
pub type Attributes = serde_json::Map<String, Value>;

/// Terraform state parser.
///
/// Reads both the legacy `modules` layout (state version 3 and older) and the
/// flat `resources` list written by Terraform 0.12+ (state version 4).
#[derive(Debug, Deserialize)]
pub struct TerraformState {
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(default)]
    modules: Option<Vec<LegacyModule>>,
    #[serde(default)]
    resources: Option<Vec<ResourceEntry>>,
}

#[derive(Debug, Deserialize)]
struct LegacyModule {
    resources: BTreeMap<String, LegacyResource>,
}

// NOTE: Terraform 0.11 writes `"primary": null` for resources left with only deposed instances
#[derive(Debug, Deserialize)]
struct LegacyResource {
    #[serde(default)]
    primary: Option<LegacyPrimary>,
}

#[derive(Debug, Deserialize)]
struct LegacyPrimary {
    #[serde(default)]
    attributes: Option<Attributes>,
}

impl LegacyResource {
    fn into_attributes(self) -> Attributes {
        self.primary
            .and_then(|primary| primary.attributes)
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ResourceEntry {
    #[serde(default = "managed_mode")]
    mode: String,
    #[serde(rename = "type")]
    type_: String,
    name: String,
    #[serde(default)]
    instances: Vec<InstanceEntry>,
}

#[derive(Debug, Deserialize)]
struct InstanceEntry {
    #[serde(default)]
    index_key: Option<Value>,
    #[serde(default)]
    attributes: Option<Attributes>,
}

fn managed_mode() -> String {
    "managed".to_string()
}

// NOTE: Counted instances get the same `<type>.<name>.<index>` naming the legacy layout uses
fn instance_name(type_: &str, name: &str, index_key: Option<&Value>) -> String {
    match index_key {
        None => format!("{}.{}", type_, name),
        Some(Value::String(key)) => format!("{}.{}.{}", type_, name, key),
        Some(key) => format!("{}.{}.{}", type_, name, key),
    }
}

impl TerraformState {
    pub fn load(path: &Path) -> Result<Self, EnvError> {
        if !path.is_file() {
            return Err(EnvError::StateNotFound {
                path: path.to_path_buf(),
            });
        }

        let contents = fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "read state file");

        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, EnvError> {
        Ok(serde_json::from_str(contents)?)
    }

    fn is_flat_layout(&self) -> bool {
        self.version.is_some_and(|v| v >= 4)
    }

    /// Flattens every resource of every module into one name-keyed index.
    ///
    /// On a name collision the resource seen last wins.
    pub fn into_index(self) -> Result<ResourceIndex, EnvError> {
        let version = self.version;
        let mut index = ResourceIndex::default();

        if self.is_flat_layout() {
            let entries = self.resources.ok_or_else(|| {
                EnvError::MalformedState("state has no 'resources' list".to_string())
            })?;

            for entry in entries.into_iter().filter(|e| e.mode == "managed") {
                for instance in entry.instances {
                    let name =
                        instance_name(&entry.type_, &entry.name, instance.index_key.as_ref());
                    index.insert(name, instance.attributes.unwrap_or_default());
                }
            }
        } else {
            let modules = self.modules.ok_or_else(|| {
                EnvError::MalformedState("state has no 'modules' list".to_string())
            })?;

            for module in modules {
                for (name, resource) in module.resources {
                    index.insert(name, resource.into_attributes());
                }
            }
        }

        tracing::debug!(
            version = ?version,
            count = index.len(),
            "indexed state resources"
        );

        Ok(index)
    }
}

/// A resource looked up from a [`ResourceIndex`].
#[derive(Debug, Clone, Copy)]
pub struct Resource<'a> {
    pub name: &'a str,
    pub attributes: &'a Attributes,
}

impl<'a> Resource<'a> {
    pub fn string(&self, attribute: &str) -> Result<&'a str, EnvError> {
        self.attributes
            .get(attribute)
            .and_then(|v| v.as_str())
            .ok_or_else(|| EnvError::MissingAttribute {
                resource: self.name.to_string(),
                attribute: attribute.to_string(),
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceIndex {
    resources: BTreeMap<String, Attributes>,
}

impl ResourceIndex {
    pub fn insert(&mut self, name: impl Into<String>, attributes: Attributes) {
        let name = name.into();
        if self.resources.contains_key(&name) {
            tracing::debug!(resource = %name, "resource redefined, keeping the later definition");
        }
        self.resources.insert(name, attributes);
    }

    pub fn get(&self, name: &str) -> Option<Resource<'_>> {
        self.resources
            .get_key_value(name)
            .map(|(name, attributes)| Resource { name, attributes })
    }

    /// Resources whose name contains `pattern`, in name order.
    pub fn matching<'a, 'p>(
        &'a self,
        pattern: &'p str,
    ) -> impl Iterator<Item = Resource<'a>> {
        self.resources
            .iter()
            .filter(move |(name, _)| name.contains(pattern))
            .map(|(name, attributes)| Resource { name, attributes })
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
