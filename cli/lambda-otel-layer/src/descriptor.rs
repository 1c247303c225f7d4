//! Deployment descriptor model.
//!
//! The descriptor is kept as an order-preserving YAML mapping so that keys this
//! tool does not understand (events, resources, CloudFormation tags such as
//! `!Ref`) survive a load/save cycle untouched. Typed accessors expose only the
//! fields the instrumentation needs.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Sequence, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::error::AugmentError;

/// Key of the plugin section below `custom`.
pub const PLUGIN_SECTION: &str = "lambdaOTEL";

/// Errors raised while reading or writing a descriptor.
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Failed to access descriptor file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML descriptor: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON descriptor: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Descriptor root must be a mapping")]
    NotAMapping,

    #[error("YAML tag '{0}' has no JSON representation, render the descriptor as YAML instead")]
    TaggedValue(String),
}

/// On-disk format of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorFormat {
    Yaml,
    Json,
}

impl DescriptorFormat {
    /// Infers the format from a file extension. Unknown extensions are treated as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => DescriptorFormat::Json,
            _ => DescriptorFormat::Yaml,
        }
    }
}

/// A serverless deployment descriptor (`serverless.yml` / `serverless.json`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentDescriptor {
    root: Mapping,
}

impl DeploymentDescriptor {
    pub fn from_value(value: Value) -> Result<Self, DescriptorError> {
        match value {
            Value::Mapping(root) => Ok(Self { root }),
            _ => Err(DescriptorError::NotAMapping),
        }
    }

    pub fn parse(content: &str, format: DescriptorFormat) -> Result<Self, DescriptorError> {
        let value: Value = match format {
            DescriptorFormat::Yaml => serde_yaml::from_str(content)?,
            DescriptorFormat::Json => serde_json::from_str(content)?,
        };
        Self::from_value(value)
    }

    pub fn load(path: &Path, format: DescriptorFormat) -> Result<Self, DescriptorError> {
        let content = fs::read_to_string(path).map_err(|source| DescriptorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, format)
    }

    pub fn render(&self, format: DescriptorFormat) -> Result<String, DescriptorError> {
        match format {
            DescriptorFormat::Yaml => Ok(serde_yaml::to_string(&self.root)?),
            DescriptorFormat::Json => {
                if let Some(tag) = self.root.values().find_map(first_tag) {
                    return Err(DescriptorError::TaggedValue(tag));
                }
                let mut rendered = serde_json::to_string_pretty(&self.root)?;
                rendered.push('\n');
                Ok(rendered)
            }
        }
    }

    pub fn save(&self, path: &Path, format: DescriptorFormat) -> Result<(), DescriptorError> {
        let rendered = self.render(format)?;
        fs::write(path, rendered).map_err(|source| DescriptorError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn into_value(self) -> Value {
        Value::Mapping(self.root)
    }

    fn provider_str(&self, key: &str) -> Option<&str> {
        self.root
            .get("provider")
            .and_then(|provider| provider.get(key))
            .and_then(non_empty_str)
    }

    /// `provider.runtime`
    pub fn provider_runtime(&self) -> Option<&str> {
        self.provider_str("runtime")
    }

    /// `provider.architecture`
    pub fn provider_architecture(&self) -> Option<&str> {
        self.provider_str("architecture")
    }

    /// `provider.region`
    pub fn provider_region(&self) -> Option<&str> {
        self.provider_str("region")
    }

    /// `provider.iamManagedPolicies`
    pub fn managed_policies(&self) -> Option<&Sequence> {
        self.root
            .get("provider")
            .and_then(|provider| provider.get("iamManagedPolicies"))
            .and_then(Value::as_sequence)
    }

    /// Raw `custom.lambdaOTEL` section, if declared.
    pub fn plugin_section(&self) -> Option<&Value> {
        self.root
            .get("custom")
            .and_then(|custom| custom.get(PLUGIN_SECTION))
    }

    /// Whether the descriptor declares a `functions` mapping.
    pub fn has_functions(&self) -> bool {
        matches!(self.root.get("functions"), Some(Value::Mapping(_)))
    }

    /// Function names, in declaration order.
    ///
    /// Fails when a key of the `functions` mapping is not a string.
    pub fn function_names(&self) -> Result<Vec<String>, AugmentError> {
        let Some(Value::Mapping(functions)) = self.root.get("functions") else {
            return Ok(Vec::new());
        };
        functions
            .keys()
            .map(|key| {
                key.as_str().map(str::to_string).ok_or_else(|| {
                    AugmentError::InvalidDescriptor(format!(
                        "function name {:?} must be a string",
                        key
                    ))
                })
            })
            .collect()
    }

    /// Read-only view of a single function.
    pub fn function(&self, name: &str) -> Option<&Mapping> {
        self.root
            .get("functions")
            .and_then(|functions| functions.get(name))
            .and_then(Value::as_mapping)
    }

    /// Mutable view of a single function.
    ///
    /// Fails when the function entry exists but is not a mapping.
    pub fn function_mut(
        &mut self,
        name: &str,
    ) -> Result<Option<FunctionDescriptor<'_>>, AugmentError> {
        let Some(entry) = self
            .root
            .get_mut("functions")
            .and_then(|functions| functions.get_mut(name))
        else {
            return Ok(None);
        };
        match entry {
            Value::Mapping(entry) => Ok(Some(FunctionDescriptor {
                name: name.to_string(),
                entry,
            })),
            _ => Err(AugmentError::InvalidDescriptor(format!(
                "functions.{} must be an object",
                name
            ))),
        }
    }

    /// Appends a policy ARN to `provider.iamManagedPolicies`, creating the
    /// provider section and the list when needed.
    pub fn push_managed_policy(&mut self, policy_arn: &str) -> Result<(), AugmentError> {
        let provider = self
            .root
            .entry(Value::from("provider"))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if provider.is_null() {
            *provider = Value::Mapping(Mapping::new());
        }
        let Value::Mapping(provider) = provider else {
            return Err(AugmentError::InvalidDescriptor(
                "provider must be an object".to_string(),
            ));
        };
        let policies = sequence_entry(provider, "iamManagedPolicies")
            .ok_or_else(|| {
                AugmentError::InvalidDescriptor(
                    "provider.iamManagedPolicies must be a list".to_string(),
                )
            })?;
        policies.push(Value::from(policy_arn));
        Ok(())
    }
}

/// String value, with `""` treated as absent.
fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

/// Tag of the first tagged value found in `value`, depth first.
fn first_tag(value: &Value) -> Option<String> {
    match value {
        Value::Tagged(tagged) => Some(tagged.tag.to_string()),
        Value::Sequence(items) => items.iter().find_map(first_tag),
        Value::Mapping(mapping) => mapping
            .iter()
            .find_map(|(key, value)| first_tag(key).or_else(|| first_tag(value))),
        _ => None,
    }
}

/// Returns the sequence stored under `key`, inserting an empty one when the key
/// is absent or `null`. Returns `None` when the key holds something else.
fn sequence_entry<'a>(mapping: &'a mut Mapping, key: &str) -> Option<&'a mut Sequence> {
    let value = mapping
        .entry(Value::from(key))
        .or_insert_with(|| Value::Sequence(Sequence::new()));
    if value.is_null() {
        *value = Value::Sequence(Sequence::new());
    }
    value.as_sequence_mut()
}

/// Same as [`sequence_entry`] for mappings.
fn mapping_entry<'a>(mapping: &'a mut Mapping, key: &str) -> Option<&'a mut Mapping> {
    let value = mapping
        .entry(Value::from(key))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if value.is_null() {
        *value = Value::Mapping(Mapping::new());
    }
    value.as_mapping_mut()
}

/// Mutable handle on one entry of the `functions` mapping.
#[derive(Debug)]
pub struct FunctionDescriptor<'a> {
    name: String,
    entry: &'a mut Mapping,
}

impl FunctionDescriptor<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared runtime; an empty string counts as undeclared.
    pub fn runtime(&self) -> Option<&str> {
        self.entry.get("runtime").and_then(non_empty_str)
    }

    /// Declared architecture; an empty string counts as undeclared.
    pub fn architecture(&self) -> Option<&str> {
        self.entry.get("architecture").and_then(non_empty_str)
    }

    /// Raw value of a per-function option, `Some(Value::Null)` included.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.entry.get(key)
    }

    pub fn layers(&self) -> Option<&Sequence> {
        self.entry.get("layers").and_then(Value::as_sequence)
    }

    pub fn environment(&self) -> Option<&Mapping> {
        self.entry.get("environment").and_then(Value::as_mapping)
    }

    /// Appends a layer reference, creating `layers` if absent.
    pub fn push_layer(&mut self, layer_arn: &str) -> Result<(), AugmentError> {
        let layers = sequence_entry(self.entry, "layers").ok_or_else(|| {
            AugmentError::InvalidDescriptor(format!("functions.{}.layers must be a list", self.name))
        })?;
        layers.push(Value::from(layer_arn));
        Ok(())
    }

    /// Sets an environment variable, creating `environment` if absent and
    /// leaving other entries in place.
    pub fn set_environment(&mut self, key: &str, value: &str) -> Result<(), AugmentError> {
        let environment = mapping_entry(self.entry, "environment").ok_or_else(|| {
            AugmentError::InvalidDescriptor(format!(
                "functions.{}.environment must be an object",
                self.name
            ))
        })?;
        environment.insert(Value::from(key), Value::from(value));
        Ok(())
    }
}
