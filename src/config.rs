//! Pipeline configuration loading.
//!
//! Resource types and their aliases can be authored in a `pipeline.toml`
//! instead of code. Each entry under `[types]` is either a type table or the
//! literal string `alias-of(<target>)` — the wire format for alias entries,
//! recognized only at this load boundary (internally aliases are a tagged
//! registry variant, never sniffed out of strings):
//!
//! ```toml
//! [types.".md"]
//! mode = "text"
//! default_target_extension = ".html"
//! handler = "frontmatter"
//! process = ["trim", { name = "smartquotes", options = { locale = "en" } }]
//!
//! [types.".md".conversions]
//! ".html" = ["markdown"]
//!
//! [types]
//! ".markdown" = "alias-of(.md)"
//! ```
//!
//! Plugin references are either a bare name or a `{ name, options }` table.
//! Unknown keys are rejected to catch typos early. Field invariants
//! (non-empty mode, sane target extension) are enforced while converting to
//! [`ResourceType`], so a malformed file fails the load, not a later build.

use crate::environment::Environment;
use crate::registry::Entry;
use crate::resource_type::{PluginRef, ResourceType, TypeError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid resource type: {0}")]
    Type(#[from] TypeError),
}

/// Recognize the `alias-of(<target>)` wire format. The target may be empty
/// (an alias to the empty-string key). Returns `None` for any other string.
pub fn parse_alias_marker(value: &str) -> Option<&str> {
    value.strip_prefix("alias-of(")?.strip_suffix(')')
}

/// Parsed pipeline configuration: resource types and aliases, ready to be
/// applied to an [`Environment`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    types: BTreeMap<String, Entry<ResourceType>>,
}

impl PipelineConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;
        let mut types = BTreeMap::new();
        for (extension, entry) in raw.types {
            let entry = match entry {
                RawTypeEntry::Marker(value) => match parse_alias_marker(&value) {
                    Some(target) => Entry::Alias(target.to_string()),
                    None => {
                        return Err(ConfigError::Validation(format!(
                            "type '{extension}': expected a table or 'alias-of(<target>)', got '{value}'"
                        )));
                    }
                },
                RawTypeEntry::Table(raw_type) => Entry::Value(raw_type.into_resource_type()?),
            };
            types.insert(extension, entry);
        }
        Ok(Self { types })
    }

    /// Load configuration from a `pipeline.toml` file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&fs::read_to_string(path)?)
    }

    /// Register every configured type and alias on an environment.
    pub fn apply_to(&self, environment: &mut Environment) {
        for (extension, entry) in &self.types {
            match entry {
                Entry::Value(resource_type) => {
                    environment.register_type(extension, resource_type.clone());
                }
                Entry::Alias(target) => {
                    environment.alias_type(extension, target);
                }
            }
        }
    }

    pub fn types(&self) -> &BTreeMap<String, Entry<ResourceType>> {
        &self.types
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    types: BTreeMap<String, RawTypeEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTypeEntry {
    Marker(String),
    Table(RawResourceType),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawResourceType {
    mode: Option<String>,
    parse_frontmatter: Option<bool>,
    default_target_extension: Option<String>,
    handler: Option<RawPluginRef>,
    generator: Option<RawPluginRef>,
    template_engine: Option<RawPluginRef>,
    process: Vec<RawPluginRef>,
    conversions: BTreeMap<String, Vec<RawPluginRef>>,
    custom: Option<toml::Table>,
}

impl RawResourceType {
    fn into_resource_type(self) -> Result<ResourceType, TypeError> {
        let mut builder = ResourceType::builder();
        if let Some(mode) = &self.mode {
            builder = builder.mode(mode);
        }
        if let Some(parse) = self.parse_frontmatter {
            builder = builder.parse_frontmatter(parse);
        }
        if let Some(target) = &self.default_target_extension {
            builder = builder.default_target_extension(target);
        }
        if let Some(handler) = self.handler {
            builder = builder.handler(handler.into_plugin_ref()?);
        }
        if let Some(generator) = self.generator {
            builder = builder.generator(generator.into_plugin_ref()?);
        }
        if let Some(engine) = self.template_engine {
            builder = builder.template_engine(engine.into_plugin_ref()?);
        }
        for plugin in self.process {
            builder = builder.process(plugin.into_plugin_ref()?);
        }
        for (target, plugins) in self.conversions {
            let plugins = plugins
                .into_iter()
                .map(RawPluginRef::into_plugin_ref)
                .collect::<Result<Vec<_>, _>>()?;
            builder = builder.conversion(&target, plugins);
        }
        if let Some(custom) = self.custom {
            for (key, value) in custom {
                builder = builder.custom_value(&key, toml_to_json(value));
            }
        }
        builder.build()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPluginRef {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        options: Option<toml::Value>,
    },
}

impl RawPluginRef {
    fn into_plugin_ref(self) -> Result<PluginRef, TypeError> {
        match self {
            RawPluginRef::Name(name) => PluginRef::new(&name),
            RawPluginRef::Full { name, options } => match options {
                Some(options) => PluginRef::with_options(&name, toml_to_json(options)),
                None => PluginRef::new(&name),
            },
        }
    }
}

fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::Value::from(i),
        toml::Value::Float(f) => serde_json::Value::from(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}
