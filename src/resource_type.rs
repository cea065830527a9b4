//! Per-extension resource type configuration.
//!
//! A [`ResourceType`] describes everything the pipeline needs to know about
//! one extension: how its files are read (`mode`), how their bodies are
//! decoded and encoded (`handler`), which in-place transforms run while an
//! artifact is of this type (`process`), which transform lists convert it to
//! other types (`conversions`), and which generator fans finished artifacts
//! out into outputs.
//!
//! Resource types are authored by environment configuration before a build
//! starts and are read-only during processing. Field invariants are enforced
//! at construction: a malformed type is a configuration error, raised
//! synchronously and fatal to the registering call, never discovered
//! mid-chain.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("Resource type mode must not be empty")]
    EmptyMode,
    #[error("Default target extension must not be empty")]
    EmptyTargetExtension,
    #[error("Default target extension must not be '.'")]
    DotTargetExtension,
    #[error("Plugin reference name must not be empty")]
    EmptyPluginName,
}

/// Immutable reference to a named plugin plus its per-use options.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginRef {
    name: String,
    options: Value,
}

impl PluginRef {
    /// Reference with empty options (`{}`).
    pub fn new(name: &str) -> Result<Self, TypeError> {
        Self::with_options(name, Value::Object(serde_json::Map::new()))
    }

    pub fn with_options(name: &str, options: Value) -> Result<Self, TypeError> {
        if name.is_empty() {
            return Err(TypeError::EmptyPluginName);
        }
        Ok(Self {
            name: name.to_string(),
            options,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &Value {
        &self.options
    }
}

/// Configuration for one extension. Built via [`ResourceType::builder`];
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceType {
    mode: String,
    parse_frontmatter: bool,
    default_target_extension: Option<String>,
    handler: Option<PluginRef>,
    generator: Option<PluginRef>,
    template_engine: Option<PluginRef>,
    process: Vec<PluginRef>,
    conversions: BTreeMap<String, Vec<PluginRef>>,
    custom: serde_json::Map<String, Value>,
}

impl Default for ResourceType {
    fn default() -> Self {
        Self {
            mode: "text".to_string(),
            parse_frontmatter: true,
            default_target_extension: None,
            handler: None,
            generator: None,
            template_engine: None,
            process: Vec::new(),
            conversions: BTreeMap::new(),
            custom: serde_json::Map::new(),
        }
    }
}

impl ResourceType {
    pub fn builder() -> ResourceTypeBuilder {
        ResourceTypeBuilder::default()
    }

    /// Name of the mode plugin used to read/write files of this type.
    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Whether source files of this type carry parseable frontmatter.
    pub fn parse_frontmatter(&self) -> bool {
        self.parse_frontmatter
    }

    /// Extension this type converts to when the chain doesn't say otherwise.
    pub fn default_target_extension(&self) -> Option<&str> {
        self.default_target_extension.as_deref()
    }

    pub fn handler(&self) -> Option<&PluginRef> {
        self.handler.as_ref()
    }

    pub fn generator(&self) -> Option<&PluginRef> {
        self.generator.as_ref()
    }

    pub fn template_engine(&self) -> Option<&PluginRef> {
        self.template_engine.as_ref()
    }

    /// In-place transforms applied while an artifact is of this type.
    pub fn process(&self) -> &[PluginRef] {
        &self.process
    }

    /// All conversion lists, keyed by lowercased target extension token.
    pub fn conversions(&self) -> &BTreeMap<String, Vec<PluginRef>> {
        &self.conversions
    }

    /// Transform list converting this type to `target`, if one is declared.
    /// Targets fold case the same way extension resolution does.
    pub fn conversion_to(&self, target: &str) -> Option<&[PluginRef]> {
        self.conversions.get(&target.to_lowercase()).map(Vec::as_slice)
    }

    /// Open bag for plugin-specific configuration.
    pub fn custom(&self) -> &serde_json::Map<String, Value> {
        &self.custom
    }
}

/// Builder for [`ResourceType`]. `build` validates the field invariants.
#[derive(Debug, Clone, Default)]
pub struct ResourceTypeBuilder {
    mode: Option<String>,
    parse_frontmatter: Option<bool>,
    default_target_extension: Option<String>,
    handler: Option<PluginRef>,
    generator: Option<PluginRef>,
    template_engine: Option<PluginRef>,
    process: Vec<PluginRef>,
    conversions: BTreeMap<String, Vec<PluginRef>>,
    custom: serde_json::Map<String, Value>,
}

impl ResourceTypeBuilder {
    pub fn mode(mut self, mode: &str) -> Self {
        self.mode = Some(mode.to_string());
        self
    }

    pub fn parse_frontmatter(mut self, parse: bool) -> Self {
        self.parse_frontmatter = Some(parse);
        self
    }

    pub fn default_target_extension(mut self, extension: &str) -> Self {
        self.default_target_extension = Some(extension.to_string());
        self
    }

    pub fn handler(mut self, plugin: PluginRef) -> Self {
        self.handler = Some(plugin);
        self
    }

    pub fn generator(mut self, plugin: PluginRef) -> Self {
        self.generator = Some(plugin);
        self
    }

    pub fn template_engine(mut self, plugin: PluginRef) -> Self {
        self.template_engine = Some(plugin);
        self
    }

    /// Append one in-place transform to the process list.
    pub fn process(mut self, plugin: PluginRef) -> Self {
        self.process.push(plugin);
        self
    }

    /// Declare the transform list converting this type to `target`. The
    /// target key is lowercased, like every extension token.
    pub fn conversion(mut self, target: &str, plugins: Vec<PluginRef>) -> Self {
        self.conversions.insert(target.to_lowercase(), plugins);
        self
    }

    pub fn custom_value(mut self, key: &str, value: Value) -> Self {
        self.custom.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> Result<ResourceType, TypeError> {
        let mode = self.mode.unwrap_or_else(|| "text".to_string());
        if mode.is_empty() {
            return Err(TypeError::EmptyMode);
        }
        if let Some(target) = &self.default_target_extension {
            if target.is_empty() {
                return Err(TypeError::EmptyTargetExtension);
            }
            if target == "." {
                return Err(TypeError::DotTargetExtension);
            }
        }
        Ok(ResourceType {
            mode,
            parse_frontmatter: self.parse_frontmatter.unwrap_or(true),
            default_target_extension: self.default_target_extension,
            handler: self.handler,
            generator: self.generator,
            template_engine: self.template_engine,
            process: self.process,
            conversions: self.conversions,
            custom: self.custom,
        })
    }
}
