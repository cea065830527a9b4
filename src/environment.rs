//! The hosting environment: plugin registries and plugin contracts.
//!
//! An [`Environment`] bundles the six registries the pipeline consults —
//! resource types, transformers, generators, handlers, modes, and template
//! engines — each a [`Registry`](crate::registry::Registry) with its own
//! "not defined" message wording. Extension- and mode-keyed registries are
//! case-insensitive (file extensions compare case-insensitively); plugin-name
//! registries are case-sensitive.
//!
//! The type registry carries a fallback routing any unknown extension to the
//! `"*"` key, so registering a default type via
//! [`Environment::set_default_type`] makes type resolution total. Without a
//! default, an unknown extension aborts the chain with a resolution error.
//!
//! Registries are mutated only during the configuration/registration phase;
//! during processing every stage borrows the environment immutably, which is
//! what lets a surrounding driver process multiple source files concurrently.
//!
//! ## Plugin contracts
//!
//! The concrete plugins are external collaborators. This module defines the
//! seams they implement:
//!
//! - [`Transformer`](crate::transform::Transformer) — in-place or fan-out
//!   content transforms (defined next to the sequence applier)
//! - [`Generator`] — fans a finished artifact into output artifacts
//! - [`Handler`] — decodes/encodes a type's body encoding
//! - [`Mode`] — reads and writes source files (text, binary, ...)
//! - [`TemplateEngine`] — renders a template against an artifact

use crate::artifact::Artifact;
use crate::registry::{Registry, RegistryError};
use crate::resource_type::ResourceType;
use crate::transform::Transformer;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Failure surfaced by a plugin implementation. Propagated unchanged through
/// the stream, aborting the remaining stages for that artifact branch.
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Failed(String),
}

/// Invocation context for a [`Generator`].
pub struct GeneratorContext<'a> {
    pub generator_name: &'a str,
    pub options: &'a Value,
    pub resource_type: &'a ResourceType,
    pub environment: &'a Environment,
}

/// Fans one finished artifact out into zero-or-more output artifacts
/// (e.g. one page per pagination slice).
pub trait Generator: Send + Sync {
    fn generate(
        &self,
        artifact: Artifact,
        ctx: &GeneratorContext,
    ) -> Result<Vec<Artifact>, PluginError>;
}

/// Invocation context for a [`Handler`].
pub struct HandlerContext<'a> {
    pub handler_name: &'a str,
    pub options: &'a Value,
    pub resource_type: &'a ResourceType,
}

/// Decodes a type's body encoding into structured data and back.
pub trait Handler: Send + Sync {
    fn decode(&self, encoded: &[u8], ctx: &HandlerContext) -> Result<Value, PluginError>;
    fn encode(&self, data: &Value, ctx: &HandlerContext) -> Result<Vec<u8>, PluginError>;
}

/// What a [`Mode`] read produces: the raw body plus any metadata the mode
/// extracted on the way in (frontmatter fields, file attributes).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceFile {
    pub body: Vec<u8>,
    pub meta: serde_json::Map<String, Value>,
}

/// Reads and writes files for a resource type. The resource type rides along
/// so a mode can honor per-type settings like
/// [`parse_frontmatter`](ResourceType::parse_frontmatter).
pub trait Mode: Send + Sync {
    fn read_file(
        &self,
        path: &Path,
        resource_type: &ResourceType,
    ) -> Result<SourceFile, PluginError>;

    fn write_file(
        &self,
        path: &Path,
        artifact: &Artifact,
        resource_type: &ResourceType,
    ) -> Result<(), PluginError>;
}

/// Invocation context for a [`TemplateEngine`].
pub struct TemplateContext<'a> {
    pub engine_name: &'a str,
    pub options: &'a Value,
    pub environment: &'a Environment,
}

/// Renders a template source against an artifact's properties.
pub trait TemplateEngine: Send + Sync {
    fn render(
        &self,
        template: &str,
        artifact: &Artifact,
        ctx: &TemplateContext,
    ) -> Result<String, PluginError>;
}

/// Extension key under which the default resource type is registered.
pub const DEFAULT_TYPE_KEY: &str = "*";

/// The pipeline's lookup surface: six independent alias-resolving registries.
#[derive(Debug)]
pub struct Environment {
    types: Registry<ResourceType>,
    transformers: Registry<Arc<dyn Transformer>>,
    generators: Registry<Arc<dyn Generator>>,
    handlers: Registry<Arc<dyn Handler>>,
    modes: Registry<Arc<dyn Mode>>,
    template_engines: Registry<Arc<dyn TemplateEngine>>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            types: Registry::case_insensitive()
                .with_missing_message("Resource type '{key}' is not defined.")
                .with_fallback(|_| Some(DEFAULT_TYPE_KEY.to_string())),
            transformers: Registry::new()
                .with_missing_message("Transformer '{key}' is not defined."),
            generators: Registry::new()
                .with_missing_message("Generator '{key}' is not defined."),
            handlers: Registry::new().with_missing_message("Handler '{key}' is not defined."),
            modes: Registry::case_insensitive()
                .with_missing_message("Mode '{key}' is not defined."),
            template_engines: Registry::new()
                .with_missing_message("Template engine '{key}' is not defined."),
        }
    }

    // --- registration (configuration phase) ---

    /// Register the resource type for an extension token (e.g. `".md"`).
    pub fn register_type(&mut self, extension: &str, resource_type: ResourceType) -> &mut Self {
        self.types.set(extension, resource_type);
        self
    }

    /// Alias one extension to another (`".markdown"` → `".md"`).
    pub fn alias_type(&mut self, extension: &str, target: &str) -> &mut Self {
        self.types.set_alias(extension, target);
        self
    }

    /// Register the `"*"` default type every unknown extension falls back to.
    pub fn set_default_type(&mut self, resource_type: ResourceType) -> &mut Self {
        self.types.set(DEFAULT_TYPE_KEY, resource_type);
        self
    }

    pub fn register_transformer(
        &mut self,
        name: &str,
        transformer: Arc<dyn Transformer>,
    ) -> &mut Self {
        self.transformers.set(name, transformer);
        self
    }

    pub fn alias_transformer(&mut self, name: &str, target: &str) -> &mut Self {
        self.transformers.set_alias(name, target);
        self
    }

    pub fn register_generator(&mut self, name: &str, generator: Arc<dyn Generator>) -> &mut Self {
        self.generators.set(name, generator);
        self
    }

    pub fn alias_generator(&mut self, name: &str, target: &str) -> &mut Self {
        self.generators.set_alias(name, target);
        self
    }

    pub fn register_handler(&mut self, name: &str, handler: Arc<dyn Handler>) -> &mut Self {
        self.handlers.set(name, handler);
        self
    }

    pub fn alias_handler(&mut self, name: &str, target: &str) -> &mut Self {
        self.handlers.set_alias(name, target);
        self
    }

    pub fn register_mode(&mut self, name: &str, mode: Arc<dyn Mode>) -> &mut Self {
        self.modes.set(name, mode);
        self
    }

    pub fn alias_mode(&mut self, name: &str, target: &str) -> &mut Self {
        self.modes.set_alias(name, target);
        self
    }

    pub fn register_template_engine(
        &mut self,
        name: &str,
        engine: Arc<dyn TemplateEngine>,
    ) -> &mut Self {
        self.template_engines.set(name, engine);
        self
    }

    pub fn alias_template_engine(&mut self, name: &str, target: &str) -> &mut Self {
        self.template_engines.set_alias(name, target);
        self
    }

    // --- lookup (processing phase) ---

    /// Resolve an extension token to its resource type. Unknown extensions
    /// fall back to the `"*"` default type when one is registered.
    pub fn resource_type(&self, extension: &str) -> Result<&ResourceType, RegistryError> {
        self.types.lookup(extension)
    }

    /// Resolve an extension token without failing on "unknown".
    pub fn resource_type_quiet(
        &self,
        extension: &str,
    ) -> Result<Option<&ResourceType>, RegistryError> {
        self.types.lookup_quiet(extension)
    }

    pub fn transformer(&self, name: &str) -> Result<&Arc<dyn Transformer>, RegistryError> {
        self.transformers.lookup(name)
    }

    /// Resolve a transformer name through any aliases, returning the
    /// concrete registered name alongside the implementation.
    pub fn transformer_entry(
        &self,
        name: &str,
    ) -> Result<(String, &Arc<dyn Transformer>), RegistryError> {
        self.transformers.lookup_entry(name)
    }

    pub fn generator(&self, name: &str) -> Result<&Arc<dyn Generator>, RegistryError> {
        self.generators.lookup(name)
    }

    pub fn handler(&self, name: &str) -> Result<&Arc<dyn Handler>, RegistryError> {
        self.handlers.lookup(name)
    }

    pub fn mode(&self, name: &str) -> Result<&Arc<dyn Mode>, RegistryError> {
        self.modes.lookup(name)
    }

    pub fn template_engine(&self, name: &str) -> Result<&Arc<dyn TemplateEngine>, RegistryError> {
        self.template_engines.lookup(name)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
