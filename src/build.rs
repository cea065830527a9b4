//! Per-source orchestration: read, decode, transform, generate.
//!
//! [`process_source`] is what the surrounding driver calls once per source
//! file it discovered. It wires the narrow plugin seams together:
//!
//! ```text
//! source path
//!   → resolve source type     (innermost extension, types registry)
//!   → Mode::read_file         (the type's mode plugin)
//!   → Handler::decode         (the type's handler plugin, if declared)
//!   → stamp provenance        (chain, source path, type, mode)
//!   → apply_extension_chain   (conversion/process transform stages)
//!   → Generator::generate     (the type's generator plugin, if declared)
//!   → zero-or-more final artifacts
//! ```
//!
//! Source files are independent: one file's failure terminates only that
//! file's processing. Nothing here mutates the environment, so a driver may
//! run many sources against the same environment concurrently.

use crate::artifact::Artifact;
use crate::chain::{self, ChainError};
use crate::environment::{Environment, GeneratorContext, HandlerContext, PluginError};
use crate::registry::RegistryError;
use crate::resource_type::ResourceType;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("{0}")]
    Registry(#[from] RegistryError),
    #[error("{0}")]
    Chain(#[from] ChainError),
    #[error("Mode '{name}' failed: {source}")]
    Mode {
        name: String,
        #[source]
        source: PluginError,
    },
    #[error("Handler '{name}' failed: {source}")]
    Handler {
        name: String,
        #[source]
        source: PluginError,
    },
    #[error("Generator '{name}' failed: {source}")]
    Generator {
        name: String,
        #[source]
        source: PluginError,
    },
}

/// Split a source path into (output path, extension chain).
///
/// The chain is the basename's first dot onward; the output path is the
/// source path with the chain stripped. `content/about.html.md` splits into
/// `("content/about", ".html.md")`; a dotless path keeps an empty chain.
fn split_source_path(source_path: &str) -> (&str, &str) {
    let basename_start = source_path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match source_path[basename_start..].find('.') {
        Some(dot) => source_path.split_at(basename_start + dot),
        None => (source_path, ""),
    }
}

/// Process one source file end to end, returning its final artifacts.
pub fn process_source(
    environment: &Environment,
    source_path: &str,
) -> Result<Vec<Artifact>, BuildError> {
    let (out_path, source_chain) = split_source_path(source_path);
    let tokens = chain::parse_extension_chain(source_chain);
    // innermost-first authoring: the rightmost token is the source's own type
    let source_token = tokens.last().map(String::as_str).unwrap_or("");

    let resource_type = environment.resource_type(source_token)?;

    // multi-token chains name their target outermost; a single-token source
    // falls back to its type's declared target, else stays its own extension
    let target_extension = if tokens.len() > 1 {
        tokens.first().map(String::as_str).unwrap_or("")
    } else {
        resource_type
            .default_target_extension()
            .unwrap_or(source_token)
    };

    let mode_name = resource_type.mode();
    let mode = environment.mode(mode_name)?;
    let file = mode
        .read_file(Path::new(source_path), resource_type)
        .map_err(|source| BuildError::Mode {
            name: mode_name.to_string(),
            source,
        })?;

    let mut builder = Artifact::builder()
        .path(out_path)
        .extension(target_extension)
        .source_chain(source_chain)
        .source_path(source_path)
        .source_type(source_token)
        .read_mode(mode_name)
        .prop(
            "body",
            Value::String(String::from_utf8_lossy(&file.body).into_owned()),
        );
    for (key, value) in &file.meta {
        builder = builder.prop(key, value.clone());
    }

    if let Some(handler_ref) = resource_type.handler() {
        let handler = environment.handler(handler_ref.name())?;
        let ctx = HandlerContext {
            handler_name: handler_ref.name(),
            options: handler_ref.options(),
            resource_type,
        };
        let decoded =
            handler
                .decode(&file.body, &ctx)
                .map_err(|source| BuildError::Handler {
                    name: handler_ref.name().to_string(),
                    source,
                })?;
        match decoded {
            Value::Object(map) => {
                for (key, value) in map {
                    builder = builder.prop(&key, value);
                }
            }
            other => builder = builder.prop("data", other),
        }
    }

    let stream = chain::apply_extension_chain(environment, builder.build(), source_chain)?;

    let Some(generator_ref) = resource_type.generator() else {
        return Ok(stream);
    };

    let generator = environment.generator(generator_ref.name())?;
    let mut outputs = Vec::new();
    for artifact in stream {
        let ctx = GeneratorContext {
            generator_name: generator_ref.name(),
            options: generator_ref.options(),
            resource_type,
            environment,
        };
        let generated =
            generator
                .generate(artifact, &ctx)
                .map_err(|source| BuildError::Generator {
                    name: generator_ref.name().to_string(),
                    source,
                })?;
        outputs.extend(generated);
    }
    Ok(outputs)
}

/// Persist one artifact through the mode plugin of the given resource type.
pub fn write_artifact(
    environment: &Environment,
    path: &Path,
    artifact: &Artifact,
    resource_type: &ResourceType,
) -> Result<(), BuildError> {
    let mode_name = resource_type.mode();
    let mode = environment.mode(mode_name)?;
    mode.write_file(path, artifact, resource_type)
        .map_err(|source| BuildError::Mode {
            name: mode_name.to_string(),
            source,
        })
}
