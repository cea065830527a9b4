//! Transformer plugins and the transform sequence applier.
//!
//! A [`Transformer`] is the pipeline's unit of pluggable work: it takes one
//! artifact and returns zero-or-more output artifacts. A transform may drop
//! its input (filter), pass it through modified (the common case), or fan it
//! out (paginate). The pipeline never implements transformers itself — it
//! resolves them by name from the environment's transformer registry and
//! invokes them.
//!
//! [`apply_sequence`] folds an ordered list of [`PluginRef`]s over an
//! artifact stream: each stage is applied independently to every artifact
//! currently in the stream, so fan-out compounds — a stage yielding 2
//! outputs followed by a stage yielding 2 per input produces 4. An empty
//! list is a no-op that yields exactly the input. The first error — an
//! unresolved transformer name or a plugin failure — aborts the remaining
//! stages and fails the whole sequence.

use crate::artifact::Artifact;
use crate::environment::{Environment, PluginError};
use crate::registry::RegistryError;
use crate::resource_type::PluginRef;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("{0}")]
    Registry(#[from] RegistryError),
    #[error("Transformer '{name}' failed: {source}")]
    Plugin {
        name: String,
        #[source]
        source: PluginError,
    },
}

/// Invocation context handed to a transformer: the resolved (post-alias)
/// transformer name, the per-use options from the [`PluginRef`], and the
/// environment for nested lookups (a transformer may itself resolve
/// template engines).
pub struct TransformContext<'a> {
    pub transformer_name: &'a str,
    pub options: &'a Value,
    pub environment: &'a Environment,
}

/// A named transform plugin. Implementations are registered on the
/// environment and resolved by name, possibly through aliases.
pub trait Transformer: Send + Sync {
    /// Transform one artifact into zero-or-more output artifacts.
    fn transform(
        &self,
        artifact: Artifact,
        ctx: &TransformContext,
    ) -> Result<Vec<Artifact>, PluginError>;
}

/// Apply an ordered transform sequence to a single starting artifact.
pub fn apply_sequence(
    environment: &Environment,
    artifact: Artifact,
    plugins: &[PluginRef],
) -> Result<Vec<Artifact>, TransformError> {
    apply_sequence_all(environment, vec![artifact], plugins)
}

/// Apply an ordered transform sequence to every artifact in a stream,
/// threading each stage's outputs into the next stage's inputs.
pub fn apply_sequence_all(
    environment: &Environment,
    mut stream: Vec<Artifact>,
    plugins: &[PluginRef],
) -> Result<Vec<Artifact>, TransformError> {
    for plugin in plugins {
        // the context carries the resolved name; only the not-defined error
        // (raised inside transformer_entry) names the key as requested
        let (name, transformer) = environment.transformer_entry(plugin.name())?;
        let ctx = TransformContext {
            transformer_name: &name,
            options: plugin.options(),
            environment,
        };

        let mut next = Vec::new();
        for artifact in stream {
            let outputs =
                transformer
                    .transform(artifact, &ctx)
                    .map_err(|source| TransformError::Plugin {
                        name: name.clone(),
                        source,
                    })?;
            next.extend(outputs);
        }
        stream = next;
    }
    Ok(stream)
}
