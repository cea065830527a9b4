//! Extension-chain parsing and processing.
//!
//! A source file's name carries a dot-separated chain of extensions,
//! authored innermost-first: `about.html.md.nunjucks` means "nunjucks
//! produces md, md produces html". Processing therefore walks the chain
//! right-to-left — nunjucks first — and finishes on a sentinel "final"
//! token ([`FINAL_EXTENSION`], `"$"`) standing for "no further extension".
//!
//! For each token the processor resolves the token's resource type, runs the
//! *previous* type's conversion transforms for this token (turning artifacts
//! of the previous type into the current type), then runs the current type's
//! own process transforms. For chain `.html.md.nunjucks` the stage order is:
//!
//! ```text
//! nunjucks-process → (nunjucks→md) → md-process → (md→html) → html-process
//!                  → (html→$) → $-process
//! ```
//!
//! No conversion runs before the first token — there is no previous type yet.
//! Any stage may fan out, so the chain maps one input artifact to
//! zero-or-more outputs. The first failure — an unresolved type or
//! transformer, or a plugin error — aborts the whole chain; there is no
//! partial-output recovery.

use crate::artifact::Artifact;
use crate::environment::Environment;
use crate::registry::RegistryError;
use crate::resource_type::ResourceType;
use crate::transform::{self, TransformError};
use thiserror::Error;

/// Sentinel token for the terminal stage of every chain.
pub const FINAL_EXTENSION: &str = "$";

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("{0}")]
    Registry(#[from] RegistryError),
    #[error("{0}")]
    Transform(#[from] TransformError),
}

/// Split a chain string into extension tokens, innermost-first.
///
/// A token is a dot followed by one-or-more non-dot characters, so
/// `".html.md.nunjucks"` yields `[".html", ".md", ".nunjucks"]` and any
/// leading basename (`"about.md"`) is skipped. A chain with no tokens
/// yields a single empty-string token.
pub fn parse_extension_chain(chain: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = chain;
    while let Some(pos) = rest.find('.') {
        rest = &rest[pos..];
        let end = rest[1..].find('.').map(|i| i + 1).unwrap_or(rest.len());
        if end > 1 {
            tokens.push(rest[..end].to_string());
        }
        rest = &rest[end..];
    }
    if tokens.is_empty() {
        tokens.push(String::new());
    }
    tokens
}

/// The token sequence processing actually walks: parsed tokens reversed
/// (outermost extension last) plus the `"$"` sentinel.
pub fn processing_order(chain: &str) -> Vec<String> {
    let mut tokens = parse_extension_chain(chain);
    tokens.reverse();
    tokens.push(FINAL_EXTENSION.to_string());
    tokens
}

/// Run an artifact through its extension chain, returning the final
/// artifact stream. This is the pipeline's externally callable surface.
pub fn apply_extension_chain(
    environment: &Environment,
    artifact: Artifact,
    chain: &str,
) -> Result<Vec<Artifact>, ChainError> {
    let tokens = processing_order(chain);

    let mut stream = vec![artifact];
    let mut previous: Option<&ResourceType> = None;

    for token in &tokens {
        let current = environment.resource_type(token)?;

        if let Some(previous) = previous {
            if let Some(conversion) = previous.conversion_to(token) {
                if !conversion.is_empty() {
                    stream = transform::apply_sequence_all(environment, stream, conversion)?;
                }
            }
        }

        stream = transform::apply_sequence_all(environment, stream, current.process())?;
        previous = Some(current);
    }

    Ok(stream)
}
