//! # Pagesmith
//!
//! A plugin-driven content build pipeline. Source artifacts carry chained
//! extensions (`about.html.md.nunjucks`), and a declared per-extension
//! configuration decodes, transforms, converts, and finally emits
//! zero-or-more output artifacts.
//!
//! # Architecture: Extension-Chain Processing
//!
//! The chain is authored innermost-first — `.html.md.nunjucks` reads
//! "nunjucks produces md produces html" — and processed right-to-left,
//! alternating two kinds of transform stages:
//!
//! ```text
//! nunjucks-process → (nunjucks→md) → md-process → (md→html) → html-process
//!                  → (html→$) → $-process
//! ```
//!
//! *Process* stages apply in-place transforms for the current type;
//! *conversion* stages turn artifacts of the previous type into the current
//! one. A sentinel `$` token terminates every chain. Any stage may fan one
//! artifact out into many (pagination) or drop it (filtering), so one source
//! maps to zero-or-more outputs.
//!
//! Three properties hold everywhere:
//!
//! - **Artifacts are immutable**: stages clone-with-overrides, never mutate,
//!   so one branch's failure cannot corrupt another's input.
//! - **Lookups go through alias-resolving registries**: every type and
//!   plugin name resolves through [`registry::Registry`], with transitive
//!   aliases, cycle detection, and per-registry error wording.
//! - **First error aborts the chain**: streams are ordered `Vec`s threaded
//!   through `Result`, so an unresolved name or plugin failure stops that
//!   source file and only that source file.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`registry`] | Generic alias-resolving registry with cycle detection and fallback keys |
//! | [`artifact`] | Immutable content unit: path/url metadata, property bag, clone-with-changes |
//! | [`resource_type`] | Per-extension configuration: mode, handler, process and conversion lists |
//! | [`transform`] | Transformer plugin seam and the fan-out-compounding sequence applier |
//! | [`chain`] | Extension-chain parsing and the conversion/process stage walk |
//! | [`environment`] | The six plugin registries and the Generator/Handler/Mode/TemplateEngine seams |
//! | [`config`] | `pipeline.toml` loading, including the `alias-of(...)` alias wire format |
//! | [`build`] | Per-source orchestration: read → decode → chain → generate |
//!
//! # Design Decisions
//!
//! ## Tagged Aliases Over String Sniffing
//!
//! Registry entries are an explicit sum type (`Entry::Value` /
//! `Entry::Alias`). The `alias-of(<target>)` string form survives only in
//! configuration files, recognized by [`config::parse_alias_marker`] at the
//! load boundary — nothing downstream pattern-matches strings to decide
//! whether a value is real.
//!
//! ## Plugins Are External
//!
//! The pipeline defines the seams — [`transform::Transformer`],
//! [`environment::Generator`], [`environment::Handler`],
//! [`environment::Mode`], [`environment::TemplateEngine`] — and resolves
//! implementations by name. It ships none of them: markdown converters,
//! template engines, and paginators are the hosting application's business.
//!
//! ## Synchronous Streams
//!
//! A stage's "stream" is an ordered `Vec<Artifact>` inside a `Result`.
//! That is the whole asynchrony story: zero-or-more values, in order, first
//! error aborts. Registries are written only during the registration phase,
//! and processing borrows the environment immutably, so a driver that wants
//! parallelism runs whole source files concurrently rather than splitting
//! one file's chain.

pub mod artifact;
pub mod build;
pub mod chain;
pub mod config;
pub mod environment;
pub mod registry;
pub mod resource_type;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_helpers;
