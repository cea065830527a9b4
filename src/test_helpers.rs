//! Shared test fixtures: marker transformers, recording plugin mocks, and
//! a pre-wired environment for chain tests.
//!
//! The recording mocks follow the same pattern throughout: interior
//! `Mutex`-guarded vectors record every invocation, so tests register the
//! mock (behind an `Arc` they keep a clone of) and assert on what the
//! pipeline actually asked it to do.

use crate::artifact::{Artifact, Changes};
use crate::environment::{
    Environment, Generator, GeneratorContext, Handler, HandlerContext, Mode, PluginError,
    SourceFile,
};
use crate::resource_type::{PluginRef, ResourceType};
use crate::transform::{TransformContext, Transformer};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Mutex;

/// Artifact with only a string `body` property.
pub fn text_artifact(body: &str) -> Artifact {
    Artifact::builder().prop("body", json!(body)).build()
}

/// The string `body` property, panicking if absent or non-string.
pub fn body_of(artifact: &Artifact) -> &str {
    artifact
        .prop("body")
        .and_then(Value::as_str)
        .expect("artifact has no string body")
}

fn rewrite_body(artifact: &Artifact, body: String) -> Artifact {
    artifact.with_changes(&Changes::new().set("body", Value::String(body)))
}

/// Wraps the body: marker `M` turns `x` into `M<x>`.
pub struct MarkerTransformer {
    marker: String,
}

impl MarkerTransformer {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_string(),
        }
    }
}

impl Transformer for MarkerTransformer {
    fn transform(
        &self,
        artifact: Artifact,
        _ctx: &TransformContext,
    ) -> Result<Vec<Artifact>, PluginError> {
        let body = format!("{}<{}>", self.marker, body_of(&artifact));
        Ok(vec![rewrite_body(&artifact, body)])
    }
}

/// Appends a fixed suffix to the body. Used as a conversion marker.
pub struct AppendTransformer {
    suffix: String,
}

impl AppendTransformer {
    pub fn new(suffix: &str) -> Self {
        Self {
            suffix: suffix.to_string(),
        }
    }
}

impl Transformer for AppendTransformer {
    fn transform(
        &self,
        artifact: Artifact,
        _ctx: &TransformContext,
    ) -> Result<Vec<Artifact>, PluginError> {
        let body = format!("{}{}", body_of(&artifact), self.suffix);
        Ok(vec![rewrite_body(&artifact, body)])
    }
}

/// Fans one artifact into `pages` slices (from options), tagging each clone
/// with its page key `"1"`, `"2"`, ...
pub struct PaginateTransformer;

impl Transformer for PaginateTransformer {
    fn transform(
        &self,
        artifact: Artifact,
        ctx: &TransformContext,
    ) -> Result<Vec<Artifact>, PluginError> {
        let pages = ctx.options.get("pages").and_then(Value::as_u64).unwrap_or(1);
        Ok((1..=pages)
            .map(|n| artifact.with_changes(&Changes::new().page(&n.to_string())))
            .collect())
    }
}

/// A [`PluginRef`] invoking `name` with `{"pages": n}` options.
pub fn paginate_plugin(name: &str, pages: u64) -> PluginRef {
    PluginRef::with_options(name, json!({ "pages": pages })).unwrap()
}

/// Always fails with a plugin error.
pub struct FailingTransformer;

impl Transformer for FailingTransformer {
    fn transform(
        &self,
        _artifact: Artifact,
        _ctx: &TransformContext,
    ) -> Result<Vec<Artifact>, PluginError> {
        Err(PluginError::Failed("exploded".to_string()))
    }
}

/// Mode mock: returns a canned [`SourceFile`] and records every read/write
/// path it sees.
#[derive(Default)]
pub struct RecordingMode {
    pub file: SourceFile,
    pub reads: Mutex<Vec<String>>,
    pub writes: Mutex<Vec<String>>,
}

impl RecordingMode {
    pub fn returning(body: &str) -> Self {
        Self {
            file: SourceFile {
                body: body.as_bytes().to_vec(),
                meta: serde_json::Map::new(),
            },
            ..Self::default()
        }
    }

    pub fn with_meta(mut self, key: &str, value: Value) -> Self {
        self.file.meta.insert(key.to_string(), value);
        self
    }
}

impl Mode for RecordingMode {
    fn read_file(
        &self,
        path: &Path,
        _resource_type: &ResourceType,
    ) -> Result<SourceFile, PluginError> {
        self.reads
            .lock()
            .unwrap()
            .push(path.to_string_lossy().to_string());
        Ok(self.file.clone())
    }

    fn write_file(
        &self,
        path: &Path,
        _artifact: &Artifact,
        _resource_type: &ResourceType,
    ) -> Result<(), PluginError> {
        self.writes
            .lock()
            .unwrap()
            .push(path.to_string_lossy().to_string());
        Ok(())
    }
}

/// Handler mock: decodes every body to a canned value, records calls.
pub struct RecordingHandler {
    pub decoded: Value,
    pub decode_calls: Mutex<Vec<Vec<u8>>>,
    pub encode_calls: Mutex<Vec<Value>>,
}

impl RecordingHandler {
    pub fn decoding_to(decoded: Value) -> Self {
        Self {
            decoded,
            decode_calls: Mutex::new(Vec::new()),
            encode_calls: Mutex::new(Vec::new()),
        }
    }
}

impl Handler for RecordingHandler {
    fn decode(&self, encoded: &[u8], _ctx: &HandlerContext) -> Result<Value, PluginError> {
        self.decode_calls.lock().unwrap().push(encoded.to_vec());
        Ok(self.decoded.clone())
    }

    fn encode(&self, data: &Value, _ctx: &HandlerContext) -> Result<Vec<u8>, PluginError> {
        self.encode_calls.lock().unwrap().push(data.clone());
        Ok(data.to_string().into_bytes())
    }
}

/// Generator mock: yields `copies` clones per artifact, each tagged with a
/// `copy` property, and records the URLs it was invoked on.
pub struct RecordingGenerator {
    pub copies: u64,
    pub calls: Mutex<Vec<Option<String>>>,
}

impl RecordingGenerator {
    pub fn yielding(copies: u64) -> Self {
        Self {
            copies,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl Generator for RecordingGenerator {
    fn generate(
        &self,
        artifact: Artifact,
        _ctx: &GeneratorContext,
    ) -> Result<Vec<Artifact>, PluginError> {
        self.calls
            .lock()
            .unwrap()
            .push(artifact.url().map(String::from));
        Ok((1..=self.copies)
            .map(|n| artifact.with_changes(&Changes::new().set("copy", json!(n))))
            .collect())
    }
}

/// Environment wired for chain tests: every extension in the
/// `.html.md.nunjucks` worked example has a marker process transform
/// (`p.md`, ..., `p.$`) and a conversion marker (`_to_<ext>`) to the next
/// type, plus
/// a `.paged` type whose process stage paginates into 2 slices.
pub fn chain_fixture_env() -> Environment {
    use std::sync::Arc;

    let mut env = Environment::new();

    for ext in [".nunjucks", ".md", ".html", "$"] {
        // marker reads `p.<token>`; the sentinel gets `p.$`
        env.register_transformer(
            &format!("process{ext}"),
            Arc::new(MarkerTransformer::new(&format!(
                "p.{}",
                ext.trim_start_matches('.')
            ))),
        );
    }
    for target in [".md", ".html", "$"] {
        env.register_transformer(
            &format!("convert-to{target}"),
            Arc::new(AppendTransformer::new(&format!("_to_{target}"))),
        );
    }
    env.register_transformer("paginate", Arc::new(PaginateTransformer));

    let process_ref = |ext: &str| PluginRef::new(&format!("process{ext}")).unwrap();
    let convert_ref =
        |target: &str| vec![PluginRef::new(&format!("convert-to{target}")).unwrap()];

    env.register_type(
        ".nunjucks",
        ResourceType::builder()
            .process(process_ref(".nunjucks"))
            .conversion(".md", convert_ref(".md"))
            .build()
            .unwrap(),
    );
    env.register_type(
        ".md",
        ResourceType::builder()
            .process(process_ref(".md"))
            .conversion(".html", convert_ref(".html"))
            .build()
            .unwrap(),
    );
    env.register_type(
        ".html",
        ResourceType::builder()
            .process(process_ref(".html"))
            .conversion("$", convert_ref("$"))
            .build()
            .unwrap(),
    );
    env.register_type(
        "$",
        ResourceType::builder()
            .process(process_ref("$"))
            .build()
            .unwrap(),
    );
    env.register_type("", ResourceType::default());
    env.register_type(
        ".paged",
        ResourceType::builder()
            .process(paginate_plugin("paginate", 2))
            .build()
            .unwrap(),
    );

    env
}
