//! The immutable content unit threaded through every pipeline stage.
//!
//! An [`Artifact`] is one unit of content at some point in its life: a source
//! file just read from disk, a half-transformed document mid-chain, or a final
//! output ready for a generator. Stages never mutate an artifact — each stage
//! produces new artifacts via [`Artifact::with_changes`], so a failure in one
//! branch can never corrupt the inputs of another.
//!
//! ## Derived fields
//!
//! `name`, `url`, and `segments` are computed once, at construction or clone
//! time, and only when `path` is set:
//!
//! - `name`: the final component of `path`
//! - `url`: `base_url` + `path`, with the pagination slice (if any) inserted
//!   before the extension — `posts/index` + page `"2"` + `.html` becomes
//!   `/posts/index.2.html`
//! - `segments`: the non-empty `/`-separated components of `url`
//!
//! ## Properties
//!
//! Beyond the well-known fields, artifacts carry an open, ordered bag of
//! user-defined JSON properties (`body`, `title`, frontmatter data, whatever
//! plugins agree on). Cloning and equality treat the bag and the well-known
//! fields uniformly.
//!
//! ## Provenance
//!
//! Artifacts remember where they came from — the source extension chain, the
//! source file path, the resolved source type, and the read mode. These are
//! stamped once when the hosting environment constructs the artifact and ride
//! along unchanged through every clone.

use serde_json::Value;

/// Immutable unit of content at any pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    base_url: String,
    path: Option<String>,
    extension: String,
    page: Option<String>,
    name: Option<String>,
    url: Option<String>,
    segments: Option<Vec<String>>,
    properties: serde_json::Map<String, Value>,
    source_chain: Option<String>,
    source_path: Option<String>,
    source_type: Option<String>,
    read_mode: Option<String>,
}

impl Artifact {
    /// Start building an artifact. `base_url` defaults to `"/"`, `extension`
    /// to `""`, everything else to absent.
    pub fn builder() -> ArtifactBuilder {
        ArtifactBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Pagination slice key, set by fan-out transforms that paginate.
    pub fn page(&self) -> Option<&str> {
        self.page.as_deref()
    }

    /// Basename of `path`. Present only when `path` is set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Resolved URL. Present only when `path` is set.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// URL path components. Present only when `path` is set.
    pub fn segments(&self) -> Option<&[String]> {
        self.segments.as_deref()
    }

    /// One user-defined property, or `None` if unset.
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// The full user-defined property bag, in insertion order.
    pub fn properties(&self) -> &serde_json::Map<String, Value> {
        &self.properties
    }

    /// Extension chain of the source file this artifact descends from.
    pub fn source_chain(&self) -> Option<&str> {
        self.source_chain.as_deref()
    }

    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// Extension key of the resolved source resource type.
    pub fn source_type(&self) -> Option<&str> {
        self.source_type.as_deref()
    }

    /// Name of the mode plugin the source was read with.
    pub fn read_mode(&self) -> Option<&str> {
        self.read_mode.as_deref()
    }

    /// Clone with overrides. The original is untouched; the result re-derives
    /// `name`/`url`/`segments` from its post-override fields. A
    /// [`Changes::remove`] entry deletes the property rather than storing a
    /// marker.
    pub fn with_changes(&self, changes: &Changes) -> Artifact {
        if changes.is_empty() {
            return self.clone();
        }

        let mut next = self.clone();

        if let Some(base_url) = &changes.base_url {
            next.base_url = base_url.clone();
        }
        if let Some(path) = &changes.path {
            next.path = path.clone();
        }
        if let Some(extension) = &changes.extension {
            next.extension = extension.clone();
        }
        if let Some(page) = &changes.page {
            next.page = page.clone();
        }
        for (key, change) in &changes.props {
            match change {
                PropChange::Set(value) => {
                    next.properties.insert(key.clone(), value.clone());
                }
                PropChange::Remove => {
                    next.properties.shift_remove(key);
                }
            }
        }

        next.rederive();
        next
    }

    fn rederive(&mut self) {
        match &self.path {
            Some(path) => {
                let url = derive_url(
                    &self.base_url,
                    path,
                    &self.extension,
                    self.page.as_deref(),
                );
                self.name = Some(basename(path).to_string());
                self.segments = Some(
                    url.split('/')
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect(),
                );
                self.url = Some(url);
            }
            None => {
                self.name = None;
                self.url = None;
                self.segments = None;
            }
        }
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn derive_url(base_url: &str, path: &str, extension: &str, page: Option<&str>) -> String {
    let mut url = base_url.to_string();
    if !url.ends_with('/') {
        url.push('/');
    }
    url.push_str(path.trim_start_matches('/'));
    if let Some(page) = page {
        url.push('.');
        url.push_str(page);
    }
    url.push_str(extension);
    url
}

/// Builder for [`Artifact`]. Used by the hosting environment when a source
/// file enters the pipeline; every later artifact comes from
/// [`Artifact::with_changes`].
#[derive(Debug, Clone, Default)]
pub struct ArtifactBuilder {
    base_url: Option<String>,
    path: Option<String>,
    extension: Option<String>,
    page: Option<String>,
    properties: serde_json::Map<String, Value>,
    source_chain: Option<String>,
    source_path: Option<String>,
    source_type: Option<String>,
    read_mode: Option<String>,
}

impl ArtifactBuilder {
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = Some(extension.to_string());
        self
    }

    pub fn page(mut self, page: &str) -> Self {
        self.page = Some(page.to_string());
        self
    }

    pub fn prop(mut self, key: &str, value: Value) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }

    pub fn source_chain(mut self, chain: &str) -> Self {
        self.source_chain = Some(chain.to_string());
        self
    }

    pub fn source_path(mut self, path: &str) -> Self {
        self.source_path = Some(path.to_string());
        self
    }

    pub fn source_type(mut self, extension: &str) -> Self {
        self.source_type = Some(extension.to_string());
        self
    }

    pub fn read_mode(mut self, mode: &str) -> Self {
        self.read_mode = Some(mode.to_string());
        self
    }

    pub fn build(self) -> Artifact {
        let mut artifact = Artifact {
            base_url: self.base_url.unwrap_or_else(|| "/".to_string()),
            path: self.path,
            extension: self.extension.unwrap_or_default(),
            page: self.page,
            name: None,
            url: None,
            segments: None,
            properties: self.properties,
            source_chain: self.source_chain,
            source_path: self.source_path,
            source_type: self.source_type,
            read_mode: self.read_mode,
        };
        artifact.rederive();
        artifact
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PropChange {
    Set(Value),
    Remove,
}

/// Override set for [`Artifact::with_changes`].
///
/// Property patches apply in the order they were added, so a later `set` of
/// the same key wins over an earlier `remove` and vice versa.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    base_url: Option<String>,
    path: Option<Option<String>>,
    extension: Option<String>,
    page: Option<Option<String>>,
    props: Vec<(String, PropChange)>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(Some(path.to_string()));
        self
    }

    /// Unset `path` — the clone loses its derived `name`/`url`/`segments`.
    pub fn clear_path(mut self) -> Self {
        self.path = Some(None);
        self
    }

    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = Some(extension.to_string());
        self
    }

    pub fn page(mut self, page: &str) -> Self {
        self.page = Some(Some(page.to_string()));
        self
    }

    pub fn clear_page(mut self) -> Self {
        self.page = Some(None);
        self
    }

    /// Set a user property on the clone.
    pub fn set(mut self, key: &str, value: Value) -> Self {
        self.props.push((key.to_string(), PropChange::Set(value)));
        self
    }

    /// Delete a user property from the clone.
    pub fn remove(mut self, key: &str) -> Self {
        self.props.push((key.to_string(), PropChange::Remove));
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
