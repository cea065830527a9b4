//! Generic alias-resolving registry.
//!
//! Every lookup table in the pipeline — resource types, transformers,
//! generators, handlers, modes, template engines — is a [`Registry`]: a keyed
//! map whose entries are either concrete values or aliases pointing at another
//! key. Aliases let configuration say "`.markdown` is `.md`" once instead of
//! duplicating a whole type definition.
//!
//! ## Resolution
//!
//! [`Registry::resolve_key`] follows alias hops transitively until it lands on
//! a concrete value, tracking the keys visited in that call so a cycle fails
//! with [`RegistryError::CircularAlias`] instead of looping. Resolution always
//! terminates: concrete key, detected cycle, or "unresolved".
//!
//! ## Normalization
//!
//! A registry built with [`Registry::case_insensitive`] folds every key to
//! lowercase — on insert, on direct access, on each alias hop, and on the
//! fallback's substitute key — so `"Foo"`, `"foo"`, and `"FOO"` are the same
//! entry. Extension-keyed registries use this; plugin-name registries stay
//! case-sensitive.
//!
//! ## Fallback
//!
//! An optional fallback function maps a missing key to a substitute key before
//! resolution gives up. The type registry uses this to route unknown
//! extensions to the `"*"` default type.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Circular alias chain detected while resolving key '{0}'")]
    CircularAlias(String),
    #[error("{0}")]
    NotDefined(String),
}

/// A registry slot: a concrete value or a redirect to another key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry<V> {
    Value(V),
    Alias(String),
}

impl<V> Entry<V> {
    pub fn is_alias(&self) -> bool {
        matches!(self, Entry::Alias(_))
    }
}

type Fallback = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Keyed registry with transitive alias resolution.
///
/// The "not defined" message template is fixed at construction so each
/// registry can fail with domain wording (`"Transformer '{key}' is not
/// defined."` rather than a generic message). `{key}` in the template is
/// replaced with the requested key.
pub struct Registry<V> {
    entries: BTreeMap<String, Entry<V>>,
    case_sensitive: bool,
    missing_message: String,
    fallback: Option<Fallback>,
}

pub const DEFAULT_MISSING_MESSAGE: &str = "Key '{key}' could not be resolved.";

impl<V> Registry<V> {
    /// New empty case-sensitive registry with the default message template.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            case_sensitive: true,
            missing_message: DEFAULT_MISSING_MESSAGE.to_string(),
            fallback: None,
        }
    }

    /// New empty registry that lowercases every key it touches.
    pub fn case_insensitive() -> Self {
        Self {
            case_sensitive: false,
            ..Self::new()
        }
    }

    /// Replace the "not defined" message template (`{key}` is substituted).
    pub fn with_missing_message(mut self, template: &str) -> Self {
        self.missing_message = template.to_string();
        self
    }

    /// Install a fallback invoked when the requested key is absent. The
    /// substitute key it returns is normalized and resolved as usual.
    pub fn with_fallback(
        mut self,
        fallback: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    fn normalize(&self, key: &str) -> String {
        if self.case_sensitive {
            key.to_string()
        } else {
            key.to_lowercase()
        }
    }

    /// Store a concrete value under the normalized key. Chains.
    pub fn set(&mut self, key: &str, value: V) -> &mut Self {
        self.set_entry(key, Entry::Value(value))
    }

    /// Store an alias: lookups of `key` redirect to `target`. Chains.
    pub fn set_alias(&mut self, key: &str, target: &str) -> &mut Self {
        self.set_entry(key, Entry::Alias(target.to_string()))
    }

    /// Store a pre-built entry under the normalized key. Chains.
    pub fn set_entry(&mut self, key: &str, entry: Entry<V>) -> &mut Self {
        let key = self.normalize(key);
        self.entries.insert(key, entry);
        self
    }

    /// Direct access to the entry under the normalized key. No alias chasing.
    pub fn get(&self, key: &str) -> Option<&Entry<V>> {
        self.entries.get(&self.normalize(key))
    }

    /// Whether an entry (value or alias) exists under the normalized key.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&self.normalize(key))
    }

    /// Remove and return the entry under the normalized key.
    pub fn remove(&mut self, key: &str) -> Option<Entry<V>> {
        let key = self.normalize(key);
        self.entries.remove(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a key to the concrete (non-alias) key it ultimately names.
    ///
    /// Returns `Ok(None)` when nothing is found — after trying the fallback
    /// substitute, if one is installed. A cycle among alias entries fails
    /// with [`RegistryError::CircularAlias`] naming the key originally
    /// requested, not the key where the cycle closed.
    pub fn resolve_key(&self, key: &str) -> Result<Option<String>, RegistryError> {
        let mut current = self.normalize(key);

        if !self.entries.contains_key(&current) {
            match &self.fallback {
                Some(fallback) => match fallback(&current) {
                    Some(substitute) => current = self.normalize(&substitute),
                    None => return Ok(None),
                },
                None => return Ok(None),
            }
        }

        let mut visited: HashSet<String> = HashSet::new();
        loop {
            match self.entries.get(&current) {
                None => return Ok(None),
                Some(Entry::Value(_)) => return Ok(Some(current)),
                Some(Entry::Alias(target)) => {
                    if !visited.insert(current) {
                        return Err(RegistryError::CircularAlias(key.to_string()));
                    }
                    current = self.normalize(target);
                }
            }
        }
    }

    /// Like [`resolve_key`](Self::resolve_key), but "unresolved" becomes a
    /// [`RegistryError::NotDefined`] built from this registry's template.
    pub fn resolve_or_fail(&self, key: &str) -> Result<String, RegistryError> {
        self.resolve_key(key)?
            .ok_or_else(|| RegistryError::NotDefined(self.missing_message.replace("{key}", key)))
    }

    /// Resolve and return the concrete value for a key.
    pub fn lookup(&self, key: &str) -> Result<&V, RegistryError> {
        self.lookup_entry(key).map(|(_, value)| value)
    }

    /// Resolve and return the concrete key a lookup lands on together with
    /// its value. Callers that report which implementation ran want the
    /// resolved key, not the (possibly alias) key they were handed.
    pub fn lookup_entry(&self, key: &str) -> Result<(String, &V), RegistryError> {
        let resolved = self.resolve_or_fail(key)?;
        match self.entries.get(&resolved) {
            Some(Entry::Value(value)) => Ok((resolved, value)),
            // resolve_or_fail only returns keys that hold concrete values
            _ => Err(RegistryError::NotDefined(
                self.missing_message.replace("{key}", key),
            )),
        }
    }

    /// Resolve and return the value, or `None` when the key is unresolved.
    /// A circular alias chain is still an error: a cycle is broken
    /// configuration, not a missing key.
    pub fn lookup_quiet(&self, key: &str) -> Result<Option<&V>, RegistryError> {
        match self.resolve_key(key)? {
            Some(resolved) => match self.entries.get(&resolved) {
                Some(Entry::Value(value)) => Ok(Some(value)),
                _ => Ok(None),
            },
            None => Ok(None),
        }
    }
}

impl<V> Default for Registry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<(String, Entry<V>)> for Registry<V> {
    fn from_iter<I: IntoIterator<Item = (String, Entry<V>)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (key, entry) in iter {
            registry.set_entry(&key, entry);
        }
        registry
    }
}

impl<V> fmt::Debug for Registry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .field("case_sensitive", &self.case_sensitive)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_roundtrip() {
        let mut reg: Registry<u32> = Registry::new();
        reg.set("answer", 42);
        assert!(matches!(reg.get("answer"), Some(Entry::Value(42))));
        assert!(reg.contains("answer"));
        assert!(!reg.contains("question"));
    }

    #[test]
    fn set_chains() {
        let mut reg: Registry<u32> = Registry::new();
        reg.set("a", 1).set("b", 2).set_alias("c", "a");
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn get_does_not_chase_aliases() {
        let mut reg: Registry<u32> = Registry::new();
        reg.set("a", 1).set_alias("b", "a");
        assert!(matches!(reg.get("b"), Some(Entry::Alias(t)) if t == "a"));
        assert!(reg.get("b").unwrap().is_alias());
        assert!(!reg.get("a").unwrap().is_alias());
    }

    #[test]
    fn remove_deletes_entry() {
        let mut reg: Registry<u32> = Registry::new();
        reg.set("a", 1);
        assert!(reg.remove("a").is_some());
        assert!(reg.is_empty());
        assert!(reg.remove("a").is_none());
    }

    #[test]
    fn resolve_concrete_key_is_itself() {
        let mut reg: Registry<u32> = Registry::new();
        reg.set("a", 1);
        assert_eq!(reg.resolve_key("a").unwrap(), Some("a".to_string()));
    }

    #[test]
    fn resolve_follows_alias_chain() {
        // A=42, b=alias-of(A), c=alias-of(b): resolving "c" lands on "A"
        let mut reg: Registry<u32> = Registry::new();
        reg.set("A", 42).set_alias("b", "A").set_alias("c", "b");
        assert_eq!(reg.resolve_key("c").unwrap(), Some("A".to_string()));
        assert_eq!(reg.lookup("c").unwrap(), &42);
    }

    #[test]
    fn resolve_missing_is_unresolved() {
        let reg: Registry<u32> = Registry::new();
        assert_eq!(reg.resolve_key("nope").unwrap(), None);
    }

    #[test]
    fn alias_to_missing_key_is_unresolved() {
        let mut reg: Registry<u32> = Registry::new();
        reg.set_alias("a", "gone");
        assert_eq!(reg.resolve_key("a").unwrap(), None);
    }

    #[test]
    fn alias_to_empty_string_key() {
        let mut reg: Registry<u32> = Registry::new();
        reg.set("", 7).set_alias("blank", "");
        assert_eq!(reg.resolve_key("blank").unwrap(), Some(String::new()));
        assert_eq!(reg.lookup("blank").unwrap(), &7);
    }

    #[test]
    fn two_element_cycle_errors_with_requested_key() {
        let mut reg: Registry<u32> = Registry::new();
        reg.set_alias("a", "b").set_alias("b", "a");
        let err = reg.resolve_key("a").unwrap_err();
        assert_eq!(err, RegistryError::CircularAlias("a".to_string()));
    }

    #[test]
    fn cycle_entered_mid_chain_names_original_key() {
        // d points into the a<->b cycle; the error must still name "d"
        let mut reg: Registry<u32> = Registry::new();
        reg.set_alias("a", "b").set_alias("b", "a").set_alias("d", "a");
        let err = reg.resolve_key("d").unwrap_err();
        assert_eq!(err, RegistryError::CircularAlias("d".to_string()));
    }

    #[test]
    fn self_alias_is_a_cycle() {
        let mut reg: Registry<u32> = Registry::new();
        reg.set_alias("me", "me");
        assert!(matches!(
            reg.resolve_key("me"),
            Err(RegistryError::CircularAlias(_))
        ));
    }

    #[test]
    fn case_insensitive_normalizes_every_operation() {
        let mut reg: Registry<u32> = Registry::case_insensitive();
        reg.set("Foo", 1);
        assert_eq!(reg.resolve_key("Foo").unwrap(), Some("foo".to_string()));
        assert_eq!(reg.resolve_key("foo").unwrap(), Some("foo".to_string()));
        assert_eq!(reg.resolve_key("FOO").unwrap(), Some("foo".to_string()));
        assert!(reg.contains("fOo"));
        assert!(reg.remove("FOO").is_some());
        assert!(reg.is_empty());
    }

    #[test]
    fn case_insensitive_normalizes_alias_hops() {
        let mut reg: Registry<u32> = Registry::case_insensitive();
        reg.set("target", 9).set_alias("Short", "TARGET");
        assert_eq!(reg.lookup("SHORT").unwrap(), &9);
    }

    #[test]
    fn fallback_substitutes_missing_keys() {
        let mut reg: Registry<u32> = Registry::new().with_fallback(|_| Some("*".to_string()));
        reg.set("*", 0).set("known", 5);
        assert_eq!(reg.lookup("known").unwrap(), &5);
        assert_eq!(reg.lookup("anything-else").unwrap(), &0);
    }

    #[test]
    fn fallback_returning_none_stays_unresolved() {
        let reg: Registry<u32> = Registry::new().with_fallback(|_| None);
        assert_eq!(reg.resolve_key("missing").unwrap(), None);
    }

    #[test]
    fn fallback_substitute_may_be_an_alias() {
        let mut reg: Registry<u32> =
            Registry::new().with_fallback(|_| Some("default".to_string()));
        reg.set("real", 3).set_alias("default", "real");
        assert_eq!(reg.lookup("whatever").unwrap(), &3);
    }

    #[test]
    fn resolve_or_fail_uses_default_template() {
        let reg: Registry<u32> = Registry::new();
        let err = reg.resolve_or_fail("ghost").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Key 'ghost' could not be resolved."
        );
    }

    #[test]
    fn resolve_or_fail_uses_custom_template() {
        let reg: Registry<u32> =
            Registry::new().with_missing_message("Transformer '{key}' is not defined.");
        let err = reg.resolve_or_fail("minify").unwrap_err();
        assert_eq!(err.to_string(), "Transformer 'minify' is not defined.");
    }

    #[test]
    fn lookup_entry_reports_the_resolved_key() {
        let mut reg: Registry<u32> = Registry::new();
        reg.set("upper", 1).set_alias("uppercase", "upper");
        let (key, value) = reg.lookup_entry("uppercase").unwrap();
        assert_eq!(key, "upper");
        assert_eq!(value, &1);
        assert_eq!(reg.lookup_entry("upper").unwrap().0, "upper");
    }

    #[test]
    fn lookup_quiet_returns_none_for_missing() {
        let reg: Registry<u32> = Registry::new();
        assert_eq!(reg.lookup_quiet("missing").unwrap(), None);
    }

    #[test]
    fn lookup_quiet_still_errors_on_cycles() {
        let mut reg: Registry<u32> = Registry::new();
        reg.set_alias("a", "b").set_alias("b", "a");
        assert!(reg.lookup_quiet("a").is_err());
    }

    #[test]
    fn from_iterator_builds_registry() {
        let reg: Registry<u32> = vec![
            ("a".to_string(), Entry::Value(1)),
            ("b".to_string(), Entry::Alias("a".to_string())),
        ]
        .into_iter()
        .collect();
        assert_eq!(reg.lookup("b").unwrap(), &1);
    }

    #[test]
    fn overwriting_key_replaces_entry() {
        let mut reg: Registry<u32> = Registry::new();
        reg.set("a", 1);
        reg.set_alias("a", "b");
        reg.set("b", 2);
        assert_eq!(reg.lookup("a").unwrap(), &2);
    }
}
