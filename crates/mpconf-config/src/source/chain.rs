//! Ordered collection of config sources.

use std::collections::BTreeSet;
use std::sync::Arc;

use mpconf_core::split_profile;

use super::ConfigSource;

/// Value found by [`ConfigSourceChain::lookup`], with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyLookup {
    /// Key that matched, profile included.
    pub key: String,
    /// Value.
    pub value: String,
    /// Identifier of the source that supplied the value.
    pub source_id: String,
    /// Ordinal of that source.
    pub ordinal: i32,
}

/// One profile variant of a bare property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileVariant {
    /// Profile, `None` for the unprofiled key.
    pub profile: Option<String>,
    /// Key as stored.
    pub key: String,
    /// Value.
    pub value: String,
    /// Identifier of the source that supplied the value.
    pub source_id: String,
}

/// Sources in declaration order.
///
/// A lookup of `%profile.key` first tries that exact key in every source,
/// in declaration order, then falls back to the bare `key` in the same order.
/// The first hit wins; ordinals are reported but do not reorder the chain.
///
/// # Example
///
/// ```
/// use mpconf_config::{ConfigSourceChain, MapConfigSource};
///
/// let chain = ConfigSourceChain::new()
///     .with_source(MapConfigSource::new("a", 250, [("greeting", "hello")]))
///     .with_source(MapConfigSource::new("b", 100, [("%dev.greeting", "hello dev")]));
///
/// assert_eq!(chain.get_property("%dev.greeting").as_deref(), Some("hello dev"));
/// assert_eq!(chain.get_property("%prod.greeting").as_deref(), Some("hello"));
/// assert_eq!(chain.get_property("greeting").as_deref(), Some("hello"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigSourceChain {
    sources: Vec<Arc<dyn ConfigSource>>,
}

impl ConfigSourceChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source.
    #[must_use]
    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.push(Arc::new(source));
        self
    }

    /// Appends a shared source.
    pub fn push(&mut self, source: Arc<dyn ConfigSource>) {
        self.sources.push(source);
    }

    /// Sources in declaration order.
    #[must_use]
    pub fn sources(&self) -> &[Arc<dyn ConfigSource>] {
        &self.sources
    }

    /// Number of sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the chain has no sources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Effective value of a key.
    #[must_use]
    pub fn get_property(&self, key: &str) -> Option<String> {
        self.lookup(key).map(|found| found.value)
    }

    /// Effective value of a key parsed as an integer.
    #[must_use]
    pub fn get_property_as_int(&self, key: &str) -> Option<i64> {
        self.get_property(key).and_then(|v| v.trim().parse().ok())
    }

    /// Effective value of a key with the source that supplied it.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<PropertyLookup> {
        let exact = self.first_hit(key);
        if exact.is_some() {
            return exact;
        }
        match split_profile(key) {
            (Some(_), bare) if !bare.is_empty() => self.first_hit(bare),
            _ => None,
        }
    }

    fn first_hit(&self, key: &str) -> Option<PropertyLookup> {
        self.sources.iter().find_map(|source| {
            source.get_property(key).map(|value| PropertyLookup {
                key: key.to_string(),
                value,
                source_id: source.source_id().to_string(),
                ordinal: source.get_ordinal(),
            })
        })
    }

    /// Union of every source's keys.
    #[must_use]
    pub fn get_all_keys(&self) -> BTreeSet<String> {
        self.sources
            .iter()
            .flat_map(|source| source.get_all_keys())
            .collect()
    }

    /// Every profile variant of a bare property name, each with the value
    /// the chain resolves for that exact key.
    ///
    /// Variants are ordered unprofiled first, then by profile name.
    #[must_use]
    pub fn property_variants(&self, name: &str) -> Vec<ProfileVariant> {
        let mut variants: Vec<ProfileVariant> = self
            .get_all_keys()
            .into_iter()
            .filter(|key| split_profile(key).1 == name)
            .filter_map(|key| {
                let found = self.first_hit(&key)?;
                Some(ProfileVariant {
                    profile: split_profile(&key).0.map(str::to_string),
                    key,
                    value: found.value,
                    source_id: found.source_id,
                })
            })
            .collect();
        variants.sort_by(|a, b| a.profile.cmp(&b.profile));
        variants
    }
}
