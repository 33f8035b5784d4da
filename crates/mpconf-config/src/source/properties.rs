//! `.properties` file source.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use mpconf_core::PropertiesDocument;

use super::file::FileCache;
use super::{ConfigSource, DEFAULT_ORDINAL};

/// Parses `.properties` content into an ordered key/value map.
///
/// When `profile` is set every key is stored as `%profile.key`, and keys that
/// already carry a `%` prefix are dropped: a profile-scoped file cannot scope
/// its entries to another profile. Later assignments of a key replace
/// earlier ones.
///
/// # Example
///
/// ```
/// use mpconf_config::parse_properties;
///
/// let entries = parse_properties("a=1\n%prod.b=2\n", Some("dev"));
/// assert_eq!(entries.get("%dev.a").map(String::as_str), Some("1"));
/// assert!(entries.get("%dev.%prod.b").is_none());
/// assert_eq!(entries.len(), 1);
/// ```
#[must_use]
pub fn parse_properties(content: &str, profile: Option<&str>) -> IndexMap<String, String> {
    let document = PropertiesDocument::parse("", content);
    let mut entries = IndexMap::with_capacity(document.properties().len());
    for property in document.properties() {
        let key = property.key();
        if key.is_empty() {
            continue;
        }
        let value = property.value_text().unwrap_or_default().to_string();
        match profile {
            Some(profile) => {
                if key.starts_with('%') {
                    tracing::debug!(key, profile, "Dropping profiled key from profile-scoped source");
                    continue;
                }
                entries.insert(format!("%{profile}.{key}"), value);
            }
            None => {
                entries.insert(key.to_string(), value);
            }
        }
    }
    entries
}

/// Source backed by a `.properties` file.
///
/// # Example
///
/// ```no_run
/// use mpconf_config::{ConfigSource, PropertiesConfigSource};
///
/// let source = PropertiesConfigSource::new("src/main/resources/application.properties", 250);
/// let port = source.get_property_as_int("quarkus.http.port");
/// ```
#[derive(Debug)]
pub struct PropertiesConfigSource {
    id: String,
    profile: Option<String>,
    ordinal: i32,
    cache: FileCache<IndexMap<String, String>>,
}

impl PropertiesConfigSource {
    /// Source for a file whose keys apply to every profile.
    pub fn new(path: impl AsRef<Path>, ordinal: i32) -> Self {
        let path: PathBuf = path.as_ref().to_path_buf();
        Self {
            id: path.display().to_string(),
            profile: None,
            ordinal,
            cache: FileCache::new(path),
        }
    }

    /// Source for a file whose keys all belong to `profile`.
    pub fn with_profile(path: impl AsRef<Path>, profile: impl Into<String>, ordinal: i32) -> Self {
        Self {
            profile: Some(profile.into()),
            ..Self::new(path, ordinal)
        }
    }

    /// Source with the default ordinal.
    pub fn with_default_ordinal(path: impl AsRef<Path>) -> Self {
        Self::new(path, DEFAULT_ORDINAL)
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.cache.path()
    }

    /// Forces a reload on next access.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    fn entries(&self) -> std::sync::Arc<IndexMap<String, String>> {
        let profile = self.profile.as_deref();
        self.cache
            .get(|content| Ok(parse_properties(content, profile)))
    }
}

impl ConfigSource for PropertiesConfigSource {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn get_property(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn get_all_keys(&self) -> BTreeSet<String> {
        self.entries().keys().cloned().collect()
    }

    fn default_ordinal(&self) -> i32 {
        self.ordinal
    }

    fn get_ordinal(&self) -> i32 {
        let key = match &self.profile {
            Some(profile) => format!("%{profile}.{}", super::CONFIG_ORDINAL_KEY),
            None => super::CONFIG_ORDINAL_KEY.to_string(),
        };
        self.get_property_as_int(&key)
            .and_then(|v| i32::try_from(v).ok())
            .unwrap_or(self.ordinal)
    }

    fn get_profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }
}
