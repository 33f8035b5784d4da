//! In-memory sources: environment variables and plain maps.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use super::{ConfigSource, ENV_ORDINAL, SYSTEM_PROPERTIES_ORDINAL};

/// Environment variables, captured when the source is created.
///
/// Lookups follow the MicroProfile mapping: the exact key, then the key with
/// every non-alphanumeric character replaced by `_`, then that upper-cased.
/// `quarkus.http.port` therefore also finds `QUARKUS_HTTP_PORT`.
#[derive(Debug, Clone)]
pub struct EnvConfigSource {
    vars: IndexMap<String, String>,
    ordinal: i32,
}

impl EnvConfigSource {
    /// Captures the current process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Uses the given variables.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ordinal: ENV_ORDINAL,
        }
    }
}

fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

impl ConfigSource for EnvConfigSource {
    fn source_id(&self) -> &str {
        "env"
    }

    fn get_property(&self, key: &str) -> Option<String> {
        if let Some(value) = self.vars.get(key) {
            return Some(value.clone());
        }
        let sanitized = sanitize(key);
        self.vars
            .get(&sanitized)
            .or_else(|| self.vars.get(&sanitized.to_uppercase()))
            .cloned()
    }

    fn get_all_keys(&self) -> BTreeSet<String> {
        self.vars.keys().cloned().collect()
    }

    fn default_ordinal(&self) -> i32 {
        self.ordinal
    }

    fn get_profile(&self) -> Option<&str> {
        None
    }
}

/// Source over an in-memory map (system properties, tests, editors' unsaved
/// buffers).
#[derive(Debug, Clone)]
pub struct MapConfigSource {
    id: String,
    ordinal: i32,
    profile: Option<String>,
    entries: IndexMap<String, String>,
}

impl MapConfigSource {
    /// Creates a source with the given identifier and ordinal.
    pub fn new<I, K, V>(id: impl Into<String>, ordinal: i32, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            id: id.into(),
            ordinal,
            profile: None,
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// System properties source (`-Dkey=value`).
    pub fn system_properties<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::new("system-properties", SYSTEM_PROPERTIES_ORDINAL, entries)
    }

    /// Tags the source with a profile. Keys are used as given.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }
}

impl ConfigSource for MapConfigSource {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn get_property(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn get_all_keys(&self) -> BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }

    fn default_ordinal(&self) -> i32 {
        self.ordinal
    }

    fn get_profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_name_mapping() {
        let source = EnvConfigSource::from_vars([
            ("QUARKUS_HTTP_PORT", "9000"),
            ("my_app_name", "demo"),
            ("exact.key", "exact"),
        ]);
        assert_eq!(source.get_property("quarkus.http.port").as_deref(), Some("9000"));
        assert_eq!(source.get_property("my.app-name").as_deref(), Some("demo"));
        assert_eq!(source.get_property("exact.key").as_deref(), Some("exact"));
        assert_eq!(source.get_property("missing"), None);
        assert_eq!(source.get_ordinal(), ENV_ORDINAL);
    }

    #[test]
    fn test_system_properties() {
        let source = MapConfigSource::system_properties([("a", "1"), ("config_ordinal", "450")]);
        assert_eq!(source.source_id(), "system-properties");
        assert_eq!(source.default_ordinal(), SYSTEM_PROPERTIES_ORDINAL);
        assert_eq!(source.get_ordinal(), 450);
        assert_eq!(source.get_all_keys().len(), 2);
    }

    #[test]
    fn test_map_source_profile() {
        let source = MapConfigSource::new("buffer", 100, [("%dev.a", "1")]).with_profile("dev");
        assert_eq!(source.get_profile(), Some("dev"));
        assert_eq!(source.get_property("%dev.a").as_deref(), Some("1"));
    }
}
