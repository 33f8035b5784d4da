//! YAML file source.
//!
//! The document is kept as a tree. A lookup walks the key's dot-separated
//! segments through nested mappings; a mapping key may itself contain dots
//! (`quarkus: { http.port: 8080 }`), and a `~` (null) key holds the value of
//! the enclosing path (`cors: { ~: true, origins: "*" }` defines both `cors`
//! and `cors.origins`).

use std::collections::BTreeSet;
use std::path::Path;

use serde_yaml::{Mapping, Value};

use super::file::FileCache;
use super::{ConfigSource, YAML_ORDINAL};
use crate::SourceError;

/// Source backed by an `application.yaml` file.
#[derive(Debug)]
pub struct YamlConfigSource {
    id: String,
    ordinal: i32,
    cache: FileCache<Value>,
}

impl YamlConfigSource {
    /// Source with the YAML default ordinal.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_ordinal(path, YAML_ORDINAL)
    }

    /// Source with an explicit default ordinal.
    pub fn with_ordinal(path: impl AsRef<Path>, ordinal: i32) -> Self {
        let path = path.as_ref();
        Self {
            id: path.display().to_string(),
            ordinal,
            cache: FileCache::new(path),
        }
    }

    /// Forces a reload on next access.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    fn root(&self) -> std::sync::Arc<Value> {
        self.cache.get(parse_yaml)
    }
}

fn parse_yaml(content: &str) -> Result<Value, SourceError> {
    if content.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_yaml::from_str(content)?)
}

impl ConfigSource for YamlConfigSource {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn get_property(&self, key: &str) -> Option<String> {
        let root = self.root();
        let segments = split_segments(key);
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        lookup(&root, &segments).and_then(value_to_string)
    }

    fn get_all_keys(&self) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        if let Value::Mapping(map) = self.root().as_ref() {
            collect_keys(map, "", &mut keys);
        }
        keys
    }

    fn default_ordinal(&self) -> i32 {
        self.ordinal
    }

    fn get_profile(&self) -> Option<&str> {
        None
    }
}

/// Splits a property key on dots that are not inside double quotes.
fn split_segments(key: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in key.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            '.' if !quoted => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments
}

fn unquote(segment: &str) -> &str {
    segment
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(segment)
}

fn key_to_string(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lookup<'a>(node: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    if segments.is_empty() {
        return Some(node);
    }
    let Value::Mapping(map) = node else {
        return None;
    };
    // Longest candidate first so `a: { b.c: 1 }` wins over deeper nesting.
    for take in (1..=segments.len()).rev() {
        let candidate = segments[..take].join(".");
        let bare = unquote(&candidate);
        let child = map.iter().find_map(|(k, v)| {
            key_to_string(k)
                .filter(|k| k == &candidate || k == bare)
                .map(|_| v)
        });
        if let Some(found) = child.and_then(|child| lookup(child, &segments[take..])) {
            return Some(found);
        }
    }
    None
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Sequence(items) => Some(
            items
                .iter()
                .filter_map(value_to_string)
                .map(|item| item.replace(',', "\\,"))
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Mapping(map) => map.get(Value::Null).and_then(value_to_string),
        Value::Tagged(tagged) => value_to_string(&tagged.value),
    }
}

fn collect_keys(map: &Mapping, prefix: &str, keys: &mut BTreeSet<String>) {
    for (key, value) in map {
        if key.is_null() {
            if !prefix.is_empty() && value_to_string(value).is_some() {
                keys.insert(prefix.to_string());
            }
            continue;
        }
        let Some(segment) = key_to_string(key) else {
            continue;
        };
        let path = if prefix.is_empty() {
            segment
        } else {
            format!("{prefix}.{segment}")
        };
        match value {
            Value::Mapping(child) => collect_keys(child, &path, keys),
            _ => {
                if value_to_string(value).is_some() {
                    keys.insert(path);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn source_with(content: &str) -> (tempfile::TempDir, YamlConfigSource) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("application.yaml");
        fs::write(&path, content).unwrap();
        let source = YamlConfigSource::new(&path);
        (dir, source)
    }

    #[test]
    fn test_nested_lookup() {
        let (_dir, source) = source_with("quarkus:\n  http:\n    port: 8080\n");
        assert_eq!(source.get_property("quarkus.http.port").as_deref(), Some("8080"));
        assert_eq!(source.get_property("quarkus.http"), None);
        assert_eq!(source.get_ordinal(), YAML_ORDINAL);
    }

    #[test]
    fn test_dotted_mapping_keys() {
        let (_dir, source) = source_with("quarkus:\n  http.port: 9090\n");
        assert_eq!(source.get_property("quarkus.http.port").as_deref(), Some("9090"));
    }

    #[test]
    fn test_null_key_is_parent_value() {
        let (_dir, source) = source_with("quarkus:\n  http:\n    cors:\n      ~: true\n      origins: \"*\"\n");
        assert_eq!(source.get_property("quarkus.http.cors").as_deref(), Some("true"));
        assert_eq!(source.get_property("quarkus.http.cors.origins").as_deref(), Some("*"));
        let keys = source.get_all_keys();
        assert!(keys.contains("quarkus.http.cors"));
        assert!(keys.contains("quarkus.http.cors.origins"));
    }

    #[test]
    fn test_profiles_and_sequences() {
        let (_dir, source) = source_with(
            "\"%dev\":\n  greeting:\n    message: hello dev\nlist:\n  - a\n  - b,c\n",
        );
        assert_eq!(source.get_property("%dev.greeting.message").as_deref(), Some("hello dev"));
        assert_eq!(source.get_property("list").as_deref(), Some("a,b\\,c"));
    }

    #[test]
    fn test_quoted_segments() {
        let (_dir, source) = source_with(
            "quarkus:\n  log:\n    category:\n      \"io.quarkus\":\n        level: DEBUG\n",
        );
        assert_eq!(
            source.get_property("quarkus.log.category.\"io.quarkus\".level").as_deref(),
            Some("DEBUG")
        );
    }

    #[test]
    fn test_malformed_yaml_is_empty() {
        let (_dir, source) = source_with("a: [unclosed\n");
        assert!(source.get_all_keys().is_empty());
        assert_eq!(source.get_property("a"), None);
    }

    #[test]
    fn test_config_ordinal_in_yaml() {
        let (_dir, source) = source_with("config_ordinal: 300\n");
        assert_eq!(source.get_ordinal(), 300);
    }

    #[test]
    fn test_split_segments() {
        assert_eq!(split_segments("a.\"b.c\".d"), vec!["a", "\"b.c\"", "d"]);
    }
}
