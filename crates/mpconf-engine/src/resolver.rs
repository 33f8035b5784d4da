//! Resolution of `${...}` expressions.
//!
//! A referenced name is looked up, in order, in the document itself
//! (recursively resolving the referenced property's own value), in the
//! attached config sources, in the metadata default values, and finally in
//! the expression's inline `${name:default}` default.
//!
//! Values found outside the document are interpolated the same way. A
//! reference that comes back to a key already being resolved, through config
//! sources or metadata defaults, leaves the whole value unresolved.
//!
//! Nothing resolves in a document whose graph has a cycle, even expressions
//! that are not part of the cycle.

use mpconf_config::ConfigSourceChain;
use mpconf_core::{
    scan_expressions, split_profile, MetadataSnapshot, PropertiesDocument, Property,
    PropertyExpression,
};
use serde::Serialize;

use crate::graph::PropertyGraph;

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ValueOrigin {
    /// A property of the document, by index.
    Document {
        /// Property index.
        index: usize,
    },
    /// A config source.
    Source {
        /// Source identifier.
        source_id: String,
        /// Source ordinal.
        ordinal: i32,
    },
    /// The metadata default value.
    MetadataDefault,
}

/// One profile variant of a property with its resolved value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVariant {
    /// Profile, `None` for the unprofiled key.
    pub profile: Option<String>,
    /// Key as written.
    pub key: String,
    /// Raw value.
    pub raw: String,
    /// Resolved value, `None` when unresolved.
    pub value: Option<String>,
    /// Where the raw value was found.
    pub origin: ValueOrigin,
}

/// Resolves expressions of one document.
///
/// The graph must be the one built from the same document.
///
/// # Example
///
/// ```
/// use mpconf_core::{MetadataSnapshot, PropertiesDocument};
/// use mpconf_engine::{PropertyGraph, PropertyResolver};
///
/// let doc = PropertiesDocument::parse("a.properties", "a=${b}\nb=${c}\nc=val\n");
/// let graph = PropertyGraph::build(&doc);
/// let metadata = MetadataSnapshot::default();
/// let resolver = PropertyResolver::new(&doc, &graph, &metadata);
///
/// assert_eq!(resolver.resolve("a").as_deref(), Some("val"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PropertyResolver<'a> {
    document: &'a PropertiesDocument,
    graph: &'a PropertyGraph,
    metadata: &'a MetadataSnapshot,
    sources: Option<&'a ConfigSourceChain>,
}

impl<'a> PropertyResolver<'a> {
    /// Creates a resolver over a document, its graph and the project metadata.
    #[must_use]
    pub const fn new(
        document: &'a PropertiesDocument,
        graph: &'a PropertyGraph,
        metadata: &'a MetadataSnapshot,
    ) -> Self {
        Self {
            document,
            graph,
            metadata,
            sources: None,
        }
    }

    /// Also looks references up in config sources.
    #[must_use]
    pub fn with_sources(mut self, sources: &'a ConfigSourceChain) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Resolves one expression found in the document.
    ///
    /// The profile of the property containing the expression is used for
    /// config-source lookups.
    #[must_use]
    pub fn resolve_expression(&self, expression: &PropertyExpression) -> Option<String> {
        let profile = self
            .document
            .properties()
            .iter()
            .find(|p| p.expressions().contains(expression))
            .and_then(Property::profile);
        self.resolve_reference(expression, profile, &mut Walk::default())
    }

    /// Fully resolved value of a property, `None` if any expression in it
    /// cannot be resolved or the property has no value.
    #[must_use]
    pub fn resolve_property(&self, property: &Property) -> Option<String> {
        self.interpolate_property(property, &mut Walk::default())
    }

    /// Resolves the value of `key` (profile included): from the document if
    /// it assigns the key, else from the config sources, else from the
    /// metadata default.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<String> {
        if let Some(property) = self.document.find_by_key(key) {
            return self.resolve_property(property);
        }
        self.interpolate_external(key, &mut Walk::default())
    }

    /// Interpolates every `${...}` of `text`.
    ///
    /// Text without expressions is returned unchanged, even when the graph
    /// is cyclic.
    #[must_use]
    pub fn resolve_value(&self, text: &str, profile: Option<&str>) -> Option<String> {
        self.interpolate(text, profile, &mut Walk::default())
    }

    fn interpolate(&self, text: &str, profile: Option<&str>, walk: &mut Walk) -> Option<String> {
        let expressions = scan_expressions(text, 0);
        if expressions.is_empty() {
            return Some(text.to_string());
        }
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for expression in &expressions {
            if !expression.is_closed() {
                return None;
            }
            let range = expression.range();
            out.push_str(&text[last..range.start]);
            out.push_str(&self.resolve_reference(expression, profile, walk)?);
            last = range.end;
        }
        out.push_str(&text[last..]);
        Some(out)
    }

    /// Every profile variant of a bare property name, from the document and
    /// from the config sources, each resolved independently.
    ///
    /// Document variants come first in document order; source variants the
    /// document does not assign follow.
    #[must_use]
    pub fn resolve_profiles(&self, name: &str) -> Vec<ResolvedVariant> {
        let mut variants: Vec<ResolvedVariant> = Vec::new();
        for property in self.document.find_by_name(name) {
            if variants.iter().any(|v| v.key == property.key()) {
                continue;
            }
            variants.push(ResolvedVariant {
                profile: property.profile().map(str::to_string),
                key: property.key().to_string(),
                raw: property.value_text().unwrap_or_default().to_string(),
                value: self.resolve_property(property),
                origin: ValueOrigin::Document {
                    index: property.index(),
                },
            });
        }

        if let Some(sources) = self.sources {
            for variant in sources.property_variants(name) {
                if variants.iter().any(|v| v.key == variant.key) {
                    continue;
                }
                let ordinal = sources
                    .lookup(&variant.key)
                    .map_or(0, |found| found.ordinal);
                variants.push(ResolvedVariant {
                    value: self.interpolate_keyed(
                        &variant.key,
                        &variant.value,
                        variant.profile.as_deref(),
                        &mut Walk::default(),
                    ),
                    profile: variant.profile,
                    key: variant.key,
                    raw: variant.value,
                    origin: ValueOrigin::Source {
                        source_id: variant.source_id,
                        ordinal,
                    },
                });
            }
        }
        variants
    }

    fn resolve_reference(
        &self,
        expression: &PropertyExpression,
        profile: Option<&str>,
        walk: &mut Walk,
    ) -> Option<String> {
        if !self.graph.is_acyclic() {
            return None;
        }
        let name = expression.referenced_name();
        let found = if name.is_empty() {
            None
        } else if let Some(property) = self.document.find_by_key(name) {
            self.interpolate_property(property, walk)
        } else {
            let key = match profile {
                Some(profile) if split_profile(name).0.is_none() => {
                    format!("%{profile}.{name}")
                }
                _ => name.to_string(),
            };
            self.interpolate_external(&key, walk)
        };
        if walk.cyclic {
            return None;
        }
        found.or_else(|| expression.default_value().map(str::to_string))
    }

    fn interpolate_property(&self, property: &Property, walk: &mut Walk) -> Option<String> {
        let text = property.value_text()?;
        self.interpolate_keyed(property.key(), text, property.profile(), walk)
    }

    fn interpolate_external(&self, key: &str, walk: &mut Walk) -> Option<String> {
        let (raw, _) = self.external_value(key)?;
        self.interpolate_keyed(key, &raw, split_profile(key).0, walk)
    }

    /// Interpolates the value of `key` unless `key` is already being
    /// resolved further up.
    fn interpolate_keyed(
        &self,
        key: &str,
        text: &str,
        profile: Option<&str>,
        walk: &mut Walk,
    ) -> Option<String> {
        if walk.visiting.iter().any(|visited| visited == key) {
            tracing::trace!(key, "Reference cycle outside the document");
            walk.cyclic = true;
            return None;
        }
        walk.visiting.push(key.to_string());
        let value = self.interpolate(text, profile, walk);
        walk.visiting.pop();
        value
    }

    /// Value of a key outside the document: config sources, then metadata
    /// default of the bare name.
    fn external_value(&self, key: &str) -> Option<(String, ValueOrigin)> {
        if let Some(found) = self.sources.and_then(|sources| sources.lookup(key)) {
            return Some((
                found.value,
                ValueOrigin::Source {
                    source_id: found.source_id,
                    ordinal: found.ordinal,
                },
            ));
        }
        let bare = split_profile(key).1;
        self.metadata
            .get(bare)
            .and_then(|item| item.default_value.clone())
            .map(|default| (default, ValueOrigin::MetadataDefault))
    }
}

/// Keys being resolved, outermost first.
#[derive(Debug, Default)]
struct Walk {
    visiting: Vec<String>,
    cyclic: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpconf_config::MapConfigSource;
    use mpconf_core::PropertyItem;

    struct Fixture {
        doc: PropertiesDocument,
        graph: PropertyGraph,
        metadata: MetadataSnapshot,
    }

    impl Fixture {
        fn new(text: &str) -> Self {
            Self::with_metadata(text, MetadataSnapshot::default())
        }

        fn with_metadata(text: &str, metadata: MetadataSnapshot) -> Self {
            let doc = PropertiesDocument::parse("application.properties", text);
            let graph = PropertyGraph::build(&doc);
            Self {
                doc,
                graph,
                metadata,
            }
        }

        fn resolver(&self) -> PropertyResolver<'_> {
            PropertyResolver::new(&self.doc, &self.graph, &self.metadata)
        }
    }

    #[test]
    fn test_transitive_resolution() {
        let f = Fixture::new("a=${b}\nb=${c}\nc=val\n");
        assert_eq!(f.resolver().resolve("a").as_deref(), Some("val"));
    }

    #[test]
    fn test_cycle_elsewhere_blocks_everything() {
        let f = Fixture::new("a=${b}\nb=${c}\nc=val\nx=${y}\ny=${x}\n");
        assert_eq!(f.resolver().resolve("a"), None);
        assert_eq!(f.resolver().resolve("c").as_deref(), Some("val"));
    }

    #[test]
    fn test_interpolation_in_text() {
        let f = Fixture::new("host=localhost\nport=8080\nurl=http://${host}:${port}/api\n");
        assert_eq!(
            f.resolver().resolve("url").as_deref(),
            Some("http://localhost:8080/api")
        );
    }

    #[test]
    fn test_metadata_default_fallback() {
        let metadata = MetadataSnapshot::new(
            vec![PropertyItem::new("quarkus.http.port").with_default("8080")],
            vec![],
        );
        let f = Fixture::with_metadata("port=${quarkus.http.port}\n", metadata);
        assert_eq!(f.resolver().resolve("port").as_deref(), Some("8080"));
    }

    #[test]
    fn test_inline_default() {
        let f = Fixture::new("a=${missing:fallback}\nb=${c:unused}\nc=real\n");
        assert_eq!(f.resolver().resolve("a").as_deref(), Some("fallback"));
        assert_eq!(f.resolver().resolve("b").as_deref(), Some("real"));
    }

    #[test]
    fn test_empty_inline_default() {
        let f = Fixture::new("a=x${missing:}y\n");
        assert_eq!(f.resolver().resolve("a").as_deref(), Some("xy"));
    }

    #[test]
    fn test_unknown_reference_is_unresolved() {
        let f = Fixture::new("a=${zzz}\n");
        assert_eq!(f.resolver().resolve("a"), None);
    }

    #[test]
    fn test_unterminated_expression_is_unresolved() {
        let f = Fixture::new("a=${b\nb=1\n");
        assert_eq!(f.resolver().resolve("a"), None);
    }

    #[test]
    fn test_resolve_expression_node() {
        let f = Fixture::new("a=prefix-${b}\nb=1\n");
        let expression = &f.doc.properties()[0].expressions()[0];
        assert_eq!(f.resolver().resolve_expression(expression).as_deref(), Some("1"));
    }

    #[test]
    fn test_config_sources_consulted_before_metadata() {
        let metadata = MetadataSnapshot::new(
            vec![PropertyItem::new("greeting.name").with_default("from metadata")],
            vec![],
        );
        let f = Fixture::with_metadata(
            "greeting=hello ${greeting.name}\n%dev.greeting=hi ${greeting.name}\n",
            metadata,
        );
        let chain = ConfigSourceChain::new().with_source(MapConfigSource::new(
            "env",
            300,
            [("%dev.greeting.name", "dev user")],
        ));
        let resolver = f.resolver().with_sources(&chain);

        assert_eq!(resolver.resolve("greeting").as_deref(), Some("hello from metadata"));
        assert_eq!(resolver.resolve("%dev.greeting").as_deref(), Some("hi dev user"));
    }

    #[test]
    fn test_source_values_are_interpolated() {
        let f = Fixture::new("a=${x}\n");
        let chain = ConfigSourceChain::new().with_source(MapConfigSource::new(
            "env",
            300,
            [("x", "${y}"), ("y", "v")],
        ));
        let resolver = f.resolver().with_sources(&chain);
        assert_eq!(resolver.resolve("a").as_deref(), Some("v"));
        assert_eq!(resolver.resolve("x").as_deref(), Some("v"));
    }

    #[test]
    fn test_metadata_default_is_interpolated() {
        let metadata = MetadataSnapshot::new(
            vec![PropertyItem::new("quarkus.http.host").with_default("${host.name}")],
            vec![],
        );
        let f = Fixture::with_metadata("host.name=example.org\nurl=http://${quarkus.http.host}\n", metadata);
        assert_eq!(f.resolver().resolve("url").as_deref(), Some("http://example.org"));
    }

    #[test]
    fn test_cycle_through_sources_is_unresolved() {
        let f = Fixture::new("a=${x}\nb=${y:fallback}\n");
        let chain = ConfigSourceChain::new().with_source(MapConfigSource::new(
            "env",
            300,
            [("x", "${y}"), ("y", "${x:default}")],
        ));
        let resolver = f.resolver().with_sources(&chain);
        assert_eq!(resolver.resolve("a"), None);
        assert_eq!(resolver.resolve("b"), None);
        assert_eq!(resolver.resolve("x"), None);
    }

    #[test]
    fn test_cycle_back_into_the_document_is_unresolved() {
        let f = Fixture::new("a=${x}\n");
        let chain =
            ConfigSourceChain::new().with_source(MapConfigSource::new("env", 300, [("x", "${a}")]));
        assert_eq!(f.resolver().with_sources(&chain).resolve("a"), None);
    }

    #[test]
    fn test_continuation_split_self_reference_is_unresolved() {
        let f = Fixture::new("a=$\\\n{a}\n");
        assert!(!f.graph.is_acyclic());
        assert_eq!(f.resolver().resolve("a"), None);
    }

    #[test]
    fn test_continuation_inside_reference_name() {
        let f = Fixture::new("db.host=localhost\nurl=jdbc:${db.\\\n    host}/app\n");
        assert!(f.graph.has_edge("url", "db.host"));
        assert_eq!(f.resolver().resolve("url").as_deref(), Some("jdbc:localhost/app"));
    }

    #[test]
    fn test_resolve_profiles() {
        let f = Fixture::new(
            "greeting.message=hello\n%dev.greeting.message=hello dev\n%prod.greeting.message=hello prod\n",
        );
        let variants = f.resolver().resolve_profiles("greeting.message");
        let summary: Vec<_> = variants
            .iter()
            .map(|v| (v.profile.as_deref(), v.value.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (None, Some("hello")),
                (Some("dev"), Some("hello dev")),
                (Some("prod"), Some("hello prod")),
            ]
        );
    }

    #[test]
    fn test_resolve_profiles_includes_sources() {
        let f = Fixture::new("greeting.message=hello\n");
        let chain = ConfigSourceChain::new().with_source(MapConfigSource::new(
            "yaml",
            255,
            [("%test.greeting.message", "hello test"), ("greeting.message", "shadowed")],
        ));
        let variants = f.resolver().with_sources(&chain).resolve_profiles("greeting.message");
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].origin, ValueOrigin::Document { index: 0 });
        assert_eq!(variants[1].profile.as_deref(), Some("test"));
        assert_eq!(
            variants[1].origin,
            ValueOrigin::Source {
                source_id: "yaml".to_string(),
                ordinal: 255
            }
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let f = Fixture::new("a=${b}-${c}\nb=x\nc=${b}\n");
        let first = f.resolver().resolve("a");
        let second = f.resolver().resolve("a");
        assert_eq!(first.as_deref(), Some("x-x"));
        assert_eq!(first, second);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn chains_resolve_to_the_tail_value(len in 1usize..20, tail in "[a-z0-9]{1,10}") {
                let mut text: String = (0..len)
                    .map(|i| format!("p{i}=${{p{}}}\n", i + 1))
                    .collect();
                text.push_str(&format!("p{len}={tail}\n"));
                let f = Fixture::new(&text);
                let resolved = f.resolver().resolve("p0");
                prop_assert_eq!(resolved.as_deref(), Some(tail.as_str()));
                prop_assert_eq!(f.resolver().resolve("p0"), resolved);
            }
        }
    }
}
