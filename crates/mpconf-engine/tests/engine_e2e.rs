//! End-to-end tests: documents, config sources and metadata through the
//! graph, the resolver, the expander and the validator.

use std::fs;

use mpconf_config::{ConfigSourceProvider, SettingsLoader, ValidationCategory, ValidationRules};
use mpconf_core::{Hint, MetadataSnapshot, PropertiesDocument, PropertyItem, ValueHint};
use mpconf_engine::{expand, PropertyGraph, PropertyResolver, ValueOrigin, Validator};

fn parse(text: &str) -> PropertiesDocument {
    PropertiesDocument::parse("application.properties", text)
}

/// Items of a project with one dynamic datasource template.
fn project_metadata(datasources: &[&str]) -> MetadataSnapshot {
    let static_items = vec![
        PropertyItem::new("quarkus.http.port").with_type("int").with_default("8080"),
        PropertyItem::new("greeting.message").with_type("java.lang.String"),
        PropertyItem::new("app.secret").with_type("java.lang.String").required(),
    ];
    let templates = vec![PropertyItem::new("quarkus.datasource.${datasource-name}.jdbc.max-size")
        .with_type("int")];
    let hint = datasources
        .iter()
        .fold(Hint::new("${datasource-name}"), |hint, name| {
            hint.with_value(ValueHint::new(*name).with_source_type("org.acme.Repository"))
        });
    let hints = vec![hint];

    let generated = expand(&static_items, &templates, hints.as_slice());
    let mut items = static_items;
    items.extend(templates);
    items.extend(generated);
    MetadataSnapshot::new(items, hints)
}

#[test]
fn test_cycle_anywhere_leaves_everything_unresolved() {
    let doc = parse("a=${b}\nb=${c}\nc=val\n");
    let graph = PropertyGraph::build(&doc);
    let metadata = MetadataSnapshot::default();
    assert_eq!(
        PropertyResolver::new(&doc, &graph, &metadata).resolve("a").as_deref(),
        Some("val")
    );

    let doc = parse("a=${b}\nb=${c}\nc=val\nloop=${loop}\n");
    let graph = PropertyGraph::build(&doc);
    assert!(!graph.is_acyclic());
    assert_eq!(PropertyResolver::new(&doc, &graph, &metadata).resolve("a"), None);
}

#[test]
fn test_profile_variants_from_document_and_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("application-staging.properties"),
        "greeting.message=hello staging\n",
    )
    .unwrap();
    let chain = ConfigSourceProvider::discover(dir.path(), &["staging"]);

    let doc = parse(
        "greeting.message=hello\n%dev.greeting.message=hello dev\n%prod.greeting.message=hello prod\n",
    );
    let graph = PropertyGraph::build(&doc);
    let metadata = project_metadata(&[]);
    let variants = PropertyResolver::new(&doc, &graph, &metadata)
        .with_sources(&chain)
        .resolve_profiles("greeting.message");

    let summary: Vec<_> = variants
        .iter()
        .map(|v| (v.key.as_str(), v.value.as_deref()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("greeting.message", Some("hello")),
            ("%dev.greeting.message", Some("hello dev")),
            ("%prod.greeting.message", Some("hello prod")),
            ("%staging.greeting.message", Some("hello staging")),
        ]
    );
    assert!(matches!(
        &variants[3].origin,
        ValueOrigin::Source { ordinal: 250, .. }
    ));
}

#[test]
fn test_generated_items_are_validated() {
    let metadata = project_metadata(&["users", "orders"]);
    let rules = ValidationRules::default();
    let doc = parse(
        "app.secret=s3cr3t\n\
         quarkus.datasource.users.jdbc.max-size=16\n\
         quarkus.datasource.orders.jdbc.max-size=many\n",
    );

    let diagnostics = Validator::new(&metadata, &rules)
        .validate(&doc)
        .into_diagnostics()
        .unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].category, ValidationCategory::Value);
    assert_eq!(diagnostics[0].property, "quarkus.datasource.orders.jdbc.max-size");
}

#[test]
fn test_required_empty_value_and_unknown_reference() {
    let metadata = project_metadata(&[]);
    let rules = ValidationRules::default();
    let doc = parse("app.secret=\ngreeting.message=${zzz}\n");

    let diagnostics = Validator::new(&metadata, &rules)
        .validate(&doc)
        .into_diagnostics()
        .unwrap();
    let codes: Vec<_> = diagnostics.iter().map(|d| d.code()).collect();
    assert_eq!(codes, vec!["expression", "requiredValue"]);
    assert!(diagnostics[0].message.contains("zzz"));
}

#[test]
fn test_settings_file_drives_severities() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mpconf.toml");
    fs::write(
        &path,
        "[validation.unknown]\nseverity = \"error\"\nexcluded = [\"legacy.*\"]\n\n[validation.required]\nseverity = \"ignore\"\n",
    )
    .unwrap();
    let settings = SettingsLoader::new().with_file(&path).unwrap().load().unwrap();
    let rules = settings.validation.compile();

    let metadata = project_metadata(&[]);
    let doc = parse("legacy.flag=true\nnew.flag=true\n");
    let diagnostics = Validator::new(&metadata, &rules)
        .validate(&doc)
        .into_diagnostics()
        .unwrap();

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].property, "new.flag");
    assert_eq!(diagnostics[0].severity, mpconf_config::Severity::Error);
}
