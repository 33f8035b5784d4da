//! Metadata-driven validation of `.properties` documents.
//!
//! One [`Validator::validate`] call walks the document once and returns every
//! diagnostic of the enabled categories:
//!
//! | Category | Reported when |
//! |----------|---------------|
//! | `syntax` | a line has no `=`/`:`, or a `${` has no closing `}` |
//! | `duplicate` | a key (profile included) is assigned more than once |
//! | `unknown` | no metadata item matches the bare name |
//! | `value` | the value does not fit the item's enum or primitive type |
//! | `expression` | a `${name}` references nothing known |
//! | `required` | a required item is never assigned |
//! | `requiredValue` | a required item is only assigned empty values |
//!
//! Severities and per-property exclusions come from [`ValidationRules`].

mod diagnostics;
mod value;

use std::cell::OnceCell;
use std::collections::HashSet;

use indexmap::IndexMap;
use mpconf_config::{ConfigSourceChain, Severity, ValidationCategory, ValidationRules};
use mpconf_core::{
    CancelChecker, Cancelled, MetadataSnapshot, NeverCancelled, PropertiesDocument, Property,
    PropertyExpression, PropertyItem, TextRange,
};

pub use diagnostics::{Diagnostic, ValidationOutcome};

use crate::graph::PropertyGraph;
use crate::resolver::PropertyResolver;
use value::{check_value, ValueProblem};

/// Validates documents against project metadata.
///
/// # Example
///
/// ```
/// use mpconf_config::{ValidationCategory, ValidationRules};
/// use mpconf_core::{MetadataSnapshot, PropertiesDocument, PropertyItem};
/// use mpconf_engine::Validator;
///
/// let metadata = MetadataSnapshot::new(
///     vec![PropertyItem::new("quarkus.http.port").with_type("int")],
///     vec![],
/// );
/// let rules = ValidationRules::default();
/// let doc = PropertiesDocument::parse("application.properties", "quarkus.http.port=abc\n");
///
/// let diagnostics = Validator::new(&metadata, &rules)
///     .validate(&doc)
///     .into_diagnostics()
///     .unwrap();
/// assert_eq!(diagnostics.len(), 1);
/// assert_eq!(diagnostics[0].category, ValidationCategory::Value);
/// ```
#[derive(Clone, Copy)]
pub struct Validator<'a> {
    metadata: &'a MetadataSnapshot,
    rules: &'a ValidationRules,
    sources: Option<&'a ConfigSourceChain>,
    cancel: &'a dyn CancelChecker,
}

impl std::fmt::Debug for Validator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("items", &self.metadata.len())
            .field("rules", &self.rules)
            .field("sources", &self.sources.map(ConfigSourceChain::len))
            .finish_non_exhaustive()
    }
}

impl<'a> Validator<'a> {
    /// Creates a validator.
    #[must_use]
    pub fn new(metadata: &'a MetadataSnapshot, rules: &'a ValidationRules) -> Self {
        Self {
            metadata,
            rules,
            sources: None,
            cancel: &NeverCancelled,
        }
    }

    /// Resolves references through config sources too, and counts their
    /// keys as known reference targets.
    #[must_use]
    pub fn with_sources(mut self, sources: &'a ConfigSourceChain) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Checks `cancel` before each property.
    #[must_use]
    pub fn with_cancel(mut self, cancel: &'a dyn CancelChecker) -> Self {
        self.cancel = cancel;
        self
    }

    /// Validates a document.
    pub fn validate(&self, document: &PropertiesDocument) -> ValidationOutcome {
        match self.run(document) {
            Ok(diagnostics) => {
                tracing::debug!(
                    uri = document.uri(),
                    diagnostics = diagnostics.len(),
                    "Validated document"
                );
                ValidationOutcome::Complete(diagnostics)
            }
            Err(Cancelled) => {
                tracing::debug!(uri = document.uri(), "Validation cancelled");
                ValidationOutcome::Cancelled
            }
        }
    }

    fn run(&self, document: &PropertiesDocument) -> Result<Vec<Diagnostic>, Cancelled> {
        let graph = PropertyGraph::build_cancellable(document, self.cancel)?;
        let mut resolver = PropertyResolver::new(document, &graph, self.metadata);
        if let Some(sources) = self.sources {
            resolver = resolver.with_sources(sources);
        }
        let mut pass = Pass {
            validator: self,
            document,
            resolver,
            known_names: OnceCell::new(),
            by_key: IndexMap::new(),
            diagnostics: Vec::new(),
        };

        for property in document.properties() {
            self.cancel.check()?;
            pass.check_property(property);
        }
        pass.report_duplicates();
        pass.report_required();
        Ok(pass.diagnostics)
    }
}

/// State of one validation pass.
struct Pass<'v, 'a> {
    validator: &'v Validator<'a>,
    document: &'v PropertiesDocument,
    resolver: PropertyResolver<'v>,
    known_names: OnceCell<HashSet<String>>,
    by_key: IndexMap<&'v str, Vec<&'v Property>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'v, 'a> Pass<'v, 'a> {
    fn rules(&self) -> &ValidationRules {
        self.validator.rules
    }

    fn report(
        &mut self,
        category: ValidationCategory,
        key: &str,
        severity: Severity,
        range: Option<TextRange>,
        property_index: Option<usize>,
        message: String,
    ) {
        if !severity.is_enabled() {
            return;
        }
        let source = self.rules().source().to_string();
        self.diagnostics.push(Diagnostic {
            range,
            property_index,
            property: key.to_string(),
            message,
            severity,
            source,
            category,
        });
    }

    fn report_on(
        &mut self,
        property: &Property,
        category: ValidationCategory,
        range: TextRange,
        message: String,
    ) {
        let severity = self.rules().severity_for(category, property.key());
        self.report(
            category,
            property.key(),
            severity,
            Some(range),
            Some(property.index()),
            message,
        );
    }

    fn check_property(&mut self, property: &'v Property) {
        let key = property.key();
        if key.trim().is_empty() {
            return;
        }
        self.by_key.entry(key).or_default().push(property);

        if !property.has_delimiter() {
            self.report_on(
                property,
                ValidationCategory::Syntax,
                property.key_range(),
                format!("Missing equals sign after '{key}'"),
            );
        }

        let metadata = self.validator.metadata;
        let name = property.name();
        let item = if name.is_empty() {
            None
        } else {
            metadata.find_item(name)
        };
        match item {
            None if !name.is_empty() => self.report_on(
                property,
                ValidationCategory::Unknown,
                property.key_range(),
                format!("Unknown property '{key}'"),
            ),
            Some(item) => self.check_value(property, item),
            None => {}
        }

        for expression in property.expressions() {
            self.check_expression(property, expression);
        }
    }

    fn check_value(&mut self, property: &Property, item: &PropertyItem) {
        let Some(value) = property.value() else {
            return;
        };
        let text = value.text().trim();
        if text.is_empty() {
            return;
        }

        let resolved = match property.expressions() {
            [] => text.to_string(),
            [only] if is_whole_expression(text) && only.is_closed() => return,
            _ => match self.resolver.resolve_property(property) {
                Some(resolved) => resolved.trim().to_string(),
                None => return,
            },
        };
        if resolved.is_empty() {
            return;
        }

        let Some(problem) = check_value(item, &resolved, self.validator.metadata) else {
            return;
        };
        let mut severity = self
            .rules()
            .severity_for(ValidationCategory::Value, property.key());
        let message = match problem {
            ValueProblem::Mismatch(message) => message,
            ValueProblem::NotBoolean(message) => {
                severity = severity.min(Severity::Warning);
                message
            }
        };
        self.report(
            ValidationCategory::Value,
            property.key(),
            severity,
            Some(value.range()),
            Some(property.index()),
            message,
        );
    }

    fn check_expression(&mut self, property: &Property, expression: &PropertyExpression) {
        if !expression.is_closed() {
            self.report_on(
                property,
                ValidationCategory::Syntax,
                expression.range(),
                "Missing '}'".to_string(),
            );
        }

        let name = expression.referenced_name();
        if name.is_empty() || expression.default_value().is_some() || self.is_known(name) {
            return;
        }
        self.report_on(
            property,
            ValidationCategory::Expression,
            expression.range(),
            format!("Unknown referenced property value expression '{name}'"),
        );
    }

    /// Whether a reference target exists in the metadata, the document or
    /// the config sources.
    fn is_known(&self, name: &str) -> bool {
        let metadata = self.validator.metadata;
        let names = self.known_names.get_or_init(|| {
            let mut names: HashSet<String> = metadata.names().map(str::to_string).collect();
            names.extend(self.document.properties().iter().map(|p| p.key().to_string()));
            if let Some(sources) = self.validator.sources {
                names.extend(sources.get_all_keys());
            }
            names
        });
        names.contains(name) || metadata.find_item(name).is_some()
    }

    fn report_duplicates(&mut self) {
        let duplicates: Vec<&'v Property> = self
            .by_key
            .values()
            .filter(|occurrences| occurrences.len() > 1)
            .flatten()
            .copied()
            .collect();
        for property in duplicates {
            self.report_on(
                property,
                ValidationCategory::Duplicate,
                property.key_range(),
                format!("Duplicate property '{}'", property.key()),
            );
        }
    }

    fn report_required(&mut self) {
        let metadata = self.validator.metadata;
        let document = self.document;
        for item in metadata.required_items() {
            if item.is_dynamic() || item.default_value.is_some() {
                continue;
            }
            let occurrences: Vec<&Property> = document.find_by_name(&item.name).collect();
            if occurrences.is_empty() {
                let provided = self
                    .validator
                    .sources
                    .is_some_and(|sources| sources.get_property(&item.name).is_some());
                if !provided {
                    let severity = self
                        .rules()
                        .severity_for(ValidationCategory::Required, &item.name);
                    self.report(
                        ValidationCategory::Required,
                        &item.name,
                        severity,
                        None,
                        None,
                        format!("Missing required property '{}'", item.name),
                    );
                }
                continue;
            }
            if occurrences.iter().all(|p| p.has_empty_value()) {
                for property in occurrences {
                    self.report_on(
                        property,
                        ValidationCategory::RequiredValue,
                        property.range(),
                        format!("Missing required property value for '{}'", property.key()),
                    );
                }
            }
        }
    }
}

/// Whether the whole value is a single `${...}`.
fn is_whole_expression(text: &str) -> bool {
    text.starts_with("${") && text.ends_with('}') && text[2..].find('}') == Some(text.len() - 3)
}
