//! Engine settings schema.
//!
//! This module defines the structure of every settings section.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Severity of a diagnostic, or `Ignore` to disable a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The category is disabled.
    Ignore,
    /// Hint.
    Hint,
    /// Information.
    Info,
    /// Warning.
    Warning,
    /// Error.
    Error,
}

impl Severity {
    /// Whether diagnostics of this severity are emitted.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !matches!(self, Self::Ignore)
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Hint => "hint",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ignore" | "none" | "off" => Ok(Self::Ignore),
            "hint" => Ok(Self::Hint),
            "info" | "information" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(ConfigError::invalid_value(
                "severity",
                format!("unknown severity '{other}'"),
            )),
        }
    }
}

/// Validation categories, each with its own severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCategory {
    /// Missing assignment delimiter, unterminated expression.
    Syntax,
    /// Same key assigned more than once.
    Duplicate,
    /// Key without metadata.
    Unknown,
    /// Value incompatible with the declared type or enum.
    Value,
    /// Required property absent from the document.
    Required,
    /// Required property present but empty.
    RequiredValue,
    /// Expression referencing an unknown property.
    Expression,
}

impl ValidationCategory {
    /// Every category, in reporting order.
    pub const ALL: [Self; 7] = [
        Self::Syntax,
        Self::Duplicate,
        Self::Unknown,
        Self::Value,
        Self::Required,
        Self::RequiredValue,
        Self::Expression,
    ];

    /// Machine-readable code attached to diagnostics.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Duplicate => "duplicate",
            Self::Unknown => "unknown",
            Self::Value => "value",
            Self::Required => "required",
            Self::RequiredValue => "requiredValue",
            Self::Expression => "expression",
        }
    }

    /// Parses an environment variable segment such as `REQUIRED_VALUE`.
    #[must_use]
    pub fn from_env_segment(segment: &str) -> Option<Self> {
        match segment {
            "SYNTAX" => Some(Self::Syntax),
            "DUPLICATE" => Some(Self::Duplicate),
            "UNKNOWN" => Some(Self::Unknown),
            "VALUE" => Some(Self::Value),
            "REQUIRED" => Some(Self::Required),
            "REQUIRED_VALUE" => Some(Self::RequiredValue),
            "EXPRESSION" => Some(Self::Expression),
            _ => None,
        }
    }
}

impl fmt::Display for ValidationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Settings of one validation category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CategorySettings {
    /// Severity of emitted diagnostics; `ignore` disables the category.
    pub severity: Severity,

    /// Property name patterns (exact or `*` wildcard) for which the category
    /// is suppressed.
    #[serde(default)]
    pub excluded: Vec<String>,
}

impl CategorySettings {
    /// Settings with the given severity and no exclusions.
    #[must_use]
    pub const fn new(severity: Severity) -> Self {
        Self {
            severity,
            excluded: Vec::new(),
        }
    }
}

/// Validation section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ValidationSettings {
    /// Run validation at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Source tag attached to diagnostics.
    #[serde(default = "default_source")]
    pub source: String,

    /// Missing delimiter, unterminated expression.
    #[serde(default = "default_error")]
    pub syntax: CategorySettings,

    /// Duplicate keys.
    #[serde(default = "default_warning")]
    pub duplicate: CategorySettings,

    /// Keys without metadata.
    #[serde(default = "default_warning")]
    pub unknown: CategorySettings,

    /// Type and enum mismatches.
    #[serde(default = "default_error")]
    pub value: CategorySettings,

    /// Missing required properties.
    #[serde(default = "default_warning")]
    pub required: CategorySettings,

    /// Required properties with an empty value.
    #[serde(default = "default_warning")]
    pub required_value: CategorySettings,

    /// Unknown references in expressions.
    #[serde(default = "default_error")]
    pub expression: CategorySettings,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            source: default_source(),
            syntax: default_error(),
            duplicate: default_warning(),
            unknown: default_warning(),
            value: default_error(),
            required: default_warning(),
            required_value: default_warning(),
            expression: default_error(),
        }
    }
}

impl ValidationSettings {
    /// Settings of a category.
    #[must_use]
    pub const fn category(&self, category: ValidationCategory) -> &CategorySettings {
        match category {
            ValidationCategory::Syntax => &self.syntax,
            ValidationCategory::Duplicate => &self.duplicate,
            ValidationCategory::Unknown => &self.unknown,
            ValidationCategory::Value => &self.value,
            ValidationCategory::Required => &self.required,
            ValidationCategory::RequiredValue => &self.required_value,
            ValidationCategory::Expression => &self.expression,
        }
    }

    /// Mutable settings of a category.
    pub fn category_mut(&mut self, category: ValidationCategory) -> &mut CategorySettings {
        match category {
            ValidationCategory::Syntax => &mut self.syntax,
            ValidationCategory::Duplicate => &mut self.duplicate,
            ValidationCategory::Unknown => &mut self.unknown,
            ValidationCategory::Value => &mut self.value,
            ValidationCategory::Required => &mut self.required,
            ValidationCategory::RequiredValue => &mut self.required_value,
            ValidationCategory::Expression => &mut self.expression,
        }
    }

    /// Compiles exclusion patterns for use during one validation pass.
    #[must_use]
    pub fn compile(&self) -> ValidationRules {
        let categories = ValidationCategory::ALL.map(|category| {
            let settings = self.category(category);
            CompiledCategory {
                severity: if self.enabled {
                    settings.severity
                } else {
                    Severity::Ignore
                },
                excluded: settings
                    .excluded
                    .iter()
                    .map(|p| PropertyPattern::new(p))
                    .collect(),
            }
        });
        ValidationRules {
            source: self.source.clone(),
            categories,
        }
    }
}

/// Exact or `*`-wildcard property name pattern.
#[derive(Debug, Clone)]
pub enum PropertyPattern {
    /// Matches one name.
    Exact(String),
    /// Matches names against a compiled wildcard.
    Wildcard(Regex),
}

impl PropertyPattern {
    /// Compiles a pattern; `*` matches any run of characters.
    ///
    /// # Example
    ///
    /// ```
    /// use mpconf_config::PropertyPattern;
    ///
    /// assert!(PropertyPattern::new("quarkus.dev.*").matches("quarkus.dev.port"));
    /// assert!(PropertyPattern::new("a.b").matches("a.b"));
    /// assert!(!PropertyPattern::new("a.b").matches("a.bc"));
    /// ```
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        if !pattern.contains('*') {
            return Self::Exact(pattern.to_string());
        }
        let source = format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"));
        match Regex::new(&source) {
            Ok(regex) => Self::Wildcard(regex),
            Err(_) => Self::Exact(pattern.to_string()),
        }
    }

    /// Whether a property name matches.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(exact) => exact == name,
            Self::Wildcard(regex) => regex.is_match(name),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledCategory {
    severity: Severity,
    excluded: Vec<PropertyPattern>,
}

/// Validation settings ready for a pass: patterns compiled, global switch
/// folded into every category.
#[derive(Debug, Clone)]
pub struct ValidationRules {
    source: String,
    categories: [CompiledCategory; 7],
}

impl Default for ValidationRules {
    fn default() -> Self {
        ValidationSettings::default().compile()
    }
}

impl ValidationRules {
    /// Source tag of diagnostics.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    fn compiled(&self, category: ValidationCategory) -> &CompiledCategory {
        let index = ValidationCategory::ALL
            .iter()
            .position(|c| *c == category)
            .unwrap_or_default();
        &self.categories[index]
    }

    /// Configured severity of a category.
    #[must_use]
    pub fn severity(&self, category: ValidationCategory) -> Severity {
        self.compiled(category).severity
    }

    /// Severity for a given property, `Ignore` when the property is excluded.
    ///
    /// Profiled keys are matched both as written and without their profile.
    #[must_use]
    pub fn severity_for(&self, category: ValidationCategory, key: &str) -> Severity {
        let compiled = self.compiled(category);
        let bare = mpconf_core::split_profile(key).1;
        if compiled
            .excluded
            .iter()
            .any(|p| p.matches(key) || p.matches(bare))
        {
            Severity::Ignore
        } else {
            compiled.severity
        }
    }

    /// Whether a category can emit anything at all.
    #[must_use]
    pub fn is_enabled(&self, category: ValidationCategory) -> bool {
        self.severity(category).is_enabled()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines.
    #[default]
    Json,
    /// Human-readable.
    Pretty,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive (`info`, `mpconf_engine=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_source() -> String {
    "mpconf".to_string()
}

fn default_error() -> CategorySettings {
    CategorySettings::new(Severity::Error)
}

fn default_warning() -> CategorySettings {
    CategorySettings::new(Severity::Warning)
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_severities() {
        let settings = ValidationSettings::default();
        assert_eq!(settings.syntax.severity, Severity::Error);
        assert_eq!(settings.duplicate.severity, Severity::Warning);
        assert_eq!(settings.unknown.severity, Severity::Warning);
        assert_eq!(settings.value.severity, Severity::Error);
        assert_eq!(settings.required.severity, Severity::Warning);
        assert_eq!(settings.required_value.severity, Severity::Warning);
        assert_eq!(settings.expression.severity, Severity::Error);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!("NONE".parse::<Severity>().unwrap(), Severity::Ignore);
        assert_eq!("error".parse::<Severity>().unwrap(), Severity::Error);
        assert!("loud".parse::<Severity>().is_err());
    }

    #[test]
    fn test_category_codes() {
        let codes: Vec<_> = ValidationCategory::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(
            codes,
            vec!["syntax", "duplicate", "unknown", "value", "required", "requiredValue", "expression"]
        );
    }

    #[test]
    fn test_rules_exclusions() {
        let mut settings = ValidationSettings::default();
        settings.unknown.excluded = vec!["quarkus.dev.*".to_string(), "exact.key".to_string()];
        let rules = settings.compile();

        assert_eq!(
            rules.severity_for(ValidationCategory::Unknown, "quarkus.dev.port"),
            Severity::Ignore
        );
        assert_eq!(
            rules.severity_for(ValidationCategory::Unknown, "%dev.exact.key"),
            Severity::Ignore
        );
        assert_eq!(
            rules.severity_for(ValidationCategory::Unknown, "other.key"),
            Severity::Warning
        );
        assert_eq!(
            rules.severity_for(ValidationCategory::Duplicate, "quarkus.dev.port"),
            Severity::Warning
        );
    }

    #[test]
    fn test_disabled_validation_ignores_everything() {
        let settings = ValidationSettings {
            enabled: false,
            ..Default::default()
        };
        let rules = settings.compile();
        for category in ValidationCategory::ALL {
            assert!(!rules.is_enabled(category));
        }
    }

    #[test]
    fn test_category_mut() {
        let mut settings = ValidationSettings::default();
        settings.category_mut(ValidationCategory::Value).severity = Severity::Ignore;
        assert!(!settings.compile().is_enabled(ValidationCategory::Value));
    }

    #[test]
    fn test_wildcard_pattern_escapes_dots() {
        let pattern = PropertyPattern::new("a.*.c");
        assert!(pattern.matches("a.b.c"));
        assert!(!pattern.matches("axbxc"));
    }
}
