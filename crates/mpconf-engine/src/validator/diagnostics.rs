//! Diagnostic types produced by a validation pass.

use mpconf_config::{Severity, ValidationCategory};
use mpconf_core::TextRange;
use serde::Serialize;

/// One problem found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Range in the document; `None` for document-level diagnostics.
    pub range: Option<TextRange>,
    /// Index of the property the diagnostic is about.
    pub property_index: Option<usize>,
    /// Key (or metadata name) the diagnostic is about.
    pub property: String,
    /// Human readable message.
    pub message: String,
    /// Configured severity.
    pub severity: Severity,
    /// Source tag.
    pub source: String,
    /// Category.
    pub category: ValidationCategory,
}

impl Diagnostic {
    /// Machine-readable code of the category (`requiredValue`, ...).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.category.code()
    }
}

/// Result of a validation pass.
///
/// A cancelled pass means "no diagnostics available yet", not "valid".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The pass ran to completion.
    Complete(Vec<Diagnostic>),
    /// The pass was cancelled.
    Cancelled,
}

impl ValidationOutcome {
    /// Whether the pass was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Diagnostics of a completed pass.
    #[must_use]
    pub fn diagnostics(&self) -> Option<&[Diagnostic]> {
        match self {
            Self::Complete(diagnostics) => Some(diagnostics),
            Self::Cancelled => None,
        }
    }

    /// Diagnostics of a completed pass, by value.
    #[must_use]
    pub fn into_diagnostics(self) -> Option<Vec<Diagnostic>> {
        match self {
            Self::Complete(diagnostics) => Some(diagnostics),
            Self::Cancelled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_and_serialization() {
        let diagnostic = Diagnostic {
            range: None,
            property_index: None,
            property: "foo".to_string(),
            message: "Missing required property value for 'foo'".to_string(),
            severity: Severity::Warning,
            source: "mpconf".to_string(),
            category: ValidationCategory::RequiredValue,
        };
        assert_eq!(diagnostic.code(), "requiredValue");

        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["property"], "foo");
    }

    #[test]
    fn test_cancelled_outcome_has_no_diagnostics() {
        assert!(ValidationOutcome::Cancelled.is_cancelled());
        assert!(ValidationOutcome::Cancelled.diagnostics().is_none());
        assert_eq!(
            ValidationOutcome::Complete(vec![]).into_diagnostics(),
            Some(vec![])
        );
    }
}
