//! Main settings types.
//!
//! This module provides the top-level [`EngineSettings`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{LogFormat, LoggingSettings, ValidationCategory, ValidationSettings};

/// Complete mpconf engine settings.
///
/// Use [`SettingsLoader`](crate::SettingsLoader) to load settings from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use mpconf_config::{EngineSettings, Severity};
///
/// let settings = EngineSettings::default();
/// assert_eq!(settings.validation.unknown.severity, Severity::Warning);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct EngineSettings {
    /// Validation settings.
    #[serde(default)]
    pub validation: ValidationSettings,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl EngineSettings {
    /// Create a new settings builder.
    #[must_use]
    pub fn builder() -> EngineSettingsBuilder {
        EngineSettingsBuilder::new()
    }

    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - The diagnostic source tag is blank
    /// - The log level is blank while logging is enabled
    /// - An exclusion pattern is blank
    pub fn validate(&self) -> Result<(), crate::ConfigError> {
        if self.validation.source.trim().is_empty() {
            return Err(crate::ConfigError::validation_error(
                "validation.source must not be blank",
            ));
        }

        if self.logging.enabled && self.logging.level.trim().is_empty() {
            return Err(crate::ConfigError::invalid_value(
                "logging.level",
                "must not be blank when logging is enabled",
            ));
        }

        for category in ValidationCategory::ALL {
            if self
                .validation
                .category(category)
                .excluded
                .iter()
                .any(|p| p.trim().is_empty())
            {
                return Err(crate::ConfigError::invalid_value(
                    format!("validation.{category}.excluded"),
                    "patterns must not be blank",
                ));
            }
        }

        Ok(())
    }

    /// Development preset: pretty debug logging.
    ///
    /// # Example
    ///
    /// ```
    /// use mpconf_config::{EngineSettings, LogFormat};
    ///
    /// let settings = EngineSettings::development();
    /// assert_eq!(settings.logging.level, "debug");
    /// assert_eq!(settings.logging.format, LogFormat::Pretty);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut settings = Self::default();
        settings.logging.level = "debug".to_string();
        settings.logging.format = LogFormat::Pretty;
        settings
    }

    /// Production preset: JSON info logging.
    #[must_use]
    pub fn production() -> Self {
        let mut settings = Self::default();
        settings.logging.level = "info".to_string();
        settings.logging.format = LogFormat::Json;
        settings
    }
}

/// Builder for [`EngineSettings`].
#[derive(Debug, Default)]
pub struct EngineSettingsBuilder {
    validation: Option<ValidationSettings>,
    logging: Option<LoggingSettings>,
}

impl EngineSettingsBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the validation settings.
    #[must_use]
    pub fn validation(mut self, validation: ValidationSettings) -> Self {
        self.validation = Some(validation);
        self
    }

    /// Set the logging settings.
    #[must_use]
    pub fn logging(mut self, logging: LoggingSettings) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the settings.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> EngineSettings {
        EngineSettings {
            validation: self.validation.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Severity;

    #[test]
    fn test_default_settings_validate() {
        assert!(EngineSettings::default().validate().is_ok());
    }

    #[test]
    fn test_blank_source_rejected() {
        let mut settings = EngineSettings::default();
        settings.validation.source = "  ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_blank_exclusion_rejected() {
        let mut settings = EngineSettings::default();
        settings.validation.unknown.excluded = vec![String::new()];
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("validation.unknown.excluded"));
    }

    #[test]
    fn test_builder() {
        let mut validation = ValidationSettings::default();
        validation.duplicate.severity = Severity::Error;
        let settings = EngineSettings::builder().validation(validation).build();
        assert_eq!(settings.validation.duplicate.severity, Severity::Error);
        assert_eq!(settings.logging, LoggingSettings::default());
    }

    #[test]
    fn test_production_preset() {
        let settings = EngineSettings::production();
        assert_eq!(settings.logging.format, LogFormat::Json);
    }
}
