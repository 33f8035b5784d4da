//! Layered loading of [`EngineSettings`].
//!
//! Layers are applied in call order and each one replaces what came before:
//! a preset, a settings file or inline content, then environment overrides.
//! Validation runs once, on [`SettingsLoader::load`].

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::{ConfigError, EngineSettings, LogFormat, Severity, ValidationCategory};

/// Serialization format of a settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    /// TOML (`.toml`).
    Toml,
    /// JSON (`.json`).
    Json,
}

impl SettingsFormat {
    /// Format implied by a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        extension.parse()
    }

    fn deserialize(self, content: &str, origin: &str) -> Result<EngineSettings, ConfigError> {
        match self {
            Self::Toml => toml::from_str(content).map_err(|e| ConfigError::parse(self, origin, e)),
            Self::Json => {
                serde_json::from_str(content).map_err(|e| ConfigError::parse(self, origin, e))
            }
        }
    }
}

impl FromStr for SettingsFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("toml") {
            Ok(Self::Toml)
        } else if s.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(ConfigError::UnsupportedFormat(s.to_string()))
        }
    }
}

impl fmt::Display for SettingsFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Toml => "toml",
            Self::Json => "json",
        })
    }
}

/// Builds [`EngineSettings`] from layers.
///
/// Environment overrides are named `PREFIX__SECTION__FIELD`, with a category
/// segment for per-category fields:
///
/// - `MPCONF__VALIDATION__ENABLED=false`
/// - `MPCONF__VALIDATION__SOURCE=quarkus`
/// - `MPCONF__VALIDATION__UNKNOWN__SEVERITY=ignore`
/// - `MPCONF__VALIDATION__UNKNOWN__EXCLUDED=quarkus.dev.*,mp.jwt.*`
/// - `MPCONF__LOGGING__LEVEL=debug`
/// - `MPCONF__LOGGING__FORMAT=pretty`
///
/// Variables under the prefix that name no known field are ignored.
///
/// # Example
///
/// ```no_run
/// use mpconf_config::SettingsLoader;
///
/// # fn main() -> Result<(), mpconf_config::ConfigError> {
/// let settings = SettingsLoader::new()
///     .with_optional_file("mpconf.toml")?
///     .with_env_prefix("MPCONF")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct SettingsLoader {
    settings: EngineSettings,
    env_prefix: Option<String>,
    overrides: Vec<(String, String)>,
}

impl SettingsLoader {
    /// Starts from [`EngineSettings::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets to the defaults.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.settings = EngineSettings::default();
        self
    }

    /// Resets to [`EngineSettings::development`].
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.settings = EngineSettings::development();
        self
    }

    /// Replaces the settings with the content of a `.toml` or `.json` file.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = SettingsFormat::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::file_not_found(path)
            } else {
                ConfigError::read_error(path, e)
            }
        })?;

        self.settings = format.deserialize(&content, &path.display().to_string())?;
        tracing::debug!(path = %path.display(), %format, "Loaded engine settings file");
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file leaves the
    /// settings untouched.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            self.with_file(path)
        } else {
            tracing::trace!(path = %path.display(), "No settings file");
            Ok(self)
        }
    }

    /// Replaces the settings with inline content in `format` (`toml` or
    /// `json`).
    ///
    /// # Example
    ///
    /// ```
    /// use mpconf_config::{SettingsLoader, Severity};
    ///
    /// let settings = SettingsLoader::new()
    ///     .with_string("[validation.unknown]\nseverity = \"ignore\"\n", "toml")
    ///     .and_then(SettingsLoader::load)
    ///     .unwrap();
    ///
    /// assert_eq!(settings.validation.unknown.severity, Severity::Ignore);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let format: SettingsFormat = format.parse()?;
        self.settings = format.deserialize(content, "<string>")?;
        Ok(self)
    }

    /// Reads overrides from the process environment on [`load`](Self::load).
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Adds override variables explicitly, as if they were in the
    /// environment. They are applied after the process environment.
    #[must_use]
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.overrides
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Loads `.env` into the process environment. A missing file is fine.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
        }
        Ok(self)
    }

    /// Applies the overrides and validates the result.
    pub fn load(mut self) -> Result<EngineSettings, ConfigError> {
        let mut vars: Vec<(String, String)> = match &self.env_prefix {
            Some(prefix) => {
                let prefix = format!("{prefix}__");
                std::env::vars()
                    .filter(|(name, _)| name.starts_with(&prefix))
                    .collect()
            }
            None => Vec::new(),
        };
        vars.append(&mut self.overrides);

        for (name, value) in &vars {
            apply_override(&mut self.settings, name, value)?;
        }
        self.settings.validate()?;
        Ok(self.settings)
    }

    /// Returns the settings without overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> EngineSettings {
        self.settings
    }
}

/// Applies one `PREFIX__SECTION__...` variable.
fn apply_override(settings: &mut EngineSettings, name: &str, value: &str) -> Result<(), ConfigError> {
    let Some((_, path)) = name.split_once("__") else {
        return Ok(());
    };
    let segments: Vec<&str> = path.split("__").collect();
    let fail = |reason: &str| ConfigError::env_parse_error(name, reason);
    let category = |segment: &str| {
        ValidationCategory::from_env_segment(segment).ok_or_else(|| fail("unknown validation category"))
    };

    match segments.as_slice() {
        ["VALIDATION", "ENABLED"] => {
            settings.validation.enabled = parse_bool(value).ok_or_else(|| fail("expected a boolean"))?;
        }
        ["VALIDATION", "SOURCE"] => settings.validation.source = value.to_string(),
        ["VALIDATION", segment, "SEVERITY"] => {
            let severity = value
                .parse::<Severity>()
                .map_err(|_| fail("expected error, warning, info, hint or ignore"))?;
            settings.validation.category_mut(category(segment)?).severity = severity;
        }
        ["VALIDATION", segment, "EXCLUDED"] => {
            settings.validation.category_mut(category(segment)?).excluded = value
                .split(',')
                .map(str::trim)
                .filter(|pattern| !pattern.is_empty())
                .map(str::to_string)
                .collect();
        }
        ["LOGGING", "ENABLED"] => {
            settings.logging.enabled = parse_bool(value).ok_or_else(|| fail("expected a boolean"))?;
        }
        ["LOGGING", "LEVEL"] => settings.logging.level = value.to_string(),
        ["LOGGING", "FORMAT"] => {
            settings.logging.format = if value.eq_ignore_ascii_case("json") {
                LogFormat::Json
            } else if value.eq_ignore_ascii_case("pretty") {
                LogFormat::Pretty
            } else {
                return Err(fail("expected json or pretty"));
            };
        }
        _ => tracing::trace!(var = name, "Ignoring unknown settings override"),
    }
    Ok(())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = SettingsLoader::new().load().unwrap();
        assert!(settings.validation.enabled);
        assert_eq!(settings.validation.source, "mpconf");
    }

    #[test]
    fn test_development_preset() {
        let settings = SettingsLoader::new().with_development().load().unwrap();
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_toml_content() {
        let toml = r#"
            [validation]
            source = "quarkus"

            [validation.duplicate]
            severity = "error"

            [validation.unknown]
            excluded = ["quarkus.dev.*"]
        "#;

        let settings = SettingsLoader::new()
            .with_string(toml, "TOML")
            .and_then(SettingsLoader::load)
            .unwrap();

        assert_eq!(settings.validation.source, "quarkus");
        assert_eq!(settings.validation.duplicate.severity, Severity::Error);
        assert_eq!(settings.validation.unknown.excluded, vec!["quarkus.dev.*"]);
        assert_eq!(settings.validation.unknown.severity, Severity::Warning);
        assert_eq!(settings.validation.expression.severity, Severity::Error);
    }

    #[test]
    fn test_json_content() {
        let json = r#"{"validation": {"value": {"severity": "ignore"}}, "logging": {"level": "warn"}}"#;
        let settings = SettingsLoader::new()
            .with_string(json, "json")
            .and_then(SettingsLoader::load)
            .unwrap();

        assert_eq!(settings.validation.value.severity, Severity::Ignore);
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = SettingsLoader::new()
            .with_string("[validation]\ncolour = \"red\"\n", "toml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: SettingsFormat::Toml, .. }));
    }

    #[test]
    fn test_unsupported_format() {
        assert!(matches!(
            SettingsLoader::new().with_string("", "ini"),
            Err(ConfigError::UnsupportedFormat(f)) if f == "ini"
        ));
        assert!(SettingsLoader::new().with_file("/etc/mpconf.yaml").is_err());
    }

    #[test]
    fn test_file_layer() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[validation.required]\nseverity = \"error\"").unwrap();

        let settings = SettingsLoader::new()
            .with_file(file.path())
            .and_then(SettingsLoader::load)
            .unwrap();
        assert_eq!(settings.validation.required.severity, Severity::Error);
    }

    #[test]
    fn test_missing_files() {
        let result = SettingsLoader::new().with_file("/nonexistent/mpconf.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));

        let settings = SettingsLoader::new()
            .with_development()
            .with_optional_file("/nonexistent/mpconf.toml")
            .and_then(SettingsLoader::load)
            .unwrap();
        assert_eq!(settings, EngineSettings::development());
    }

    #[test]
    fn test_optional_file_still_reports_parse_errors() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, "{{ not json").unwrap();
        assert!(matches!(
            SettingsLoader::new().with_optional_file(file.path()),
            Err(ConfigError::Parse { format: SettingsFormat::Json, .. })
        ));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_overrides() {
        let settings = SettingsLoader::new()
            .with_env_vars([
                ("MPCONF__VALIDATION__REQUIRED_VALUE__SEVERITY", "error"),
                ("MPCONF__VALIDATION__UNKNOWN__EXCLUDED", "a.*, b.c ,"),
                ("MPCONF__VALIDATION__ENABLED", "false"),
                ("MPCONF__LOGGING__FORMAT", "Pretty"),
                ("MPCONF__LOGGING__LEVEL", "trace"),
                ("MPCONF__SOMETHING__ELSE", "ignored"),
            ])
            .load()
            .unwrap();

        assert_eq!(settings.validation.required_value.severity, Severity::Error);
        assert_eq!(settings.validation.unknown.excluded, vec!["a.*", "b.c"]);
        assert!(!settings.validation.enabled);
        assert_eq!(settings.logging.format, LogFormat::Pretty);
        assert_eq!(settings.logging.level, "trace");
    }

    #[test]
    fn test_invalid_overrides() {
        for (name, value) in [
            ("MPCONF__VALIDATION__UNKNOWN__SEVERITY", "loud"),
            ("MPCONF__VALIDATION__NOPE__SEVERITY", "error"),
            ("MPCONF__VALIDATION__ENABLED", "maybe"),
            ("MPCONF__LOGGING__FORMAT", "xml"),
        ] {
            let err = SettingsLoader::new()
                .with_env_vars([(name, value)])
                .load()
                .unwrap_err();
            assert!(
                matches!(&err, ConfigError::EnvParseError { var, .. } if var == name),
                "{name}: {err}"
            );
        }
    }
}
