//! Error types of the settings loader and of config sources.

use std::path::PathBuf;

use thiserror::Error;

use crate::loader::SettingsFormat;

/// Failure to load or validate [`EngineSettings`](crate::EngineSettings).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The settings file does not exist.
    #[error("settings file {path} does not exist")]
    FileNotFound {
        /// Missing path.
        path: PathBuf,
    },

    /// The settings file exists but could not be read.
    #[error("cannot read settings file {path}")]
    ReadError {
        /// Path of the file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The settings could not be deserialized.
    #[error("malformed {format} settings in {origin}: {reason}")]
    Parse {
        /// Format the content was read as.
        format: SettingsFormat,
        /// File path, or `<string>` for inline content.
        origin: String,
        /// Deserializer message.
        reason: String,
    },

    /// Neither TOML nor JSON.
    #[error("unsupported settings format '{0}' (expected toml or json)")]
    UnsupportedFormat(String),

    /// A field holds a value outside its domain.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted path of the field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An override variable could not be applied.
    #[error("environment variable {var}: {reason}")]
    EnvParseError {
        /// Variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The settings are inconsistent as a whole.
    #[error("invalid settings: {0}")]
    ValidationError(String),
}

impl ConfigError {
    pub(crate) fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub(crate) fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(
        format: SettingsFormat,
        origin: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::Parse {
            format,
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

/// Failure while loading a config source.
///
/// Never surfaced to callers: a source that fails to load is logged and
/// treated as empty.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The backing file could not be read.
    #[error("cannot read config source {path}")]
    Io {
        /// Path of the backing file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The backing YAML file is malformed.
    #[error("malformed YAML config source: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_culprit() {
        let err = ConfigError::file_not_found("/etc/mpconf.toml");
        assert_eq!(err.to_string(), "settings file /etc/mpconf.toml does not exist");

        let err = ConfigError::invalid_value("validation.unknown.severity", "unknown severity 'loud'");
        assert_eq!(
            err.to_string(),
            "validation.unknown.severity: unknown severity 'loud'"
        );

        let err = ConfigError::env_parse_error("MPCONF__VALIDATION__ENABLED", "expected a boolean");
        assert!(err.to_string().starts_with("environment variable MPCONF__VALIDATION__ENABLED"));
    }

    #[test]
    fn test_parse_error_mentions_format_and_origin() {
        let err = ConfigError::parse(SettingsFormat::Toml, "mpconf.toml", "expected `=`");
        assert_eq!(
            err.to_string(),
            "malformed toml settings in mpconf.toml: expected `=`"
        );
    }

    #[test]
    fn test_source_io_error_names_path() {
        let err = SourceError::Io {
            path: PathBuf::from("application.properties"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("application.properties"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
