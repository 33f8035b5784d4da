//! Structured logging for mpconf.
//!
//! Every mpconf crate logs through `tracing`. Embedders that do not install
//! their own subscriber can call [`init_logging`] once at startup, or build a
//! scoped one with [`subscriber`].
//!
//! # Example
//!
//! ```rust,ignore
//! use mpconf_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(project = "demo", "Project opened");
//! ```

use mpconf_config::{LogFormat, LoggingSettings};
use tracing::Subscriber;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// How log events are rendered and filtered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Install nothing when `false`.
    pub enabled: bool,
    /// `EnvFilter` directive (`info`, `mpconf_engine=debug,warn`, ...).
    pub level: String,
    /// JSON lines when `true`, multi-line human output otherwise.
    pub json_format: bool,
    /// Emit an event when a span opens and closes.
    pub span_events: bool,
    /// Include source file and line.
    pub file_line_info: bool,
    /// Include the emitting thread id.
    pub thread_ids: bool,
    /// Include the module path.
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Pretty output at `debug`, with spans and source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            thread_ids: true,
            include_target: true,
        }
    }

    /// JSON lines at `info`.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
        }
    }
}

impl From<&LoggingSettings> for LogConfig {
    fn from(settings: &LoggingSettings) -> Self {
        let base = match settings.format {
            LogFormat::Json => Self::production(),
            LogFormat::Pretty => Self::development(),
        };
        Self {
            enabled: settings.enabled,
            level: settings.level.clone(),
            ..base
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn fmt_layer(config: &LogConfig) -> BoxedLayer {
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let layer = tracing_subscriber::fmt::layer()
        .with_span_events(span_events)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_thread_ids(config.thread_ids)
        .with_target(config.include_target);

    if config.json_format {
        layer.json().boxed()
    } else {
        layer.pretty().boxed()
    }
}

/// Builds a subscriber for `config` without installing it.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for a bad level directive.
pub fn subscriber(config: &LogConfig) -> TelemetryResult<impl Subscriber + Send + Sync + 'static> {
    let filter = create_env_filter(&config.level)?;
    Ok(tracing_subscriber::registry().with(fmt_layer(config).with_filter(filter)))
}

/// Installs the global subscriber. Does nothing when logging is disabled.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for a bad level directive and
/// [`TelemetryError::LoggingInit`] if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }
    subscriber(config)?
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Parses a filter directive such as `info` or `mpconf_config=debug,warn`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] if the directive is malformed.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter {
        filter: filter.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let production = LogConfig::default();
        assert!(production.json_format);
        assert!(!production.thread_ids);
        assert_eq!(production.level, "info");

        let development = LogConfig::development();
        assert!(!development.json_format);
        assert!(development.span_events);
        assert_eq!(development.level, "debug");
    }

    #[test]
    fn test_from_settings_keeps_level() {
        let settings = LoggingSettings {
            enabled: true,
            level: "mpconf_engine=trace".to_string(),
            format: LogFormat::Pretty,
        };
        let config = LogConfig::from(&settings);
        assert!(!config.json_format);
        assert!(config.file_line_info);
        assert_eq!(config.level, "mpconf_engine=trace");

        let config = LogConfig::from(&LoggingSettings::default());
        assert!(config.json_format);
        assert!(config.enabled);
    }

    #[test]
    fn test_filter_directives() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("mpconf_config=debug,warn").is_ok());
        assert!(matches!(
            create_env_filter("mpconf_engine=loud"),
            Err(TelemetryError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn test_scoped_subscriber_accepts_events() {
        for config in [LogConfig::production(), LogConfig::development()] {
            let subscriber = subscriber(&config).unwrap();
            tracing::subscriber::with_default(subscriber, || {
                let span = tracing::info_span!("validate", uri = "application.properties");
                let _entered = span.enter();
                tracing::info!(diagnostics = 2, "Validated document");
            });
        }
    }

    #[test]
    fn test_disabled_logging_installs_nothing() {
        let config = LogConfig {
            enabled: false,
            level: "not a = valid directive".to_string(),
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_ok());
    }
}
