//! Logging setup for mpconf.
//!
//! mpconf crates emit `tracing` events: config sources that fail to load are
//! reported at `warn`, cancelled passes at `debug`. This crate wires those
//! events to stdout as JSON lines or human-readable text, driven by the
//! `[logging]` section of the engine settings.
//!
//! # Example
//!
//! ```rust,ignore
//! use mpconf_config::SettingsLoader;
//! use mpconf_telemetry::{init_logging, LogConfig};
//!
//! let settings = SettingsLoader::new().with_env_prefix("MPCONF").load()?;
//! init_logging(&LogConfig::from(&settings.logging))?;
//! ```

#![doc(html_root_url = "https://docs.rs/mpconf-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, subscriber, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
