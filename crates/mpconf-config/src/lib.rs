//! Configuration sources and engine settings for mpconf.
//!
//! This crate provides two things:
//!
//! - The **config source layer**: [`ConfigSource`] implementations for
//!   `.properties` files, YAML files, environment variables and in-memory
//!   maps, combined by a [`ConfigSourceChain`]. File-backed sources load
//!   lazily, reload when the file's modification time changes and read as
//!   empty when the file is missing or malformed.
//! - The **engine settings**: [`EngineSettings`] (validation severities per
//!   category, exclusion patterns, logging) loaded by [`SettingsLoader`] from
//!   defaults, TOML/JSON files and environment variables.
//!
//! # Example
//!
//! ```
//! use mpconf_config::{ConfigSourceChain, MapConfigSource, SettingsLoader};
//!
//! let chain = ConfigSourceChain::new()
//!     .with_source(MapConfigSource::system_properties([("quarkus.http.port", "9000")]));
//! assert_eq!(chain.get_property_as_int("quarkus.http.port"), Some(9000));
//!
//! let settings = SettingsLoader::new().load().unwrap();
//! assert!(settings.validation.enabled);
//! ```
//!
//! # Settings File Format
//!
//! ```toml
//! [validation]
//! enabled = true
//! source = "mpconf"
//!
//! [validation.unknown]
//! severity = "warning"
//! excluded = ["quarkus.dev.*"]
//!
//! [validation.value]
//! severity = "error"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `MPCONF__VALIDATION__ENABLED=false`
//! - `MPCONF__VALIDATION__DUPLICATE__SEVERITY=error`
//! - `MPCONF__VALIDATION__UNKNOWN__EXCLUDED=quarkus.dev.*,mp.jwt.*`
//! - `MPCONF__LOGGING__LEVEL=debug`

#![doc(html_root_url = "https://docs.rs/mpconf-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;
pub mod source;

pub use config::*;
pub use error::{ConfigError, SourceError};
pub use loader::{SettingsFormat, SettingsLoader};
pub use schema::*;
pub use source::{
    parse_properties, ConfigSource, ConfigSourceChain, ConfigSourceProvider, EnvConfigSource,
    MapConfigSource, ProfileVariant, PropertiesConfigSource, PropertyLookup, YamlConfigSource,
};
