//! Configuration sources.
//!
//! A [`ConfigSource`] contributes `key -> value` pairs. File-backed sources
//! load lazily and reload whenever the backing file's modification time
//! changes. A source that cannot be read or parsed behaves as an empty
//! source: the failure is logged, never returned.
//!
//! Sources are combined by a [`ConfigSourceChain`], which answers lookups in
//! declaration order.

mod chain;
mod env;
mod file;
mod properties;
mod provider;
mod yaml;

use std::collections::BTreeSet;
use std::fmt;

pub use chain::{ConfigSourceChain, ProfileVariant, PropertyLookup};
pub use env::{EnvConfigSource, MapConfigSource};
pub use properties::{parse_properties, PropertiesConfigSource};
pub use provider::ConfigSourceProvider;
pub use yaml::YamlConfigSource;

/// Key a source may define to override its own ordinal.
pub const CONFIG_ORDINAL_KEY: &str = "config_ordinal";

/// Default ordinal of a source.
pub const DEFAULT_ORDINAL: i32 = 100;
/// Default ordinal of `microprofile-config-<profile>.properties`.
pub const PROFILE_PROPERTIES_ORDINAL: i32 = 101;
/// Default ordinal of Quarkus `application.properties`.
pub const APPLICATION_PROPERTIES_ORDINAL: i32 = 250;
/// Default ordinal of `application.yaml`.
pub const YAML_ORDINAL: i32 = 255;
/// Default ordinal of environment variables.
pub const ENV_ORDINAL: i32 = 300;
/// Default ordinal of system properties.
pub const SYSTEM_PROPERTIES_ORDINAL: i32 = 400;

/// One backing store of configuration values.
pub trait ConfigSource: Send + Sync + fmt::Debug {
    /// Identifier of the backing store (file path, `env`, ...).
    fn source_id(&self) -> &str;

    /// Value of a key exactly as stored (profile prefix included).
    fn get_property(&self, key: &str) -> Option<String>;

    /// Value of a key parsed as an integer.
    fn get_property_as_int(&self, key: &str) -> Option<i64> {
        self.get_property(key).and_then(|v| v.trim().parse().ok())
    }

    /// Every key the source defines.
    fn get_all_keys(&self) -> BTreeSet<String>;

    /// Ordinal used when the source does not define [`CONFIG_ORDINAL_KEY`].
    fn default_ordinal(&self) -> i32;

    /// Effective ordinal: [`CONFIG_ORDINAL_KEY`] if defined, else the default.
    fn get_ordinal(&self) -> i32 {
        self.get_property_as_int(CONFIG_ORDINAL_KEY)
            .and_then(|v| i32::try_from(v).ok())
            .unwrap_or_else(|| self.default_ordinal())
    }

    /// Profile every key of this source is scoped to.
    fn get_profile(&self) -> Option<&str>;
}
