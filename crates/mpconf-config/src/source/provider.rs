//! Discovery of the standard configuration files of a project.

use std::path::Path;

use super::{
    ConfigSourceChain, PropertiesConfigSource, YamlConfigSource, APPLICATION_PROPERTIES_ORDINAL,
    DEFAULT_ORDINAL, PROFILE_PROPERTIES_ORDINAL,
};

/// Builds the config-source chain of a project's resources directory.
///
/// Sources are declared from highest to lowest default ordinal:
///
/// | File | Ordinal | Profile |
/// |------|---------|---------|
/// | `application.yaml`, `application.yml` | 255 | - |
/// | `application-<profile>.properties` | 250 | `<profile>` |
/// | `application.properties` | 250 | - |
/// | `META-INF/microprofile-config-<profile>.properties` | 101 | `<profile>` |
/// | `META-INF/microprofile-config.properties` | 100 | - |
///
/// Every source is declared even if its file does not exist yet: a missing
/// file reads as empty and is picked up once it is created.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigSourceProvider;

impl ConfigSourceProvider {
    /// Discovers the sources under `resources_dir` for the given profiles.
    ///
    /// # Example
    ///
    /// ```
    /// use mpconf_config::ConfigSourceProvider;
    ///
    /// let chain = ConfigSourceProvider::discover("src/main/resources", &["dev"]);
    /// assert_eq!(chain.len(), 6);
    /// ```
    pub fn discover(resources_dir: impl AsRef<Path>, profiles: &[&str]) -> ConfigSourceChain {
        let dir = resources_dir.as_ref();
        let meta_inf = dir.join("META-INF");
        let mut chain = ConfigSourceChain::new()
            .with_source(YamlConfigSource::new(dir.join("application.yaml")))
            .with_source(YamlConfigSource::new(dir.join("application.yml")));

        for profile in profiles {
            chain = chain.with_source(PropertiesConfigSource::with_profile(
                dir.join(format!("application-{profile}.properties")),
                *profile,
                APPLICATION_PROPERTIES_ORDINAL,
            ));
        }
        chain = chain.with_source(PropertiesConfigSource::new(
            dir.join("application.properties"),
            APPLICATION_PROPERTIES_ORDINAL,
        ));

        for profile in profiles {
            chain = chain.with_source(PropertiesConfigSource::with_profile(
                meta_inf.join(format!("microprofile-config-{profile}.properties")),
                *profile,
                PROFILE_PROPERTIES_ORDINAL,
            ));
        }
        chain = chain.with_source(PropertiesConfigSource::new(
            meta_inf.join("microprofile-config.properties"),
            DEFAULT_ORDINAL,
        ));

        tracing::debug!(
            resources = %dir.display(),
            sources = chain.len(),
            "Discovered config sources"
        );
        chain
    }

    /// Whether a file name is one of the configuration files this provider
    /// declares, for any profile.
    #[must_use]
    pub fn is_config_file(path: impl AsRef<Path>) -> bool {
        let Some(name) = path.as_ref().file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        name == "application.yaml"
            || name == "application.yml"
            || name == "application.properties"
            || name == "microprofile-config.properties"
            || (name.starts_with("application-") && name.ends_with(".properties"))
            || (name.starts_with("microprofile-config-") && name.ends_with(".properties"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigSource;

    #[test]
    fn test_declared_order_follows_ordinals() {
        let chain = ConfigSourceProvider::discover("/project/src/main/resources", &["dev"]);
        let ordinals: Vec<_> = chain.sources().iter().map(|s| s.default_ordinal()).collect();
        assert_eq!(ordinals, vec![255, 255, 250, 250, 101, 100]);
        assert_eq!(chain.sources()[2].get_profile(), Some("dev"));
        assert!(chain.sources()[3].get_profile().is_none());
    }

    #[test]
    fn test_missing_files_read_as_empty() {
        let chain = ConfigSourceProvider::discover("/nonexistent/resources", &[]);
        assert_eq!(chain.len(), 4);
        assert!(chain.get_all_keys().is_empty());
    }

    #[test]
    fn test_is_config_file() {
        assert!(ConfigSourceProvider::is_config_file("/a/application.properties"));
        assert!(ConfigSourceProvider::is_config_file("application-dev.properties"));
        assert!(ConfigSourceProvider::is_config_file(
            "META-INF/microprofile-config-test.properties"
        ));
        assert!(ConfigSourceProvider::is_config_file("application.yml"));
        assert!(!ConfigSourceProvider::is_config_file("pom.xml"));
    }
}
