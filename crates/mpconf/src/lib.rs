//! # mpconf
//!
//! **Resolution and validation engine for MicroProfile / Quarkus configuration**
//!
//! mpconf reads `application.properties` documents the way the runtime will:
//!
//! - **Config sources** - properties files, YAML, environment variables and
//!   system properties, each with an ordinal, reloaded when their file changes
//! - **Expressions** - `${name}` and `${name:default}` references resolved
//!   through the document, the config sources and metadata defaults, with
//!   cycle detection and per-profile variants
//! - **Dynamic metadata** - templates like `quarkus.datasource.${ds}.url`
//!   expanded once the hint values are known
//! - **Diagnostics** - syntax, duplicate, unknown, value, required and
//!   expression checks with configurable severities
//!
//! This crate ties them together per project: [`ProjectInfo`] holds the
//! metadata aggregate and [`ProjectRegistry`] the open projects.
//!
//! ## Quick Start
//!
//! ```
//! use mpconf::prelude::*;
//!
//! let registry = ProjectRegistry::new();
//! let project = registry.open("demo", ProjectOptions::new());
//! project.info().update(
//!     MetadataOrigin::Binary,
//!     vec![PropertyItem::new("quarkus.http.port").with_type("int")],
//!     vec![],
//! );
//!
//! let doc = PropertiesDocument::parse("application.properties", "quarkus.http.port=http\n");
//! let outcome = project.validate(&doc, &ValidationRules::default(), &NeverCancelled);
//! let diagnostics = outcome.diagnostics().unwrap_or_default();
//! assert_eq!(diagnostics[0].code(), "value");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! binary / source metadata ──► ProjectInfo ──► ProjectSnapshot (metadata + generated items)
//!                                                    │
//! PropertiesDocument ──► PropertyGraph ──► PropertyResolver ◄── ConfigSourceChain
//!                                                    │
//!                                                Validator ──► Diagnostic
//! ```

#![doc(html_root_url = "https://docs.rs/mpconf/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod contributor;
mod project;
mod registry;

pub use contributor::{MetadataContributor, MetadataDelta};
pub use project::{MetadataOrigin, ProjectInfo, ProjectSnapshot};
pub use registry::{Project, ProjectOptions, ProjectRegistry};

// Re-export core types
pub use mpconf_core as core;

// Re-export config sources and settings
pub use mpconf_config as config;

// Re-export the engine
pub use mpconf_engine as engine;

// Re-export logging setup
pub use mpconf_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use mpconf::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        MetadataContributor, MetadataDelta, MetadataOrigin, Project, ProjectInfo,
        ProjectOptions, ProjectRegistry, ProjectSnapshot,
    };

    // Re-export the document and metadata model
    pub use mpconf_core::{
        CancelChecker, CancellationToken, Hint, MetadataSnapshot, NeverCancelled,
        PropertiesDocument, PropertyItem, ValueHint,
    };

    // Re-export config sources and settings
    pub use mpconf_config::{
        ConfigSource, ConfigSourceChain, ConfigSourceProvider, EngineSettings, EnvConfigSource,
        MapConfigSource, Severity, SettingsLoader, ValidationCategory, ValidationRules,
    };

    // Re-export the engine
    pub use mpconf_engine::{
        expand, Diagnostic, PropertyGraph, PropertyResolver, ResolvedVariant, ValidationOutcome,
        Validator, ValueOrigin,
    };

    // Re-export logging setup
    pub use mpconf_telemetry::{init_logging, LogConfig};
}
