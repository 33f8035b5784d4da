//! # mpconf Engine
//!
//! Resolution and validation of MicroProfile / Quarkus configuration.
//!
//! - [`PropertyGraph`] - `${...}` reference graph of one document, with cycle
//!   detection and reachability queries
//! - [`PropertyResolver`] - recursive, profile-aware expression resolution
//!   with config-source and metadata-default fallbacks
//! - [`expand`] - generation of concrete items from dynamic metadata
//!   templates
//! - [`Validator`] - metadata-driven diagnostics
//!
//! Nothing in this crate returns an error: load failures, structural issues
//! and semantic issues all end up as diagnostics or as unresolved values.
//! The only early exit is cooperative cancellation.
//!
//! # Example
//!
//! ```
//! use mpconf_config::ValidationRules;
//! use mpconf_core::{MetadataSnapshot, PropertiesDocument, PropertyItem};
//! use mpconf_engine::{PropertyGraph, PropertyResolver, Validator};
//!
//! let metadata = MetadataSnapshot::new(
//!     vec![PropertyItem::new("greeting.message"), PropertyItem::new("greeting.name")],
//!     vec![],
//! );
//! let doc = PropertiesDocument::parse(
//!     "application.properties",
//!     "greeting.name=world\ngreeting.message=hello ${greeting.name}\n",
//! );
//!
//! let graph = PropertyGraph::build(&doc);
//! let resolver = PropertyResolver::new(&doc, &graph, &metadata);
//! assert_eq!(resolver.resolve("greeting.message").as_deref(), Some("hello world"));
//!
//! let rules = ValidationRules::default();
//! let outcome = Validator::new(&metadata, &rules).validate(&doc);
//! assert_eq!(outcome.diagnostics().map(<[_]>::len), Some(0));
//! ```

#![doc(html_root_url = "https://docs.rs/mpconf-engine/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod expander;
mod graph;
mod resolver;
pub mod validator;

pub use expander::expand;
pub use graph::PropertyGraph;
pub use resolver::{PropertyResolver, ResolvedVariant, ValueOrigin};
pub use validator::{Diagnostic, ValidationOutcome, Validator};
