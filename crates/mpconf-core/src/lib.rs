//! # mpconf Core
//!
//! Core types shared by every mpconf crate:
//!
//! - [`PropertyItem`], [`Hint`] and [`MetadataSnapshot`] - property metadata
//!   discovered from compiled classes or sources
//! - [`PropertiesDocument`] - a parsed `.properties` document with stable
//!   property identities and byte ranges
//! - [`PropertyExpression`] - a `${...}` reference found in a property value
//! - [`CancelChecker`] - cooperative cancellation for long passes
//!
//! # Example
//!
//! ```
//! use mpconf_core::PropertiesDocument;
//!
//! let doc = PropertiesDocument::parse(
//!     "application.properties",
//!     "greeting.message=hello\n%dev.greeting.message=hello ${user}\n",
//! );
//!
//! assert_eq!(doc.properties().len(), 2);
//! let dev = &doc.properties()[1];
//! assert_eq!(dev.profile(), Some("dev"));
//! assert_eq!(dev.name(), "greeting.message");
//! assert_eq!(dev.expressions()[0].referenced_name(), "user");
//! ```

#![doc(html_root_url = "https://docs.rs/mpconf-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cancel;
pub mod document;
pub mod metadata;

pub use cancel::{CancelChecker, Cancelled, CancellationToken, NeverCancelled};
pub use document::{
    scan_expressions, split_profile, PropertiesDocument, Property, PropertyExpression,
    PropertyValue, TextRange,
};
pub use metadata::{
    find_placeholder, ConverterKind, Hint, HintLookup, ItemType, MetadataDocument,
    MetadataSnapshot, Placeholder, PropertyItem, ValueHint,
};
