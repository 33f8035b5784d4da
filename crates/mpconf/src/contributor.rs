//! Metadata contributors.
//!
//! A contributor adds items and hints to a project's metadata on every
//! update. Contributors run in registration order, after the binary and source
//! metadata have been merged and before dynamic items are expanded, so the
//! hints they add feed the expansion.

use mpconf_core::{Hint, PropertyItem};

use crate::project::ProjectSnapshot;

/// Items and hints added to a project by a [`MetadataContributor`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataDelta {
    /// Additional items, static or dynamic.
    pub items: Vec<PropertyItem>,
    /// Additional hints. Values of hints that already exist are merged.
    pub hints: Vec<Hint>,
}

impl MetadataDelta {
    /// Creates an empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item.
    pub fn with_item(mut self, item: PropertyItem) -> Self {
        self.items.push(item);
        self
    }

    /// Adds a hint.
    pub fn with_hint(mut self, hint: Hint) -> Self {
        self.hints.push(hint);
        self
    }

    /// Whether the delta adds nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.hints.is_empty()
    }

    pub(crate) fn extend(&mut self, other: MetadataDelta) {
        self.items.extend(other.items);
        self.hints.extend(other.hints);
    }
}

/// Adds metadata to a project.
///
/// `contribute` receives the snapshot being built: its
/// [`metadata`](ProjectSnapshot::metadata) holds the merged binary and source
/// metadata without any contribution or generated item yet.
///
/// # Example
///
/// ```
/// use mpconf::{MetadataContributor, MetadataDelta, ProjectSnapshot};
/// use mpconf_core::{Hint, ValueHint};
///
/// /// Declares the channels found by scanning `@Incoming` annotations.
/// struct Channels(Vec<String>);
///
/// impl MetadataContributor for Channels {
///     fn name(&self) -> &str {
///         "channels"
///     }
///
///     fn applies(&self, snapshot: &ProjectSnapshot) -> bool {
///         snapshot.metadata().items().iter().any(|item| item.is_dynamic())
///     }
///
///     fn contribute(&self, _snapshot: &ProjectSnapshot) -> MetadataDelta {
///         let hint = self.0.iter().fold(Hint::new("${channel}"), |hint, channel| {
///             hint.with_value(ValueHint::new(channel.as_str()))
///         });
///         MetadataDelta::new().with_hint(hint)
///     }
/// }
/// ```
pub trait MetadataContributor: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether the contributor has something to add to this project.
    fn applies(&self, snapshot: &ProjectSnapshot) -> bool;

    /// Items and hints to add.
    fn contribute(&self, snapshot: &ProjectSnapshot) -> MetadataDelta;
}
