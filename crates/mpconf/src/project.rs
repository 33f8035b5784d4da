//! Per-project metadata aggregate.
//!
//! Metadata of a project arrives from two independent triggers: a refresh of
//! the compiled classes (binary metadata) and a refresh of the Java sources
//! (source metadata). Each trigger replaces its own subset. Every update
//! builds a new immutable [`ProjectSnapshot`] (merged items and hints,
//! contributions, freshly expanded dynamic items) and swaps it in atomically,
//! so readers always see one whole snapshot.

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use mpconf_core::{Hint, MetadataSnapshot, PropertyItem};
use parking_lot::{ReentrantMutex, RwLock};

use crate::contributor::{MetadataContributor, MetadataDelta};

/// Which subset of a project's metadata an update replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataOrigin {
    /// Metadata read from compiled classes and JARs.
    Binary,
    /// Metadata read from Java sources.
    Source,
}

impl MetadataOrigin {
    const fn is_binary(self) -> bool {
        matches!(self, Self::Binary)
    }
}

/// Immutable view of a project's metadata at one point in time.
#[derive(Debug, Clone, Default)]
pub struct ProjectSnapshot {
    version: u64,
    items: Vec<PropertyItem>,
    hints: Vec<Hint>,
    contributed: MetadataDelta,
    generated: Vec<PropertyItem>,
    metadata: MetadataSnapshot,
}

impl ProjectSnapshot {
    /// Builds the snapshot of `items` and `hints` as reported by the binary
    /// and source triggers.
    fn build(
        version: u64,
        items: Vec<PropertyItem>,
        hints: Vec<Hint>,
        contributors: &[Arc<dyn MetadataContributor>],
    ) -> Self {
        let mut snapshot = Self {
            version,
            metadata: MetadataSnapshot::new(items.clone(), merge_hints(&hints)),
            items,
            hints,
            contributed: MetadataDelta::default(),
            generated: Vec::new(),
        };

        let mut contributed = MetadataDelta::default();
        for contributor in contributors {
            if contributor.applies(&snapshot) {
                let delta = contributor.contribute(&snapshot);
                tracing::trace!(
                    contributor = contributor.name(),
                    items = delta.items.len(),
                    hints = delta.hints.len(),
                    "Metadata contributed"
                );
                contributed.extend(delta);
            }
        }

        let all_hints: Vec<Hint> = snapshot
            .hints
            .iter()
            .chain(&contributed.hints)
            .cloned()
            .collect();
        let hints = merge_hints(&all_hints);
        let (dynamic_items, mut items): (Vec<PropertyItem>, Vec<PropertyItem>) = snapshot
            .items
            .iter()
            .chain(&contributed.items)
            .cloned()
            .partition(PropertyItem::is_dynamic);
        let generated = mpconf_engine::expand(&items, &dynamic_items, hints.as_slice());

        items.extend(dynamic_items);
        items.extend(generated.iter().cloned());
        snapshot.metadata = MetadataSnapshot::new(items, hints);
        snapshot.contributed = contributed;
        snapshot.generated = generated;
        snapshot
    }

    /// Number of updates applied so far; `0` for an empty project.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Complete metadata: static items, templates, generated items and
    /// merged hints.
    pub fn metadata(&self) -> &MetadataSnapshot {
        &self.metadata
    }

    /// Items as reported by the binary and source triggers.
    pub fn reported_items(&self) -> &[PropertyItem] {
        &self.items
    }

    /// Hints as reported by the binary and source triggers, unmerged.
    pub fn reported_hints(&self) -> &[Hint] {
        &self.hints
    }

    /// What the contributors added.
    pub fn contributed(&self) -> &MetadataDelta {
        &self.contributed
    }

    /// Items generated from dynamic templates.
    pub fn generated_items(&self) -> &[PropertyItem] {
        &self.generated
    }
}

/// Merges hints sharing a name, deduplicating their values.
fn merge_hints(hints: &[Hint]) -> Vec<Hint> {
    let mut merged: Vec<Hint> = Vec::with_capacity(hints.len());
    for hint in hints {
        match merged.iter_mut().find(|m| m.name == hint.name) {
            Some(existing) => existing.merge_values(hint),
            None => {
                let mut first = Hint {
                    values: Vec::with_capacity(hint.values.len()),
                    ..hint.clone()
                };
                first.merge_values(hint);
                merged.push(first);
            }
        }
    }
    merged
}

/// Metadata of one project.
///
/// Readers call [`snapshot`](Self::snapshot) and never block. Updates are
/// serialized by one writer lock per project; an update started while the
/// same thread is already updating (a contributor calling back into the
/// project, for instance) is ignored and returns `false`.
///
/// # Example
///
/// ```
/// use mpconf::{MetadataOrigin, ProjectInfo};
/// use mpconf_core::{Hint, PropertyItem, ValueHint};
///
/// let project = ProjectInfo::new("demo");
/// project.update(
///     MetadataOrigin::Binary,
///     vec![PropertyItem::new("quarkus.datasource.${ds}.url")],
///     vec![],
/// );
/// project.update(
///     MetadataOrigin::Source,
///     vec![],
///     vec![Hint::new("${ds}").with_value(ValueHint::new("users"))],
/// );
///
/// let snapshot = project.snapshot();
/// assert_eq!(snapshot.version(), 2);
/// assert!(snapshot.metadata().get("quarkus.datasource.users.url").is_some());
/// ```
pub struct ProjectInfo {
    id: String,
    snapshot: ArcSwap<ProjectSnapshot>,
    writer: ReentrantMutex<Cell<bool>>,
    contributors: RwLock<Vec<Arc<dyn MetadataContributor>>>,
}

impl ProjectInfo {
    /// Creates a project without metadata.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            snapshot: ArcSwap::from_pointee(ProjectSnapshot::default()),
            writer: ReentrantMutex::new(Cell::new(false)),
            contributors: RwLock::new(Vec::new()),
        }
    }

    /// Project identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<ProjectSnapshot> {
        self.snapshot.load_full()
    }

    /// Registers a contributor and rebuilds the snapshot with it.
    pub fn register_contributor(&self, contributor: Arc<dyn MetadataContributor>) {
        tracing::debug!(
            project = %self.id,
            contributor = contributor.name(),
            "Registering metadata contributor"
        );
        self.contributors.write().push(contributor);
        self.refresh();
    }

    /// Number of registered contributors.
    pub fn contributor_count(&self) -> usize {
        self.contributors.read().len()
    }

    /// Replaces the `origin` subset of items and hints.
    ///
    /// Items and hints are tagged with `origin` whatever their `binary` flag
    /// says. Returns `false` when the call re-entered an update in progress.
    pub fn update(
        &self,
        origin: MetadataOrigin,
        items: Vec<PropertyItem>,
        hints: Vec<Hint>,
    ) -> bool {
        let binary = origin.is_binary();
        self.apply(|current| {
            let items = current
                .items
                .iter()
                .filter(|item| item.binary != binary)
                .cloned()
                .chain(items.into_iter().map(|mut item| {
                    item.binary = binary;
                    item
                }))
                .collect();
            let hints = current
                .hints
                .iter()
                .filter(|hint| hint.binary != binary)
                .cloned()
                .chain(hints.into_iter().map(|mut hint| {
                    hint.binary = binary;
                    hint
                }))
                .collect();
            (items, hints)
        })
    }

    /// Rebuilds the snapshot from the current reported metadata, re-running
    /// contributors and expansion.
    pub fn refresh(&self) -> bool {
        self.apply(|current| (current.items.clone(), current.hints.clone()))
    }

    fn apply<F>(&self, next_input: F) -> bool
    where
        F: FnOnce(&ProjectSnapshot) -> (Vec<PropertyItem>, Vec<Hint>),
    {
        let guard = self.writer.lock();
        if guard.replace(true) {
            tracing::debug!(project = %self.id, "Ignoring re-entrant metadata update");
            return false;
        }
        let _updating = UpdatingFlag(&guard);

        let current = self.snapshot.load_full();
        let (items, hints) = next_input(&current);
        let contributors = self.contributors.read().clone();
        let next = ProjectSnapshot::build(current.version + 1, items, hints, &contributors);
        tracing::debug!(
            project = %self.id,
            version = next.version,
            items = next.metadata.len(),
            generated = next.generated.len(),
            "Project metadata updated"
        );
        self.snapshot.store(Arc::new(next));
        true
    }
}

impl fmt::Debug for ProjectInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectInfo")
            .field("id", &self.id)
            .field("version", &self.snapshot.load().version)
            .field("contributors", &self.contributor_count())
            .finish_non_exhaustive()
    }
}

/// Clears the in-update flag, also when a contributor panics.
struct UpdatingFlag<'a>(&'a Cell<bool>);

impl Drop for UpdatingFlag<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpconf_core::ValueHint;

    fn channel_template() -> PropertyItem {
        PropertyItem::new("mp.messaging.incoming.${channel}.connector").with_type("java.lang.String")
    }

    fn channels(values: &[&str]) -> Hint {
        values
            .iter()
            .fold(Hint::new("${channel}"), |hint, v| hint.with_value(ValueHint::new(*v)))
    }

    fn names(items: &[PropertyItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_empty_project() {
        let project = ProjectInfo::new("p");
        assert_eq!(project.id(), "p");
        let snapshot = project.snapshot();
        assert_eq!(snapshot.version(), 0);
        assert!(snapshot.metadata().is_empty());
    }

    #[test]
    fn test_update_replaces_only_its_origin() {
        let project = ProjectInfo::new("p");
        project.update(MetadataOrigin::Binary, vec![PropertyItem::new("quarkus.http.port")], vec![]);
        project.update(MetadataOrigin::Source, vec![PropertyItem::new("greeting.message")], vec![]);
        project.update(MetadataOrigin::Source, vec![PropertyItem::new("greeting.name")], vec![]);

        let snapshot = project.snapshot();
        assert_eq!(snapshot.version(), 3);
        assert_eq!(names(snapshot.reported_items()), ["quarkus.http.port", "greeting.name"]);
        assert!(snapshot.reported_items()[0].binary);
        assert!(!snapshot.reported_items()[1].binary);
        assert!(snapshot.metadata().get("greeting.message").is_none());
    }

    #[test]
    fn test_hints_from_both_origins_are_merged() {
        let project = ProjectInfo::new("p");
        project.update(MetadataOrigin::Binary, vec![], vec![channels(&["prices", "orders"])]);
        project.update(MetadataOrigin::Source, vec![], vec![channels(&["orders", "alerts", "alerts"])]);

        let snapshot = project.snapshot();
        assert_eq!(snapshot.reported_hints().len(), 2);
        assert_eq!(snapshot.metadata().hints().len(), 1);
        let values: Vec<_> = snapshot.metadata().hints()[0]
            .values
            .iter()
            .map(|v| v.value.as_str())
            .collect();
        assert_eq!(values, ["prices", "orders", "alerts"]);
    }

    #[test]
    fn test_update_re_expands_dynamic_items() {
        let project = ProjectInfo::new("p");
        project.update(MetadataOrigin::Binary, vec![channel_template()], vec![]);
        project.update(MetadataOrigin::Source, vec![], vec![channels(&["prices", "orders"])]);
        assert_eq!(
            names(project.snapshot().generated_items()),
            [
                "mp.messaging.incoming.prices.connector",
                "mp.messaging.incoming.orders.connector"
            ]
        );

        project.update(MetadataOrigin::Source, vec![], vec![channels(&["orders"])]);
        let snapshot = project.snapshot();
        assert_eq!(names(snapshot.generated_items()), ["mp.messaging.incoming.orders.connector"]);
        assert!(snapshot.metadata().get("mp.messaging.incoming.prices.connector").is_none());
        assert!(snapshot.metadata().get(&channel_template().name).is_some());
    }

    struct FixedContributor(MetadataDelta);

    impl MetadataContributor for FixedContributor {
        fn applies(&self, snapshot: &ProjectSnapshot) -> bool {
            snapshot
                .metadata()
                .items()
                .iter()
                .any(PropertyItem::is_dynamic)
        }

        fn contribute(&self, _snapshot: &ProjectSnapshot) -> MetadataDelta {
            self.0.clone()
        }
    }

    #[test]
    fn test_contributor_hints_feed_expansion() {
        let project = ProjectInfo::new("p");
        project.register_contributor(Arc::new(FixedContributor(
            MetadataDelta::new()
                .with_hint(channels(&["audit"]))
                .with_item(PropertyItem::new("acme.enabled")),
        )));
        assert!(project.snapshot().contributed().is_empty());

        project.update(MetadataOrigin::Binary, vec![channel_template()], vec![]);
        let snapshot = project.snapshot();
        assert_eq!(snapshot.contributed().items.len(), 1);
        assert!(snapshot.metadata().get("acme.enabled").is_some());
        assert_eq!(names(snapshot.generated_items()), ["mp.messaging.incoming.audit.connector"]);
    }

    #[test]
    fn test_registering_contributor_rebuilds_snapshot() {
        let project = ProjectInfo::new("p");
        project.update(MetadataOrigin::Binary, vec![channel_template()], vec![]);
        assert!(project.snapshot().generated_items().is_empty());

        project.register_contributor(Arc::new(FixedContributor(
            MetadataDelta::new().with_hint(channels(&["audit"])),
        )));
        assert_eq!(project.contributor_count(), 1);
        assert_eq!(project.snapshot().generated_items().len(), 1);
        assert_eq!(project.snapshot().version(), 2);
    }

    #[test]
    fn test_debug_output() {
        let project = ProjectInfo::new("demo");
        let debug = format!("{project:?}");
        assert!(debug.contains("demo"));
        assert!(debug.contains("version: 0"));
    }
}
