//! Open projects and their config sources.
//!
//! The registry is owned by the embedding application. It maps project
//! identifiers to [`Project`]s, each holding its metadata aggregate and a
//! lazily discovered [`ConfigSourceChain`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use mpconf_config::{ConfigSource, ConfigSourceChain, ConfigSourceProvider, ValidationRules};
use mpconf_core::{CancelChecker, PropertiesDocument};
use mpconf_engine::{PropertyGraph, PropertyResolver, ResolvedVariant, ValidationOutcome, Validator};
use parking_lot::RwLock;

use crate::project::ProjectInfo;

/// How a project finds its config sources.
#[derive(Clone, Default)]
pub struct ProjectOptions {
    resources_dir: Option<PathBuf>,
    profiles: Vec<String>,
    sources: Vec<Arc<dyn ConfigSource>>,
}

impl ProjectOptions {
    /// Options without resources directory or extra sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory scanned for `application.properties` and friends.
    pub fn resources_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resources_dir = Some(dir.into());
        self
    }

    /// Adds a profile whose profile-specific files are discovered.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profiles.push(profile.into());
        self
    }

    /// Adds a source declared before the discovered files, such as system
    /// properties or the environment.
    pub fn source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }
}

impl std::fmt::Debug for ProjectOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectOptions")
            .field("resources_dir", &self.resources_dir)
            .field("profiles", &self.profiles)
            .field("sources", &self.sources.len())
            .finish()
    }
}

/// An open project.
#[derive(Debug)]
pub struct Project {
    info: ProjectInfo,
    options: ProjectOptions,
    chain: RwLock<Option<Arc<ConfigSourceChain>>>,
}

impl Project {
    fn new(id: String, options: ProjectOptions) -> Self {
        Self {
            info: ProjectInfo::new(id),
            options,
            chain: RwLock::new(None),
        }
    }

    /// Project identifier.
    pub fn id(&self) -> &str {
        self.info.id()
    }

    /// Metadata aggregate.
    pub fn info(&self) -> &ProjectInfo {
        &self.info
    }

    /// Resources directory, if any.
    pub fn resources_dir(&self) -> Option<&Path> {
        self.options.resources_dir.as_deref()
    }

    /// Config sources of the project, discovered on first use.
    pub fn config_sources(&self) -> Arc<ConfigSourceChain> {
        if let Some(chain) = self.chain.read().as_ref() {
            return Arc::clone(chain);
        }
        let mut slot = self.chain.write();
        if let Some(chain) = slot.as_ref() {
            return Arc::clone(chain);
        }
        let chain = Arc::new(self.discover());
        *slot = Some(Arc::clone(&chain));
        chain
    }

    fn discover(&self) -> ConfigSourceChain {
        let mut chain = ConfigSourceChain::new();
        for source in &self.options.sources {
            chain.push(Arc::clone(source));
        }
        if let Some(dir) = &self.options.resources_dir {
            let profiles: Vec<&str> = self.options.profiles.iter().map(String::as_str).collect();
            for source in ConfigSourceProvider::discover(dir, &profiles).sources() {
                chain.push(Arc::clone(source));
            }
        }
        tracing::debug!(project = %self.id(), sources = chain.len(), "Config sources discovered");
        chain
    }

    /// Drops the cached config sources; the next use discovers them again.
    pub fn invalidate_config_sources(&self) {
        self.chain.write().take();
    }

    /// Validates `document` against the current metadata and config sources.
    pub fn validate(
        &self,
        document: &PropertiesDocument,
        rules: &ValidationRules,
        cancel: &dyn CancelChecker,
    ) -> ValidationOutcome {
        let snapshot = self.info.snapshot();
        let chain = self.config_sources();
        Validator::new(snapshot.metadata(), rules)
            .with_sources(&chain)
            .with_cancel(cancel)
            .validate(document)
    }

    /// Resolves `key` of `document`, falling back to the config sources.
    pub fn resolve(&self, document: &PropertiesDocument, key: &str) -> Option<String> {
        let snapshot = self.info.snapshot();
        let chain = self.config_sources();
        let graph = PropertyGraph::build(document);
        PropertyResolver::new(document, &graph, snapshot.metadata())
            .with_sources(&chain)
            .resolve(key)
    }

    /// Every profile variant of the bare property `name`.
    pub fn resolve_profiles(&self, document: &PropertiesDocument, name: &str) -> Vec<ResolvedVariant> {
        let snapshot = self.info.snapshot();
        let chain = self.config_sources();
        let graph = PropertyGraph::build(document);
        PropertyResolver::new(document, &graph, snapshot.metadata())
            .with_sources(&chain)
            .resolve_profiles(name)
    }
}

/// Open projects by identifier.
///
/// # Example
///
/// ```
/// use mpconf::{ProjectOptions, ProjectRegistry};
///
/// let registry = ProjectRegistry::new();
/// let project = registry.open("demo", ProjectOptions::new());
/// assert_eq!(project.id(), "demo");
/// assert!(registry.get("demo").is_some());
///
/// registry.close("demo");
/// assert!(registry.get("demo").is_none());
/// ```
#[derive(Debug, Default)]
pub struct ProjectRegistry {
    projects: DashMap<String, Arc<Project>>,
}

impl ProjectRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a project. Opening an already open project returns it
    /// unchanged and ignores `options`.
    pub fn open(&self, id: impl Into<String>, options: ProjectOptions) -> Arc<Project> {
        let id = id.into();
        let entry = self.projects.entry(id.clone()).or_insert_with(|| {
            tracing::info!(project = %id, "Project opened");
            Arc::new(Project::new(id.clone(), options))
        });
        Arc::clone(entry.value())
    }

    /// Closes a project and returns it.
    pub fn close(&self, id: &str) -> Option<Arc<Project>> {
        let removed = self.projects.remove(id).map(|(_, project)| project);
        if removed.is_some() {
            tracing::info!(project = %id, "Project closed");
        }
        removed
    }

    /// An open project.
    pub fn get(&self, id: &str) -> Option<Arc<Project>> {
        self.projects.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Identifiers of the open projects, sorted.
    pub fn project_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.projects.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Number of open projects.
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Whether no project is open.
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Reacts to a created, changed or deleted file.
    ///
    /// When `path` is a config file inside the resources directory of a
    /// project, that project's cached config sources are dropped. Returns the
    /// number of projects affected.
    pub fn config_file_changed(&self, path: impl AsRef<Path>) -> usize {
        let path = path.as_ref();
        if !ConfigSourceProvider::is_config_file(path) {
            return 0;
        }
        let mut affected = 0;
        for entry in &self.projects {
            let project = entry.value();
            if project.resources_dir().is_some_and(|dir| path.starts_with(dir)) {
                project.invalidate_config_sources();
                affected += 1;
            }
        }
        if affected > 0 {
            tracing::debug!(path = %path.display(), projects = affected, "Config sources evicted");
        }
        affected
    }
}
