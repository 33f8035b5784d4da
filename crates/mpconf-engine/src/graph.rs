//! Dependency graph between the properties of one document.
//!
//! Nodes are property keys as written (`%dev.` prefix included). An edge
//! `a -> b` means the value of `a` contains `${b}`. Edges are only added
//! between keys the document assigns: references to anything else are left
//! to the validator.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use mpconf_core::{CancelChecker, Cancelled, NeverCancelled, PropertiesDocument};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, Reversed};

/// Directed graph of `${...}` references.
///
/// Built fresh for each pass over a document and dropped afterwards.
///
/// # Example
///
/// ```
/// use mpconf_core::PropertiesDocument;
/// use mpconf_engine::PropertyGraph;
///
/// let doc = PropertiesDocument::parse("a.properties", "a=${b}\nb=${c}\nc=value\n");
/// let graph = PropertyGraph::build(&doc);
///
/// assert!(graph.is_acyclic());
/// assert_eq!(graph.get_independent_properties("b"), vec!["c".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PropertyGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
    acyclic: OnceLock<bool>,
}

impl PropertyGraph {
    /// Builds the graph of a document.
    #[must_use]
    pub fn build(document: &PropertiesDocument) -> Self {
        match Self::build_cancellable(document, &NeverCancelled) {
            Ok(graph) => graph,
            Err(Cancelled) => Self::default(),
        }
    }

    /// Builds the graph, checking for cancellation once per property in each
    /// pass.
    pub fn build_cancellable(
        document: &PropertiesDocument,
        cancel: &dyn CancelChecker,
    ) -> Result<Self, Cancelled> {
        let mut graph = Self::default();

        for property in document.properties() {
            cancel.check()?;
            let key = property.key();
            if key.trim().is_empty() || graph.nodes.contains_key(key) {
                continue;
            }
            let index = graph.graph.add_node(key.to_string());
            graph.nodes.insert(key.to_string(), index);
        }

        for property in document.properties() {
            cancel.check()?;
            let Some(&source) = graph.nodes.get(property.key()) else {
                continue;
            };
            for expression in property.expressions() {
                if let Some(&target) = graph.nodes.get(expression.referenced_name()) {
                    graph.graph.update_edge(source, target, ());
                }
            }
        }

        tracing::trace!(
            uri = document.uri(),
            nodes = graph.graph.node_count(),
            edges = graph.graph.edge_count(),
            "Built property graph"
        );
        Ok(graph)
    }

    /// Whether `name` (profile included) is a node.
    #[must_use]
    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Whether `from` directly references `to`.
    #[must_use]
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.nodes.get(from), self.nodes.get(to)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the graph has no cycle. Self-references count as cycles.
    ///
    /// Computed on first call and cached.
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        *self
            .acyclic
            .get_or_init(|| !is_cyclic_directed(&self.graph))
    }

    /// Nodes that do not depend on `name`, directly or transitively, in
    /// insertion order.
    ///
    /// These are the properties `name` can reference without closing a
    /// cycle. `name` itself is never part of the result.
    #[must_use]
    pub fn get_independent_properties(&self, name: &str) -> Vec<String> {
        let mut dependents = HashSet::new();
        if let Some(&start) = self.nodes.get(name) {
            let reversed = Reversed(&self.graph);
            let mut bfs = Bfs::new(reversed, start);
            while let Some(node) = bfs.next(reversed) {
                dependents.insert(node);
            }
        }

        self.graph
            .node_indices()
            .filter(|index| !dependents.contains(index))
            .map(|index| self.graph[index].clone())
            .collect()
    }
}
