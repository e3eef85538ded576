//! Resource graph - the ordered output of one resolution

use crate::lifecycle::LifecycleState;
use crate::resource::{ResourceDecl, ResourceKind, ResourceRef};
use serde::Serialize;

/// An ordered collection of declarations plus their notify edges
///
/// Graphs are rebuilt on every resolution and carry no state of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceGraph {
    /// Module the graph was compiled for
    pub module: String,
    /// Lifecycle state the graph reflects
    pub state: LifecycleState,
    resources: Vec<ResourceDecl>,
    /// External classes requested for inclusion
    includes: Vec<String>,
}

/// A notify edge between two declarations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: ResourceRef,
    pub to: ResourceRef,
}

impl ResourceGraph {
    /// Create a new empty graph
    pub fn new(module: impl Into<String>, state: LifecycleState) -> Self {
        Self {
            module: module.into(),
            state,
            resources: Vec::new(),
            includes: Vec::new(),
        }
    }

    /// Append a declaration, replacing an earlier one with the same reference
    pub fn push(&mut self, resource: ResourceDecl) {
        let reference = resource.reference();
        if let Some(existing) = self.resources.iter_mut().find(|r| r.reference() == reference) {
            *existing = resource;
        } else {
            self.resources.push(resource);
        }
    }

    /// Request inclusion of an external class
    pub fn add_include(&mut self, class: String) {
        if !self.includes.contains(&class) {
            self.includes.push(class);
        }
    }

    pub fn resources(&self) -> &[ResourceDecl] {
        &self.resources
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    /// Find a declaration by kind and id
    pub fn get(&self, kind: ResourceKind, id: &str) -> Option<&ResourceDecl> {
        self.resources.iter().find(|r| r.kind == kind && r.id == id)
    }

    /// All declarations of one kind, in order
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ResourceDecl> {
        self.resources.iter().filter(move |r| r.kind == kind)
    }

    /// Notify edges, in declaration order
    pub fn edges(&self) -> Vec<Edge> {
        self.resources
            .iter()
            .filter_map(|r| {
                r.notifies.as_ref().map(|to| Edge {
                    from: r.reference(),
                    to: to.clone(),
                })
            })
            .collect()
    }

    /// Filter graph to only include declarations matching a predicate
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ResourceDecl) -> bool,
    {
        self.resources.retain(|r| predicate(r));
        self
    }

    /// Filter graph to only include declarations matching a target pattern
    ///
    /// Target format: "kind" or "kind.id"
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (kind, name) = parse_target(t);
                self.filter(|r| matches_filter(r, kind.as_deref(), name.as_deref()))
            }
        }
    }

    /// Total number of declarations
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Parse a target string like "kind.id" into (kind, id)
///
/// Ids may themselves contain dots (`file.nginx.conf`), so only the
/// first dot separates the kind.
fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    match target.split_once('.') {
        None => (Some(target.to_string()), None),
        Some((kind, name)) if ResourceKind::parse(kind).is_some() => {
            (Some(kind.to_string()), Some(name.to_string()))
        }
        Some(_) => (None, Some(target.to_string())),
    }
}

/// Check if a declaration matches the filter criteria
fn matches_filter(resource: &ResourceDecl, kind: Option<&str>, name: Option<&str>) -> bool {
    if let Some(k) = kind {
        // Unknown kinds match nothing
        if ResourceKind::parse(k) != Some(resource.kind) {
            return false;
        }
    }

    if let Some(n) = name
        && !resource.id.contains(n)
    {
        return false;
    }

    true
}
