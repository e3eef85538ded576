//! Diff computation between two resource graphs

use crate::graph::ResourceGraph;
use crate::resource::{ResourceDecl, ResourceKind, ResourceRef};
use crate::types::AttrValue;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// How a declaration changed between two graphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

/// One attribute that differs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttrChange {
    pub key: String,
    pub from: Option<AttrValue>,
    pub to: Option<AttrValue>,
}

/// A diff between the same declaration in two graphs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDiff {
    pub resource: ResourceRef,
    pub change: ChangeKind,
    /// Attribute changes; for additions and removals every attribute is listed
    pub attributes: Vec<AttrChange>,
    /// Notify target before and after, when it changed
    pub notify: Option<(Option<ResourceRef>, Option<ResourceRef>)>,
}

impl ResourceDiff {
    /// Compare two optional declarations, returning None if they are identical
    pub fn between(before: Option<&ResourceDecl>, after: Option<&ResourceDecl>) -> Option<Self> {
        let (resource, change) = match (before, after) {
            (None, None) => return None,
            (None, Some(a)) => (a.reference(), ChangeKind::Added),
            (Some(b), None) => (b.reference(), ChangeKind::Removed),
            (Some(b), Some(a)) if b == a => return None,
            (Some(b), Some(_)) => (b.reference(), ChangeKind::Modified),
        };

        let empty = BTreeMap::new();
        let before_attrs = before.map_or(&empty, |d| &d.attributes);
        let after_attrs = after.map_or(&empty, |d| &d.attributes);
        let keys: BTreeSet<&String> = before_attrs.keys().chain(after_attrs.keys()).collect();

        let attributes = keys
            .into_iter()
            .filter_map(|key| {
                let from = before_attrs.get(key);
                let to = after_attrs.get(key);
                (from != to).then(|| AttrChange {
                    key: key.clone(),
                    from: from.cloned(),
                    to: to.cloned(),
                })
            })
            .collect();

        let notify_before = before.and_then(|d| d.notifies.clone());
        let notify_after = after.and_then(|d| d.notifies.clone());
        let notify = (notify_before != notify_after).then_some((notify_before, notify_after));

        Some(Self {
            resource,
            change,
            attributes,
            notify,
        })
    }

    pub fn is_addition(&self) -> bool {
        self.change == ChangeKind::Added
    }

    pub fn is_removal(&self) -> bool {
        self.change == ChangeKind::Removed
    }

    pub fn is_modification(&self) -> bool {
        self.change == ChangeKind::Modified
    }
}

/// Compute diffs between two graphs
///
/// Declarations are matched by reference. Output follows `after`'s order,
/// followed by declarations only present in `before`.
pub fn compute_diffs(before: &ResourceGraph, after: &ResourceGraph) -> Vec<ResourceDiff> {
    let mut diffs: Vec<ResourceDiff> = after
        .resources()
        .iter()
        .filter_map(|a| ResourceDiff::between(before.get(a.kind, &a.id), Some(a)))
        .collect();

    diffs.extend(
        before
            .resources()
            .iter()
            .filter(|b| after.get(b.kind, &b.id).is_none())
            .filter_map(|b| ResourceDiff::between(Some(b), None)),
    );

    diffs
}

/// Classes included by one graph but not the other
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IncludeChanges {
    /// Classes only `after` includes, in `after`'s order
    pub added: Vec<String>,
    /// Classes only `before` includes, in `before`'s order
    pub removed: Vec<String>,
}

impl IncludeChanges {
    pub fn between(before: &ResourceGraph, after: &ResourceGraph) -> Self {
        let only_in = |graph: &ResourceGraph, other: &ResourceGraph| {
            graph
                .includes()
                .iter()
                .filter(|class| !other.includes().contains(class))
                .cloned()
                .collect()
        };
        Self {
            added: only_in(after, before),
            removed: only_in(before, after),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    /// Number of declarations added
    pub additions: usize,
    /// Number of declarations removed
    pub removals: usize,
    /// Number of declarations modified
    pub modifications: usize,
    /// Number of classes newly included
    pub includes_added: usize,
    /// Number of classes no longer included
    pub includes_removed: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[ResourceDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            match diff.change {
                ChangeKind::Added => summary.additions += 1,
                ChangeKind::Removed => summary.removals += 1,
                ChangeKind::Modified => summary.modifications += 1,
            }
        }
        summary
    }

    /// Count include changes alongside the declaration changes
    pub fn with_includes(mut self, includes: &IncludeChanges) -> Self {
        self.includes_added = includes.added.len();
        self.includes_removed = includes.removed.len();
        self
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions
            + self.removals
            + self.modifications
            + self.includes_added
            + self.includes_removed
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Group diffs by resource kind
pub fn group_by_kind(diffs: &[ResourceDiff]) -> BTreeMap<ResourceKind, Vec<&ResourceDiff>> {
    let mut groups: BTreeMap<ResourceKind, Vec<&ResourceDiff>> = BTreeMap::new();
    for diff in diffs {
        groups.entry(diff.resource.kind).or_default().push(diff);
    }
    groups
}
