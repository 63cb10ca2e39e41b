//! The dependency graph container.
//!
//! [`IssueGraph`] maps issue ids to nodes. Nodes sit behind `Arc`, so
//! cloning a graph is a shallow copy of the id map; a node is deep-copied
//! only when it is mutated through the clone (`Arc::make_mut`). Consumers
//! holding an old graph never observe changes made to a new one.
//!
//! ## Edge Direction Convention
//!
//! Every node stores its own directed link lists. A link in `upstream_links`
//! of A pointing at B means B is something A depends on. The mirrored link
//! sits in `downstream_links` of B, pointing back at A with the inverse
//! direction.

use crate::domain::{FollowDirection, IssueId, IssueInfo};
use serde::Serialize;
use serde::ser::Serializer;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub mod traversal;

pub use traversal::{TraversalOptions, expand, extend, fetch_deps};

/// Issue count and depth of a graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    /// Number of issues
    pub count: usize,
    /// Largest depth of any issue
    pub max_depth: u32,
}

/// Id-to-node map built incrementally by the traversal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueGraph {
    issues: HashMap<IssueId, Arc<IssueInfo>>,
}

impl IssueGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph holding only `root`.
    pub fn with_root(root: IssueInfo) -> Self {
        let mut graph = Self::new();
        graph.insert(root);
        graph
    }

    /// Node by id.
    pub fn get(&self, id: &IssueId) -> Option<&IssueInfo> {
        self.issues.get(id).map(Arc::as_ref)
    }

    /// Mutable node by id, detaching it from other graphs sharing it.
    pub fn get_mut(&mut self, id: &IssueId) -> Option<&mut IssueInfo> {
        self.issues.get_mut(id).map(Arc::make_mut)
    }

    /// Returns `true` if the graph holds `id`.
    pub fn contains(&self, id: &IssueId) -> bool {
        self.issues.contains_key(id)
    }

    /// Insert `issue` unless a node with its id exists.
    ///
    /// Returns `true` if the node was inserted. Existing nodes are never
    /// replaced, so their depth and exploration state are kept.
    pub fn insert(&mut self, issue: IssueInfo) -> bool {
        if self.issues.contains_key(&issue.id) {
            return false;
        }
        self.issues.insert(issue.id.clone(), Arc::new(issue));
        true
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Iterate over nodes in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &IssueInfo> {
        self.issues.values().map(Arc::as_ref)
    }

    /// Nodes ordered by depth, then by id.
    pub fn sorted_by_depth(&self) -> Vec<&IssueInfo> {
        let mut issues: Vec<&IssueInfo> = self.iter().collect();
        issues.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.id.cmp(&b.id)));
        issues
    }

    /// The root node (depth 0), if present.
    pub fn root(&self) -> Option<&IssueInfo> {
        self.iter().find(|issue| issue.is_root())
    }

    /// Issue count and largest depth.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            count: self.len(),
            max_depth: self.iter().map(|issue| issue.depth).max().unwrap_or(0),
        }
    }

    /// Returns `true` if both graphs share the same node allocation for `id`.
    pub fn shares_node(&self, other: &IssueGraph, id: &IssueId) -> bool {
        match (self.issues.get(id), other.issues.get(id)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// A copy of the graph with one display flag of `id` changed.
    ///
    /// Unknown ids leave the copy unchanged.
    #[must_use]
    pub fn with_shows(&self, id: &IssueId, direction: FollowDirection, value: bool) -> Self {
        let mut next = self.clone();
        match next.get_mut(id) {
            Some(issue) => issue.set_shows(direction, value),
            None => tracing::warn!(issue = %id, "Cannot toggle links of unknown issue"),
        }
        next
    }

    /// A copy of the graph with `showUpstream` of `id` set to `value`.
    #[must_use]
    pub fn set_show_upstream(&self, id: &IssueId, value: bool) -> Self {
        self.with_shows(id, FollowDirection::Upstream, value)
    }

    /// A copy of the graph with `showDownstream` of `id` set to `value`.
    #[must_use]
    pub fn set_show_downstream(&self, id: &IssueId, value: bool) -> Self {
        self.with_shows(id, FollowDirection::Downstream, value)
    }
}

impl Serialize for IssueGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ordered: BTreeMap<&IssueId, &IssueInfo> = self
            .issues
            .iter()
            .map(|(id, issue)| (id, issue.as_ref()))
            .collect();
        ordered.serialize(serializer)
    }
}

impl FromIterator<IssueInfo> for IssueGraph {
    fn from_iter<I: IntoIterator<Item = IssueInfo>>(iter: I) -> Self {
        let mut graph = Self::new();
        for issue in iter {
            graph.insert(issue);
        }
        graph
    }
}
