//! Depth-bounded traversal that grows an [`IssueGraph`].
//!
//! # Algorithm
//!
//! Expanding a node fetches its links, keeps the ones matching the relation
//! rules and merges them:
//!
//! 1. Each followed link is appended to the node's upstream or downstream
//!    list unless an equal `(target, direction, type)` link is present.
//! 2. Targets not yet in the graph become nodes with unknown links, one
//!    level below the expanded node.
//! 3. The inverse link is appended to the target's opposite list.
//! 4. The node is marked `links_known` and its display flags are set for the
//!    followed directions.
//!
//! The targets of links added by this call, in followed directions, form the
//! frontier. Frontier nodes are expanded concurrently at the depth of the
//! expanding call plus one, or one past their own depth if that is larger.
//! The pass stops at calls whose depth exceeds `max_depth`. A call depth is
//! always greater than the depth of the node it expands, so every new node
//! stays within the bound.
//!
//! # Concurrency
//!
//! During a pass the graph sits behind a `tokio::sync::Mutex`. The only
//! suspension points are the link fetches; the merge of one node runs under
//! a single lock acquisition, so inserting a newly discovered node is atomic
//! with respect to sibling branches.
//!
//! # Failures
//!
//! A failed fetch aborts the subtree of that node. Sibling branches run to
//! completion, then the first error is returned. Everything merged before
//! the failure stays in the graph.

use super::IssueGraph;
use crate::domain::{FollowDirection, FollowDirections, IssueId, IssueInfo, IssueLink};
use crate::error::{Error, Result};
use crate::fields::issue_from_raw;
use crate::relations::Relations;
use crate::settings::{FieldSettings, Settings};
use crate::source::{IssueSource, RawIssue, RawIssueLink};
use futures::future::{BoxFuture, FutureExt, join_all};
use std::collections::HashSet;
use tokio::sync::{Mutex, Semaphore};

/// Parameters of one traversal pass.
#[derive(Debug, Clone)]
pub struct TraversalOptions {
    /// Largest depth any discovered node may carry
    pub max_depth: u32,

    /// Which links to follow and how to classify them
    pub relations: Relations,

    /// Directions to expand
    pub follow: FollowDirections,

    /// Field names extracted for discovered nodes
    pub fields: FieldSettings,

    /// Upper bound on in-flight link fetches, unbounded if `None`
    pub fetch_concurrency: Option<usize>,
}

impl TraversalOptions {
    /// Create options with unbounded fetch concurrency.
    pub fn new(
        max_depth: u32,
        relations: Relations,
        follow: FollowDirections,
        fields: FieldSettings,
    ) -> Self {
        Self {
            max_depth,
            relations,
            follow,
            fields,
            fetch_concurrency: None,
        }
    }

    /// Options taken from user settings.
    pub fn from_settings(settings: &Settings, follow: FollowDirections) -> Self {
        Self::new(
            settings.max_recursion_depth,
            settings.relations(),
            follow,
            settings.field_settings(),
        )
    }

    /// Bound the number of in-flight link fetches.
    #[must_use]
    pub fn with_fetch_concurrency(mut self, limit: usize) -> Self {
        self.fetch_concurrency = Some(limit.max(1));
        self
    }
}

/// One link candidate taken from a raw link list.
struct Candidate<'r> {
    side: FollowDirection,
    link: IssueLink,
    target: &'r RawIssue,
}

/// Shared state of one traversal pass.
struct Pass<'a> {
    source: &'a dyn IssueSource,
    graph: Mutex<IssueGraph>,
    opts: &'a TraversalOptions,
    permits: Option<Semaphore>,
}

impl Pass<'_> {
    fn expand_node(&self, id: IssueId, depth: u32) -> BoxFuture<'_, Result<()>> {
        async move {
            if depth > self.opts.max_depth {
                return Ok(());
            }

            let raw_links = match self.fetch_links(&id).await {
                Ok(links) => links,
                Err(e) => {
                    tracing::warn!(issue = %id, depth, error = %e, "Failed to fetch links");
                    return Err(e);
                }
            };

            let frontier = {
                let mut graph = self.graph.lock().await;
                merge_links(&mut graph, &id, depth, &raw_links, self.opts)
            };

            tracing::debug!(
                issue = %id,
                depth,
                links = raw_links.iter().map(|l| l.issues.len()).sum::<usize>(),
                frontier = frontier.len(),
                "Expanded issue"
            );

            let results = join_all(
                frontier
                    .into_iter()
                    .map(|(next, next_depth)| self.expand_node(next, next_depth)),
            )
            .await;
            results.into_iter().collect()
        }
        .boxed()
    }

    async fn fetch_links(&self, id: &IssueId) -> Result<Vec<RawIssueLink>> {
        let _permit = match &self.permits {
            Some(permits) => Some(permits.acquire().await.map_err(|e| Error::Fetch {
                id: id.clone(),
                message: e.to_string(),
            })?),
            None => None,
        };
        self.source.fetch_issue_links(id).await
    }
}

/// Merge the raw links of `id` into the graph.
///
/// `depth` is the depth of the expanding call. Returns the frontier: targets
/// of newly added links in followed directions, paired with the depth to
/// expand them at.
fn merge_links(
    graph: &mut IssueGraph,
    id: &IssueId,
    depth: u32,
    raw_links: &[RawIssueLink],
    opts: &TraversalOptions,
) -> Vec<(IssueId, u32)> {
    let Some((source_readable, child_depth)) = graph
        .get(id)
        .map(|issue| (issue.id_readable.clone(), issue.depth + 1))
    else {
        return Vec::new();
    };

    let candidates = raw_links
        .iter()
        .filter(|raw| opts.relations.is_followed(raw.direction, &raw.link_type.name))
        .flat_map(|raw| {
            let side = opts.relations.classify(raw.direction, &raw.link_type.name);
            raw.issues.iter().map(move |target| Candidate {
                side,
                link: IssueLink {
                    target_id: target.id.clone(),
                    target_id_readable: target.display_id(),
                    link_type: raw.link_type.name.clone(),
                    direction: raw.direction,
                    target_to_source: raw.link_type.target_to_source.clone(),
                    source_to_target: raw.link_type.source_to_target.clone(),
                },
                target,
            })
        });

    let mut seen = HashSet::new();
    let mut frontier = Vec::new();
    for candidate in candidates {
        let target_id = candidate.link.target_id.clone();
        let mirror = candidate.link.mirrored(id, &source_readable);

        let added = graph
            .get_mut(id)
            .is_some_and(|issue| issue.add_link(candidate.side, candidate.link));

        if !graph.contains(&target_id) {
            graph.insert(issue_from_raw(candidate.target, &opts.fields, child_depth));
        }

        if let Some(target) = graph.get_mut(&target_id) {
            target.add_link(candidate.side.opposite(), mirror);
        }

        if added
            && opts.follow.contains(candidate.side)
            && target_id != *id
            && seen.insert(target_id.clone())
        {
            let target_depth = graph.get(&target_id).map_or(child_depth, |t| t.depth);
            frontier.push((target_id, depth.max(target_depth) + 1));
        }
    }

    if let Some(issue) = graph.get_mut(id) {
        issue.links_known = true;
        for direction in opts.follow.iter() {
            issue.set_shows(direction, true);
        }
    }

    frontier
}

/// Expand `id` at `current_depth`, merging everything found into `graph`.
///
/// `current_depth` is raised to at least the node's depth plus one. Does
/// nothing if it exceeds `opts.max_depth`.
///
/// The pass works on a copy that is written back when it finishes, so
/// `graph` is left as it was if the future is dropped early.
///
/// # Errors
///
/// Returns `Error::IssueNotFound` if `id` is not in the graph, or the first
/// fetch error of the pass. The graph keeps what was merged before a failure.
pub async fn expand(
    source: &dyn IssueSource,
    graph: &mut IssueGraph,
    id: &IssueId,
    current_depth: u32,
    opts: &TraversalOptions,
) -> Result<()> {
    let Some(issue) = graph.get(id) else {
        return Err(Error::IssueNotFound(id.clone()));
    };
    let current_depth = current_depth.max(issue.depth + 1);

    let pass = Pass {
        source,
        graph: Mutex::new(graph.clone()),
        opts,
        permits: opts.fetch_concurrency.map(Semaphore::new),
    };
    let result = pass.expand_node(id.clone(), current_depth).await;
    *graph = pass.graph.into_inner();
    result
}

/// Build the graph of `root` from scratch.
///
/// # Errors
///
/// Returns the first fetch error of the pass.
pub async fn fetch_deps(
    source: &dyn IssueSource,
    root: IssueInfo,
    opts: &TraversalOptions,
) -> Result<IssueGraph> {
    let root_id = root.id.clone();
    let depth = root.depth + 1;
    let mut graph = IssueGraph::with_root(root);

    tracing::info!(issue = %root_id, max_depth = opts.max_depth, "Fetching dependencies");
    expand(source, &mut graph, &root_id, depth, opts).await?;
    Ok(graph)
}

/// Expand one more level from `id`, returning a new graph.
///
/// The node is expanded at its own depth plus one, and the depth bound is
/// raised to at least that value, so the node is always expanded. The input
/// graph is not modified.
///
/// Unknown ids are logged and yield an unchanged copy of `graph`.
///
/// # Errors
///
/// Returns the first fetch error of the pass.
pub async fn extend(
    source: &dyn IssueSource,
    graph: &IssueGraph,
    id: &IssueId,
    opts: &TraversalOptions,
) -> Result<IssueGraph> {
    let Some(issue) = graph.get(id) else {
        tracing::warn!(issue = %id, "Cannot extend unknown issue");
        return Ok(graph.clone());
    };

    let depth = issue.depth + 1;
    let opts = TraversalOptions {
        max_depth: opts.max_depth.max(depth),
        ..opts.clone()
    };

    let mut next = graph.clone();
    expand(source, &mut next, id, depth, &opts).await?;
    Ok(next)
}
