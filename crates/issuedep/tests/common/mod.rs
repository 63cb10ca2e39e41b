//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use issuedep::domain::{DirectionType, FollowDirections, IssueId, IssueInfo};
use issuedep::graph::TraversalOptions;
use issuedep::relations::Relations;
use issuedep::settings::FieldSettings;
use issuedep::source::{RawIssue, RawLinkType};

/// Upstream relation spec used by the fixtures.
pub const UPSTREAM: &str = "OUTWARD:Depend, OUTWARD:Subtask, BOTH:Relates";

/// Downstream relation spec used by the fixtures.
pub const DOWNSTREAM: &str = "INWARD:Depend, INWARD:Subtask";

/// Internal id of fixture issue `n`.
pub fn id(n: usize) -> IssueId {
    IssueId::new(format!("1-{n}"))
}

/// Core record of fixture issue `n`, readable as `PROJ-<n>`.
pub fn raw_issue(n: usize) -> RawIssue {
    RawIssue {
        id: id(n),
        id_readable: Some(format!("PROJ-{n}")),
        summary: format!("Issue {n}"),
        resolved: false,
        is_draft: false,
        custom_fields: Vec::new(),
    }
}

/// Root node built from fixture issue `n`.
pub fn root(n: usize) -> IssueInfo {
    let mut root = IssueInfo::new(id(n), format!("PROJ-{n}"), 0);
    root.summary = format!("Issue {n}");
    root
}

/// The "Depend" link type.
pub fn depend() -> RawLinkType {
    RawLinkType {
        name: "Depend".into(),
        source_to_target: "depends on".into(),
        target_to_source: "is required for".into(),
        directed: true,
        aggregation: false,
    }
}

/// The "Subtask" link type.
pub fn subtask() -> RawLinkType {
    RawLinkType {
        name: "Subtask".into(),
        source_to_target: "parent for".into(),
        target_to_source: "subtask of".into(),
        directed: true,
        aggregation: true,
    }
}

/// The non-directed "Relates" link type.
pub fn relates() -> RawLinkType {
    RawLinkType {
        name: "Relates".into(),
        source_to_target: "relates to".into(),
        target_to_source: "relates to".into(),
        directed: false,
        aggregation: false,
    }
}

/// Traversal options over the fixture relations.
pub fn options(max_depth: u32, follow: FollowDirections) -> TraversalOptions {
    TraversalOptions::new(
        max_depth,
        Relations::parse(Some(UPSTREAM), Some(DOWNSTREAM)),
        follow,
        FieldSettings::default(),
    )
}

/// Direction a fixture relation is declared with.
pub fn declared_direction(link_type: &RawLinkType) -> DirectionType {
    if link_type.directed {
        DirectionType::Outward
    } else {
        DirectionType::Both
    }
}
