//! Relation rules.
//!
//! A relation spec is a comma-separated list of `<DIRECTION>:<type>` entries,
//! e.g. `"OUTWARD:Subtask, INWARD:Depend"`. Rules decide which tracker links
//! the traversal follows and whether a followed link is upstream or
//! downstream.
//!
//! Parsing is lenient: an entry with an unknown direction token or without a
//! colon becomes a rule that never matches. Use [`RelationRule::is_valid`] to
//! reject such entries instead.

use crate::domain::{DirectionType, FollowDirection};
use std::fmt;

/// One `{direction, type}` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRule {
    /// Parsed direction, `None` if the token was not a known direction
    pub direction: Option<DirectionType>,

    /// Direction token as written, trimmed
    pub direction_token: String,

    /// Link type name, compared case-insensitively
    pub link_type: String,
}

impl RelationRule {
    /// Create a rule from a known direction.
    pub fn new(direction: DirectionType, link_type: impl Into<String>) -> Self {
        Self {
            direction: Some(direction),
            direction_token: direction.to_string(),
            link_type: link_type.into(),
        }
    }

    /// Returns `true` if the rule can match anything.
    pub fn is_valid(&self) -> bool {
        self.direction.is_some() && !self.link_type.is_empty()
    }

    /// Returns `true` if a link with `direction` and `link_type` matches this rule.
    pub fn matches(&self, direction: DirectionType, link_type: &str) -> bool {
        self.direction == Some(direction)
            && !self.link_type.is_empty()
            && self.link_type.to_lowercase() == link_type.to_lowercase()
    }
}

impl fmt::Display for RelationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.direction_token, self.link_type)
    }
}

/// Parse a relation spec.
///
/// Empty or missing input yields no rules. Blank entries are skipped.
pub fn parse_relation_spec(text: Option<&str>) -> Vec<RelationRule> {
    let Some(text) = text else {
        return Vec::new();
    };

    text.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (token, link_type) = entry.split_once(':').unwrap_or((entry, ""));
            let token = token.trim();
            let rule = RelationRule {
                direction: token.parse().ok(),
                direction_token: token.to_ascii_uppercase(),
                link_type: link_type.trim().to_string(),
            };
            if !rule.is_valid() {
                tracing::warn!(entry, "Relation rule will never match");
            }
            rule
        })
        .collect()
}

/// Returns `true` if any rule matches the link.
pub fn matches_rule(direction: DirectionType, link_type: &str, rules: &[RelationRule]) -> bool {
    rules.iter().any(|rule| rule.matches(direction, link_type))
}

/// Classify a followed link: upstream iff it matches an upstream rule.
pub fn classify_direction(
    direction: DirectionType,
    link_type: &str,
    upstream_rules: &[RelationRule],
) -> FollowDirection {
    if matches_rule(direction, link_type, upstream_rules) {
        FollowDirection::Upstream
    } else {
        FollowDirection::Downstream
    }
}

/// Upstream and downstream rule lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relations {
    /// Rules for links the issue depends on
    pub upstream: Vec<RelationRule>,

    /// Rules for links depending on the issue
    pub downstream: Vec<RelationRule>,
}

impl Relations {
    /// Parse both rule lists from relation specs.
    pub fn parse(upstream: Option<&str>, downstream: Option<&str>) -> Self {
        Self {
            upstream: parse_relation_spec(upstream),
            downstream: parse_relation_spec(downstream),
        }
    }

    /// Returns `true` if the link matches the union of both rule lists.
    pub fn is_followed(&self, direction: DirectionType, link_type: &str) -> bool {
        matches_rule(direction, link_type, &self.upstream)
            || matches_rule(direction, link_type, &self.downstream)
    }

    /// Side of a followed link.
    pub fn classify(&self, direction: DirectionType, link_type: &str) -> FollowDirection {
        classify_direction(direction, link_type, &self.upstream)
    }

    /// Entries that can never match.
    pub fn invalid_rules(&self) -> impl Iterator<Item = &RelationRule> {
        self.upstream
            .iter()
            .chain(&self.downstream)
            .filter(|rule| !rule.is_valid())
    }
}
