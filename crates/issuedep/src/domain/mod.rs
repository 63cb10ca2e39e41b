//! Domain types for the dependency graph.
//!
//! This module contains the node, link and field-metadata types shared by
//! the traversal engine, the projection and the presentation adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Prefix shown instead of the readable id for draft issues.
pub const DRAFT_PREFIX: &str = "Draft";

/// Stable internal identifier of an issue
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(pub String);

impl IssueId {
    /// Create a new issue ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for IssueId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IssueId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Direction of a link as reported by the issue tracker.
///
/// `Both` models non-directed link types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DirectionType {
    /// Link seen from the target side of a directed relation
    Inward,
    /// Link seen from the source side of a directed relation
    Outward,
    /// Non-directed relation
    Both,
}

impl DirectionType {
    /// The direction the same relation has when seen from the other end.
    pub fn inverse(self) -> Self {
        match self {
            Self::Inward => Self::Outward,
            Self::Outward => Self::Inward,
            Self::Both => Self::Both,
        }
    }
}

impl fmt::Display for DirectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inward => write!(f, "INWARD"),
            Self::Outward => write!(f, "OUTWARD"),
            Self::Both => write!(f, "BOTH"),
        }
    }
}

impl FromStr for DirectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INWARD" => Ok(Self::Inward),
            "OUTWARD" => Ok(Self::Outward),
            "BOTH" => Ok(Self::Both),
            other => Err(format!("unknown link direction '{other}'")),
        }
    }
}

/// Which side of the graph a link belongs to, relative to its source issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowDirection {
    /// Relations the issue depends on
    Upstream,
    /// Relations that depend on the issue
    Downstream,
}

impl FollowDirection {
    /// The opposite side.
    pub fn opposite(self) -> Self {
        match self {
            Self::Upstream => Self::Downstream,
            Self::Downstream => Self::Upstream,
        }
    }

    /// Both directions, upstream first.
    pub const ALL: [FollowDirection; 2] = [Self::Upstream, Self::Downstream];
}

impl fmt::Display for FollowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream => write!(f, "upstream"),
            Self::Downstream => write!(f, "downstream"),
        }
    }
}

/// The set of directions a traversal expands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowDirections {
    /// Expand upstream links
    pub upstream: bool,
    /// Expand downstream links
    pub downstream: bool,
}

impl FollowDirections {
    /// Follow both directions.
    pub fn both() -> Self {
        Self::from_flags(true, true)
    }

    /// Build from two booleans.
    pub fn from_flags(upstream: bool, downstream: bool) -> Self {
        Self {
            upstream,
            downstream,
        }
    }

    /// Returns `true` if `direction` is part of the set.
    pub fn contains(self, direction: FollowDirection) -> bool {
        match direction {
            FollowDirection::Upstream => self.upstream,
            FollowDirection::Downstream => self.downstream,
        }
    }

    /// Add a direction to the set.
    #[must_use]
    pub fn with(mut self, direction: FollowDirection) -> Self {
        match direction {
            FollowDirection::Upstream => self.upstream = true,
            FollowDirection::Downstream => self.downstream = true,
        }
        self
    }

    /// Iterate over the contained directions, upstream first.
    pub fn iter(self) -> impl Iterator<Item = FollowDirection> {
        FollowDirection::ALL
            .into_iter()
            .filter(move |dir| self.contains(*dir))
    }
}

impl FromIterator<FollowDirection> for FollowDirections {
    fn from_iter<I: IntoIterator<Item = FollowDirection>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::default(), |set, direction| set.with(direction))
    }
}

/// One directed relation instance from the owning issue to `target_id`.
///
/// Within one link list a link is identified by `(target_id, direction, link_type)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLink {
    /// Internal id of the linked issue
    pub target_id: IssueId,

    /// Display id of the linked issue
    pub target_id_readable: String,

    /// Link type name (e.g. "Subtask")
    #[serde(rename = "type")]
    pub link_type: String,

    /// Direction of the relation as seen from the owning issue
    pub direction: DirectionType,

    /// Relation label used for inward links
    pub target_to_source: String,

    /// Relation label used for outward and non-directed links
    pub source_to_target: String,
}

impl IssueLink {
    /// Returns `true` if both links share target, direction and type.
    pub fn same_as(&self, other: &IssueLink) -> bool {
        self.target_id == other.target_id
            && self.direction == other.direction
            && self.link_type == other.link_type
    }

    /// Human readable relation name from the owning issue's point of view.
    pub fn label(&self) -> &str {
        match self.direction {
            DirectionType::Inward => &self.target_to_source,
            DirectionType::Outward | DirectionType::Both => &self.source_to_target,
        }
    }

    /// The inverse of this link, owned by the target and pointing back at `source`.
    pub fn mirrored(&self, source_id: &IssueId, source_id_readable: &str) -> IssueLink {
        IssueLink {
            target_id: source_id.clone(),
            target_id_readable: source_id_readable.to_string(),
            link_type: self.link_type.clone(),
            direction: self.direction.inverse(),
            target_to_source: self.target_to_source.clone(),
            source_to_target: self.source_to_target.clone(),
        }
    }
}

/// A duration field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuePeriod {
    /// Presentation text, e.g. "1w 2d"
    pub presentation: String,

    /// Duration in minutes
    pub minutes: i64,
}

/// A version-like field value (sprints, builds, releases).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionValue {
    /// Version name
    pub name: String,

    /// Start date, if scheduled
    pub start_date: Option<DateTime<Utc>>,

    /// Release or end date, if scheduled
    pub end_date: Option<DateTime<Utc>>,
}

/// A typed custom field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Calendar instant
    Date(DateTime<Utc>),
    /// Single display name or text
    Text(String),
    /// Numeric simple field
    Number(serde_json::Number),
    /// Boolean simple field
    Bool(bool),
    /// Duration
    Period(IssuePeriod),
    /// Several display names
    List(Vec<String>),
    /// One or more versions
    Versions(Vec<VersionValue>),
}

impl FieldValue {
    /// The value as a date, if it is one.
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(date) => Some(*date),
            _ => None,
        }
    }

    /// The value as a single display name.
    ///
    /// Lists are joined with ", ".
    pub fn as_name(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::List(names) if !names.is_empty() => Some(names.join(", ")),
            _ => None,
        }
    }

    /// The value as a period.
    pub fn as_period(&self) -> Option<&IssuePeriod> {
        match self {
            Self::Period(period) => Some(period),
            _ => None,
        }
    }

    /// The value as a list of versions.
    pub fn as_versions(&self) -> Option<&[VersionValue]> {
        match self {
            Self::Versions(versions) => Some(versions),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Text(text) => write!(f, "{text}"),
            Self::Number(number) => write!(f, "{number}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Period(period) => write!(f, "{}", period.presentation),
            Self::List(names) => write!(f, "{}", names.join(", ")),
            Self::Versions(versions) => {
                let names: Vec<&str> = versions.iter().map(|v| v.name.as_str()).collect();
                write!(f, "{}", names.join(", "))
            }
        }
    }
}

/// A named extra field shown for an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    /// Field name as configured
    pub name: String,

    /// Extracted value, `None` if absent or of unknown kind
    pub value: Option<FieldValue>,
}

/// One issue in the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueInfo {
    /// Unique internal identifier
    pub id: IssueId,

    /// Display identifier (e.g. "PROJ-12", or "Draft 2-17" for drafts)
    pub id_readable: String,

    /// Whether the issue is an unsubmitted draft
    #[serde(default)]
    pub is_draft: bool,

    /// Issue summary
    pub summary: String,

    /// Value of the configured type field
    #[serde(rename = "type")]
    pub issue_type: Option<String>,

    /// Value of the configured state field
    pub state: Option<String>,

    /// Value of the configured assignee field
    pub assignee: Option<String>,

    /// Sprints the issue is planned in
    #[serde(default)]
    pub sprints: Vec<VersionValue>,

    /// Planned start date
    pub start_date: Option<DateTime<Utc>>,

    /// Due date
    pub due_date: Option<DateTime<Utc>>,

    /// Estimated effort
    pub estimation: Option<IssuePeriod>,

    /// Whether the issue is resolved
    pub resolved: bool,

    /// Extra display fields in configured order
    #[serde(default)]
    pub extra_fields: Vec<CustomField>,

    /// Traversal distance from the root (root is 0)
    pub depth: u32,

    /// Whether this issue's links have been fetched at least once
    pub links_known: bool,

    /// Whether upstream links are expanded
    pub show_upstream: bool,

    /// Whether downstream links are expanded
    pub show_downstream: bool,

    /// Links to issues this issue depends on
    #[serde(default)]
    pub upstream_links: Vec<IssueLink>,

    /// Links to issues that depend on this issue
    #[serde(default)]
    pub downstream_links: Vec<IssueLink>,
}

impl IssueInfo {
    /// Create a bare node with unknown links at the given depth.
    pub fn new(id: impl Into<IssueId>, id_readable: impl Into<String>, depth: u32) -> Self {
        Self {
            id: id.into(),
            id_readable: id_readable.into(),
            is_draft: false,
            summary: String::new(),
            issue_type: None,
            state: None,
            assignee: None,
            sprints: Vec::new(),
            start_date: None,
            due_date: None,
            estimation: None,
            resolved: false,
            extra_fields: Vec::new(),
            depth,
            links_known: false,
            show_upstream: false,
            show_downstream: false,
            upstream_links: Vec::new(),
            downstream_links: Vec::new(),
        }
    }

    /// Returns `true` for the root issue.
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    /// Links on one side.
    pub fn links(&self, direction: FollowDirection) -> &[IssueLink] {
        match direction {
            FollowDirection::Upstream => &self.upstream_links,
            FollowDirection::Downstream => &self.downstream_links,
        }
    }

    /// Mutable links on one side.
    pub fn links_mut(&mut self, direction: FollowDirection) -> &mut Vec<IssueLink> {
        match direction {
            FollowDirection::Upstream => &mut self.upstream_links,
            FollowDirection::Downstream => &mut self.downstream_links,
        }
    }

    /// Append `link` unless an equivalent link is already present.
    ///
    /// Returns `true` if the link was added.
    pub fn add_link(&mut self, direction: FollowDirection, link: IssueLink) -> bool {
        let links = self.links_mut(direction);
        if links.iter().any(|existing| existing.same_as(&link)) {
            return false;
        }
        links.push(link);
        true
    }

    /// Whether links on one side are expanded for display.
    pub fn shows(&self, direction: FollowDirection) -> bool {
        match direction {
            FollowDirection::Upstream => self.show_upstream,
            FollowDirection::Downstream => self.show_downstream,
        }
    }

    /// Set the display flag for one side.
    pub fn set_shows(&mut self, direction: FollowDirection, value: bool) {
        match direction {
            FollowDirection::Upstream => self.show_upstream = value,
            FollowDirection::Downstream => self.show_downstream = value,
        }
    }

    /// Extra field value by name.
    pub fn extra_field(&self, name: &str) -> Option<&FieldValue> {
        self.extra_fields
            .iter()
            .find(|field| field.name == name)
            .and_then(|field| field.value.as_ref())
    }
}

/// Legend entry for one value of a classification field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValueInfo {
    /// Whether the value is archived
    #[serde(default)]
    pub archived: bool,

    /// Palette id of the color
    #[serde(default)]
    pub color_id: Option<String>,

    /// Background color (hex)
    pub background: String,

    /// Foreground color (hex)
    pub foreground: String,
}

/// Legal values of one classification field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfoField {
    /// Field name
    pub name: String,

    /// Values by name
    pub values: BTreeMap<String, FieldValueInfo>,
}

impl FieldInfoField {
    /// Legend entry for `value`, compared case-insensitively.
    pub fn lookup(&self, value: &str) -> Option<&FieldValueInfo> {
        let value = value.to_lowercase();
        self.values
            .iter()
            .find(|(name, _)| name.to_lowercase() == value)
            .map(|(_, info)| info)
    }
}

/// Metadata for the state and type fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    /// Legend of the state field
    pub state_field: Option<FieldInfoField>,

    /// Legend of the type field
    pub type_field: Option<FieldInfoField>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(target: &str, direction: DirectionType, link_type: &str) -> IssueLink {
        IssueLink {
            target_id: IssueId::new(target),
            target_id_readable: target.to_uppercase(),
            link_type: link_type.to_string(),
            direction,
            target_to_source: "subtask of".to_string(),
            source_to_target: "parent for".to_string(),
        }
    }

    #[test]
    fn test_direction_inverse() {
        assert_eq!(DirectionType::Inward.inverse(), DirectionType::Outward);
        assert_eq!(DirectionType::Outward.inverse(), DirectionType::Inward);
        assert_eq!(DirectionType::Both.inverse(), DirectionType::Both);
    }

    #[test]
    fn test_direction_from_str_is_case_insensitive() {
        assert_eq!(" outward ".parse::<DirectionType>(), Ok(DirectionType::Outward));
        assert_eq!("Inward".parse::<DirectionType>(), Ok(DirectionType::Inward));
        assert!("upstream".parse::<DirectionType>().is_err());
    }

    #[test]
    fn test_link_label_depends_on_direction() {
        assert_eq!(link("a", DirectionType::Inward, "Subtask").label(), "subtask of");
        assert_eq!(link("a", DirectionType::Outward, "Subtask").label(), "parent for");
        assert_eq!(link("a", DirectionType::Both, "Subtask").label(), "parent for");
    }

    #[test]
    fn test_mirrored_link_points_back() {
        let forward = link("b", DirectionType::Outward, "Subtask");
        let mirrored = forward.mirrored(&IssueId::new("a"), "A-1");

        assert_eq!(mirrored.target_id, IssueId::new("a"));
        assert_eq!(mirrored.target_id_readable, "A-1");
        assert_eq!(mirrored.direction, DirectionType::Inward);
        assert_eq!(mirrored.link_type, "Subtask");
    }

    #[test]
    fn test_add_link_deduplicates() {
        let mut issue = IssueInfo::new("a", "A-1", 0);

        assert!(issue.add_link(FollowDirection::Upstream, link("b", DirectionType::Outward, "Subtask")));
        assert!(!issue.add_link(FollowDirection::Upstream, link("b", DirectionType::Outward, "Subtask")));
        // Same target, different type is a distinct link
        assert!(issue.add_link(FollowDirection::Upstream, link("b", DirectionType::Outward, "Depend")));

        assert_eq!(issue.upstream_links.len(), 2);
        assert!(issue.downstream_links.is_empty());
    }

    #[test]
    fn test_follow_directions_iter_order() {
        let both: Vec<_> = FollowDirections::both().iter().collect();
        assert_eq!(both, vec![FollowDirection::Upstream, FollowDirection::Downstream]);

        let down: FollowDirections = [FollowDirection::Downstream].into_iter().collect();
        assert!(!down.contains(FollowDirection::Upstream));
        assert!(down.contains(FollowDirection::Downstream));
    }

    #[test]
    fn test_field_value_display() {
        let date = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        assert_eq!(FieldValue::Date(date).to_string(), "2023-11-14");
        assert_eq!(
            FieldValue::List(vec!["Ann".into(), "Bob".into()]).to_string(),
            "Ann, Bob"
        );
        assert_eq!(
            FieldValue::Period(IssuePeriod {
                presentation: "2d".into(),
                minutes: 960
            })
            .to_string(),
            "2d"
        );
    }

    #[test]
    fn test_field_info_lookup_ignores_case() {
        let mut values = BTreeMap::new();
        values.insert(
            "In Progress".to_string(),
            FieldValueInfo {
                archived: false,
                color_id: Some("3".into()),
                background: "#ffee9c".into(),
                foreground: "#b45f06".into(),
            },
        );
        let field = FieldInfoField {
            name: "State".into(),
            values,
        };

        assert!(field.lookup("in progress").is_some());
        assert!(field.lookup("Done").is_none());
    }

    #[test]
    fn test_field_info_lookup_folds_non_ascii_case() {
        let mut values = BTreeMap::new();
        values.insert(
            "В работе".to_string(),
            FieldValueInfo {
                archived: false,
                color_id: None,
                background: "#ffffff".into(),
                foreground: "#000000".into(),
            },
        );
        let field = FieldInfoField {
            name: "Состояние".into(),
            values,
        };

        assert!(field.lookup("в РАБОТЕ").is_some());
    }
}
