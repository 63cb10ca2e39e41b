//! Filtered views of the dependency graph.
//!
//! [`project`] selects the issues a renderer shows: issues passing the
//! state/type filter and, unless orphans are shown, only issues taking part
//! in at least one visible relation. The result depends only on the graph
//! and the filter.

use crate::domain::{DirectionType, FieldInfo, FieldInfoField, FollowDirection, IssueId, IssueInfo};
use crate::graph::IssueGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Classification fields a filter can restrict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    /// The state field
    State,
    /// The type field
    Type,
}

/// Which issues to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Allowed state values; `None` allows every state
    pub state: Option<BTreeMap<String, bool>>,

    /// Allowed type values; `None` allows every type
    #[serde(rename = "type")]
    pub issue_type: Option<BTreeMap<String, bool>>,

    /// Show issues without any visible relation
    pub show_orphans: bool,

    /// Show issues whose links were never fetched
    pub show_when_links_unknown: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            state: None,
            issue_type: None,
            show_orphans: false,
            show_when_links_unknown: true,
        }
    }
}

impl FilterState {
    /// Allow every non-archived value of the known classification fields.
    pub fn from_field_info(info: &FieldInfo) -> Self {
        let allowed = |field: &Option<FieldInfoField>| {
            field.as_ref().map(|field| {
                field
                    .values
                    .iter()
                    .map(|(name, value)| (name.clone(), !value.archived))
                    .collect()
            })
        };
        Self {
            state: allowed(&info.state_field),
            issue_type: allowed(&info.type_field),
            ..Self::default()
        }
    }

    fn values(&self, field: FilterField) -> Option<&BTreeMap<String, bool>> {
        match field {
            FilterField::State => self.state.as_ref(),
            FilterField::Type => self.issue_type.as_ref(),
        }
    }

    /// Allow or deny one value of a field.
    ///
    /// Restricting a field that had no value set starts from an empty set,
    /// which denies every other value.
    pub fn set_allowed(&mut self, field: FilterField, value: &str, allowed: bool) {
        let values = match field {
            FilterField::State => &mut self.state,
            FilterField::Type => &mut self.issue_type,
        };
        values
            .get_or_insert_with(BTreeMap::new)
            .insert(value.to_string(), allowed);
    }

    /// Returns `true` if `value` passes the filter of `field`.
    ///
    /// Unset values always pass.
    pub fn allows_value(&self, field: FilterField, value: Option<&str>) -> bool {
        match (value, self.values(field)) {
            (None, _) | (_, None) => true,
            (Some(value), Some(allowed)) => allowed.get(value).copied().unwrap_or(false),
        }
    }

    /// Field filter for one issue, without the orphan rule.
    pub fn allows(&self, issue: &IssueInfo) -> bool {
        self.allows_value(FilterField::State, issue.state.as_deref())
            && self.allows_value(FilterField::Type, issue.issue_type.as_deref())
            && (self.show_when_links_unknown || issue.links_known)
    }
}

/// A relation a renderer draws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleEdge {
    /// Issue owning the link
    pub from: IssueId,
    /// Link target
    pub to: IssueId,
    /// Relation label from the owner's point of view
    pub label: String,
    /// Link type name
    #[serde(rename = "type")]
    pub link_type: String,
    /// Link direction seen from the owner
    pub direction: DirectionType,
    /// Side of the owner the link belongs to
    pub side: FollowDirection,
}

impl VisibleEdge {
    /// Subtask links are drawn with the arrow at the owning (parent) end.
    pub fn arrow_at_source(&self) -> bool {
        self.direction == DirectionType::Outward && self.link_type == "Subtask"
    }
}

/// Edges of every link on a side with its display flag set.
///
/// Sorted by owner, then target, then type.
pub fn visible_edges(graph: &IssueGraph) -> Vec<VisibleEdge> {
    let mut edges: Vec<VisibleEdge> = graph
        .iter()
        .flat_map(|issue| {
            FollowDirection::ALL
                .into_iter()
                .filter(|side| issue.shows(*side))
                .flat_map(move |side| {
                    issue.links(side).iter().map(move |link| VisibleEdge {
                        from: issue.id.clone(),
                        to: link.target_id.clone(),
                        label: link.label().to_string(),
                        link_type: link.link_type.clone(),
                        direction: link.direction,
                        side,
                    })
                })
        })
        .collect();
    edges.sort_by(|a, b| {
        (&a.from, &a.to, &a.link_type, a.side).cmp(&(&b.from, &b.to, &b.link_type, b.side))
    });
    edges
}

/// The subgraph shown for `filter`.
pub fn project(graph: &IssueGraph, filter: &FilterState) -> IssueGraph {
    let passing: IssueGraph = graph
        .iter()
        .filter(|issue| filter.allows(issue))
        .cloned()
        .collect();

    if filter.show_orphans {
        return passing;
    }

    let mut connected: HashSet<&IssueId> = HashSet::new();
    for issue in passing.iter() {
        for side in FollowDirection::ALL {
            if !issue.shows(side) {
                continue;
            }
            for link in issue.links(side) {
                if passing.contains(&link.target_id) {
                    connected.insert(&issue.id);
                    connected.insert(&link.target_id);
                }
            }
        }
    }

    passing
        .iter()
        .filter(|issue| issue.is_root() || connected.contains(&issue.id))
        .cloned()
        .collect()
}

/// Ids of issues whose `"<readable id> <summary>"` contains `text`, ignoring case.
///
/// Sorted by id.
pub fn find_matching(graph: &IssueGraph, text: &str) -> Vec<IssueId> {
    let needle = text.to_lowercase();
    sorted_ids(graph.iter().filter(|issue| {
        format!("{} {}", issue.id_readable, issue.summary)
            .to_lowercase()
            .contains(&needle)
    }))
}

/// Ids of issues whose state or type equals `value`.
///
/// Sorted by id.
pub fn find_by_field(graph: &IssueGraph, field: FilterField, value: &str) -> Vec<IssueId> {
    sorted_ids(graph.iter().filter(|issue| {
        let actual = match field {
            FilterField::State => issue.state.as_deref(),
            FilterField::Type => issue.issue_type.as_deref(),
        };
        actual == Some(value)
    }))
}

fn sorted_ids<'a>(issues: impl Iterator<Item = &'a IssueInfo>) -> Vec<IssueId> {
    let mut ids: Vec<IssueId> = issues.map(|issue| issue.id.clone()).collect();
    ids.sort();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldValueInfo, IssueLink};

    fn link(target: &str, direction: DirectionType) -> IssueLink {
        IssueLink {
            target_id: IssueId::new(target),
            target_id_readable: target.to_uppercase(),
            link_type: "Depend".into(),
            direction,
            target_to_source: "is required for".into(),
            source_to_target: "depends on".into(),
        }
    }

    fn issue(id: &str, depth: u32, state: Option<&str>) -> IssueInfo {
        let mut issue = IssueInfo::new(id, id.to_uppercase(), depth);
        issue.state = state.map(String::from);
        issue.summary = format!("Summary of {id}");
        issue
    }

    /// r -> a (upstream, shown), a -> b (upstream, not shown), c isolated.
    fn sample() -> IssueGraph {
        let mut r = issue("r", 0, Some("Open"));
        r.links_known = true;
        r.show_upstream = true;
        r.upstream_links.push(link("a", DirectionType::Outward));

        let mut a = issue("a", 1, Some("Done"));
        a.links_known = true;
        a.downstream_links.push(link("r", DirectionType::Inward));
        a.upstream_links.push(link("b", DirectionType::Outward));

        let mut b = issue("b", 2, None);
        b.downstream_links.push(link("a", DirectionType::Inward));

        let c = issue("c", 1, Some("Open"));

        [r, a, b, c].into_iter().collect()
    }

    fn ids(graph: &IssueGraph) -> Vec<&str> {
        let mut ids: Vec<&str> = graph.iter().map(|i| i.id.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_orphans_hidden_by_default() {
        let projected = project(&sample(), &FilterState::default());
        // b's only link is on a side a does not show
        assert_eq!(ids(&projected), vec!["a", "r"]);
    }

    #[test]
    fn test_show_orphans_keeps_field_filter_only() {
        let filter = FilterState {
            show_orphans: true,
            ..FilterState::default()
        };
        assert_eq!(ids(&project(&sample(), &filter)), vec!["a", "b", "c", "r"]);
    }

    #[test]
    fn test_state_filter_excludes_and_cascades() {
        let mut filter = FilterState::default();
        filter.set_allowed(FilterField::State, "Open", true);
        filter.set_allowed(FilterField::State, "Done", false);

        let projected = project(&sample(), &filter);
        // a is filtered, so r's edge has no visible target; r stays as root
        assert_eq!(ids(&projected), vec!["r"]);
    }

    #[test]
    fn test_hide_unknown_links() {
        let filter = FilterState {
            show_when_links_unknown: false,
            show_orphans: true,
            ..FilterState::default()
        };
        assert_eq!(ids(&project(&sample(), &filter)), vec!["a", "r"]);
    }

    #[test]
    fn test_root_always_kept() {
        let graph: IssueGraph = [issue("r", 0, None)].into_iter().collect();
        assert_eq!(ids(&project(&graph, &FilterState::default())), vec!["r"]);
    }

    #[test]
    fn test_projection_does_not_touch_input() {
        let graph = sample();
        let before = graph.clone();
        let _ = project(&graph, &FilterState::default());
        assert_eq!(graph, before);
    }

    #[test]
    fn test_from_field_info_enables_non_archived() {
        let mut values = BTreeMap::new();
        let value = |archived| FieldValueInfo {
            archived,
            color_id: None,
            background: "#fff".into(),
            foreground: "#000".into(),
        };
        values.insert("Open".to_string(), value(false));
        values.insert("Obsolete".to_string(), value(true));
        let info = FieldInfo {
            state_field: Some(FieldInfoField {
                name: "State".into(),
                values,
            }),
            type_field: None,
        };

        let filter = FilterState::from_field_info(&info);
        assert!(filter.allows_value(FilterField::State, Some("Open")));
        assert!(!filter.allows_value(FilterField::State, Some("Obsolete")));
        assert!(!filter.allows_value(FilterField::State, Some("Unlisted")));
        assert!(filter.allows_value(FilterField::State, None));
        assert!(filter.allows_value(FilterField::Type, Some("Bug")));
        assert!(!filter.show_orphans);
        assert!(filter.show_when_links_unknown);
    }

    #[test]
    fn test_visible_edges() {
        let edges = visible_edges(&sample());
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from, IssueId::new("r"));
        assert_eq!(edges[0].to, IssueId::new("a"));
        assert_eq!(edges[0].label, "depends on");
        assert_eq!(edges[0].side, FollowDirection::Upstream);
        assert!(!edges[0].arrow_at_source());
    }

    #[test]
    fn test_find_matching_ignores_case() {
        let graph = sample();
        assert_eq!(find_matching(&graph, "SUMMARY OF A"), vec![IssueId::new("a")]);
        assert_eq!(find_matching(&graph, "b summ"), vec![IssueId::new("b")]);
        assert_eq!(find_matching(&graph, "").len(), 4);
        assert!(find_matching(&graph, "nothing").is_empty());
    }

    #[test]
    fn test_find_by_field() {
        let graph = sample();
        assert_eq!(
            find_by_field(&graph, FilterField::State, "Open"),
            vec![IssueId::new("c"), IssueId::new("r")]
        );
        assert!(find_by_field(&graph, FilterField::Type, "Bug").is_empty());
    }
}
