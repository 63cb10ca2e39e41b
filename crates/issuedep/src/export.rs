//! CSV export of the dependency graph.
//!
//! One row is written per (issue, link) pair: the upstream links of an issue
//! first, then its downstream links. An issue whose links were never fetched
//! gets a single row with empty relation columns. Issues are ordered by
//! depth, then by id.

use crate::domain::{FollowDirection, IssueId, IssueInfo, IssueLink};
use crate::error::{Error, Result};
use crate::graph::IssueGraph;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// Columns before the extra fields.
const LEADING_COLUMNS: [&str; 7] = [
    "id",
    "type",
    "state",
    "summary",
    "assignee",
    "startDate",
    "dueDate",
];

/// Columns after the extra fields.
const TRAILING_COLUMNS: [&str; 6] = [
    "resolved",
    "depth",
    "relTargetId",
    "relType",
    "relName",
    "relDirectionType",
];

/// Relation columns of one row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRelation {
    /// Readable id of the link target
    pub target_id: String,
    /// Link type name
    #[serde(rename = "type")]
    pub link_type: String,
    /// Relation label
    pub name: String,
    /// "upstream" or "downstream"
    pub direction_type: String,
}

impl ExportRelation {
    fn from_link(link: &IssueLink, side: FollowDirection) -> Self {
        Self {
            target_id: link.target_id_readable.clone(),
            link_type: link.link_type.clone(),
            name: link.label().to_string(),
            direction_type: side.to_string(),
        }
    }
}

/// One CSV row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    /// Readable issue id
    pub id: String,
    /// Type value
    #[serde(rename = "type")]
    pub issue_type: Option<String>,
    /// State value
    pub state: Option<String>,
    /// Summary
    pub summary: String,
    /// Assignee
    pub assignee: Option<String>,
    /// Planned start
    pub start_date: Option<DateTime<Utc>>,
    /// Due date
    pub due_date: Option<DateTime<Utc>>,
    /// Extra field values in column order, rendered as text
    pub extra_fields: Vec<Option<String>>,
    /// Resolution flag
    pub resolved: bool,
    /// Depth in the graph
    pub depth: u32,
    /// Relation columns, empty for issues with unknown links
    pub relation: ExportRelation,
}

/// The rows of an export, with the extra field names of the header.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Export {
    /// Extra field names, taken from the root issue
    pub extra_field_names: Vec<String>,
    /// Data rows
    pub rows: Vec<ExportRow>,
}

impl Export {
    /// Build the export of `graph`.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` if `root_id` is not in the graph.
    pub fn build(graph: &IssueGraph, root_id: &IssueId) -> Result<Self> {
        let root = graph
            .get(root_id)
            .ok_or_else(|| Error::IssueNotFound(root_id.clone()))?;
        let extra_field_names: Vec<String> =
            root.extra_fields.iter().map(|field| field.name.clone()).collect();

        let rows = graph
            .sorted_by_depth()
            .into_iter()
            .flat_map(|issue| issue_rows(issue, &extra_field_names))
            .collect();

        Ok(Self {
            extra_field_names,
            rows,
        })
    }

    /// Header cells.
    pub fn header(&self) -> Vec<String> {
        LEADING_COLUMNS
            .iter()
            .map(ToString::to_string)
            .chain(self.extra_field_names.iter().cloned())
            .chain(TRAILING_COLUMNS.iter().map(ToString::to_string))
            .collect()
    }

    /// Write header and rows as CSV, lines separated by `\n`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if writing fails.
    pub fn write_csv<W: Write>(&self, w: &mut W) -> Result<()> {
        write!(w, "{}", self.header().join(","))?;
        for row in &self.rows {
            write!(w, "\n{}", csv_line(row))?;
        }
        Ok(())
    }

    /// The CSV text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Export` if the output is not valid UTF-8.
    pub fn to_csv(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| Error::Export(e.to_string()))
    }
}

fn issue_rows(issue: &IssueInfo, extra_field_names: &[String]) -> Vec<ExportRow> {
    let row = |relation: ExportRelation| ExportRow {
        id: issue.id_readable.clone(),
        issue_type: issue.issue_type.clone(),
        state: issue.state.clone(),
        summary: issue.summary.clone(),
        assignee: issue.assignee.clone(),
        start_date: issue.start_date,
        due_date: issue.due_date,
        extra_fields: extra_field_names
            .iter()
            .map(|name| issue.extra_field(name).map(ToString::to_string))
            .collect(),
        resolved: issue.resolved,
        depth: issue.depth,
        relation,
    };

    if !issue.links_known {
        return vec![row(ExportRelation::default())];
    }

    FollowDirection::ALL
        .into_iter()
        .flat_map(|side| {
            issue
                .links(side)
                .iter()
                .map(move |link| ExportRelation::from_link(link, side))
        })
        .map(row)
        .collect()
}

fn text_col(value: Option<&str>) -> String {
    match value {
        Some(text) => format!("\"{}\"", text.replace('"', "\"\"")),
        None => String::new(),
    }
}

fn date_col(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn csv_line(row: &ExportRow) -> String {
    let relation = &row.relation;
    let mut cols = vec![
        row.id.clone(),
        text_col(row.issue_type.as_deref()),
        text_col(row.state.as_deref()),
        text_col(Some(&row.summary)),
        text_col(row.assignee.as_deref()),
        date_col(row.start_date),
        date_col(row.due_date),
    ];
    cols.extend(row.extra_fields.iter().map(|value| text_col(value.as_deref())));
    cols.extend([
        row.resolved.to_string(),
        row.depth.to_string(),
        text_col(Some(&relation.target_id)),
        text_col(Some(&relation.link_type)),
        text_col(Some(&relation.name)),
        text_col(Some(&relation.direction_type)),
    ]);
    cols.join(",")
}

/// File name for the export of `root_readable_id`, e.g. `proj12_export.csv`.
pub fn export_file_name(root_readable_id: &str) -> String {
    format!("{}_export.csv", root_readable_id.to_lowercase().replacen('-', "", 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CustomField, DirectionType, FieldValue};
    use chrono::TimeZone;

    fn link(target: &str, readable: &str, direction: DirectionType) -> IssueLink {
        IssueLink {
            target_id: IssueId::new(target),
            target_id_readable: readable.to_string(),
            link_type: "Subtask".into(),
            direction,
            target_to_source: "subtask of".into(),
            source_to_target: "parent for".into(),
        }
    }

    /// Root with one upstream link to a discovered, unexpanded issue.
    fn two_node_graph() -> IssueGraph {
        let mut root = IssueInfo::new("2-1", "PROJ-1", 0);
        root.summary = "Root \"quoted\"".into();
        root.state = Some("Open".into());
        root.links_known = true;
        root.show_upstream = true;
        root.due_date = Some(Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap());
        root.extra_fields = vec![CustomField {
            name: "Priority".into(),
            value: Some(FieldValue::Text("High".into())),
        }];
        root.upstream_links
            .push(link("2-2", "PROJ-2", DirectionType::Outward));

        let mut child = IssueInfo::new("2-2", "PROJ-2", 1);
        child.summary = "Child".into();
        child
            .downstream_links
            .push(link("2-1", "PROJ-1", DirectionType::Inward));

        [child, root].into_iter().collect()
    }

    #[test]
    fn test_header_includes_extra_fields_in_order() {
        let export = Export::build(&two_node_graph(), &IssueId::new("2-1")).unwrap();
        assert_eq!(
            export.header().join(","),
            "id,type,state,summary,assignee,startDate,dueDate,Priority,resolved,depth,relTargetId,relType,relName,relDirectionType"
        );
    }

    #[test]
    fn test_root_with_one_link_has_one_row() {
        let export = Export::build(&two_node_graph(), &IssueId::new("2-1")).unwrap();

        let root_rows: Vec<&ExportRow> = export.rows.iter().filter(|r| r.id == "PROJ-1").collect();
        assert_eq!(root_rows.len(), 1);
        assert_eq!(root_rows[0].relation.target_id, "PROJ-2");
        assert_eq!(root_rows[0].relation.direction_type, "upstream");
        assert_eq!(root_rows[0].relation.name, "parent for");

        // The child's links are unknown, so it only has a placeholder row
        assert_eq!(export.rows.len(), 2);
        assert_eq!(export.rows[1].relation, ExportRelation::default());
    }

    #[test]
    fn test_csv_text() {
        let csv = Export::build(&two_node_graph(), &IssueId::new("2-1"))
            .unwrap()
            .to_csv()
            .unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            r#"PROJ-1,,"Open","Root ""quoted""",,,2024-03-05,"High",false,0,"PROJ-2","Subtask","parent for","upstream""#
        );
        assert_eq!(lines[2], r#"PROJ-2,,,"Child",,,,,false,1,"","","","""#);
    }

    #[test]
    fn test_rows_sorted_by_depth() {
        let export = Export::build(&two_node_graph(), &IssueId::new("2-1")).unwrap();
        let depths: Vec<u32> = export.rows.iter().map(|r| r.depth).collect();
        assert_eq!(depths, vec![0, 1]);
    }

    #[test]
    fn test_upstream_rows_before_downstream() {
        let mut root = IssueInfo::new("r", "R-1", 0);
        root.links_known = true;
        root.downstream_links.push(link("d", "D-1", DirectionType::Inward));
        root.upstream_links.push(link("u", "U-1", DirectionType::Outward));
        let graph: IssueGraph = [root].into_iter().collect();

        let export = Export::build(&graph, &IssueId::new("r")).unwrap();
        let sides: Vec<&str> = export
            .rows
            .iter()
            .map(|r| r.relation.direction_type.as_str())
            .collect();
        assert_eq!(sides, vec!["upstream", "downstream"]);
        assert_eq!(export.rows[1].relation.name, "subtask of");
    }

    #[test]
    fn test_missing_root() {
        let result = Export::build(&IssueGraph::new(), &IssueId::new("r"));
        assert!(matches!(result, Err(Error::IssueNotFound(_))));
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("PROJ-12"), "proj12_export.csv");
        assert_eq!(export_file_name("A-B-3"), "ab-3_export.csv");
        assert_eq!(export_file_name("Draft 2-17"), "draft 217_export.csv");
    }
}
