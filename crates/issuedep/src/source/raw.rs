//! Wire shapes returned by the issue tracker REST API.
//!
//! These mirror the field selections requested from the tracker: the issue
//! core record with its custom fields, and the link list where every link
//! type groups the linked issues.

use crate::domain::{DirectionType, FieldValueInfo, IssueId, DRAFT_PREFIX};
use serde::{Deserialize, Deserializer, Serialize};

/// An issue record as returned by `issues/{id}` or embedded in a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIssue {
    /// Internal id
    pub id: IssueId,

    /// Readable id, absent for drafts
    #[serde(default)]
    pub id_readable: Option<String>,

    /// Summary line
    #[serde(default)]
    pub summary: String,

    /// Resolution marker (timestamp, flag or null upstream)
    #[serde(default, deserialize_with = "deserialize_resolved")]
    pub resolved: bool,

    /// Whether this is an unsubmitted draft
    #[serde(default)]
    pub is_draft: bool,

    /// Custom field values
    #[serde(default)]
    pub custom_fields: Vec<RawCustomField>,
}

impl RawIssue {
    /// Display id: the readable id, or "Draft <id>" for drafts.
    pub fn display_id(&self) -> String {
        match (&self.id_readable, self.is_draft) {
            (Some(readable), false) => readable.clone(),
            _ => format!("{DRAFT_PREFIX} {}", self.id),
        }
    }
}

/// The tracker reports `resolved` as a timestamp; tests and snapshots may use a flag.
fn deserialize_resolved<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::Bool(flag)) => flag,
        Some(_) => true,
    })
}

/// One custom field on an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCustomField {
    /// Type tag, e.g. `StateIssueCustomField`
    #[serde(rename = "$type", default)]
    pub type_tag: String,

    /// Field name
    pub name: String,

    /// Kind-specific value shape, null when unset
    #[serde(default)]
    pub value: serde_json::Value,

    /// Project-level field definition
    #[serde(default)]
    pub project_custom_field: Option<RawProjectCustomField>,
}

/// Project-level definition of a custom field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProjectCustomField {
    /// Field name
    #[serde(default)]
    pub name: Option<String>,

    /// Underlying field prototype
    #[serde(default)]
    pub field: Option<RawFieldPrototype>,

    /// Value bundle for enumerated fields
    #[serde(default)]
    pub bundle: Option<RawBundle>,
}

/// Field prototype carrying the field type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFieldPrototype {
    /// Field type
    #[serde(default)]
    pub field_type: Option<RawFieldType>,
}

/// Field type id, e.g. `date and time`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawFieldType {
    /// Type id
    pub id: String,
}

/// Values of an enumerated field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawBundle {
    /// Bundle values
    #[serde(default)]
    pub values: Vec<RawBundleValue>,
}

/// One enumerated value with its color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBundleValue {
    /// Value name
    pub name: String,

    /// Whether the value is archived
    #[serde(default)]
    pub archived: bool,

    /// Color pair
    #[serde(default)]
    pub color: Option<RawColor>,
}

/// Color pair of a bundle value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawColor {
    /// Palette id
    #[serde(default)]
    pub id: Option<String>,

    /// Background hex color
    #[serde(default)]
    pub background: String,

    /// Foreground hex color
    #[serde(default)]
    pub foreground: String,
}

impl From<&RawBundleValue> for FieldValueInfo {
    fn from(value: &RawBundleValue) -> Self {
        let color = value.color.clone().unwrap_or_default();
        FieldValueInfo {
            archived: value.archived,
            color_id: color.id,
            background: color.background,
            foreground: color.foreground,
        }
    }
}

/// One link type entry of `issues/{id}/links`, grouping the linked issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIssueLink {
    /// Link id
    #[serde(default)]
    pub id: Option<String>,

    /// Direction as seen from the fetched issue
    pub direction: DirectionType,

    /// Link type
    pub link_type: RawLinkType,

    /// Linked issues
    #[serde(default)]
    pub issues: Vec<RawIssue>,
}

/// Link type description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLinkType {
    /// Link type name
    pub name: String,

    /// Outward label
    #[serde(default)]
    pub source_to_target: String,

    /// Inward label
    #[serde(default)]
    pub target_to_source: String,

    /// Whether the relation is directed
    #[serde(default)]
    pub directed: bool,

    /// Whether this is an aggregation (parent/child) link
    #[serde(default)]
    pub aggregation: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_issue_with_timestamp_resolved() {
        let json = r#"{
            "id": "2-1",
            "idReadable": "PROJ-1",
            "summary": "Root",
            "resolved": 1700000000000,
            "isDraft": false,
            "customFields": [
                {"$type": "StateIssueCustomField", "name": "State", "value": {"name": "Open"}}
            ]
        }"#;

        let issue: RawIssue = serde_json::from_str(json).unwrap();
        assert!(issue.resolved);
        assert_eq!(issue.display_id(), "PROJ-1");
        assert_eq!(issue.custom_fields[0].type_tag, "StateIssueCustomField");
    }

    #[test]
    fn test_draft_display_id() {
        let json = r#"{"id": "2-17", "summary": "Draft", "resolved": null, "isDraft": true}"#;
        let issue: RawIssue = serde_json::from_str(json).unwrap();

        assert!(!issue.resolved);
        assert_eq!(issue.display_id(), "Draft 2-17");
    }

    #[test]
    fn test_deserialize_link() {
        let json = r#"{
            "direction": "OUTWARD",
            "linkType": {"name": "Subtask", "sourceToTarget": "parent for", "targetToSource": "subtask of", "directed": true, "aggregation": true},
            "issues": [{"id": "2-2", "idReadable": "PROJ-2", "summary": "Child"}]
        }"#;

        let link: RawIssueLink = serde_json::from_str(json).unwrap();
        assert_eq!(link.direction, DirectionType::Outward);
        assert_eq!(link.link_type.name, "Subtask");
        assert_eq!(link.issues.len(), 1);
    }
}
