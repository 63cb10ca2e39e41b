//! Custom field extraction.
//!
//! Maps the tracker's generic custom-field records to typed values. The
//! record's `$type` tag selects a [`FieldKind`]; unknown kinds yield `None`
//! and are logged, never failing the surrounding fetch.

use crate::domain::{
    CustomField, FieldInfoField, FieldValue, FieldValueInfo, IssueInfo, IssuePeriod, VersionValue,
};
use crate::settings::FieldSettings;
use crate::source::raw::{RawCustomField, RawIssue};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Field type id of simple fields holding a timestamp.
const DATE_TIME_FIELD_TYPE: &str = "date and time";

/// The closed set of custom field kinds the extractor understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Integer, float, string or date-time simple field
    Simple,
    /// Date field
    Date,
    /// Text field
    Text,
    /// Period (duration) field
    Period,
    /// Single enum, state, build, group or owned field
    SingleEnum,
    /// Single user field
    SingleUser,
    /// Multi user field
    MultiUser,
    /// Multi enum, group, owned or build field
    MultiEnum,
    /// Single version field
    SingleVersion,
    /// Multi version field
    MultiVersion,
    /// Anything else
    Unknown(String),
}

impl FieldKind {
    /// Classify a `$type` tag.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "SimpleIssueCustomField" => Self::Simple,
            "DateIssueCustomField" => Self::Date,
            "TextIssueCustomField" => Self::Text,
            "PeriodIssueCustomField" => Self::Period,
            "SingleBuildIssueCustomField"
            | "SingleEnumIssueCustomField"
            | "SingleGroupIssueCustomField"
            | "SingleOwnedIssueCustomField"
            | "StateIssueCustomField"
            | "StateMachineIssueCustomField" => Self::SingleEnum,
            "SingleUserIssueCustomField" => Self::SingleUser,
            "MultiUserIssueCustomField" => Self::MultiUser,
            "MultiEnumIssueCustomField"
            | "MultiGroupIssueCustomField"
            | "MultiOwnedIssueCustomField"
            | "MultiBuildIssueCustomField" => Self::MultiEnum,
            "SingleVersionIssueCustomField" => Self::SingleVersion,
            "MultiVersionIssueCustomField" => Self::MultiVersion,
            other => Self::Unknown(other.to_string()),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamedValue {
    name: Option<String>,
    full_name: Option<String>,
}

impl NamedValue {
    fn display_name(self) -> Option<String> {
        self.full_name.or(self.name)
    }
}

#[derive(Deserialize)]
struct TextValue {
    text: Option<String>,
}

#[derive(Deserialize)]
struct PeriodValue {
    #[serde(default)]
    presentation: String,
    #[serde(default)]
    minutes: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVersion {
    name: String,
    start_date: Option<i64>,
    release_date: Option<i64>,
}

impl From<RawVersion> for VersionValue {
    fn from(raw: RawVersion) -> Self {
        VersionValue {
            name: raw.name,
            start_date: raw.start_date.and_then(DateTime::from_timestamp_millis),
            end_date: raw.release_date.and_then(DateTime::from_timestamp_millis),
        }
    }
}

/// Find a field record by name.
pub fn find_field<'a>(name: Option<&str>, fields: &'a [RawCustomField]) -> Option<&'a RawCustomField> {
    let name = name?;
    fields.iter().find(|field| field.name == name)
}

/// Extract the typed value of the field called `name`.
///
/// Returns `None` when no name is configured, the field is absent or unset,
/// or its kind or value shape is not understood.
pub fn extract_value(name: Option<&str>, fields: &[RawCustomField]) -> Option<FieldValue> {
    let field = find_field(name, fields)?;
    if field.value.is_null() {
        return None;
    }

    let kind = FieldKind::from_tag(&field.type_tag);
    let value = decode(&kind, field);
    if value.is_none() {
        tracing::warn!(
            field = %field.name,
            kind = ?kind,
            "Unrecognized custom field value, ignoring"
        );
    }
    value
}

fn decode(kind: &FieldKind, field: &RawCustomField) -> Option<FieldValue> {
    let value = &field.value;
    match kind {
        FieldKind::Simple => {
            let is_date = field
                .project_custom_field
                .as_ref()
                .and_then(|pcf| pcf.field.as_ref())
                .and_then(|f| f.field_type.as_ref())
                .is_some_and(|t| t.id == DATE_TIME_FIELD_TYPE);
            if is_date {
                timestamp(value).map(FieldValue::Date)
            } else {
                scalar(value)
            }
        }
        FieldKind::Date => timestamp(value).map(FieldValue::Date),
        FieldKind::Text => TextValue::deserialize(value)
            .ok()
            .and_then(|v| v.text)
            .map(FieldValue::Text),
        FieldKind::Period => PeriodValue::deserialize(value).ok().map(|v| {
            FieldValue::Period(IssuePeriod {
                presentation: v.presentation,
                minutes: v.minutes,
            })
        }),
        FieldKind::SingleEnum => NamedValue::deserialize(value)
            .ok()
            .and_then(|v| v.name)
            .map(FieldValue::Text),
        FieldKind::SingleUser => NamedValue::deserialize(value)
            .ok()
            .and_then(NamedValue::display_name)
            .map(FieldValue::Text),
        FieldKind::MultiUser => Vec::<NamedValue>::deserialize(value).ok().map(|items| {
            FieldValue::List(items.into_iter().filter_map(NamedValue::display_name).collect())
        }),
        FieldKind::MultiEnum => Vec::<NamedValue>::deserialize(value).ok().map(|items| {
            FieldValue::List(items.into_iter().filter_map(|v| v.name).collect())
        }),
        FieldKind::SingleVersion => RawVersion::deserialize(value)
            .ok()
            .map(|v| FieldValue::Versions(vec![v.into()])),
        FieldKind::MultiVersion => Vec::<RawVersion>::deserialize(value)
            .ok()
            .map(|items| FieldValue::Versions(items.into_iter().map(Into::into).collect())),
        FieldKind::Unknown(_) => None,
    }
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value.as_i64().and_then(DateTime::from_timestamp_millis)
}

fn scalar(value: &Value) -> Option<FieldValue> {
    match value {
        Value::String(text) => Some(FieldValue::Text(text.clone())),
        Value::Number(number) => Some(FieldValue::Number(number.clone())),
        Value::Bool(flag) => Some(FieldValue::Bool(*flag)),
        _ => None,
    }
}

/// Extract the fields listed in `csv`, in list order.
///
/// Names are comma-separated and trimmed; blank names are skipped. Fields
/// that are absent still appear, with a `None` value.
pub fn extract_custom_field_set(csv: Option<&str>, fields: &[RawCustomField]) -> Vec<CustomField> {
    csv.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| CustomField {
            name: name.to_string(),
            value: extract_value(Some(name), fields),
        })
        .collect()
}

/// Build the legend of a classification field from its bundle values.
///
/// Returns `None` if the field is absent or carries no bundle.
pub fn field_info_from_raw(name: Option<&str>, fields: &[RawCustomField]) -> Option<FieldInfoField> {
    let field = find_field(name, fields)?;
    let bundle = field.project_custom_field.as_ref()?.bundle.as_ref()?;
    Some(FieldInfoField {
        name: field.name.clone(),
        values: bundle
            .values
            .iter()
            .map(|value| (value.name.clone(), FieldValueInfo::from(value)))
            .collect(),
    })
}

/// Build a graph node from a raw issue record.
///
/// Only fields with a configured name are extracted; links are unknown.
pub fn issue_from_raw(raw: &RawIssue, settings: &FieldSettings, depth: u32) -> IssueInfo {
    let fields = &raw.custom_fields;
    let name_of = |field: Option<&str>| extract_value(field, fields).and_then(|v| v.as_name());

    let mut issue = IssueInfo::new(raw.id.clone(), raw.display_id(), depth);
    issue.is_draft = raw.is_draft;
    issue.summary = raw.summary.clone();
    issue.resolved = raw.resolved;
    issue.issue_type = name_of(settings.type_field.as_deref());
    issue.state = name_of(settings.state_field.as_deref());
    issue.assignee = name_of(settings.assignee_field.as_deref());
    issue.sprints = extract_value(settings.sprints_field.as_deref(), fields)
        .and_then(|v| v.as_versions().map(<[VersionValue]>::to_vec))
        .unwrap_or_default();
    issue.start_date =
        extract_value(settings.start_date_field.as_deref(), fields).and_then(|v| v.as_date());
    issue.due_date =
        extract_value(settings.due_date_field.as_deref(), fields).and_then(|v| v.as_date());
    issue.estimation = extract_value(settings.estimation_field.as_deref(), fields)
        .and_then(|v| v.as_period().cloned());
    issue.extra_fields = extract_custom_field_set(settings.extra_custom_fields.as_deref(), fields);
    issue
}
