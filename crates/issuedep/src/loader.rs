//! Root issue loading.
//!
//! Loading a root fetches its core record, builds the depth-0 node and the
//! legends of the state and type fields. The legends come from the bundle
//! values on the root record; when the record carries none the source is
//! asked for the field metadata instead.

use crate::domain::{FieldInfo, FieldInfoField, IssueId, IssueInfo};
use crate::error::{ConfigError, Result};
use crate::fields::{field_info_from_raw, issue_from_raw};
use crate::graph::{IssueGraph, TraversalOptions, fetch_deps};
use crate::settings::Settings;
use crate::source::{IssueSource, RawIssue};

/// Fetch the root issue and the field legends.
///
/// # Errors
///
/// Returns `ConfigError::MissingRoot` for a blank id, or the fetch error of
/// the core record.
pub async fn load_root(
    source: &dyn IssueSource,
    root_id: &IssueId,
    settings: &Settings,
) -> Result<(IssueInfo, FieldInfo)> {
    if root_id.as_str().trim().is_empty() {
        return Err(ConfigError::MissingRoot.into());
    }

    let raw = source.fetch_issue_core(root_id).await?;
    let root = issue_from_raw(&raw, &settings.field_settings(), 0);

    let field_info = FieldInfo {
        state_field: field_legend(source, &raw, settings.state_field.as_deref()).await?,
        type_field: field_legend(source, &raw, settings.type_field.as_deref()).await?,
    };

    tracing::info!(issue = %root.id_readable, summary = %root.summary, "Loaded root issue");
    Ok((root, field_info))
}

async fn field_legend(
    source: &dyn IssueSource,
    raw: &RawIssue,
    name: Option<&str>,
) -> Result<Option<FieldInfoField>> {
    let Some(name) = name else {
        return Ok(None);
    };
    match field_info_from_raw(Some(name), &raw.custom_fields) {
        Some(field) => Ok(Some(field)),
        None => source.fetch_field_metadata(name).await,
    }
}

/// Load the root and traverse its dependencies with `opts`.
///
/// With `autoLoadDeps` off and `force` unset, the graph holds only the root.
///
/// # Errors
///
/// Returns any error of [`load_root`] or of the traversal.
pub async fn load_graph(
    source: &dyn IssueSource,
    root_id: &IssueId,
    settings: &Settings,
    opts: &TraversalOptions,
    force: bool,
) -> Result<(IssueGraph, FieldInfo)> {
    let (root, field_info) = load_root(source, root_id, settings).await?;
    if !settings.auto_load_deps && !force {
        return Ok((IssueGraph::with_root(root), field_info));
    }

    let graph = fetch_deps(source, root, opts).await?;
    let stats = graph.stats();
    tracing::info!(
        issues = stats.count,
        max_depth = stats.max_depth,
        "Dependency graph loaded"
    );
    Ok((graph, field_info))
}
