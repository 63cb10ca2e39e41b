//! Command execution logic.
//!
//! This module contains the implementation of all CLI commands. Every graph
//! command follows the same pipeline: resolve the root key, load the root
//! and its dependencies, apply `--expand` re-expansions, then project the
//! result for display.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::args::{
    ConfigArgs, ExportArgs, FilterArgs, GraphArgs, ScheduleArgs, SearchArgs, TraversalArgs,
};
use super::types::GraphFormatArg;
use crate::app::App;
use crate::domain::{FieldInfo, IssueId, IssueInfo};
use crate::export::{Export, export_file_name};
use crate::graph::{IssueGraph, TraversalOptions, extend};
use crate::loader;
use crate::output::{self, OutputConfig, OutputMode};
use crate::projection::{self, FilterField, FilterState};
use crate::schedule;
use crate::settings::Settings;

/// A loaded and re-expanded graph together with its root.
#[derive(Debug)]
struct LoadedGraph {
    root_id: IssueId,
    graph: IssueGraph,
    field_info: FieldInfo,
    settings: Settings,
}

/// Execute the graph command
pub async fn execute_graph(app: &App, args: &GraphArgs, output_mode: OutputMode) -> Result<()> {
    let loaded = load(app, &args.root, &args.traversal).await?;

    let mut graph = loaded.graph;
    for key in &args.hide_upstream {
        let id = resolve_in_graph(app, &graph, key).await?;
        graph = graph.set_show_upstream(&id, false);
    }
    for key in &args.hide_downstream {
        let id = resolve_in_graph(app, &graph, key).await?;
        graph = graph.set_show_downstream(&id, false);
    }

    let filter = build_filter(&graph, &loaded.field_info, &args.filter);
    let projected = projection::project(&graph, &filter);
    tracing::debug!(
        loaded = graph.len(),
        shown = projected.len(),
        "Projected graph"
    );

    match (output_mode, args.format) {
        (OutputMode::Json, _) | (OutputMode::Text, GraphFormatArg::Tree) => {
            output::print_graph(&projected, &loaded.root_id, &loaded.field_info, output_mode)?;
        }
        (OutputMode::Text, GraphFormatArg::Dot) => {
            let dot = output::dot::to_dot(
                &projected,
                loaded.field_info.state_field.as_ref(),
                loaded.settings.use_hierarchical_layout,
            );
            print!("{dot}");
        }
    }

    Ok(())
}

/// Execute the export command
pub async fn execute_export(app: &App, args: &ExportArgs, output_mode: OutputMode) -> Result<()> {
    let loaded = load(app, &args.root, &args.traversal).await?;

    let export = Export::build(&loaded.graph, &loaded.root_id)?;
    let csv = export.to_csv()?;

    let path = match &args.output {
        Some(path) if path.as_os_str() == "-" => {
            print!("{csv}");
            return Ok(());
        }
        Some(path) => path.clone(),
        None => {
            let readable = loaded
                .graph
                .get(&loaded.root_id)
                .map_or_else(|| loaded.root_id.to_string(), |root| root.id_readable.clone());
            PathBuf::from(export_file_name(&readable))
        }
    };

    tokio::fs::write(&path, &csv)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = export.rows.len(), "Export written");

    match output_mode {
        OutputMode::Json => output::print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "rows": export.rows.len(),
        }))?,
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            output::print_message(&format!(
                "{} {} row(s) to {}",
                output::success("Exported", &config),
                export.rows.len(),
                path.display()
            ))?;
        }
    }

    Ok(())
}

/// Execute the schedule command
pub async fn execute_schedule(
    app: &App,
    args: &ScheduleArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let loaded = load(app, &args.root, &args.traversal).await?;

    let filter = build_filter(&loaded.graph, &loaded.field_info, &args.filter);
    let projected = projection::project(&loaded.graph, &filter);

    let mut entries = schedule::schedule(&projected, chrono::Utc::now());
    if args.overdue {
        entries.retain(|entry| entry.overdue);
    }

    output::print_schedule(&entries, output_mode)?;
    Ok(())
}

/// Execute the search command
pub async fn execute_search(app: &App, args: &SearchArgs, output_mode: OutputMode) -> Result<()> {
    if args.text.is_none() && args.field.is_none() {
        anyhow::bail!("Nothing to search for: give TEXT or --field with --value");
    }

    let loaded = load(app, &args.root, &args.traversal).await?;
    let graph = &loaded.graph;

    let mut matches: Option<BTreeSet<IssueId>> = None;
    if let Some(text) = &args.text {
        matches = Some(projection::find_matching(graph, text).into_iter().collect());
    }
    if let (Some(field), Some(value)) = (args.field, &args.value) {
        let by_field: BTreeSet<IssueId> =
            projection::find_by_field(graph, field.into(), value)
                .into_iter()
                .collect();
        matches = Some(match matches {
            Some(by_text) => by_text.intersection(&by_field).cloned().collect(),
            None => by_field,
        });
    }

    let mut issues: Vec<&IssueInfo> = matches
        .unwrap_or_default()
        .iter()
        .filter_map(|id| graph.get(id))
        .collect();
    issues.sort_by(|a, b| (a.depth, &a.id).cmp(&(b.depth, &b.id)));

    output::print_issues(&issues, &loaded.field_info, output_mode)?;
    Ok(())
}

/// Execute the config command
pub async fn execute_config(
    settings_path: &Path,
    args: &ConfigArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let settings = Settings::load(settings_path).await?.apply_env();

    if let Err(e) = settings.validate() {
        if args.strict {
            return Err(e).with_context(|| format!("Invalid settings in {}", settings_path.display()));
        }
        let config = OutputConfig::from_env();
        eprintln!("{}", output::warning(&format!("Warning: {e}"), &config));
    }

    match output_mode {
        OutputMode::Json => output::print_json(&settings)?,
        OutputMode::Text => {
            let yaml = serde_yaml::to_string(&settings)?;
            println!("# {}", settings_path.display());
            print!("{yaml}");
        }
    }

    Ok(())
}

// ============================================================================
// Shared pipeline
// ============================================================================

/// Settings with the command-line overrides applied.
fn effective_settings(app: &App, traversal: &TraversalArgs) -> Settings {
    let mut settings = app.settings().clone();
    if let Some(depth) = traversal.max_depth {
        settings.max_recursion_depth = depth;
    }
    settings
}

fn traversal_options(settings: &Settings, traversal: &TraversalArgs) -> TraversalOptions {
    let opts = TraversalOptions::from_settings(settings, traversal.follow());
    match traversal.concurrency {
        Some(limit) => opts.with_fetch_concurrency(limit),
        None => opts,
    }
}

async fn load(app: &App, root_key: &str, traversal: &TraversalArgs) -> Result<LoadedGraph> {
    let settings = effective_settings(app, traversal);
    let opts = traversal_options(&settings, traversal);

    let root_id = app.source().resolve_id(root_key).await?;
    let (mut graph, field_info) =
        loader::load_graph(app.source(), &root_id, &settings, &opts, traversal.load_deps)
            .await
            .with_context(|| format!("Failed to load dependency graph of {root_key}"))?;

    for key in &traversal.expand {
        let id = resolve_in_graph(app, &graph, key).await?;
        graph = extend(app.source(), &graph, &id, &opts)
            .await
            .with_context(|| format!("Failed to expand {key}"))?;
    }

    Ok(LoadedGraph {
        root_id,
        graph,
        field_info,
        settings,
    })
}

/// Map a key to a graph node by internal id, then by readable id.
///
/// Keys matching no node are handed to the source.
async fn resolve_in_graph(app: &App, graph: &IssueGraph, key: &str) -> Result<IssueId> {
    let id = IssueId::new(key);
    if graph.contains(&id) {
        return Ok(id);
    }
    if let Some(issue) = graph
        .iter()
        .find(|issue| issue.id_readable.eq_ignore_ascii_case(key))
    {
        return Ok(issue.id.clone());
    }
    Ok(app.source().resolve_id(key).await?)
}

/// The view filter selected by the filter flags.
///
/// Excluding a value of a field without a known legend allows every value
/// observed in the graph except the excluded ones.
fn build_filter(graph: &IssueGraph, field_info: &FieldInfo, args: &FilterArgs) -> FilterState {
    let mut filter = FilterState::from_field_info(field_info);
    filter.show_orphans = args.show_orphans;
    filter.show_when_links_unknown = !args.hide_unknown_links;

    let excludes = [
        (FilterField::State, &args.exclude_state),
        (FilterField::Type, &args.exclude_type),
    ];
    for (field, values) in excludes {
        if values.is_empty() {
            continue;
        }
        let known = match field {
            FilterField::State => &mut filter.state,
            FilterField::Type => &mut filter.issue_type,
        };
        if known.is_none() {
            *known = Some(observed_values(graph, field));
        }
        for value in values {
            filter.set_allowed(field, value, false);
        }
    }

    filter
}

fn observed_values(graph: &IssueGraph, field: FilterField) -> BTreeMap<String, bool> {
    graph
        .iter()
        .filter_map(|issue| match field {
            FilterField::State => issue.state.clone(),
            FilterField::Type => issue.issue_type.clone(),
        })
        .map(|value| (value, true))
        .collect()
}
