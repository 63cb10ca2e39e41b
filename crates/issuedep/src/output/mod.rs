//! Output formatting for CLI commands.
//!
//! This module provides utilities for formatting command output in both
//! human-readable text format and JSON format for programmatic use.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers (semantic colors, legend colors)
//! - [`dot`]: Graphviz rendering of the projected graph
//! - [`tree`]: Dependency tree rendering with ASCII/Unicode connectors

pub mod color;
pub mod dot;
pub mod tree;

use crate::domain::{FieldInfo, FieldInfoField, FollowDirection, IssueId, IssueInfo};
use crate::graph::{GraphStats, IssueGraph};
use crate::projection::{VisibleEdge, visible_edges};
use crate::schedule::IssueSchedule;
use serde::Serialize;
use std::env;
use std::io::{self, Write};

pub use color::{error, info, success, warning};
pub use tree::{DepTreeNode, dep_tree_to_json, print_dep_tree_text};

use color::{bold, colorize_field_value, colorize_id, dimmed, resolved_icon};

// ============================================================================
// Output Configuration
// ============================================================================

const DEFAULT_TERMINAL_WIDTH: u16 = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 100;

/// Configuration for output formatting.
///
/// This struct holds settings that control how output is formatted,
/// including terminal width limits, ASCII fallback mode, and color output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for text wrapping.
    pub max_width: usize,
    /// Whether to use ASCII-only icons instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new `OutputConfig` with explicit values.
    pub fn new(max_width: usize, use_ascii: bool, use_colors: bool) -> Self {
        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Create an `OutputConfig` by reading from environment variables.
    ///
    /// Reads:
    /// - `ISSUEDEP_MAX_WIDTH`: Maximum content width (default: 100)
    /// - `ISSUEDEP_ASCII`: Set to "1" or "true" for ASCII-only icons (default: false)
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `ISSUEDEP_COLOR`: Set to "0" or "false" to disable colors (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create an `OutputConfig` from the variables `lookup` returns.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_width = match lookup("ISSUEDEP_MAX_WIDTH") {
            Some(s) if !s.is_empty() => match s.parse() {
                Ok(width) => width,
                Err(_) => {
                    tracing::warn!(
                        env_var = "ISSUEDEP_MAX_WIDTH",
                        value = %s,
                        default = DEFAULT_MAX_CONTENT_WIDTH,
                        "Invalid value, using default"
                    );
                    DEFAULT_MAX_CONTENT_WIDTH
                }
            },
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        let use_ascii = match lookup("ISSUEDEP_ASCII") {
            Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
            Some(v) if v == "0" || v.eq_ignore_ascii_case("false") || v.is_empty() => false,
            Some(v) => {
                tracing::warn!(
                    env_var = "ISSUEDEP_ASCII",
                    value = %v,
                    "Invalid value (expected '1', 'true', '0', or 'false'), using default"
                );
                false
            }
            None => false,
        };

        // Respect NO_COLOR standard (https://no-color.org/)
        let use_colors = lookup("NO_COLOR").is_none()
            && lookup("ISSUEDEP_COLOR")
                .is_none_or(|v| v != "0" && !v.eq_ignore_ascii_case("false"));

        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_CONTENT_WIDTH,
            use_ascii: false,
            use_colors: true,
        }
    }
}

/// Get the current terminal width, falling back to default if detection fails.
fn get_terminal_width() -> usize {
    terminal_size::terminal_size()
        .map_or(DEFAULT_TERMINAL_WIDTH, |(w, _)| w.0)
        .into()
}

/// Wrap text to fit within a given width, preserving existing line breaks.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, max_width.max(1))
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

/// Print a simple message
pub fn print_message(msg: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{msg}")
}

/// Print a JSON-formatted result for any serializable value
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json(&mut handle, value)
}

fn write_json<W: Write, T: Serialize>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    writeln!(w, "{json}")
}

/// Programmatic form of a projected graph.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphReport<'a> {
    /// Root issue id
    pub root: &'a IssueId,
    /// Issue count and depth
    pub stats: GraphStats,
    /// Issues by id
    pub issues: &'a IssueGraph,
    /// Drawn relations
    pub edges: Vec<VisibleEdge>,
}

impl<'a> GraphReport<'a> {
    /// Report of `graph` rooted at `root`.
    pub fn new(root: &'a IssueId, graph: &'a IssueGraph) -> Self {
        Self {
            root,
            stats: graph.stats(),
            issues: graph,
            edges: visible_edges(graph),
        }
    }
}

/// Print a projected graph as upstream and downstream trees.
pub fn print_graph(
    graph: &IssueGraph,
    root_id: &IssueId,
    field_info: &FieldInfo,
    mode: OutputMode,
) -> io::Result<()> {
    match mode {
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            let config = OutputConfig::from_env();
            print_graph_text(&mut handle, graph, root_id, field_info, &config)
        }
        OutputMode::Json => print_json(&GraphReport::new(root_id, graph)),
    }
}

/// Print issues as a list.
pub fn print_issues(issues: &[&IssueInfo], field_info: &FieldInfo, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            let config = OutputConfig::from_env();
            print_issues_text(&mut handle, issues, field_info, &config)
        }
        OutputMode::Json => print_json(&issues),
    }
}

/// Print timeline entries.
pub fn print_schedule(entries: &[IssueSchedule], mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            let config = OutputConfig::from_env();
            print_schedule_text(&mut handle, entries, &config)
        }
        OutputMode::Json => print_json(&entries),
    }
}

// ============================================================================
// Text Formatting
// ============================================================================

fn print_graph_text<W: Write>(
    w: &mut W,
    graph: &IssueGraph,
    root_id: &IssueId,
    field_info: &FieldInfo,
    config: &OutputConfig,
) -> io::Result<()> {
    let states = field_info.state_field.as_ref();

    for side in FollowDirection::ALL {
        let Some(tree) = DepTreeNode::from_graph(graph, root_id, side) else {
            writeln!(w, "Root issue {root_id} is not shown.")?;
            return Ok(());
        };
        if tree.children.is_empty() {
            continue;
        }
        let title = match side {
            FollowDirection::Upstream => "Upstream",
            FollowDirection::Downstream => "Downstream",
        };
        writeln!(w, "{} ({}):", bold(title, config), tree.descendant_count())?;
        print_dep_tree_text(w, &tree, states, config)?;
        writeln!(w)?;
    }

    let stats = graph.stats();
    writeln!(
        w,
        "{} {} issue(s), max depth {}",
        dimmed("Graph:", config),
        stats.count,
        stats.max_depth
    )?;

    print_legend(w, states, config)
}

/// Print the state legend, skipping archived values.
fn print_legend<W: Write>(
    w: &mut W,
    states: Option<&FieldInfoField>,
    config: &OutputConfig,
) -> io::Result<()> {
    let Some(field) = states else {
        return Ok(());
    };
    let values: Vec<String> = field
        .values
        .iter()
        .filter(|(_, value)| !value.archived)
        .map(|(name, _)| colorize_field_value(name, Some(field), config))
        .collect();
    if values.is_empty() {
        return Ok(());
    }
    writeln!(w, "{} {}", dimmed(&format!("{}:", field.name), config), values.join("  "))
}

fn print_issues_text<W: Write>(
    w: &mut W,
    issues: &[&IssueInfo],
    field_info: &FieldInfo,
    config: &OutputConfig,
) -> io::Result<()> {
    if issues.is_empty() {
        writeln!(w, "No issues found.")?;
        return Ok(());
    }

    writeln!(w, "Found {} issue(s):", issues.len())?;
    writeln!(w)?;

    let width = get_terminal_width().min(config.max_width);
    let states = field_info.state_field.as_ref();
    let types = field_info.type_field.as_ref();

    for issue in issues {
        let state = issue
            .state
            .as_deref()
            .map(|s| format!(" [{}]", colorize_field_value(s, states, config)))
            .unwrap_or_default();
        let issue_type = issue
            .issue_type
            .as_deref()
            .map(|t| format!(" {}", colorize_field_value(t, types, config)))
            .unwrap_or_default();
        writeln!(
            w,
            "{} {}{}{} {}",
            resolved_icon(issue.resolved, config),
            colorize_id(&issue.id_readable, config),
            state,
            issue_type,
            dimmed(&format!("depth {}", issue.depth), config)
        )?;
        for line in wrap_text(&issue.summary, width.saturating_sub(4)) {
            writeln!(w, "    {line}")?;
        }
    }

    Ok(())
}

fn print_schedule_text<W: Write>(
    w: &mut W,
    entries: &[IssueSchedule],
    config: &OutputConfig,
) -> io::Result<()> {
    if entries.is_empty() {
        writeln!(w, "No scheduled issues found.")?;
        return Ok(());
    }

    let day = |date: Option<chrono::DateTime<chrono::Utc>>| {
        date.map_or_else(|| "?".repeat(10), |d| d.format("%Y-%m-%d").to_string())
    };

    for entry in entries {
        let work = match (entry.work.estimated_days, entry.work.work_factor) {
            (Some(estimated), Some(factor)) => {
                format!(" {}", dimmed(&format!("{estimated:.1}d est, {:.0}%", factor * 100.0), config))
            }
            (Some(estimated), None) => format!(" {}", dimmed(&format!("{estimated:.1}d est"), config)),
            _ => String::new(),
        };
        let overdue = if entry.overdue {
            format!(" {}", color::error("overdue", config))
        } else {
            String::new()
        };
        writeln!(
            w,
            "{} .. {}  {} {}{}{}",
            day(entry.start),
            day(entry.end),
            colorize_id(&entry.id_readable, config),
            entry.summary,
            work,
            overdue
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DirectionType, FieldValueInfo, IssueLink};
    use crate::schedule::WorkInfo;
    use chrono::{TimeZone, Utc};
    use std::collections::{BTreeMap, HashMap};

    fn plain() -> OutputConfig {
        OutputConfig::new(80, false, false)
    }

    fn field_info() -> FieldInfo {
        let mut values = BTreeMap::new();
        for (name, archived) in [("Open", false), ("Done", false), ("Obsolete", true)] {
            values.insert(
                name.to_string(),
                FieldValueInfo {
                    archived,
                    color_id: None,
                    background: "#ffffff".into(),
                    foreground: "#000000".into(),
                },
            );
        }
        FieldInfo {
            state_field: Some(FieldInfoField {
                name: "State".into(),
                values,
            }),
            type_field: None,
        }
    }

    fn graph() -> IssueGraph {
        let mut root = IssueInfo::new("r", "PROJ-1", 0);
        root.summary = "Ship it".into();
        root.state = Some("Open".into());
        root.links_known = true;
        root.show_upstream = true;
        root.show_downstream = true;
        root.upstream_links.push(IssueLink {
            target_id: IssueId::new("a"),
            target_id_readable: "PROJ-2".into(),
            link_type: "Depend".into(),
            direction: DirectionType::Outward,
            target_to_source: "is required for".into(),
            source_to_target: "depends on".into(),
        });

        let mut dep = IssueInfo::new("a", "PROJ-2", 1);
        dep.summary = "Write docs".into();
        dep.state = Some("Done".into());
        dep.resolved = true;

        [root, dep].into_iter().collect()
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_output_config_from_lookup() {
        let config = OutputConfig::from_lookup(lookup(&[
            ("ISSUEDEP_MAX_WIDTH", "120"),
            ("ISSUEDEP_ASCII", "1"),
        ]));
        assert_eq!(config, OutputConfig::new(120, true, true));

        let config = OutputConfig::from_lookup(lookup(&[
            ("ISSUEDEP_MAX_WIDTH", "invalid"),
            ("ISSUEDEP_ASCII", "maybe"),
            ("ISSUEDEP_COLOR", "false"),
        ]));
        assert_eq!(config, OutputConfig::new(DEFAULT_MAX_CONTENT_WIDTH, false, false));

        let config = OutputConfig::from_lookup(lookup(&[("NO_COLOR", "")]));
        assert!(!config.use_colors, "NO_COLOR should disable colors");

        assert_eq!(OutputConfig::from_lookup(lookup(&[])), OutputConfig::default());
    }

    #[test]
    fn test_wrap_text() {
        let wrapped = wrap_text("This is a test of text wrapping functionality", 20);
        assert!(wrapped.len() > 1);
        assert!(wrapped.iter().all(|line| line.len() <= 20));
        assert_eq!(wrap_text("Line one\nLine two", 50).len(), 2);
    }

    #[test]
    fn test_print_graph_text() {
        let mut buffer = Vec::new();
        print_graph_text(&mut buffer, &graph(), &IssueId::new("r"), &field_info(), &plain()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("Upstream (1):"), "got:\n{output}");
        assert!(!output.contains("Downstream"), "got:\n{output}");
        assert!(output.contains("◆ PROJ-1 [Open] Ship it"), "got:\n{output}");
        assert!(output.contains("└── PROJ-2 (depends on) [Done] ✓"), "got:\n{output}");
        assert!(output.contains("Graph: 2 issue(s), max depth 1"), "got:\n{output}");
        assert!(output.contains("State: Done  Open"), "got:\n{output}");
        assert!(!output.contains("Obsolete"), "got:\n{output}");
    }

    #[test]
    fn test_print_graph_text_missing_root() {
        let mut buffer = Vec::new();
        print_graph_text(&mut buffer, &graph(), &IssueId::new("x"), &field_info(), &plain()).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output, "Root issue x is not shown.\n");
    }

    #[test]
    fn test_graph_report_json() {
        let graph = graph();
        let root = IssueId::new("r");
        let mut buffer = Vec::new();
        write_json(&mut buffer, &GraphReport::new(&root, &graph)).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed["root"], "r");
        assert_eq!(parsed["stats"]["count"], 2);
        assert_eq!(parsed["stats"]["maxDepth"], 1);
        assert_eq!(parsed["issues"]["a"]["idReadable"], "PROJ-2");
        assert_eq!(parsed["edges"][0]["label"], "depends on");
        assert_eq!(parsed["edges"][0]["side"], "upstream");
    }

    #[test]
    fn test_print_issues_text() {
        let graph = graph();
        let issues = graph.sorted_by_depth();
        let mut buffer = Vec::new();
        print_issues_text(&mut buffer, &issues, &field_info(), &plain()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("Found 2 issue(s)"));
        assert!(output.contains("○ PROJ-1 [Open] depth 0"), "got:\n{output}");
        assert!(output.contains("✓ PROJ-2 [Done] depth 1"), "got:\n{output}");
        assert!(output.contains("    Write docs"));

        let mut buffer = Vec::new();
        print_issues_text(&mut buffer, &[], &field_info(), &plain()).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "No issues found.\n");
    }

    #[test]
    fn test_print_schedule_text() {
        let entries = vec![IssueSchedule {
            id: IssueId::new("a"),
            id_readable: "PROJ-2".into(),
            summary: "Write docs".into(),
            start: None,
            end: Some(Utc.with_ymd_and_hms(2024, 1, 12, 0, 0, 0).unwrap()),
            work: WorkInfo {
                estimated_days: Some(2.0),
                scheduled_days: None,
                work_factor: None,
            },
            overdue: true,
        }];
        let mut buffer = Vec::new();
        print_schedule_text(&mut buffer, &entries, &plain()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(
            output,
            "?????????? .. 2024-01-12  PROJ-2 Write docs 2.0d est overdue\n"
        );
    }
}
