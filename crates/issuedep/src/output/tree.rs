//! Dependency tree rendering for `issuedep graph` output.
//!
//! The graph may contain cycles and shared nodes, so a tree is a spanning
//! tree of one side: issues are visited breadth-first from the root and each
//! issue hangs under the first parent that reached it.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{self, Write};

use colored::Colorize;

use super::OutputConfig;
use super::color::{colorize_field_value, colorize_id, dimmed, resolved_icon, warning};
use crate::domain::{FieldInfoField, FollowDirection, IssueId, IssueInfo};
use crate::graph::IssueGraph;

/// A node in a dependency tree for rendering purposes.
#[derive(Debug, Clone, PartialEq)]
pub struct DepTreeNode {
    /// Display ID of this node.
    pub id: String,
    /// Relation label from the parent's point of view (if any).
    pub relation: Option<String>,
    /// State value.
    pub state: Option<String>,
    /// Whether the issue is resolved.
    pub resolved: bool,
    /// Issue summary.
    pub summary: String,
    /// Whether the issue's own links were fetched.
    pub links_known: bool,
    /// Children of this node in the dependency tree.
    pub children: Vec<DepTreeNode>,
}

impl DepTreeNode {
    fn leaf(issue: &IssueInfo, relation: Option<String>) -> Self {
        Self {
            id: issue.id_readable.clone(),
            relation,
            state: issue.state.clone(),
            resolved: issue.resolved,
            summary: issue.summary.clone(),
            links_known: issue.links_known,
            children: Vec::new(),
        }
    }

    /// Spanning tree of the links on `side` reachable from `root_id`.
    ///
    /// Only links of issues showing `side` are followed, and only to targets
    /// present in `graph`. Returns `None` if the root is not in the graph.
    pub fn from_graph(graph: &IssueGraph, root_id: &IssueId, side: FollowDirection) -> Option<Self> {
        let root = graph.get(root_id)?;

        let mut visited: HashSet<&IssueId> = HashSet::from([&root.id]);
        let mut children: HashMap<&IssueId, Vec<(&IssueId, String)>> = HashMap::new();
        let mut queue: VecDeque<&IssueInfo> = VecDeque::from([root]);

        while let Some(issue) = queue.pop_front() {
            if !issue.shows(side) {
                continue;
            }
            for link in issue.links(side) {
                let Some(target) = graph.get(&link.target_id) else {
                    continue;
                };
                if visited.insert(&target.id) {
                    children
                        .entry(&issue.id)
                        .or_default()
                        .push((&target.id, link.label().to_string()));
                    queue.push_back(target);
                }
            }
        }

        Some(Self::assemble(graph, root, None, &children))
    }

    fn assemble(
        graph: &IssueGraph,
        issue: &IssueInfo,
        relation: Option<String>,
        children: &HashMap<&IssueId, Vec<(&IssueId, String)>>,
    ) -> Self {
        let mut node = Self::leaf(issue, relation);
        node.children = children
            .get(&issue.id)
            .into_iter()
            .flatten()
            .filter_map(|(id, label)| {
                graph
                    .get(id)
                    .map(|child| Self::assemble(graph, child, Some(label.clone()), children))
            })
            .collect();
        node
    }

    /// Number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

/// Render the dependency tree with ASCII art connectors.
///
/// Renders a tree like:
/// ```text
/// ◆ PROJ-1 [Open] Ship the release
/// ├── PROJ-2 (depends on) [Done] ✓ Write docs
/// │   └── PROJ-4 (depends on) [Open] ○ Review docs
/// └── PROJ-3 (subtask of) [Open] ○ Tag the build
/// ```
pub fn print_dep_tree_text<W: Write>(
    w: &mut W,
    root: &DepTreeNode,
    states: Option<&FieldInfoField>,
    config: &OutputConfig,
) -> io::Result<()> {
    let root_icon = if config.use_ascii { "*" } else { "◆" };
    let root_icon_str = if config.use_colors {
        root_icon.cyan().bold().to_string()
    } else {
        root_icon.to_string()
    };

    writeln!(
        w,
        "{} {}{} {}",
        root_icon_str,
        colorize_id(&root.id, config),
        state_str(root, states, config),
        root.summary
    )?;

    print_dep_tree_children(w, &root.children, &[], states, config)
}

fn state_str(node: &DepTreeNode, states: Option<&FieldInfoField>, config: &OutputConfig) -> String {
    node.state
        .as_deref()
        .map(|s| format!(" [{}]", colorize_field_value(s, states, config)))
        .unwrap_or_default()
}

/// Recursively render tree children with proper connector lines.
///
/// `prefix_segments` tracks which ancestor levels still have siblings below,
/// used to draw the vertical continuation lines (`│`).
fn print_dep_tree_children<W: Write>(
    w: &mut W,
    children: &[DepTreeNode],
    prefix_segments: &[bool],
    states: Option<&FieldInfoField>,
    config: &OutputConfig,
) -> io::Result<()> {
    let (branch, corner, pipe, space) = if config.use_ascii {
        ("|-- ", "`-- ", "|   ", "    ")
    } else {
        ("├── ", "└── ", "│   ", "    ")
    };

    for (i, child) in children.iter().enumerate() {
        let is_last = i == children.len() - 1;

        let prefix: String = prefix_segments
            .iter()
            .map(|&has_more| dimmed(if has_more { pipe } else { space }, config))
            .collect();
        let connector_str = dimmed(if is_last { corner } else { branch }, config);

        let relation_str = child
            .relation
            .as_deref()
            .map(|r| format!(" {}", dimmed(&format!("({r})"), config)))
            .unwrap_or_default();
        let unknown_str = if child.links_known {
            String::new()
        } else {
            format!(" {}", warning("?", config))
        };

        writeln!(
            w,
            "{}{}{}{}{} {}{} {}",
            prefix,
            connector_str,
            colorize_id(&child.id, config),
            relation_str,
            state_str(child, states, config),
            resolved_icon(child.resolved, config),
            unknown_str,
            child.summary
        )?;

        if !child.children.is_empty() {
            let mut next_segments = prefix_segments.to_vec();
            next_segments.push(!is_last);
            print_dep_tree_children(w, &child.children, &next_segments, states, config)?;
        }
    }

    Ok(())
}

/// Convert a dependency tree to a JSON value for programmatic output.
pub fn dep_tree_to_json(node: &DepTreeNode) -> serde_json::Value {
    let mut obj = serde_json::json!({
        "id": node.id,
        "summary": node.summary,
        "resolved": node.resolved,
        "linksKnown": node.links_known,
    });

    if let Some(relation) = &node.relation {
        obj["relation"] = serde_json::json!(relation);
    }
    if let Some(state) = &node.state {
        obj["state"] = serde_json::json!(state);
    }
    obj["children"] = serde_json::json!(
        node.children
            .iter()
            .map(dep_tree_to_json)
            .collect::<Vec<_>>()
    );

    obj
}
