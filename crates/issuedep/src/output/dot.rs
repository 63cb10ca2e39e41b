//! Graphviz rendering of a projected dependency graph.
//!
//! Every visible link becomes one edge from its owning issue to the target,
//! labelled from the owner's point of view. Subtask links owned by the parent
//! also get a diamond at the parent end. Node colors follow the state legend.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use petgraph::visit::EdgeRef;

use super::color::parse_hex_color;
use crate::domain::{FieldInfoField, IssueId, IssueInfo};
use crate::graph::IssueGraph;
use crate::projection::{VisibleEdge, visible_edges};

/// Node weight of the rendered graph.
#[derive(Debug, Clone)]
struct DotNode {
    label: String,
    depth: u32,
    colors: Option<(String, String)>,
}

impl DotNode {
    fn new(issue: &IssueInfo, states: Option<&FieldInfoField>) -> Self {
        let colors = issue
            .state
            .as_deref()
            .and_then(|state| states.and_then(|legend| legend.lookup(state)))
            .filter(|entry| {
                parse_hex_color(&entry.background).is_some()
                    && parse_hex_color(&entry.foreground).is_some()
            })
            .map(|entry| (entry.background.clone(), entry.foreground.clone()));
        let mut label = format!("{}: {}", issue.id_readable, issue.summary);
        if !issue.links_known {
            label.push_str(" (?)");
        }
        Self {
            label,
            depth: issue.depth,
            colors,
        }
    }
}

impl fmt::Display for DotNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

struct DotEdge(VisibleEdge);

impl fmt::Display for DotEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.label)
    }
}

/// Render `graph` in Graphviz DOT format.
///
/// With `hierarchical` set, issues of equal depth share a rank and ranks run
/// top to bottom from the root.
pub fn to_dot(graph: &IssueGraph, states: Option<&FieldInfoField>, hierarchical: bool) -> String {
    let mut dot_graph: DiGraph<DotNode, DotEdge> = DiGraph::new();
    let mut indices: HashMap<&IssueId, NodeIndex> = HashMap::new();

    let mut issues: Vec<&IssueInfo> = graph.iter().collect();
    issues.sort_by(|a, b| (a.depth, &a.id).cmp(&(b.depth, &b.id)));
    for issue in issues {
        let index = dot_graph.add_node(DotNode::new(issue, states));
        indices.insert(&issue.id, index);
    }

    for edge in visible_edges(graph) {
        if let (Some(&from), Some(&to)) = (indices.get(&edge.from), indices.get(&edge.to)) {
            dot_graph.add_edge(from, to, DotEdge(edge));
        }
    }

    let edge_attrs = |_: &DiGraph<DotNode, DotEdge>, edge: EdgeReference<'_, DotEdge>| {
        if edge.weight().0.arrow_at_source() {
            "dir=both arrowtail=diamond".to_string()
        } else {
            String::new()
        }
    };
    let node_attrs = |_: &DiGraph<DotNode, DotEdge>, (_, node): (NodeIndex, &DotNode)| {
        match &node.colors {
            Some((background, foreground)) => format!(
                "shape=box style=filled fillcolor=\"{background}\" fontcolor=\"{foreground}\""
            ),
            None => "shape=box".to_string(),
        }
    };
    let rendered = Dot::with_attr_getters(&dot_graph, &[], &edge_attrs, &node_attrs).to_string();
    if !hierarchical {
        return rendered;
    }

    let mut ranks: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for index in dot_graph.node_indices() {
        ranks
            .entry(dot_graph[index].depth)
            .or_default()
            .push(index.index().to_string());
    }
    let rank_lines: String = ranks
        .values()
        .map(|members| format!("    {{ rank=same; {}; }}\n", members.join("; ")))
        .collect();

    // Graph attributes go right after the header, rank groups before the footer
    let body = rendered
        .strip_prefix("digraph {\n")
        .and_then(|rest| rest.trim_end().strip_suffix('}'))
        .unwrap_or(&rendered);
    format!("digraph {{\n    rankdir=TB\n{body}{rank_lines}}}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DirectionType, FieldValueInfo, IssueLink};

    fn link(target: &str, link_type: &str, direction: DirectionType) -> IssueLink {
        IssueLink {
            target_id: IssueId::new(target),
            target_id_readable: target.to_uppercase(),
            link_type: link_type.into(),
            direction,
            target_to_source: "subtask of".into(),
            source_to_target: "parent for".into(),
        }
    }

    fn sample_graph() -> IssueGraph {
        let mut root = IssueInfo::new("r", "R-1", 0);
        root.summary = "Root".into();
        root.state = Some("Open".into());
        root.links_known = true;
        root.show_downstream = true;
        root.downstream_links
            .push(link("c", "Subtask", DirectionType::Outward));
        root.downstream_links
            .push(link("gone", "Subtask", DirectionType::Outward));

        let mut child = IssueInfo::new("c", "C-1", 1);
        child.summary = "Child".into();
        child.upstream_links.push(link("r", "Subtask", DirectionType::Inward));

        [root, child].into_iter().collect()
    }

    #[test]
    fn test_dot_nodes_and_edges() {
        let dot = to_dot(&sample_graph(), None, false);

        assert!(dot.starts_with("digraph {\n"), "got:\n{dot}");
        assert!(dot.trim_end().ends_with('}'), "got:\n{dot}");
        assert!(dot.contains("R-1: Root"), "got:\n{dot}");
        assert!(dot.contains("C-1: Child (?)"), "got:\n{dot}");
        assert!(dot.contains("parent for"), "got:\n{dot}");
        assert!(dot.contains("arrowtail=diamond"), "got:\n{dot}");
        // The child does not show its upstream side
        assert!(!dot.contains("subtask of"), "got:\n{dot}");
        assert_eq!(dot.matches("->").count(), 1, "got:\n{dot}");
        assert!(!dot.contains("rank=same"));
    }

    #[test]
    fn test_dot_state_colors_and_ranks() {
        let mut values = BTreeMap::new();
        values.insert(
            "Open".to_string(),
            FieldValueInfo {
                archived: false,
                color_id: None,
                background: "#ffee9c".into(),
                foreground: "#b45f06".into(),
            },
        );
        let legend = FieldInfoField {
            name: "State".into(),
            values,
        };

        let dot = to_dot(&sample_graph(), Some(&legend), true);
        assert!(dot.contains("fillcolor=\"#ffee9c\""), "got:\n{dot}");
        assert!(dot.contains("rankdir=TB"), "got:\n{dot}");
        assert!(dot.contains("{ rank=same; 0; }"), "got:\n{dot}");
        assert!(dot.contains("{ rank=same; 1; }"), "got:\n{dot}");
    }
}
