//! Traversal Result Flattening
//!
//! Renders an unordered list of distance-tagged nodes as a linear document:
//! an ASCII tree sketch of the hierarchy followed by every node's content in
//! traversal order, numbered. The hierarchy is reconstructed purely from
//! each node's signed distance; nodes at the maximum observed distance
//! become roots, each level links the level below it, and targets adopt the
//! descendant levels.
//!
//! Output is deterministic for a given input order, which makes it suitable
//! both for human reading and as LLM context.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::TraversalNode;
use crate::utils::strip_front_matter;

/// Render nodes as an ASCII tree plus an ordered content listing
///
/// Targets are suffixed `[*]`, neighborhood nodes `(neighbor)`. Empty input
/// yields a placeholder message rather than an empty string.
pub fn flatten(nodes: &[TraversalNode]) -> String {
    if nodes.is_empty() {
        return "No nodes to display.".to_string();
    }

    let (structure, roots) = build_structure(nodes);
    let node_map: HashMap<u64, &TraversalNode> = nodes.iter().map(|n| (n.id, n)).collect();

    let tree_visual = render_ascii_tree(&structure, &roots, &node_map);
    let contents = render_ordered_contents(&structure, &roots, &node_map);

    format!("=== TREE STRUCTURE ===\n{tree_visual}\n\n=== NODE CONTENTS ===\n{contents}")
}

/// Derive parent-child edges from signed distances
///
/// Ancestor levels each link every node one level below them. Target and
/// zero-distance nodes link all direct descendants; deeper descendants
/// attach to the first node one level above them in input order.
fn build_structure(nodes: &[TraversalNode]) -> (HashMap<u64, Vec<u64>>, Vec<u64>) {
    let mut depth_levels: BTreeMap<i32, Vec<u64>> = BTreeMap::new();
    for node in nodes {
        depth_levels.entry(node.distance).or_default().push(node.id);
    }

    let mut structure: HashMap<u64, Vec<u64>> = HashMap::new();

    for (&depth, parents) in depth_levels.iter().rev() {
        if depth <= 0 {
            break;
        }
        if let Some(children) = depth_levels.get(&(depth - 1)) {
            for &parent in parents {
                let entry = structure.entry(parent).or_default();
                for &child in children {
                    if !entry.contains(&child) {
                        entry.push(child);
                    }
                }
            }
        }
    }

    for node in nodes {
        if !node.is_target && node.distance != 0 {
            continue;
        }
        for child in nodes {
            if child.distance >= 0 {
                continue;
            }
            if child.distance == -1 {
                let entry = structure.entry(node.id).or_default();
                if !entry.contains(&child.id) {
                    entry.push(child.id);
                }
            } else if let Some(parent) = nodes.iter().find(|p| p.distance == child.distance + 1) {
                let entry = structure.entry(parent.id).or_default();
                if !entry.contains(&child.id) {
                    entry.push(child.id);
                }
            }
        }
    }

    let max_depth = depth_levels.keys().next_back().copied().unwrap_or(0);
    let roots = depth_levels.get(&max_depth).cloned().unwrap_or_default();

    (structure, roots)
}

fn decorated_title(node: &TraversalNode) -> String {
    if node.is_target {
        format!("{} [*]", node.title)
    } else if node.is_neighbor {
        format!("{} (neighbor)", node.title)
    } else {
        node.title.clone()
    }
}

fn render_ascii_tree(
    structure: &HashMap<u64, Vec<u64>>,
    roots: &[u64],
    node_map: &HashMap<u64, &TraversalNode>,
) -> String {
    let mut render = AsciiRender {
        structure,
        node_map,
        lines: Vec::new(),
        visited: HashSet::new(),
    };
    for &root in roots {
        render.node(root, "", true, true);
    }
    render.lines.join("\n")
}

struct AsciiRender<'a> {
    structure: &'a HashMap<u64, Vec<u64>>,
    node_map: &'a HashMap<u64, &'a TraversalNode>,
    lines: Vec<String>,
    visited: HashSet<u64>,
}

impl AsciiRender<'_> {
    fn node(&mut self, id: u64, prefix: &str, is_last: bool, is_root: bool) {
        if !self.visited.insert(id) {
            return;
        }
        let Some(node) = self.node_map.get(&id) else {
            return;
        };

        let title = decorated_title(node);
        if is_root {
            self.lines.push(title);
        } else {
            let connector = if is_last { "└── " } else { "├── " };
            self.lines.push(format!("{prefix}{connector}{title}"));
        }

        let children: Vec<u64> = self.structure.get(&id).cloned().unwrap_or_default();
        for (i, &child) in children.iter().enumerate() {
            let child_prefix = if is_root {
                String::new()
            } else {
                format!("{prefix}{}", if is_last { "    " } else { "│   " })
            };
            self.node(child, &child_prefix, i + 1 == children.len(), false);
        }
    }
}

fn render_ordered_contents(
    structure: &HashMap<u64, Vec<u64>>,
    roots: &[u64],
    node_map: &HashMap<u64, &TraversalNode>,
) -> String {
    let mut render = ContentRender {
        structure,
        node_map,
        lines: Vec::new(),
        visited: HashSet::new(),
        counter: 1,
    };
    for &root in roots {
        render.node(root);
    }
    render.lines.join("\n")
}

struct ContentRender<'a> {
    structure: &'a HashMap<u64, Vec<u64>>,
    node_map: &'a HashMap<u64, &'a TraversalNode>,
    lines: Vec<String>,
    visited: HashSet<u64>,
    counter: usize,
}

impl ContentRender<'_> {
    fn node(&mut self, id: u64) {
        if !self.visited.insert(id) {
            return;
        }
        let Some(node) = self.node_map.get(&id) else {
            return;
        };

        self.lines
            .push(format!("[{}] {}", self.counter, decorated_title(node)));

        match node.content.as_deref() {
            Some(content) if !content.is_empty() => {
                let cleaned = strip_front_matter(content);
                if !cleaned.is_empty() {
                    self.lines.push(format!("Content: {cleaned}"));
                }
            }
            _ => self.lines.push("Content: (empty)".to_string()),
        }

        self.lines.push(String::new());
        self.counter += 1;

        let children: Vec<u64> = self.structure.get(&id).cloned().unwrap_or_default();
        for child in children {
            self.node(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tnode(id: u64, title: &str, distance: i32) -> TraversalNode {
        TraversalNode {
            id,
            title: title.to_string(),
            content: Some(format!("{title} body")),
            summary: Some(format!("{title} summary")),
            distance,
            is_target: false,
            is_neighbor: false,
        }
    }

    #[test]
    fn test_empty_input_placeholder() {
        assert_eq!(flatten(&[]), "No nodes to display.");
    }

    #[test]
    fn test_single_target_node() {
        let mut solo = tnode(1, "Solo", 0);
        solo.is_target = true;
        solo.content = Some("body".to_string());

        let output = flatten(&[solo]);
        assert_eq!(
            output,
            "=== TREE STRUCTURE ===\nSolo [*]\n\n=== NODE CONTENTS ===\n[1] Solo [*]\nContent: body\n"
        );
        let tree_section = output.split("=== NODE CONTENTS ===").next().unwrap();
        assert_eq!(tree_section.matches("[*]").count(), 1);
    }

    #[test]
    fn test_chain_renders_nested() {
        let mut target = tnode(30, "Target", 0);
        target.is_target = true;
        let nodes = vec![
            tnode(10, "Root", 2),
            tnode(20, "Mid", 1),
            target,
            tnode(40, "Child", -1),
            tnode(50, "Grandchild", -2),
        ];

        let output = flatten(&nodes);
        let expected_tree = "Root\n\
                             └── Mid\n    \
                             └── Target [*]\n        \
                             └── Child\n            \
                             └── Grandchild";
        assert!(output.contains(expected_tree));

        // content follows traversal order
        assert!(output.contains("[1] Root"));
        assert!(output.contains("[2] Mid"));
        assert!(output.contains("[3] Target [*]"));
        assert!(output.contains("[4] Child"));
        assert!(output.contains("[5] Grandchild"));
    }

    #[test]
    fn test_shared_child_rendered_once() {
        let mut target = tnode(3, "Shared Target", 0);
        target.is_target = true;
        let nodes = vec![tnode(1, "Left", 1), tnode(2, "Right", 1), target];

        let output = flatten(&nodes);
        let tree_section = output.split("\n\n=== NODE CONTENTS ===").next().unwrap();
        assert_eq!(
            tree_section,
            "=== TREE STRUCTURE ===\nLeft\n└── Shared Target [*]\nRight"
        );
        assert!(output.contains("[1] Left"));
        assert!(output.contains("[2] Shared Target [*]"));
        assert!(output.contains("[3] Right"));
    }

    #[test]
    fn test_neighbor_suffix_and_empty_content() {
        let mut target = tnode(1, "Target", 0);
        target.is_target = true;
        let mut neighbor = tnode(2, "Nearby", 0);
        neighbor.is_neighbor = true;
        neighbor.content = None;

        let output = flatten(&[target, neighbor]);
        assert!(output.contains("Nearby (neighbor)"));
        assert!(output.contains("[2] Nearby (neighbor)\nContent: (empty)"));
    }

    #[test]
    fn test_front_matter_stripped_from_content() {
        let mut node = tnode(1, "Doc", 0);
        node.is_target = true;
        node.content = Some("---\ntags: draft\n---\nReal body".to_string());

        let output = flatten(&[node]);
        assert!(output.contains("Content: Real body"));
        assert!(!output.contains("tags: draft"));
    }

    #[test]
    fn test_content_line_omitted_when_only_front_matter() {
        let mut node = tnode(1, "Doc", 0);
        node.is_target = true;
        node.content = Some("---\ntags: draft\n---".to_string());

        let output = flatten(&[node]);
        assert!(output.ends_with("[1] Doc [*]\n"));
        assert!(!output.contains("Content:"));
    }

    #[test]
    fn test_branch_glyphs_for_siblings() {
        let mut target = tnode(1, "Target", 0);
        target.is_target = true;
        let nodes = vec![target, tnode(2, "First Child", -1), tnode(3, "Second Child", -1)];

        let output = flatten(&nodes);
        assert!(output.contains("├── First Child"));
        assert!(output.contains("└── Second Child"));
    }
}
