//! In-memory forest store
//!
//! `TreeStore` owns every node in the forest and is the only writer of tree
//! shape: `parent_id` and `children` are kept consistent by its mutation
//! methods. Callers share it behind `Arc<tokio::sync::RwLock<TreeStore>>`;
//! mutation paths take the write lock, traversal and ranking take read locks.
//!
//! # Examples
//!
//! ```rust
//! use streamtree_core::store::TreeStore;
//!
//! let mut store = TreeStore::new();
//! let root = store.create_node("Planning", "Kickoff notes.", "", None, "");
//! let child = store.create_node("Budget", "Numbers.", "", Some(root), "part of");
//!
//! assert_eq!(root, 1);
//! assert_eq!(store.get(root).unwrap().children, vec![child]);
//! ```

use std::collections::HashMap;

use tracing::{info, warn};

use crate::models::Node;
use crate::utils::{similarity, DEFAULT_MATCH_THRESHOLD};

use super::StoreError;

/// An immediate neighbor of a node, as handed to the optimization classifier
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborInfo {
    pub id: u64,
    pub title: String,
    pub summary: String,
    /// Edge label recorded between the two nodes, when one exists
    pub relationship: Option<String>,
}

/// In-memory forest of nodes keyed by integer id
#[derive(Debug, Clone, Default)]
pub struct TreeStore {
    nodes: HashMap<u64, Node>,
    next_id: u64,
}

impl TreeStore {
    /// Create an empty forest; ids are assigned from 1
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next_id: 1,
        }
    }

    /// Create a node, optionally under a parent
    ///
    /// A blank `summary` is derived from the content. A `parent_id` that does
    /// not resolve is logged and dropped, creating the node as a root. When
    /// the node lands under a parent, its content gains a trailing
    /// `[[<parent_id>]]` reference unless one is already present, keeping the
    /// forest traversable by content links.
    ///
    /// Returns the new node's id.
    pub fn create_node(
        &mut self,
        title: impl Into<String>,
        content: impl Into<String>,
        summary: impl Into<String>,
        parent_id: Option<u64>,
        relationship: impl Into<String>,
    ) -> u64 {
        let mut parent_id = parent_id;
        if let Some(pid) = parent_id {
            if !self.nodes.contains_key(&pid) {
                warn!(parent_id = pid, "parent does not exist, creating node as root");
                parent_id = None;
            }
        }

        let id = self.next_id;
        let summary = summary.into();
        let mut node = Node::new(id, title, content);
        if !summary.trim().is_empty() {
            node = node.with_summary(summary);
        }

        if let Some(pid) = parent_id {
            node = node.with_parent(pid, relationship);
            let marker = format!("[[{pid}]]");
            if !node.content.contains(&marker) {
                if node.content.trim().is_empty() {
                    node.content = marker;
                } else {
                    node.content.push_str("\n\n");
                    node.content.push_str(&marker);
                }
            }
        }

        self.nodes.insert(id, node);
        if let Some(pid) = parent_id {
            if let Some(parent) = self.nodes.get_mut(&pid) {
                parent.children.push(id);
            }
        }
        self.next_id += 1;

        id
    }

    /// Replace a node's content and summary completely
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NodeNotFound` when the id does not resolve.
    pub fn update_node(
        &mut self,
        id: u64,
        content: impl Into<String>,
        summary: impl Into<String>,
    ) -> Result<(), StoreError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| StoreError::node_not_found(id))?;
        node.set_content(content, summary);
        Ok(())
    }

    /// Append a content fragment to an existing node
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NodeNotFound` when the id does not resolve.
    pub fn append_content(&mut self, id: u64, fragment: &str) -> Result<(), StoreError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| StoreError::node_not_found(id))?;
        node.append_fragment(fragment);
        Ok(())
    }

    /// Remove a node, unlinking it from its parent and orphaning its children
    ///
    /// Children keep their relationship labels toward the removed node; only
    /// tree shape is rewritten.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NodeNotFound` when the id does not resolve.
    pub fn remove_node(&mut self, id: u64) -> Result<Node, StoreError> {
        let node = self
            .nodes
            .remove(&id)
            .ok_or_else(|| StoreError::node_not_found(id))?;

        if let Some(pid) = node.parent_id {
            if let Some(parent) = self.nodes.get_mut(&pid) {
                parent.children.retain(|&child| child != id);
            }
        }
        for &child_id in &node.children {
            if let Some(child) = self.nodes.get_mut(&child_id) {
                child.parent_id = None;
            }
        }

        Ok(node)
    }

    /// Look up a node by id
    pub fn get(&self, id: u64) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Whether a node with this id exists
    pub fn contains(&self, id: u64) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes in the forest
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the forest holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Ids of all root nodes, ascending
    pub fn roots(&self) -> Vec<u64> {
        let mut roots: Vec<u64> = self
            .nodes
            .values()
            .filter(|node| node.is_root())
            .map(|node| node.id)
            .collect();
        roots.sort_unstable();
        roots
    }

    /// Ids of the most recently modified nodes, newest first
    pub fn recent_nodes(&self, limit: usize) -> Vec<u64> {
        let mut ids: Vec<u64> = self.nodes.keys().copied().collect();
        ids.sort_unstable_by(|a, b| {
            self.nodes[b]
                .modified_at
                .cmp(&self.nodes[a].modified_at)
                .then_with(|| a.cmp(b))
        });
        ids.truncate(limit);
        ids
    }

    /// Resolve a node by title
    ///
    /// Exact case-insensitive comparison first, then the best fuzzy match at
    /// or above the similarity cutoff. Lower ids win ties so lookups are
    /// deterministic.
    pub fn find_by_name(&self, name: &str) -> Option<u64> {
        if name.trim().is_empty() || self.nodes.is_empty() {
            return None;
        }
        let needle = name.to_lowercase();

        let mut ids: Vec<u64> = self.nodes.keys().copied().collect();
        ids.sort_unstable();

        for &id in &ids {
            if self.nodes[&id].title.to_lowercase() == needle {
                return Some(id);
            }
        }

        let mut best: Option<(u64, f64)> = None;
        for &id in &ids {
            let score = similarity(&self.nodes[&id].title.to_lowercase(), &needle);
            if score >= DEFAULT_MATCH_THRESHOLD && best.map_or(true, |(_, s)| score > s) {
                best = Some((id, score));
            }
        }

        if let Some((id, score)) = best {
            info!(name, matched_id = id, score, "fuzzy name match");
            return Some(id);
        }
        None
    }

    /// Immediate neighbors of a node: its parent, then its children
    ///
    /// The parent entry carries the child-to-parent relationship label; child
    /// entries carry their label toward this node. At most `max_neighbors`
    /// entries are returned.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NodeNotFound` when the id does not resolve.
    pub fn neighbors(&self, id: u64, max_neighbors: usize) -> Result<Vec<NeighborInfo>, StoreError> {
        let node = self
            .nodes
            .get(&id)
            .ok_or_else(|| StoreError::node_not_found(id))?;

        let mut neighbors = Vec::new();

        if let Some(pid) = node.parent_id {
            if let Some(parent) = self.nodes.get(&pid) {
                neighbors.push(NeighborInfo {
                    id: pid,
                    title: parent.title.clone(),
                    summary: parent.summary.clone(),
                    relationship: node.relationship_to(pid).map(str::to_string),
                });
            }
        }

        for &child_id in &node.children {
            if neighbors.len() >= max_neighbors {
                break;
            }
            if let Some(child) = self.nodes.get(&child_id) {
                neighbors.push(NeighborInfo {
                    id: child_id,
                    title: child.title.clone(),
                    summary: child.summary.clone(),
                    relationship: child.relationship_to(id).map(str::to_string),
                });
            }
        }

        Ok(neighbors)
    }

    /// Textual neighbor rendering for the optimization classifier
    ///
    /// One `(id) title [label]: summary` line per neighbor; the label is
    /// omitted when no relationship is recorded.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NodeNotFound` when the id does not resolve.
    pub fn neighbor_description(
        &self,
        id: u64,
        max_neighbors: usize,
    ) -> Result<String, StoreError> {
        let neighbors = self.neighbors(id, max_neighbors)?;
        if neighbors.is_empty() {
            return Ok("(no neighbors)".to_string());
        }

        let lines: Vec<String> = neighbors
            .iter()
            .map(|n| match &n.relationship {
                Some(rel) => format!("({}) {} [{}]: {}", n.id, n.title, rel, n.summary),
                None => format!("({}) {}: {}", n.id, n.title, n.summary),
            })
            .collect();
        Ok(lines.join("\n"))
    }

    /// Compact tree overview for the placement classifier
    ///
    /// One `(id) title: summary` line for each of the most recently modified
    /// nodes, newest first.
    pub fn placement_summary(&self, limit: usize) -> String {
        if self.nodes.is_empty() {
            return "No existing nodes yet".to_string();
        }

        let lines: Vec<String> = self
            .recent_nodes(limit)
            .into_iter()
            .filter_map(|id| self.nodes.get(&id))
            .map(|node| format!("({}) {}: {}", node.id, node.title, node.summary))
            .collect();
        lines.join("\n")
    }
}
