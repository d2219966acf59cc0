//! Traversal read models
//!
//! `TraversalNode` is a per-query snapshot of a stored node, carrying a signed
//! distance from the queried node: positive toward ancestors, negative toward
//! descendants, zero for the node itself and its neighbors. Snapshots are
//! created fresh for every traversal and never persisted.

use serde::{Deserialize, Serialize};

use super::Node;

/// How much of each node's text a traversal result carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentLevel {
    /// Titles only; content and summary are dropped
    TitlesOnly,
    /// Titles and summaries; content is dropped
    TitlesAndSummaries,
    /// Everything, subject to distance-based degradation
    #[default]
    FullContent,
}

/// A node as seen from a traversal, with its signed distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraversalNode {
    pub id: u64,
    pub title: String,
    /// Full content, unless degraded away
    pub content: Option<String>,
    /// Summary, unless degraded away
    pub summary: Option<String>,
    /// Hops from the queried node; positive = ancestor, negative = descendant
    pub distance: i32,
    /// Marks the queried node itself in a primary-target traversal
    pub is_target: bool,
    /// Marks nodes pulled in by neighborhood expansion
    pub is_neighbor: bool,
}

impl TraversalNode {
    /// Snapshot a stored node at the given distance
    pub fn from_node(node: &Node, distance: i32) -> Self {
        Self {
            id: node.id,
            title: node.title.clone(),
            content: Some(node.content.clone()),
            summary: Some(node.summary.clone()),
            distance,
            is_target: false,
            is_neighbor: false,
        }
    }
}

/// Knobs for a single traversal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraversalOptions {
    /// Maximum hop count in either direction
    pub max_depth: u32,
    /// Follow outbound references toward ancestors
    pub include_parents: bool,
    /// Follow inbound references toward descendants
    pub include_children: bool,
    /// Expand the undirected neighborhood around a primary target
    pub include_neighborhood: bool,
    /// Hop radius for neighborhood expansion
    pub neighborhood_radius: u32,
    /// Text detail carried by the result
    pub content_level: ContentLevel,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            max_depth: 10,
            include_parents: true,
            include_children: false,
            include_neighborhood: false,
            neighborhood_radius: 1,
            content_level: ContentLevel::FullContent,
        }
    }
}

impl TraversalOptions {
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_parents(mut self, include: bool) -> Self {
        self.include_parents = include;
        self
    }

    pub fn with_children(mut self, include: bool) -> Self {
        self.include_children = include;
        self
    }

    /// Enable neighborhood expansion with the given radius
    pub fn with_neighborhood(mut self, radius: u32) -> Self {
        self.include_neighborhood = true;
        self.neighborhood_radius = radius;
        self
    }

    pub fn with_content_level(mut self, level: ContentLevel) -> Self {
        self.content_level = level;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = TraversalOptions::default();
        assert_eq!(options.max_depth, 10);
        assert!(options.include_parents);
        assert!(!options.include_children);
        assert!(!options.include_neighborhood);
        assert_eq!(options.neighborhood_radius, 1);
        assert_eq!(options.content_level, ContentLevel::FullContent);
    }

    #[test]
    fn test_builder_chain() {
        let options = TraversalOptions::default()
            .with_max_depth(5)
            .with_children(true)
            .with_neighborhood(3)
            .with_content_level(ContentLevel::TitlesOnly);
        assert_eq!(options.max_depth, 5);
        assert!(options.include_children);
        assert!(options.include_neighborhood);
        assert_eq!(options.neighborhood_radius, 3);
        assert_eq!(options.content_level, ContentLevel::TitlesOnly);
    }

    #[test]
    fn test_from_node_snapshot() {
        let node = Node::new(3, "Snap", "full content here").with_summary("Short");
        let snapshot = TraversalNode::from_node(&node, 2);
        assert_eq!(snapshot.id, 3);
        assert_eq!(snapshot.title, "Snap");
        assert_eq!(snapshot.content.as_deref(), Some("full content here"));
        assert_eq!(snapshot.summary.as_deref(), Some("Short"));
        assert_eq!(snapshot.distance, 2);
        assert!(!snapshot.is_target);
        assert!(!snapshot.is_neighbor);
    }

    #[test]
    fn test_content_level_serde_names() {
        let json = serde_json::to_string(&ContentLevel::TitlesAndSummaries).unwrap();
        assert_eq!(json, "\"titles_and_summaries\"");
        let level: ContentLevel = serde_json::from_str("\"full_content\"").unwrap();
        assert_eq!(level, ContentLevel::FullContent);
    }
}
