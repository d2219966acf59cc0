//! Node data structures
//!
//! This module defines the core `Node` struct for the knowledge forest.
//!
//! # Architecture
//!
//! - **Integer identity**: ids are assigned by the store, monotonically from 1,
//!   and never reused
//! - **Tree shape**: `parent_id` and `children` are kept consistent by the
//!   store, which is the only writer
//! - **Semantic edges**: `relationships` carries free-form labels keyed by
//!   node id, independent of tree shape
//!
//! # Examples
//!
//! ```rust
//! use streamtree_core::models::Node;
//!
//! let node = Node::new(1, "Planning", "Kickoff notes for the quarter.");
//! assert!(node.is_root());
//! assert_eq!(node.num_appends, 0);
//!
//! let child = Node::new(2, "Budget", "Numbers.").with_parent(1, "part of");
//! assert_eq!(child.parent_id, Some(1));
//! assert_eq!(child.relationship_to(1), Some("part of"));
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::extract_summary;

/// Marker inserted between appended content fragments
pub const APPEND_DELIMITER: &str = "\n+++\n";

/// Validation errors for Node fields
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Node title cannot be empty")]
    EmptyTitle,

    #[error("Node {id} cannot be its own parent")]
    SelfParent { id: u64 },
}

/// A single titled unit of content in the knowledge forest
///
/// # Fields
///
/// - `id`: Store-assigned identifier, stable for the node's lifetime
/// - `title`: Human-readable name used for display and name-based lookup
/// - `content`: Accumulated markdown content
/// - `summary`: Short description, derived from content when not supplied
/// - `parent_id`: At most one parent; `None` marks a root
/// - `children`: Ordered child ids, maintained by the store
/// - `relationships`: Edge labels keyed by related node id
/// - `created_at` / `modified_at`: Lifecycle timestamps
/// - `num_appends`: How many content fragments have been appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Store-assigned identifier
    pub id: u64,

    /// Human-readable name
    pub title: String,

    /// Accumulated markdown content
    pub content: String,

    /// Short description of the content
    pub summary: String,

    /// Parent node id, `None` for roots
    pub parent_id: Option<u64>,

    /// Ordered child ids
    #[serde(default)]
    pub children: Vec<u64>,

    /// Semantic edge labels keyed by related node id
    #[serde(default)]
    pub relationships: BTreeMap<u64, String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,

    /// Number of content fragments appended so far
    #[serde(default)]
    pub num_appends: u32,
}

impl Node {
    /// Create a new root node
    ///
    /// The summary is derived from the content; use [`Node::with_summary`] to
    /// supply an explicit one.
    ///
    /// # Arguments
    ///
    /// * `id` - Store-assigned identifier
    /// * `title` - Human-readable name
    /// * `content` - Initial markdown content
    pub fn new(id: u64, title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        let content = content.into();
        let summary = extract_summary(&content);

        Self {
            id,
            title: title.into(),
            content,
            summary,
            parent_id: None,
            children: Vec::new(),
            relationships: BTreeMap::new(),
            created_at: now,
            modified_at: now,
            num_appends: 0,
        }
    }

    /// Replace the derived summary with an explicit one
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Place the node under a parent, recording the relationship label
    pub fn with_parent(mut self, parent_id: u64, relationship: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id);
        self.relationships.insert(parent_id, relationship.into());
        self
    }

    /// Validate structural constraints on the node's own fields
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the title is blank or the node
    /// references itself as parent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.parent_id == Some(self.id) {
            return Err(ValidationError::SelfParent { id: self.id });
        }
        Ok(())
    }

    /// Append a content fragment, separated by [`APPEND_DELIMITER`]
    ///
    /// A node with blank content adopts the fragment directly. The append
    /// counter is bumped and the modification timestamp updated; the summary
    /// is left for the optimization pass to refresh.
    pub fn append_fragment(&mut self, fragment: &str) {
        if self.content.trim().is_empty() {
            self.content = fragment.to_string();
        } else {
            self.content.push_str(APPEND_DELIMITER);
            self.content.push_str(fragment);
        }
        self.num_appends += 1;
        self.modified_at = Utc::now();
    }

    /// Replace content and summary wholesale
    ///
    /// The append counter is left untouched; only genuine appends move it.
    pub fn set_content(&mut self, new_content: impl Into<String>, new_summary: impl Into<String>) {
        self.content = new_content.into();
        self.summary = new_summary.into();
        self.modified_at = Utc::now();
    }

    /// Whether the node is a root of the forest
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// The relationship label recorded toward `other`, if any
    pub fn relationship_to(&self, other: u64) -> Option<&str> {
        self.relationships.get(&other).map(String::as_str)
    }
}
