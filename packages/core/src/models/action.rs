//! Tree mutation actions
//!
//! Classifiers express mutations as a closed set of actions tagged by an
//! uppercase `action` field. Deserializing an unknown tag or a missing field
//! fails at the boundary; nothing malformed reaches the applier.

use serde::{Deserialize, Serialize};

/// A single mutation intent produced by a classifier
///
/// # Examples
///
/// ```rust
/// use streamtree_core::models::TreeAction;
///
/// let json = r#"{"action":"APPEND","target_id":3,"content":"more detail"}"#;
/// let action: TreeAction = serde_json::from_str(json).unwrap();
/// assert!(matches!(action, TreeAction::Append { target_id: 3, .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum TreeAction {
    /// Create a new node, as a root when `parent_id` is `None`
    #[serde(rename = "CREATE")]
    Create {
        parent_id: Option<u64>,
        name: String,
        content: String,
        summary: String,
        relationship: String,
        /// Legacy fallback when the classifier only knows the parent by name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_name: Option<String>,
    },

    /// Append a content fragment onto an existing node
    #[serde(rename = "APPEND")]
    Append {
        target_id: u64,
        content: String,
        /// Legacy fallback when the target id is stale
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_name: Option<String>,
    },

    /// Replace a node's content and summary wholesale
    #[serde(rename = "UPDATE")]
    Update {
        node_id: u64,
        new_content: String,
        new_summary: String,
    },
}

impl TreeAction {
    /// Whether this is a `Create` with no parent reference at all
    pub fn is_orphan_create(&self) -> bool {
        matches!(
            self,
            TreeAction::Create {
                parent_id: None,
                parent_name: None,
                ..
            }
        )
    }

    /// Uppercase tag for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            TreeAction::Create { .. } => "CREATE",
            TreeAction::Append { .. } => "APPEND",
            TreeAction::Update { .. } => "UPDATE",
        }
    }
}
