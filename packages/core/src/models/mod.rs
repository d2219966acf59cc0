//! Data models
//!
//! Core data structures used throughout the crate:
//!
//! - `Node` - a titled unit of content in the knowledge forest
//! - `TreeAction` - the closed set of classifier-issued mutations
//! - Traversal read models carrying signed distances from a queried node

mod action;
mod node;
mod traversal;

pub use action::TreeAction;
pub use node::{Node, ValidationError, APPEND_DELIMITER};
pub use traversal::{ContentLevel, TraversalNode, TraversalOptions};
