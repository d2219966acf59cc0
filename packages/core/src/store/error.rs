//! Store error types

use thiserror::Error;

/// Errors from forest store operations
///
/// Mutation helpers return these instead of panicking; callers on the
/// classifier path typically skip-and-log rather than abort.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Node not found by id
    #[error("Node not found: {id}")]
    NodeNotFound { id: u64 },
}

impl StoreError {
    /// Create a node not found error
    pub fn node_not_found(id: u64) -> Self {
        Self::NodeNotFound { id }
    }
}
