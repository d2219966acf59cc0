//! Classifier Abstractions
//!
//! The mutation pipeline makes two kinds of decisions it cannot make from
//! tree shape alone: where incoming text belongs (placement) and whether a
//! freshly touched node should be restructured (optimization). Both are
//! behind async traits so the pipeline can run against any backend, and so
//! tests can script responses without network calls.
//!
//! Backends that speak JSON can decode their payloads through
//! [`PlacementResponse::from_json`] and [`actions_from_json`], which map
//! decode failures to [`ClassifierError::MalformedResponse`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::TreeAction;

use super::error::ClassifierError;

/// A portion of the classified text, tagged with whether it was routed
///
/// Routable segments were fully handled by the returned actions and can be
/// evicted from the pending buffer; non-routable segments stay buffered for
/// the next round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub is_routable: bool,
}

/// Placement decision for a chunk of buffered text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlacementResponse {
    /// Mutations to perform, in order
    #[serde(default)]
    pub actions: Vec<TreeAction>,
    /// How the classified text splits into routable and pending parts
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl PlacementResponse {
    /// Decode a placement response from a JSON payload
    ///
    /// # Errors
    ///
    /// Returns `ClassifierError::MalformedResponse` when the payload does not
    /// decode.
    pub fn from_json(payload: &str) -> Result<Self, ClassifierError> {
        serde_json::from_str(payload)
            .map_err(|e| ClassifierError::malformed_response(e.to_string()))
    }
}

/// Decode a bare action list from a JSON payload
///
/// Optimization backends answer with an action array rather than a full
/// placement envelope.
///
/// # Errors
///
/// Returns `ClassifierError::MalformedResponse` when the payload does not
/// decode.
pub fn actions_from_json(payload: &str) -> Result<Vec<TreeAction>, ClassifierError> {
    serde_json::from_str(payload).map_err(|e| ClassifierError::malformed_response(e.to_string()))
}

/// Decides where buffered text belongs in the tree
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the workflow holds them behind
/// `Arc<dyn PlacementClassifier>` and awaits them across task boundaries.
#[async_trait]
pub trait PlacementClassifier: Send + Sync {
    /// Classify a chunk of text against the current tree
    ///
    /// # Arguments
    ///
    /// * `text` - Buffered text ready for placement
    /// * `tree_summary` - Compact overview of recently modified nodes
    /// * `history` - Transcript tail preceding `text`, for context
    async fn place(
        &self,
        text: &str,
        tree_summary: &str,
        history: &str,
    ) -> Result<PlacementResponse, ClassifierError>;
}

/// Decides whether a node that just changed should be restructured
///
/// An empty action list means the node is fine as it is.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the workflow holds them behind
/// `Arc<dyn OptimizationClassifier>`.
#[async_trait]
pub trait OptimizationClassifier: Send + Sync {
    /// Propose restructuring actions for a single node
    ///
    /// # Arguments
    ///
    /// * `node_id` - The node under review
    /// * `content` - Its full current content
    /// * `summary` - Its current summary
    /// * `neighbor_description` - Rendering of its parent and children
    async fn optimize(
        &self,
        node_id: u64,
        content: &str,
        summary: &str,
        neighbor_description: &str,
    ) -> Result<Vec<TreeAction>, ClassifierError>;
}
