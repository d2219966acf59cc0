//! Mutation Services
//!
//! This module contains the services that turn streamed text into tree
//! mutations:
//!
//! - `TextBuffer` - Accumulates stream fragments until worth classifying
//! - `TreeActionApplier` - Executes action batches against the store
//! - `MutationWorkflow` - Placement then per-node optimization, per chunk
//! - `PlacementClassifier` / `OptimizationClassifier` - External decision
//!   makers behind async traits
//!
//! Services coordinate between the store and the classifiers, implementing
//! the bookkeeping rules that keep the tree well formed.

pub mod applier;
pub mod buffer;
pub mod classifier;
pub mod error;
pub mod workflow;

pub use applier::TreeActionApplier;
pub use buffer::TextBuffer;
pub use classifier::{
    actions_from_json, OptimizationClassifier, PlacementClassifier, PlacementResponse, Segment,
};
pub use error::{BufferError, ClassifierError, WorkflowError};
pub use workflow::MutationWorkflow;
