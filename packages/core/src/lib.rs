//! StreamTree Core Engine
//!
//! This crate builds a knowledge forest incrementally from streamed text and
//! answers context queries against it. Text arrives in fragments, buffers
//! until a chunk is worth classifying, and lands in the forest through a
//! two-phase mutation workflow; queries come back as a flattened ASCII tree
//! with numbered node contents.
//!
//! # Architecture
//!
//! - **Forest of nodes**: Plain `u64` ids, multiple roots, no implicit root
//!   node; structure lives in parent links and `[[id]]` content references
//! - **Two-phase mutation**: A placement pass routes buffered text into
//!   tree actions, then a per-node optimization pass tidies what changed
//! - **Single writer**: One `Arc<RwLock<TreeStore>>` shared between the
//!   mutation workflow and any number of concurrent readers
//! - **Pluggable classifiers**: Placement, optimization, and seed ranking
//!   are traits, so model backends swap without touching the engine
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, TreeAction, traversal snapshots)
//! - [`config`] - Tunable thresholds for every component
//! - [`store`] - In-memory forest store and its query helpers
//! - [`services`] - Buffering, classification, and the mutation workflow
//! - [`retrieval`] - Seed ranking, traversal, and context flattening

pub mod config;
pub mod models;
pub mod retrieval;
pub mod services;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::{ApplierConfig, BufferConfig, RetrievalConfig, WorkflowConfig};
pub use models::{ContentLevel, Node, TraversalNode, TraversalOptions, TreeAction};
pub use retrieval::{
    ContextRetriever, LinkResolver, RecencyKeywordRanker, RelevanceRanker, TraversalEngine,
    WikiLinkResolver,
};
pub use services::{
    BufferError, ClassifierError, MutationWorkflow, OptimizationClassifier, PlacementClassifier,
    PlacementResponse, Segment, TextBuffer, TreeActionApplier, WorkflowError,
};
pub use store::{NeighborInfo, StoreError, TreeStore};
