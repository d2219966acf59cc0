//! Context Retrieval
//!
//! Read-side pipeline over the forest store. A query is answered in four
//! stages, each its own module:
//!
//! - **ranker**: pick seed nodes worth traversing (recency + keywords)
//! - **traversal**: walk content references around each seed in both
//!   directions, with optional neighborhood expansion
//! - **filtering**: degrade distant nodes to summaries or bare titles
//! - **flatten**: render the merged result as an ASCII tree plus numbered
//!   node contents
//!
//! [`ContextRetriever`] wires the stages together behind one call.

pub mod filtering;
pub mod flatten;
pub mod ranker;
pub mod retriever;
pub mod traversal;

pub use filtering::apply_content_filter;
pub use flatten::flatten;
pub use ranker::{rank_nodes, RecencyKeywordRanker, RelevanceRanker};
pub use retriever::ContextRetriever;
pub use traversal::{LinkResolver, TraversalEngine, WikiLinkResolver};
