//! Context Retrieval
//!
//! Ties the retrieval pieces together: rank seeds for the query, traverse
//! the context around each seed, merge the results with first-seen
//! dedupe, and flatten everything into one prompt-ready string. Seeds are
//! traversed in rank order, so when two seeds pull in the same node the
//! higher-ranked traversal decides its distance and markers.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::RetrievalConfig;
use crate::models::{ContentLevel, TraversalNode, TraversalOptions};
use crate::services::ClassifierError;
use crate::store::TreeStore;

use super::flatten::flatten;
use super::ranker::RelevanceRanker;
use super::traversal::{LinkResolver, TraversalEngine};

/// Query-to-context pipeline over a shared store
#[derive(Clone)]
pub struct ContextRetriever {
    store: Arc<RwLock<TreeStore>>,
    engine: TraversalEngine,
    ranker: Arc<dyn RelevanceRanker>,
    config: RetrievalConfig,
}

impl ContextRetriever {
    pub fn new(
        store: Arc<RwLock<TreeStore>>,
        resolver: Arc<dyn LinkResolver>,
        ranker: Arc<dyn RelevanceRanker>,
        config: RetrievalConfig,
    ) -> Self {
        let engine = TraversalEngine::new(Arc::clone(&store), resolver, config.clone());
        Self {
            store,
            engine,
            ranker,
            config,
        }
    }

    /// Assemble the flattened context for a query
    ///
    /// Every seed is traversed as a primary target with parents, children,
    /// and neighborhood expansion enabled. Seeds whose traversal fails are
    /// skipped with a warning rather than failing the whole call. An empty
    /// forest produces the flattener's empty placeholder.
    ///
    /// # Errors
    ///
    /// Returns `ClassifierError` when the ranker's scoring backend fails.
    pub async fn retrieve(&self, query: &str) -> Result<String, ClassifierError> {
        let seeds = {
            let store = self.store.read().await;
            self.ranker
                .rank(query, &store, self.config.seed_limit)
                .await?
        };
        debug!(seed_count = seeds.len(), "ranked retrieval seeds");

        let options = TraversalOptions::default()
            .with_max_depth(self.config.max_depth)
            .with_parents(true)
            .with_children(true)
            .with_neighborhood(self.config.neighborhood_radius)
            .with_content_level(ContentLevel::FullContent);

        let mut seen = HashSet::new();
        let mut collected: Vec<TraversalNode> = Vec::new();
        for seed in seeds {
            match self.engine.traverse(seed, &options, true).await {
                Ok(nodes) => {
                    for node in nodes {
                        if seen.insert(node.id) {
                            collected.push(node);
                        }
                    }
                }
                Err(error) => {
                    warn!(seed_id = seed, %error, "skipping failed seed traversal");
                }
            }
        }

        Ok(flatten(&collected))
    }
}
