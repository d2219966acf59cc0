//! Two-Phase Mutation Workflow
//!
//! Drives the full text-to-tree pipeline for a stream of input:
//!
//! 1. **Placement**: once the buffer holds enough text, ask the placement
//!    classifier where it belongs, evict the segments it routed, and apply
//!    the actions it proposed.
//! 2. **Optimization**: for every node the batch touched, ask the
//!    optimization classifier whether it should be restructured, and apply
//!    whatever it proposes immediately.
//!
//! Input the classifier refuses to route is tracked across calls. When the
//! unconsumed remainder stops making progress for a configured number of
//! rounds it is dropped outright, so one unclassifiable passage cannot wedge
//! the stream forever.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{ApplierConfig, WorkflowConfig};
use crate::store::{StoreError, TreeStore};

use super::applier::TreeActionApplier;
use super::buffer::TextBuffer;
use super::classifier::{OptimizationClassifier, PlacementClassifier};
use super::error::WorkflowError;

/// Nodes shown to the placement classifier in the tree overview
const TREE_SUMMARY_NODE_LIMIT: usize = 30;

/// Neighbors rendered for the optimization classifier
const NEIGHBOR_LIMIT: usize = 30;

/// Streams text into the tree through placement and per-node optimization
pub struct MutationWorkflow {
    store: Arc<RwLock<TreeStore>>,
    applier: TreeActionApplier,
    placement: Arc<dyn PlacementClassifier>,
    optimizer: Arc<dyn OptimizationClassifier>,
    buffer: TextBuffer,
    previous_remainder: String,
    no_progress_count: u32,
    config: WorkflowConfig,
}

impl MutationWorkflow {
    pub fn new(
        store: Arc<RwLock<TreeStore>>,
        placement: Arc<dyn PlacementClassifier>,
        optimizer: Arc<dyn OptimizationClassifier>,
        applier_config: ApplierConfig,
        config: WorkflowConfig,
    ) -> Self {
        let applier = TreeActionApplier::new(Arc::clone(&store), applier_config);
        let buffer = TextBuffer::new(config.buffer.clone());
        Self {
            store,
            applier,
            placement,
            optimizer,
            buffer,
            previous_remainder: String::new(),
            no_progress_count: 0,
            config,
        }
    }

    /// Feed a fragment of streamed text into the pipeline
    ///
    /// Returns the ids of nodes mutated by this call. Fragments below the
    /// buffering threshold return an empty set without any classifier call.
    ///
    /// # Errors
    ///
    /// Propagates classifier failures and store lookups that fail
    /// mid-optimization. Buffered input survives an error and is retried on
    /// the next call.
    pub async fn ingest(&mut self, text: &str) -> Result<HashSet<u64>, WorkflowError> {
        self.buffer.add_text(text);
        match self.buffer.ready_text() {
            Some(chunk) => self.process_chunk(&chunk).await,
            None => Ok(HashSet::new()),
        }
    }

    /// Flush whatever is still buffered, regardless of threshold
    ///
    /// Call at end of stream. The pending buffer is empty afterwards even if
    /// the classifier routed none of it.
    ///
    /// # Errors
    ///
    /// Propagates the same failures as [`ingest`](Self::ingest); the buffer
    /// is only dropped on success.
    pub async fn finalize(&mut self) -> Result<HashSet<u64>, WorkflowError> {
        let remainder = self.buffer.remainder().to_string();
        if remainder.trim().is_empty() {
            self.buffer.clear();
            return Ok(HashSet::new());
        }

        let affected = self.process_chunk(&remainder).await?;
        self.buffer.clear();
        self.previous_remainder.clear();
        self.no_progress_count = 0;
        Ok(affected)
    }

    /// Text buffered but not yet routed into the tree
    pub fn pending(&self) -> &str {
        self.buffer.remainder()
    }

    async fn process_chunk(&mut self, text: &str) -> Result<HashSet<u64>, WorkflowError> {
        let correlation_id = Uuid::new_v4();
        debug!(%correlation_id, chars = text.chars().count(), "processing chunk");

        let tree_summary = {
            let store = self.store.read().await;
            store.placement_summary(TREE_SUMMARY_NODE_LIMIT)
        };
        let history = self.buffer.history().to_string();

        let response = self.placement.place(text, &tree_summary, &history).await?;

        for segment in &response.segments {
            if segment.is_routable {
                if let Err(e) = self.buffer.flush_processed(&segment.text) {
                    warn!(%correlation_id, error = %e, "routed segment not found in buffer");
                }
            }
        }

        if response.actions.is_empty() {
            self.note_no_progress(correlation_id);
            return Ok(HashSet::new());
        }

        info!(
            %correlation_id,
            actions = response.actions.len(),
            "applying placement actions"
        );
        let affected = self.applier.apply(response.actions).await;
        self.previous_remainder = self.buffer.remainder().to_string();
        self.no_progress_count = 0;

        let mut all_affected = affected.clone();
        let mut ids: Vec<u64> = affected.into_iter().collect();
        ids.sort_unstable();
        for id in ids {
            let optimized = self.optimize_node(correlation_id, id).await?;
            all_affected.extend(optimized);
        }

        Ok(all_affected)
    }

    /// Track rounds where the classifier consumed nothing; evict when stuck
    fn note_no_progress(&mut self, correlation_id: Uuid) {
        let current = self.buffer.remainder().to_string();
        let stuck = !current.is_empty()
            && (current == self.previous_remainder
                || (!self.previous_remainder.is_empty()
                    && current.starts_with(&self.previous_remainder)));

        if stuck {
            self.no_progress_count += 1;
            if self.no_progress_count >= self.config.stuck_repeat_limit {
                warn!(
                    %correlation_id,
                    dropped_chars = current.chars().count(),
                    "input made no progress, evicting buffer"
                );
                self.buffer.clear();
                self.previous_remainder.clear();
                self.no_progress_count = 0;
                return;
            }
        } else {
            self.no_progress_count = 0;
        }
        self.previous_remainder = current;
    }

    async fn optimize_node(
        &mut self,
        correlation_id: Uuid,
        id: u64,
    ) -> Result<HashSet<u64>, WorkflowError> {
        let (content, summary, neighbors) = {
            let store = self.store.read().await;
            let node = store.get(id).ok_or_else(|| StoreError::node_not_found(id))?;
            (
                node.content.clone(),
                node.summary.clone(),
                store.neighbor_description(id, NEIGHBOR_LIMIT)?,
            )
        };

        let actions = self
            .optimizer
            .optimize(id, &content, &summary, &neighbors)
            .await?;
        if actions.is_empty() {
            return Ok(HashSet::new());
        }

        info!(%correlation_id, node_id = id, actions = actions.len(), "applying optimization");
        Ok(self.applier.apply(actions).await)
    }
}
