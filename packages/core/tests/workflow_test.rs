//! Integration tests for the streamed mutation workflow
//!
//! Tests cover:
//! - Buffered ingest crossing the flush threshold
//! - Batched appends landing in input order
//! - Orphan create merging
//! - Long-append demotion to continuation children
//! - Stream finalization
//! - Classifier failure handling

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use streamtree_core::config::{ApplierConfig, BufferConfig, WorkflowConfig};
use streamtree_core::models::{TreeAction, APPEND_DELIMITER};
use streamtree_core::services::{
    ClassifierError, MutationWorkflow, OptimizationClassifier, PlacementClassifier,
    PlacementResponse, Segment, WorkflowError,
};
use streamtree_core::store::TreeStore;
use tokio::sync::RwLock;

/// Placement classifier that replays a scripted sequence of responses
struct ScriptedPlacement {
    responses: Mutex<VecDeque<PlacementResponse>>,
}

impl ScriptedPlacement {
    fn new(responses: Vec<PlacementResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
        })
    }
}

#[async_trait]
impl PlacementClassifier for ScriptedPlacement {
    async fn place(
        &self,
        _text: &str,
        _tree_summary: &str,
        _history: &str,
    ) -> Result<PlacementResponse, ClassifierError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ClassifierError::call_failed("placement script exhausted"))
    }
}

/// Optimizer that records which nodes it saw and replays scripted actions
struct RecordingOptimizer {
    responses: Mutex<VecDeque<Vec<TreeAction>>>,
    calls: Mutex<Vec<u64>>,
}

impl RecordingOptimizer {
    fn silent() -> Arc<Self> {
        Self::scripted(Vec::new())
    }

    fn scripted(responses: Vec<Vec<TreeAction>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<u64> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OptimizationClassifier for RecordingOptimizer {
    async fn optimize(
        &self,
        node_id: u64,
        _content: &str,
        _summary: &str,
        _neighbor_description: &str,
    ) -> Result<Vec<TreeAction>, ClassifierError> {
        self.calls.lock().unwrap().push(node_id);
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}

/// Test helper: a segment the classifier marked as routed
fn routed(text: &str) -> Segment {
    Segment {
        text: text.to_string(),
        is_routable: true,
    }
}

/// Test helper: a parentless create
fn create_root(name: &str, content: &str, summary: &str) -> TreeAction {
    TreeAction::Create {
        parent_id: None,
        name: name.to_string(),
        content: content.to_string(),
        summary: summary.to_string(),
        relationship: "independent".to_string(),
        parent_name: None,
    }
}

/// Test helper: a workflow config with a tiny flush threshold
fn small_config() -> WorkflowConfig {
    WorkflowConfig {
        buffer: BufferConfig {
            flush_threshold: 12,
            history_multiplier: 3,
        },
        stuck_repeat_limit: 2,
    }
}

// =========================================================================
// Streamed Ingest Tests
// =========================================================================

#[tokio::test]
async fn test_streamed_text_lands_in_forest() -> Result<()> {
    let store = Arc::new(RwLock::new(TreeStore::new()));
    let text = "Alpha beta gamma delta";
    let placement = ScriptedPlacement::new(vec![PlacementResponse {
        actions: vec![create_root("Meeting", text, "kickoff")],
        segments: vec![routed(text)],
    }]);
    let optimizer = RecordingOptimizer::silent();
    let mut workflow = MutationWorkflow::new(
        Arc::clone(&store),
        placement,
        Arc::clone(&optimizer) as Arc<dyn OptimizationClassifier>,
        ApplierConfig::default(),
        small_config(),
    );

    let affected = workflow.ingest("Alpha beta").await?;
    assert!(affected.is_empty(), "below threshold nothing should flush");

    let affected = workflow.ingest("gamma delta").await?;
    assert_eq!(affected, HashSet::from([1]));
    assert!(workflow.pending().is_empty(), "routed text should leave the buffer");
    assert_eq!(optimizer.calls(), vec![1], "every affected node gets an optimization pass");

    let store = store.read().await;
    let node = store.get(1).unwrap();
    assert_eq!(node.title, "Meeting");
    assert_eq!(node.content, text);
    Ok(())
}

#[tokio::test]
async fn test_batched_appends_preserve_input_order() -> Result<()> {
    let mut seed = TreeStore::new();
    seed.create_node("Log", "start", "running log", None, "");
    let store = Arc::new(RwLock::new(seed));

    let text = "first part second part";
    let placement = ScriptedPlacement::new(vec![PlacementResponse {
        actions: vec![
            TreeAction::Append {
                target_id: 1,
                content: "first part".to_string(),
                target_name: None,
            },
            TreeAction::Append {
                target_id: 1,
                content: "second part".to_string(),
                target_name: None,
            },
        ],
        segments: vec![routed(text)],
    }]);
    let optimizer = RecordingOptimizer::silent();
    let mut workflow = MutationWorkflow::new(
        Arc::clone(&store),
        placement,
        optimizer,
        ApplierConfig::default(),
        small_config(),
    );

    let affected = workflow.ingest(text).await?;
    assert_eq!(affected, HashSet::from([1]));

    let store = store.read().await;
    let node = store.get(1).unwrap();
    assert_eq!(
        node.content,
        format!("start{APPEND_DELIMITER}first part{APPEND_DELIMITER}second part")
    );
    assert_eq!(node.num_appends, 2);
    Ok(())
}

#[tokio::test]
async fn test_orphan_creates_merge_into_one_root() -> Result<()> {
    let store = Arc::new(RwLock::new(TreeStore::new()));
    let text = "birds and fish notes";
    let placement = ScriptedPlacement::new(vec![PlacementResponse {
        actions: vec![
            create_root("Birds", "About birds.", "feathered"),
            create_root("Fish", "About fish.", "aquatic"),
        ],
        segments: vec![routed(text)],
    }]);
    let optimizer = RecordingOptimizer::silent();
    let mut workflow = MutationWorkflow::new(
        Arc::clone(&store),
        placement,
        optimizer,
        ApplierConfig::default(),
        small_config(),
    );

    let affected = workflow.ingest(text).await?;
    assert_eq!(affected, HashSet::from([1]));

    let store = store.read().await;
    assert_eq!(store.node_count(), 1, "sibling orphans should collapse into one node");
    let node = store.get(1).unwrap();
    assert!(node.is_root());
    assert_eq!(node.title, "Birds\n\nFish");
    assert_eq!(node.content, "About birds.\n\nAbout fish.");
    assert_eq!(node.summary, "feathered\n\naquatic");
    Ok(())
}

#[tokio::test]
async fn test_long_append_demoted_to_continuation_child() -> Result<()> {
    let mut seed = TreeStore::new();
    seed.create_node(
        "Chapter",
        "An opening paragraph that is already quite long.",
        "opener",
        None,
        "",
    );
    let store = Arc::new(RwLock::new(seed));

    let text = "continuation text arrives";
    let placement = ScriptedPlacement::new(vec![PlacementResponse {
        actions: vec![TreeAction::Append {
            target_id: 1,
            content: text.to_string(),
            target_name: None,
        }],
        segments: vec![routed(text)],
    }]);
    let optimizer = RecordingOptimizer::silent();
    let mut workflow = MutationWorkflow::new(
        Arc::clone(&store),
        placement,
        optimizer,
        ApplierConfig { max_append_len: 20 },
        small_config(),
    );

    let affected = workflow.ingest(text).await?;
    assert!(affected.contains(&2));

    let store = store.read().await;
    assert_eq!(store.node_count(), 2);
    let child = store.get(2).unwrap();
    assert_eq!(child.title, "Chapter (continued)");
    assert_eq!(child.parent_id, Some(1));
    assert_eq!(child.relationship_to(1), Some("continuation of"));
    assert!(child.content.starts_with(text));
    // the saturated node keeps its content untouched
    assert_eq!(store.get(1).unwrap().num_appends, 0);
    Ok(())
}

// =========================================================================
// Finalization and Failure Tests
// =========================================================================

#[tokio::test]
async fn test_finalize_flushes_short_remainder() -> Result<()> {
    let store = Arc::new(RwLock::new(TreeStore::new()));
    let placement = ScriptedPlacement::new(vec![PlacementResponse {
        actions: vec![create_root("Stray", "A stray note.", "stray")],
        segments: vec![routed("stray note")],
    }]);
    let optimizer = RecordingOptimizer::silent();
    let config = WorkflowConfig {
        buffer: BufferConfig {
            flush_threshold: 100,
            history_multiplier: 3,
        },
        stuck_repeat_limit: 2,
    };
    let mut workflow = MutationWorkflow::new(
        Arc::clone(&store),
        placement,
        optimizer,
        ApplierConfig::default(),
        config,
    );

    let affected = workflow.ingest("stray note").await?;
    assert!(affected.is_empty(), "threshold not reached, nothing placed yet");

    let affected = workflow.finalize().await?;
    assert_eq!(affected, HashSet::from([1]));
    assert!(workflow.pending().is_empty());

    let store = store.read().await;
    assert_eq!(store.get(1).unwrap().title, "Stray");
    Ok(())
}

#[tokio::test]
async fn test_classifier_failure_keeps_pending_text() -> Result<()> {
    let store = Arc::new(RwLock::new(TreeStore::new()));
    let placement = ScriptedPlacement::new(vec![]);
    let optimizer = RecordingOptimizer::silent();
    let mut workflow = MutationWorkflow::new(
        Arc::clone(&store),
        placement,
        optimizer,
        ApplierConfig::default(),
        small_config(),
    );

    let err = workflow.ingest("enough text to cross").await.unwrap_err();
    assert!(matches!(err, WorkflowError::Classifier(_)));
    assert_eq!(
        workflow.pending(),
        "enough text to cross",
        "failed placement must not lose buffered input"
    );

    let store = store.read().await;
    assert!(store.is_empty());
    Ok(())
}

// =========================================================================
// Optimization Pass Tests
// =========================================================================

#[tokio::test]
async fn test_optimizer_pass_refines_new_node() -> Result<()> {
    let store = Arc::new(RwLock::new(TreeStore::new()));
    let text = "rough draft of an idea";
    let placement = ScriptedPlacement::new(vec![PlacementResponse {
        actions: vec![create_root("Idea", text, "rough")],
        segments: vec![routed(text)],
    }]);
    let optimizer = RecordingOptimizer::scripted(vec![vec![TreeAction::Update {
        node_id: 1,
        new_content: "A tidy write-up of the idea.".to_string(),
        new_summary: "Tidy idea".to_string(),
    }]]);
    let mut workflow = MutationWorkflow::new(
        Arc::clone(&store),
        placement,
        Arc::clone(&optimizer) as Arc<dyn OptimizationClassifier>,
        ApplierConfig::default(),
        small_config(),
    );

    let affected = workflow.ingest(text).await?;
    assert!(affected.contains(&1));
    assert_eq!(optimizer.calls(), vec![1]);

    let store = store.read().await;
    let node = store.get(1).unwrap();
    assert_eq!(node.content, "A tidy write-up of the idea.");
    assert_eq!(node.summary, "Tidy idea");
    Ok(())
}
