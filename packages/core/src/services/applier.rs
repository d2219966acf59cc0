//! Tree Action Applier
//!
//! Executes a batch of [`TreeAction`]s against the store under a single write
//! lock and reports every node the batch touched. Two rewrite passes run
//! before execution:
//!
//! 1. **Orphan merge**: several root-level creates in one batch are usually
//!    one topic proposed twice, so they collapse into a single create whose
//!    fields are blank-line joined in input order.
//! 2. **Long-node conversion**: an append whose target content already
//!    exceeds the configured length becomes a child create named
//!    `"{title} (continued)"` instead of growing the node further. Equal to
//!    the threshold stays an append.
//!
//! Unresolvable targets are skipped and logged rather than failing the
//! batch; unknown action tags cannot occur because [`TreeAction`] is a
//! closed enum and decoding rejects them upfront.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::ApplierConfig;
use crate::models::TreeAction;
use crate::store::TreeStore;

/// Applies mutation batches to a shared store
#[derive(Debug, Clone)]
pub struct TreeActionApplier {
    store: Arc<RwLock<TreeStore>>,
    config: ApplierConfig,
}

impl TreeActionApplier {
    pub fn new(store: Arc<RwLock<TreeStore>>, config: ApplierConfig) -> Self {
        Self { store, config }
    }

    /// Apply a batch of actions, returning the ids of all affected nodes
    ///
    /// The whole batch executes under one write lock, so readers observe
    /// either none or all of it. Created nodes count as affected, and a
    /// create under a parent marks the parent affected as well so downstream
    /// consumers re-render its child links.
    pub async fn apply(&self, actions: Vec<TreeAction>) -> HashSet<u64> {
        let mut store = self.store.write().await;

        let actions = merge_orphan_creates(actions);
        let actions = convert_long_appends(&store, self.config.max_append_len, actions);

        let mut affected = HashSet::new();
        for action in actions {
            match action {
                TreeAction::Create {
                    parent_id,
                    name,
                    content,
                    summary,
                    relationship,
                    parent_name,
                } => {
                    let mut resolved = parent_id.filter(|pid| store.contains(*pid));
                    if resolved.is_none() {
                        if let Some(pname) = parent_name.as_deref() {
                            resolved = store.find_by_name(pname);
                        }
                    }
                    if resolved.is_none() && (parent_id.is_some() || parent_name.is_some()) {
                        warn!(?parent_id, "create parent unresolved, creating as root");
                    }

                    let new_id = store.create_node(name, content, summary, resolved, relationship);
                    affected.insert(new_id);
                    if let Some(pid) = resolved {
                        affected.insert(pid);
                    }
                }
                TreeAction::Append {
                    target_id,
                    content,
                    target_name,
                } => {
                    let mut resolved = Some(target_id).filter(|id| store.contains(*id));
                    if resolved.is_none() {
                        if let Some(tname) = target_name.as_deref() {
                            resolved = store.find_by_name(tname);
                        }
                    }
                    match resolved {
                        Some(id) => match store.append_content(id, &content) {
                            Ok(()) => {
                                affected.insert(id);
                            }
                            Err(e) => warn!(error = %e, "append failed, skipping"),
                        },
                        None => warn!(target_id, "append target unresolved, skipping"),
                    }
                }
                TreeAction::Update {
                    node_id,
                    new_content,
                    new_summary,
                } => match store.update_node(node_id, new_content, new_summary) {
                    Ok(()) => {
                        affected.insert(node_id);
                    }
                    Err(e) => error!(error = %e, "update target missing, skipping"),
                },
            }
        }

        affected
    }
}

/// Collapse multiple root-level creates into one
///
/// Fields of the merged create are the originals joined with a blank line,
/// preserving input order; the merged create takes the first orphan's slot in
/// the batch. Creates with a parent are untouched.
fn merge_orphan_creates(actions: Vec<TreeAction>) -> Vec<TreeAction> {
    let orphan_count = actions.iter().filter(|a| a.is_orphan_create()).count();
    if orphan_count <= 1 {
        return actions;
    }

    let mut names: Vec<String> = Vec::with_capacity(orphan_count);
    let mut contents: Vec<String> = Vec::with_capacity(orphan_count);
    let mut summaries: Vec<String> = Vec::with_capacity(orphan_count);
    let mut relationship = String::new();
    for action in &actions {
        if !action.is_orphan_create() {
            continue;
        }
        if let TreeAction::Create {
            name,
            content,
            summary,
            relationship: rel,
            ..
        } = action
        {
            if names.is_empty() {
                relationship = rel.clone();
            }
            names.push(name.clone());
            contents.push(content.clone());
            summaries.push(summary.clone());
        }
    }

    info!(count = orphan_count, "merging orphan creates into one node");
    let merged = TreeAction::Create {
        parent_id: None,
        name: names.join("\n\n"),
        content: contents.join("\n\n"),
        summary: summaries.join("\n\n"),
        relationship,
        parent_name: None,
    };

    let mut out = Vec::with_capacity(actions.len() + 1 - orphan_count);
    let mut emitted = false;
    for action in actions {
        if action.is_orphan_create() {
            if !emitted {
                out.push(merged.clone());
                emitted = true;
            }
        } else {
            out.push(action);
        }
    }
    out
}

/// Rewrite appends on oversized nodes into child creates
///
/// The boundary is strictly greater than the threshold. Appends whose target
/// cannot be found pass through unchanged; execution handles the miss.
fn convert_long_appends(
    store: &TreeStore,
    max_append_len: usize,
    actions: Vec<TreeAction>,
) -> Vec<TreeAction> {
    actions
        .into_iter()
        .map(|action| match action {
            TreeAction::Append {
                target_id,
                content,
                target_name,
            } => match store.get(target_id) {
                Some(target) if target.content.chars().count() > max_append_len => {
                    info!(
                        target_id,
                        "append target over length threshold, converting to child create"
                    );
                    TreeAction::Create {
                        parent_id: Some(target_id),
                        name: format!("{} (continued)", target.title),
                        content: strip_append_markers(&content),
                        summary: String::new(),
                        relationship: "continuation of".to_string(),
                        parent_name: None,
                    }
                }
                _ => TreeAction::Append {
                    target_id,
                    content,
                    target_name,
                },
            },
            other => other,
        })
        .collect()
}

/// Drop bare append-delimiter lines from a fragment
fn strip_append_markers(fragment: &str) -> String {
    fragment
        .lines()
        .filter(|line| line.trim() != "+++")
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (TreeActionApplier, Arc<RwLock<TreeStore>>) {
        setup_with_config(ApplierConfig::default())
    }

    fn setup_with_config(config: ApplierConfig) -> (TreeActionApplier, Arc<RwLock<TreeStore>>) {
        let store = Arc::new(RwLock::new(TreeStore::new()));
        let applier = TreeActionApplier::new(Arc::clone(&store), config);
        (applier, store)
    }

    fn create(parent_id: Option<u64>, name: &str) -> TreeAction {
        TreeAction::Create {
            parent_id,
            name: name.to_string(),
            content: format!("{name} content"),
            summary: format!("{name} summary"),
            relationship: "part of".to_string(),
            parent_name: None,
        }
    }

    #[tokio::test]
    async fn test_create_root_then_child() {
        let (applier, store) = setup();

        let affected = applier.apply(vec![create(None, "Root")]).await;
        assert_eq!(affected, HashSet::from([1]));

        let affected = applier.apply(vec![create(Some(1), "Child")]).await;
        assert_eq!(affected, HashSet::from([1, 2]));

        let store = store.read().await;
        assert_eq!(store.get(1).unwrap().children, vec![2]);
        assert_eq!(store.get(2).unwrap().parent_id, Some(1));
    }

    #[tokio::test]
    async fn test_create_with_stale_parent_becomes_root() {
        let (applier, store) = setup();
        let affected = applier.apply(vec![create(Some(99), "Stranded")]).await;
        assert_eq!(affected, HashSet::from([1]));
        assert!(store.read().await.get(1).unwrap().is_root());
    }

    #[tokio::test]
    async fn test_create_resolves_parent_by_name() {
        let (applier, store) = setup();
        applier.apply(vec![create(None, "Existing Topic")]).await;

        let action = TreeAction::Create {
            parent_id: None,
            name: "Child".to_string(),
            content: "c".to_string(),
            summary: "s".to_string(),
            relationship: "part of".to_string(),
            parent_name: Some("existing topic".to_string()),
        };
        let affected = applier.apply(vec![action]).await;
        assert_eq!(affected, HashSet::from([1, 2]));
        assert_eq!(store.read().await.get(2).unwrap().parent_id, Some(1));
    }

    #[tokio::test]
    async fn test_append_by_id() {
        let (applier, store) = setup();
        applier.apply(vec![create(None, "Target")]).await;

        let affected = applier
            .apply(vec![TreeAction::Append {
                target_id: 1,
                content: "more detail".to_string(),
                target_name: None,
            }])
            .await;
        assert_eq!(affected, HashSet::from([1]));
        assert!(store.read().await.get(1).unwrap().content.contains("more detail"));
    }

    #[tokio::test]
    async fn test_append_falls_back_to_name() {
        let (applier, store) = setup();
        applier.apply(vec![create(None, "Target")]).await;

        let affected = applier
            .apply(vec![TreeAction::Append {
                target_id: 77,
                content: "late addition".to_string(),
                target_name: Some("Target".to_string()),
            }])
            .await;
        assert_eq!(affected, HashSet::from([1]));
        assert!(store.read().await.get(1).unwrap().content.contains("late addition"));
    }

    #[tokio::test]
    async fn test_append_unresolvable_is_skipped() {
        let (applier, store) = setup();
        let affected = applier
            .apply(vec![TreeAction::Append {
                target_id: 77,
                content: "nowhere to go".to_string(),
                target_name: None,
            }])
            .await;
        assert!(affected.is_empty());
        assert!(store.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_missing_update() {
        let (applier, store) = setup();
        applier.apply(vec![create(None, "Target")]).await;

        let affected = applier
            .apply(vec![TreeAction::Update {
                node_id: 1,
                new_content: "rewritten".to_string(),
                new_summary: "new summary".to_string(),
            }])
            .await;
        assert_eq!(affected, HashSet::from([1]));
        assert_eq!(store.read().await.get(1).unwrap().content, "rewritten");

        let affected = applier
            .apply(vec![TreeAction::Update {
                node_id: 42,
                new_content: "x".to_string(),
                new_summary: "y".to_string(),
            }])
            .await;
        assert!(affected.is_empty());
    }

    #[tokio::test]
    async fn test_orphan_creates_merged() {
        let (applier, store) = setup();
        applier.apply(vec![create(None, "Anchor")]).await;

        let affected = applier
            .apply(vec![
                create(None, "First Topic"),
                create(Some(1), "Nested"),
                create(None, "Second Topic"),
            ])
            .await;

        let store = store.read().await;
        // merged orphan + nested child, not three new nodes
        assert_eq!(store.node_count(), 3);
        let merged = store.get(2).unwrap();
        assert_eq!(merged.title, "First Topic\n\nSecond Topic");
        assert!(merged.content.contains("First Topic content"));
        assert!(merged.content.contains("Second Topic content"));
        assert!(merged.is_root());
        assert_eq!(affected, HashSet::from([1, 2, 3]));
    }

    #[tokio::test]
    async fn test_single_orphan_not_merged() {
        let (applier, store) = setup();
        applier
            .apply(vec![create(None, "Solo"), create(Some(1), "Child")])
            .await;
        let store = store.read().await;
        assert_eq!(store.get(1).unwrap().title, "Solo");
        assert_eq!(store.node_count(), 2);
    }

    #[tokio::test]
    async fn test_long_append_converted_to_child() {
        let (applier, store) = setup_with_config(ApplierConfig { max_append_len: 10 });
        {
            let mut store = store.write().await;
            store.create_node("Essay", "0123456789x", "", None, "");
        }

        let affected = applier
            .apply(vec![TreeAction::Append {
                target_id: 1,
                content: "+++\nnext paragraph\n+++".to_string(),
                target_name: None,
            }])
            .await;

        let store = store.read().await;
        let child = store.get(2).unwrap();
        assert_eq!(child.title, "Essay (continued)");
        assert_eq!(child.parent_id, Some(1));
        assert_eq!(child.relationship_to(1), Some("continuation of"));
        assert!(child.content.starts_with("next paragraph"));
        assert!(!child.content.contains("+++"));
        // original target untouched by the append
        assert_eq!(store.get(1).unwrap().num_appends, 0);
        assert_eq!(affected, HashSet::from([1, 2]));
    }

    #[tokio::test]
    async fn test_append_at_threshold_stays_append() {
        let (applier, store) = setup_with_config(ApplierConfig { max_append_len: 10 });
        {
            let mut store = store.write().await;
            store.create_node("Essay", "0123456789", "", None, "");
        }

        let affected = applier
            .apply(vec![TreeAction::Append {
                target_id: 1,
                content: "next".to_string(),
                target_name: None,
            }])
            .await;

        let store = store.read().await;
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.get(1).unwrap().num_appends, 1);
        assert_eq!(affected, HashSet::from([1]));
    }

    #[test]
    fn test_strip_append_markers() {
        assert_eq!(strip_append_markers("+++\nkeep me\n  +++  \nand me"), "keep me\nand me");
        assert_eq!(strip_append_markers("plain"), "plain");
    }
}
