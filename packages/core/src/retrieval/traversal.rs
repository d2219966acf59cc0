//! Bidirectional Link Traversal
//!
//! Walks the forest along content cross-references rather than stored tree
//! shape. Parent links come from parsing a node's own content for
//! references; child links come from the inverse operation, scanning every
//! node for references back to the current one. The inverse scan is O(n)
//! per node, which is fine at the intended scale and keeps the store free
//! of an extra reverse index.
//!
//! Ancestor and descendant expansion never mix: a node reached upward is
//! only expanded upward, and likewise downward, so one traversal cannot
//! wander sideways through the whole forest. The optional neighborhood
//! walk is the deliberate exception, and only runs for the primary target
//! of a retrieval call.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokio::sync::RwLock;

use crate::config::RetrievalConfig;
use crate::models::{TraversalNode, TraversalOptions};
use crate::store::{StoreError, TreeStore};

use super::filtering::apply_content_filter;

static WIKI_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(\d+)\]\]").unwrap());

/// Extracts outbound node references from content
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the engine shares them behind
/// `Arc<dyn LinkResolver>`.
pub trait LinkResolver: Send + Sync {
    /// All node ids the content refers to, in order of appearance
    fn resolve(&self, content: &str) -> Vec<u64>;
}

/// Default resolver for `[[id]]` style references
#[derive(Debug, Clone, Default)]
pub struct WikiLinkResolver;

impl LinkResolver for WikiLinkResolver {
    fn resolve(&self, content: &str) -> Vec<u64> {
        WIKI_LINK_RE
            .captures_iter(content)
            .filter_map(|caps| caps[1].parse().ok())
            .collect()
    }
}

/// Read-only traversal over a shared store
#[derive(Clone)]
pub struct TraversalEngine {
    store: Arc<RwLock<TreeStore>>,
    resolver: Arc<dyn LinkResolver>,
    config: RetrievalConfig,
}

impl TraversalEngine {
    pub fn new(
        store: Arc<RwLock<TreeStore>>,
        resolver: Arc<dyn LinkResolver>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            resolver,
            config,
        }
    }

    /// Collect the context around a target node
    ///
    /// Ancestors come first, furthest from the target leading, then the
    /// target at distance 0, then descendants in discovery order with
    /// negative distances. When the options ask for a neighborhood and
    /// `is_primary_target` is set, nodes within the configured radius that
    /// are not already on the path are appended at distance 0 with
    /// `is_neighbor` set. Content degradation runs on the combined result.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NodeNotFound` when the target does not resolve.
    pub async fn traverse(
        &self,
        target_id: u64,
        options: &TraversalOptions,
        is_primary_target: bool,
    ) -> Result<Vec<TraversalNode>, StoreError> {
        let store = self.store.read().await;
        let target = store
            .get(target_id)
            .ok_or_else(|| StoreError::node_not_found(target_id))?;

        let resolver = self.resolver.as_ref();
        let mut nodes = Vec::new();

        if options.include_parents {
            nodes.extend(collect_ancestors(
                &store,
                resolver,
                target_id,
                options.max_depth,
            ));
        }

        let mut target_node = TraversalNode::from_node(target, 0);
        target_node.is_target = is_primary_target;
        nodes.push(target_node);

        if options.include_children {
            nodes.extend(collect_descendants(
                &store,
                resolver,
                target_id,
                options.max_depth,
            ));
        }

        if options.include_neighborhood && is_primary_target {
            let on_path: HashSet<u64> = nodes.iter().map(|n| n.id).collect();
            nodes.extend(collect_neighborhood(
                &store,
                resolver,
                target_id,
                options.neighborhood_radius,
                &on_path,
            ));
        }

        Ok(apply_content_filter(
            nodes,
            options.content_level,
            self.config.far_distance,
            self.config.near_distance,
        ))
    }
}

/// Ids referenced by this node's content, restricted to live nodes
fn parent_links(store: &TreeStore, resolver: &dyn LinkResolver, id: u64) -> Vec<u64> {
    let Some(node) = store.get(id) else {
        return Vec::new();
    };
    resolver
        .resolve(&node.content)
        .into_iter()
        .filter(|&pid| pid != id && store.contains(pid))
        .collect()
}

/// Ids of nodes whose content references this node, ascending
fn child_links(store: &TreeStore, resolver: &dyn LinkResolver, id: u64) -> Vec<u64> {
    let mut children: Vec<u64> = store
        .iter()
        .filter(|other| other.id != id && resolver.resolve(&other.content).contains(&id))
        .map(|other| other.id)
        .collect();
    children.sort_unstable();
    children
}

fn collect_ancestors(
    store: &TreeStore,
    resolver: &dyn LinkResolver,
    target_id: u64,
    max_depth: u32,
) -> Vec<TraversalNode> {
    let mut visited = HashSet::new();
    let mut collected = Vec::new();
    walk(
        store,
        resolver,
        target_id,
        0,
        max_depth,
        Direction::Parents,
        &mut visited,
        &mut collected,
    );

    let mut ancestors: Vec<TraversalNode> = collected
        .into_iter()
        .filter(|n| n.id != target_id)
        .collect();
    ancestors.sort_by(|a, b| b.distance.cmp(&a.distance));
    ancestors
}

fn collect_descendants(
    store: &TreeStore,
    resolver: &dyn LinkResolver,
    target_id: u64,
    max_depth: u32,
) -> Vec<TraversalNode> {
    let mut visited = HashSet::new();
    let mut collected = Vec::new();
    walk(
        store,
        resolver,
        target_id,
        0,
        max_depth,
        Direction::Children,
        &mut visited,
        &mut collected,
    );

    collected
        .into_iter()
        .filter(|n| n.id != target_id)
        .map(|mut n| {
            n.distance = -n.distance;
            n
        })
        .collect()
}

#[derive(Clone, Copy, PartialEq)]
enum Direction {
    Parents,
    Children,
}

#[allow(clippy::too_many_arguments)]
fn walk(
    store: &TreeStore,
    resolver: &dyn LinkResolver,
    id: u64,
    depth: u32,
    max_depth: u32,
    direction: Direction,
    visited: &mut HashSet<u64>,
    collected: &mut Vec<TraversalNode>,
) {
    if depth > max_depth || !visited.insert(id) {
        return;
    }
    let Some(node) = store.get(id) else {
        return;
    };
    if node.content.is_empty() {
        return;
    }

    collected.push(TraversalNode::from_node(node, depth as i32));

    let next = match direction {
        Direction::Parents => parent_links(store, resolver, id),
        Direction::Children => child_links(store, resolver, id),
    };
    for next_id in next {
        walk(
            store,
            resolver,
            next_id,
            depth + 1,
            max_depth,
            direction,
            visited,
            collected,
        );
    }
}

/// Undirected BFS out to `radius` hops, excluding the path already collected
fn collect_neighborhood(
    store: &TreeStore,
    resolver: &dyn LinkResolver,
    target_id: u64,
    radius: u32,
    on_path: &HashSet<u64>,
) -> Vec<TraversalNode> {
    if radius == 0 {
        return Vec::new();
    }

    let mut visited = HashSet::from([target_id]);
    let mut queue = VecDeque::from([(target_id, 0u32)]);
    let mut neighbors = Vec::new();

    while let Some((current, hops)) = queue.pop_front() {
        if hops >= radius {
            continue;
        }

        let mut adjacent = parent_links(store, resolver, current);
        adjacent.extend(child_links(store, resolver, current));
        for next in adjacent {
            if !visited.insert(next) {
                continue;
            }
            if !on_path.contains(&next) {
                if let Some(node) = store.get(next) {
                    let mut neighbor = TraversalNode::from_node(node, 0);
                    neighbor.is_neighbor = true;
                    neighbors.push(neighbor);
                }
            }
            queue.push_back((next, hops + 1));
        }
    }

    neighbors
}
