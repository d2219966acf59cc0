//! Seed Ranking
//!
//! Picks the nodes a retrieval pass starts traversing from. The built-in
//! ranker blends recency with keyword relevance: a fixed share of the
//! result slots goes to the most recently modified nodes, and the rest are
//! filled by weighted keyword matches against title, summary, and the
//! leading slice of content. Small forests skip ranking entirely and
//! return every node.
//!
//! The ranker is a trait so deployments can swap in an embedding-backed
//! scorer without touching the traversal side.

use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;

use crate::models::Node;
use crate::services::ClassifierError;
use crate::store::TreeStore;

/// Characters of content considered for keyword matching
const CONTENT_SNIPPET_CHARS: usize = 500;

/// Punctuation stripped from token edges before matching
const EDGE_PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '"', '\'', '-', '(', ')', '[', ']', '{', '}',
];

static STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "a", "an", "and", "are", "as", "at", "be", "been", "by", "for", "from",
        "has", "he", "in", "is", "it", "its", "of", "on", "that", "the", "to",
        "was", "will", "with", "this", "but", "they", "have", "had", "what",
        "when", "where", "who", "which", "why", "how", "all", "would", "there",
        "their", "or", "if", "can", "may", "could", "should", "might", "must",
        "shall", "do", "does", "did", "done", "i", "you", "she", "we", "them",
        "him", "her", "us", "our", "your", "my", "his", "mine", "yours",
        "hers", "ours", "theirs", "me", "myself", "yourself", "himself",
        "herself", "itself", "ourselves", "yourselves", "themselves", "not",
        "no", "nor", "so", "just", "only", "very", "too", "also", "now",
        "then", "here", "both", "each", "few", "more", "most", "other",
        "some", "such", "am", "were", "being", "having", "doing", "because",
        "until", "while", "about", "against", "between", "into", "through",
        "during", "before", "after", "above", "below", "up", "down", "out",
        "off", "over", "under", "again", "further", "once",
    ])
});

/// Selects seed nodes for a retrieval query
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the retriever shares them behind
/// `Arc<dyn RelevanceRanker>`.
#[async_trait]
pub trait RelevanceRanker: Send + Sync {
    /// Up to `limit` node ids worth traversing for this query, ascending
    ///
    /// # Errors
    ///
    /// Returns `ClassifierError` when an external scoring backend fails.
    async fn rank(
        &self,
        query: &str,
        store: &TreeStore,
        limit: usize,
    ) -> Result<Vec<u64>, ClassifierError>;
}

/// Built-in ranker mixing recent nodes with keyword matches
#[derive(Debug, Clone, Default)]
pub struct RecencyKeywordRanker;

#[async_trait]
impl RelevanceRanker for RecencyKeywordRanker {
    async fn rank(
        &self,
        query: &str,
        store: &TreeStore,
        limit: usize,
    ) -> Result<Vec<u64>, ClassifierError> {
        Ok(rank_nodes(query, store, limit))
    }
}

/// Query terms: lowercased, edge punctuation stripped, stopwords and
/// single characters dropped, first occurrence kept
fn tokenize(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tokens = Vec::new();
    for raw in query.to_lowercase().split_whitespace() {
        let token = raw.trim_matches(EDGE_PUNCTUATION);
        if token.chars().count() <= 1 || STOPWORDS.contains(token) {
            continue;
        }
        if seen.insert(token.to_string()) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// Weighted occurrence count: title 3x, summary 2x, content snippet 1x
fn keyword_score(node: &Node, tokens: &[String]) -> usize {
    let title = node.title.to_lowercase();
    let summary = node.summary.to_lowercase();
    let snippet: String = node
        .content
        .chars()
        .take(CONTENT_SNIPPET_CHARS)
        .collect::<String>()
        .to_lowercase();

    tokens
        .iter()
        .map(|token| {
            3 * title.matches(token.as_str()).count()
                + 2 * summary.matches(token.as_str()).count()
                + snippet.matches(token.as_str()).count()
        })
        .sum()
}

/// Recency-plus-keyword seed selection
///
/// Forests at or under `limit` return every node. Larger forests reserve
/// three eighths of the slots for the most recently modified nodes and
/// fill the remainder with the highest-scoring keyword matches; slots
/// without a positive-scoring match stay unfilled. Ids come back sorted
/// ascending.
pub fn rank_nodes(query: &str, store: &TreeStore, limit: usize) -> Vec<u64> {
    if store.is_empty() || limit == 0 {
        return Vec::new();
    }

    if store.node_count() <= limit {
        let mut all: Vec<u64> = store.iter().map(|n| n.id).collect();
        all.sort_unstable();
        return all;
    }

    let recency_slots = (3 * limit) / 8;
    let mut selected = store.recent_nodes(recency_slots);
    let chosen: HashSet<u64> = selected.iter().copied().collect();

    let remaining = limit - selected.len();
    let tokens = tokenize(query);
    if remaining > 0 && !tokens.is_empty() {
        let mut scored: Vec<(usize, &Node)> = store
            .iter()
            .filter(|n| !chosen.contains(&n.id))
            .map(|n| (keyword_score(n, &tokens), n))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| b.1.modified_at.cmp(&a.1.modified_at))
                .then_with(|| a.1.id.cmp(&b.1.id))
        });
        selected.extend(scored.into_iter().take(remaining).map(|(_, n)| n.id));
    }

    selected.sort_unstable();
    selected
}
