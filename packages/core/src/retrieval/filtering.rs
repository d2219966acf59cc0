//! Distance-Based Content Degradation
//!
//! Traversal results can be arbitrarily large; rather than truncating the
//! node set, far nodes are cheaply degraded to summaries or bare titles so
//! the whole structure still fits a bounded downstream context. A coarse
//! [`ContentLevel`] override forces stricter redaction regardless of
//! distance.
//!
//! Distances are signed: positive values are ancestor hops, so only nodes
//! far *above* the target lose detail. Descendants and neighbors sit at
//! non-positive distances and keep full content under the default level.

use crate::models::{ContentLevel, TraversalNode};

/// Redact node content according to level and distance
///
/// Under [`ContentLevel::FullContent`], nodes beyond `far_distance` keep only
/// their title, and nodes beyond `near_distance` keep title and summary.
/// The stricter levels apply uniformly and skip the distance rule.
pub fn apply_content_filter(
    mut nodes: Vec<TraversalNode>,
    level: ContentLevel,
    far_distance: i32,
    near_distance: i32,
) -> Vec<TraversalNode> {
    for node in &mut nodes {
        match level {
            ContentLevel::TitlesOnly => {
                node.summary = None;
                node.content = None;
            }
            ContentLevel::TitlesAndSummaries => {
                node.content = None;
            }
            ContentLevel::FullContent => {
                if node.distance > far_distance {
                    node.summary = None;
                    node.content = None;
                } else if node.distance > near_distance {
                    node.content = None;
                }
            }
        }
    }
    nodes
}
