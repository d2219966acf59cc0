//! Shared text utilities
//!
//! Fuzzy matching locates processed fragments inside buffered text, and the
//! markdown helpers derive summaries and clean content for display.

mod fuzzy;
mod markdown;

pub use fuzzy::{
    find_best_match, levenshtein_capped, remove_matched_text, similarity, FuzzyMatch,
    DEFAULT_MATCH_THRESHOLD,
};
pub use markdown::{extract_summary, strip_front_matter};
