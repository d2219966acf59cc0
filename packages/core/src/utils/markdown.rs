//! Summary derivation from markdown-flavored node content
//!
//! Classifier output may create nodes without an explicit summary. This
//! module derives a short description from the content itself, preferring
//! deliberate markers (bold lead-ins, headings) over raw prose.

use regex::Regex;
use std::sync::LazyLock;

/// First bold span, spanning lines
static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\*\*(.+?)\*\*").unwrap());

/// First markdown heading of any level
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#+\s*(.+)$").unwrap());

/// Derive a one-line summary from node content
///
/// Tries, in order: the first bold span, the first heading, the first
/// meaningful prose line (truncated to its first sentence or 60
/// characters), and finally the first non-empty line of any kind.
///
/// # Arguments
///
/// * `content` - The markdown content to summarize
///
/// # Returns
///
/// A short summary, or a placeholder when the content is empty or carries
/// nothing summarizable
///
/// # Examples
///
/// ```
/// use streamtree_core::utils::extract_summary;
///
/// assert_eq!(extract_summary("**Budget review** and the details"), "Budget review");
/// assert_eq!(extract_summary("# Planning Notes\nbody text"), "Planning Notes");
/// assert_eq!(extract_summary(""), "Empty content");
/// ```
pub fn extract_summary(content: &str) -> String {
    if content.trim().is_empty() {
        return "Empty content".to_string();
    }

    if let Some(caps) = BOLD_RE.captures(content) {
        let summary = caps[1].trim();
        if summary.chars().count() > 3 {
            return summary.to_string();
        }
    }

    if let Some(caps) = HEADING_RE.captures(content) {
        let summary = caps[1].trim();
        if summary.chars().count() > 3 {
            return summary.to_string();
        }
    }

    // First meaningful prose line.
    for line in content.trim().lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
            continue;
        }
        if line.chars().count() > 10 {
            if line.contains('.') {
                let first_sentence = line.split('.').next().unwrap_or("").trim();
                if first_sentence.chars().count() > 10 {
                    return first_sentence.to_string();
                }
            }
            if line.chars().count() <= 60 {
                return line.to_string();
            }
            return format!("{}...", line.chars().take(60).collect::<String>());
        }
    }

    // Fallback: first non-empty line of any length.
    for line in content.trim().lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
            continue;
        }
        if line.chars().count() > 50 {
            return format!("{}...", line.chars().take(50).collect::<String>());
        }
        return line.to_string();
    }

    "Content summary unavailable".to_string()
}

/// Remove `---` front-matter blocks from content
///
/// Lines between a pair of `---` markers are dropped, the marker lines
/// included, and the result is trimmed.
///
/// # Examples
///
/// ```
/// use streamtree_core::utils::strip_front_matter;
///
/// let content = "---\nid: 4\n---\nActual body";
/// assert_eq!(strip_front_matter(content), "Actual body");
/// ```
pub fn strip_front_matter(content: &str) -> String {
    let mut kept = Vec::new();
    let mut in_front_matter = false;
    for line in content.lines() {
        if line.trim() == "---" {
            in_front_matter = !in_front_matter;
            continue;
        }
        if !in_front_matter {
            kept.push(line);
        }
    }
    kept.join("\n").trim().to_string()
}
