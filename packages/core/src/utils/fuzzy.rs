//! Fuzzy text matching for locating processed fragments in buffered text
//!
//! Classifier output rarely matches the buffer byte for byte: fillers get
//! edited out, punctuation shifts, and the occasional word is transcribed
//! differently. This module locates the best approximate occurrence of a
//! fragment inside a larger text so the consumed portion can be removed
//! from the buffer.

/// Minimum similarity for a fuzzy match to be accepted
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.8;

/// Similarity above which two texts of near-equal length are treated as
/// the same text
const NEAR_IDENTICAL_SCORE: f64 = 0.88;

/// Allowed character-length difference between a fragment and a candidate
/// window
const WINDOW_SLACK_CHARS: usize = 10;

/// Sentence punctuation swallowed after a match so the buffer is not left
/// with a dangling "." or "?"
const TRAILING_PUNCTUATION: [char; 6] = ['.', '!', '?', ',', ';', ':'];

/// A located occurrence of a fragment inside a source text
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch {
    /// Byte offset where the match starts in the source text
    pub start: usize,
    /// Byte offset one past the end of the match in the source text
    pub end: usize,
    /// Similarity score in `[0.0, 1.0]`
    pub score: f64,
}

/// Levenshtein distance between two strings, capped at `max_dist`
///
/// Returns `max_dist + 1` as soon as the distance is known to exceed the
/// cap, which keeps window scans cheap for clearly dissimilar candidates.
/// Distances are measured in characters, not bytes.
pub fn levenshtein_capped(a: &str, b: &str, max_dist: usize) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let n = b_chars.len();
    let a_len = a.chars().count();

    // Length difference is a lower bound on the distance.
    if a_len.abs_diff(n) > max_dist {
        return max_dist + 1;
    }
    if n == 0 {
        return a_len;
    }
    if a_len == 0 {
        return n;
    }

    // Two-row DP over `a` x `b`, with an early exit when the whole row
    // exceeds the cap.
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr: Vec<usize> = vec![0; n + 1];

    for (i, c) in a.chars().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];

        for j in 1..=n {
            let cost = usize::from(c != b_chars[j - 1]);
            let d = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            curr[j] = d;
            row_min = row_min.min(d);
        }

        if row_min > max_dist {
            return max_dist + 1;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n].min(max_dist + 1)
}

/// Similarity between two strings in `[0.0, 1.0]`
///
/// Defined as `1 - distance / max_char_len`. Two empty strings are
/// identical and score `1.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let dist = levenshtein_capped(a, b, max_len);
    1.0 - dist as f64 / max_len as f64
}

/// Find the best occurrence of `needle` inside `haystack`
///
/// Matching runs in three tiers, cheapest first:
/// 1. Exact substring search.
/// 2. Whole-text comparison when the lengths are close, for the common
///    case where the fragment is the entire buffer.
/// 3. A word-boundary window scan scored by capped Levenshtein distance.
///
/// An accepted match is extended over trailing sentence punctuation so the
/// remainder does not start with a stray "." or "?".
///
/// # Arguments
///
/// * `needle` - The fragment to locate
/// * `haystack` - The text to search in
/// * `threshold` - Minimum similarity in `[0.0, 1.0]` for a fuzzy match
///
/// # Examples
///
/// ```
/// use streamtree_core::utils::find_best_match;
///
/// let text = "say hello world. next topic";
/// let m = find_best_match("hello world", text, 0.8).unwrap();
/// assert_eq!(&text[m.start..m.end], "hello world.");
/// ```
pub fn find_best_match(needle: &str, haystack: &str, threshold: f64) -> Option<FuzzyMatch> {
    if needle.is_empty() || haystack.is_empty() {
        return None;
    }

    // Tier 1: exact substring.
    if let Some(start) = haystack.find(needle) {
        let end = extend_trailing_punctuation(haystack, start + needle.len());
        return Some(FuzzyMatch {
            start,
            end,
            score: 1.0,
        });
    }

    let needle_len = needle.chars().count();
    let haystack_len = haystack.chars().count();

    // Tier 2: the fragment is essentially the whole text.
    if needle_len.abs_diff(haystack_len) <= WINDOW_SLACK_CHARS {
        let score = similarity(needle, haystack);
        if score >= NEAR_IDENTICAL_SCORE {
            return Some(FuzzyMatch {
                start: 0,
                end: haystack.len(),
                score,
            });
        }
    }

    // Tier 3: scan word-aligned windows whose length is close to the
    // fragment's.
    let spans = word_spans(haystack);
    let min_window = needle_len.saturating_sub(WINDOW_SLACK_CHARS);
    let max_window = needle_len + WINDOW_SLACK_CHARS;

    let mut best: Option<FuzzyMatch> = None;
    for i in 0..spans.len() {
        for span in &spans[i..] {
            let (start, end) = (spans[i].0, span.1);
            let window = &haystack[start..end];
            let window_len = window.chars().count();
            if window_len > max_window {
                break;
            }
            if window_len < min_window {
                continue;
            }

            let max_len = needle_len.max(window_len);
            // Largest distance still satisfying the threshold.
            let allowed = ((1.0 - threshold) * max_len as f64).floor() as usize;
            let dist = levenshtein_capped(needle, window, allowed);
            if dist > allowed {
                continue;
            }

            let score = 1.0 - dist as f64 / max_len as f64;
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(FuzzyMatch { start, end, score });
            }
        }
    }

    best.map(|m| FuzzyMatch {
        end: extend_trailing_punctuation(haystack, m.end),
        ..m
    })
}

/// Remove the best match for `matched` from `source`
///
/// Returns `None` when no occurrence scores at or above `threshold`. On
/// success the surrounding pieces are joined with a single space where the
/// removal would otherwise glue two words together, and runs of whitespace
/// are collapsed.
///
/// # Examples
///
/// ```
/// use streamtree_core::utils::remove_matched_text;
///
/// let rest = remove_matched_text("keep this and drop that", "and drop that", 0.8);
/// assert_eq!(rest.as_deref(), Some("keep this"));
/// ```
pub fn remove_matched_text(source: &str, matched: &str, threshold: f64) -> Option<String> {
    let m = find_best_match(matched, source, threshold)?;

    let before = &source[..m.start];
    let after = &source[m.end..];
    let joined = if !before.is_empty()
        && !after.is_empty()
        && !before.ends_with(' ')
        && !after.starts_with(' ')
    {
        format!("{before} {after}")
    } else {
        format!("{before}{after}")
    };

    Some(joined.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Byte spans of whitespace-separated words in `text`
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                spans.push((s, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

/// Advance `end` past any sentence punctuation directly following it
fn extend_trailing_punctuation(text: &str, end: usize) -> usize {
    let mut end = end;
    for c in text[end..].chars() {
        if TRAILING_PUNCTUATION.contains(&c) {
            end += c.len_utf8();
        } else {
            break;
        }
    }
    end
}
