//! Incremental Text Buffer
//!
//! Streamed text lands here before classification. The buffer accumulates
//! fragments until enough has arrived to be worth classifying, then hands the
//! pending text out and removes whatever the classifier actually routed.
//! Classifier output rarely matches the buffered text byte for byte, so
//! removal falls back to fuzzy matching.
//!
//! A bounded history of everything ever buffered rides alongside the pending
//! text and is passed to the placement classifier as context.
//!
//! # Examples
//!
//! ```rust
//! use streamtree_core::config::BufferConfig;
//! use streamtree_core::services::TextBuffer;
//!
//! let config = BufferConfig {
//!     flush_threshold: 10,
//!     history_multiplier: 3,
//! };
//! let mut buffer = TextBuffer::new(config);
//!
//! buffer.add_text("short");
//! assert!(buffer.ready_text().is_none());
//!
//! buffer.add_text("and longer");
//! assert!(buffer.ready_text().is_some());
//! ```

use crate::config::BufferConfig;
use crate::utils::{remove_matched_text, DEFAULT_MATCH_THRESHOLD};

use super::error::BufferError;

/// Pending text plus a bounded transcript history
#[derive(Debug, Clone)]
pub struct TextBuffer {
    buffer: String,
    history: String,
    config: BufferConfig,
}

impl TextBuffer {
    /// Create an empty buffer with the given thresholds
    pub fn new(config: BufferConfig) -> Self {
        Self {
            buffer: String::new(),
            history: String::new(),
            config,
        }
    }

    /// Append a fragment to the pending buffer and the history
    ///
    /// Fragments are joined with a single space when neither side already
    /// provides one. The history keeps only its most recent
    /// `history_limit()` characters.
    pub fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        if !self.buffer.is_empty() && !text.starts_with(' ') && !self.buffer.ends_with(' ') {
            self.buffer.push(' ');
        }
        self.buffer.push_str(text);

        if !self.history.is_empty() && !text.starts_with(' ') && !self.history.ends_with(' ') {
            self.history.push(' ');
        }
        self.history.push_str(text);

        let limit = self.config.history_limit();
        let count = self.history.chars().count();
        if count > limit {
            let cut = self
                .history
                .char_indices()
                .nth(count - limit)
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.history.drain(..cut);
        }
    }

    /// Pending text, when enough has accumulated to classify
    pub fn ready_text(&self) -> Option<String> {
        if self.buffer.chars().count() >= self.config.flush_threshold {
            Some(self.buffer.clone())
        } else {
            None
        }
    }

    /// Remove text the classifier routed from the pending buffer
    ///
    /// Exact occurrences are removed first; otherwise the closest fuzzy span
    /// at or above the default similarity cutoff is spliced out.
    ///
    /// # Errors
    ///
    /// Returns `BufferError::MatchNotFound` when the processed text cannot be
    /// located even fuzzily. The buffer is left untouched in that case.
    pub fn flush_processed(&mut self, processed: &str) -> Result<(), BufferError> {
        if self.buffer.contains(processed) {
            let remaining = self.buffer.replace(processed, "");
            self.buffer = collapse_spaces(&remaining).trim().to_string();
            return Ok(());
        }

        if let Some(remaining) =
            remove_matched_text(&self.buffer, processed, DEFAULT_MATCH_THRESHOLD)
        {
            self.buffer = remaining;
            return Ok(());
        }

        Err(BufferError::MatchNotFound {
            text_len: processed.chars().count(),
            buffer_len: self.buffer.chars().count(),
        })
    }

    /// Pending text still awaiting classification
    pub fn remainder(&self) -> &str {
        &self.buffer
    }

    /// Transcript history, oldest surviving character first
    pub fn history(&self) -> &str {
        &self.history
    }

    /// Drop the pending buffer; history is kept
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Collapse runs of spaces left behind by text removal
fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_space = false;
    for ch in text.chars() {
        if ch == ' ' {
            if !prev_space {
                out.push(ch);
            }
            prev_space = true;
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out
}
