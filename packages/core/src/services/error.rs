//! Service Layer Error Types
//!
//! Error types for the mutation pipeline: classifier calls, text buffering,
//! and the workflow that drives both against the store.

use crate::store::StoreError;
use thiserror::Error;

/// Classifier invocation errors
///
/// Raised by placement and optimization classifiers, and by the JSON decoding
/// helpers the applier feeds their output through.
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// The classifier backend could not be reached or failed outright
    #[error("Classifier call failed: {message}")]
    CallFailed { message: String },

    /// The classifier answered, but not in the shape the pipeline expects
    #[error("Malformed classifier response: {message}")]
    MalformedResponse { message: String },
}

impl ClassifierError {
    /// Create a call failed error
    pub fn call_failed(message: impl Into<String>) -> Self {
        Self::CallFailed {
            message: message.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }
}

/// Text buffer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BufferError {
    /// Processed text could not be located in the pending buffer
    #[error("Processed text ({text_len} chars) not found in buffer ({buffer_len} chars)")]
    MatchNotFound { text_len: usize, buffer_len: usize },
}

/// Workflow orchestration errors
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// A classifier call failed or returned garbage
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    /// A store operation failed mid-workflow
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
