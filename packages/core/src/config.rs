//! Configuration for tree construction and retrieval
//!
//! Every threshold that shapes behavior lives in one of these structs and is
//! passed into the owning component's constructor. Defaults match the tuned
//! values the pipeline ships with.

use serde::{Deserialize, Serialize};

/// Configuration for the action applier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplierConfig {
    /// Content length (chars) above which an append is demoted to a
    /// continuation child (default: 1500)
    pub max_append_len: usize,
}

impl Default for ApplierConfig {
    fn default() -> Self {
        Self {
            max_append_len: 1500,
        }
    }
}

impl ApplierConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_append_len == 0 {
            return Err("max_append_len must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Configuration for the pending-input text buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Characters accumulated before a chunk is released for processing
    /// (default: 500)
    pub flush_threshold: usize,
    /// Transcript history is trimmed to `flush_threshold * history_multiplier`
    /// characters (default: 3)
    pub history_multiplier: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            flush_threshold: 500,
            history_multiplier: 3,
        }
    }
}

impl BufferConfig {
    /// Maximum characters of transcript history retained
    pub fn history_limit(&self) -> usize {
        self.flush_threshold * self.history_multiplier
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.flush_threshold == 0 {
            return Err("flush_threshold must be greater than 0".to_string());
        }
        if self.history_multiplier == 0 {
            return Err("history_multiplier must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Configuration for the chunk-processing workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Buffer thresholds for this session
    pub buffer: BufferConfig,
    /// Consecutive no-progress iterations tolerated before stuck input is
    /// force-evicted (default: 2)
    #[serde(default = "default_stuck_repeat_limit")]
    pub stuck_repeat_limit: u32,
}

fn default_stuck_repeat_limit() -> u32 {
    2
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            buffer: BufferConfig::default(),
            stuck_repeat_limit: default_stuck_repeat_limit(),
        }
    }
}

impl WorkflowConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.buffer.validate()?;
        if self.stuck_repeat_limit == 0 {
            return Err("stuck_repeat_limit must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Configuration for context retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum traversal depth in either direction (default: 5)
    pub max_depth: u32,
    /// Neighborhood expansion radius around each seed (default: 3)
    pub neighborhood_radius: u32,
    /// How many seed nodes the ranker returns (default: 12)
    pub seed_limit: usize,
    /// Signed distance beyond which nodes degrade to title only (default: 12)
    pub far_distance: i32,
    /// Signed distance beyond which nodes degrade to title and summary
    /// (default: 5)
    pub near_distance: i32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            neighborhood_radius: 3,
            seed_limit: 12,
            far_distance: 12,
            near_distance: 5,
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.seed_limit == 0 {
            return Err("seed_limit must be greater than 0".to_string());
        }
        if self.near_distance < 0 {
            return Err("near_distance cannot be negative".to_string());
        }
        if self.far_distance < self.near_distance {
            return Err("far_distance cannot be less than near_distance".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applier_defaults() {
        let config = ApplierConfig::default();
        assert_eq!(config.max_append_len, 1500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_buffer_defaults() {
        let config = BufferConfig::default();
        assert_eq!(config.flush_threshold, 500);
        assert_eq!(config.history_multiplier, 3);
        assert_eq!(config.history_limit(), 1500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_workflow_defaults() {
        let config = WorkflowConfig::default();
        assert_eq!(config.stuck_repeat_limit, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_retrieval_defaults() {
        let config = RetrievalConfig::default();
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.neighborhood_radius, 3);
        assert_eq!(config.seed_limit, 12);
        assert_eq!(config.far_distance, 12);
        assert_eq!(config.near_distance, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let config = BufferConfig {
            flush_threshold: 0,
            history_multiplier: 3,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_distances() {
        let config = RetrievalConfig {
            far_distance: 2,
            near_distance: 5,
            ..RetrievalConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_workflow_config_serde_defaults() {
        let config: WorkflowConfig = serde_json::from_str(r#"{"buffer":{"flush_threshold":100,"history_multiplier":2}}"#).unwrap();
        assert_eq!(config.buffer.flush_threshold, 100);
        assert_eq!(config.stuck_repeat_limit, 2);
    }
}
