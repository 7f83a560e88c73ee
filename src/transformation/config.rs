//! Transformation configuration

use crate::ast::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};

/// Knobs of a transformation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformationConfig {
    /// Deepest argument or predicate tree accepted at construction
    pub max_expression_depth: usize,

    /// Skip (and log) input records that are not objects instead of failing the run
    pub skip_malformed_input: bool,

    /// Upper bound on worker threads in partitioned runs; 0 means one per partition
    pub partition_threads: usize,
}

impl TransformationConfig {
    /// Create a configuration with custom settings
    pub fn new(max_expression_depth: usize, skip_malformed_input: bool, partition_threads: usize) -> Self {
        Self {
            max_expression_depth,
            skip_malformed_input,
            partition_threads,
        }
    }

    /// Fail on the first malformed record
    pub fn strict() -> Self {
        Self {
            skip_malformed_input: false,
            ..Self::default()
        }
    }

    /// Skip malformed records
    pub fn lenient() -> Self {
        Self {
            skip_malformed_input: true,
            ..Self::default()
        }
    }

    /// Number of worker threads for `partitions` partitions
    pub fn worker_threads(&self, partitions: usize) -> usize {
        match self.partition_threads {
            0 => partitions,
            limit => limit.min(partitions),
        }
        .max(1)
    }
}

impl Default for TransformationConfig {
    fn default() -> Self {
        Self {
            max_expression_depth: DEFAULT_MAX_DEPTH,
            skip_malformed_input: false,
            partition_threads: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = TransformationConfig::default();
        assert_eq!(config.max_expression_depth, 64);
        assert!(!config.skip_malformed_input);
        assert_eq!(config.partition_threads, 0);
        assert_eq!(config, TransformationConfig::strict());
    }

    #[test]
    fn test_config_lenient() {
        assert!(TransformationConfig::lenient().skip_malformed_input);
    }

    #[test]
    fn test_worker_threads() {
        assert_eq!(TransformationConfig::default().worker_threads(4), 4);
        assert_eq!(TransformationConfig::new(64, false, 2).worker_threads(4), 2);
        assert_eq!(TransformationConfig::new(64, false, 8).worker_threads(3), 3);
        assert_eq!(TransformationConfig::default().worker_threads(0), 1);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: TransformationConfig =
            serde_json::from_str(r#"{"skip_malformed_input": true}"#).unwrap();
        assert_eq!(config, TransformationConfig::lenient());
    }
}
