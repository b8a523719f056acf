use serde::{Deserialize, Serialize};

use crate::error::{CanopyError, Result};

/// Default number of trees.
pub const DEFAULT_N_ESTIMATORS: usize = 100;
/// Default maximum tree depth.
pub const DEFAULT_MAX_DEPTH: usize = 5;
/// Default seed.
pub const DEFAULT_RANDOM_STATE: u64 = 42;

/// Hyperparameters of a [`RandomForestClassifier`](super::RandomForestClassifier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees in the ensemble.
    pub n_estimators: usize,
    /// Maximum depth of each tree; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Seed for bootstrap sampling and feature subsampling.
    pub random_state: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: DEFAULT_N_ESTIMATORS,
            max_depth: Some(DEFAULT_MAX_DEPTH),
            random_state: DEFAULT_RANDOM_STATE,
        }
    }
}

impl ForestParams {
    /// Set the number of trees.
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Set the maximum depth.
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the seed.
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Checks that the parameters describe a trainable forest.
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(CanopyError::InvalidParams(
                "n_estimators must be at least 1".into(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(CanopyError::InvalidParams(
                "max_depth must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Key/value pairs as sent to the tracking server, in a stable order.
    #[must_use]
    pub fn to_param_map(&self) -> Vec<(String, String)> {
        let max_depth = self
            .max_depth
            .map_or_else(|| "None".to_string(), |d| d.to_string());
        vec![
            ("n_estimators".to_string(), self.n_estimators.to_string()),
            ("max_depth".to_string(), max_depth),
            ("random_state".to_string(), self.random_state.to_string()),
        ]
    }
}
