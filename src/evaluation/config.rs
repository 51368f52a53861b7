//! Evaluation configuration

use super::metrics::{Metric, MetricSet};
use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings shared by every unit of an evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Metrics computed for each unit
    pub metrics: MetricSet,
    /// Map units across a rayon pool
    pub parallel: bool,
    /// Worker threads when parallel (None = rayon default)
    pub n_jobs: Option<usize>,
    /// Keep per-unit test predictions in the report
    pub save_predictions: bool,
    /// Seed for resampling
    pub seed: u64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            metrics: MetricSet::default(),
            parallel: false,
            n_jobs: None,
            save_predictions: false,
            seed: 42,
        }
    }
}

impl EvalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(mut self, metrics: impl IntoIterator<Item = Metric>) -> Self {
        self.metrics = MetricSet::new(metrics);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = Some(n_jobs);
        self
    }

    pub fn with_save_predictions(mut self, save: bool) -> Self {
        self.save_predictions = save;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Load from a JSON file; absent fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.metrics.is_empty() {
            return Err(EvalError::Config("at least one metric is required".to_string()));
        }
        if self.n_jobs == Some(0) {
            return Err(EvalError::Config("n_jobs must be at least 1".to_string()));
        }
        Ok(())
    }
}
