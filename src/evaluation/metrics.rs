//! Regression metrics
//!
//! Naming follows yardstick: `rsq` is the squared Pearson correlation between
//! truth and estimate, `rsq_trad` is the traditional `1 - SS_res / SS_tot`.
//! Sums are taken sequentially in row order so identical inputs always give
//! bit-identical estimates.

use crate::error::{EvalError, Result};
use crate::preprocessing::feature_selection::pearson_correlation;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single regression metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Root mean squared error
    Rmse,
    /// Mean squared error
    Mse,
    /// Mean absolute error
    Mae,
    /// Squared correlation between truth and estimate
    Rsq,
    /// Coefficient of determination
    RsqTrad,
    /// Mean absolute percentage error, in percent
    Mape,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Rmse => "rmse",
            Metric::Mse => "mse",
            Metric::Mae => "mae",
            Metric::Rsq => "rsq",
            Metric::RsqTrad => "rsq_trad",
            Metric::Mape => "mape",
        }
    }

    /// Estimate comparing `estimate` to `truth`.
    ///
    /// `rsq` and `rsq_trad` are NaN when the truth (or, for `rsq`, the
    /// estimate) is constant.
    pub fn compute(&self, truth: ArrayView1<f64>, estimate: ArrayView1<f64>) -> Result<f64> {
        if truth.len() != estimate.len() {
            return Err(EvalError::Validation(format!(
                "{}: truth has {} values, estimate has {}",
                self.name(),
                truth.len(),
                estimate.len()
            )));
        }
        if truth.is_empty() {
            return Err(EvalError::Validation(format!("{}: no observations", self.name())));
        }

        let n = truth.len() as f64;
        let pairs = truth.iter().zip(estimate.iter());

        let value = match self {
            Metric::Mse => pairs.map(|(t, p)| (t - p) * (t - p)).sum::<f64>() / n,
            Metric::Rmse => (pairs.map(|(t, p)| (t - p) * (t - p)).sum::<f64>() / n).sqrt(),
            Metric::Mae => pairs.map(|(t, p)| (t - p).abs()).sum::<f64>() / n,
            Metric::Mape => pairs.map(|(t, p)| ((t - p) / t).abs()).sum::<f64>() / n * 100.0,
            Metric::Rsq => {
                if is_constant(truth) || is_constant(estimate) {
                    f64::NAN
                } else {
                    pearson_correlation(truth, estimate).powi(2)
                }
            }
            Metric::RsqTrad => {
                let mean = truth.iter().sum::<f64>() / n;
                let ss_tot: f64 = truth.iter().map(|t| (t - mean) * (t - mean)).sum();
                let ss_res: f64 = pairs.map(|(t, p)| (t - p) * (t - p)).sum();
                if ss_tot == 0.0 {
                    f64::NAN
                } else {
                    1.0 - ss_res / ss_tot
                }
            }
        };

        Ok(value)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn is_constant(values: ArrayView1<f64>) -> bool {
    match values.first() {
        Some(&first) => values.iter().all(|&v| v == first),
        None => true,
    }
}

/// Ordered collection of metrics computed together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSet(Vec<Metric>);

impl Default for MetricSet {
    /// `rmse`, `rsq`, `mae`
    fn default() -> Self {
        Self(vec![Metric::Rmse, Metric::Rsq, Metric::Mae])
    }
}

impl MetricSet {
    pub fn new(metrics: impl IntoIterator<Item = Metric>) -> Self {
        Self(metrics.into_iter().collect())
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every metric in set order
    pub fn compute(&self, truth: ArrayView1<f64>, estimate: ArrayView1<f64>) -> Result<Vec<(Metric, f64)>> {
        self.0
            .iter()
            .map(|m| m.compute(truth, estimate).map(|v| (*m, v)))
            .collect()
    }
}
