//! Aggregated evaluation output

use super::metrics::Metric;
use crate::error::{ErrorKind, Result};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSON has no NaN: non-finite values are written as `null` and read back as NaN
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, s: S) -> std::result::Result<S::Ok, S::Error> {
        if value.is_finite() {
            s.serialize_f64(*value)
        } else {
            s.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::NAN))
    }
}

/// One metric estimate for one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub fold_id: String,
    pub label: String,
    pub metric: Metric,
    #[serde(with = "nan_as_null")]
    pub estimate: f64,
}

/// A unit that did not produce metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFailure {
    pub fold_id: String,
    pub label: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Test-set predictions of one unit, keyed by row index into the original dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitPredictions {
    pub fold_id: String,
    pub label: String,
    pub rows: Vec<usize>,
    pub truth: Vec<f64>,
    pub estimate: Vec<f64>,
}

/// Output of a successful unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitResult {
    pub fold_id: String,
    pub label: String,
    pub metrics: Vec<MetricRow>,
    pub predictions: Option<UnitPredictions>,
}

/// Mean and spread of one metric across the units sharing a label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub label: String,
    pub metric: Metric,
    /// Units with a finite estimate
    pub n: usize,
    #[serde(with = "nan_as_null")]
    pub mean: f64,
    /// Sample variance; NaN when `n < 2`
    #[serde(with = "nan_as_null")]
    pub variance: f64,
    #[serde(with = "nan_as_null")]
    pub std_err: f64,
}

/// Concatenated metrics and failures of an evaluation run, in unit order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub metrics: Vec<MetricRow>,
    pub failures: Vec<UnitFailure>,
    pub predictions: Vec<UnitPredictions>,
}

impl EvalReport {
    pub(crate) fn push(&mut self, result: UnitResult) {
        self.metrics.extend(result.metrics);
        if let Some(p) = result.predictions {
            self.predictions.push(p);
        }
    }

    pub(crate) fn push_failure(&mut self, failure: UnitFailure) {
        self.failures.push(failure);
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn metrics_for<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a MetricRow> + 'a {
        self.metrics.iter().filter(move |r| r.label == label)
    }

    pub fn failures_for<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a UnitFailure> + 'a {
        self.failures.iter().filter(move |f| f.label == label)
    }

    /// Per label and metric: count, mean, sample variance and standard error.
    ///
    /// Non-finite estimates are left out. Sorted by label, then metric name.
    pub fn summarize(&self) -> Vec<MetricSummary> {
        let mut groups: BTreeMap<(&str, &str), (Metric, Vec<f64>)> = BTreeMap::new();
        for row in &self.metrics {
            let entry = groups
                .entry((row.label.as_str(), row.metric.name()))
                .or_insert_with(|| (row.metric, Vec::new()));
            if row.estimate.is_finite() {
                entry.1.push(row.estimate);
            }
        }

        groups
            .into_iter()
            .map(|((label, _), (metric, values))| {
                let n = values.len();
                let mean = if n > 0 {
                    values.iter().sum::<f64>() / n as f64
                } else {
                    f64::NAN
                };
                let variance = if n > 1 {
                    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1) as f64
                } else {
                    f64::NAN
                };
                MetricSummary {
                    label: label.to_string(),
                    metric,
                    n,
                    mean,
                    variance,
                    std_err: (variance / n as f64).sqrt(),
                }
            })
            .collect()
    }

    /// Pretty-printed JSON; stable for identical inputs
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Inverse of [`EvalReport::to_json`]
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Metric rows as a `fold_id | label | metric | estimate` frame
    pub fn metrics_frame(&self) -> Result<DataFrame> {
        let fold_id: Vec<&str> = self.metrics.iter().map(|r| r.fold_id.as_str()).collect();
        let label: Vec<&str> = self.metrics.iter().map(|r| r.label.as_str()).collect();
        let metric: Vec<&str> = self.metrics.iter().map(|r| r.metric.name()).collect();
        let estimate: Vec<f64> = self.metrics.iter().map(|r| r.estimate).collect();

        let df = polars::df!(
            "fold_id" => fold_id,
            "label" => label,
            "metric" => metric,
            "estimate" => estimate,
        )?;
        Ok(df)
    }
}
