//! Evaluation pipeline
//!
//! An [`EvalUnit`] names a split, a recipe, a model spec and a label. For each
//! unit the [`Evaluator`] fits the recipe on the training rows, applies it to
//! both partitions, fits the model, predicts the test rows and scores them.
//! Failures stay local to their unit and are reported alongside the metrics
//! of the units that succeeded.

mod config;
pub mod metrics;
mod pipeline;
mod report;

pub use config::EvalConfig;
pub use metrics::{Metric, MetricSet};
pub use pipeline::{resample_units, EvalUnit, Evaluator, LastFit};
pub use report::{EvalReport, MetricRow, MetricSummary, UnitFailure, UnitPredictions, UnitResult};
