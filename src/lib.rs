//! resample_bench - resampled evaluation of regression models
//!
//! This crate provides:
//! - Loading numeric tables into a read-only [`data::Dataset`]
//! - Seeded holdout and k-fold splitting
//! - Preprocessing recipes fit on training rows only
//! - Linear regression and epsilon-support vector regression
//! - An evaluation pipeline that fits, predicts and scores many
//!   (split, recipe, model) units and isolates their failures
//!
//! # Modules
//!
//! - [`data`] - Dataset, column kinds, formulas, CSV loading
//! - [`resampling`] - Holdout and cross-validation splits
//! - [`preprocessing`] - Recipe steps and fitted recipes
//! - [`training`] - Model specs and fitted models
//! - [`evaluation`] - Metrics, evaluator, reports
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use resample_bench::prelude::*;
//!
//! let data = DataLoader::new().load_csv("housing.csv")?;
//! let splits = CrossValidator::k_fold(10).with_random_state(42).split(data.n_rows())?;
//! let recipe = Recipe::new("medv")
//!     .as_nominal(["chas"])
//!     .range_scale(Selector::AllNumericPredictors)
//!     .dummy(Selector::AllNominalPredictors);
//! let model = ModelSpec::linear_reg();
//!
//! let units = resample_units(&splits, &recipe, &model, "lm");
//! let report = Evaluator::new(EvalConfig::default())?.run(&data, &units);
//! for row in report.summarize() {
//!     println!("{} {} {:.3}", row.label, row.metric, row.mean);
//! }
//! # Ok::<(), resample_bench::error::EvalError>(())
//! ```

// Core error handling
pub mod error;

pub mod data;
pub mod resampling;
pub mod preprocessing;
pub mod training;
pub mod evaluation;

// Interfaces
pub mod cli;

pub use error::{ErrorKind, EvalError, Result};

/// Commonly used types
pub mod prelude {
    pub use crate::data::{ColumnKind, DataLoader, Dataset, Formula};
    pub use crate::error::{ErrorKind, EvalError, Result};
    pub use crate::evaluation::{
        resample_units, EvalConfig, EvalReport, EvalUnit, Evaluator, Metric, MetricSet,
    };
    pub use crate::preprocessing::{FittedRecipe, Recipe, Selector, Step};
    pub use crate::resampling::{initial_split, CVStrategy, CrossValidator, Split};
    pub use crate::training::{FittedModel, Kernel, ModelSpec, SvrConfig};
}
