//! Data preprocessing recipes
//!
//! A [`Recipe`] is an ordered list of declarative [`Step`]s plus an outcome
//! column. Nothing is computed until [`Recipe::fit`] is called on a training
//! table; the resulting [`FittedRecipe`] holds every statistic it needs
//! (min/max, mean/std, kept columns, dummy levels) and replays them unchanged on
//! any other table with the same schema.
//!
//! Available steps:
//! - Mark columns as nominal
//! - Range scaling to `[min, max]` and standardization
//! - Correlation filter and zero-variance filter
//! - Dummy (indicator) encoding of nominal columns

mod encoder;
pub mod feature_selection;
mod recipe;
mod scaler;

pub use encoder::{DummyEncoder, DummyEncoding};
pub use feature_selection::{CorrelationFilter, ZeroVarianceFilter};
pub use recipe::{FittedRecipe, Recipe};
pub use scaler::{Scaler, ScalerType};

use crate::data::{ColumnKind, Dataset};
use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};

/// Column selection for a step, evaluated against the table the step is fit on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Selector {
    /// Every column except the outcome
    AllPredictors,
    /// Numeric columns except the outcome
    AllNumericPredictors,
    /// Nominal columns except the outcome
    AllNominalPredictors,
    /// Explicit column names; each must exist
    Columns(Vec<String>),
}

impl Selector {
    pub fn columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selector::Columns(names.into_iter().map(Into::into).collect())
    }

    /// Column indices selected in `data`, in schema order for the
    /// predicate selectors and in the given order for `Columns`
    pub(crate) fn resolve(&self, data: &Dataset, outcome: &str) -> Result<Vec<usize>> {
        let predicate = |kind: Option<ColumnKind>| -> Vec<usize> {
            data.column_names()
                .iter()
                .zip(data.kinds())
                .enumerate()
                .filter(|(_, (name, k))| name.as_str() != outcome && kind.map_or(true, |want| **k == want))
                .map(|(i, _)| i)
                .collect()
        };

        match self {
            Selector::AllPredictors => Ok(predicate(None)),
            Selector::AllNumericPredictors => Ok(predicate(Some(ColumnKind::Numeric))),
            Selector::AllNominalPredictors => Ok(predicate(Some(ColumnKind::Nominal))),
            Selector::Columns(names) => names.iter().map(|n| data.column_index(n)).collect(),
        }
    }
}

/// A declarative preprocessing step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// Treat the named columns as nominal
    AsNominal { columns: Vec<String> },
    /// Rescale numeric columns linearly to `[min, max]`
    RangeScale { selector: Selector, min: f64, max: f64 },
    /// Center to mean 0 and scale to standard deviation 1
    Standardize { selector: Selector },
    /// Drop predictors whose absolute correlation with another predictor exceeds `threshold`
    CorrelationFilter { selector: Selector, threshold: f64 },
    /// Drop predictors with a single distinct value
    ZeroVariance { selector: Selector },
    /// Expand nominal columns into 0/1 indicator columns
    Dummy { selector: Selector },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::AsNominal { .. } => "as_nominal",
            Step::RangeScale { .. } => "range",
            Step::Standardize { .. } => "normalize",
            Step::CorrelationFilter { .. } => "corr",
            Step::ZeroVariance { .. } => "zv",
            Step::Dummy { .. } => "dummy",
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Step::RangeScale { min, max, .. } if !(min < max) => Err(EvalError::InvalidParameter {
                name: "range".to_string(),
                value: format!("[{}, {}]", min, max),
                reason: "min must be below max".to_string(),
            }),
            Step::CorrelationFilter { threshold, .. } if !(*threshold >= 0.0 && *threshold <= 1.0) => {
                Err(EvalError::InvalidParameter {
                    name: "threshold".to_string(),
                    value: threshold.to_string(),
                    reason: "must lie in [0, 1]".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}
