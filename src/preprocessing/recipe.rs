//! Recipe builder and fitted recipe

use super::encoder::DummyEncoder;
use super::feature_selection::{CorrelationFilter, ZeroVarianceFilter};
use super::scaler::{Scaler, ScalerType};
use super::{Selector, Step};
use crate::data::{ColumnKind, Dataset, Formula, Predictors};
use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Ordered, unfitted preprocessing plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    formula: Formula,
    steps: Vec<Step>,
}

impl Recipe {
    /// Recipe using every non-outcome column as a predictor
    pub fn new(outcome: impl Into<String>) -> Self {
        Self {
            formula: Formula::all_predictors(outcome),
            steps: Vec::new(),
        }
    }

    /// Recipe whose roles come from a formula; unlisted columns are dropped on input
    pub fn from_formula(formula: &Formula) -> Self {
        Self {
            formula: formula.clone(),
            steps: Vec::new(),
        }
    }

    /// Replace the roles with those of `formula`
    pub fn with_formula(mut self, formula: Formula) -> Self {
        self.formula = formula;
        self
    }

    pub fn outcome(&self) -> &str {
        self.formula.outcome()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn as_nominal<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.step(Step::AsNominal {
            columns: columns.into_iter().map(Into::into).collect(),
        })
    }

    /// Rescale to `[0, 1]`
    pub fn range_scale(self, selector: Selector) -> Self {
        self.range_scale_to(selector, 0.0, 1.0)
    }

    pub fn range_scale_to(self, selector: Selector, min: f64, max: f64) -> Self {
        self.step(Step::RangeScale { selector, min, max })
    }

    pub fn standardize(self, selector: Selector) -> Self {
        self.step(Step::Standardize { selector })
    }

    pub fn correlation_filter(self, selector: Selector, threshold: f64) -> Self {
        self.step(Step::CorrelationFilter { selector, threshold })
    }

    pub fn zero_variance(self, selector: Selector) -> Self {
        self.step(Step::ZeroVariance { selector })
    }

    pub fn dummy(self, selector: Selector) -> Self {
        self.step(Step::Dummy { selector })
    }

    /// Fit every step, in order, on `train` only
    pub fn fit(&self, train: &Dataset) -> Result<FittedRecipe> {
        let outcome = self.formula.outcome();
        let resolved = self.formula.resolve(train)?;
        let input_columns = match self.formula.predictors() {
            Predictors::All => train.column_names().to_vec(),
            Predictors::Columns(_) => {
                let mut cols = vec![outcome.to_string()];
                cols.extend(resolved.predictor_names);
                cols
            }
        };

        let mut current = train.select(&input_columns)?;
        let mut fitted_steps = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            step.validate()?;
            let fitted = FittedStep::fit(step, &current, outcome)?;
            current = fitted.apply(&current)?;
            debug!(step = step.name(), n_cols = current.n_cols(), "fitted recipe step");
            fitted_steps.push(fitted);
        }

        if !current.has_column(outcome) {
            return Err(EvalError::Schema(format!(
                "recipe removed the outcome column '{}'",
                outcome
            )));
        }

        let output_columns = current.column_names().to_vec();
        let dropped = input_columns
            .iter()
            .filter(|c| !output_columns.contains(*c))
            .cloned()
            .collect();

        Ok(FittedRecipe {
            outcome: outcome.to_string(),
            input_columns,
            output_columns,
            dropped,
            steps: fitted_steps,
        })
    }
}

/// A step with its training statistics frozen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum FittedStep {
    AsNominal(Vec<String>),
    Scale(Scaler),
    CorrelationFilter(CorrelationFilter),
    ZeroVariance(ZeroVarianceFilter),
    Dummy(DummyEncoder),
}

impl FittedStep {
    fn fit(step: &Step, data: &Dataset, outcome: &str) -> Result<Self> {
        let fitted = match step {
            Step::AsNominal { columns } => {
                for c in columns {
                    data.column_index(c)?;
                }
                FittedStep::AsNominal(columns.clone())
            }
            Step::RangeScale { selector, min, max } => {
                let cols = selector.resolve(data, outcome)?;
                let mut scaler = Scaler::new(ScalerType::MinMax { min: *min, max: *max });
                scaler.fit(data, &cols)?;
                FittedStep::Scale(scaler)
            }
            Step::Standardize { selector } => {
                let cols = selector.resolve(data, outcome)?;
                let mut scaler = Scaler::new(ScalerType::Standard);
                scaler.fit(data, &cols)?;
                FittedStep::Scale(scaler)
            }
            Step::CorrelationFilter { selector, threshold } => {
                let cols = selector.resolve(data, outcome)?;
                let mut filter = CorrelationFilter::new(*threshold);
                filter.fit(data, &cols)?;
                FittedStep::CorrelationFilter(filter)
            }
            Step::ZeroVariance { selector } => {
                let cols = selector.resolve(data, outcome)?;
                let mut filter = ZeroVarianceFilter::new();
                filter.fit(data, &cols)?;
                FittedStep::ZeroVariance(filter)
            }
            Step::Dummy { selector } => {
                let cols = selector.resolve(data, outcome)?;
                let mut encoder = DummyEncoder::new();
                encoder.fit(data, &cols)?;
                FittedStep::Dummy(encoder)
            }
        };
        Ok(fitted)
    }

    fn apply(&self, data: &Dataset) -> Result<Dataset> {
        match self {
            FittedStep::AsNominal(columns) => {
                let mut out = data.clone();
                for c in columns {
                    out = out.with_kind(c, ColumnKind::Nominal)?;
                }
                Ok(out)
            }
            FittedStep::Scale(scaler) => scaler.transform(data),
            FittedStep::CorrelationFilter(filter) => filter.transform(data),
            FittedStep::ZeroVariance(filter) => filter.transform(data),
            FittedStep::Dummy(encoder) => encoder.transform(data),
        }
    }
}

/// Immutable result of [`Recipe::fit`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedRecipe {
    outcome: String,
    input_columns: Vec<String>,
    output_columns: Vec<String>,
    dropped: Vec<String>,
    steps: Vec<FittedStep>,
}

impl FittedRecipe {
    /// Replay the frozen steps on `data`; every input column must be present
    pub fn apply(&self, data: &Dataset) -> Result<Dataset> {
        let mut current = data.select(&self.input_columns)?;
        for step in &self.steps {
            current = step.apply(&current)?;
        }
        Ok(current)
    }

    pub fn outcome(&self) -> &str {
        &self.outcome
    }

    pub fn input_columns(&self) -> &[String] {
        &self.input_columns
    }

    pub fn output_columns(&self) -> &[String] {
        &self.output_columns
    }

    /// Input columns no longer present in the output
    pub fn dropped_columns(&self) -> &[String] {
        &self.dropped
    }

    /// `outcome ~ <every output predictor>`
    pub fn formula(&self) -> Formula {
        Formula::new(
            self.outcome.clone(),
            self.output_columns.iter().filter(|c| **c != self.outcome).cloned(),
        )
    }

    /// Frozen `(center, scale)` of a scaled column, from the last scaling step touching it
    pub fn scaling_params(&self, column: &str) -> Option<(f64, f64)> {
        self.steps.iter().rev().find_map(|s| match s {
            FittedStep::Scale(scaler) => scaler.params_for(column),
            _ => None,
        })
    }
}
