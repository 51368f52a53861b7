//! Structured `outcome ~ predictors` specification

use super::Dataset;
use crate::error::{EvalError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which columns act as predictors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Predictors {
    /// Every column other than the outcome, in schema order
    All,
    /// An explicit ordered list
    Columns(Vec<String>),
}

/// Outcome column plus predictor columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    outcome: String,
    predictors: Predictors,
}

/// A formula bound to the column positions of a concrete dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFormula {
    pub outcome: usize,
    pub predictors: Vec<usize>,
    pub predictor_names: Vec<String>,
}

impl Formula {
    pub fn new<S, I, P>(outcome: S, predictors: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            outcome: outcome.into(),
            predictors: Predictors::Columns(predictors.into_iter().map(Into::into).collect()),
        }
    }

    /// `outcome ~ .`
    pub fn all_predictors(outcome: impl Into<String>) -> Self {
        Self {
            outcome: outcome.into(),
            predictors: Predictors::All,
        }
    }

    pub fn outcome(&self) -> &str {
        &self.outcome
    }

    pub fn predictors(&self) -> &Predictors {
        &self.predictors
    }

    /// Bind to a dataset's schema; any missing column is a schema error
    pub fn resolve(&self, data: &Dataset) -> Result<ResolvedFormula> {
        let outcome = data.column_index(&self.outcome)?;

        let predictors: Vec<usize> = match &self.predictors {
            Predictors::All => (0..data.n_cols()).filter(|&i| i != outcome).collect(),
            Predictors::Columns(names) => {
                let mut indices = Vec::with_capacity(names.len());
                for name in names {
                    if name == &self.outcome {
                        return Err(EvalError::Schema(format!(
                            "outcome '{}' cannot also be a predictor",
                            name
                        )));
                    }
                    indices.push(data.column_index(name)?);
                }
                indices
            }
        };

        let predictor_names = predictors
            .iter()
            .map(|&i| data.column_names()[i].clone())
            .collect();

        Ok(ResolvedFormula {
            outcome,
            predictors,
            predictor_names,
        })
    }

    /// Predictor matrix, outcome vector and the predictor names in column order
    pub fn design(&self, data: &Dataset) -> Result<(Array2<f64>, Array1<f64>, Vec<String>)> {
        let resolved = self.resolve(data)?;
        let x = data.values().select(Axis(1), &resolved.predictors);
        let y = data.values().column(resolved.outcome).to_owned();
        Ok((x, y, resolved.predictor_names))
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.predictors {
            Predictors::All => write!(f, "{} ~ .", self.outcome),
            Predictors::Columns(cols) => write!(f, "{} ~ {}", self.outcome, cols.join(" + ")),
        }
    }
}
