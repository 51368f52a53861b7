//! Model specifications and fitted models
//!
//! A [`ModelSpec`] is an unfit algorithm plus hyperparameters. Fitting it on a
//! dataset through a [`Formula`] yields an immutable [`FittedModel`] that
//! remembers the predictor names it was trained on.
//!
//! - Linear regression (OLS with intercept)
//! - Epsilon-support vector regression (RBF, linear or polynomial kernel)

pub mod linear_models;
pub mod svm;

pub use linear_models::LinearRegression;
pub use svm::{Kernel, SvmRegressor, SvrConfig};

use crate::data::{ColumnKind, Dataset, Formula};
use crate::error::{EvalError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unfit model: algorithm identifier plus hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "model")]
pub enum ModelSpec {
    LinearRegression,
    Svr(SvrConfig),
}

impl ModelSpec {
    pub fn linear_reg() -> Self {
        ModelSpec::LinearRegression
    }

    /// RBF-kernel SVR with the given cost and kernel width
    pub fn svm_rbf(cost: f64, sigma: f64) -> Self {
        ModelSpec::Svr(
            SvrConfig::default()
                .with_cost(cost)
                .with_kernel(Kernel::Rbf { sigma }),
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelSpec::LinearRegression => "linear_reg",
            ModelSpec::Svr(_) => "svr",
        }
    }

    /// Fit on `data` using `formula`; nominal predictors must already be dummy-encoded
    pub fn fit(&self, data: &Dataset, formula: &Formula) -> Result<FittedModel> {
        let (x, y, predictors) = formula.design(data)?;

        if let Some(name) = predictors
            .iter()
            .find(|p| data.kind(p).map_or(false, |k| k == ColumnKind::Nominal))
        {
            return Err(EvalError::Fit(format!(
                "nominal predictor '{}' must be dummy-encoded before fitting",
                name
            )));
        }

        let model = match self {
            ModelSpec::LinearRegression => {
                let mut lm = LinearRegression::new();
                lm.fit(&x, &y)?;
                TrainedModel::Linear(lm)
            }
            ModelSpec::Svr(config) => {
                let mut svr = SvmRegressor::new(config.clone());
                svr.fit(&x, &y)?;
                TrainedModel::Svr(svr)
            }
        };

        Ok(FittedModel {
            outcome: formula.outcome().to_string(),
            predictors,
            n_train: data.n_rows(),
            model,
        })
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSpec::LinearRegression => write!(f, "linear_reg()"),
            ModelSpec::Svr(c) => write!(f, "svr(cost = {}, epsilon = {}, kernel = {:?})", c.cost, c.epsilon, c.kernel),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TrainedModel {
    Linear(LinearRegression),
    Svr(SvmRegressor),
}

/// Immutable model artifact bound to the predictor names it was trained on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedModel {
    outcome: String,
    predictors: Vec<String>,
    n_train: usize,
    model: TrainedModel,
}

impl FittedModel {
    /// Predict for every row of `data`; each training predictor must be present
    pub fn predict(&self, data: &Dataset) -> Result<Array1<f64>> {
        let mut x = Array2::zeros((data.n_rows(), self.predictors.len()));
        for (j, name) in self.predictors.iter().enumerate() {
            let col = data.column(name).map_err(|_| {
                EvalError::Predict(format!(
                    "predictor '{}' used in training is missing from new data",
                    name
                ))
            })?;
            x.column_mut(j).assign(&col);
        }

        match &self.model {
            TrainedModel::Linear(lm) => lm.predict(&x),
            TrainedModel::Svr(svr) => svr.predict(&x),
        }
    }

    pub fn outcome(&self) -> &str {
        &self.outcome
    }

    pub fn predictors(&self) -> &[String] {
        &self.predictors
    }

    /// Number of training rows
    pub fn n_train(&self) -> usize {
        self.n_train
    }

    /// `(intercept, slopes)` for linear models
    pub fn coefficients(&self) -> Option<(f64, &Array1<f64>)> {
        match &self.model {
            TrainedModel::Linear(lm) => Some((lm.intercept?, lm.coefficients.as_ref()?)),
            TrainedModel::Svr(_) => None,
        }
    }

    pub fn n_support_vectors(&self) -> Option<usize> {
        match &self.model {
            TrainedModel::Svr(svr) => Some(svr.n_support_vectors()),
            TrainedModel::Linear(_) => None,
        }
    }

    /// Solver iterations for SVR fits
    pub fn n_iter(&self) -> Option<usize> {
        match &self.model {
            TrainedModel::Svr(svr) => Some(svr.n_iter()),
            TrainedModel::Linear(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> Dataset {
        Dataset::from_columns(vec![
            ("x", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            ("y", vec![2.0, 4.1, 5.9, 8.0, 10.1, 11.9]),
        ])
        .unwrap()
    }

    #[test]
    fn test_linear_spec() {
        let fitted = ModelSpec::linear_reg()
            .fit(&data(), &Formula::all_predictors("y"))
            .unwrap();
        assert_eq!(fitted.predictors(), &["x"]);
        assert_eq!(fitted.n_train(), 6);

        let (intercept, slopes) = fitted.coefficients().unwrap();
        assert!((slopes[0] - 2.0).abs() < 0.1);
        assert!(intercept.abs() < 0.3);
        assert!(fitted.n_support_vectors().is_none());
        assert!(fitted.n_iter().is_none());
    }

    #[test]
    fn test_svr_spec() {
        let fitted = ModelSpec::svm_rbf(1.0, 0.5)
            .fit(&data(), &Formula::new("y", ["x"]))
            .unwrap();
        assert!(fitted.coefficients().is_none());
        assert!(fitted.n_support_vectors().unwrap() > 0);
        assert!(fitted.n_iter().unwrap() > 0);
        assert_eq!(fitted.predict(&data()).unwrap().len(), 6);
    }

    #[test]
    fn test_missing_predictor_is_predict_error() {
        let fitted = ModelSpec::linear_reg()
            .fit(&data(), &Formula::all_predictors("y"))
            .unwrap();
        let other = Dataset::from_columns(vec![("z", vec![1.0])]).unwrap();
        assert!(matches!(fitted.predict(&other), Err(EvalError::Predict(_))));
    }

    #[test]
    fn test_formula_column_missing_is_schema_error() {
        let err = ModelSpec::linear_reg()
            .fit(&data(), &Formula::new("y", ["rm"]))
            .unwrap_err();
        assert!(matches!(err, EvalError::Schema(_)));
    }

    #[test]
    fn test_nominal_predictor_rejected() {
        let ds = data().with_kind("x", ColumnKind::Nominal).unwrap();
        let err = ModelSpec::linear_reg()
            .fit(&ds, &Formula::all_predictors("y"))
            .unwrap_err();
        assert!(matches!(err, EvalError::Fit(_)));
    }

    #[test]
    fn test_spec_serde() {
        let spec = ModelSpec::svm_rbf(2.0, 0.1);
        let json = serde_json::to_string(&spec).unwrap();
        let back: ModelSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, back);
    }
}
