//! Train / predict / score over evaluation units

use super::config::EvalConfig;
use super::report::{EvalReport, MetricRow, UnitFailure, UnitPredictions, UnitResult};
use crate::data::{Dataset, Formula};
use crate::error::Result;
use crate::preprocessing::{FittedRecipe, Recipe};
use crate::resampling::Split;
use crate::training::{FittedModel, ModelSpec};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One (split, recipe, model, label) combination.
///
/// Borrows everything it refers to; units built from the same splits and
/// recipes share them read-only.
#[derive(Debug, Clone)]
pub struct EvalUnit<'a> {
    pub fold_id: String,
    pub split: &'a Split,
    pub recipe: &'a Recipe,
    pub model: &'a ModelSpec,
    pub label: String,
    /// Model formula; defaults to the fitted recipe's outcome and output predictors
    pub formula: Option<&'a Formula>,
}

impl<'a> EvalUnit<'a> {
    /// Unit whose fold id is the split id
    pub fn new(split: &'a Split, recipe: &'a Recipe, model: &'a ModelSpec, label: impl Into<String>) -> Self {
        Self {
            fold_id: split.id().to_string(),
            split,
            recipe,
            model,
            label: label.into(),
            formula: None,
        }
    }

    pub fn with_fold_id(mut self, fold_id: impl Into<String>) -> Self {
        self.fold_id = fold_id.into();
        self
    }

    pub fn with_formula(mut self, formula: &'a Formula) -> Self {
        self.formula = Some(formula);
        self
    }
}

/// One unit per split, all sharing a recipe, model and label
pub fn resample_units<'a>(
    splits: &'a [Split],
    recipe: &'a Recipe,
    model: &'a ModelSpec,
    label: &str,
) -> Vec<EvalUnit<'a>> {
    splits
        .iter()
        .map(|split| EvalUnit::new(split, recipe, model, label))
        .collect()
}

/// Everything produced by a final fit on a holdout split
#[derive(Debug, Clone)]
pub struct LastFit {
    pub metrics: Vec<MetricRow>,
    pub predictions: UnitPredictions,
    pub recipe: FittedRecipe,
    pub model: FittedModel,
}

struct FittedUnit {
    metrics: Vec<MetricRow>,
    predictions: UnitPredictions,
    recipe: FittedRecipe,
    model: FittedModel,
}

/// Runs units through fit → predict → score
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvalConfig,
}

impl Evaluator {
    /// Fails when `config` does not validate (e.g. an empty metric set)
    pub fn new(config: EvalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Evaluate a single unit; errors are returned, not recorded
    pub fn evaluate_unit(&self, data: &Dataset, unit: &EvalUnit<'_>) -> Result<UnitResult> {
        let fitted = self.fit_unit(data, unit)?;
        Ok(UnitResult {
            fold_id: unit.fold_id.clone(),
            label: unit.label.clone(),
            metrics: fitted.metrics,
            predictions: self.config.save_predictions.then_some(fitted.predictions),
        })
    }

    /// Evaluate every unit and concatenate the results in unit order.
    ///
    /// A failing unit becomes a [`UnitFailure`]; the remaining units still run.
    pub fn run(&self, data: &Dataset, units: &[EvalUnit<'_>]) -> EvalReport {
        let start = Instant::now();
        info!(
            n_units = units.len(),
            n_rows = data.n_rows(),
            parallel = self.config.parallel,
            "starting evaluation"
        );

        let results = self.map_units(data, units);

        let mut report = EvalReport::default();
        for (unit, result) in units.iter().zip(results) {
            match result {
                Ok(r) => report.push(r),
                Err(e) => {
                    warn!(fold_id = %unit.fold_id, label = %unit.label, kind = %e.kind(), error = %e, "evaluation unit failed");
                    report.push_failure(UnitFailure {
                        fold_id: unit.fold_id.clone(),
                        label: unit.label.clone(),
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            n_metrics = report.metrics.len(),
            n_failures = report.failures.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "evaluation finished"
        );
        report
    }

    /// Fit on the training rows of `split` and score its test rows
    pub fn last_fit(
        &self,
        data: &Dataset,
        split: &Split,
        recipe: &Recipe,
        model: &ModelSpec,
        label: &str,
    ) -> Result<LastFit> {
        let unit = EvalUnit::new(split, recipe, model, label);
        let fitted = self.fit_unit(data, &unit)?;
        info!(label = %label, fold_id = %split.id(), "final fit complete");
        Ok(LastFit {
            metrics: fitted.metrics,
            predictions: fitted.predictions,
            recipe: fitted.recipe,
            model: fitted.model,
        })
    }

    fn map_units(&self, data: &Dataset, units: &[EvalUnit<'_>]) -> Vec<Result<UnitResult>> {
        if !self.config.parallel {
            return units.iter().map(|u| self.evaluate_unit(data, u)).collect();
        }

        // Indexed collect keeps unit order
        let par_map = || -> Vec<Result<UnitResult>> {
            units.par_iter().map(|u| self.evaluate_unit(data, u)).collect()
        };

        match self.config.n_jobs {
            Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => pool.install(par_map),
                Err(e) => {
                    warn!(error = %e, "could not build thread pool, using the global pool");
                    par_map()
                }
            },
            None => par_map(),
        }
    }

    fn fit_unit(&self, data: &Dataset, unit: &EvalUnit<'_>) -> Result<FittedUnit> {
        let split = unit.split;
        let train = split.training(data)?;
        let test = split.testing(data)?;

        let recipe = unit.recipe.fit(&train)?;
        let train_baked = recipe.apply(&train)?;
        let test_baked = recipe.apply(&test)?;

        let formula = match unit.formula {
            Some(f) => f.clone(),
            None => recipe.formula(),
        };
        let model = unit.model.fit(&train_baked, &formula)?;

        let estimate = model.predict(&test_baked)?;
        let truth = test_baked.column(formula.outcome())?;

        let metrics = self
            .config
            .metrics
            .compute(truth, estimate.view())?
            .into_iter()
            .map(|(metric, value)| MetricRow {
                fold_id: unit.fold_id.clone(),
                label: unit.label.clone(),
                metric,
                estimate: value,
            })
            .collect();

        debug!(
            fold_id = %unit.fold_id,
            label = %unit.label,
            model = unit.model.name(),
            n_iter = ?model.n_iter(),
            n_train = train.n_rows(),
            n_test = test.n_rows(),
            "evaluated unit"
        );

        let predictions = UnitPredictions {
            fold_id: unit.fold_id.clone(),
            label: unit.label.clone(),
            rows: split.test().to_vec(),
            truth: truth.to_vec(),
            estimate: estimate.to_vec(),
        };

        Ok(FittedUnit {
            metrics,
            predictions,
            recipe,
            model,
        })
    }
}
