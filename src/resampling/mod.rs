//! Data splitting
//!
//! Provides holdout splits (optionally stratified on the outcome) and k-fold
//! cross-validation. Every split is a pair of disjoint row-index sets into the
//! original dataset; nothing here copies data until [`Split::training`] or
//! [`Split::testing`] is called.

pub mod cross_validation;
mod holdout;

pub use cross_validation::{CVStrategy, CrossValidator};
pub use holdout::{initial_split, initial_split_stratified};

use crate::data::Dataset;
use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};

/// A train/test partition of row indices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    id: String,
    train: Vec<usize>,
    test: Vec<usize>,
}

impl Split {
    /// Build a split from fixed row indices
    pub fn from_indices(id: impl Into<String>, train: Vec<usize>, test: Vec<usize>) -> Self {
        Self {
            id: id.into(),
            train,
            test,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn train(&self) -> &[usize] {
        &self.train
    }

    pub fn test(&self) -> &[usize] {
        &self.test
    }

    /// Check that train and test are in bounds, free of duplicates,
    /// disjoint, and together cover `0..n_rows`
    pub fn validate(&self, n_rows: usize) -> Result<()> {
        let mut seen = vec![false; n_rows];

        for &idx in self.train.iter().chain(self.test.iter()) {
            if idx >= n_rows {
                return Err(EvalError::Validation(format!(
                    "split '{}': row index {} out of bounds for {} rows",
                    self.id, idx, n_rows
                )));
            }
            if seen[idx] {
                return Err(EvalError::Validation(format!(
                    "split '{}': row {} assigned more than once",
                    self.id, idx
                )));
            }
            seen[idx] = true;
        }

        if let Some(missing) = seen.iter().position(|&s| !s) {
            return Err(EvalError::Validation(format!(
                "split '{}': row {} is in neither partition",
                self.id, missing
            )));
        }

        Ok(())
    }

    /// Training rows of `data`
    pub fn training(&self, data: &Dataset) -> Result<Dataset> {
        data.take_rows(&self.train)
    }

    /// Testing rows of `data`
    pub fn testing(&self, data: &Dataset) -> Result<Dataset> {
        data.take_rows(&self.test)
    }
}

/// `prefix` followed by `i` zero-padded to the width of `n`
pub(crate) fn padded_id(prefix: &str, i: usize, n: usize) -> String {
    let width = n.to_string().len();
    format!("{}{:0width$}", prefix, i, width = width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ok() {
        let split = Split::from_indices("s", vec![0, 2], vec![1, 3]);
        assert!(split.validate(4).is_ok());
    }

    #[test]
    fn test_validate_overlap() {
        let split = Split::from_indices("s", vec![0, 1], vec![1, 2]);
        assert!(split.validate(3).is_err());
    }

    #[test]
    fn test_validate_not_covering() {
        let split = Split::from_indices("s", vec![0], vec![1]);
        assert!(split.validate(3).is_err());
    }

    #[test]
    fn test_padded_id() {
        assert_eq!(padded_id("Fold", 3, 5), "Fold3");
        assert_eq!(padded_id("Fold", 3, 10), "Fold03");
    }

    #[test]
    fn test_training_testing() {
        let data = Dataset::from_columns(vec![("a", vec![10.0, 11.0, 12.0])]).unwrap();
        let split = Split::from_indices("s", vec![2, 0], vec![1]);
        assert_eq!(split.training(&data).unwrap().column("a").unwrap().to_vec(), vec![12.0, 10.0]);
        assert_eq!(split.testing(&data).unwrap().n_rows(), 1);
    }
}
