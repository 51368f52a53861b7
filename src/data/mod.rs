//! Tabular dataset and model formula
//!
//! A [`Dataset`] is a dense, read-only table of `f64` values with named columns.
//! Each column carries a [`ColumnKind`]; nominal columns store their level codes
//! as numbers and are expanded by the dummy-encoding recipe step.

mod formula;
pub mod loader;

pub use formula::{Formula, Predictors, ResolvedFormula};
pub use loader::DataLoader;

use crate::error::{EvalError, Result};
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a column is interpreted by preprocessing steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    /// Categorical column whose levels are stored as numeric codes
    Nominal,
}

/// Immutable table of numeric observations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    names: Vec<String>,
    kinds: Vec<ColumnKind>,
    values: Array2<f64>,
}

impl Dataset {
    /// Create a dataset from a rows × columns matrix
    pub fn new(names: Vec<String>, values: Array2<f64>, kinds: Vec<ColumnKind>) -> Result<Self> {
        if names.len() != values.ncols() {
            return Err(EvalError::Shape {
                expected: format!("{} columns", names.len()),
                actual: format!("{} columns", values.ncols()),
            });
        }
        if kinds.len() != names.len() {
            return Err(EvalError::Shape {
                expected: format!("{} column kinds", names.len()),
                actual: format!("{} column kinds", kinds.len()),
            });
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(EvalError::Schema(format!("duplicate column '{}'", name)));
            }
        }

        if let Some(((row, col), v)) = values.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(EvalError::Data(format!(
                "non-finite value {} in column '{}' at row {}",
                v, names[col], row
            )));
        }

        Ok(Self { names, kinds, values })
    }

    /// Create an all-numeric dataset from named column vectors
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<f64>)>) -> Result<Self> {
        let n_cols = columns.len();
        let n_rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);

        let mut names = Vec::with_capacity(n_cols);
        let mut values = Array2::zeros((n_rows, n_cols));

        for (j, (name, data)) in columns.into_iter().enumerate() {
            let name = name.into();
            if data.len() != n_rows {
                return Err(EvalError::Shape {
                    expected: format!("{} rows", n_rows),
                    actual: format!("{} rows in column '{}'", data.len(), name),
                });
            }
            for (i, v) in data.into_iter().enumerate() {
                values[[i, j]] = v;
            }
            names.push(name);
        }

        Self::new(names, values, vec![ColumnKind::Numeric; n_cols])
    }

    /// Build without validation; callers guarantee the invariants
    pub(crate) fn from_parts(names: Vec<String>, values: Array2<f64>, kinds: Vec<ColumnKind>) -> Self {
        debug_assert_eq!(names.len(), values.ncols());
        debug_assert_eq!(kinds.len(), values.ncols());
        Self { names, kinds, values }
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn kinds(&self) -> &[ColumnKind] {
        &self.kinds
    }

    /// Raw value matrix (rows × columns)
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Position of a column, or a schema error naming it
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| EvalError::missing_column(name))
    }

    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        let idx = self.column_index(name)?;
        Ok(self.values.column(idx))
    }

    pub fn kind(&self, name: &str) -> Result<ColumnKind> {
        let idx = self.column_index(name)?;
        Ok(self.kinds[idx])
    }

    /// Return a copy with the kind of `name` replaced
    pub fn with_kind(mut self, name: &str, kind: ColumnKind) -> Result<Self> {
        let idx = self.column_index(name)?;
        self.kinds[idx] = kind;
        Ok(self)
    }

    /// Subset rows by index, in the order given
    pub fn take_rows(&self, rows: &[usize]) -> Result<Self> {
        let n = self.n_rows();
        if let Some(&bad) = rows.iter().find(|&&r| r >= n) {
            return Err(EvalError::Validation(format!(
                "row index {} out of bounds for dataset with {} rows",
                bad, n
            )));
        }

        Ok(Self {
            names: self.names.clone(),
            kinds: self.kinds.clone(),
            values: self.values.select(Axis(0), rows),
        })
    }

    /// Keep only the named columns, in the order given
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<Self> {
        let indices = columns
            .iter()
            .map(|c| self.column_index(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_parts(
            indices.iter().map(|&i| self.names[i].clone()).collect(),
            self.values.select(Axis(1), &indices),
            indices.iter().map(|&i| self.kinds[i]).collect(),
        ))
    }

    /// Remove the named columns; names that are absent are ignored
    pub fn drop_columns<S: AsRef<str>>(&self, columns: &[S]) -> Self {
        let drop: HashSet<&str> = columns.iter().map(|c| c.as_ref()).collect();
        let keep: Vec<usize> = (0..self.n_cols())
            .filter(|&i| !drop.contains(self.names[i].as_str()))
            .collect();

        Self::from_parts(
            keep.iter().map(|&i| self.names[i].clone()).collect(),
            self.values.select(Axis(1), &keep),
            keep.iter().map(|&i| self.kinds[i]).collect(),
        )
    }
}
