//! Dummy (indicator) encoding of nominal columns

use crate::data::{ColumnKind, Dataset};
use crate::error::{EvalError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Frozen levels for one nominal column.
///
/// The first (smallest) level is the reference and gets no indicator column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DummyEncoding {
    pub column: String,
    pub levels: Vec<f64>,
}

impl DummyEncoding {
    /// Names of the indicator columns, one per non-reference level
    pub fn indicator_names(&self) -> Vec<String> {
        self.levels
            .iter()
            .skip(1)
            .map(|&level| format!("{}_{}", self.column, format_level(level)))
            .collect()
    }
}

fn format_level(level: f64) -> String {
    if level.fract() == 0.0 && level.abs() < 1e15 {
        format!("{}", level as i64)
    } else {
        level.to_string()
    }
}

/// Encoder replacing each nominal column by its indicator columns in place
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DummyEncoder {
    encodings: Vec<DummyEncoding>,
}

impl DummyEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the training levels of each selected column
    pub fn fit(&mut self, data: &Dataset, columns: &[usize]) -> Result<&mut Self> {
        self.encodings.clear();

        for &idx in columns {
            let name = &data.column_names()[idx];
            if data.kinds()[idx] != ColumnKind::Nominal {
                return Err(EvalError::Validation(format!(
                    "dummy encoding requires a nominal column, '{}' is numeric",
                    name
                )));
            }

            let mut levels: Vec<f64> = data.values().column(idx).to_vec();
            levels.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            levels.dedup();

            self.encodings.push(DummyEncoding {
                column: name.clone(),
                levels,
            });
        }

        Ok(self)
    }

    pub fn encodings(&self) -> &[DummyEncoding] {
        &self.encodings
    }

    /// Replace encoded columns by indicators; levels unseen during fit encode as all zeros
    pub fn transform(&self, data: &Dataset) -> Result<Dataset> {
        for enc in &self.encodings {
            data.column_index(&enc.column)?;
        }

        let n_rows = data.n_rows();
        let mut names = Vec::new();
        let mut kinds = Vec::new();
        let mut sources: Vec<(usize, Option<f64>)> = Vec::new();

        for (idx, name) in data.column_names().iter().enumerate() {
            match self.encodings.iter().find(|e| &e.column == name) {
                Some(enc) => {
                    for (level, indicator) in enc.levels.iter().skip(1).zip(enc.indicator_names()) {
                        names.push(indicator);
                        kinds.push(ColumnKind::Numeric);
                        sources.push((idx, Some(*level)));
                    }
                }
                None => {
                    names.push(name.clone());
                    kinds.push(data.kinds()[idx]);
                    sources.push((idx, None));
                }
            }
        }

        let mut seen = HashSet::with_capacity(names.len());
        if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(EvalError::Schema(format!(
                "indicator column '{}' collides with an existing column",
                dup
            )));
        }

        let mut values = Array2::zeros((n_rows, names.len()));
        for (j, &(src, level)) in sources.iter().enumerate() {
            let col = data.values().column(src);
            match level {
                Some(level) => values
                    .column_mut(j)
                    .assign(&col.mapv(|v| if v == level { 1.0 } else { 0.0 })),
                None => values.column_mut(j).assign(&col),
            }
        }

        Ok(Dataset::from_parts(names, values, kinds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> Dataset {
        Dataset::from_columns(vec![
            ("rad", vec![1.0, 3.0, 2.0, 3.0]),
            ("medv", vec![10.0, 20.0, 30.0, 40.0]),
        ])
        .unwrap()
        .with_kind("rad", ColumnKind::Nominal)
        .unwrap()
    }

    #[test]
    fn test_dummy_encoding() {
        let ds = data();
        let mut encoder = DummyEncoder::new();
        let out = encoder.fit(&ds, &[0]).unwrap().transform(&ds).unwrap();

        assert_eq!(out.column_names(), &["rad_2", "rad_3", "medv"]);
        assert_eq!(out.column("rad_2").unwrap().to_vec(), vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(out.column("rad_3").unwrap().to_vec(), vec![0.0, 1.0, 0.0, 1.0]);
        assert_eq!(out.kind("rad_3").unwrap(), ColumnKind::Numeric);
    }

    #[test]
    fn test_unseen_level_is_all_zero() {
        let ds = data();
        let mut encoder = DummyEncoder::new();
        encoder.fit(&ds, &[0]).unwrap();

        let new = Dataset::from_columns(vec![("rad", vec![7.0]), ("medv", vec![1.0])])
            .unwrap()
            .with_kind("rad", ColumnKind::Nominal)
            .unwrap();
        let out = encoder.transform(&new).unwrap();
        assert_eq!(out.column("rad_2").unwrap()[0], 0.0);
        assert_eq!(out.column("rad_3").unwrap()[0], 0.0);
    }

    #[test]
    fn test_numeric_column_rejected() {
        let ds = data();
        let mut encoder = DummyEncoder::new();
        assert!(encoder.fit(&ds, &[1]).is_err());
    }

    #[test]
    fn test_indicator_name_collision() {
        let ds = Dataset::from_columns(vec![
            ("chas", vec![0.0, 1.0, 0.0]),
            ("chas_1", vec![5.0, 6.0, 7.0]),
            ("y", vec![1.0, 2.0, 3.0]),
        ])
        .unwrap()
        .with_kind("chas", ColumnKind::Nominal)
        .unwrap();

        let mut encoder = DummyEncoder::new();
        let err = encoder.fit(&ds, &[0]).unwrap().transform(&ds).unwrap_err();
        assert!(matches!(err, EvalError::Schema(_)));
        assert!(err.to_string().contains("'chas_1'"));
    }

    #[test]
    fn test_format_level() {
        assert_eq!(format_level(1.0), "1");
        assert_eq!(format_level(-2.0), "-2");
        assert_eq!(format_level(0.5), "0.5");
    }
}
