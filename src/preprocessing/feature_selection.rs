//! Unsupervised filters that drop predictor columns
//!
//! - Correlation filter: removes one column out of each highly correlated pair
//! - Zero-variance filter: removes columns with a single distinct value

use crate::data::{ColumnKind, Dataset};
use crate::error::{EvalError, Result};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Pearson correlation; 0 when either side is constant
pub fn pearson_correlation(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let n = x.len() as f64;
    if n < 2.0 {
        return 0.0;
    }

    let x_mean = x.mean().unwrap_or(0.0);
    let y_mean = y.mean().unwrap_or(0.0);

    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;
    let mut sum_y2 = 0.0;

    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sum_xy += dx * dy;
        sum_x2 += dx * dx;
        sum_y2 += dy * dy;
    }

    let denom = (sum_x2 * sum_y2).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        sum_xy / denom
    }
}

/// Remove highly correlated features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationFilter {
    threshold: f64,
    removed: Option<Vec<String>>,
    removed_pairs: Vec<(String, String, f64)>,
}

impl CorrelationFilter {
    /// Create a new correlation filter
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.abs(),
            removed: None,
            removed_pairs: Vec::new(),
        }
    }

    /// Decide which of the candidate columns to remove.
    ///
    /// Pairs are scanned in column order; when `|r|` exceeds the threshold and
    /// both columns are still kept, the one with the larger mean absolute
    /// correlation to the other kept candidates is dropped (ties drop the later).
    pub fn fit(&mut self, data: &Dataset, columns: &[usize]) -> Result<&mut Self> {
        for &idx in columns {
            if data.kinds()[idx] != ColumnKind::Numeric {
                return Err(EvalError::Validation(format!(
                    "correlation filter requires numeric columns, '{}' is nominal",
                    data.column_names()[idx]
                )));
            }
        }

        let corr = Self::correlation_matrix(data, columns);
        let n = columns.len();
        let mut to_remove: HashSet<usize> = HashSet::new();
        let mut removed_pairs = Vec::new();

        for i in 0..n {
            if to_remove.contains(&i) {
                continue;
            }

            for j in (i + 1)..n {
                if to_remove.contains(&j) {
                    continue;
                }

                if corr[[i, j]].abs() > self.threshold {
                    let mean_corr_i = Self::mean_correlation(&corr, i, &to_remove);
                    let mean_corr_j = Self::mean_correlation(&corr, j, &to_remove);

                    let remove = if mean_corr_i > mean_corr_j { i } else { j };
                    to_remove.insert(remove);
                    removed_pairs.push((
                        data.column_names()[columns[i]].clone(),
                        data.column_names()[columns[j]].clone(),
                        corr[[i, j]],
                    ));

                    if remove == i {
                        break;
                    }
                }
            }
        }

        let mut removed: Vec<usize> = to_remove.into_iter().collect();
        removed.sort_unstable();

        self.removed = Some(
            removed
                .into_iter()
                .map(|k| data.column_names()[columns[k]].clone())
                .collect(),
        );
        self.removed_pairs = removed_pairs;
        Ok(self)
    }

    /// Drop the columns chosen during fit
    pub fn transform(&self, data: &Dataset) -> Result<Dataset> {
        let removed = self.removed.as_ref().ok_or_else(|| {
            EvalError::Validation("Filter not fitted".to_string())
        })?;
        drop_present(data, removed)
    }

    /// Names of removed columns
    pub fn removed(&self) -> Option<&[String]> {
        self.removed.as_deref()
    }

    /// Every pair that triggered a removal, with its correlation
    pub fn removed_pairs(&self) -> &[(String, String, f64)] {
        &self.removed_pairs
    }

    /// Pairwise Pearson correlations of the selected columns
    pub fn correlation_matrix(data: &Dataset, columns: &[usize]) -> Array2<f64> {
        let n = columns.len();
        let mut corr = Array2::eye(n);
        for i in 0..n {
            for j in (i + 1)..n {
                let r = pearson_correlation(
                    data.values().column(columns[i]),
                    data.values().column(columns[j]),
                );
                corr[[i, j]] = r;
                corr[[j, i]] = r;
            }
        }
        corr
    }

    fn mean_correlation(corr: &Array2<f64>, idx: usize, exclude: &HashSet<usize>) -> f64 {
        let mut total = 0.0;
        let mut count = 0;

        for j in 0..corr.ncols() {
            if j != idx && !exclude.contains(&j) {
                total += corr[[idx, j]].abs();
                count += 1;
            }
        }

        if count > 0 {
            total / count as f64
        } else {
            0.0
        }
    }
}

/// Remove columns with a single distinct value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZeroVarianceFilter {
    removed: Option<Vec<String>>,
}

impl ZeroVarianceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, data: &Dataset, columns: &[usize]) -> Result<&mut Self> {
        let removed = columns
            .iter()
            .filter(|&&idx| {
                let col = data.values().column(idx);
                match col.first() {
                    Some(&first) => col.iter().all(|&v| v == first),
                    None => true,
                }
            })
            .map(|&idx| data.column_names()[idx].clone())
            .collect();

        self.removed = Some(removed);
        Ok(self)
    }

    pub fn transform(&self, data: &Dataset) -> Result<Dataset> {
        let removed = self.removed.as_ref().ok_or_else(|| {
            EvalError::Validation("Filter not fitted".to_string())
        })?;
        drop_present(data, removed)
    }

    pub fn removed(&self) -> Option<&[String]> {
        self.removed.as_deref()
    }
}

fn drop_present(data: &Dataset, columns: &[String]) -> Result<Dataset> {
    for name in columns {
        data.column_index(name)?;
    }
    Ok(data.drop_columns(columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pearson() {
        let x = ndarray::array![1.0, 2.0, 3.0, 4.0];
        let y = ndarray::array![2.0, 4.0, 6.0, 8.0];
        assert!((pearson_correlation(x.view(), y.view()) - 1.0).abs() < 1e-12);

        let c = ndarray::array![5.0, 5.0, 5.0, 5.0];
        assert_eq!(pearson_correlation(x.view(), c.view()), 0.0);
    }

    #[test]
    fn test_correlation_filter() {
        let ds = Dataset::from_columns(vec![
            ("a", vec![1.0, 2.0, 3.0, 4.0, 5.0]),
            ("b", vec![1.1, 2.1, 3.1, 4.1, 5.1]),
            ("c", vec![5.0, 1.0, 4.0, 2.0, 3.0]),
        ])
        .unwrap();

        let mut filter = CorrelationFilter::new(0.9);
        filter.fit(&ds, &[0, 1, 2]).unwrap();

        // Columns a and b are perfectly correlated, one should be removed
        let removed = filter.removed().unwrap();
        assert_eq!(removed.len(), 1);
        assert!(removed[0] == "a" || removed[0] == "b");
        assert_eq!(filter.removed_pairs().len(), 1);

        let out = filter.transform(&ds).unwrap();
        assert_eq!(out.n_cols(), 2);
        assert!(out.has_column("c"));
    }

    #[test]
    fn test_zero_variance() {
        let ds = Dataset::from_columns(vec![
            ("a", vec![1.0, 2.0, 3.0]),
            ("z", vec![0.0, 0.0, 0.0]),
        ])
        .unwrap();

        let mut filter = ZeroVarianceFilter::new();
        let out = filter.fit(&ds, &[0, 1]).unwrap().transform(&ds).unwrap();
        assert_eq!(filter.removed().unwrap(), &["z".to_string()]);
        assert_eq!(out.column_names(), &["a".to_string()]);
    }

    #[test]
    fn test_transform_missing_column() {
        let ds = Dataset::from_columns(vec![("z", vec![1.0, 1.0])]).unwrap();
        let mut filter = ZeroVarianceFilter::new();
        filter.fit(&ds, &[0]).unwrap();

        let other = Dataset::from_columns(vec![("a", vec![1.0, 2.0])]).unwrap();
        assert!(matches!(filter.transform(&other), Err(EvalError::Schema(_))));
    }
}
