//! Feature scaling implementations

use crate::data::{ColumnKind, Dataset};
use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};

/// Type of scaler to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// Min-Max scaling to `[min, max]`; values outside the training range are clipped
    MinMax { min: f64, max: f64 },
}

/// Parameters for one fitted column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ScalerParams {
    column: String,
    center: f64, // mean or min
    scale: f64,  // std or range
}

/// Feature scaler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    /// Create a new scaler
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: Vec::new(),
            is_fitted: false,
        }
    }

    /// Fit the scaler to the given columns of `data`
    pub fn fit(&mut self, data: &Dataset, columns: &[usize]) -> Result<&mut Self> {
        self.params.clear();

        for &idx in columns {
            let name = &data.column_names()[idx];
            if data.kinds()[idx] == ColumnKind::Nominal {
                return Err(EvalError::Validation(format!(
                    "cannot scale nominal column '{}'",
                    name
                )));
            }

            let col = data.values().column(idx);
            let (center, scale) = match self.scaler_type {
                ScalerType::Standard => {
                    let n = col.len() as f64;
                    let mean = col.mean().unwrap_or(0.0);
                    let std = if n > 1.0 {
                        (col.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
                    } else {
                        0.0
                    };
                    (mean, if std == 0.0 { 1.0 } else { std })
                }
                ScalerType::MinMax { .. } => {
                    let min = col.iter().cloned().fold(f64::INFINITY, f64::min);
                    let max = col.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                    if !min.is_finite() {
                        (0.0, 1.0)
                    } else {
                        let range = max - min;
                        (min, if range == 0.0 { 1.0 } else { range })
                    }
                }
            };

            self.params.push(ScalerParams {
                column: name.clone(),
                center,
                scale,
            });
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data; scaled columns must be present
    pub fn transform(&self, data: &Dataset) -> Result<Dataset> {
        if !self.is_fitted {
            return Err(EvalError::Validation("Scaler not fitted".to_string()));
        }

        let mut values = data.values().clone();
        for params in &self.params {
            let idx = data.column_index(&params.column)?;
            values
                .column_mut(idx)
                .mapv_inplace(|v| self.scale_value(v, params));
        }

        Ok(Dataset::from_parts(
            data.column_names().to_vec(),
            values,
            data.kinds().to_vec(),
        ))
    }

    /// `(center, scale)` frozen for `column`
    pub fn params_for(&self, column: &str) -> Option<(f64, f64)> {
        self.params
            .iter()
            .find(|p| p.column == column)
            .map(|p| (p.center, p.scale))
    }

    fn scale_value(&self, v: f64, params: &ScalerParams) -> f64 {
        let z = (v - params.center) / params.scale;
        match self.scaler_type {
            ScalerType::Standard => z,
            ScalerType::MinMax { min, max } => (min + z * (max - min)).clamp(min, max),
        }
    }
}
