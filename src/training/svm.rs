//! Epsilon-support vector regression
//!
//! The dual is solved by SMO over the 2n-variable formulation (one variable
//! per side of the epsilon tube) with second-order working set selection.
//! Inputs are used as given; any scaling belongs to the recipe.

use crate::error::{EvalError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Maximum number of samples for eager kernel matrix computation.
/// Beyond this, training will return an error to prevent OOM.
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// Substitute for a non-positive curvature in the pair update
const TAU: f64 = 1e-12;

/// Kernel function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Kernel {
    /// Radial basis function: K(x, y) = exp(-σ ||x - y||²)
    Rbf { sigma: f64 },
    /// Linear kernel: K(x, y) = x · y
    Linear,
    /// Polynomial kernel: K(x, y) = (scale · x · y + offset)^degree
    Polynomial { degree: u32, scale: f64, offset: f64 },
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::Rbf { sigma: 1.0 }
    }
}

impl Kernel {
    pub fn compute(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self {
            Kernel::Rbf { sigma } => {
                let sq: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
                (-sigma * sq).exp()
            }
            Kernel::Linear => a.dot(&b),
            Kernel::Polynomial { degree, scale, offset } => {
                let d = i32::try_from(*degree).unwrap_or(i32::MAX);
                (scale * a.dot(&b) + offset).powi(d)
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Kernel::Rbf { sigma } if !(*sigma > 0.0) || !sigma.is_finite() => {
                Err(EvalError::InvalidParameter {
                    name: "sigma".to_string(),
                    value: sigma.to_string(),
                    reason: "must be positive and finite".to_string(),
                })
            }
            Kernel::Polynomial { degree: 0, .. } => Err(EvalError::InvalidParameter {
                name: "degree".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// SVR hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvrConfig {
    /// Regularization parameter (C)
    pub cost: f64,
    /// Half-width of the insensitive tube
    pub epsilon: f64,
    pub kernel: Kernel,
    /// Tolerance for stopping criterion
    pub tol: f64,
    /// Maximum number of SMO iterations
    pub max_iter: usize,
}

impl Default for SvrConfig {
    fn default() -> Self {
        Self {
            cost: 1.0,
            epsilon: 0.1,
            kernel: Kernel::default(),
            tol: 1e-3,
            max_iter: 100_000,
        }
    }
}

impl SvrConfig {
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.cost > 0.0) || !self.cost.is_finite() {
            return Err(EvalError::InvalidParameter {
                name: "cost".to_string(),
                value: self.cost.to_string(),
                reason: "must be positive and finite".to_string(),
            });
        }
        if !(self.epsilon >= 0.0) || !self.epsilon.is_finite() {
            return Err(EvalError::InvalidParameter {
                name: "epsilon".to_string(),
                value: self.epsilon.to_string(),
                reason: "must be non-negative".to_string(),
            });
        }
        if !(self.tol > 0.0) {
            return Err(EvalError::InvalidParameter {
                name: "tol".to_string(),
                value: self.tol.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        self.kernel.validate()
    }
}

/// Support Vector Regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmRegressor {
    config: SvrConfig,
    support_vectors: Option<Array2<f64>>,
    /// alpha - alpha* for each support vector
    coefficients: Option<Array1<f64>>,
    rho: f64,
    n_iter: usize,
    is_fitted: bool,
}

impl SvmRegressor {
    /// Create a new SVM regressor
    pub fn new(config: SvrConfig) -> Self {
        Self {
            config,
            support_vectors: None,
            coefficients: None,
            rho: 0.0,
            n_iter: 0,
            is_fitted: false,
        }
    }

    /// Fit the regressor
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        self.config.validate()?;

        let n = x.nrows();
        if n != y.len() {
            return Err(EvalError::Shape {
                expected: format!("y length = {}", n),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n == 0 {
            return Err(EvalError::Fit("cannot fit SVR on zero rows".to_string()));
        }
        if n > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(EvalError::Fit(format!(
                "SVR kernel matrix limited to {} samples, got {}",
                MAX_KERNEL_MATRIX_SAMPLES, n
            )));
        }

        let k = self.compute_kernel_matrix(x);
        let solution = self.solve(&k, y);

        let support: Vec<usize> = (0..n)
            .filter(|&i| solution.coefficients[i] != 0.0)
            .collect();

        let mut support_vectors = Array2::zeros((support.len(), x.ncols()));
        let mut coefficients = Array1::zeros(support.len());
        for (row, &idx) in support.iter().enumerate() {
            support_vectors.row_mut(row).assign(&x.row(idx));
            coefficients[row] = solution.coefficients[idx];
        }

        debug!(
            n_rows = n,
            n_support = support.len(),
            n_iter = solution.n_iter,
            "fitted SVR"
        );

        self.support_vectors = Some(support_vectors);
        self.coefficients = Some(coefficients);
        self.rho = solution.rho;
        self.n_iter = solution.n_iter;
        self.is_fitted = true;
        Ok(self)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (sv, coef) = match (&self.support_vectors, &self.coefficients, self.is_fitted) {
            (Some(sv), Some(coef), true) => (sv, coef),
            _ => return Err(EvalError::Predict("model not fitted".to_string())),
        };

        if sv.nrows() > 0 && x.ncols() != sv.ncols() {
            return Err(EvalError::Predict(format!(
                "expected {} predictors, got {}",
                sv.ncols(),
                x.ncols()
            )));
        }

        let kernel = &self.config.kernel;
        let preds = x
            .rows()
            .into_iter()
            .map(|row| {
                let sum: f64 = sv
                    .rows()
                    .into_iter()
                    .zip(coef.iter())
                    .map(|(s, &c)| c * kernel.compute(s, row))
                    .sum();
                sum - self.rho
            })
            .collect();

        Ok(Array1::from_vec(preds))
    }

    pub fn n_support_vectors(&self) -> usize {
        self.coefficients.as_ref().map_or(0, |c| c.len())
    }

    /// SMO iterations used by the last fit
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    fn compute_kernel_matrix(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let kernel = &self.config.kernel;

        // For small matrices, sequential is faster due to overhead
        if n < 100 {
            let mut k = Array2::zeros((n, n));
            for i in 0..n {
                for j in i..n {
                    let val = kernel.compute(x.row(i), x.row(j));
                    k[[i, j]] = val;
                    k[[j, i]] = val;
                }
            }
            return k;
        }

        // Parallel: compute upper triangle rows in parallel
        let rows: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| (i..n).map(|j| kernel.compute(x.row(i), x.row(j))).collect())
            .collect();

        let mut k = Array2::zeros((n, n));
        for (i, row) in rows.into_iter().enumerate() {
            for (offset, val) in row.into_iter().enumerate() {
                let j = i + offset;
                k[[i, j]] = val;
                k[[j, i]] = val;
            }
        }
        k
    }

    fn solve(&self, k: &Array2<f64>, z: &Array1<f64>) -> SmoSolution {
        let n = z.len();
        let l = 2 * n;
        let c = self.config.cost;
        let eps = self.config.epsilon;
        let tol = self.config.tol;

        let sign = |t: usize| if t < n { 1.0 } else { -1.0 };
        let kq = |s: usize, t: usize| k[[s % n, t % n]];

        let mut alpha = vec![0.0; l];
        let mut grad: Vec<f64> = (0..l)
            .map(|t| if t < n { eps - z[t] } else { eps + z[t - n] })
            .collect();

        let mut n_iter = 0;
        loop {
            if n_iter >= self.config.max_iter {
                warn!(max_iter = self.config.max_iter, "SVR reached the iteration limit before converging");
                break;
            }

            // i: maximal violator among variables that may move up
            let mut g_max = f64::NEG_INFINITY;
            let mut sel_i = None;
            for t in 0..l {
                let y = sign(t);
                let can_move = if y > 0.0 { alpha[t] < c } else { alpha[t] > 0.0 };
                if can_move && -y * grad[t] >= g_max {
                    g_max = -y * grad[t];
                    sel_i = Some(t);
                }
            }

            // j: largest second-order decrease among variables that may move down
            let mut g_max2 = f64::NEG_INFINITY;
            let mut sel_j = None;
            let mut obj_min = f64::INFINITY;
            for t in 0..l {
                let y = sign(t);
                let can_move = if y > 0.0 { alpha[t] > 0.0 } else { alpha[t] < c };
                if !can_move {
                    continue;
                }
                let yg = y * grad[t];
                if yg >= g_max2 {
                    g_max2 = yg;
                }
                if let Some(i) = sel_i {
                    let b = g_max + yg;
                    if b > 0.0 {
                        let a = kq(i, i) + kq(t, t) - 2.0 * kq(i, t);
                        let a = if a > 0.0 { a } else { TAU };
                        let obj = -(b * b) / a;
                        if obj <= obj_min {
                            obj_min = obj;
                            sel_j = Some(t);
                        }
                    }
                }
            }

            let (i, j) = match (sel_i, sel_j) {
                (Some(i), Some(j)) if g_max + g_max2 >= tol => (i, j),
                _ => break,
            };
            n_iter += 1;

            let (old_i, old_j) = (alpha[i], alpha[j]);
            let q_ij = sign(i) * sign(j) * kq(i, j);

            if sign(i) != sign(j) {
                let quad = kq(i, i) + kq(j, j) + 2.0 * q_ij;
                let quad = if quad > 0.0 { quad } else { TAU };
                let delta = (-grad[i] - grad[j]) / quad;
                let diff = alpha[i] - alpha[j];
                alpha[i] += delta;
                alpha[j] += delta;

                if diff > 0.0 {
                    if alpha[j] < 0.0 {
                        alpha[j] = 0.0;
                        alpha[i] = diff;
                    }
                    if alpha[i] > c {
                        alpha[i] = c;
                        alpha[j] = c - diff;
                    }
                } else {
                    if alpha[i] < 0.0 {
                        alpha[i] = 0.0;
                        alpha[j] = -diff;
                    }
                    if alpha[j] > c {
                        alpha[j] = c;
                        alpha[i] = c + diff;
                    }
                }
            } else {
                let quad = kq(i, i) + kq(j, j) - 2.0 * q_ij;
                let quad = if quad > 0.0 { quad } else { TAU };
                let delta = (grad[i] - grad[j]) / quad;
                let sum = alpha[i] + alpha[j];
                alpha[i] -= delta;
                alpha[j] += delta;

                if sum > c {
                    if alpha[i] > c {
                        alpha[i] = c;
                        alpha[j] = sum - c;
                    }
                    if alpha[j] > c {
                        alpha[j] = c;
                        alpha[i] = sum - c;
                    }
                } else {
                    if alpha[j] < 0.0 {
                        alpha[j] = 0.0;
                        alpha[i] = sum;
                    }
                    if alpha[i] < 0.0 {
                        alpha[i] = 0.0;
                        alpha[j] = sum;
                    }
                }
            }

            let d_i = alpha[i] - old_i;
            let d_j = alpha[j] - old_j;
            for t in 0..l {
                let q_ti = sign(t) * sign(i) * kq(t, i);
                let q_tj = sign(t) * sign(j) * kq(t, j);
                grad[t] += q_ti * d_i + q_tj * d_j;
            }
        }

        // rho: average over free variables, else midpoint of the feasible interval
        let mut ub = f64::INFINITY;
        let mut lb = f64::NEG_INFINITY;
        let mut n_free = 0usize;
        let mut sum_free = 0.0;
        for t in 0..l {
            let y = sign(t);
            let yg = y * grad[t];
            if alpha[t] >= c {
                if y < 0.0 {
                    ub = ub.min(yg);
                } else {
                    lb = lb.max(yg);
                }
            } else if alpha[t] <= 0.0 {
                if y > 0.0 {
                    ub = ub.min(yg);
                } else {
                    lb = lb.max(yg);
                }
            } else {
                n_free += 1;
                sum_free += yg;
            }
        }
        let rho = if n_free > 0 {
            sum_free / n_free as f64
        } else {
            (ub + lb) / 2.0
        };

        SmoSolution {
            coefficients: (0..n).map(|i| alpha[i] - alpha[i + n]).collect(),
            rho,
            n_iter,
        }
    }
}

struct SmoSolution {
    coefficients: Vec<f64>,
    rho: f64,
    n_iter: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn column(values: Vec<f64>) -> Array2<f64> {
        let n = values.len();
        Array2::from_shape_vec((n, 1), values).unwrap()
    }

    #[test]
    fn test_linear_kernel_stays_in_tube() {
        let x = column((1..=10).map(|v| v as f64).collect());
        let y = Array1::from_iter((1..=10).map(|v| 2.0 * v as f64));

        let config = SvrConfig::default()
            .with_cost(10.0)
            .with_epsilon(0.5)
            .with_kernel(Kernel::Linear);
        let mut svr = SvmRegressor::new(config);
        svr.fit(&x, &y).unwrap();

        let preds = svr.predict(&x).unwrap();
        for (p, t) in preds.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1.0, "prediction {} too far from {}", p, t);
        }
    }

    #[test]
    fn test_constant_target() {
        let x = column((1..=10).map(|v| v as f64).collect());
        let y = Array1::from_elem(10, 5.0);

        let mut svr = SvmRegressor::new(SvrConfig::default());
        svr.fit(&x, &y).unwrap();

        assert_eq!(svr.n_support_vectors(), 0);
        assert_eq!(svr.n_iter(), 0);
        for p in svr.predict(&x).unwrap().iter() {
            assert!((p - 5.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rbf_fits_sine() {
        let xs: Vec<f64> = (0..20).map(|i| i as f64 / 19.0).collect();
        let y = Array1::from_iter(xs.iter().map(|v| (2.0 * std::f64::consts::PI * v).sin()));
        let x = column(xs);

        let config = SvrConfig::default()
            .with_cost(10.0)
            .with_epsilon(0.05)
            .with_kernel(Kernel::Rbf { sigma: 10.0 });
        let mut svr = SvmRegressor::new(config);
        svr.fit(&x, &y).unwrap();

        let preds = svr.predict(&x).unwrap();
        let max_err = preds
            .iter()
            .zip(y.iter())
            .map(|(p, t)| (p - t).abs())
            .fold(0.0, f64::max);
        assert!(max_err < 0.1, "max error {}", max_err);
        assert!(svr.n_support_vectors() > 0 && svr.n_support_vectors() < 20);
    }

    #[test]
    fn test_kernels() {
        let a = ndarray::array![1.0, 2.0];
        let b = ndarray::array![2.0, 0.0];

        assert_eq!(Kernel::Linear.compute(a.view(), b.view()), 2.0);
        let rbf = Kernel::Rbf { sigma: 0.5 }.compute(a.view(), b.view());
        assert!((rbf - (-2.5f64).exp()).abs() < 1e-12);
        let poly = Kernel::Polynomial { degree: 2, scale: 1.0, offset: 1.0 };
        assert_eq!(poly.compute(a.view(), b.view()), 9.0);
    }

    #[test]
    fn test_invalid_parameters() {
        let x = column(vec![1.0, 2.0]);
        let y = ndarray::array![1.0, 2.0];

        for config in [
            SvrConfig::default().with_cost(0.0),
            SvrConfig::default().with_epsilon(-0.1),
            SvrConfig::default().with_kernel(Kernel::Rbf { sigma: 0.0 }),
        ] {
            let err = SvmRegressor::new(config).fit(&x, &y).unwrap_err();
            assert!(matches!(err, EvalError::InvalidParameter { .. }));
        }
    }

    #[test]
    fn test_predict_before_fit() {
        let svr = SvmRegressor::new(SvrConfig::default());
        assert!(matches!(svr.predict(&column(vec![1.0])), Err(EvalError::Predict(_))));
    }
}
