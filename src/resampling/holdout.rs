//! Holdout (initial) splits

use super::Split;
use crate::error::{EvalError, Result};
use ndarray::ArrayView1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::warn;

fn check_prop(prop: f64) -> Result<()> {
    if !(prop > 0.0 && prop < 1.0) {
        return Err(EvalError::InvalidParameter {
            name: "prop".to_string(),
            value: prop.to_string(),
            reason: "must be strictly between 0 and 1".to_string(),
        });
    }
    Ok(())
}

/// Random holdout split with `floor(n_rows * prop)` training rows
pub fn initial_split(n_rows: usize, prop: f64, seed: u64) -> Result<Split> {
    check_prop(prop)?;

    let n_train = (n_rows as f64 * prop).floor() as usize;
    if n_train == 0 || n_train >= n_rows {
        return Err(EvalError::Validation(format!(
            "prop {} leaves an empty partition for {} rows",
            prop, n_rows
        )));
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut train = indices[..n_train].to_vec();
    let mut test = indices[n_train..].to_vec();
    train.sort_unstable();
    test.sort_unstable();

    Ok(Split::from_indices("Resample1", train, test))
}

/// Holdout split stratified on equal-frequency bins of a numeric outcome.
///
/// Each bin contributes `floor(len * prop)` rows to training. With fewer than
/// two rows per bin the split falls back to [`initial_split`].
pub fn initial_split_stratified(
    outcome: ArrayView1<f64>,
    prop: f64,
    n_bins: usize,
    seed: u64,
) -> Result<Split> {
    check_prop(prop)?;

    let n_rows = outcome.len();
    let n_bins = n_bins.max(1);
    if n_rows < 2 * n_bins {
        warn!(n_rows, n_bins, "too few rows to stratify, using a plain random split");
        return initial_split(n_rows, prop, seed);
    }

    // Rank rows by outcome value; ties keep row order
    let mut order: Vec<usize> = (0..n_rows).collect();
    order.sort_by(|&a, &b| {
        outcome[a]
            .partial_cmp(&outcome[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut bins: Vec<Vec<usize>> = vec![Vec::new(); n_bins];
    for (rank, &row) in order.iter().enumerate() {
        bins[rank * n_bins / n_rows].push(row);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_rows);
    let mut test = Vec::with_capacity(n_rows);

    for mut bin in bins {
        bin.sort_unstable();
        bin.shuffle(&mut rng);
        let n_train = (bin.len() as f64 * prop).floor() as usize;
        train.extend_from_slice(&bin[..n_train]);
        test.extend_from_slice(&bin[n_train..]);
    }

    if train.is_empty() || test.is_empty() {
        return Err(EvalError::Validation(format!(
            "prop {} leaves an empty partition for {} rows",
            prop, n_rows
        )));
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(Split::from_indices("Resample1", train, test))
}
