//! Cross-validation fold generation

use super::{padded_id, Split};
use crate::error::{EvalError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Cross-validation strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CVStrategy {
    /// K-Fold cross-validation
    KFold { n_splits: usize, shuffle: bool },
    /// K-Fold repeated with a fresh shuffle each time
    RepeatedKFold { n_splits: usize, n_repeats: usize },
}

impl Default for CVStrategy {
    fn default() -> Self {
        CVStrategy::KFold { n_splits: 10, shuffle: true }
    }
}

/// Cross-validation splitter
#[derive(Debug, Clone)]
pub struct CrossValidator {
    strategy: CVStrategy,
    random_state: Option<u64>,
}

impl CrossValidator {
    /// Create a new cross-validator
    pub fn new(strategy: CVStrategy) -> Self {
        Self {
            strategy,
            random_state: None,
        }
    }

    /// `v`-fold cross-validation with shuffling
    pub fn k_fold(n_splits: usize) -> Self {
        Self::new(CVStrategy::KFold { n_splits, shuffle: true })
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Generate train/test splits over `n_samples` rows
    pub fn split(&self, n_samples: usize) -> Result<Vec<Split>> {
        match &self.strategy {
            CVStrategy::KFold { n_splits, shuffle } => {
                let mut rng = self.rng(0);
                self.k_fold_split(n_samples, *n_splits, *shuffle, &mut rng, None)
            }
            CVStrategy::RepeatedKFold { n_splits, n_repeats } => {
                self.repeated_k_fold_split(n_samples, *n_splits, *n_repeats)
            }
        }
    }

    fn rng(&self, offset: u64) -> ChaCha8Rng {
        match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(offset)),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    fn k_fold_split(
        &self,
        n_samples: usize,
        n_splits: usize,
        shuffle: bool,
        rng: &mut ChaCha8Rng,
        repeat: Option<(usize, usize)>,
    ) -> Result<Vec<Split>> {
        if n_splits < 2 {
            return Err(EvalError::Validation(
                "n_splits must be at least 2".to_string()
            ));
        }
        if n_samples < n_splits {
            return Err(EvalError::Validation(
                format!("n_samples ({}) must be >= n_splits ({})", n_samples, n_splits)
            ));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if shuffle {
            indices.shuffle(rng);
        }

        let base = n_samples / n_splits;
        let remainder = n_samples % n_splits;

        let mut splits = Vec::with_capacity(n_splits);
        let mut current = 0;

        for fold_idx in 0..n_splits {
            let fold_size = if fold_idx < remainder { base + 1 } else { base };

            let mut test: Vec<usize> = indices[current..current + fold_size].to_vec();
            let mut train: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();
            test.sort_unstable();
            train.sort_unstable();

            let fold_id = padded_id("Fold", fold_idx + 1, n_splits);
            let id = match repeat {
                Some((r, n_repeats)) => format!("{}/{}", padded_id("Repeat", r + 1, n_repeats), fold_id),
                None => fold_id,
            };

            splits.push(Split::from_indices(id, train, test));
            current += fold_size;
        }

        Ok(splits)
    }

    fn repeated_k_fold_split(&self, n_samples: usize, n_splits: usize, n_repeats: usize) -> Result<Vec<Split>> {
        if n_repeats == 0 {
            return Err(EvalError::Validation(
                "n_repeats must be at least 1".to_string()
            ));
        }

        let mut all_splits = Vec::with_capacity(n_splits * n_repeats);
        for repeat in 0..n_repeats {
            let mut rng = self.rng(repeat as u64);
            let splits = self.k_fold_split(n_samples, n_splits, true, &mut rng, Some((repeat, n_repeats)))?;
            all_splits.extend(splits);
        }

        Ok(all_splits)
    }
}
