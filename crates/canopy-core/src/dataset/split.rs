//! Seeded train/test splitting.

use oorandom::Rand64;
use serde::{Deserialize, Serialize};

use crate::error::{CanopyError, Result};

/// Row indices of a train/test partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl Split {
    /// Number of training rows.
    #[must_use]
    pub fn n_train(&self) -> usize {
        self.train.len()
    }

    /// Number of test rows.
    #[must_use]
    pub fn n_test(&self) -> usize {
        self.test.len()
    }
}

/// Number of test rows for a fractional `test_size`: `ceil(test_size * n)`.
#[must_use]
pub fn test_count(n_rows: usize, test_size: f64) -> usize {
    (test_size * n_rows as f64).ceil() as usize
}

/// In-place Fisher-Yates shuffle driven by `rng`.
pub fn shuffle<T>(items: &mut [T], rng: &mut Rand64) {
    for i in (1..items.len()).rev() {
        let j = rng.rand_range(0..(i as u64 + 1)) as usize;
        items.swap(i, j);
    }
}

/// Randomly partitions `0..n_rows` into disjoint train and test sets.
///
/// The permutation is fully determined by `seed`.
pub fn train_test_split(n_rows: usize, test_size: f64, seed: u64) -> Result<Split> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(CanopyError::InvalidSplit(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }

    let n_test = test_count(n_rows, test_size);
    if n_test == 0 || n_test >= n_rows {
        return Err(CanopyError::InvalidSplit(format!(
            "test_size={test_size} on {n_rows} rows leaves an empty side"
        )));
    }

    let mut rng = Rand64::new(u128::from(seed));
    let mut indices: Vec<usize> = (0..n_rows).collect();
    shuffle(&mut indices, &mut rng);

    let train = indices.split_off(n_test);
    Ok(Split {
        train,
        test: indices,
    })
}
