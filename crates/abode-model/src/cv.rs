//! K-fold cross-validation splits.

use crate::error::{ModelError, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Row indices of one train/test split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSplit {
    /// Training rows, ascending
    pub train: Vec<usize>,
    /// Held-out rows
    pub test: Vec<usize>,
}

/// K-fold splitter.
///
/// Rows are optionally shuffled with a seeded generator, then cut into `folds`
/// consecutive groups; the first `n % folds` groups hold one extra row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KFold {
    folds: usize,
    shuffle: bool,
    seed: u64,
}

impl KFold {
    /// Create a splitter with at least two folds.
    pub fn new(folds: usize, shuffle: bool, seed: u64) -> Result<Self> {
        if folds < 2 {
            return Err(ModelError::InvalidParameter(format!(
                "k-fold needs at least 2 folds, got {folds}"
            )));
        }
        Ok(Self {
            folds,
            shuffle,
            seed,
        })
    }

    /// Number of folds.
    pub const fn folds(&self) -> usize {
        self.folds
    }

    /// Split `n` rows. Fails when there are fewer rows than folds.
    pub fn split(&self, n: usize) -> Result<Vec<FoldSplit>> {
        if n < self.folds {
            return Err(ModelError::InsufficientData {
                required: self.folds,
                actual: n,
            });
        }

        let mut order: Vec<usize> = (0..n).collect();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed);
            order.shuffle(&mut rng);
        }

        let base = n / self.folds;
        let extra = n % self.folds;
        let mut splits = Vec::with_capacity(self.folds);
        let mut start = 0;

        for fold in 0..self.folds {
            let size = base + usize::from(fold < extra);
            let test = order[start..start + size].to_vec();

            let mut in_test = vec![false; n];
            for &i in &test {
                in_test[i] = true;
            }
            let train = (0..n).filter(|&i| !in_test[i]).collect();

            splits.push(FoldSplit { train, test });
            start += size;
        }

        Ok(splits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(24, 5, vec![5, 5, 5, 5, 4])]
    #[case(10, 5, vec![2, 2, 2, 2, 2])]
    #[case(7, 3, vec![3, 2, 2])]
    fn test_fold_sizes(#[case] n: usize, #[case] k: usize, #[case] sizes: Vec<usize>) {
        let splits = KFold::new(k, true, 20).unwrap().split(n).unwrap();
        let got: Vec<usize> = splits.iter().map(|s| s.test.len()).collect();
        assert_eq!(got, sizes);
        for split in &splits {
            assert_eq!(split.train.len() + split.test.len(), n);
        }
    }

    #[test]
    fn test_every_row_held_out_once() {
        let splits = KFold::new(5, true, 20).unwrap().split(23).unwrap();
        let mut held: Vec<usize> = splits.iter().flat_map(|s| s.test.clone()).collect();
        held.sort_unstable();
        assert_eq!(held, (0..23).collect::<Vec<_>>());
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = KFold::new(5, true, 20).unwrap().split(30).unwrap();
        let b = KFold::new(5, true, 20).unwrap().split(30).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unshuffled_folds_are_contiguous() {
        let splits = KFold::new(3, false, 0).unwrap().split(6).unwrap();
        assert_eq!(splits[0].test, vec![0, 1]);
        assert_eq!(splits[2].test, vec![4, 5]);
        assert_eq!(splits[1].train, vec![0, 1, 4, 5]);
    }

    #[test]
    fn test_too_few_rows() {
        assert!(matches!(
            KFold::new(5, true, 20).unwrap().split(4),
            Err(ModelError::InsufficientData { required: 5, actual: 4 })
        ));
        assert!(KFold::new(1, false, 0).is_err());
    }
}
