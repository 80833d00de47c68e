//! Cross-validation fold generation.
//!
//! Utterances are split the way a plain k-fold splitter does: `k` contiguous
//! test blocks over the (optionally shuffled) utterance order, the first
//! `n % k` blocks one element larger. Each utterance is held out exactly once.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// One train/test split of utterance indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Number of folds for a word with `n_utterances` utterances: 3, or 2 below three.
pub fn fold_count(n_utterances: usize) -> usize {
    if n_utterances < 3 { 2 } else { 3 }
}

/// Split `0..n_utterances` into `k` folds.
///
/// Returns no folds when there are fewer utterances than folds (some test
/// block would be empty) or `k < 2`.
pub fn k_fold(n_utterances: usize, k: usize, shuffle: Option<u64>) -> Vec<Fold> {
    if k < 2 || n_utterances < k {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..n_utterances).collect();
    if let Some(seed) = shuffle {
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);
    }

    let base = n_utterances / k;
    let extra = n_utterances % k;
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for f in 0..k {
        let size = base + usize::from(f < extra);
        let end = start + size;
        let test = order[start..end].to_vec();
        let train = order[..start].iter().chain(&order[end..]).copied().collect();
        folds.push(Fold { train, test });
        start = end;
    }
    folds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_count_never_below_two() {
        assert_eq!(fold_count(1), 2);
        assert_eq!(fold_count(2), 2);
        assert_eq!(fold_count(3), 3);
        assert_eq!(fold_count(13), 3);
    }

    #[test]
    fn contiguous_blocks_front_load_remainder() {
        let folds = k_fold(7, 3, None);
        let tests: Vec<Vec<usize>> = folds.iter().map(|f| f.test.clone()).collect();
        assert_eq!(tests, vec![vec![0, 1, 2], vec![3, 4], vec![5, 6]]);
        assert_eq!(folds[1].train, vec![0, 1, 2, 5, 6]);
    }

    #[test]
    fn too_few_utterances_gives_no_folds() {
        assert!(k_fold(1, 2, None).is_empty());
        assert!(k_fold(5, 1, None).is_empty());
    }

    #[test]
    fn shuffled_split_is_seeded() {
        assert_eq!(k_fold(9, 3, Some(5)), k_fold(9, 3, Some(5)));
    }
}
