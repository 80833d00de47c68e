use std::collections::BTreeSet;

use proptest::prelude::*;

use state_select::data::{combine, combine_all};
use state_select::domain::Utterance;
use state_select::fit::{fold_count, k_fold};
use state_select::math::log_sum_exp;

fn utterances(lengths: &[usize]) -> Vec<Utterance> {
    lengths
        .iter()
        .enumerate()
        .map(|(u, &len)| (0..len).map(|t| vec![u as f64, t as f64]).collect())
        .collect()
}

proptest! {
    #[test]
    fn folds_partition_utterances(n in 0usize..40, k in 2usize..6, seed in proptest::option::of(any::<u64>())) {
        let folds = k_fold(n, k, seed);
        if n < k {
            prop_assert!(folds.is_empty());
            return Ok(());
        }

        prop_assert_eq!(folds.len(), k);
        let mut held_out = Vec::new();
        for fold in &folds {
            prop_assert!(!fold.test.is_empty());
            prop_assert_eq!(fold.train.len() + fold.test.len(), n);

            let train: BTreeSet<usize> = fold.train.iter().copied().collect();
            let test: BTreeSet<usize> = fold.test.iter().copied().collect();
            prop_assert!(train.is_disjoint(&test));
            held_out.extend(fold.test.iter().copied());
        }
        held_out.sort_unstable();
        prop_assert_eq!(held_out, (0..n).collect::<Vec<_>>());

        let sizes: Vec<usize> = folds.iter().map(|f| f.test.len()).collect();
        let (min, max) = (sizes.iter().min().unwrap(), sizes.iter().max().unwrap());
        prop_assert!(max - min <= 1);
    }

    #[test]
    fn unshuffled_folds_are_contiguous(n in 2usize..30) {
        for fold in k_fold(n, fold_count(n), None) {
            let first = fold.test[0];
            let expected: Vec<usize> = (first..first + fold.test.len()).collect();
            prop_assert_eq!(fold.test, expected);
        }
    }

    #[test]
    fn combine_preserves_frames(
        lengths in proptest::collection::vec(1usize..8, 1..10),
        picks in proptest::collection::vec(any::<prop::sample::Index>(), 0..10),
    ) {
        let seqs = utterances(&lengths);
        let indices: Vec<usize> = picks.iter().map(|p| p.index(seqs.len())).collect();
        let flat = combine(&indices, &seqs);

        prop_assert_eq!(flat.lengths.len(), indices.len());
        prop_assert_eq!(flat.n_frames(), indices.iter().map(|&i| lengths[i]).sum::<usize>());
        prop_assert!(flat.lengths_consistent());

        let mut row = 0;
        for &i in &indices {
            for (t, frame) in seqs[i].iter().enumerate() {
                prop_assert_eq!(flat.observations[(row, 0)], frame[0]);
                prop_assert_eq!(flat.observations[(row, 1)], t as f64);
                row += 1;
            }
        }
    }

    #[test]
    fn combine_all_keeps_every_utterance(lengths in proptest::collection::vec(1usize..8, 1..10)) {
        let flat = combine_all(&utterances(&lengths));
        prop_assert_eq!(flat.lengths, lengths);
    }

    #[test]
    fn log_sum_exp_matches_direct_sum(values in proptest::collection::vec(-50.0f64..50.0, 1..12)) {
        let naive = values.iter().map(|v| v.exp()).sum::<f64>().ln();
        let direct = log_sum_exp(&values);
        prop_assert!((naive - direct).abs() < 1e-9);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(direct >= max);
    }
}
