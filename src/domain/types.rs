//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - shared read-only across per-word selections (including in parallel)
//! - embedded in exported bank files (`SelectorConfig`, `SelectorKind`)

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use clap::ValueEnum;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// One feature vector (fixed dimensionality D within a corpus).
pub type Frame = Vec<f64>;

/// One utterance: an ordered, variable-length list of frames.
pub type Utterance = Vec<Frame>;

/// word -> ordered utterances for that word.
pub type WordSequenceIndex = BTreeMap<String, Vec<Utterance>>;

/// word -> all utterances of that word combined into one flat batch.
pub type WordFlatIndex = BTreeMap<String, FlatSequences>;

/// Maximum EM iterations requested from the trainer by every selector.
pub const TRAINER_MAX_ITER: usize = 1000;

/// Several utterances combined into one observation matrix.
///
/// Rows are frames (in utterance order), columns are features. `lengths[i]` is
/// the frame count of the i-th utterance and the lengths sum to the row count.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatSequences {
    pub observations: DMatrix<f64>,
    pub lengths: Vec<usize>,
}

impl FlatSequences {
    pub fn new(observations: DMatrix<f64>, lengths: Vec<usize>) -> Self {
        Self {
            observations,
            lengths,
        }
    }

    /// Total number of frames (rows).
    pub fn n_frames(&self) -> usize {
        self.observations.nrows()
    }

    /// Feature dimensionality (columns).
    pub fn n_features(&self) -> usize {
        self.observations.ncols()
    }

    /// Number of utterances combined into this batch.
    pub fn n_sequences(&self) -> usize {
        self.lengths.len()
    }

    /// Whether `lengths` accounts for exactly every row.
    pub fn lengths_consistent(&self) -> bool {
        self.lengths.iter().sum::<usize>() == self.n_frames()
    }

    /// `(start_row, len)` of each utterance.
    pub fn spans(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.lengths.iter().scan(0usize, |start, &len| {
            let span = (*start, len);
            *start += len;
            Some(span)
        })
    }
}

/// Shape of the per-state emission covariance requested from the trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CovarianceKind {
    /// Independent variance per state and feature.
    Diag,
}

/// Which selection strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    /// Always use `n_constant` states.
    Constant,
    /// Bayesian Information Criterion (lower is better).
    Bic,
    /// Discriminative Information Criterion (higher is better).
    Dic,
    /// Cross-validated held-out log-likelihood (higher is better).
    Cv,
}

impl SelectorKind {
    pub const ALL: [SelectorKind; 4] = [
        SelectorKind::Constant,
        SelectorKind::Bic,
        SelectorKind::Dic,
        SelectorKind::Cv,
    ];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            SelectorKind::Constant => "Constant",
            SelectorKind::Bic => "BIC",
            SelectorKind::Dic => "DIC",
            SelectorKind::Cv => "CV",
        }
    }

    /// Whether a lower criterion value is preferred.
    pub fn lower_is_better(self) -> bool {
        matches!(self, SelectorKind::Bic)
    }
}

/// Selector configuration shared by every strategy.
///
/// No invariant is enforced beyond what the search itself implies: with
/// `min_n_components > max_n_components` the candidate range is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// State count used by the constant strategy (and as BIC's fallback).
    pub n_constant: usize,
    pub min_n_components: usize,
    pub max_n_components: usize,
    /// Seed forwarded to the trainer (and to fold shuffling).
    pub random_state: u64,
    /// Log every fit attempt at info level.
    pub verbose: bool,
    /// Shuffle utterances before splitting cross-validation folds.
    pub shuffle_folds: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            n_constant: 3,
            min_n_components: 2,
            max_n_components: 10,
            random_state: 14,
            verbose: false,
            shuffle_folds: false,
        }
    }
}

impl SelectorConfig {
    /// Candidate state counts, in search order. Empty when min > max.
    pub fn candidates(&self) -> RangeInclusive<usize> {
        self.min_n_components..=self.max_n_components
    }
}
