//! Trainer seam: the selectors' only view of the sequence model.
//!
//! A `Trainer` turns a batch of combined utterances plus a requested state
//! count into a fitted model, or a typed `TrainError`. A `FittedModel` scores
//! any compatible batch by total log-likelihood. Neither side may panic across
//! this boundary on bad data; `BaseSelector::fit` additionally catches panics.

use crate::domain::{CovarianceKind, FlatSequences};
use crate::error::{ScoreError, TrainError};

/// Everything the trainer needs besides the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainRequest {
    pub n_components: usize,
    pub covariance: CovarianceKind,
    pub max_iter: usize,
    pub random_state: u64,
}

/// A model that can score observation batches.
pub trait FittedModel {
    /// Number of hidden states.
    fn n_components(&self) -> usize;

    /// Feature dimensionality the model was trained on.
    fn n_features(&self) -> usize;

    /// Total log-likelihood of `data` (sum over its utterances).
    fn score(&self, data: &FlatSequences) -> Result<f64, ScoreError>;
}

/// Fits a model with a requested number of hidden states.
///
/// `Sync` so a single trainer can be shared by per-word selections running in
/// parallel.
pub trait Trainer: Sync {
    type Model: FittedModel + Send;

    fn fit(&self, data: &FlatSequences, request: &TrainRequest) -> Result<Self::Model, TrainError>;
}
