//! Gaussian-emission hidden Markov model with diagonal covariance.
//!
//! Parameters are stored in probability space, row-major:
//!
//! - `startprob[i]`            initial state probabilities
//! - `transmat[i * n + j]`     P(state j | state i)
//! - `means[i * d + k]`        emission mean of feature k in state i
//! - `variances[i * d + k]`    emission variance of feature k in state i
//!
//! All recursions (forward, backward) run in log space so long utterances do
//! not underflow.

use std::f64::consts::PI;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::domain::{CovarianceKind, FlatSequences};
use crate::error::{ScoreError, TrainError};
use crate::fit::FittedModel;
use crate::math::{ln_or_neg_inf, log_sum_exp};

/// A fitted Gaussian HMM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianHmm {
    n_components: usize,
    n_features: usize,
    covariance: CovarianceKind,
    startprob: Vec<f64>,
    transmat: Vec<f64>,
    means: Vec<f64>,
    variances: Vec<f64>,
}

/// Per-utterance forward/backward lattice (`t * n + i` indexing).
pub(crate) struct Lattice {
    pub log_emission: Vec<f64>,
    pub alpha: Vec<f64>,
    pub beta: Vec<f64>,
    pub log_likelihood: f64,
}

impl GaussianHmm {
    /// Assemble a model from raw parameters and validate it.
    pub fn from_parts(
        covariance: CovarianceKind,
        startprob: Vec<f64>,
        transmat: Vec<f64>,
        means: DMatrix<f64>,
        variances: DMatrix<f64>,
    ) -> Result<Self, TrainError> {
        let n = startprob.len();
        let d = means.ncols();
        if n == 0 || d == 0 {
            return Err(TrainError::InvalidRequest(
                "model needs at least one state and one feature".to_string(),
            ));
        }
        if transmat.len() != n * n
            || means.nrows() != n
            || variances.nrows() != n
            || variances.ncols() != d
        {
            return Err(TrainError::InvalidRequest(format!(
                "parameter shapes disagree for {n} states x {d} features"
            )));
        }

        let model = Self {
            n_components: n,
            n_features: d,
            covariance,
            startprob,
            transmat,
            means: row_major(&means),
            variances: row_major(&variances),
        };
        model.validate()?;
        Ok(model)
    }

    /// Check that every parameter is finite and every distribution sums to one.
    pub fn validate(&self) -> Result<(), TrainError> {
        const TOL: f64 = 1e-6;
        let n = self.n_components;

        let all_finite = self
            .startprob
            .iter()
            .chain(&self.transmat)
            .chain(&self.means)
            .chain(&self.variances)
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(TrainError::NonFinite("model parameters are not finite".to_string()));
        }

        let start_sum: f64 = self.startprob.iter().sum();
        if (start_sum - 1.0).abs() > TOL {
            return Err(TrainError::NonFinite(format!(
                "start probabilities sum to {start_sum}"
            )));
        }
        for i in 0..n {
            let row_sum: f64 = self.transmat[i * n..(i + 1) * n].iter().sum();
            if (row_sum - 1.0).abs() > TOL {
                return Err(TrainError::NonFinite(format!(
                    "transition row {i} sums to {row_sum}"
                )));
            }
        }
        if self.variances.iter().any(|&v| v <= 0.0) {
            return Err(TrainError::NonFinite("non-positive emission variance".to_string()));
        }
        Ok(())
    }

    pub fn transmat(&self) -> &[f64] {
        &self.transmat
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn variances(&self) -> &[f64] {
        &self.variances
    }

    /// Free parameter count used by BIC: `n² + 2·n·D − 1`.
    pub fn free_parameters(&self) -> usize {
        free_parameters(self.n_components, self.n_features)
    }

    /// Log density of frame `row` of `obs` under state `state`.
    fn log_emission(&self, obs: &DMatrix<f64>, row: usize, state: usize) -> f64 {
        let d = self.n_features;
        let base = state * d;
        let mut acc = 0.0;
        for k in 0..d {
            let var = self.variances[base + k];
            let diff = obs[(row, k)] - self.means[base + k];
            acc += (2.0 * PI * var).ln() + diff * diff / var;
        }
        -0.5 * acc
    }

    fn log_transmat(&self) -> Vec<f64> {
        self.transmat.iter().map(|&p| ln_or_neg_inf(p)).collect()
    }

    /// Forward pass only; returns the utterance log-likelihood.
    pub(crate) fn forward_log_likelihood(&self, obs: &DMatrix<f64>, start: usize, len: usize) -> f64 {
        if len == 0 {
            return 0.0;
        }
        let n = self.n_components;
        let log_a = self.log_transmat();
        let mut alpha: Vec<f64> = (0..n)
            .map(|i| ln_or_neg_inf(self.startprob[i]) + self.log_emission(obs, start, i))
            .collect();
        let mut next = vec![0.0; n];
        let mut terms = vec![0.0; n];
        for t in 1..len {
            for j in 0..n {
                for i in 0..n {
                    terms[i] = alpha[i] + log_a[i * n + j];
                }
                next[j] = log_sum_exp(&terms) + self.log_emission(obs, start + t, j);
            }
            std::mem::swap(&mut alpha, &mut next);
        }
        log_sum_exp(&alpha)
    }

    /// Full forward/backward lattice for one utterance (used by Baum–Welch).
    pub(crate) fn lattice(&self, obs: &DMatrix<f64>, start: usize, len: usize) -> Lattice {
        let n = self.n_components;
        let log_a = self.log_transmat();

        let mut log_emission = vec![0.0; len * n];
        for t in 0..len {
            for i in 0..n {
                log_emission[t * n + i] = self.log_emission(obs, start + t, i);
            }
        }

        let mut terms = vec![0.0; n];
        let mut alpha = vec![f64::NEG_INFINITY; len * n];
        for i in 0..n {
            alpha[i] = ln_or_neg_inf(self.startprob[i]) + log_emission[i];
        }
        for t in 1..len {
            for j in 0..n {
                for i in 0..n {
                    terms[i] = alpha[(t - 1) * n + i] + log_a[i * n + j];
                }
                alpha[t * n + j] = log_sum_exp(&terms) + log_emission[t * n + j];
            }
        }

        let mut beta = vec![f64::NEG_INFINITY; len * n];
        for i in 0..n {
            beta[(len - 1) * n + i] = 0.0;
        }
        for t in (0..len.saturating_sub(1)).rev() {
            for i in 0..n {
                for j in 0..n {
                    terms[j] = log_a[i * n + j] + log_emission[(t + 1) * n + j] + beta[(t + 1) * n + j];
                }
                beta[t * n + i] = log_sum_exp(&terms);
            }
        }

        let log_likelihood = log_sum_exp(&alpha[(len - 1) * n..]);
        Lattice {
            log_emission,
            alpha,
            beta,
            log_likelihood,
        }
    }
}

impl FittedModel for GaussianHmm {
    fn n_components(&self) -> usize {
        self.n_components
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn score(&self, data: &FlatSequences) -> Result<f64, ScoreError> {
        if data.n_features() != self.n_features {
            return Err(ScoreError::DimensionMismatch {
                expected: self.n_features,
                actual: data.n_features(),
            });
        }
        if !data.lengths_consistent() {
            return Err(ScoreError::LengthMismatch {
                expected: data.lengths.iter().sum(),
                actual: data.n_frames(),
            });
        }
        if data.n_frames() == 0 {
            return Err(ScoreError::Empty);
        }

        let total: f64 = data
            .spans()
            .map(|(start, len)| self.forward_log_likelihood(&data.observations, start, len))
            .sum();
        if total.is_finite() {
            Ok(total)
        } else {
            Err(ScoreError::NonFinite)
        }
    }
}

/// Free parameter count of an n-state, D-feature diagonal Gaussian HMM.
pub fn free_parameters(n_components: usize, n_features: usize) -> usize {
    (n_components * n_components + 2 * n_components * n_features).saturating_sub(1)
}

fn row_major(m: &DMatrix<f64>) -> Vec<f64> {
    let mut out = Vec::with_capacity(m.len());
    for i in 0..m.nrows() {
        out.extend(m.row(i).iter().copied());
    }
    out
}
