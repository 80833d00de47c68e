//! Default trainer: Baum–Welch (EM) for a Gaussian-emission HMM.
//!
//! Given:
//! - a flat observation matrix (frames × features) plus per-utterance lengths
//! - a requested state count, covariance shape, iteration cap and seed
//!
//! we:
//! - initialise means with seeded k-means, variances from the data, uniform
//!   start/transition probabilities
//! - alternate E-steps (log-space forward/backward per utterance) and M-steps
//!   until the log-likelihood gain drops below `tol` or `max_iter` is reached
//!
//! Numerical collapse (a state losing all posterior mass, a transition row with
//! no outgoing mass, a non-finite likelihood) is reported as
//! `TrainError::NonFinite` rather than producing a broken model.

use nalgebra::DMatrix;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::trace;

use crate::domain::{CovarianceKind, FlatSequences};
use crate::error::TrainError;
use crate::fit::trainer::{FittedModel, TrainRequest, Trainer};
use crate::math::{kmeans, ln_or_neg_inf};
use crate::models::GaussianHmm;

/// Iteration cap for the k-means initialisation.
const KMEANS_MAX_ITER: usize = 100;

/// Baum–Welch trainer for `GaussianHmm`.
#[derive(Debug, Clone)]
pub struct GaussianHmmTrainer {
    /// Stop once the per-iteration log-likelihood gain falls below this.
    pub tol: f64,
    /// Floor added to every emission variance.
    pub min_covar: f64,
}

impl Default for GaussianHmmTrainer {
    fn default() -> Self {
        Self {
            tol: 1e-2,
            min_covar: 1e-3,
        }
    }
}

/// Sufficient statistics accumulated over one E-step.
struct Stats {
    log_likelihood: f64,
    start: Vec<f64>,
    trans: Vec<f64>,
    post: Vec<f64>,
    obs: DMatrix<f64>,
    obs_sq: DMatrix<f64>,
}

impl Trainer for GaussianHmmTrainer {
    type Model = GaussianHmm;

    fn fit(&self, data: &FlatSequences, request: &TrainRequest) -> Result<GaussianHmm, TrainError> {
        let n = request.n_components;
        if n == 0 {
            return Err(TrainError::InvalidRequest("state count must be >= 1".to_string()));
        }
        if data.n_features() == 0 {
            return Err(TrainError::InvalidRequest("observations have no features".to_string()));
        }
        if !data.lengths_consistent() {
            return Err(TrainError::LengthMismatch {
                expected: data.lengths.iter().sum(),
                actual: data.n_frames(),
            });
        }
        if data.n_frames() < n {
            return Err(TrainError::InsufficientData {
                frames: data.n_frames(),
                n_components: n,
            });
        }
        if data.observations.iter().any(|v| !v.is_finite()) {
            return Err(TrainError::NonFinite("observations contain non-finite values".to_string()));
        }

        let mut model = self.initial_model(data, request)?;
        let mut prev_ll = f64::NEG_INFINITY;

        for iter in 0..request.max_iter.max(1) {
            let stats = self.e_step(&model, data);
            if !stats.log_likelihood.is_finite() {
                return Err(TrainError::NonFinite(format!(
                    "log-likelihood diverged at iteration {iter}"
                )));
            }
            model = self.m_step(&model, &stats, request.covariance)?;

            let gain = stats.log_likelihood - prev_ll;
            trace!(iter, log_likelihood = stats.log_likelihood, gain, "baum-welch iteration");
            if gain < self.tol {
                break;
            }
            prev_ll = stats.log_likelihood;
        }

        Ok(model)
    }
}

impl GaussianHmmTrainer {
    fn initial_model(&self, data: &FlatSequences, request: &TrainRequest) -> Result<GaussianHmm, TrainError> {
        let n = request.n_components;
        let d = data.n_features();
        let mut rng = StdRng::seed_from_u64(request.random_state);

        let means = kmeans(&data.observations, n, &mut rng, KMEANS_MAX_ITER).ok_or(
            TrainError::InsufficientData {
                frames: data.n_frames(),
                n_components: n,
            },
        )?;

        // Start every state from the pooled data variance.
        let frames = data.n_frames() as f64;
        let mut pooled = vec![0.0; d];
        for (k, slot) in pooled.iter_mut().enumerate() {
            let col = data.observations.column(k);
            let mean = col.sum() / frames;
            let var = col.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / frames;
            *slot = var + self.min_covar;
        }
        let variances = DMatrix::from_fn(n, d, |_, k| pooled[k]);

        GaussianHmm::from_parts(
            request.covariance,
            vec![1.0 / n as f64; n],
            vec![1.0 / n as f64; n * n],
            means,
            variances,
        )
    }

    fn e_step(&self, model: &GaussianHmm, data: &FlatSequences) -> Stats {
        let n = model.n_components();
        let d = model.n_features();
        let obs = &data.observations;
        let log_a: Vec<f64> = model.transmat().iter().map(|&p| ln_or_neg_inf(p)).collect();

        let mut stats = Stats {
            log_likelihood: 0.0,
            start: vec![0.0; n],
            trans: vec![0.0; n * n],
            post: vec![0.0; n],
            obs: DMatrix::zeros(n, d),
            obs_sq: DMatrix::zeros(n, d),
        };

        for (start, len) in data.spans() {
            if len == 0 {
                continue;
            }
            let lattice = model.lattice(obs, start, len);
            let ll = lattice.log_likelihood;
            stats.log_likelihood += ll;
            if !ll.is_finite() {
                continue;
            }

            for t in 0..len {
                for i in 0..n {
                    let gamma = (lattice.alpha[t * n + i] + lattice.beta[t * n + i] - ll).exp();
                    if t == 0 {
                        stats.start[i] += gamma;
                    }
                    stats.post[i] += gamma;
                    for k in 0..d {
                        let x = obs[(start + t, k)];
                        stats.obs[(i, k)] += gamma * x;
                        stats.obs_sq[(i, k)] += gamma * x * x;
                    }
                }
            }

            for t in 0..len - 1 {
                for i in 0..n {
                    let a = lattice.alpha[t * n + i];
                    for j in 0..n {
                        let next = lattice.log_emission[(t + 1) * n + j] + lattice.beta[(t + 1) * n + j];
                        stats.trans[i * n + j] += (a + log_a[i * n + j] + next - ll).exp();
                    }
                }
            }
        }

        stats
    }

    fn m_step(
        &self,
        model: &GaussianHmm,
        stats: &Stats,
        covariance: CovarianceKind,
    ) -> Result<GaussianHmm, TrainError> {
        let n = model.n_components();
        let d = model.n_features();

        let start_total: f64 = stats.start.iter().sum();
        if !(start_total > 0.0) {
            return Err(TrainError::NonFinite("no start-state posterior mass".to_string()));
        }
        let startprob: Vec<f64> = stats.start.iter().map(|v| v / start_total).collect();

        let mut transmat = vec![0.0; n * n];
        for i in 0..n {
            let row = &stats.trans[i * n..(i + 1) * n];
            let total: f64 = row.iter().sum();
            if !(total > 0.0) {
                return Err(TrainError::NonFinite(format!(
                    "state {i} has no outgoing transition mass"
                )));
            }
            for j in 0..n {
                transmat[i * n + j] = row[j] / total;
            }
        }

        let mut means = DMatrix::zeros(n, d);
        let mut variances = DMatrix::zeros(n, d);
        for i in 0..n {
            let post = stats.post[i];
            if !(post > f64::MIN_POSITIVE) {
                return Err(TrainError::NonFinite(format!("state {i} has no posterior mass")));
            }
            for k in 0..d {
                let mean = stats.obs[(i, k)] / post;
                let var = (stats.obs_sq[(i, k)] / post - mean * mean).max(0.0);
                means[(i, k)] = mean;
                variances[(i, k)] = var + self.min_covar;
            }
        }

        GaussianHmm::from_parts(covariance, startprob, transmat, means, variances)
    }
}
