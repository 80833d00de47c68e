//! Synthetic word corpus generation.
//!
//! Each word gets a hidden left-to-right "gesture template": a few regimes,
//! each with its own mean feature vector. An utterance walks the regimes in
//! order, dwelling a random number of frames in each, and emits Gaussian noise
//! around the regime mean. Words therefore have a true state count (the number
//! of regimes) that the selectors can try to recover.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Utterance, WordSequenceIndex};
use crate::error::AppError;

/// Default vocabulary for synthetic corpora.
pub const DEFAULT_WORDS: [&str; 8] = [
    "BOOK", "CHOCOLATE", "FISH", "GO", "JOHN", "LOVE", "MARY", "VEGETABLE",
];

/// Knobs for synthetic corpus generation.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub words: Vec<String>,
    pub n_features: usize,
    pub utterances_min: usize,
    pub utterances_max: usize,
    pub regimes_min: usize,
    pub regimes_max: usize,
    pub dwell_min: usize,
    pub dwell_max: usize,
    /// Spread of regime means.
    pub mean_scale: f64,
    /// Emission noise (standard deviation) around each regime mean.
    pub noise: f64,
    pub seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            words: DEFAULT_WORDS.iter().map(|w| w.to_string()).collect(),
            n_features: 2,
            utterances_min: 2,
            utterances_max: 8,
            regimes_min: 2,
            regimes_max: 5,
            dwell_min: 3,
            dwell_max: 8,
            mean_scale: 20.0,
            noise: 1.0,
            seed: 42,
        }
    }
}

/// Generated corpus plus the true regime count per word.
#[derive(Debug, Clone)]
pub struct SampleCorpus {
    pub sequences: WordSequenceIndex,
    pub true_states: Vec<(String, usize)>,
}

pub fn generate_corpus(config: &SampleConfig) -> Result<SampleCorpus, AppError> {
    if config.words.is_empty() {
        return Err(AppError::new(2, "Synthetic corpus needs at least one word."));
    }
    if config.n_features == 0 {
        return Err(AppError::new(2, "Feature dimensionality must be > 0."));
    }
    if config.utterances_min == 0 || config.utterances_max < config.utterances_min {
        return Err(AppError::new(2, "Invalid utterance count range."));
    }
    if config.regimes_min == 0 || config.regimes_max < config.regimes_min {
        return Err(AppError::new(2, "Invalid regime count range."));
    }
    if config.dwell_min == 0 || config.dwell_max < config.dwell_min {
        return Err(AppError::new(2, "Invalid dwell range."));
    }
    if !(config.noise.is_finite() && config.noise > 0.0 && config.mean_scale.is_finite()) {
        return Err(AppError::new(2, "Invalid noise settings."));
    }

    let noise = Normal::new(0.0, config.noise)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut sequences = WordSequenceIndex::new();
    let mut true_states = Vec::with_capacity(config.words.len());

    for word in &config.words {
        // Per-word RNG so adding a word does not reshuffle the others.
        let mut rng = StdRng::seed_from_u64(word_seed(word, config.seed));

        let n_regimes = rng.gen_range(config.regimes_min..=config.regimes_max);
        let template: Vec<Vec<f64>> = (0..n_regimes)
            .map(|_| {
                (0..config.n_features)
                    .map(|_| rng.gen_range(-config.mean_scale..=config.mean_scale))
                    .collect()
            })
            .collect();

        let n_utterances = rng.gen_range(config.utterances_min..=config.utterances_max);
        let utterances: Vec<Utterance> = (0..n_utterances)
            .map(|_| generate_utterance(&template, config, &noise, &mut rng))
            .collect();

        sequences.insert(word.clone(), utterances);
        true_states.push((word.clone(), n_regimes));
    }

    Ok(SampleCorpus {
        sequences,
        true_states,
    })
}

fn generate_utterance(
    template: &[Vec<f64>],
    config: &SampleConfig,
    noise: &Normal<f64>,
    rng: &mut StdRng,
) -> Utterance {
    let mut frames = Vec::new();
    for mean in template {
        let dwell = rng.gen_range(config.dwell_min..=config.dwell_max);
        for _ in 0..dwell {
            frames.push(mean.iter().map(|m| m + noise.sample(rng)).collect());
        }
    }
    frames
}

fn word_seed(word: &str, seed: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    word.hash(&mut hasher);
    seed.hash(&mut hasher);
    hasher.finish()
}
