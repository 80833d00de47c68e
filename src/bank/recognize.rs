//! Recognize utterances against a model bank.
//!
//! Every utterance is scored under every word model; the guess is the word
//! with the highest log-likelihood. Models that cannot score an utterance are
//! left out of its probability table.

use std::collections::BTreeMap;

use tracing::debug;

use crate::bank::ModelBank;
use crate::data::combine_all;
use crate::domain::Utterance;
use crate::fit::FittedModel;

/// Result of recognizing one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    /// Word the utterance really is.
    pub expected: String,
    /// Best-scoring word, none when no model could score it.
    pub guess: Option<String>,
    /// Log-likelihood per word model that scored it.
    pub log_likelihoods: BTreeMap<String, f64>,
}

impl Recognition {
    pub fn is_correct(&self) -> bool {
        self.guess.as_deref() == Some(self.expected.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionReport {
    pub results: Vec<Recognition>,
}

impl RecognitionReport {
    pub fn n_correct(&self) -> usize {
        self.results.iter().filter(|r| r.is_correct()).count()
    }

    /// Fraction of utterances guessed wrong (unrecognized counts as wrong).
    ///
    /// An empty test set has a WER of 0.
    pub fn word_error_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        let wrong = self.results.len() - self.n_correct();
        wrong as f64 / self.results.len() as f64
    }
}

/// Score one utterance under every model in the bank.
pub fn recognize_one<M: FittedModel>(bank: &ModelBank<M>, expected: &str, utterance: &Utterance) -> Recognition {
    let flat = combine_all(std::slice::from_ref(utterance));
    let mut log_likelihoods = BTreeMap::new();

    for (word, model) in bank.models() {
        match model.score(&flat) {
            Ok(ll) => {
                log_likelihoods.insert(word.to_string(), ll);
            }
            Err(e) => debug!(word, error = %e, "model could not score utterance"),
        }
    }

    // Ties keep the alphabetically first word.
    let guess = log_likelihoods
        .iter()
        .fold(None::<(&String, f64)>, |best, (word, &ll)| match best {
            Some((_, b)) if ll <= b => best,
            _ => Some((word, ll)),
        })
        .map(|(word, _)| word.clone());

    Recognition {
        expected: expected.to_string(),
        guess,
        log_likelihoods,
    }
}

/// Recognize every `(word, utterance)` pair of a test set.
pub fn recognize<M: FittedModel>(bank: &ModelBank<M>, test: &[(String, Utterance)]) -> RecognitionReport {
    let results = test
        .iter()
        .map(|(word, utterance)| recognize_one(bank, word, utterance))
        .collect();
    RecognitionReport { results }
}
