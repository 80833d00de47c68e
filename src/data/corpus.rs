//! Per-word corpus: utterance index plus the matching flat index.
//!
//! `Corpus` owns both views of the data so they cannot drift apart: the flat
//! index is always derived from the utterance index with `combine`.

use std::collections::BTreeMap;

use nalgebra::DMatrix;

use crate::domain::{FlatSequences, SelectorConfig, Utterance, WordFlatIndex, WordSequenceIndex};
use crate::error::AppError;
use crate::fit::SelectionContext;

/// Combine the utterances at `indices` into one flat batch.
///
/// Frame order within each utterance is preserved and utterances appear in the
/// order of `indices`, so `lengths.len() == indices.len()`. All frames must have
/// the same dimensionality; an empty selection yields a `0 × 0` batch.
pub fn combine(indices: &[usize], sequences: &[Utterance]) -> FlatSequences {
    let n_features = indices
        .iter()
        .filter_map(|&i| sequences[i].first())
        .map(|frame| frame.len())
        .next()
        .unwrap_or(0);

    let lengths: Vec<usize> = indices.iter().map(|&i| sequences[i].len()).collect();
    let n_frames: usize = lengths.iter().sum();

    let mut observations = DMatrix::<f64>::zeros(n_frames, n_features);
    let mut row = 0;
    for &i in indices {
        for frame in &sequences[i] {
            for (k, &v) in frame.iter().take(n_features).enumerate() {
                observations[(row, k)] = v;
            }
            row += 1;
        }
    }

    FlatSequences::new(observations, lengths)
}

/// Combine every utterance of a word.
pub fn combine_all(sequences: &[Utterance]) -> FlatSequences {
    let indices: Vec<usize> = (0..sequences.len()).collect();
    combine(&indices, sequences)
}

/// Read-only training data for all words.
#[derive(Debug, Clone)]
pub struct Corpus {
    sequences: WordSequenceIndex,
    flat: WordFlatIndex,
    n_features: usize,
}

impl Corpus {
    /// Build a corpus from per-word utterances.
    ///
    /// Rejects empty input, words without utterances, empty utterances and
    /// frames whose dimensionality differs from the first frame seen.
    pub fn from_sequences(sequences: WordSequenceIndex) -> Result<Self, AppError> {
        let mut n_features = None;
        for (word, utterances) in &sequences {
            if utterances.is_empty() {
                return Err(AppError::new(3, format!("Word '{word}' has no utterances.")));
            }
            for (u, utterance) in utterances.iter().enumerate() {
                if utterance.is_empty() {
                    return Err(AppError::new(
                        2,
                        format!("Word '{word}' utterance {u} has no frames."),
                    ));
                }
                for frame in utterance {
                    if frame.is_empty() {
                        return Err(AppError::new(
                            2,
                            format!("Word '{word}' utterance {u}: frame has no features."),
                        ));
                    }
                    let d = *n_features.get_or_insert(frame.len());
                    if frame.len() != d {
                        return Err(AppError::new(
                            2,
                            format!(
                                "Word '{word}' utterance {u}: frame has {} features, expected {d}.",
                                frame.len()
                            ),
                        ));
                    }
                    if frame.iter().any(|v| !v.is_finite()) {
                        return Err(AppError::new(
                            2,
                            format!("Word '{word}' utterance {u}: non-finite feature value."),
                        ));
                    }
                }
            }
        }
        let Some(n_features) = n_features else {
            return Err(AppError::new(3, "Corpus has no words."));
        };

        let flat: WordFlatIndex = sequences
            .iter()
            .map(|(word, utterances)| (word.clone(), combine_all(utterances)))
            .collect();

        Ok(Self {
            sequences,
            flat,
            n_features,
        })
    }

    pub fn sequences(&self) -> &WordSequenceIndex {
        &self.sequences
    }

    pub fn flat(&self) -> &WordFlatIndex {
        &self.flat
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_words(&self) -> usize {
        self.sequences.len()
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.sequences.keys().map(String::as_str)
    }

    /// Total utterance count across words.
    pub fn n_utterances(&self) -> usize {
        self.sequences.values().map(Vec::len).sum()
    }

    /// Bind one word's data and a configuration for a `select()` call.
    pub fn context<'a>(
        &'a self,
        word: &'a str,
        config: &'a SelectorConfig,
    ) -> Result<SelectionContext<'a>, AppError> {
        let (Some(sequences), Some(flat)) = (self.sequences.get(word), self.flat.get(word)) else {
            return Err(AppError::new(2, format!("Unknown word '{word}'.")));
        };
        Ok(SelectionContext {
            word,
            sequences,
            flat,
            all_flat: &self.flat,
            config,
        })
    }

    /// Split off the last utterance of every word that has at least two.
    ///
    /// Returns `(train, test)` where `test` holds `(word, utterance)` pairs.
    /// Words with a single utterance stay entirely in `train`.
    pub fn hold_out_last(&self) -> Result<(Corpus, Vec<(String, Utterance)>), AppError> {
        let mut train = BTreeMap::new();
        let mut test = Vec::new();
        for (word, utterances) in &self.sequences {
            let mut utterances = utterances.clone();
            if utterances.len() >= 2 {
                if let Some(last) = utterances.pop() {
                    test.push((word.clone(), last));
                }
            }
            train.insert(word.clone(), utterances);
        }
        Ok((Corpus::from_sequences(train)?, test))
    }
}
