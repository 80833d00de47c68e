//! Test doubles for the trainer seam.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::data::Corpus;
use crate::domain::{FlatSequences, WordSequenceIndex};
use crate::error::{ScoreError, TrainError};
use crate::fit::trainer::{FittedModel, TrainRequest, Trainer};

type Script = dyn Fn(usize, &FlatSequences) -> Result<f64, TrainError> + Send + Sync;
type ScoreScript = dyn Fn(usize, &FlatSequences) -> bool + Send + Sync;

/// A trainer whose outcome is scripted per (state count, training data).
///
/// On success the script returns a per-frame log-likelihood `r`; the model
/// then scores any batch as `r * n_frames`, unless the score-failure script
/// rejects (state count, batch). Every request is recorded.
pub struct ScriptedTrainer {
    script: Box<Script>,
    score_fails: Option<Arc<ScoreScript>>,
    calls: Mutex<Vec<TrainRequest>>,
}

impl ScriptedTrainer {
    pub fn new(
        script: impl Fn(usize, &FlatSequences) -> Result<f64, TrainError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            score_fails: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Models fail to score any batch for which `fails(n_components, batch)` holds.
    pub fn fail_scoring(
        mut self,
        fails: impl Fn(usize, &FlatSequences) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.score_fails = Some(Arc::new(fails));
        self
    }

    /// State counts requested so far, in order.
    pub fn requested(&self) -> Vec<usize> {
        self.calls
            .lock()
            .map(|calls| calls.iter().map(|r| r.n_components).collect())
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct ScriptedModel {
    pub n_components: usize,
    pub n_features: usize,
    pub per_frame: f64,
    /// Frame count of the batch the model was trained on.
    pub trained_frames: usize,
    score_fails: Option<Arc<ScoreScript>>,
}

impl PartialEq for ScriptedModel {
    fn eq(&self, other: &Self) -> bool {
        self.n_components == other.n_components
            && self.n_features == other.n_features
            && self.per_frame == other.per_frame
            && self.trained_frames == other.trained_frames
    }
}

impl fmt::Debug for ScriptedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedModel")
            .field("n_components", &self.n_components)
            .field("n_features", &self.n_features)
            .field("per_frame", &self.per_frame)
            .field("trained_frames", &self.trained_frames)
            .finish()
    }
}

impl FittedModel for ScriptedModel {
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
        if let Some(fails) = &self.score_fails {
            if fails(self.n_components, data) {
                return Err(ScoreError::NonFinite);
            }
        }
        Ok(self.per_frame * data.n_frames() as f64)
    }
}

impl Trainer for ScriptedTrainer {
    type Model = ScriptedModel;

    fn fit(&self, data: &FlatSequences, request: &TrainRequest) -> Result<ScriptedModel, TrainError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(*request);
        }
        let per_frame = (self.script)(request.n_components, data)?;
        Ok(ScriptedModel {
            n_components: request.n_components,
            n_features: data.n_features(),
            per_frame,
            trained_frames: data.n_frames(),
            score_fails: self.score_fails.clone(),
        })
    }
}

/// One-feature corpus: each word gets utterances with the given frame counts.
pub fn corpus_of(words: &[(&str, &[usize])]) -> Corpus {
    let mut index = WordSequenceIndex::new();
    for (w, lengths) in words {
        let utterances = lengths
            .iter()
            .enumerate()
            .map(|(u, &len)| (0..len).map(|t| vec![(u * 10 + t) as f64]).collect())
            .collect();
        index.insert(w.to_string(), utterances);
    }
    Corpus::from_sequences(index).expect("test corpus is valid")
}
