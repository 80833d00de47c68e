//! Model selection: per-word context, the shared fit helper, and dispatch.
//!
//! Every strategy implements `ModelSelector` and composes a `BaseSelector`,
//! which is the only place the trainer is invoked. The helper turns every
//! trainer outcome (including a panic) into a `Result`, so a failing state
//! count is just another candidate outcome inside the search loop.
//!
//! The caller-visible result of a selection is a fitted model or none; the
//! per-candidate trace is kept alongside for reporting.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, info};

use crate::domain::{
    CovarianceKind, FlatSequences, SelectorConfig, SelectorKind, TRAINER_MAX_ITER, Utterance,
    WordFlatIndex,
};
use crate::error::{ScoreError, TrainError};
use crate::fit::strategies::{BicSelector, ConstantSelector, CvSelector, DicSelector};
use crate::fit::trainer::{FittedModel, TrainRequest, Trainer};

/// Everything one `select()` call may read. Immutable for the call's lifetime.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    pub word: &'a str,
    /// This word's utterances.
    pub sequences: &'a [Utterance],
    /// This word's utterances combined.
    pub flat: &'a FlatSequences,
    /// Every word's combined utterances (DIC scores against the others).
    pub all_flat: &'a WordFlatIndex,
    pub config: &'a SelectorConfig,
}

/// What happened to one candidate state count.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateOutcome {
    /// Criterion value (scale depends on the strategy).
    Scored(f64),
    /// Fitted but not scored (constant strategy).
    Fitted,
    TrainFailed(TrainError),
    ScoreFailed(ScoreError),
    /// DIC with no competing words to compare against.
    NoOtherWords,
    /// CV where no fold was both fitted and scored (mean is `-inf`).
    NoFoldScored { last_error: Option<String> },
}

impl CandidateOutcome {
    pub fn score(&self) -> Option<f64> {
        match self {
            CandidateOutcome::Scored(v) => Some(*v),
            _ => None,
        }
    }

    /// Short status label for reports and exports.
    pub fn label(&self) -> String {
        match self {
            CandidateOutcome::Scored(_) => "scored".to_string(),
            CandidateOutcome::Fitted => "fitted".to_string(),
            CandidateOutcome::TrainFailed(e) => format!("train failed: {e}"),
            CandidateOutcome::ScoreFailed(e) => format!("score failed: {e}"),
            CandidateOutcome::NoOtherWords => "no other words".to_string(),
            CandidateOutcome::NoFoldScored { last_error: Some(e) } => format!("no fold scored: {e}"),
            CandidateOutcome::NoFoldScored { last_error: None } => "no folds".to_string(),
        }
    }
}

/// One (state count, outcome) pair of a search.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub n_components: usize,
    pub outcome: CandidateOutcome,
}

/// Output of one `select()` call.
#[derive(Debug, Clone)]
pub struct Selection<M> {
    pub kind: SelectorKind,
    pub word: String,
    pub model: Option<M>,
    /// Candidates in search order.
    pub candidates: Vec<CandidateScore>,
    /// True when the result came from the constant fallback.
    pub fell_back: bool,
}

impl<M: FittedModel> Selection<M> {
    /// State count of the returned model, if any.
    pub fn n_components(&self) -> Option<usize> {
        self.model.as_ref().map(FittedModel::n_components)
    }

    /// Index of the candidate the returned model came from.
    ///
    /// After a fallback that is always the last (constant) candidate, even if
    /// the same state count also failed inside the search range.
    pub fn chosen_index(&self) -> Option<usize> {
        self.model.as_ref()?;
        if self.fell_back {
            return self.candidates.len().checked_sub(1);
        }
        let n = self.n_components()?;
        self.candidates.iter().position(|c| {
            c.n_components == n
                && (c.outcome.score().is_some() || c.outcome == CandidateOutcome::Fitted)
        })
    }

    /// Criterion value of the winning candidate (none for constant/fallback).
    pub fn best_score(&self) -> Option<f64> {
        if self.fell_back {
            return None;
        }
        let n = self.n_components()?;
        self.candidates
            .iter()
            .find(|c| c.n_components == n && c.outcome.score().is_some())
            .and_then(|c| c.outcome.score())
    }
}

/// A model-selection strategy bound to one word.
pub trait ModelSelector {
    type Model: FittedModel;

    fn kind(&self) -> SelectorKind;

    /// Run the search and keep the per-candidate trace.
    fn select_traced(&self) -> Selection<Self::Model>;

    /// Run the search; the best fitted model, or none.
    fn select(&self) -> Option<Self::Model> {
        self.select_traced().model
    }
}

/// Shared helper: per-word context plus the single entry point to the trainer.
pub struct BaseSelector<'a, T: Trainer> {
    ctx: SelectionContext<'a>,
    trainer: &'a T,
}

impl<T: Trainer> Clone for BaseSelector<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Trainer> Copy for BaseSelector<'_, T> {}

impl<'a, T: Trainer> BaseSelector<'a, T> {
    pub fn new(ctx: SelectionContext<'a>, trainer: &'a T) -> Self {
        Self { ctx, trainer }
    }

    pub fn context(&self) -> &SelectionContext<'a> {
        &self.ctx
    }

    pub fn config(&self) -> &'a SelectorConfig {
        self.ctx.config
    }

    /// Trainer request for `n_components` states: diagonal covariance, fixed
    /// iteration cap, configured seed.
    pub fn request(&self, n_components: usize) -> TrainRequest {
        TrainRequest {
            n_components,
            covariance: CovarianceKind::Diag,
            max_iter: TRAINER_MAX_ITER,
            random_state: self.ctx.config.random_state,
        }
    }

    /// Fit on this word's combined utterances.
    pub fn fit(&self, n_components: usize) -> Result<T::Model, TrainError> {
        self.fit_on(self.ctx.flat, n_components)
    }

    /// Fit on an arbitrary batch (cross-validation training folds).
    pub fn fit_on(&self, data: &FlatSequences, n_components: usize) -> Result<T::Model, TrainError> {
        let request = self.request(n_components);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.trainer.fit(data, &request)))
            .unwrap_or_else(|payload| Err(TrainError::Panicked(panic_message(payload.as_ref()))));

        let word = self.ctx.word;
        match &outcome {
            Ok(_) if self.ctx.config.verbose => {
                info!(word, n_components, "model created");
            }
            Err(e) if self.ctx.config.verbose => {
                info!(word, n_components, error = %e, "fit failed");
            }
            Ok(_) => debug!(word, n_components, "model created"),
            Err(e) => debug!(word, n_components, error = %e, "fit failed"),
        }
        outcome
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run the strategy `kind` for the word bound in `ctx`.
pub fn select_with<T: Trainer>(
    kind: SelectorKind,
    ctx: SelectionContext<'_>,
    trainer: &T,
) -> Selection<T::Model> {
    let base = BaseSelector::new(ctx, trainer);
    match kind {
        SelectorKind::Constant => ConstantSelector::new(base).select_traced(),
        SelectorKind::Bic => BicSelector::new(base).select_traced(),
        SelectorKind::Dic => DicSelector::new(base).select_traced(),
        SelectorKind::Cv => CvSelector::new(base).select_traced(),
    }
}
