//! The four selection strategies.
//!
//! - Constant: always `n_constant` states
//! - BIC: `−2·L(n) + p(n)·ln(N)` on all of the word's data, lowest wins
//! - DIC: own log-likelihood minus mean log-likelihood of every other word,
//!   highest wins
//! - CV: mean held-out log-likelihood over k folds, highest wins
//!
//! BIC/DIC/CV share one search shape: walk `min..=max`, skip a state count
//! whose fit or score fails, replace the best only on strict improvement.

use tracing::debug;

use crate::data::{combine, combine_all};
use crate::domain::SelectorKind;
use crate::error::ScoreError;
use crate::fit::folds::{Fold, fold_count, k_fold};
use crate::fit::selection::{
    BaseSelector, CandidateOutcome, CandidateScore, ModelSelector, Selection,
};
use crate::fit::trainer::{FittedModel, Trainer};
use crate::models::free_parameters;

/// Bayesian Information Criterion for a diagonal Gaussian HMM.
///
/// `n_sequences` is the number of utterances N in `ln(N)`.
pub fn bic_score(log_likelihood: f64, n_components: usize, n_features: usize, n_sequences: usize) -> f64 {
    let p = free_parameters(n_components, n_features) as f64;
    -2.0 * log_likelihood + p * (n_sequences as f64).ln()
}

/// Running best of a search; `better(new, old)` decides strict improvement.
struct Best<M> {
    score: f64,
    model: Option<M>,
}

impl<M> Best<M> {
    fn new(initial: f64) -> Self {
        Self {
            score: initial,
            model: None,
        }
    }

    fn offer(&mut self, score: f64, model: M, better: impl Fn(f64, f64) -> bool) -> bool {
        if better(score, self.score) {
            self.score = score;
            self.model = Some(model);
            true
        } else {
            false
        }
    }
}

fn scored(n_components: usize, value: f64) -> CandidateScore {
    CandidateScore {
        n_components,
        outcome: CandidateOutcome::Scored(value),
    }
}

fn candidate(n_components: usize, outcome: CandidateOutcome) -> CandidateScore {
    CandidateScore {
        n_components,
        outcome,
    }
}

// ---------------------------------------------------------------------------
// Constant
// ---------------------------------------------------------------------------

pub struct ConstantSelector<'a, T: Trainer> {
    base: BaseSelector<'a, T>,
}

impl<'a, T: Trainer> ConstantSelector<'a, T> {
    pub fn new(base: BaseSelector<'a, T>) -> Self {
        Self { base }
    }
}

impl<T: Trainer> ModelSelector for ConstantSelector<'_, T> {
    type Model = T::Model;

    fn kind(&self) -> SelectorKind {
        SelectorKind::Constant
    }

    fn select_traced(&self) -> Selection<T::Model> {
        let n = self.base.config().n_constant;
        let (model, outcome) = match self.base.fit(n) {
            Ok(model) => (Some(model), CandidateOutcome::Fitted),
            Err(e) => (None, CandidateOutcome::TrainFailed(e)),
        };
        Selection {
            kind: self.kind(),
            word: self.base.context().word.to_string(),
            model,
            candidates: vec![candidate(n, outcome)],
            fell_back: false,
        }
    }
}

// ---------------------------------------------------------------------------
// BIC
// ---------------------------------------------------------------------------

pub struct BicSelector<'a, T: Trainer> {
    base: BaseSelector<'a, T>,
}

impl<'a, T: Trainer> BicSelector<'a, T> {
    pub fn new(base: BaseSelector<'a, T>) -> Self {
        Self { base }
    }
}

impl<T: Trainer> ModelSelector for BicSelector<'_, T> {
    type Model = T::Model;

    fn kind(&self) -> SelectorKind {
        SelectorKind::Bic
    }

    fn select_traced(&self) -> Selection<T::Model> {
        let ctx = self.base.context();
        // BIC is an in-sample criterion: always all of the word's utterances.
        let working = combine_all(ctx.sequences);
        let n_sequences = ctx.sequences.len();

        let mut candidates = Vec::new();
        let mut best = Best::new(f64::INFINITY);

        for n in self.base.config().candidates() {
            let model = match self.base.fit_on(&working, n) {
                Ok(model) => model,
                Err(e) => {
                    candidates.push(candidate(n, CandidateOutcome::TrainFailed(e)));
                    continue;
                }
            };
            let log_likelihood = match model.score(&working) {
                Ok(v) => v,
                Err(e) => {
                    candidates.push(candidate(n, CandidateOutcome::ScoreFailed(e)));
                    continue;
                }
            };

            let bic = bic_score(log_likelihood, n, model.n_features(), n_sequences);
            if !bic.is_finite() {
                candidates.push(candidate(n, CandidateOutcome::ScoreFailed(ScoreError::NonFinite)));
                continue;
            }
            candidates.push(scored(n, bic));
            if best.offer(bic, model, |new, old| new < old) {
                debug!(word = ctx.word, n_components = n, bic, "new best BIC");
            }
        }

        if best.model.is_some() {
            return Selection {
                kind: self.kind(),
                word: ctx.word.to_string(),
                model: best.model,
                candidates,
                fell_back: false,
            };
        }

        debug!(word = ctx.word, "no BIC candidate scored, using constant fallback");
        let fallback = ConstantSelector::new(self.base).select_traced();
        candidates.extend(fallback.candidates);
        Selection {
            kind: self.kind(),
            word: ctx.word.to_string(),
            model: fallback.model,
            candidates,
            fell_back: true,
        }
    }
}

// ---------------------------------------------------------------------------
// DIC
// ---------------------------------------------------------------------------

pub struct DicSelector<'a, T: Trainer> {
    base: BaseSelector<'a, T>,
}

impl<'a, T: Trainer> DicSelector<'a, T> {
    pub fn new(base: BaseSelector<'a, T>) -> Self {
        Self { base }
    }
}

impl<T: Trainer> ModelSelector for DicSelector<'_, T> {
    type Model = T::Model;

    fn kind(&self) -> SelectorKind {
        SelectorKind::Dic
    }

    fn select_traced(&self) -> Selection<T::Model> {
        let ctx = self.base.context();
        let others: Vec<_> = ctx
            .all_flat
            .iter()
            .filter(|(word, _)| word.as_str() != ctx.word)
            .map(|(_, flat)| flat)
            .collect();

        let mut candidates = Vec::new();
        let mut best = Best::new(f64::NEG_INFINITY);

        'search: for n in self.base.config().candidates() {
            if others.is_empty() {
                candidates.push(candidate(n, CandidateOutcome::NoOtherWords));
                continue;
            }
            let model = match self.base.fit(n) {
                Ok(model) => model,
                Err(e) => {
                    candidates.push(candidate(n, CandidateOutcome::TrainFailed(e)));
                    continue;
                }
            };
            let own = match model.score(ctx.flat) {
                Ok(v) => v,
                Err(e) => {
                    candidates.push(candidate(n, CandidateOutcome::ScoreFailed(e)));
                    continue;
                }
            };

            let mut total = 0.0;
            for other in &others {
                match model.score(other) {
                    Ok(v) => total += v,
                    Err(e) => {
                        candidates.push(candidate(n, CandidateOutcome::ScoreFailed(e)));
                        continue 'search;
                    }
                }
            }

            let dic = own - total / others.len() as f64;
            if !dic.is_finite() {
                candidates.push(candidate(n, CandidateOutcome::ScoreFailed(ScoreError::NonFinite)));
                continue;
            }
            candidates.push(scored(n, dic));
            if best.offer(dic, model, |new, old| new > old) {
                debug!(word = ctx.word, n_components = n, dic, "new best DIC");
            }
        }

        Selection {
            kind: self.kind(),
            word: ctx.word.to_string(),
            model: best.model,
            candidates,
            fell_back: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Cross-validated likelihood
// ---------------------------------------------------------------------------

pub struct CvSelector<'a, T: Trainer> {
    base: BaseSelector<'a, T>,
}

/// Fold results for one state count.
struct CvScore<M> {
    /// Mean held-out log-likelihood, `-inf` when no fold scored.
    mean: f64,
    folds_scored: usize,
    /// Last successfully fitted fold model.
    last_model: Option<M>,
    /// Most recent fold failure, for the trace.
    last_error: Option<String>,
}

impl<'a, T: Trainer> CvSelector<'a, T> {
    pub fn new(base: BaseSelector<'a, T>) -> Self {
        Self { base }
    }

    /// Folds used for this word: 3 (2 below three utterances), contiguous or
    /// shuffled with the configured seed.
    pub fn folds(&self) -> Vec<Fold> {
        let config = self.base.config();
        let n_utterances = self.base.context().sequences.len();
        let shuffle = config.shuffle_folds.then_some(config.random_state);
        k_fold(n_utterances, fold_count(n_utterances), shuffle)
    }

    fn cross_validate(&self, n_components: usize, folds: &[Fold]) -> CvScore<T::Model> {
        let sequences = self.base.context().sequences;
        let mut total = 0.0;
        let mut folds_scored = 0;
        let mut last_model = None;
        let mut last_error = None;

        for fold in folds {
            let train = combine(&fold.train, sequences);
            let test = combine(&fold.test, sequences);
            let model = match self.base.fit_on(&train, n_components) {
                Ok(model) => model,
                Err(e) => {
                    last_error = Some(CandidateOutcome::TrainFailed(e).label());
                    continue;
                }
            };
            match model.score(&test) {
                Ok(v) => {
                    total += v;
                    folds_scored += 1;
                }
                Err(e) => {
                    debug!(word = self.base.context().word, n_components, error = %e, "fold not scored");
                    last_error = Some(CandidateOutcome::ScoreFailed(e).label());
                }
            }
            last_model = Some(model);
        }

        let mean = if folds_scored == 0 {
            f64::NEG_INFINITY
        } else {
            total / folds_scored as f64
        };
        CvScore {
            mean,
            folds_scored,
            last_model,
            last_error,
        }
    }
}

impl<T: Trainer> ModelSelector for CvSelector<'_, T> {
    type Model = T::Model;

    fn kind(&self) -> SelectorKind {
        SelectorKind::Cv
    }

    fn select_traced(&self) -> Selection<T::Model> {
        let ctx = self.base.context();
        let folds = self.folds();

        let mut candidates = Vec::new();
        let mut best = Best::new(f64::NEG_INFINITY);

        for n in self.base.config().candidates() {
            let cv = self.cross_validate(n, &folds);
            if cv.folds_scored == 0 {
                candidates.push(candidate(
                    n,
                    CandidateOutcome::NoFoldScored {
                        last_error: cv.last_error,
                    },
                ));
                // -inf never improves on the initial best.
                continue;
            }
            candidates.push(scored(n, cv.mean));
            if let Some(model) = cv.last_model {
                if best.offer(cv.mean, model, |new, old| new > old) {
                    debug!(
                        word = ctx.word,
                        n_components = n,
                        mean = cv.mean,
                        folds_scored = cv.folds_scored,
                        "new best CV"
                    );
                }
            }
        }

        Selection {
            kind: self.kind(),
            word: ctx.word.to_string(),
            model: best.model,
            candidates,
            fell_back: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SelectorConfig;
    use crate::error::TrainError;
    use crate::fit::selection::select_with;
    use crate::fit::testing::{ScriptedTrainer, corpus_of};

    fn config(min: usize, max: usize) -> SelectorConfig {
        SelectorConfig {
            min_n_components: min,
            max_n_components: max,
            ..SelectorConfig::default()
        }
    }

    fn insufficient(n: usize) -> TrainError {
        TrainError::InsufficientData {
            frames: 0,
            n_components: n,
        }
    }

    #[test]
    fn constant_requests_exactly_n_constant() {
        let corpus = corpus_of(&[("A", &[5, 5, 5])]);
        let config = SelectorConfig {
            n_constant: 4,
            ..config(2, 10)
        };
        let trainer = ScriptedTrainer::new(|_, _| Ok(-1.0));
        let ctx = corpus.context("A", &config).unwrap();

        let model = ConstantSelector::new(BaseSelector::new(ctx, &trainer)).select().unwrap();
        assert_eq!(model.n_components, 4);
        assert_eq!(trainer.requested(), vec![4]);
    }

    #[test]
    fn constant_failure_is_none() {
        let corpus = corpus_of(&[("A", &[2])]);
        let config = config(2, 10);
        let trainer = ScriptedTrainer::new(|n, _| Err(insufficient(n)));
        let ctx = corpus.context("A", &config).unwrap();

        let selection = select_with(SelectorKind::Constant, ctx, &trainer);
        assert!(selection.model.is_none());
        assert_eq!(trainer.requested(), vec![3]);
    }

    #[test]
    fn bic_matches_closed_form_for_every_candidate() {
        let corpus = corpus_of(&[("A", &[4, 6, 5])]);
        let config = config(2, 5);
        // Per-frame likelihood improves with n, so the penalty decides.
        let trainer = ScriptedTrainer::new(|n, _| Ok(-3.0 + 0.4 * n as f64));
        let ctx = corpus.context("A", &config).unwrap();

        let selection = select_with(SelectorKind::Bic, ctx, &trainer);
        let frames = 15.0;
        let ln_n = 3f64.ln();
        for c in &selection.candidates {
            let n = c.n_components as f64;
            let log_l = (-3.0 + 0.4 * n) * frames;
            let expected = -2.0 * log_l + (n * n + 2.0 * n * 1.0 - 1.0) * ln_n;
            let got = c.outcome.score().unwrap();
            assert!((got - expected).abs() < 1e-9, "n={n}: {got} vs {expected}");
        }

        let best = selection
            .candidates
            .iter()
            .min_by(|a, b| a.outcome.score().unwrap().total_cmp(&b.outcome.score().unwrap()))
            .unwrap();
        assert_eq!(selection.n_components(), Some(best.n_components));
        assert!(!selection.fell_back);
    }

    #[test]
    fn bic_skips_failures_and_keeps_best() {
        let corpus = corpus_of(&[("A", &[4, 4])]);
        let config = config(2, 4);
        let trainer = ScriptedTrainer::new(|n, _| {
            if n == 3 { Err(insufficient(n)) } else { Ok(-1.0) }
        });
        let ctx = corpus.context("A", &config).unwrap();

        let selection = select_with(SelectorKind::Bic, ctx, &trainer);
        assert_eq!(selection.n_components(), Some(2));
        assert!(matches!(
            selection.candidates[1].outcome,
            CandidateOutcome::TrainFailed(_)
        ));
        assert!(!selection.fell_back);
    }

    #[test]
    fn bic_skips_unscorable_and_non_finite_candidates() {
        let corpus = corpus_of(&[("A", &[4, 4])]);
        let config = config(2, 4);
        let trainer = ScriptedTrainer::new(|n, _| if n == 3 { Ok(f64::NEG_INFINITY) } else { Ok(-1.0) })
            .fail_scoring(|n, _| n == 2);
        let ctx = corpus.context("A", &config).unwrap();

        let selection = select_with(SelectorKind::Bic, ctx, &trainer);
        assert!(matches!(selection.candidates[0].outcome, CandidateOutcome::ScoreFailed(_)));
        assert_eq!(
            selection.candidates[1].outcome,
            CandidateOutcome::ScoreFailed(ScoreError::NonFinite)
        );
        assert!(selection.candidates[2].outcome.score().is_some());
        assert_eq!(selection.n_components(), Some(4));
        assert!(!selection.fell_back);
    }

    #[test]
    fn bic_with_inverted_range_equals_constant() {
        let corpus = corpus_of(&[("A", &[4, 4, 4])]);
        let config = SelectorConfig {
            n_constant: 3,
            ..config(6, 5)
        };
        let trainer = ScriptedTrainer::new(|_, _| Ok(-2.0));
        let ctx = corpus.context("A", &config).unwrap();

        let bic = select_with(SelectorKind::Bic, ctx, &trainer);
        let constant = select_with(SelectorKind::Constant, ctx, &trainer);
        assert!(bic.fell_back);
        assert_eq!(bic.model, constant.model);
        assert_eq!(trainer.requested(), vec![3, 3]);
    }

    #[test]
    fn bic_all_failed_falls_back_to_constant() {
        let corpus = corpus_of(&[("A", &[4, 4])]);
        let config = config(4, 6);
        let trainer = ScriptedTrainer::new(|n, _| if n >= 4 { Err(insufficient(n)) } else { Ok(-1.0) });
        let ctx = corpus.context("A", &config).unwrap();

        let selection = select_with(SelectorKind::Bic, ctx, &trainer);
        assert!(selection.fell_back);
        assert_eq!(selection.n_components(), Some(3));
        assert_eq!(trainer.requested(), vec![4, 5, 6, 3]);
    }

    #[test]
    fn dic_two_words_reduces_to_difference() {
        // A has 8 frames, B has 5.
        let corpus = corpus_of(&[("A", &[4, 4]), ("B", &[5])]);
        let config = config(2, 4);
        let trainer = ScriptedTrainer::new(|n, _| Ok(-(n as f64)));
        let ctx = corpus.context("A", &config).unwrap();

        let selection = select_with(SelectorKind::Dic, ctx, &trainer);
        for c in &selection.candidates {
            let r = -(c.n_components as f64);
            let expected = r * 8.0 - r * 5.0;
            assert!((c.outcome.score().unwrap() - expected).abs() < 1e-12);
        }
        // DIC = -3n is highest at n = 2.
        assert_eq!(selection.n_components(), Some(2));
    }

    #[test]
    fn dic_averages_over_all_other_words() {
        let corpus = corpus_of(&[("A", &[6]), ("B", &[2]), ("C", &[4])]);
        let config = config(2, 2);
        let trainer = ScriptedTrainer::new(|_, _| Ok(-1.0));
        let ctx = corpus.context("A", &config).unwrap();

        let selection = select_with(SelectorKind::Dic, ctx, &trainer);
        let expected = -6.0 - (-2.0 + -4.0) / 2.0;
        assert_eq!(selection.best_score(), Some(expected));
    }

    #[test]
    fn dic_single_word_is_none() {
        let corpus = corpus_of(&[("A", &[4, 4])]);
        let config = config(2, 5);
        let trainer = ScriptedTrainer::new(|_, _| Ok(-1.0));
        let ctx = corpus.context("A", &config).unwrap();

        let selection = select_with(SelectorKind::Dic, ctx, &trainer);
        assert!(selection.model.is_none());
        assert_eq!(selection.candidates.len(), 4);
        assert!(
            selection
                .candidates
                .iter()
                .all(|c| c.outcome == CandidateOutcome::NoOtherWords)
        );
    }

    #[test]
    fn dic_skips_failed_fits() {
        let corpus = corpus_of(&[("A", &[4]), ("B", &[4])]);
        let config = config(2, 4);
        let trainer = ScriptedTrainer::new(|n, _| if n == 2 { Err(insufficient(n)) } else { Ok(-(n as f64)) });
        let ctx = corpus.context("A", &config).unwrap();

        let selection = select_with(SelectorKind::Dic, ctx, &trainer);
        // Same frame counts: DIC is 0 for both fitted n, first one wins.
        assert_eq!(selection.n_components(), Some(3));
    }

    #[test]
    fn dic_skips_when_own_or_other_scoring_fails() {
        // A has 8 frames, B has 5.
        let corpus = corpus_of(&[("A", &[4, 4]), ("B", &[5])]);
        let config = config(2, 4);
        let trainer = ScriptedTrainer::new(|n, _| Ok(-(n as f64))).fail_scoring(|n, data| {
            (n == 2 && data.n_frames() == 8) || (n == 3 && data.n_frames() == 5)
        });
        let ctx = corpus.context("A", &config).unwrap();

        let selection = select_with(SelectorKind::Dic, ctx, &trainer);
        assert_eq!(trainer.requested(), vec![2, 3, 4]);
        assert!(matches!(selection.candidates[0].outcome, CandidateOutcome::ScoreFailed(_)));
        assert!(matches!(selection.candidates[1].outcome, CandidateOutcome::ScoreFailed(_)));
        assert_eq!(selection.candidates.len(), 3);
        assert_eq!(selection.best_score(), Some(-4.0 * 8.0 + 4.0 * 5.0));
        assert_eq!(selection.n_components(), Some(4));
    }

    #[test]
    fn cv_uses_two_folds_below_three_utterances() {
        let corpus = corpus_of(&[("A", &[3, 5])]);
        let config = config(2, 2);
        let trainer = ScriptedTrainer::new(|_, _| Ok(-1.0));
        let ctx = corpus.context("A", &config).unwrap();

        let cv = CvSelector::new(BaseSelector::new(ctx, &trainer));
        assert_eq!(cv.folds().len(), 2);
        cv.select().unwrap();
        assert_eq!(trainer.requested(), vec![2, 2]);
    }

    #[test]
    fn cv_uses_three_folds_from_three_utterances() {
        let corpus = corpus_of(&[("A", &[3, 5, 4, 2])]);
        let config = config(2, 2);
        let trainer = ScriptedTrainer::new(|_, _| Ok(-1.0));
        let ctx = corpus.context("A", &config).unwrap();

        let cv = CvSelector::new(BaseSelector::new(ctx, &trainer));
        assert_eq!(cv.folds().len(), 3);
    }

    #[test]
    fn cv_scores_mean_held_out_likelihood() {
        // Utterance frame counts 3, 5, 4: held-out folds have 3, 5, 4 frames.
        let corpus = corpus_of(&[("A", &[3, 5, 4])]);
        let config = config(2, 3);
        let trainer = ScriptedTrainer::new(|n, _| Ok(-(n as f64)));
        let ctx = corpus.context("A", &config).unwrap();

        let selection = select_with(SelectorKind::Cv, ctx, &trainer);
        let mean_frames = (3.0 + 5.0 + 4.0) / 3.0;
        assert_eq!(selection.candidates[0].outcome.score(), Some(-2.0 * mean_frames));
        assert_eq!(selection.candidates[1].outcome.score(), Some(-3.0 * mean_frames));
        assert_eq!(selection.n_components(), Some(2));
    }

    #[test]
    fn cv_all_folds_failed_is_traced_as_failure() {
        let corpus = corpus_of(&[("A", &[3, 3, 3])]);
        let config = config(2, 3);
        let trainer = ScriptedTrainer::new(|n, _| if n == 2 { Err(insufficient(n)) } else { Ok(-50.0) });
        let ctx = corpus.context("A", &config).unwrap();

        let selection = select_with(SelectorKind::Cv, ctx, &trainer);
        let outcome = &selection.candidates[0].outcome;
        assert!(matches!(outcome, CandidateOutcome::NoFoldScored { .. }));
        assert!(outcome.score().is_none());
        assert!(
            outcome.label().starts_with("no fold scored: train failed: insufficient data"),
            "{}",
            outcome.label()
        );
        // A very poor but real score still beats -inf.
        assert_eq!(selection.n_components(), Some(3));
    }

    #[test]
    fn cv_every_candidate_failing_is_none() {
        let corpus = corpus_of(&[("A", &[3, 3, 3])]);
        let config = config(2, 4);
        let trainer = ScriptedTrainer::new(|n, _| Err(insufficient(n)));
        let ctx = corpus.context("A", &config).unwrap();

        let selection = select_with(SelectorKind::Cv, ctx, &trainer);
        assert!(selection.model.is_none());
        assert_eq!(selection.candidates.len(), 3);
        assert!(
            selection
                .candidates
                .iter()
                .all(|c| matches!(c.outcome, CandidateOutcome::NoFoldScored { last_error: Some(_) }))
        );
    }

    #[test]
    fn cv_every_fold_unscorable_is_none() {
        let corpus = corpus_of(&[("A", &[3, 3, 3])]);
        let config = config(2, 2);
        let trainer = ScriptedTrainer::new(|_, _| Ok(-1.0)).fail_scoring(|_, _| true);
        let ctx = corpus.context("A", &config).unwrap();

        let selection = select_with(SelectorKind::Cv, ctx, &trainer);
        // Models were fitted, but -inf never wins.
        assert!(selection.model.is_none());
        assert!(selection.candidates[0].outcome.label().starts_with("no fold scored: score failed"));
    }

    #[test]
    fn cv_skips_failed_folds_in_the_mean() {
        // Fails whenever the training data has exactly 7 frames (held-out fold 0).
        let corpus = corpus_of(&[("A", &[5, 3, 4])]);
        let config = config(2, 2);
        let trainer = ScriptedTrainer::new(|n, data| {
            if data.n_frames() == 7 { Err(insufficient(n)) } else { Ok(-1.0) }
        });
        let ctx = corpus.context("A", &config).unwrap();

        let selection = select_with(SelectorKind::Cv, ctx, &trainer);
        assert_eq!(selection.candidates[0].outcome.score(), Some(-(3.0 + 4.0) / 2.0));
    }

    #[test]
    fn cv_unscorable_fold_is_left_out_but_its_model_kept() {
        // Held-out fold 2 is utterance 2 (4 frames); its model trained on 5 + 3.
        let corpus = corpus_of(&[("A", &[5, 3, 4])]);
        let config = config(2, 2);
        let trainer = ScriptedTrainer::new(|_, _| Ok(-1.0)).fail_scoring(|_, data| data.n_frames() == 4);
        let ctx = corpus.context("A", &config).unwrap();

        let selection = select_with(SelectorKind::Cv, ctx, &trainer);
        assert_eq!(selection.candidates[0].outcome.score(), Some(-(5.0 + 3.0) / 2.0));
        assert_eq!(selection.model.unwrap().trained_frames, 8);
    }

    #[test]
    fn cv_returns_last_successful_fold_model() {
        let corpus = corpus_of(&[("A", &[5, 3, 4])]);
        let config = config(2, 2);
        // Last fold (test = utterance 2) trains on 5 + 3 frames and fails.
        let trainer = ScriptedTrainer::new(|n, data| {
            if data.n_frames() == 8 { Err(insufficient(n)) } else { Ok(-1.0) }
        });
        let ctx = corpus.context("A", &config).unwrap();

        let model = select_with(SelectorKind::Cv, ctx, &trainer).model.unwrap();
        // Second fold held out utterance 1 and trained on 5 + 4 frames.
        assert_eq!(model.trained_frames, 9);
    }

    #[test]
    fn cv_single_utterance_has_no_folds() {
        let corpus = corpus_of(&[("A", &[6])]);
        let config = config(2, 3);
        let trainer = ScriptedTrainer::new(|_, _| Ok(-1.0));
        let ctx = corpus.context("A", &config).unwrap();

        let selection = select_with(SelectorKind::Cv, ctx, &trainer);
        assert!(selection.model.is_none());
        assert!(trainer.requested().is_empty());
        assert!(selection.candidates.iter().all(|c| c.outcome.label() == "no folds"));
    }

    #[test]
    fn search_is_idempotent() {
        let corpus = corpus_of(&[("A", &[4, 5, 6]), ("B", &[3, 3])]);
        let config = config(2, 5);
        let trainer = ScriptedTrainer::new(|n, data| Ok(-1.0 - 0.01 * (n * data.n_frames()) as f64));
        for kind in SelectorKind::ALL {
            let ctx = corpus.context("A", &config).unwrap();
            let a = select_with(kind, ctx, &trainer);
            let b = select_with(kind, ctx, &trainer);
            assert_eq!(a.model, b.model, "{kind:?}");
            assert_eq!(a.candidates, b.candidates, "{kind:?}");
        }
    }
}
