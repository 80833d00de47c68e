//! Shared pipeline logic behind the CLI subcommands.
//!
//! corpus load -> selection (one word, or every word per selector) -> recognition
//!
//! The command handlers in `app` only deal with presentation.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::bank::{ModelBank, RecognitionReport, recognize, train_all_words};
use crate::cli::CorpusArgs;
use crate::data::{Corpus, generate_corpus};
use crate::domain::{SelectorConfig, SelectorKind};
use crate::error::AppError;
use crate::fit::{Selection, Trainer, select_with};
use crate::io::load_corpus_csv;

/// A loaded corpus plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedCorpus {
    pub corpus: Corpus,
    pub source: String,
    /// Known state count per word (synthetic corpora only).
    pub true_states: Option<BTreeMap<String, usize>>,
}

/// Load the CSV corpus, or generate a synthetic one when no CSV is given.
pub fn load_corpus(args: &CorpusArgs) -> Result<LoadedCorpus, AppError> {
    if let Some(path) = &args.csv {
        let ingested = load_corpus_csv(path)?;
        for e in &ingested.row_errors {
            warn!(line = e.line, "skipped row: {}", e.message);
        }
        info!(
            rows_read = ingested.rows_read,
            rows_used = ingested.rows_used,
            words = ingested.corpus.n_words(),
            "corpus loaded"
        );
        return Ok(LoadedCorpus {
            source: format!(
                "{} ({} rows, {} skipped)",
                path.display(),
                ingested.rows_read,
                ingested.row_errors.len()
            ),
            corpus: ingested.corpus,
            true_states: None,
        });
    }

    let sample = generate_corpus(&args.sample_config())?;
    Ok(LoadedCorpus {
        corpus: Corpus::from_sequences(sample.sequences)?,
        source: format!("synthetic (seed {})", args.sample_seed),
        true_states: Some(sample.true_states.into_iter().collect()),
    })
}

/// Selectors to run: the one requested, or all of them.
pub fn selector_kinds(requested: Option<SelectorKind>) -> Vec<SelectorKind> {
    match requested {
        Some(kind) => vec![kind],
        None => SelectorKind::ALL.to_vec(),
    }
}

/// Run one selector for one word.
pub fn run_select<T: Trainer>(
    corpus: &Corpus,
    word: &str,
    kind: SelectorKind,
    config: &SelectorConfig,
    trainer: &T,
) -> Result<Selection<T::Model>, AppError> {
    let ctx = corpus.context(word, config)?;
    Ok(select_with(kind, ctx, trainer))
}

/// Train one bank per selector.
pub fn run_train<T: Trainer>(
    corpus: &Corpus,
    kinds: &[SelectorKind],
    config: &SelectorConfig,
    trainer: &T,
) -> Result<Vec<ModelBank<T::Model>>, AppError> {
    kinds
        .iter()
        .map(|&kind| train_all_words(corpus, kind, config, trainer))
        .collect()
}

/// Hold out the last utterance of every word, train on the rest, recognize.
pub fn run_evaluate<T: Trainer>(
    corpus: &Corpus,
    kinds: &[SelectorKind],
    config: &SelectorConfig,
    trainer: &T,
) -> Result<Vec<(ModelBank<T::Model>, RecognitionReport)>, AppError> {
    let (train, test) = corpus.hold_out_last()?;
    if test.is_empty() {
        return Err(AppError::new(
            3,
            "No word has two or more utterances; nothing to hold out for evaluation.",
        ));
    }
    info!(held_out = test.len(), "evaluation split");

    kinds
        .iter()
        .map(|&kind| {
            let bank = train_all_words(&train, kind, config, trainer)?;
            let report = recognize(&bank, &test);
            Ok((bank, report))
        })
        .collect()
}
