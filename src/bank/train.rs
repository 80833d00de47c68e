//! Train one model per word with a chosen selector.
//!
//! Words are independent, so the search runs in parallel (rayon) over words.
//! Each `select()` call still runs its candidate loop sequentially.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::data::Corpus;
use crate::domain::{SelectorConfig, SelectorKind};
use crate::error::AppError;
use crate::fit::{FittedModel, Selection, Trainer, select_with};

/// Outcome of selecting one word's model.
#[derive(Debug, Clone)]
pub struct BankEntry<M> {
    pub selection: Selection<M>,
    pub elapsed: Duration,
}

/// Selected models for every word of a corpus.
#[derive(Debug, Clone)]
pub struct ModelBank<M> {
    pub kind: SelectorKind,
    pub config: SelectorConfig,
    pub entries: BTreeMap<String, BankEntry<M>>,
    pub elapsed: Duration,
}

impl<M: FittedModel> ModelBank<M> {
    /// Words that ended up with a model.
    pub fn n_trained(&self) -> usize {
        self.entries.values().filter(|e| e.selection.model.is_some()).count()
    }

    /// `(word, model)` pairs for words that have a model.
    pub fn models(&self) -> impl Iterator<Item = (&str, &M)> {
        self.entries
            .iter()
            .filter_map(|(word, e)| e.selection.model.as_ref().map(|m| (word.as_str(), m)))
    }
}

/// Select a model for every word in `corpus`.
pub fn train_all_words<T: Trainer>(
    corpus: &Corpus,
    kind: SelectorKind,
    config: &SelectorConfig,
    trainer: &T,
) -> Result<ModelBank<T::Model>, AppError> {
    let started = Instant::now();
    let words: Vec<&str> = corpus.words().collect();

    let entries = words
        .par_iter()
        .map(|&word| {
            let ctx = corpus.context(word, config)?;
            let t0 = Instant::now();
            let selection = select_with(kind, ctx, trainer);
            let elapsed = t0.elapsed();

            match selection.n_components() {
                Some(n) => info!(
                    word,
                    selector = kind.display_name(),
                    n_components = n,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "trained"
                ),
                None => warn!(word, selector = kind.display_name(), "no model selected"),
            }
            Ok((word.to_string(), BankEntry { selection, elapsed }))
        })
        .collect::<Result<BTreeMap<_, _>, AppError>>()?;

    Ok(ModelBank {
        kind,
        config: config.clone(),
        entries,
        elapsed: started.elapsed(),
    })
}
