//! Command-line parsing for the state-count selector.
//!
//! Argument parsing and command dispatch stay separate from the selection code.
//! Main options can also come from `STATESEL_*` environment variables (or a
//! `.env` file loaded at startup).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::SampleConfig;
use crate::domain::{SelectorConfig, SelectorKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "statesel", version, about = "Hidden-state-count selection for per-word Gaussian HMMs")]
pub struct Cli {
    /// Log every fit attempt (info level on stderr).
    #[arg(short, long, global = true, env = "STATESEL_VERBOSE")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one selector for one word and print the candidate trace.
    Select(SelectArgs),
    /// Select a model for every word with one or all selectors.
    Train(TrainArgs),
    /// Hold out one utterance per word, train, recognize and report word error rate.
    Evaluate(EvaluateArgs),
}

#[derive(Debug, Args, Clone)]
pub struct SelectArgs {
    /// Word to select a model for.
    #[arg(short, long)]
    pub word: String,

    /// Selection strategy.
    #[arg(short, long, value_enum, default_value_t = SelectorKind::Bic)]
    pub selector: SelectorKind,

    #[command(flatten)]
    pub corpus: CorpusArgs,

    #[command(flatten)]
    pub search: SearchArgs,
}

#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    /// Selection strategy (all four when omitted).
    #[arg(short, long, value_enum)]
    pub selector: Option<SelectorKind>,

    #[command(flatten)]
    pub corpus: CorpusArgs,

    #[command(flatten)]
    pub search: SearchArgs,

    /// Export the bank (chosen model per word) to JSON. Needs a single `--selector`.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Export every candidate score to CSV.
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct EvaluateArgs {
    /// Selection strategy (all four when omitted).
    #[arg(short, long, value_enum)]
    pub selector: Option<SelectorKind>,

    #[command(flatten)]
    pub corpus: CorpusArgs,

    #[command(flatten)]
    pub search: SearchArgs,
}

/// Where the training corpus comes from.
#[derive(Debug, Args, Clone)]
pub struct CorpusArgs {
    /// Long-format CSV corpus (`word,utterance,<features...>`). Synthetic when omitted.
    #[arg(long, value_name = "CSV", env = "STATESEL_CSV")]
    pub csv: Option<PathBuf>,

    /// Synthetic corpus: seed.
    #[arg(long, default_value_t = 42, env = "STATESEL_SAMPLE_SEED")]
    pub sample_seed: u64,

    /// Synthetic corpus: feature dimensionality.
    #[arg(long, default_value_t = 2)]
    pub features: usize,

    /// Synthetic corpus: minimum utterances per word.
    #[arg(long, default_value_t = 2)]
    pub utterances_min: usize,

    /// Synthetic corpus: maximum utterances per word.
    #[arg(long, default_value_t = 8)]
    pub utterances_max: usize,

    /// Synthetic corpus: emission noise (standard deviation).
    #[arg(long, default_value_t = 1.0)]
    pub noise: f64,
}

impl CorpusArgs {
    pub fn sample_config(&self) -> SampleConfig {
        SampleConfig {
            n_features: self.features,
            utterances_min: self.utterances_min,
            utterances_max: self.utterances_max,
            noise: self.noise,
            seed: self.sample_seed,
            ..SampleConfig::default()
        }
    }
}

/// Selector configuration knobs.
#[derive(Debug, Args, Clone)]
pub struct SearchArgs {
    /// State count for the constant selector and the BIC fallback.
    #[arg(long, default_value_t = 3, env = "STATESEL_N_CONSTANT")]
    pub n_constant: usize,

    /// Smallest candidate state count.
    #[arg(long = "min", default_value_t = 2, env = "STATESEL_MIN")]
    pub min_n_components: usize,

    /// Largest candidate state count.
    #[arg(long = "max", default_value_t = 10, env = "STATESEL_MAX")]
    pub max_n_components: usize,

    /// Seed forwarded to the trainer.
    #[arg(long, default_value_t = 14, env = "STATESEL_RANDOM_STATE")]
    pub random_state: u64,

    /// Shuffle utterances before splitting cross-validation folds.
    #[arg(long)]
    pub shuffle_folds: bool,
}

impl SearchArgs {
    pub fn selector_config(&self, verbose: bool) -> SelectorConfig {
        SelectorConfig {
            n_constant: self.n_constant,
            min_n_components: self.min_n_components,
            max_n_components: self.max_n_components,
            random_state: self.random_state,
            verbose,
            shuffle_folds: self.shuffle_folds,
        }
    }
}
