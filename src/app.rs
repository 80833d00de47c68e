//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main:
//! - loads `.env` and parses CLI arguments
//! - installs the log subscriber
//! - loads or generates the corpus
//! - runs selection / training / evaluation
//! - prints reports and writes optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, EvaluateArgs, SelectArgs, TrainArgs};
use crate::error::AppError;
use crate::fit::GaussianHmmTrainer;

pub mod pipeline;

/// Entry point for the `statesel` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Select(args) => handle_select(args, cli.verbose),
        Command::Train(args) => handle_train(args, cli.verbose),
        Command::Evaluate(args) => handle_evaluate(args, cli.verbose),
    }
}

/// Logs go to stderr; stdout carries the reports.
///
/// `RUST_LOG` wins; otherwise `warn`, or `info` with `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "state_select=info" } else { "state_select=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests, embedding) is not an error worth reporting.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_select(args: SelectArgs, verbose: bool) -> Result<(), AppError> {
    let config = args.search.selector_config(verbose);
    let loaded = pipeline::load_corpus(&args.corpus)?;
    let trainer = GaussianHmmTrainer::default();

    let selection = pipeline::run_select(&loaded.corpus, &args.word, args.selector, &config, &trainer)?;

    println!("Corpus: {}", loaded.source);
    if let Some(n) = loaded.true_states.as_ref().and_then(|t| t.get(&args.word)) {
        println!("True states: {n}");
    }
    println!("{}", crate::report::format_selection(&selection));
    Ok(())
}

fn handle_train(args: TrainArgs, verbose: bool) -> Result<(), AppError> {
    let config = args.search.selector_config(verbose);
    if args.export_json.is_some() && args.selector.is_none() {
        return Err(AppError::new(2, "`--export-json` needs a single `--selector`."));
    }

    let loaded = pipeline::load_corpus(&args.corpus)?;
    let trainer = GaussianHmmTrainer::default();
    let kinds = pipeline::selector_kinds(args.selector);
    let banks = pipeline::run_train(&loaded.corpus, &kinds, &config, &trainer)?;

    println!("Corpus: {}\n", loaded.source);
    for bank in &banks {
        println!(
            "{}",
            crate::report::format_bank_summary(bank, loaded.true_states.as_ref())
        );
    }
    if banks.len() > 1 {
        println!("{}", crate::report::format_comparison(&banks));
    }

    if let (Some(path), Some(bank)) = (&args.export_json, banks.first()) {
        crate::io::write_bank_json(path, bank)?;
    }
    if let Some(path) = &args.export_csv {
        crate::io::write_candidates_csv(path, &banks)?;
    }

    Ok(())
}

fn handle_evaluate(args: EvaluateArgs, verbose: bool) -> Result<(), AppError> {
    let config = args.search.selector_config(verbose);
    let loaded = pipeline::load_corpus(&args.corpus)?;
    let trainer = GaussianHmmTrainer::default();
    let kinds = pipeline::selector_kinds(args.selector);

    let results = pipeline::run_evaluate(&loaded.corpus, &kinds, &config, &trainer)?;

    println!("Corpus: {}\n", loaded.source);
    for (bank, report) in &results {
        println!(
            "{}",
            crate::report::format_recognition(bank.kind.display_name(), report)
        );
    }
    let banks: Vec<_> = results.into_iter().map(|(bank, _)| bank).collect();
    println!("{}", crate::report::format_comparison(&banks));
    Ok(())
}
