//! Export selection results.
//!
//! - candidate-score CSV: one row per (word, state count), easy to chart
//! - bank JSON: the chosen model per word plus run metadata
//!
//! The JSON schema is `BankFile`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bank::ModelBank;
use crate::domain::{SelectorConfig, SelectorKind};
use crate::error::AppError;
use crate::fit::FittedModel;

/// Portable summary of a trained bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankFile<M> {
    pub tool: String,
    pub created_at: DateTime<Utc>,
    pub selector: SelectorKind,
    pub config: SelectorConfig,
    pub elapsed_ms: u64,
    pub words: Vec<BankWord<M>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankWord<M> {
    pub word: String,
    pub n_components: Option<usize>,
    pub best_score: Option<f64>,
    pub fell_back: bool,
    pub elapsed_ms: u64,
    pub model: Option<M>,
}

impl<M: FittedModel + Clone> BankFile<M> {
    pub fn from_bank(bank: &ModelBank<M>) -> Self {
        let words = bank
            .entries
            .iter()
            .map(|(word, entry)| BankWord {
                word: word.clone(),
                n_components: entry.selection.n_components(),
                best_score: entry.selection.best_score(),
                fell_back: entry.selection.fell_back,
                elapsed_ms: entry.elapsed.as_millis() as u64,
                model: entry.selection.model.clone(),
            })
            .collect();

        Self {
            tool: "statesel".to_string(),
            created_at: Utc::now(),
            selector: bank.kind,
            config: bank.config.clone(),
            elapsed_ms: bank.elapsed.as_millis() as u64,
            words,
        }
    }
}

/// Write a bank JSON file.
pub fn write_bank_json<M>(path: &Path, bank: &ModelBank<M>) -> Result<(), AppError>
where
    M: FittedModel + Clone + Serialize,
{
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create bank JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, &BankFile::from_bank(bank))
        .map_err(|e| AppError::new(2, format!("Failed to write bank JSON: {e}")))?;

    Ok(())
}

/// Write per-candidate scores of one or more banks to a CSV file.
pub fn write_candidates_csv<M: FittedModel>(path: &Path, banks: &[ModelBank<M>]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_candidates(file, banks)
}

fn write_candidates<W: Write, M: FittedModel>(out: W, banks: &[ModelBank<M>]) -> Result<(), AppError> {
    let csv_err = |e: csv::Error| AppError::new(2, format!("Failed to write export CSV: {e}"));
    let mut writer = csv::Writer::from_writer(out);

    writer
        .write_record(["selector", "word", "n_components", "score", "chosen", "status"])
        .map_err(csv_err)?;

    for bank in banks {
        let selector = format!("{:?}", bank.kind).to_lowercase();
        for (word, entry) in &bank.entries {
            let chosen_index = entry.selection.chosen_index();
            for (i, c) in entry.selection.candidates.iter().enumerate() {
                writer
                    .write_record([
                        selector.clone(),
                        word.clone(),
                        c.n_components.to_string(),
                        c.outcome.score().map(|v| format!("{v:.6}")).unwrap_or_default(),
                        u8::from(chosen_index == Some(i)).to_string(),
                        c.outcome.label(),
                    ])
                    .map_err(csv_err)?;
            }
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}
