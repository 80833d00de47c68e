//! CSV corpus ingest.
//!
//! Long format, one frame per row:
//!
//! ```text
//! word,utterance,f0,f1,...
//! FISH,0,12.1,-3.0
//! FISH,0,11.8,-2.7
//! FISH,1,...
//! ```
//!
//! Every column other than `word` and `utterance` is a feature, in header
//! order. Frames of an utterance keep file order; utterances of a word keep
//! order of first appearance. Unparseable rows are skipped and reported.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::data::Corpus;
use crate::domain::{Frame, Utterance, WordSequenceIndex};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: validated corpus plus bookkeeping for the report.
#[derive(Debug, Clone)]
pub struct IngestedCorpus {
    pub corpus: Corpus,
    pub feature_names: Vec<String>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

pub fn load_corpus_csv(path: &Path) -> Result<IngestedCorpus, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_corpus(file)
}

pub fn read_corpus<R: Read>(source: R) -> Result<IngestedCorpus, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let layout = Layout::from_headers(&headers)?;

    // (word, utterance id) -> position in that word's utterance list.
    let mut positions: HashMap<(String, String), usize> = HashMap::new();
    let mut sequences = WordSequenceIndex::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_used = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let (word, utterance, frame) = match layout.parse_row(&record) {
            Ok(parsed) => parsed,
            Err(message) => {
                row_errors.push(RowError { line, message });
                continue;
            }
        };

        let utterances: &mut Vec<Utterance> = sequences.entry(word.clone()).or_default();
        let pos = *positions.entry((word, utterance)).or_insert_with(|| {
            utterances.push(Vec::new());
            utterances.len() - 1
        });
        utterances[pos].push(frame);
        rows_used += 1;
    }

    if rows_used == 0 {
        return Err(AppError::new(3, "No valid frames in the CSV corpus."));
    }

    Ok(IngestedCorpus {
        corpus: Corpus::from_sequences(sequences)?,
        feature_names: layout.feature_names,
        row_errors,
        rows_read,
        rows_used,
    })
}

/// Column positions resolved from the header.
struct Layout {
    word: usize,
    utterance: usize,
    features: Vec<usize>,
    feature_names: Vec<String>,
}

impl Layout {
    fn from_headers(headers: &StringRecord) -> Result<Self, AppError> {
        let mut word = None;
        let mut utterance = None;
        let mut features = Vec::new();
        let mut feature_names = Vec::new();

        for (idx, raw) in headers.iter().enumerate() {
            let name = normalize_header_name(raw);
            match name.as_str() {
                "word" => word = Some(idx),
                "utterance" => utterance = Some(idx),
                _ => {
                    features.push(idx);
                    feature_names.push(raw.trim().trim_start_matches('\u{feff}').to_string());
                }
            }
        }

        let word = word.ok_or_else(|| AppError::new(2, "Missing required column: `word`"))?;
        let utterance =
            utterance.ok_or_else(|| AppError::new(2, "Missing required column: `utterance`"))?;
        if features.is_empty() {
            return Err(AppError::new(2, "CSV has no feature columns."));
        }

        Ok(Self {
            word,
            utterance,
            features,
            feature_names,
        })
    }

    fn parse_row(&self, record: &StringRecord) -> Result<(String, String, Frame), String> {
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let word = field(self.word);
        if word.is_empty() {
            return Err("empty `word`".to_string());
        }
        let utterance = field(self.utterance);
        if utterance.is_empty() {
            return Err("empty `utterance`".to_string());
        }

        let mut frame = Vec::with_capacity(self.features.len());
        for (&idx, name) in self.features.iter().zip(&self.feature_names) {
            let raw = field(idx);
            let value: f64 = raw
                .parse()
                .map_err(|_| format!("feature `{name}`: cannot parse '{raw}' as a number"))?;
            if !value.is_finite() {
                return Err(format!("feature `{name}`: non-finite value"));
            }
            frame.push(value);
        }

        Ok((word.to_string(), utterance.to_string(), frame))
    }
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a BOM.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}
