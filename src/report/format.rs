//! Formatted terminal output.
//!
//! Formatting lives here so the selection code stays free of presentation and
//! output changes stay local.

use std::collections::BTreeMap;

use crate::bank::{ModelBank, RecognitionReport};
use crate::fit::{FittedModel, Selection};

/// Candidate trace of one selection, one row per state count.
pub fn format_selection<M: FittedModel>(selection: &Selection<M>) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== statesel - {} selection for {} ===\n",
        selection.kind.display_name(),
        selection.word
    ));
    let direction = if selection.kind.lower_is_better() {
        "lower is better"
    } else {
        "higher is better"
    };
    out.push_str(&format!("Criterion: {} ({direction})\n\n", selection.kind.display_name()));

    push_line(&mut out, format!("  {:>6} {:>16}  {}", "states", "score", "status"));
    push_line(&mut out, format!("  {:->6} {:->16}  {:-<20}", "", "", ""));

    let chosen_index = selection.chosen_index();
    for (i, c) in selection.candidates.iter().enumerate() {
        let marker = if chosen_index == Some(i) { "*" } else { " " };
        push_line(
            &mut out,
            format!(
                "{marker} {:>6} {:>16}  {}",
                c.n_components,
                fmt_score(c.outcome.score()),
                c.outcome.label()
            ),
        );
    }

    out.push('\n');
    match selection.n_components() {
        Some(n) if selection.fell_back => {
            out.push_str(&format!("Chosen: {n} states (constant fallback)\n"));
        }
        Some(n) => out.push_str(&format!("Chosen: {n} states\n")),
        None => out.push_str("Chosen: none (no candidate could be fitted and scored)\n"),
    }

    out
}

/// Per-word summary of a trained bank.
///
/// `true_states` adds a column with the known state count (synthetic corpora).
pub fn format_bank_summary<M: FittedModel>(
    bank: &ModelBank<M>,
    true_states: Option<&BTreeMap<String, usize>>,
) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== statesel - {} bank ({} of {} words trained, {:.3}s) ===\n",
        bank.kind.display_name(),
        bank.n_trained(),
        bank.entries.len(),
        bank.elapsed.as_secs_f64()
    ));
    out.push_str(&format!(
        "Range: {}..={} | constant: {} | seed: {}\n\n",
        bank.config.min_n_components,
        bank.config.max_n_components,
        bank.config.n_constant,
        bank.config.random_state
    ));

    let with_truth = true_states.is_some();
    let mut header = format!("{:<16} {:>6} {:>16} {:>10}", "word", "states", "score", "ms");
    let mut rule = format!("{:-<16} {:->6} {:->16} {:->10}", "", "", "", "");
    if with_truth {
        header.push_str(&format!(" {:>6}", "true"));
        rule.push_str(&format!(" {:->6}", ""));
    }
    push_line(&mut out, header);
    push_line(&mut out, rule);

    for (word, entry) in &bank.entries {
        let states = match entry.selection.n_components() {
            Some(n) if entry.selection.fell_back => format!("{n}*"),
            Some(n) => n.to_string(),
            None => "-".to_string(),
        };
        let mut row = format!(
            "{:<16} {:>6} {:>16} {:>10}",
            truncate(word, 16),
            states,
            fmt_score(entry.selection.best_score()),
            entry.elapsed.as_millis()
        );
        if let Some(truth) = true_states {
            let t = truth.get(word).map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
            row.push_str(&format!(" {t:>6}"));
        }
        push_line(&mut out, row);
    }

    if bank.entries.values().any(|e| e.selection.fell_back) {
        out.push_str("(* = constant fallback)\n");
    }

    out
}

/// One line per selector: coverage and total training time.
pub fn format_comparison<M: FittedModel>(banks: &[ModelBank<M>]) -> String {
    let mut out = String::new();
    out.push_str("Selector comparison:\n");
    push_line(&mut out, format!("  {:<10} {:>9} {:>10}", "selector", "trained", "seconds"));
    push_line(&mut out, format!("  {:-<10} {:->9} {:->10}", "", "", ""));
    for bank in banks {
        push_line(
            &mut out,
            format!(
                "  {:<10} {:>9} {:>10.3}",
                bank.kind.display_name(),
                format!("{}/{}", bank.n_trained(), bank.entries.len()),
                bank.elapsed.as_secs_f64()
            ),
        );
    }
    out
}

/// Word error rate plus the misrecognized utterances.
pub fn format_recognition(label: &str, report: &RecognitionReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{label}: WER = {:.4} ({} of {} correct)\n",
        report.word_error_rate(),
        report.n_correct(),
        report.results.len()
    ));

    for r in report.results.iter().filter(|r| !r.is_correct()) {
        out.push_str(&format!(
            "  {} -> {}\n",
            r.expected,
            r.guess.as_deref().unwrap_or("(unrecognized)")
        ));
    }
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn fmt_score(score: Option<f64>) -> String {
    match score {
        Some(v) if v.is_finite() => format!("{v:.4}"),
        Some(v) if v < 0.0 => "-inf".to_string(),
        Some(_) => "inf".to_string(),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
