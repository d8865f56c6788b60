//! Results persistence and console output

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use qaeval::{EvaluationRecord, QaPair, TierCounts};
use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineError;

/// File name for a record written at `at`
pub fn record_file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("qa_eval_results_{}.json", at.format("%Y%m%d_%H%M%S"))
}

/// Pretty-printed JSON, UTF-8 with non-ASCII text left as is
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, json)
}

/// Write `record` into `dir` under a timestamped name and return the path
pub fn write_record(dir: impl AsRef<Path>, record: &EvaluationRecord) -> std::io::Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let path = dir.join(record_file_name(&chrono::Local::now()));
    write_json(&path, record)?;
    Ok(path)
}

/// One saved row: a QA pair and, optionally, the model's answer to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRow {
    pub question: String,
    #[serde(alias = "answer")]
    pub reference_answer: String,
    #[serde(default)]
    pub model_answer: Option<String>,
}

/// Rows to score offline.
///
/// Accepts the record written by `run` as well as the older
/// `questions_and_answers` layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringDataset {
    #[serde(default)]
    pub excerpt: String,
    #[serde(alias = "questions_and_answers")]
    pub items: Vec<DatasetRow>,
}

impl ScoringDataset {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn pairs(&self) -> Vec<QaPair> {
        self.items
            .iter()
            .map(|row| QaPair::new(&row.question, &row.reference_answer))
            .collect()
    }

    /// Model answers by position; rows without one get `sentinel`
    pub fn candidates(&self, sentinel: &str) -> Vec<String> {
        self.items
            .iter()
            .map(|row| row.model_answer.clone().unwrap_or_else(|| sentinel.to_string()))
            .collect()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

fn print_tiers(label: &str, tiers: &TierCounts) {
    println!(
        "  {:<10} high: {:>3}  medium: {:>3}  low: {:>3}",
        label, tiers.high, tiers.medium, tiers.low
    );
}

/// Generate a console report
pub fn print_console_report(record: &EvaluationRecord) {
    let metrics = &record.metrics;

    println!("\n=== QA Evaluation Results ===\n");
    println!("Timestamp: {}", record.timestamp);
    println!(
        "Rows: {} inspected, {} valid, {} rejected\n",
        record.validation.inspected, record.validation.valid, record.validation.rejected
    );

    println!("Checks:");
    println!("{:-<50}", "");
    for outcome in &record.checks.outcomes {
        println!(
            "  {:<28} {} ({:.3} / {:.2})",
            outcome.name,
            if outcome.passed { "PASS" } else { "FAIL" },
            outcome.metric,
            outcome.threshold
        );
    }
    println!(
        "  Passed {}/{}\n",
        record.checks.passed_tests, record.checks.total_tests
    );

    println!("Metrics:");
    println!("{:-<50}", "");
    println!(
        "  Score:    avg {:.3}  min {:.3}  max {:.3}  std {}",
        metrics.average_score,
        metrics.min_score,
        metrics.max_score,
        metrics
            .std_score
            .map(|s| format!("{:.3}", s))
            .unwrap_or_else(|| "n/a".to_string())
    );
    println!(
        "  Accuracy: avg {:.3}  min {:.3}  max {:.3}",
        metrics.average_accuracy, metrics.min_accuracy, metrics.max_accuracy
    );
    print_tiers("Score", &metrics.score_tiers);
    print_tiers("Accuracy", &metrics.accuracy_tiers);
    println!(
        "  Avg answer length: {:.1} chars, unique answers: {:.1}%\n",
        metrics.average_answer_length,
        metrics.unique_answers_ratio * 100.0
    );

    println!("Answers:");
    println!("{:-<50}", "");
    for (i, item) in record.items.iter().enumerate() {
        println!(
            "  {}. [{:.3} / acc {:.3}] {}",
            i + 1,
            item.score,
            item.accuracy,
            truncate(&item.question, 60)
        );
        println!("     {}", truncate(&item.model_answer, 80));
    }
}
