//! Summary statistics over a scored run

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Quality bucket for a score or accuracy value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    High,
    Medium,
    Low,
}

impl QualityTier {
    pub const HIGH_THRESHOLD: f64 = 0.8;
    pub const MEDIUM_THRESHOLD: f64 = 0.6;

    pub fn of(value: f64) -> Self {
        if value >= Self::HIGH_THRESHOLD {
            QualityTier::High
        } else if value >= Self::MEDIUM_THRESHOLD {
            QualityTier::Medium
        } else {
            QualityTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::High => "high",
            QualityTier::Medium => "medium",
            QualityTier::Low => "low",
        }
    }
}

/// How many values fell into each tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl TierCounts {
    pub fn from_values(values: &[f64]) -> Self {
        values.iter().fold(Self::default(), |mut counts, &v| {
            match QualityTier::of(v) {
                QualityTier::High => counts.high += 1,
                QualityTier::Medium => counts.medium += 1,
                QualityTier::Low => counts.low += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Aggregate statistics of one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub average_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    /// Sample standard deviation; absent for fewer than two scores
    pub std_score: Option<f64>,
    pub average_accuracy: f64,
    pub min_accuracy: f64,
    pub max_accuracy: f64,
    pub total_questions: usize,
    pub score_tiers: TierCounts,
    pub accuracy_tiers: TierCounts,
    /// Mean candidate length in characters
    pub average_answer_length: f64,
    pub unique_answers_ratio: f64,
}

/// Reduce per-item scores into a [`MetricsSummary`].
///
/// Returns `None` when `scores` or `accuracies` is empty; summarizing an
/// empty run is a caller error.
pub fn summarize(scores: &[f64], accuracies: &[f64], candidates: &[String]) -> Option<MetricsSummary> {
    if scores.is_empty() || accuracies.is_empty() {
        return None;
    }

    let (min_score, max_score) = min_max(scores);
    let (min_accuracy, max_accuracy) = min_max(accuracies);

    Some(MetricsSummary {
        average_score: mean(scores),
        min_score,
        max_score,
        std_score: sample_std(scores),
        average_accuracy: mean(accuracies),
        min_accuracy,
        max_accuracy,
        total_questions: scores.len(),
        score_tiers: TierCounts::from_values(scores),
        accuracy_tiers: TierCounts::from_values(accuracies),
        average_answer_length: average_length(candidates),
        unique_answers_ratio: unique_ratio(candidates),
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

fn average_length(candidates: &[String]) -> f64 {
    if candidates.is_empty() {
        return 0.0;
    }
    let total: usize = candidates.iter().map(|c| c.chars().count()).sum();
    total as f64 / candidates.len() as f64
}

/// Distinct candidates over all candidates; 0 for none
pub fn unique_ratio(candidates: &[String]) -> f64 {
    if candidates.is_empty() {
        return 0.0;
    }
    let distinct: HashSet<&str> = candidates.iter().map(String::as_str).collect();
    distinct.len() as f64 / candidates.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_run_has_no_summary() {
        assert!(summarize(&[], &[0.5], &[]).is_none());
        assert!(summarize(&[0.5], &[], &[]).is_none());
    }

    #[test]
    fn test_summary_values() {
        let scores = [0.9, 0.7, 0.5];
        let accuracies = [0.8, 0.6, 0.1];
        let candidates = strings(&["A", "A", "B"]);

        let summary = summarize(&scores, &accuracies, &candidates).unwrap();
        assert!((summary.average_score - 0.7).abs() < 1e-12);
        assert_eq!(summary.min_score, 0.5);
        assert_eq!(summary.max_score, 0.9);
        assert!((summary.std_score.unwrap() - 0.2).abs() < 1e-12);
        assert!((summary.average_accuracy - 0.5).abs() < 1e-12);
        assert_eq!(summary.min_accuracy, 0.1);
        assert_eq!(summary.max_accuracy, 0.8);
        assert_eq!(summary.total_questions, 3);
        assert_eq!(summary.score_tiers, TierCounts { high: 1, medium: 1, low: 1 });
        assert_eq!(summary.accuracy_tiers, TierCounts { high: 1, medium: 1, low: 1 });
        assert_eq!(summary.average_answer_length, 1.0);
        assert!((summary.unique_answers_ratio - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_score_has_no_std() {
        let summary = summarize(&[0.4], &[0.4], &strings(&["only answer"])).unwrap();
        assert_eq!(summary.std_score, None);
        assert_eq!(summary.average_answer_length, 11.0);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(QualityTier::of(0.8), QualityTier::High);
        assert_eq!(QualityTier::of(0.79999), QualityTier::Medium);
        assert_eq!(QualityTier::of(0.6), QualityTier::Medium);
        assert_eq!(QualityTier::of(0.59), QualityTier::Low);
    }

    #[test]
    fn test_unique_ratio_without_candidates() {
        assert_eq!(unique_ratio(&[]), 0.0);
    }
}
