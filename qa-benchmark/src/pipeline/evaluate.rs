//! Validation, dataset checks and scoring over one run's rows

use qaeval::{
    summarize, AccuracyScorer, CheckSuite, CompositeScorer, DataValidator, EvaluationRecord, PhraseLexicon, QaPair,
    ScoredAnswer,
};

use super::PipelineError;

/// Turns aligned QA pairs and candidate texts into an [`EvaluationRecord`]
#[derive(Debug, Clone)]
pub struct Evaluator {
    validator: DataValidator,
    scorer: CompositeScorer,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(PhraseLexicon::default())
    }
}

impl Evaluator {
    pub fn new(lexicon: PhraseLexicon) -> Self {
        Self {
            validator: DataValidator::new(lexicon.clone()),
            scorer: CompositeScorer::new(AccuracyScorer::new(lexicon)),
        }
    }

    pub fn with_scorer(mut self, scorer: CompositeScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Score `candidates` against `pairs` position by position.
    ///
    /// Fails with [`PipelineError::NoValidData`] when validation leaves
    /// nothing to score.
    pub fn evaluate(
        &self,
        excerpt: &str,
        pairs: &[QaPair],
        candidates: &[String],
        timestamp: impl Into<String>,
    ) -> Result<EvaluationRecord, PipelineError> {
        let report = self.validator.validate_with_report(pairs, candidates);
        tracing::info!("{} of {} rows passed validation", report.valid_count(), report.inspected);

        if report.triples.is_empty() {
            return Err(PipelineError::NoValidData {
                inspected: report.inspected,
            });
        }

        let checks = CheckSuite::default_for(&report.triples).run(&report.triples);
        for outcome in &checks.outcomes {
            tracing::info!(
                "Check {}: {} (metric {:.3}, threshold {:.2})",
                outcome.name,
                if outcome.passed { "passed" } else { "failed" },
                outcome.metric,
                outcome.threshold
            );
        }

        let records = self.scorer.score_records(&report.triples, checks.passed, checks.total);
        let items: Vec<ScoredAnswer> = report
            .triples
            .iter()
            .zip(records)
            .map(|(triple, record)| ScoredAnswer::from_triple(triple, record))
            .collect();

        let scores: Vec<f64> = items.iter().map(|i| i.score).collect();
        let accuracies: Vec<f64> = items.iter().map(|i| i.accuracy).collect();
        let answers: Vec<String> = items.iter().map(|i| i.model_answer.clone()).collect();
        let metrics = summarize(&scores, &accuracies, &answers).ok_or(PipelineError::NoValidData {
            inspected: report.inspected,
        })?;

        Ok(EvaluationRecord::new(timestamp, excerpt, items, metrics)
            .with_checks(&checks)
            .with_validation(&report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs() -> Vec<QaPair> {
        vec![
            QaPair::new(
                "Who is the protagonist of the novel?",
                "The Master, a writer who created a novel about Pontius Pilate.",
            ),
            QaPair::new(
                "Where does Berlioz meet the stranger?",
                "At the Patriarch's Ponds on a hot spring evening.",
            ),
        ]
    }

    #[test]
    fn test_evaluate_scores_valid_rows() {
        let candidates = vec![
            "The Master is a writer who wrote about Pontius Pilate.".to_string(),
            "There is no information about that.".to_string(),
        ];
        let record = Evaluator::new(PhraseLexicon::english())
            .evaluate("excerpt", &pairs(), &candidates, "2026-01-01T00:00:00Z")
            .unwrap();

        assert_eq!(record.items.len(), 1);
        assert_eq!(record.validation.inspected, 2);
        assert_eq!(record.validation.rejected, 1);
        assert_eq!(record.checks.total_tests, 1);
        assert_eq!(record.metrics.total_questions, 1);
        assert!(record.items[0].score > 0.0 && record.items[0].score <= 1.0);
    }

    #[test]
    fn test_evaluate_without_valid_rows_fails() {
        let candidates = vec!["short".to_string(), "answer retrieval failed".to_string()];
        let err = Evaluator::new(PhraseLexicon::english())
            .evaluate("excerpt", &pairs(), &candidates, "ts")
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoValidData { inspected: 2 }));
    }
}
