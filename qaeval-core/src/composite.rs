//! Composite score: accuracy plus check results and structural penalties

use serde::{Deserialize, Serialize};

use crate::accuracy::AccuracyScorer;
use crate::types::{ScoreRecord, ValidatedTriple};

/// Adjustments applied on top of accuracy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeWeights {
    pub base: f64,
    /// Scale applied to `(pass_rate - 0.5)` of the external checks
    pub check_influence: f64,
    pub accuracy: f64,
    pub length_bonus: f64,
    pub too_short_penalty: f64,
    pub too_long_penalty: f64,
    pub non_empty_bonus: f64,
    pub empty_penalty: f64,
    pub repetition_penalty: f64,
    pub low_quality_penalty: f64,
    pub bonus_min_len: usize,
    pub bonus_max_len: usize,
    /// Answers shorter than this take `too_short_penalty`
    pub short_len: usize,
    pub long_len: usize,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            base: 0.5,
            check_influence: 0.1,
            accuracy: 0.5,
            length_bonus: 0.05,
            too_short_penalty: 0.2,
            too_long_penalty: 0.1,
            non_empty_bonus: 0.05,
            empty_penalty: 0.3,
            repetition_penalty: 0.15,
            low_quality_penalty: 0.2,
            bonus_min_len: 20,
            bonus_max_len: 500,
            short_len: 10,
            long_len: 1000,
        }
    }
}

/// Folds accuracy, external check results and penalties into one score
#[derive(Debug, Clone, Default)]
pub struct CompositeScorer {
    accuracy: AccuracyScorer,
    weights: CompositeWeights,
}

impl CompositeScorer {
    pub fn new(accuracy: AccuracyScorer) -> Self {
        Self {
            accuracy,
            weights: CompositeWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: CompositeWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn accuracy_scorer(&self) -> &AccuracyScorer {
        &self.accuracy
    }

    /// Starting score shared by every answer of a run
    pub fn base_score(&self, checks_passed: usize, checks_total: usize) -> f64 {
        let w = &self.weights;
        if checks_total == 0 {
            return w.base;
        }
        let pass_rate = checks_passed as f64 / checks_total as f64;
        w.base + (pass_rate - 0.5) * w.check_influence
    }

    /// One score in `[0, 1]` per triple, in input order
    pub fn composite_scores(
        &self,
        triples: &[ValidatedTriple],
        checks_passed: usize,
        checks_total: usize,
    ) -> Vec<f64> {
        self.score_records(triples, checks_passed, checks_total)
            .into_iter()
            .map(|r| r.score)
            .collect()
    }

    /// Accuracy and composite score per triple, in input order
    pub fn score_records(
        &self,
        triples: &[ValidatedTriple],
        checks_passed: usize,
        checks_total: usize,
    ) -> Vec<ScoreRecord> {
        let base = self.base_score(checks_passed, checks_total);

        triples
            .iter()
            .enumerate()
            .map(|(i, triple)| {
                let accuracy = self.accuracy.accuracy_score(
                    &triple.model_answer,
                    &triple.reference_answer,
                    &triple.question,
                );
                let previous = i
                    .checked_sub(1)
                    .map(|p| triples[p].model_answer.as_str());
                let score = self.score_one(base, accuracy, &triple.model_answer, previous);
                ScoreRecord { accuracy, score }
            })
            .collect()
    }

    fn score_one(&self, base: f64, accuracy: f64, answer: &str, previous: Option<&str>) -> f64 {
        let w = &self.weights;
        let mut score = base + accuracy * w.accuracy;

        let len = answer.chars().count();
        if (w.bonus_min_len..=w.bonus_max_len).contains(&len) {
            score += w.length_bonus;
        } else if len < w.short_len {
            score -= w.too_short_penalty;
        } else if len > w.long_len {
            score -= w.too_long_penalty;
        }

        if answer.trim().is_empty() {
            score -= w.empty_penalty;
        } else {
            score += w.non_empty_bonus;
        }

        if previous == Some(answer) {
            score -= w.repetition_penalty;
        }

        if self.accuracy.lexicon().find_low_quality(answer).is_some() {
            score -= w.low_quality_penalty;
        }

        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(question: &str, reference: &str, answer: &str) -> ValidatedTriple {
        ValidatedTriple {
            question: question.to_string(),
            reference_answer: reference.to_string(),
            model_answer: answer.to_string(),
        }
    }

    #[test]
    fn test_base_score() {
        let scorer = CompositeScorer::default();
        assert_eq!(scorer.base_score(0, 0), 0.5);
        assert!((scorer.base_score(1, 1) - 0.55).abs() < 1e-12);
        assert!((scorer.base_score(0, 2) - 0.45).abs() < 1e-12);
        assert!((scorer.base_score(1, 2) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_length_matches_input() {
        let triples = vec![
            triple("Who is the protagonist?", "The Master, a writer.", "The Master is the protagonist."),
            triple("Who is Woland in the story?", "The devil in Moscow.", "Woland is the devil."),
        ];
        let scores = CompositeScorer::default().composite_scores(&triples, 1, 2);
        assert_eq!(scores.len(), 2);
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
        assert!(CompositeScorer::default().composite_scores(&[], 1, 1).is_empty());
    }

    #[test]
    fn test_repetition_penalty() {
        let answer = "Woland is a mysterious foreigner in Moscow.";
        let first = triple("Who is the foreigner?", "Woland, the devil.", answer);
        let second = triple("Who is the professor?", "Woland, a professor of black magic.", answer);

        let scorer = CompositeScorer::default();
        let together = scorer.score_records(&[first.clone(), second.clone()], 0, 0);
        let alone = scorer.score_records(&[second], 0, 0);

        assert_eq!(together[1].accuracy, alone[0].accuracy);
        assert!((alone[0].score - together[1].score - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_low_quality_and_repetition_stack() {
        let answer = "The excerpt says nothing, I don't know the answer.";
        let triples = vec![
            triple("Where does the action take place?", "At the Patriarch's Ponds.", answer),
            triple("When does the action take place?", "On a hot spring evening.", answer),
        ];

        let records = CompositeScorer::default().score_records(&triples, 0, 0);
        // 0.5 + 0.1 * 0.5 + 0.05 + 0.05 - 0.2
        assert!((records[0].score - 0.45).abs() < 1e-9);
        assert!((records[1].score - 0.30).abs() < 1e-9);
    }

    #[test]
    fn test_too_short_answer_penalty() {
        let scorer = CompositeScorer::default();
        let t = triple("Where does Berlioz die?", "Near the Patriarch's Ponds.", "Moscow.");
        let accuracy = scorer
            .accuracy_scorer()
            .accuracy_score(&t.model_answer, &t.reference_answer, &t.question);

        let records = scorer.score_records(&[t], 0, 0);
        // 0.5 + acc * 0.5 - 0.2 + 0.05
        assert_eq!(records[0].accuracy, accuracy);
        assert!((records[0].score - (0.35 + accuracy * 0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_empty_answer_clamps_to_zero() {
        let records = CompositeScorer::default()
            .score_records(&[triple("Who is Woland?", "The devil.", "")], 0, 0);
        // 0.5 + 0.0 - 0.2 - 0.3
        assert_eq!(records[0].accuracy, 0.0);
        assert!(records[0].score.abs() < 1e-9);

        let records = CompositeScorer::default()
            .score_records(&[triple("Who is Woland?", "The devil.", "   ")], 0, 0);
        assert!(records[0].score.abs() < 1e-9);
    }

    #[test]
    fn test_too_long_answer_penalty() {
        let answer = "The devil visited Moscow. ".repeat(47);
        let answer = answer[..1200].to_string();
        assert_eq!(answer.chars().count(), 1200);

        let scorer = CompositeScorer::default();
        let t = triple("Who visited Moscow?", "The devil visited Moscow.", &answer);
        let accuracy = scorer
            .accuracy_scorer()
            .accuracy_score(&t.model_answer, &t.reference_answer, &t.question);

        let records = scorer.score_records(&[t], 0, 0);
        // 0.5 + acc * 0.5 - 0.1 + 0.05
        assert!((records[0].score - (0.45 + accuracy * 0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_length_bonus_boundaries() {
        let scorer = CompositeScorer::default();
        let score = |answer: &str| {
            let t = triple("Who visited Moscow?", "The devil visited Moscow.", answer);
            let acc = scorer
                .accuracy_scorer()
                .accuracy_score(&t.model_answer, &t.reference_answer, &t.question);
            scorer.score_records(&[t], 0, 0)[0].score - acc * 0.5
        };

        // 10..20 and 501..=1000 chars get neither bonus nor penalty
        assert!((score(&"x".repeat(10)) - 0.55).abs() < 1e-9);
        assert!((score(&"x".repeat(20)) - 0.60).abs() < 1e-9);
        assert!((score(&"x".repeat(1000)) - 0.55).abs() < 1e-9);
        assert!((score(&"x".repeat(1001)) - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_scores_are_clamped() {
        let weights = CompositeWeights {
            base: 2.0,
            ..CompositeWeights::default()
        };
        let scorer = CompositeScorer::default().with_weights(weights);
        let triples = vec![triple("Who is Woland here?", "Woland is the devil.", "Woland is the devil.")];
        assert_eq!(scorer.composite_scores(&triples, 0, 0), vec![1.0]);
    }
}
