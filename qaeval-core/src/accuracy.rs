//! Per-answer accuracy against a reference answer

use serde::{Deserialize, Serialize};

use crate::lexicon::PhraseLexicon;
use crate::similarity::{key_phrases, similarity_with, words, SimilarityOptions};

/// Accuracy assigned to an answer that declines to answer
pub const REFUSAL_ACCURACY: f64 = 0.1;

/// Weights and length bounds for [`AccuracyScorer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyWeights {
    pub similarity: f64,
    pub phrase_overlap: f64,
    pub question_relevance: f64,
    /// Added when the answer length is within `[bonus_min_len, bonus_max_len]`
    pub length_bonus: f64,
    /// Subtracted when the answer is longer than `penalty_over_len`
    pub length_penalty: f64,
    pub bonus_min_len: usize,
    pub bonus_max_len: usize,
    pub penalty_over_len: usize,
}

impl Default for AccuracyWeights {
    fn default() -> Self {
        Self {
            similarity: 0.5,
            phrase_overlap: 0.3,
            question_relevance: 0.2,
            length_bonus: 0.1,
            length_penalty: 0.1,
            bonus_min_len: 20,
            bonus_max_len: 500,
            penalty_over_len: 1000,
        }
    }
}

/// Component values behind an accuracy score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyBreakdown {
    pub similarity: f64,
    pub phrase_overlap: f64,
    pub question_relevance: f64,
    pub length_adjustment: f64,
    /// Refusal phrase that short-circuited scoring, if any
    pub refusal: Option<String>,
    pub accuracy: f64,
}

impl AccuracyBreakdown {
    fn fixed(accuracy: f64, refusal: Option<String>) -> Self {
        Self {
            similarity: 0.0,
            phrase_overlap: 0.0,
            question_relevance: 0.0,
            length_adjustment: 0.0,
            refusal,
            accuracy,
        }
    }
}

/// Scores a candidate answer against its reference and question
#[derive(Debug, Clone, Default)]
pub struct AccuracyScorer {
    lexicon: PhraseLexicon,
    weights: AccuracyWeights,
    similarity: SimilarityOptions,
}

impl AccuracyScorer {
    pub fn new(lexicon: PhraseLexicon) -> Self {
        Self {
            lexicon,
            weights: AccuracyWeights::default(),
            similarity: SimilarityOptions::default(),
        }
    }

    pub fn with_weights(mut self, weights: AccuracyWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_similarity_options(mut self, options: SimilarityOptions) -> Self {
        self.similarity = options;
        self
    }

    pub fn lexicon(&self) -> &PhraseLexicon {
        &self.lexicon
    }

    pub fn weights(&self) -> &AccuracyWeights {
        &self.weights
    }

    /// Accuracy in `[0, 1]`.
    ///
    /// Empty or whitespace-only input scores 0.0 and a refusal scores exactly
    /// [`REFUSAL_ACCURACY`].
    pub fn accuracy_score(&self, candidate: &str, reference: &str, question: &str) -> f64 {
        self.breakdown(candidate, reference, question).accuracy
    }

    /// Same as [`accuracy_score`](Self::accuracy_score) but keeps the components
    pub fn breakdown(&self, candidate: &str, reference: &str, question: &str) -> AccuracyBreakdown {
        if is_blank(candidate) || is_blank(reference) || is_blank(question) {
            return AccuracyBreakdown::fixed(0.0, None);
        }

        if let Some(phrase) = self.lexicon.find_refusal(candidate) {
            return AccuracyBreakdown::fixed(REFUSAL_ACCURACY, Some(phrase.to_string()));
        }

        let w = &self.weights;

        let similarity = similarity_with(candidate, reference, self.similarity);
        let phrase_overlap = phrase_overlap(candidate, reference);
        let question_relevance = question_relevance(question, candidate);

        let len = candidate.chars().count();
        let length_adjustment = if (w.bonus_min_len..=w.bonus_max_len).contains(&len) {
            w.length_bonus
        } else if len > w.penalty_over_len {
            -w.length_penalty
        } else {
            0.0
        };

        let raw = similarity * w.similarity
            + phrase_overlap * w.phrase_overlap
            + question_relevance * w.question_relevance
            + length_adjustment;

        AccuracyBreakdown {
            similarity,
            phrase_overlap,
            question_relevance,
            length_adjustment,
            refusal: None,
            accuracy: raw.clamp(0.0, 1.0),
        }
    }
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Share of the reference's key phrases that also occur in the candidate
fn phrase_overlap(candidate: &str, reference: &str) -> f64 {
    let reference_phrases = key_phrases(reference);
    if reference_phrases.is_empty() {
        return 0.0;
    }
    let candidate_phrases = key_phrases(candidate);
    let shared = reference_phrases.intersection(&candidate_phrases).count();
    shared as f64 / reference_phrases.len() as f64
}

/// Share of question words repeated in the candidate
fn question_relevance(question: &str, candidate: &str) -> f64 {
    let question_words = words(question);
    let candidate_words = words(candidate);
    let shared = question_words.intersection(&candidate_words).count();
    shared as f64 / question_words.len().max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_inputs_score_zero() {
        let scorer = AccuracyScorer::default();
        assert_eq!(scorer.accuracy_score("", "reference text", "question?"), 0.0);
        assert_eq!(scorer.accuracy_score("candidate", "", "question?"), 0.0);
        assert_eq!(scorer.accuracy_score("candidate", "reference", "   "), 0.0);
    }

    #[test]
    fn test_refusal_short_circuits() {
        let scorer = AccuracyScorer::default();
        let breakdown = scorer.breakdown(
            "I don't know",
            "Woland is the devil who visits Moscow.",
            "Who is Woland?",
        );
        assert_eq!(breakdown.accuracy, REFUSAL_ACCURACY);
        assert_eq!(breakdown.refusal.as_deref(), Some("don't know"));
    }

    #[test]
    fn test_russian_refusal() {
        let scorer = AccuracyScorer::new(PhraseLexicon::russian());
        let score = scorer.accuracy_score(
            "Не могу ответить на этот вопрос.",
            "Воланд - это дьявол.",
            "Кто такой Воланд?",
        );
        assert_eq!(score, REFUSAL_ACCURACY);
    }

    #[test]
    fn test_close_paraphrase_scores_high() {
        let scorer = AccuracyScorer::default();
        let score = scorer.accuracy_score(
            "The protagonist is a writer who wrote a novel about Pontius Pilate.",
            "The writer who authored a novel about Pontius Pilate.",
            "Who is the protagonist?",
        );
        assert!(score >= 0.5 && score <= 0.9, "score was {}", score);
    }

    #[test]
    fn test_length_adjustments() {
        let scorer = AccuracyScorer::default();

        let short = scorer.breakdown("Woland.", "Woland is the devil.", "Who?");
        assert_eq!(short.length_adjustment, 0.0);

        let sized = scorer.breakdown("Woland is the devil in Moscow.", "Woland is the devil.", "Who?");
        assert_eq!(sized.length_adjustment, 0.1);

        let long_answer = "word ".repeat(250);
        let long = scorer.breakdown(&long_answer, "Woland is the devil.", "Who?");
        assert_eq!(long.length_adjustment, -0.1);
    }

    #[test]
    fn test_unrelated_answer_scores_low() {
        let scorer = AccuracyScorer::default();
        let score = scorer.accuracy_score(
            "Bananas grow on large herbaceous plants.",
            "Margarita is the Master's beloved.",
            "Who is Margarita?",
        );
        assert!(score < 0.4, "score was {}", score);
    }

    #[test]
    fn test_custom_weights() {
        let weights = AccuracyWeights {
            similarity: 1.0,
            phrase_overlap: 0.0,
            question_relevance: 0.0,
            length_bonus: 0.0,
            ..AccuracyWeights::default()
        };
        let scorer = AccuracyScorer::default().with_weights(weights);
        let score = scorer.accuracy_score("same answer text", "same answer text", "unrelated?");
        assert!((score - 1.0).abs() < 1e-9);
    }
}
