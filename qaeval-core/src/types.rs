//! Value types shared by the scoring pipeline

use serde::{Deserialize, Serialize};

/// Sentinel stored when no candidate answer could be obtained for a question.
pub const ANSWER_RETRIEVAL_FAILED: &str = "answer retrieval failed";

/// A generated question with its ground-truth answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    /// Older datasets name this field `answer`
    #[serde(alias = "answer")]
    pub reference_answer: String,
}

impl QaPair {
    pub fn new(question: impl Into<String>, reference_answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            reference_answer: reference_answer.into(),
        }
    }
}

/// An answer produced by the model under evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateAnswer {
    pub text: String,
    pub source_question: String,
}

impl CandidateAnswer {
    pub fn new(text: impl Into<String>, source_question: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_question: source_question.into(),
        }
    }

    /// Placeholder for a question the answering collaborator never answered
    pub fn retrieval_failed(source_question: impl Into<String>) -> Self {
        Self::new(ANSWER_RETRIEVAL_FAILED, source_question)
    }
}

/// Pair candidate texts with QA pairs by position.
///
/// Candidates beyond the number of pairs are dropped; missing ones are filled
/// with `sentinel` (normally [`ANSWER_RETRIEVAL_FAILED`]), so the result
/// always has `pairs.len()` entries.
pub fn align_candidates(
    pairs: &[QaPair],
    candidates: &[CandidateAnswer],
    sentinel: &str,
) -> Vec<String> {
    (0..pairs.len())
        .map(|i| {
            candidates
                .get(i)
                .map(|c| c.text.clone())
                .unwrap_or_else(|| sentinel.to_string())
        })
        .collect()
}

/// A (question, reference, candidate) triple that passed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedTriple {
    pub question: String,
    pub reference_answer: String,
    pub model_answer: String,
}

/// Accuracy and composite score for one answer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub accuracy: f64,
    pub score: f64,
}

/// A scored answer as it appears in the persisted record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAnswer {
    pub question: String,
    pub reference_answer: String,
    pub model_answer: String,
    pub score: f64,
    pub accuracy: f64,
}

impl ScoredAnswer {
    pub fn from_triple(triple: &ValidatedTriple, record: ScoreRecord) -> Self {
        Self {
            question: triple.question.clone(),
            reference_answer: triple.reference_answer.clone(),
            model_answer: triple.model_answer.clone(),
            score: record.score,
            accuracy: record.accuracy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_pads_missing_candidates() {
        let pairs = vec![
            QaPair::new("Who is Woland here?", "The devil visiting Moscow."),
            QaPair::new("Where does it happen?", "At the Patriarch's Ponds."),
        ];
        let candidates = vec![CandidateAnswer::new("Woland is the devil.", "Who is Woland here?")];

        let aligned = align_candidates(&pairs, &candidates, ANSWER_RETRIEVAL_FAILED);
        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned[0], "Woland is the devil.");
        assert_eq!(aligned[1], ANSWER_RETRIEVAL_FAILED);
    }

    #[test]
    fn test_align_drops_extra_candidates() {
        let pairs = vec![QaPair::new("Who is Woland here?", "The devil visiting Moscow.")];
        let candidates = vec![
            CandidateAnswer::new("first", "q1"),
            CandidateAnswer::new("second", "q2"),
        ];

        assert_eq!(align_candidates(&pairs, &candidates, "missing"), vec!["first".to_string()]);
    }

    #[test]
    fn test_qa_pair_accepts_legacy_answer_field() {
        let pair: QaPair =
            serde_json::from_str(r#"{"question": "Who?", "answer": "Him."}"#).unwrap();
        assert_eq!(pair.reference_answer, "Him.");
    }
}
