//! Data-validation gate in front of scoring

use serde::{Deserialize, Serialize};

use crate::lexicon::PhraseLexicon;
use crate::types::{QaPair, ValidatedTriple};

/// Fields must be strictly longer than this many characters after trimming
pub const MIN_FIELD_LEN: usize = 10;

/// Which part of a triple failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripleField {
    Question,
    ReferenceAnswer,
    ModelAnswer,
}

impl std::fmt::Display for TripleField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TripleField::Question => write!(f, "question"),
            TripleField::ReferenceAnswer => write!(f, "reference_answer"),
            TripleField::ModelAnswer => write!(f, "model_answer"),
        }
    }
}

/// Why a row was left out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// Empty, whitespace-only or not longer than [`MIN_FIELD_LEN`]
    TooShort { field: TripleField },
    /// Model answer contains a rejection phrase
    RejectedPhrase { phrase: String },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::TooShort { field } => write!(f, "{} too short", field),
            RejectReason::RejectedPhrase { phrase } => write!(f, "contains \"{}\"", phrase),
        }
    }
}

/// A rejected row and its position in the input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub index: usize,
    pub reason: RejectReason,
}

/// Result of [`DataValidator::validate_with_report`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub triples: Vec<ValidatedTriple>,
    pub rejections: Vec<Rejection>,
    /// Rows looked at: `min(pairs, candidates)`
    pub inspected: usize,
}

impl ValidationReport {
    pub fn valid_count(&self) -> usize {
        self.triples.len()
    }
}

/// Filters triples that do not carry enough content to be scored
#[derive(Debug, Clone, Default)]
pub struct DataValidator {
    lexicon: PhraseLexicon,
}

impl DataValidator {
    pub fn new(lexicon: PhraseLexicon) -> Self {
        Self { lexicon }
    }

    /// Valid triples in input order
    pub fn validate(&self, pairs: &[QaPair], candidates: &[String]) -> Vec<ValidatedTriple> {
        self.validate_with_report(pairs, candidates).triples
    }

    /// Valid triples plus the reason each other row was dropped
    pub fn validate_with_report(&self, pairs: &[QaPair], candidates: &[String]) -> ValidationReport {
        let inspected = pairs.len().min(candidates.len());
        let mut report = ValidationReport {
            inspected,
            ..Default::default()
        };

        for (index, (pair, candidate)) in pairs.iter().zip(candidates).enumerate() {
            match self.check(pair, candidate) {
                Ok(triple) => report.triples.push(triple),
                Err(reason) => {
                    tracing::debug!("Rejected row {}: {}", index, reason);
                    report.rejections.push(Rejection { index, reason });
                }
            }
        }

        report
    }

    fn check(&self, pair: &QaPair, candidate: &str) -> Result<ValidatedTriple, RejectReason> {
        let question = pair.question.trim();
        let reference = pair.reference_answer.trim();
        let answer = candidate.trim();

        for (field, text) in [
            (TripleField::Question, question),
            (TripleField::ReferenceAnswer, reference),
            (TripleField::ModelAnswer, answer),
        ] {
            if text.chars().count() <= MIN_FIELD_LEN {
                return Err(RejectReason::TooShort { field });
            }
        }

        if let Some(phrase) = self.lexicon.find_rejection(answer) {
            return Err(RejectReason::RejectedPhrase {
                phrase: phrase.to_string(),
            });
        }

        Ok(ValidatedTriple {
            question: question.to_string(),
            reference_answer: reference.to_string(),
            model_answer: answer.to_string(),
        })
    }
}
