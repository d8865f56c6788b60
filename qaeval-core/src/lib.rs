//! qaeval - deterministic scoring of model answers against reference answers
//!
//! Takes `(question, reference answer, candidate answer)` triples, gates them
//! through a validator and produces a bounded accuracy and composite score
//! per answer, plus summary statistics for the run.
//!
//! # Example
//!
//! ```rust
//! use qaeval::prelude::*;
//!
//! let pairs = vec![QaPair::new(
//!     "Who is the protagonist of the novel?",
//!     "The Master, a writer who created a novel about Pontius Pilate.",
//! )];
//! let candidates = vec!["The Master is a writer who wrote about Pontius Pilate.".to_string()];
//!
//! let triples = DataValidator::default().validate(&pairs, &candidates);
//! let checks = CheckSuite::default_for(&triples).run(&triples);
//! let records = CompositeScorer::default().score_records(&triples, checks.passed, checks.total);
//!
//! let scores: Vec<f64> = records.iter().map(|r| r.score).collect();
//! let accuracies: Vec<f64> = records.iter().map(|r| r.accuracy).collect();
//! let summary = summarize(&scores, &accuracies, &candidates).unwrap();
//! assert!(summary.max_score <= 1.0);
//! ```

pub mod accuracy;
pub mod checks;
pub mod composite;
pub mod lexicon;
pub mod metrics;
pub mod record;
pub mod similarity;
pub mod types;
pub mod validation;

pub use accuracy::{AccuracyBreakdown, AccuracyScorer, AccuracyWeights, REFUSAL_ACCURACY};
pub use checks::{CheckOutcome, CheckReport, CheckSuite, CompletenessCheck, DatasetCheck, UniquenessCheck};
pub use composite::{CompositeScorer, CompositeWeights};
pub use lexicon::{Locale, PhraseLexicon};
pub use metrics::{summarize, MetricsSummary, QualityTier, TierCounts};
pub use record::{CheckSummary, EvaluationRecord, ValidationCounts};
pub use similarity::{key_phrases, similarity, similarity_with, words, SimilarityOptions};
pub use types::{
    align_candidates, CandidateAnswer, QaPair, ScoreRecord, ScoredAnswer, ValidatedTriple,
    ANSWER_RETRIEVAL_FAILED,
};
pub use validation::{DataValidator, RejectReason, Rejection, TripleField, ValidationReport};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::accuracy::AccuracyScorer;
    pub use crate::checks::{CheckReport, CheckSuite, DatasetCheck};
    pub use crate::composite::CompositeScorer;
    pub use crate::lexicon::{Locale, PhraseLexicon};
    pub use crate::metrics::{summarize, MetricsSummary};
    pub use crate::record::EvaluationRecord;
    pub use crate::types::{CandidateAnswer, QaPair, ScoreRecord, ScoredAnswer, ValidatedTriple};
    pub use crate::validation::DataValidator;
}
