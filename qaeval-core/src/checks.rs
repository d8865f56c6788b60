//! Dataset-level checks whose pass rate feeds the composite base score

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::ValidatedTriple;

/// Result of one dataset check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    /// Measured value compared against `threshold`
    pub metric: f64,
    pub threshold: f64,
}

/// A check run once over the whole validated dataset
pub trait DatasetCheck {
    /// Stable identifier used in reports
    fn name(&self) -> &str;

    fn run(&self, triples: &[ValidatedTriple]) -> CheckOutcome;
}

/// Passes when enough model answers are distinct
#[derive(Debug, Clone, PartialEq)]
pub struct UniquenessCheck {
    pub threshold: f64,
    /// Smaller datasets are not checked by the default suite
    pub min_rows: usize,
}

impl Default for UniquenessCheck {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            min_rows: 5,
        }
    }
}

impl DatasetCheck for UniquenessCheck {
    fn name(&self) -> &str {
        "unique_model_answers"
    }

    fn run(&self, triples: &[ValidatedTriple]) -> CheckOutcome {
        let metric = if triples.is_empty() {
            0.0
        } else {
            let distinct: HashSet<&str> = triples.iter().map(|t| t.model_answer.as_str()).collect();
            distinct.len() as f64 / triples.len() as f64
        };
        outcome(self.name(), metric, self.threshold)
    }
}

/// Passes when enough model answers are non-empty
#[derive(Debug, Clone, PartialEq)]
pub struct CompletenessCheck {
    pub threshold: f64,
}

impl Default for CompletenessCheck {
    fn default() -> Self {
        Self { threshold: 0.8 }
    }
}

impl DatasetCheck for CompletenessCheck {
    fn name(&self) -> &str {
        "model_answer_completeness"
    }

    fn run(&self, triples: &[ValidatedTriple]) -> CheckOutcome {
        let metric = if triples.is_empty() {
            0.0
        } else {
            let filled = triples.iter().filter(|t| !t.model_answer.trim().is_empty()).count();
            filled as f64 / triples.len() as f64
        };
        outcome(self.name(), metric, self.threshold)
    }
}

fn outcome(name: &str, metric: f64, threshold: f64) -> CheckOutcome {
    CheckOutcome {
        name: name.to_string(),
        passed: metric >= threshold,
        metric,
        threshold,
    }
}

/// Tally of a suite run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub outcomes: Vec<CheckOutcome>,
    pub passed: usize,
    pub total: usize,
}

impl CheckReport {
    pub fn failed(&self) -> usize {
        self.total - self.passed
    }

    pub fn pass_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.passed as f64 / self.total as f64)
    }
}

/// Ordered collection of dataset checks
#[derive(Default)]
pub struct CheckSuite {
    checks: Vec<Box<dyn DatasetCheck + Send + Sync>>,
}

impl CheckSuite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completeness always; uniqueness only once the dataset is large enough
    /// for the ratio to mean something.
    pub fn default_for(triples: &[ValidatedTriple]) -> Self {
        let uniqueness = UniquenessCheck::default();
        let mut suite = Self::new();
        if triples.len() >= uniqueness.min_rows {
            suite = suite.with_check(uniqueness);
        }
        suite.with_check(CompletenessCheck::default())
    }

    pub fn with_check<C: DatasetCheck + Send + Sync + 'static>(mut self, check: C) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn run(&self, triples: &[ValidatedTriple]) -> CheckReport {
        let outcomes: Vec<CheckOutcome> = self.checks.iter().map(|c| c.run(triples)).collect();
        let passed = outcomes.iter().filter(|o| o.passed).count();
        CheckReport {
            total: outcomes.len(),
            passed,
            outcomes,
        }
    }
}
