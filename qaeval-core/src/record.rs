//! Persisted shape of an evaluation run

use serde::{Deserialize, Serialize};

use crate::checks::{CheckOutcome, CheckReport};
use crate::metrics::MetricsSummary;
use crate::types::ScoredAnswer;
use crate::validation::ValidationReport;

/// Check tally as stored in the record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckSummary {
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    #[serde(default)]
    pub outcomes: Vec<CheckOutcome>,
}

impl From<&CheckReport> for CheckSummary {
    fn from(report: &CheckReport) -> Self {
        Self {
            total_tests: report.total,
            passed_tests: report.passed,
            failed_tests: report.failed(),
            outcomes: report.outcomes.clone(),
        }
    }
}

/// How many rows survived validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationCounts {
    pub inspected: usize,
    pub valid: usize,
    pub rejected: usize,
}

impl From<&ValidationReport> for ValidationCounts {
    fn from(report: &ValidationReport) -> Self {
        Self {
            inspected: report.inspected,
            valid: report.valid_count(),
            rejected: report.rejections.len(),
        }
    }
}

/// Everything one run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Set by the caller; the core has no clock
    pub timestamp: String,
    pub excerpt: String,
    pub items: Vec<ScoredAnswer>,
    pub metrics: MetricsSummary,
    pub checks: CheckSummary,
    pub validation: ValidationCounts,
}

impl EvaluationRecord {
    pub fn new(
        timestamp: impl Into<String>,
        excerpt: impl Into<String>,
        items: Vec<ScoredAnswer>,
        metrics: MetricsSummary,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            excerpt: excerpt.into(),
            items,
            metrics,
            checks: CheckSummary::default(),
            validation: ValidationCounts::default(),
        }
    }

    pub fn with_checks(mut self, report: &CheckReport) -> Self {
        self.checks = CheckSummary::from(report);
        self
    }

    pub fn with_validation(mut self, report: &ValidationReport) -> Self {
        self.validation = ValidationCounts::from(report);
        self
    }
}
