//! Dataset-level statistics

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::JudgeError;
use crate::outcome::ScoredExample;
use crate::path::FieldPath;

/// How failed extractions enter per-field denominators.
///
/// Overall accuracy always counts a failure as incorrect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Failed examples contribute an all-false row to every field they carry
    #[default]
    CountAsIncorrect,
    /// Failed examples are left out of per-field tallies
    ExcludeFromFields,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::CountAsIncorrect => "count_as_incorrect",
            FailurePolicy::ExcludeFromFields => "exclude_from_fields",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = JudgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "count_as_incorrect" | "incorrect" => Ok(FailurePolicy::CountAsIncorrect),
            "exclude_from_fields" | "exclude" => Ok(FailurePolicy::ExcludeFromFields),
            _ => Err(JudgeError::UnknownFailurePolicy(s.to_string())),
        }
    }
}

/// Correct and present counts for one field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTally {
    pub correct: usize,
    pub present: usize,
}

impl FieldTally {
    pub fn accuracy(&self) -> f64 {
        if self.present == 0 {
            0.0
        } else {
            self.correct as f64 / self.present as f64
        }
    }
}

/// Summary numbers for one benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub total_examples: usize,
    pub parsed_examples: usize,
    pub extraction_failures: usize,
    pub exact_matches: usize,
    /// Exact matches over all examples, failures included
    pub overall_accuracy: f64,
    pub parse_success_rate: f64,
    pub failure_policy: FailurePolicy,
    pub field_accuracy: BTreeMap<FieldPath, f64>,
    pub field_tallies: BTreeMap<FieldPath, FieldTally>,
}

impl BenchmarkResult {
    /// Zero-valued result for an empty dataset
    pub fn empty(failure_policy: FailurePolicy) -> Self {
        Self {
            total_examples: 0,
            parsed_examples: 0,
            extraction_failures: 0,
            exact_matches: 0,
            overall_accuracy: 0.0,
            parse_success_rate: 0.0,
            failure_policy,
            field_accuracy: BTreeMap::new(),
            field_tallies: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_examples == 0
    }

    /// Accuracy for one field, if any example carried it
    pub fn accuracy_for(&self, path: &str) -> Option<f64> {
        self.field_accuracy.get(path).copied()
    }
}

/// Reduces scored examples to a [`BenchmarkResult`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Summarizer {
    policy: FailurePolicy,
}

impl Summarizer {
    pub fn new(policy: FailurePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn summarize(&self, examples: &[ScoredExample]) -> BenchmarkResult {
        if examples.is_empty() {
            return BenchmarkResult::empty(self.policy);
        }

        let total = examples.len();
        let failures = examples.iter().filter(|e| e.is_failure()).count();
        let exact = examples.iter().filter(|e| e.overall).count();

        let mut tallies: BTreeMap<FieldPath, FieldTally> = BTreeMap::new();
        for example in examples {
            if example.is_failure() && self.policy == FailurePolicy::ExcludeFromFields {
                continue;
            }
            for (path, ok) in example.field_correctness.iter() {
                let tally = tallies.entry(path.clone()).or_default();
                tally.present += 1;
                if ok {
                    tally.correct += 1;
                }
            }
        }

        let field_accuracy = tallies
            .iter()
            .map(|(path, tally)| (path.clone(), tally.accuracy()))
            .collect();

        tracing::debug!(
            total,
            failures,
            exact,
            fields = tallies.len(),
            "summarized benchmark examples"
        );

        BenchmarkResult {
            total_examples: total,
            parsed_examples: total - failures,
            extraction_failures: failures,
            exact_matches: exact,
            overall_accuracy: exact as f64 / total as f64,
            parse_success_rate: (total - failures) as f64 / total as f64,
            failure_policy: self.policy,
            field_accuracy,
            field_tallies: tallies,
        }
    }
}
