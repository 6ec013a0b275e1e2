//! Per-example judging results

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::path::FieldPath;
use crate::value::Value;

/// Per-field correctness, one entry per ground-truth field in flattening order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldCorrectness(IndexMap<FieldPath, bool>);

impl FieldCorrectness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: FieldPath, correct: bool) {
        self.0.insert(path, correct);
    }

    pub fn get(&self, path: &str) -> Option<bool> {
        self.0.get(path).copied()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, bool)> {
        self.0.iter().map(|(p, ok)| (p, *ok))
    }

    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.0.keys()
    }

    /// Number of fields judged correct
    pub fn correct_count(&self) -> usize {
        self.0.values().filter(|ok| **ok).count()
    }

    /// True when every field is correct (vacuously true when empty)
    pub fn all_correct(&self) -> bool {
        self.0.values().all(|ok| *ok)
    }

    /// Fraction of correct fields, 0.0 when there are none
    pub fn match_rate(&self) -> f64 {
        if self.0.is_empty() {
            0.0
        } else {
            self.correct_count() as f64 / self.0.len() as f64
        }
    }
}

impl FromIterator<(FieldPath, bool)> for FieldCorrectness {
    fn from_iter<I: IntoIterator<Item = (FieldPath, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for FieldCorrectness {
    type Item = (FieldPath, bool);
    type IntoIter = indexmap::map::IntoIter<FieldPath, bool>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Why a field did not match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// Same kind of value, different content
    WrongValue,
    /// The prediction has no value (absent or null) for the field
    Missing,
    /// The predicted value has an incompatible type
    TypeMismatch,
    /// The prediction carries a field the ground truth does not have
    Unexpected,
}

impl MismatchKind {
    /// Type mismatches and unexpected fields are schema violations
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, MismatchKind::TypeMismatch | MismatchKind::Unexpected)
    }
}

/// A single field-level disagreement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMismatch {
    pub path: FieldPath,
    pub kind: MismatchKind,
    pub expected: Option<Value>,
    pub actual: Option<Value>,
}

impl FieldMismatch {
    pub fn new(
        path: FieldPath,
        kind: MismatchKind,
        expected: Option<Value>,
        actual: Option<Value>,
    ) -> Self {
        Self {
            path,
            kind,
            expected,
            actual,
        }
    }

    pub(crate) fn under(mut self, prefix: &FieldPath) -> Self {
        self.path = prefix.join(&self.path);
        self
    }
}

impl fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let render = |v: &Option<Value>| match v {
            Some(v) => format!("'{}'", v.to_flat_string()),
            None => "nothing".to_string(),
        };
        write!(
            f,
            "{}: expected {}, got {}",
            self.path,
            render(&self.expected),
            render(&self.actual)
        )
    }
}

/// Whether the model produced a usable record for the example
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExampleStatus {
    Scored,
    ExtractionFailed,
}

/// Which candidate won an alignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentSummary {
    /// Slot the alignment ran for; `None` when the whole record was aligned
    pub slot: Option<FieldPath>,
    pub chosen: Option<usize>,
    pub match_counts: Vec<usize>,
}

/// Judging result for one example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredExample {
    pub status: ExampleStatus,
    /// Exact-match verdict: every field correct and the extraction succeeded
    pub overall: bool,
    pub field_correctness: FieldCorrectness,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mismatches: Vec<FieldMismatch>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alignments: Vec<AlignmentSummary>,
}

impl ScoredExample {
    pub(crate) fn new(
        status: ExampleStatus,
        field_correctness: FieldCorrectness,
        mismatches: Vec<FieldMismatch>,
    ) -> Self {
        let mut example = Self {
            status,
            overall: false,
            field_correctness,
            mismatches,
            alignments: Vec::new(),
        };
        example.refresh_overall();
        example
    }

    pub fn is_failure(&self) -> bool {
        self.status == ExampleStatus::ExtractionFailed
    }

    pub fn exact_matches(&self) -> usize {
        self.field_correctness.correct_count()
    }

    pub fn total_fields(&self) -> usize {
        self.field_correctness.len()
    }

    pub fn field_match_rate(&self) -> f64 {
        self.field_correctness.match_rate()
    }

    /// Mismatches that are schema violations
    pub fn schema_violations(&self) -> impl Iterator<Item = &FieldMismatch> {
        self.mismatches.iter().filter(|m| m.kind.is_schema_violation())
    }

    /// Fold an alignment result into this example, prefixing its paths with `slot`
    pub(crate) fn absorb(&mut self, slot: Option<FieldPath>, alignment: crate::align::Alignment) {
        match &slot {
            Some(prefix) => {
                for (path, ok) in alignment.field_correctness {
                    self.field_correctness.insert(prefix.join(&path), ok);
                }
                self.mismatches
                    .extend(alignment.mismatches.into_iter().map(|m| m.under(prefix)));
            }
            None => {
                for (path, ok) in alignment.field_correctness {
                    self.field_correctness.insert(path, ok);
                }
                self.mismatches.extend(alignment.mismatches);
            }
        }
        self.alignments.push(AlignmentSummary {
            slot,
            chosen: alignment.chosen,
            match_counts: alignment.match_counts,
        });
        self.refresh_overall();
    }

    pub(crate) fn push_field(&mut self, path: FieldPath, ok: bool, mismatch: Option<FieldMismatch>) {
        self.field_correctness.insert(path, ok);
        self.mismatches.extend(mismatch);
        self.refresh_overall();
    }

    fn refresh_overall(&mut self) {
        self.overall =
            self.status == ExampleStatus::Scored && self.field_correctness.all_correct();
    }
}
