//! Record-level scoring

use indexmap::IndexMap;
use std::sync::Arc;

use crate::compare::TypedFieldComparator;
use crate::outcome::{ExampleStatus, FieldCorrectness, FieldMismatch, MismatchKind, ScoredExample};
use crate::path::{resolve, FieldPath, Flattener, TopLevelFlattener};
use crate::value::{Record, Value};

/// Scores one predicted record against one ground-truth record
#[derive(Clone)]
pub struct RecordScorer {
    comparator: TypedFieldComparator,
    flattener: Arc<dyn Flattener>,
}

impl Default for RecordScorer {
    fn default() -> Self {
        Self::new(Arc::new(TopLevelFlattener))
    }
}

impl RecordScorer {
    pub fn new(flattener: Arc<dyn Flattener>) -> Self {
        Self {
            comparator: TypedFieldComparator::new(),
            flattener,
        }
    }

    pub fn with_comparator(mut self, comparator: TypedFieldComparator) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn comparator(&self) -> &TypedFieldComparator {
        &self.comparator
    }

    /// Score a prediction. `None` means the extraction failed: every
    /// ground-truth field is marked incorrect.
    ///
    /// Fields absent from the prediction read as null. A predicted container
    /// sitting where the ground truth has a leaf is compared whole. Predicted fields the
    /// ground truth lacks are reported as `Unexpected` mismatches and do not
    /// affect correctness.
    pub fn score(&self, ground_truth: &Record, predicted: Option<&Record>) -> ScoredExample {
        let truth = self.flattener.flatten(ground_truth);

        let Some(predicted) = predicted else {
            let mismatches = truth
                .iter()
                .map(|(path, expected)| {
                    FieldMismatch::new(
                        path.clone(),
                        MismatchKind::Missing,
                        Some(expected.clone()),
                        None,
                    )
                })
                .collect();
            let correctness = truth.into_iter().map(|(path, _)| (path, false)).collect();
            return ScoredExample::new(ExampleStatus::ExtractionFailed, correctness, mismatches);
        };

        let mut actual: IndexMap<FieldPath, Value> =
            self.flattener.flatten(predicted).into_iter().collect();

        let mut correctness = FieldCorrectness::new();
        let mut mismatches = Vec::new();
        for (path, expected) in truth {
            let found = resolve(&actual, &path);
            actual.retain(|p, _| p != &path && !path.is_ancestor_of(p));
            let (ok, mismatch) = self.score_value(&path, &expected, found.as_ref());
            correctness.insert(path, ok);
            mismatches.extend(mismatch);
        }

        // whatever is left was never asked for
        mismatches.extend(actual.into_iter().map(|(path, value)| {
            FieldMismatch::new(path, MismatchKind::Unexpected, None, Some(value))
        }));

        ScoredExample::new(ExampleStatus::Scored, correctness, mismatches)
    }

    /// Compare a single value; `actual = None` means the field was absent
    pub fn score_value(
        &self,
        path: &FieldPath,
        expected: &Value,
        actual: Option<&Value>,
    ) -> (bool, Option<FieldMismatch>) {
        let null = Value::Null;
        match self.comparator.classify(expected, actual.unwrap_or(&null)) {
            None => (true, None),
            Some(kind) => (
                false,
                Some(FieldMismatch::new(
                    path.clone(),
                    kind,
                    Some(expected.clone()),
                    actual.cloned(),
                )),
            ),
        }
    }
}

impl std::fmt::Debug for RecordScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordScorer")
            .field("comparator", &self.comparator)
            .field("flattener", &self.flattener.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::NestedFlattener;
    use crate::value::record_from_json;
    use serde_json::json;

    fn rec(value: serde_json::Value) -> Record {
        record_from_json(value).unwrap()
    }

    #[test]
    fn test_identical_records_are_correct() {
        let gt = rec(json!({"company": ["ACME"], "date": "2024-01-02", "amount": 12.5}));
        let scored = RecordScorer::default().score(&gt, Some(&gt));

        assert!(scored.overall);
        assert_eq!(scored.status, ExampleStatus::Scored);
        assert_eq!(scored.exact_matches(), 3);
        assert!(scored.mismatches.is_empty());
    }

    #[test]
    fn test_failure_marks_every_field_false() {
        let gt = rec(json!({"a": 1, "b": null}));
        let scored = RecordScorer::default().score(&gt, None);

        assert!(!scored.overall);
        assert!(scored.is_failure());
        assert_eq!(scored.total_fields(), 2);
        assert_eq!(scored.exact_matches(), 0);
        assert!(scored.mismatches.iter().all(|m| m.kind == MismatchKind::Missing));
    }

    #[test]
    fn test_claim_channel_mismatch() {
        let gt = rec(json!({"claim_id": "CLM-000123", "channel": "Email"}));
        let pred = rec(json!({"claim_id": "CLM-000123", "channel": "Phone"}));
        let scored = RecordScorer::default().score(&gt, Some(&pred));

        assert!(!scored.overall);
        assert_eq!(scored.field_correctness.get("claim_id"), Some(true));
        assert_eq!(scored.field_correctness.get("channel"), Some(false));
        assert_eq!(
            scored.mismatches[0].to_string(),
            "channel: expected 'Email', got 'Phone'"
        );
    }

    #[test]
    fn test_absent_field_reads_as_null() {
        let gt = rec(json!({"police_report_number": null, "incident_type": "Fire"}));
        let pred = rec(json!({"incident_type": "Fire"}));
        let scored = RecordScorer::default().score(&gt, Some(&pred));

        assert!(scored.overall);
    }

    #[test]
    fn test_unexpected_fields_are_reported_only() {
        let gt = rec(json!({"a": 1}));
        let pred = rec(json!({"a": 1, "b": 2}));
        let scored = RecordScorer::default().score(&gt, Some(&pred));

        assert!(scored.overall);
        assert_eq!(scored.total_fields(), 1);
        assert_eq!(scored.schema_violations().count(), 1);
        assert_eq!(scored.mismatches[0].kind, MismatchKind::Unexpected);
    }

    #[test]
    fn test_nested_flattening_scores_leaves() {
        let scorer = RecordScorer::new(Arc::new(NestedFlattener::new()));
        let gt = rec(json!({"header": {"claim_id": "C1", "channel": "Email"}}));
        let pred = rec(json!({"header": {"claim_id": "C1", "channel": "Portal"}}));
        let scored = scorer.score(&gt, Some(&pred));

        assert_eq!(scored.field_correctness.get("header.claim_id"), Some(true));
        assert_eq!(scored.field_correctness.get("header.channel"), Some(false));
    }

    #[test]
    fn test_invented_object_does_not_match_null() {
        let scorer = RecordScorer::new(Arc::new(NestedFlattener::new()));
        let gt = rec(json!({"header": {"claim_id": "CLM-1"}, "policy_details": null}));
        let pred = rec(json!({
            "header": {"claim_id": "CLM-1"},
            "policy_details": {"policy_number": "POL-999", "coverage_type": "Auto"}
        }));
        let scored = scorer.score(&gt, Some(&pred));

        assert!(!scored.overall);
        assert_eq!(scored.field_correctness.get("policy_details"), Some(false));
        assert_eq!(scored.mismatches.len(), 1);
        assert_eq!(scored.mismatches[0].kind, MismatchKind::WrongValue);
        assert_eq!(
            scored.mismatches[0].actual,
            Some(Value::from(json!({"policy_number": "POL-999", "coverage_type": "Auto"})))
        );
    }

    #[test]
    fn test_null_object_against_null_prediction() {
        let scorer = RecordScorer::new(Arc::new(NestedFlattener::new()));
        let gt = rec(json!({"policy_details": null}));
        let pred = rec(json!({"policy_details": null}));

        assert!(scorer.score(&gt, Some(&pred)).overall);
    }

    #[test]
    fn test_type_mismatch_is_schema_violation() {
        let gt = rec(json!({"num_rows": 12}));
        let pred = rec(json!({"num_rows": "12"}));
        let scored = RecordScorer::default().score(&gt, Some(&pred));

        assert!(!scored.overall);
        assert_eq!(scored.mismatches[0].kind, MismatchKind::TypeMismatch);
    }

    #[test]
    fn test_empty_ground_truth_is_vacuously_correct() {
        let scored = RecordScorer::default().score(&Record::new(), Some(&Record::new()));
        assert!(scored.overall);
        assert_eq!(scored.total_fields(), 0);
    }
}
