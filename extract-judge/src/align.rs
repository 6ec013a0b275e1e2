//! Best-match alignment of candidate records

use indexmap::IndexMap;
use std::sync::Arc;

use crate::compare::{mismatch_kind, FieldComparator, StringEqualityComparator};
use crate::outcome::{FieldCorrectness, FieldMismatch};
use crate::path::{resolve, FieldPath, Flattener, NestedFlattener};
use crate::value::{Record, Value};

/// Outcome of aligning one ground-truth record against a candidate set
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    /// Index of the winning candidate, `None` for an empty candidate set
    pub chosen: Option<usize>,
    /// Matching field count of each candidate, in candidate order
    pub match_counts: Vec<usize>,
    pub field_correctness: FieldCorrectness,
    pub mismatches: Vec<FieldMismatch>,
}

/// Picks the candidate with the most string-equal fields.
///
/// Ties go to the lowest candidate index, so the result depends only on the
/// candidate order and never on hashing or iteration order.
#[derive(Clone)]
pub struct BestMatchAligner {
    flattener: Arc<dyn Flattener>,
    comparator: StringEqualityComparator,
}

impl Default for BestMatchAligner {
    fn default() -> Self {
        Self::new(Arc::new(NestedFlattener::new()))
    }
}

impl BestMatchAligner {
    pub fn new(flattener: Arc<dyn Flattener>) -> Self {
        Self {
            flattener,
            comparator: StringEqualityComparator,
        }
    }

    pub fn align(&self, ground_truth: &Record, candidates: &[Record]) -> Alignment {
        let truth = self.flattener.flatten(ground_truth);

        // each candidate's value at every ground-truth path, `None` when absent
        let resolved: Vec<Vec<Option<Value>>> = candidates
            .iter()
            .map(|candidate| {
                let fields: IndexMap<FieldPath, Value> =
                    self.flattener.flatten(candidate).into_iter().collect();
                truth.iter().map(|(path, _)| resolve(&fields, path)).collect()
            })
            .collect();

        let null = Value::Null;
        let matches = |want: &Value, got: &Option<Value>| {
            self.comparator.compare(want, got.as_ref().unwrap_or(&null))
        };

        let match_counts: Vec<usize> = resolved
            .iter()
            .map(|values| {
                truth
                    .iter()
                    .zip(values)
                    .filter(|&((_, want), got)| matches(want, got))
                    .count()
            })
            .collect();

        let mut chosen: Option<usize> = None;
        for (i, &count) in match_counts.iter().enumerate() {
            match chosen {
                Some(best) if match_counts[best] >= count => {}
                _ => chosen = Some(i),
            }
        }

        tracing::trace!(?match_counts, ?chosen, "aligned candidate set");

        let mut field_correctness = FieldCorrectness::new();
        let mut mismatches = Vec::new();
        for (i, (path, want)) in truth.into_iter().enumerate() {
            let got = chosen.and_then(|c| resolved[c][i].clone());
            let ok = chosen.is_some() && matches(&want, &got);
            if !ok {
                let kind = mismatch_kind(&want, got.as_ref().unwrap_or(&null));
                mismatches.push(FieldMismatch::new(path.clone(), kind, Some(want), got));
            }
            field_correctness.insert(path, ok);
        }

        Alignment {
            chosen,
            match_counts,
            field_correctness,
            mismatches,
        }
    }
}

impl std::fmt::Debug for BestMatchAligner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BestMatchAligner")
            .field("flattener", &self.flattener.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::MismatchKind;
    use crate::value::record_from_json;
    use serde_json::json;

    fn rec(value: serde_json::Value) -> Record {
        record_from_json(value).unwrap()
    }

    fn vehicle(make: &str, year: i64, value: f64) -> Record {
        rec(json!({"object_type": "Vehicle", "make_model": make, "year": year, "estimated_value": value}))
    }

    #[test]
    fn test_picks_candidate_with_most_matches() {
        let gt = vehicle("Toyota Camry", 2019, 18000.0);
        let candidates = vec![
            vehicle("Honda Civic", 2019, 9000.0),
            vehicle("Toyota Camry", 2019, 18000.0),
            vehicle("Toyota Camry", 2020, 1.0),
        ];
        let alignment = BestMatchAligner::default().align(&gt, &candidates);

        assert_eq!(alignment.chosen, Some(1));
        assert_eq!(alignment.match_counts, vec![2, 4, 2]);
        assert!(alignment.field_correctness.all_correct());
    }

    #[test]
    fn test_ties_go_to_lowest_index() {
        let gt = vehicle("Toyota Camry", 2019, 18000.0);
        let candidates = vec![
            vehicle("Honda Civic", 2019, 18000.0),
            vehicle("Toyota Camry", 2018, 18000.0),
        ];
        let alignment = BestMatchAligner::default().align(&gt, &candidates);

        assert_eq!(alignment.match_counts, vec![3, 3]);
        assert_eq!(alignment.chosen, Some(0));
        assert_eq!(alignment.field_correctness.get("make_model"), Some(false));
    }

    #[test]
    fn test_empty_candidate_set_marks_all_false() {
        let gt = vehicle("Toyota Camry", 2019, 18000.0);
        let alignment = BestMatchAligner::default().align(&gt, &[]);

        assert_eq!(alignment.chosen, None);
        assert_eq!(alignment.field_correctness.len(), 4);
        assert_eq!(alignment.field_correctness.correct_count(), 0);
        assert!(alignment.mismatches.iter().all(|m| m.kind == MismatchKind::Missing));
    }

    #[test]
    fn test_string_level_matching_ignores_number_type() {
        let gt = rec(json!({"year": 2019, "estimated_value": 18000}));
        let candidates = vec![rec(json!({"year": "2019", "estimated_value": 18000.0}))];
        let alignment = BestMatchAligner::default().align(&gt, &candidates);

        assert!(alignment.field_correctness.all_correct());
    }

    #[test]
    fn test_absent_candidate_field_matches_null_truth() {
        let gt = rec(json!({"object_id": "OBJ-1", "location_address": null}));
        let candidates = vec![rec(json!({"object_id": "OBJ-1"}))];
        let alignment = BestMatchAligner::default().align(&gt, &candidates);

        assert_eq!(alignment.match_counts, vec![2]);
    }

    #[test]
    fn test_invented_object_does_not_match_null_truth() {
        let gt = rec(json!({"object_id": "A", "location_address": null}));
        let candidates = vec![rec(json!({"object_id": "A", "location_address": {"street": "x"}}))];
        let alignment = BestMatchAligner::default().align(&gt, &candidates);

        assert_eq!(alignment.match_counts, vec![1]);
        assert_eq!(alignment.field_correctness.get("location_address"), Some(false));
        assert_eq!(alignment.mismatches[0].kind, MismatchKind::WrongValue);
    }

    #[test]
    fn test_null_truth_prefers_candidate_without_invented_object() {
        let gt = rec(json!({"object_id": "A", "location_address": null}));
        let candidates = vec![
            rec(json!({"object_id": "A", "location_address": {"street": "x"}})),
            rec(json!({"object_id": "A", "location_address": null})),
        ];
        let alignment = BestMatchAligner::default().align(&gt, &candidates);

        assert_eq!(alignment.chosen, Some(1));
        assert!(alignment.field_correctness.all_correct());
    }

    #[test]
    fn test_mismatches_keep_original_values() {
        let gt = rec(json!({"year": 2019, "make_model": "Toyota Camry"}));
        let candidates = vec![rec(json!({"year": 2020, "make_model": null}))];
        let alignment = BestMatchAligner::default().align(&gt, &candidates);

        assert_eq!(alignment.mismatches.len(), 2);
        assert_eq!(alignment.mismatches[0].expected, Some(Value::Int(2019)));
        assert_eq!(alignment.mismatches[0].actual, Some(Value::Int(2020)));
        assert_eq!(alignment.mismatches[0].kind, MismatchKind::WrongValue);
        assert_eq!(alignment.mismatches[1].kind, MismatchKind::Missing);
    }

    #[test]
    fn test_literal_null_string_is_not_a_null() {
        let gt = rec(json!({"object_id": "A", "location_address": null}));
        let candidates = vec![rec(json!({"object_id": "A", "location_address": "null"}))];
        let alignment = BestMatchAligner::default().align(&gt, &candidates);

        assert_eq!(alignment.match_counts, vec![1]);
    }
}
