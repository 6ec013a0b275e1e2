//! Per-example judging and dataset aggregation

use std::sync::Arc;

use crate::align::BestMatchAligner;
use crate::compare::{TextNormalization, TypedFieldComparator};
use crate::error::{JudgeError, Result};
use crate::outcome::{ExampleStatus, FieldCorrectness, ScoredExample};
use crate::path::{FieldPath, Flattener, NestedFlattener, TopLevelFlattener};
use crate::scorer::RecordScorer;
use crate::stats::{BenchmarkResult, FailurePolicy, Summarizer};
use crate::value::{Record, Value};

/// What the model produced for one example
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// A parsed structured record
    Record(Record),
    /// Several candidate records competing for the ground truth
    Candidates(Vec<Record>),
    /// No usable record (call failed or response did not parse)
    Failed { reason: String },
}

impl Prediction {
    pub fn failed(reason: impl Into<String>) -> Self {
        Prediction::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Prediction::Failed { .. })
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Prediction::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

impl From<Option<Record>> for Prediction {
    fn from(record: Option<Record>) -> Self {
        match record {
            Some(record) => Prediction::Record(record),
            None => Prediction::failed("no record"),
        }
    }
}

/// How one benchmark is judged. Built once per run and shared by reference.
#[derive(Clone)]
pub struct JudgeConfig {
    /// Flattening for record scoring
    pub flattener: Arc<dyn Flattener>,
    /// Flattening for candidate alignment
    pub alignment_flattener: Arc<dyn Flattener>,
    /// Top-level fields holding repeated substructures aligned by best match
    pub alignment_slots: Vec<String>,
    pub text_normalization: TextNormalization,
    pub failure_policy: FailurePolicy,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            flattener: Arc::new(TopLevelFlattener),
            alignment_flattener: Arc::new(NestedFlattener::new()),
            alignment_slots: Vec::new(),
            text_normalization: TextNormalization::exact(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl JudgeConfig {
    pub fn with_flattener(mut self, flattener: impl Flattener + 'static) -> Self {
        self.flattener = Arc::new(flattener);
        self
    }

    pub fn with_alignment_flattener(mut self, flattener: impl Flattener + 'static) -> Self {
        self.alignment_flattener = Arc::new(flattener);
        self
    }

    pub fn with_alignment_slot(mut self, field: impl Into<String>) -> Self {
        self.alignment_slots.push(field.into());
        self
    }

    pub fn with_text_normalization(mut self, text: TextNormalization) -> Self {
        self.text_normalization = text;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

impl std::fmt::Debug for JudgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgeConfig")
            .field("flattener", &self.flattener.name())
            .field("alignment_flattener", &self.alignment_flattener.name())
            .field("alignment_slots", &self.alignment_slots)
            .field("text_normalization", &self.text_normalization)
            .field("failure_policy", &self.failure_policy)
            .finish()
    }
}

/// Scores predictions against ground truth and summarizes runs
#[derive(Debug, Clone)]
pub struct Judge {
    scorer: RecordScorer,
    aligner: BestMatchAligner,
    slots: Vec<String>,
    summarizer: Summarizer,
}

impl Default for Judge {
    fn default() -> Self {
        Self::new(&JudgeConfig::default())
    }
}

impl Judge {
    pub fn new(config: &JudgeConfig) -> Self {
        let comparator =
            TypedFieldComparator::new().with_text_normalization(config.text_normalization);
        Self {
            scorer: RecordScorer::new(config.flattener.clone()).with_comparator(comparator),
            aligner: BestMatchAligner::new(config.alignment_flattener.clone()),
            slots: config.alignment_slots.clone(),
            summarizer: Summarizer::new(config.failure_policy),
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.summarizer.policy()
    }

    /// Judge a single example
    pub fn judge_one(&self, ground_truth: &Record, prediction: &Prediction) -> ScoredExample {
        match prediction {
            Prediction::Record(record) => self.judge_record(ground_truth, Some(record)),
            Prediction::Failed { .. } => self.judge_record(ground_truth, None),
            Prediction::Candidates(candidates) => {
                let alignment = self.aligner.align(ground_truth, candidates);
                let mut example =
                    ScoredExample::new(ExampleStatus::Scored, FieldCorrectness::new(), Vec::new());
                example.absorb(None, alignment);
                example
            }
        }
    }

    fn judge_record(&self, ground_truth: &Record, predicted: Option<&Record>) -> ScoredExample {
        if self.slots.is_empty() {
            return self.scorer.score(ground_truth, predicted);
        }

        let base_truth = without_slots(ground_truth, &self.slots);
        let base_predicted = predicted.map(|p| without_slots(p, &self.slots));
        let mut example = self.scorer.score(&base_truth, base_predicted.as_ref());

        for slot in &self.slots {
            let Some(truth) = ground_truth.get(slot) else {
                continue;
            };
            let predicted_slot = predicted.and_then(|p| p.get(slot));
            let candidates = candidate_set(predicted_slot);
            let slot_path = FieldPath::new(slot.as_str());

            match truth {
                Value::Null => {}
                Value::Object(sub) => {
                    let alignment = self.aligner.align(sub, &candidates);
                    example.absorb(Some(slot_path), alignment);
                }
                Value::Array(items) => {
                    for (i, item) in items.iter().enumerate() {
                        let item_path = slot_path.index(i);
                        match item {
                            Value::Object(sub) => {
                                let alignment = self.aligner.align(sub, &candidates);
                                example.absorb(Some(item_path), alignment);
                            }
                            scalar => {
                                let actual = predicted_slot
                                    .and_then(Value::as_array)
                                    .and_then(|a| a.get(i));
                                let (ok, mismatch) =
                                    self.scorer.score_value(&item_path, scalar, actual);
                                example.push_field(item_path, ok, mismatch);
                            }
                        }
                    }
                }
                scalar => {
                    let (ok, mismatch) = self.scorer.score_value(&slot_path, scalar, predicted_slot);
                    example.push_field(slot_path, ok, mismatch);
                }
            }
        }

        example
    }

    /// Judge every pair in input order, one result per pair
    pub fn aggregate<'a, I>(&self, pairs: I) -> Vec<ScoredExample>
    where
        I: IntoIterator<Item = (&'a Prediction, &'a Record)>,
    {
        pairs
            .into_iter()
            .map(|(prediction, truth)| self.judge_one(truth, prediction))
            .collect()
    }

    /// Judge parallel slices; their lengths must agree
    pub fn aggregate_aligned(
        &self,
        predictions: &[Prediction],
        ground_truths: &[Record],
    ) -> Result<Vec<ScoredExample>> {
        if predictions.len() != ground_truths.len() {
            return Err(JudgeError::LengthMismatch {
                predictions: predictions.len(),
                ground_truths: ground_truths.len(),
            });
        }
        Ok(self.aggregate(predictions.iter().zip(ground_truths)))
    }

    pub fn summarize(&self, examples: &[ScoredExample]) -> BenchmarkResult {
        self.summarizer.summarize(examples)
    }

    pub fn aggregate_and_summarize<'a, I>(&self, pairs: I) -> BenchmarkResult
    where
        I: IntoIterator<Item = (&'a Prediction, &'a Record)>,
    {
        self.summarize(&self.aggregate(pairs))
    }
}

fn without_slots(record: &Record, slots: &[String]) -> Record {
    record
        .iter()
        .filter(|(key, _)| !slots.iter().any(|s| s == *key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn candidate_set(predicted: Option<&Value>) -> Vec<Record> {
    match predicted {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect(),
        Some(Value::Object(record)) => vec![record.clone()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::Benchmark;
    use crate::value::record_from_json;
    use serde_json::json;

    fn rec(value: serde_json::Value) -> Record {
        record_from_json(value).unwrap()
    }

    fn claims_judge() -> Judge {
        Judge::new(
            &JudgeConfig::default()
                .with_flattener(NestedFlattener::new())
                .with_alignment_slot("insured_objects"),
        )
    }

    #[test]
    fn test_candidates_align_whole_record() {
        let gt = rec(json!({"claim_id": "C1", "channel": "Email"}));
        let prediction = Prediction::Candidates(vec![
            rec(json!({"claim_id": "C9", "channel": "Phone"})),
            rec(json!({"claim_id": "C1", "channel": "Email"})),
        ]);
        let example = Judge::default().judge_one(&gt, &prediction);

        assert!(example.overall);
        assert_eq!(example.alignments[0].chosen, Some(1));
        assert_eq!(example.alignments[0].slot, None);
    }

    #[test]
    fn test_slot_items_align_independently() {
        let gt = rec(json!({
            "header": {"claim_id": "CLM-1"},
            "insured_objects": [
                {"object_id": "A", "year": 2019},
                {"object_id": "B", "year": 2001}
            ]
        }));
        let pred = rec(json!({
            "header": {"claim_id": "CLM-1"},
            "insured_objects": [
                {"object_id": "B", "year": 2001},
                {"object_id": "A", "year": 2019}
            ]
        }));
        let example = claims_judge().judge_one(&gt, &Prediction::Record(pred));

        assert!(example.overall);
        assert_eq!(example.field_correctness.get("insured_objects[0].object_id"), Some(true));
        assert_eq!(example.field_correctness.get("insured_objects[1].year"), Some(true));
        assert_eq!(example.alignments.len(), 2);
        assert_eq!(example.alignments[0].chosen, Some(1));
        assert_eq!(example.alignments[1].chosen, Some(0));
    }

    #[test]
    fn test_null_slot_is_skipped() {
        let gt = rec(json!({"header": {"claim_id": "CLM-1"}, "insured_objects": null}));
        let pred = rec(json!({"header": {"claim_id": "CLM-1"}, "insured_objects": [{"object_id": "X"}]}));
        let example = claims_judge().judge_one(&gt, &Prediction::Record(pred));

        assert!(example.overall);
        assert_eq!(example.total_fields(), 1);
    }

    #[test]
    fn test_invented_policy_details_fail_null_truth() {
        let judge = Judge::new(&Benchmark::InsuranceClaims.judge_config());
        let gt = rec(json!({"header": {"claim_id": "CLM-1"}, "policy_details": null}));
        let pred = rec(json!({
            "header": {"claim_id": "CLM-1"},
            "policy_details": {"policy_number": "POL-999", "coverage_type": "Auto"}
        }));
        let example = judge.judge_one(&gt, &Prediction::Record(pred));

        assert!(!example.overall);
        assert_eq!(example.field_correctness.get("policy_details"), Some(false));
        assert_eq!(example.field_correctness.get("header.claim_id"), Some(true));
    }

    #[test]
    fn test_invented_address_fails_null_slot_field() {
        let gt = rec(json!({
            "insured_objects": [{"object_id": "A", "location_address": null}]
        }));
        let pred = rec(json!({
            "insured_objects": [{"object_id": "A", "location_address": {"street": "x"}}]
        }));
        let example = claims_judge().judge_one(&gt, &Prediction::Record(pred));

        assert!(!example.overall);
        assert_eq!(
            example.field_correctness.get("insured_objects[0].location_address"),
            Some(false)
        );
    }

    #[test]
    fn test_missing_predicted_slot_fails_its_fields() {
        let gt = rec(json!({"insured_objects": {"object_id": "A", "year": 2019}}));
        let pred = rec(json!({}));
        let example = claims_judge().judge_one(&gt, &Prediction::Record(pred));

        assert!(!example.overall);
        assert_eq!(example.field_correctness.get("insured_objects.object_id"), Some(false));
        assert_eq!(example.alignments[0].chosen, None);
    }

    #[test]
    fn test_failed_prediction_covers_slot_fields() {
        let gt = rec(json!({
            "header": {"claim_id": "CLM-1"},
            "insured_objects": [{"object_id": "A"}]
        }));
        let example = claims_judge().judge_one(&gt, &Prediction::failed("timeout"));

        assert!(example.is_failure());
        assert_eq!(example.total_fields(), 2);
        assert_eq!(example.exact_matches(), 0);
    }

    #[test]
    fn test_aggregate_preserves_order() {
        let gts = vec![rec(json!({"v": 1})), rec(json!({"v": 2})), rec(json!({"v": 3}))];
        let preds = vec![
            Prediction::Record(rec(json!({"v": 1}))),
            Prediction::failed("bad json"),
            Prediction::Record(rec(json!({"v": 4}))),
        ];
        let examples = Judge::default().aggregate_aligned(&preds, &gts).unwrap();

        let verdicts: Vec<bool> = examples.iter().map(|e| e.overall).collect();
        assert_eq!(verdicts, vec![true, false, false]);
        assert!(examples[1].is_failure());
        assert!(!examples[2].is_failure());
    }

    #[test]
    fn test_length_mismatch_is_fatal() {
        let err = Judge::default()
            .aggregate_aligned(&[Prediction::failed("x")], &[])
            .unwrap_err();
        assert!(matches!(
            err,
            JudgeError::LengthMismatch {
                predictions: 1,
                ground_truths: 0
            }
        ));
    }

    #[test]
    fn test_text_normalization_flows_through_config() {
        let judge = Judge::new(
            &JudgeConfig::default().with_text_normalization(TextNormalization::lenient()),
        );
        let gt = rec(json!({"channel": "Email"}));
        let example = judge.judge_one(&gt, &Prediction::Record(rec(json!({"channel": " email"}))));
        assert!(example.overall);
    }
}
