//! Extract Judge - field-level scoring for structured LLM extractions
//!
//! Compares predicted records against ground truth, aligns unordered
//! candidate records by best match, and reduces a dataset of judged
//! examples to overall and per-field accuracy.
//!
//! # Example
//!
//! ```rust
//! use extract_judge::{record_from_json, Judge, JudgeConfig, Prediction};
//! use serde_json::json;
//!
//! let judge = Judge::new(&JudgeConfig::default());
//!
//! let truth = record_from_json(json!({"claim_id": "CLM-000123", "channel": "Email"})).unwrap();
//! let predicted = record_from_json(json!({"claim_id": "CLM-000123", "channel": "Phone"})).unwrap();
//!
//! let example = judge.judge_one(&truth, &Prediction::Record(predicted));
//! assert!(!example.overall);
//! assert_eq!(example.field_correctness.get("channel"), Some(false));
//!
//! let result = judge.summarize(&[example]);
//! assert_eq!(result.overall_accuracy, 0.0);
//! assert_eq!(result.accuracy_for("claim_id"), Some(1.0));
//! ```

mod align;
mod benchmark;
mod compare;
mod error;
mod judge;
mod outcome;
mod path;
mod scorer;
mod stats;
mod value;

pub use align::{Alignment, BestMatchAligner};
pub use benchmark::Benchmark;
pub use compare::{
    mismatch_kind, FieldComparator, StringEqualityComparator, TextNormalization,
    TypedFieldComparator,
};
pub use error::{JudgeError, Result};
pub use judge::{Judge, JudgeConfig, Prediction};
pub use outcome::{
    AlignmentSummary, ExampleStatus, FieldCorrectness, FieldMismatch, MismatchKind, ScoredExample,
};
pub use path::{resolve, FieldPath, Flattener, NestedFlattener, TopLevelFlattener};
pub use scorer::RecordScorer;
pub use stats::{BenchmarkResult, FailurePolicy, FieldTally, Summarizer};
pub use value::{parse_date, record_from_json, Record, Value};

pub use indexmap::IndexMap;
