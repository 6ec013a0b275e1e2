//! Dataset loading from CSV files

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use extract_judge::{record_from_json, Benchmark, Prediction, Record, Value};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::catalog::{dataset_spec, TruthFormat, GROUND_TRUTH_COLUMN};
use super::literal::parse_literal_record;
use super::ExtractionTask;
use crate::runner::parse_record;

/// Error type for dataset loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column '{column}' in {source_name}")]
    MissingColumn { column: String, source_name: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Which rows of a dataset to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sampling {
    /// Keep at most this many rows; `None` keeps all
    pub sample_size: Option<usize>,
    pub seed: u64,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            sample_size: None,
            seed: 64,
        }
    }
}

impl Sampling {
    pub fn all() -> Self {
        Self::default()
    }

    /// Non-positive sizes mean the whole dataset
    pub fn from_size(sample_size: i64, seed: u64) -> Self {
        Self {
            sample_size: (sample_size > 0).then_some(sample_size as usize),
            seed,
        }
    }

    /// Indices of the rows to keep, ascending
    pub fn select(&self, len: usize) -> Vec<usize> {
        match self.sample_size {
            Some(n) if n < len => {
                let mut rng = StdRng::seed_from_u64(self.seed);
                let mut picked = rand::seq::index::sample(&mut rng, len, n).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..len).collect(),
        }
    }
}

/// Tasks read from one dataset file
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub benchmark: Benchmark,
    pub tasks: Vec<ExtractionTask>,
    /// Rows read before sampling
    pub total_rows: usize,
    /// Rows dropped because their ground truth did not parse
    pub skipped_rows: usize,
}

impl LoadedDataset {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn ground_truths(&self) -> Vec<Record> {
        self.tasks.iter().map(|t| t.ground_truth.clone()).collect()
    }
}

/// Conventional location of a benchmark's CSV under `dir`
pub fn dataset_path(dir: impl AsRef<Path>, benchmark: Benchmark) -> PathBuf {
    dir.as_ref().join(dataset_spec(benchmark).file_name)
}

/// Load a benchmark dataset from a CSV file
pub fn load_dataset(
    path: impl AsRef<Path>,
    benchmark: Benchmark,
    sampling: &Sampling,
) -> Result<LoadedDataset, LoadError> {
    let path = path.as_ref();
    tracing::debug!("Loading {} from {}", benchmark, path.display());
    let file = std::fs::File::open(path)?;
    load_dataset_from_reader(file, &path.display().to_string(), benchmark, sampling)
}

/// Load a benchmark dataset from any CSV reader
pub fn load_dataset_from_reader<R: Read>(
    reader: R,
    source_name: &str,
    benchmark: Benchmark,
    sampling: &Sampling,
) -> Result<LoadedDataset, LoadError> {
    let spec = dataset_spec(benchmark);
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| LoadError::MissingColumn {
                column: name.to_string(),
                source_name: source_name.to_string(),
            })
    };
    let input_idx = column(spec.input_column)?;
    let truth_idx = column(GROUND_TRUTH_COLUMN)?;
    let id_idx = headers.iter().position(|h| h.trim() == "id");

    let mut tasks = Vec::new();
    let mut total_rows = 0;
    let mut skipped_rows = 0;

    for (row, result) in csv_reader.records().enumerate() {
        let record = result?;
        total_rows += 1;

        let raw_truth = record.get(truth_idx).unwrap_or_default();
        let ground_truth = match parse_ground_truth(raw_truth, spec.truth_format) {
            Ok(truth) => truth,
            Err(e) => {
                tracing::warn!("Skipping {} row {}: {}", benchmark, row, e);
                skipped_rows += 1;
                continue;
            }
        };

        let id = id_idx
            .and_then(|i| record.get(i))
            .filter(|id| !id.trim().is_empty())
            .map(|id| id.trim().to_string())
            .unwrap_or_else(|| format!("{}-{:05}", benchmark, row));

        tasks.push(ExtractionTask::new(
            id,
            record.get(input_idx).unwrap_or_default(),
            ground_truth,
        ));
    }

    let selected = sampling.select(tasks.len());
    if selected.len() < tasks.len() {
        tracing::info!(
            "Sampled {} of {} {} tasks (seed {})",
            selected.len(),
            tasks.len(),
            benchmark,
            sampling.seed
        );
        let mut keep = selected.into_iter().peekable();
        tasks = tasks
            .into_iter()
            .enumerate()
            .filter_map(|(i, task)| {
                if keep.peek() == Some(&i) {
                    keep.next();
                    Some(task)
                } else {
                    None
                }
            })
            .collect();
    }

    Ok(LoadedDataset {
        benchmark,
        tasks,
        total_rows,
        skipped_rows,
    })
}

/// Decode one ground-truth cell. JSON is accepted for every format.
pub fn parse_ground_truth(raw: &str, format: TruthFormat) -> Result<Record, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("empty ground truth".to_string());
    }

    let json_error = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => {
            return record_from_json(json).ok_or_else(|| "ground truth is not an object".to_string())
        }
        Err(e) => e,
    };

    match format {
        TruthFormat::Json => Err(format!("invalid JSON ground truth: {}", json_error)),
        TruthFormat::PythonLiteral => parse_literal_record(raw).map_err(|e| e.to_string()),
    }
}

/// Read predictions from a JSON Lines file, one line per task in dataset order.
///
/// A line may be a bare record, `null` for a failed extraction, or an object
/// with a `prediction` (record or raw model text), `candidates`, or `error` key.
pub fn load_predictions(path: impl AsRef<Path>) -> Result<Vec<Prediction>, LoadError> {
    let file = std::fs::File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    let mut predictions = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let json: serde_json::Value = serde_json::from_str(&line)
            .map_err(|e| LoadError::Parse(format!("line {}: {}", line_no + 1, e)))?;
        predictions.push(prediction_from_json(json));
    }

    Ok(predictions)
}

fn prediction_from_json(json: serde_json::Value) -> Prediction {
    let wrapped = json.as_object().is_some_and(|obj| {
        obj.contains_key("prediction") || obj.contains_key("candidates") || obj.contains_key("error")
    });
    if !wrapped {
        return match Value::from(json) {
            Value::Object(record) => Prediction::Record(record),
            Value::Null => Prediction::failed("no prediction"),
            other => Prediction::failed(format!("prediction is {}", other.type_name())),
        };
    }

    let mut obj = match json {
        serde_json::Value::Object(obj) => obj,
        _ => return Prediction::failed("no prediction"),
    };

    if let Some(serde_json::Value::Array(items)) = obj.remove("candidates") {
        return Prediction::Candidates(items.into_iter().filter_map(record_from_json).collect());
    }

    match obj.remove("prediction") {
        Some(serde_json::Value::String(content)) => match parse_record(&content) {
            Ok(record) => Prediction::Record(record),
            Err(e) => Prediction::failed(e.to_string()),
        },
        Some(json @ serde_json::Value::Object(_)) => record_from_json(json).into(),
        _ => Prediction::failed(
            obj.get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("no prediction"),
        ),
    }
}
