//! Registry of the supported extraction benchmarks

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::JudgeError;
use crate::judge::JudgeConfig;
use crate::path::{NestedFlattener, TopLevelFlattener};

/// A structured-extraction benchmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Benchmark {
    /// Table statistics (row/column counts, types, extremes, identifiers)
    DataTableAnalysis,
    /// Named entities from financial text
    FinancialEntities,
    /// Nested insurance claim records with repeated insured objects
    InsuranceClaims,
    /// Personally identifiable information fields
    PiiExtraction,
}

impl Benchmark {
    pub fn all() -> [Benchmark; 4] {
        [
            Benchmark::DataTableAnalysis,
            Benchmark::FinancialEntities,
            Benchmark::InsuranceClaims,
            Benchmark::PiiExtraction,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Benchmark::DataTableAnalysis => "data_table_analysis",
            Benchmark::FinancialEntities => "financial_entities",
            Benchmark::InsuranceClaims => "insurance_claims",
            Benchmark::PiiExtraction => "pii_extraction",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Benchmark::DataTableAnalysis => "Summarize a data table into typed statistics",
            Benchmark::FinancialEntities => "Extract financial named entities from text",
            Benchmark::InsuranceClaims => "Extract a structured insurance claim",
            Benchmark::PiiExtraction => "Extract PII fields from free text",
        }
    }

    /// Top-level fields whose substructures are aligned by best match
    pub fn alignment_slots(&self) -> &'static [&'static str] {
        match self {
            Benchmark::InsuranceClaims => &["insured_objects"],
            _ => &[],
        }
    }

    /// Judging setup for this benchmark
    pub fn judge_config(&self) -> JudgeConfig {
        let config = match self {
            Benchmark::InsuranceClaims => {
                JudgeConfig::default().with_flattener(NestedFlattener::new())
            }
            Benchmark::DataTableAnalysis
            | Benchmark::FinancialEntities
            | Benchmark::PiiExtraction => JudgeConfig::default().with_flattener(TopLevelFlattener),
        };
        self.alignment_slots()
            .iter()
            .fold(config, |config, slot| config.with_alignment_slot(*slot))
    }
}

impl fmt::Display for Benchmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Benchmark {
    type Err = JudgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('-', "_");
        Benchmark::all()
            .into_iter()
            .find(|b| b.as_str() == key)
            .ok_or_else(|| JudgeError::UnknownBenchmark(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for benchmark in Benchmark::all() {
            assert_eq!(benchmark.as_str().parse::<Benchmark>().unwrap(), benchmark);
        }
        assert_eq!(
            "Insurance-Claims".parse::<Benchmark>().unwrap(),
            Benchmark::InsuranceClaims
        );
    }

    #[test]
    fn test_unknown_name_is_an_error() {
        let err = "weather".parse::<Benchmark>().unwrap_err();
        assert_eq!(err.to_string(), "unknown benchmark: weather");
    }

    #[test]
    fn test_only_claims_align_slots() {
        let config = Benchmark::InsuranceClaims.judge_config();
        assert_eq!(config.alignment_slots, vec!["insured_objects".to_string()]);
        assert_eq!(config.flattener.name(), "nested");

        let config = Benchmark::PiiExtraction.judge_config();
        assert!(config.alignment_slots.is_empty());
        assert_eq!(config.flattener.name(), "top_level");
    }
}
