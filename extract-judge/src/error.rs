//! Judge error types

/// Errors raised by the judging engine.
///
/// Malformed individual examples never produce an error; they are scored
/// as failures. Only broken preconditions of a whole run end up here.
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error("got {predictions} predictions for {ground_truths} ground-truth records")]
    LengthMismatch {
        predictions: usize,
        ground_truths: usize,
    },

    #[error("unknown benchmark: {0}")]
    UnknownBenchmark(String),

    #[error("unknown failure policy: {0}")]
    UnknownFailurePolicy(String),
}

pub type Result<T> = std::result::Result<T, JudgeError>;
