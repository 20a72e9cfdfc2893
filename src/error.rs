//! Error taxonomy for corpus statistics computations
//!
//! Fatal vs. per-gram semantics: `Config` and `Precondition` abort the whole
//! request, `StatisticsInput` only drops the offending gram from the output
//! (the drop is counted by the table builders), `Store` is surfaced to the
//! caller without local retry.

use thiserror::Error;

/// Errors raised by the extraction engine, the aggregator and the measures.
#[derive(Debug, Error)]
pub enum CollocateError {
    /// Missing or invalid schema descriptor (e.g. unknown annotation layer).
    #[error("Configuration error: {0}")]
    Config(String),

    /// An operation was requested before its prerequisite was computed
    /// (e.g. n>2 scoring before the bigram table is cached).
    #[error("Precondition not met: {0}")]
    Precondition(String),

    /// Zero or negative counts feeding PMI, or malformed contingency cells
    /// feeding log-likelihood.
    #[error("Invalid statistics input: {0}")]
    StatisticsInput(String),

    /// Underlying token-store access failure.
    #[error("Token store access failed: {0}")]
    Store(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CollocateError>;
