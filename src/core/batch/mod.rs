//! Batch orchestration
//!
//! Sequential per-record processing with partial-failure tolerance: a batch
//! of N records with one bad row or one misconfigured org still processes the
//! remaining N-1 and reports precisely which failed and why.

mod processor;
mod types;

pub use processor::BatchProcessor;
pub use types::{
    BatchResult, OutcomeCounts, OutcomeStatus, RecordError, RecordOutcome, codes,
};
