//! Error types for contention-bench

use std::time::Duration;

use thiserror::Error;

use crate::workload::AccumulationStrategy;

/// Top-level application error
#[derive(Error, Debug)]
pub enum BenchmarkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Accumulator error: {0}")]
    Accumulator(#[from] AccumulatorError),

    #[error("{strategy}: final total {actual} does not match expected {expected}")]
    InvariantViolation {
        strategy: AccumulationStrategy,
        expected: u64,
        actual: u64,
    },

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures surfaced by an accumulator while increments are in flight
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccumulatorError {
    #[error("send timed out after {timeout:?} (worker {worker_id})")]
    Timeout { worker_id: usize, timeout: Duration },

    #[error("channel closed before worker {worker_id} finished sending")]
    Disconnected { worker_id: usize },
}

pub type Result<T> = std::result::Result<T, BenchmarkError>;
