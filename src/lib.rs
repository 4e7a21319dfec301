//! contention-bench library
//!
//! Measures correctness and throughput of three ways to accumulate a shared
//! count across parallel workers: a global lock, sharded locks, and a
//! channel funnel into a single aggregator.

pub mod accumulator;
pub mod benchmark;
pub mod config;
pub mod metrics;
pub mod utils;
pub mod workload;

pub use accumulator::{Accumulator, IncrementHandle};
pub use benchmark::{BenchmarkResult, Harness, Orchestrator, RunCounters};
pub use config::{BenchmarkConfig, WorkloadConfig};
pub use utils::{AccumulatorError, BenchmarkError, Result};
pub use workload::{AccumulationStrategy, RemainderPolicy, WorkUnit};
