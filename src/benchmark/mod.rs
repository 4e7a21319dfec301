//! Benchmark orchestration and workers
//!
//! - RunCounters: atomic progress and cancellation shared with workers
//! - Harness: runs one strategy against one workload
//! - Orchestrator: runs every selected strategy in order and collects results

pub mod counters;
pub mod harness;
pub mod orchestrator;

pub use counters::RunCounters;
pub use harness::{latency_histogram, Harness, WorkerResult};
pub use orchestrator::{format_count, format_throughput, BenchmarkResult, Orchestrator};
